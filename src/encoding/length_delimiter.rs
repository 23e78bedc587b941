use ::bytes::BufMut;

use crate::encoding::varint::{decode_varint, encode_varint, encoded_len_varint};
use crate::error::{DecodeError, DecodeErrorKind, EncodeError};
use crate::reader::WireReader;

/// Encodes a length delimiter to the buffer.
///
/// See [`crate::Message::encode_length_delimited`] for more info.
///
/// An error will be returned if the buffer does not have sufficient capacity
/// to encode the delimiter.
pub fn encode_length_delimiter(length: usize, buf: &mut impl BufMut) -> Result<(), EncodeError> {
    let length = length as u64;
    let required = encoded_len_varint(length);
    let remaining = buf.remaining_mut();
    if required > remaining {
        return Err(EncodeError::new(required, remaining));
    }
    encode_varint(length, buf);
    Ok(())
}

/// Returns the encoded length of a length delimiter.
///
/// Applications may use this method to ensure sufficient buffer capacity
/// before calling `encode_length_delimiter`. The returned size will be
/// between 1 and 10, inclusive.
pub fn length_delimiter_len(length: usize) -> usize {
    encoded_len_varint(length as u64)
}

/// Decodes a length delimiter from the reader.
///
/// This method allows the length delimiter to be decoded independently of the
/// message, when the message is encoded with
/// [`crate::Message::encode_length_delimited`].
pub fn decode_length_delimiter(r: &mut WireReader<'_>) -> Result<usize, DecodeError> {
    let length = decode_varint(r)?;
    if length > usize::MAX as u64 {
        return Err(DecodeErrorKind::LengthOverflow.into());
    }
    Ok(length as usize)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn length_delimiter_roundtrip() {
        let mut buf = Vec::new();
        encode_length_delimiter(300, &mut buf).unwrap();
        assert_eq!(buf, [0xAC, 0x02]);
        assert_eq!(length_delimiter_len(300), 2);

        let mut r = WireReader::new(&buf);
        assert_eq!(decode_length_delimiter(&mut r).unwrap(), 300);
        assert!(r.is_eof());
    }
}
