use ::bytes::BufMut;

use crate::error::{DecodeError, DecodeErrorKind};
use crate::reader::WireReader;

/// Encodes an integer value into LEB128 variable length format, and writes it
/// to the buffer. The buffer must have enough remaining space (maximum 10
/// bytes).
#[inline]
pub fn encode_varint(mut value: u64, buf: &mut impl BufMut) {
    // Varints are never more than 10 bytes
    for _ in 0..10 {
        if value < 0x80 {
            buf.put_u8(value as u8);
            break;
        } else {
            buf.put_u8(((value & 0x7F) | 0x80) as u8);
            value >>= 7;
        }
    }
}

/// Returns the encoded length of the value in LEB128 variable length format.
/// The returned value will be between 1 and 10, inclusive.
#[inline]
pub fn encoded_len_varint(value: u64) -> usize {
    // Based on [VarintSize64][1].
    // [1]: https://github.com/google/protobuf/blob/3.3.x/src/google/protobuf/io/coded_stream.h#L1301-L1309
    ((((value | 1).leading_zeros() ^ 63) * 9 + 73) / 64) as usize
}

/// Decodes a LEB128-encoded variable length integer from the reader.
///
/// Accepts at most 10 bytes: a continuation bit past the tenth byte, or a
/// tenth byte contributing anything above bit 63, fails the decode. Truncated
/// input is reported separately so callers can distinguish "need more data"
/// from corruption.
#[inline]
pub fn decode_varint(r: &mut WireReader<'_>) -> Result<u64, DecodeError> {
    let mut value = 0u64;
    for count in 0..10 {
        if r.is_eof() {
            return Err(DecodeErrorKind::Truncated.into());
        }
        let byte = r.get_u8()?;
        value |= u64::from(byte & 0x7F) << (count * 7);
        if byte <= 0x7F {
            // Check for u64 overflow in the final byte. See [`ConsumeVarint`][1].
            // [1]: https://github.com/protocolbuffers/protobuf-go/blob/v1.27.1/encoding/protowire/wire.go#L358
            if count == 9 && byte >= 0x02 {
                return Err(DecodeErrorKind::VarintTooLong.into());
            }
            return Ok(value);
        }
    }

    Err(DecodeErrorKind::VarintTooLong.into())
}
