use ::bytes::BufMut;

use crate::encoding::varint::{encode_varint, encoded_len_varint};
use crate::encoding::wire_type::WireType;
use crate::encoding::{decode_key, message, DecodeContext, DecodeOptions};
use crate::reader::WireReader;
use crate::DecodeError;
use crate::EncodeError;

/// A Protocol Buffers message.
///
/// Implemented by generated message types; the required methods are produced
/// by the code generator and dispatch on hard-coded field numbers.
pub trait Message: Send + Sync {
    /// Encodes the message to a buffer.
    ///
    /// This method will panic if the buffer has insufficient capacity.
    ///
    /// Meant to be used only by `Message` implementations.
    #[doc(hidden)]
    fn encode_raw(&self, buf: &mut impl BufMut)
    where
        Self: Sized;

    /// Decodes a field from a reader, and merges it into `self`.
    ///
    /// `field_start` is the offset of the field's key, used for error context
    /// and verbatim unknown-field capture.
    ///
    /// Meant to be used only by `Message` implementations.
    #[doc(hidden)]
    fn merge_field(
        &mut self,
        field_number: u32,
        wire_type: WireType,
        field_start: usize,
        r: &mut WireReader<'_>,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError>
    where
        Self: Sized;

    /// Returns the encoded length of the message without a length delimiter.
    fn encoded_len(&self) -> usize;

    /// Encodes the message to a buffer.
    ///
    /// An error will be returned if the buffer does not have sufficient capacity.
    fn encode(&self, buf: &mut impl BufMut) -> Result<(), EncodeError>
    where
        Self: Sized,
    {
        let required = self.encoded_len();
        let remaining = buf.remaining_mut();
        if required > remaining {
            return Err(EncodeError::new(required, remaining));
        }

        self.encode_raw(buf);
        Ok(())
    }

    /// Encodes the message to a newly allocated buffer.
    fn encode_to_vec(&self) -> Vec<u8>
    where
        Self: Sized,
    {
        let mut buf = Vec::with_capacity(self.encoded_len());

        self.encode_raw(&mut buf);
        buf
    }

    /// Encodes the message with a length-delimiter to a buffer.
    ///
    /// An error will be returned if the buffer does not have sufficient capacity.
    fn encode_length_delimited(&self, buf: &mut impl BufMut) -> Result<(), EncodeError>
    where
        Self: Sized,
    {
        let len = self.encoded_len();
        let required = len + encoded_len_varint(len as u64);
        let remaining = buf.remaining_mut();
        if required > remaining {
            return Err(EncodeError::new(required, remaining));
        }
        encode_varint(len as u64, buf);
        self.encode_raw(buf);
        Ok(())
    }

    /// Encodes the message with a length-delimiter to a newly allocated buffer.
    fn encode_length_delimited_to_vec(&self) -> Vec<u8>
    where
        Self: Sized,
    {
        let len = self.encoded_len();
        let mut buf = Vec::with_capacity(len + encoded_len_varint(len as u64));

        encode_varint(len as u64, &mut buf);
        self.encode_raw(&mut buf);
        buf
    }

    /// Decodes an instance of the message from a buffer with the default
    /// options.
    ///
    /// The entire buffer will be consumed.
    fn decode(buf: &[u8]) -> Result<Self, DecodeError>
    where
        Self: Default,
    {
        Self::decode_with(buf, DecodeOptions::default())
    }

    /// Decodes an instance of the message from a buffer.
    ///
    /// The entire buffer will be consumed. On failure the partially decoded
    /// instance is discarded.
    fn decode_with(buf: &[u8], options: DecodeOptions) -> Result<Self, DecodeError>
    where
        Self: Default,
    {
        let mut message = Self::default();
        message.merge_with(buf, options).map(|_| message)
    }

    /// Decodes a length-delimited instance of the message from the buffer.
    fn decode_length_delimited(buf: &[u8]) -> Result<Self, DecodeError>
    where
        Self: Default,
    {
        let mut message = Self::default();
        message.merge_length_delimited(buf)?;
        Ok(message)
    }

    /// Decodes an instance of the message from a buffer, and merges it into
    /// `self` with the default options.
    fn merge(&mut self, buf: &[u8]) -> Result<(), DecodeError>
    where
        Self: Sized,
    {
        self.merge_with(buf, DecodeOptions::default())
    }

    /// Decodes an instance of the message from a buffer, and merges it into
    /// `self`.
    ///
    /// Singular and optional fields overwrite (last wins); repeated and map
    /// fields accumulate.
    fn merge_with(&mut self, buf: &[u8], options: DecodeOptions) -> Result<(), DecodeError>
    where
        Self: Sized,
    {
        let ctx = DecodeContext::new(options);
        let mut r = WireReader::new(buf);
        while !r.is_eof() {
            let field_start = r.position();
            let (field_number, wire_type) = decode_key(&mut r)?;
            self.merge_field(field_number, wire_type, field_start, &mut r, ctx)?;
        }
        Ok(())
    }

    /// Decodes a length-delimited instance of the message from buffer, and
    /// merges it into `self`.
    fn merge_length_delimited(&mut self, buf: &[u8]) -> Result<(), DecodeError>
    where
        Self: Sized,
    {
        let mut r = WireReader::new(buf);
        message::merge(
            WireType::LengthDelimited,
            self,
            &mut r,
            DecodeContext::default(),
        )
    }

    /// Clears the message, resetting all fields to their default.
    fn clear(&mut self);
}

impl<M> Message for Box<M>
where
    M: Message,
{
    fn encode_raw(&self, buf: &mut impl BufMut) {
        (**self).encode_raw(buf)
    }
    fn merge_field(
        &mut self,
        field_number: u32,
        wire_type: WireType,
        field_start: usize,
        r: &mut WireReader<'_>,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError> {
        (**self).merge_field(field_number, wire_type, field_start, r, ctx)
    }
    fn encoded_len(&self) -> usize {
        (**self).encoded_len()
    }
    fn clear(&mut self) {
        (**self).clear()
    }
}
