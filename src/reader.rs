//! Cursor over the input buffer of a decode operation.

use crate::error::{DecodeError, DecodeErrorKind};

/// A bounds-checked reader over a borrowed byte buffer.
///
/// Tracks the absolute byte offset from the start of the buffer so that decode
/// errors can point at the offending field, and so that unknown fields can be
/// captured verbatim (tag bytes included) from the consumed span.
#[derive(Debug)]
pub struct WireReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    pub fn new(buf: &'a [u8]) -> WireReader<'a> {
        WireReader { buf, pos: 0 }
    }

    /// The absolute offset of the next unread byte.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos == self.buf.len()
    }

    #[inline]
    pub fn get_u8(&mut self) -> Result<u8, DecodeError> {
        let byte = *self
            .buf
            .get(self.pos)
            .ok_or(DecodeErrorKind::Truncated)?;
        self.pos += 1;
        Ok(byte)
    }

    /// Reads the next `len` bytes as a slice of the underlying buffer.
    #[inline]
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        if len > self.remaining() {
            return Err(DecodeErrorKind::Truncated.into());
        }
        let bytes = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    /// Advances past `len` bytes without inspecting them.
    #[inline]
    pub fn skip(&mut self, len: usize) -> Result<(), DecodeError> {
        if len > self.remaining() {
            return Err(DecodeErrorKind::Truncated.into());
        }
        self.pos += len;
        Ok(())
    }

    #[inline]
    pub fn get_u32_le(&mut self) -> Result<u32, DecodeError> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_le_bytes(bytes.try_into().unwrap()))
    }

    #[inline]
    pub fn get_u64_le(&mut self) -> Result<u64, DecodeError> {
        let bytes = self.read_bytes(8)?;
        Ok(u64::from_le_bytes(bytes.try_into().unwrap()))
    }

    #[inline]
    pub fn get_i32_le(&mut self) -> Result<i32, DecodeError> {
        Ok(self.get_u32_le()? as i32)
    }

    #[inline]
    pub fn get_i64_le(&mut self) -> Result<i64, DecodeError> {
        Ok(self.get_u64_le()? as i64)
    }

    #[inline]
    pub fn get_f32_le(&mut self) -> Result<f32, DecodeError> {
        Ok(f32::from_le_bytes(self.read_bytes(4)?.try_into().unwrap()))
    }

    #[inline]
    pub fn get_f64_le(&mut self) -> Result<f64, DecodeError> {
        Ok(f64::from_le_bytes(self.read_bytes(8)?.try_into().unwrap()))
    }

    /// The raw bytes consumed since `start`, which must be a position
    /// previously returned by [`WireReader::position`].
    #[inline]
    pub fn raw_since(&self, start: usize) -> &'a [u8] {
        debug_assert!(start <= self.pos);
        &self.buf[start..self.pos]
    }
}
