#![doc(html_root_url = "https://docs.rs/protolith/0.1.0")]

//! A schema-specialized Protocol Buffers (proto3) codec runtime.
//!
//! `protolith` provides the wire-format primitives, per-type field codecs,
//! and message engine that code generated by `protolith-build` relies on.
//! Generated message types implement [`Message`] with hard-coded dispatch on
//! field numbers; this crate supplies everything underneath: varint and
//! zigzag coding, fixed-width little-endian I/O, packed and unpacked repeated
//! fields, map entries, unknown-field retention, and default-value elision.

// Re-export the bytes crate for use within generated code.
pub use bytes;

mod error;
mod message;
mod reader;
mod unknown;
mod value;

pub mod fmt;

#[doc(hidden)]
pub mod encoding;

pub use crate::encoding::length_delimiter::{
    decode_length_delimiter, encode_length_delimiter, length_delimiter_len,
};
pub use crate::encoding::{DecodeContext, DecodeOptions};
pub use crate::error::{ContextFrame, DecodeError, DecodeErrorKind, EncodeError, UnknownEnumValue};
pub use crate::message::Message;
pub use crate::reader::WireReader;
pub use crate::unknown::UnknownFieldSet;
pub use crate::value::{MapKey, Value};

// See `encoding::DecodeContext` for more info.
// 100 is the default recursion limit in the C++ implementation.
const RECURSION_LIMIT: u32 = 100;
