//! Protobuf encoding and decoding errors.

use core::fmt;
use std::error::Error;

use crate::encoding::wire_type::WireType;

/// A Protobuf message decoding error.
///
/// `DecodeError` indicates that the input buffer does not contain a valid
/// Protobuf message, or does not match the schema of the message being decoded
/// into. The error carries a stack of context frames describing the field path
/// and byte offsets at which decoding failed.
#[derive(Clone, PartialEq, Eq)]
pub struct DecodeError {
    inner: Box<Inner>,
}

#[derive(Clone, PartialEq, Eq)]
struct Inner {
    kind: DecodeErrorKind,
    /// Context frames, innermost first. Rendered outermost first.
    frames: Vec<ContextFrame>,
}

/// The root cause of a [`DecodeError`].
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecodeErrorKind {
    /// The input buffer ended before the value it was expected to contain.
    Truncated,
    /// A varint carried a continuation bit past its tenth byte, or overflowed
    /// 64 bits in the tenth byte.
    VarintTooLong,
    /// A field key did not fit in 32 bits.
    InvalidKey { key: u64 },
    /// A field key carried field number zero.
    InvalidTag,
    /// A field key carried a 3-bit pattern that is not a wire type.
    InvalidWireType { value: u64 },
    /// A known field was framed with the wrong wire type.
    UnexpectedWireType {
        actual: WireType,
        expected: WireType,
    },
    /// A group delimiter (wire type 3 or 4) was encountered.
    GroupUnsupported,
    /// A length-delimited region was not fully consumed by its contents.
    DelimitedLengthExceeded,
    /// Nested messages exceeded the recursion budget.
    RecursionLimitReached,
    /// A varint value was out of range for the field's declared integer type.
    IntegerOutOfRange {
        type_name: &'static str,
        value: u64,
    },
    /// A varint value has no corresponding declared enum member.
    UnknownEnumValue { value: i32 },
    /// A string field held bytes that are not valid UTF-8.
    InvalidUtf8,
    /// A length delimiter exceeds the maximum usize value.
    LengthOverflow,
}

impl fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeErrorKind::Truncated => f.write_str("buffer underflow"),
            DecodeErrorKind::VarintTooLong => {
                f.write_str("varint has more than 10 7-bit digits")
            }
            DecodeErrorKind::InvalidKey { key } => write!(f, "invalid key value: {}", key),
            DecodeErrorKind::InvalidTag => f.write_str("invalid tag value: 0"),
            DecodeErrorKind::InvalidWireType { value } => {
                write!(f, "invalid wire type value: {}", value)
            }
            DecodeErrorKind::UnexpectedWireType { actual, expected } => write!(
                f,
                "invalid wire type: {:?} (expected {:?})",
                actual, expected
            ),
            DecodeErrorKind::GroupUnsupported => {
                f.write_str("group wire types are not supported")
            }
            DecodeErrorKind::DelimitedLengthExceeded => {
                f.write_str("delimited length exceeded")
            }
            DecodeErrorKind::RecursionLimitReached => f.write_str("recursion limit reached"),
            DecodeErrorKind::IntegerOutOfRange { type_name, value } => {
                write!(f, "value {} is out of range for {}", value, type_name)
            }
            DecodeErrorKind::UnknownEnumValue { value } => {
                write!(f, "unknown enumeration value {}", value)
            }
            DecodeErrorKind::InvalidUtf8 => {
                f.write_str("invalid string value: data is not UTF-8 encoded")
            }
            DecodeErrorKind::LengthOverflow => {
                f.write_str("length delimiter exceeds maximum usize value")
            }
        }
    }
}

/// One level of context pushed onto a [`DecodeError`] as it propagates out of
/// a decode call stack.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContextFrame {
    /// A known field, identified by its field-group name and field number.
    Field {
        group: &'static str,
        number: u32,
        offset: usize,
    },
    /// An unknown field, identified only by the offset of its key.
    Unknown { offset: usize },
    /// An element of a repeated field.
    Index(usize),
}

impl fmt::Display for ContextFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextFrame::Field {
                group,
                number,
                offset,
            } => write!(f, "(Field:{}#{}+{:#x})", group, number, offset),
            ContextFrame::Unknown { offset } => write!(f, "(at {:#x})", offset),
            ContextFrame::Index(index) => write!(f, "(Index:{})", index),
        }
    }
}

impl DecodeError {
    /// Get details about the root cause of the decode error.
    pub fn kind(&self) -> &DecodeErrorKind {
        &self.inner.kind
    }

    /// The context frames describing where the error occurred, outermost
    /// first.
    pub fn frames(&self) -> impl Iterator<Item = &ContextFrame> {
        self.inner.frames.iter().rev()
    }

    /// Pushes a known-field context frame. Called as the error propagates out
    /// of a field's decode path.
    #[must_use]
    pub fn at_field(mut self, group: &'static str, number: u32, offset: usize) -> DecodeError {
        self.inner.frames.push(ContextFrame::Field {
            group,
            number,
            offset,
        });
        self
    }

    /// Pushes an unknown-field context frame.
    #[must_use]
    pub fn at_unknown(mut self, offset: usize) -> DecodeError {
        self.inner.frames.push(ContextFrame::Unknown { offset });
        self
    }

    /// Pushes a repeated-element context frame.
    #[must_use]
    pub fn at_index(mut self, index: usize) -> DecodeError {
        self.inner.frames.push(ContextFrame::Index(index));
        self
    }
}

impl From<DecodeErrorKind> for DecodeError {
    fn from(kind: DecodeErrorKind) -> Self {
        DecodeError {
            inner: Box::new(Inner {
                kind,
                frames: Vec::new(),
            }),
        }
    }
}

impl fmt::Debug for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodeError")
            .field("kind", &self.inner.kind)
            .field("frames", &self.inner.frames)
            .finish()
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("failed to decode message: ")?;
        for frame in self.frames() {
            write!(f, "{}", frame)?;
        }
        if !self.inner.frames.is_empty() {
            f.write_str(" ")?;
        }
        write!(f, "{}", self.inner.kind)
    }
}

impl Error for DecodeError {}

impl From<DecodeError> for std::io::Error {
    fn from(error: DecodeError) -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::InvalidData, error)
    }
}

/// A Protobuf message encoding error.
///
/// `EncodeError` always indicates that a message failed to encode because the
/// provided buffer had insufficient capacity. Message encoding is otherwise
/// infallible.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EncodeError {
    required: usize,
    remaining: usize,
}

impl EncodeError {
    pub(crate) fn new(required: usize, remaining: usize) -> EncodeError {
        EncodeError {
            required,
            remaining,
        }
    }

    /// Returns the required buffer capacity to encode the message.
    pub fn required_capacity(&self) -> usize {
        self.required
    }

    /// Returns the remaining length in the provided buffer at the time of encoding.
    pub fn remaining(&self) -> usize {
        self.remaining
    }
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "failed to encode message; insufficient buffer capacity (required: {}, remaining: {})",
            self.required, self.remaining
        )
    }
}

impl Error for EncodeError {}

impl From<EncodeError> for std::io::Error {
    fn from(error: EncodeError) -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, error)
    }
}

/// An error indicating that an integer has no corresponding declared
/// enumeration member.
///
/// Generated enum types fail conversion from `i32` with this error; the decode
/// path maps it into [`DecodeErrorKind::UnknownEnumValue`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct UnknownEnumValue(pub i32);

impl fmt::Display for UnknownEnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown enumeration value {}", self.0)
    }
}

impl Error for UnknownEnumValue {}
