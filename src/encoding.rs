//! Utility functions and types for encoding and decoding Protobuf types.
//!
//! Meant to be used only from generated message code.

#![allow(clippy::implicit_hasher, clippy::ptr_arg)]

use core::str;

use ::bytes::BufMut;

use crate::error::{DecodeError, DecodeErrorKind};
use crate::reader::WireReader;
use crate::unknown::UnknownFieldSet;
use crate::Message;

pub mod varint;
pub use varint::{decode_varint, encode_varint, encoded_len_varint};

pub mod length_delimiter;
pub use length_delimiter::{
    decode_length_delimiter, encode_length_delimiter, length_delimiter_len,
};

pub mod wire_type;
pub use wire_type::{check_wire_type, WireType};

/// Options controlling how a message is decoded.
#[derive(Clone, Copy, Debug)]
pub struct DecodeOptions {
    retain_unknown_fields: bool,
    ignore_incorrect_types: bool,
}

impl Default for DecodeOptions {
    fn default() -> DecodeOptions {
        DecodeOptions {
            retain_unknown_fields: true,
            ignore_incorrect_types: false,
        }
    }
}

impl DecodeOptions {
    pub fn new() -> DecodeOptions {
        DecodeOptions::default()
    }

    /// Whether fields not present in the schema are preserved verbatim for
    /// re-serialization. On by default.
    pub fn retain_unknown_fields(mut self, retain: bool) -> DecodeOptions {
        self.retain_unknown_fields = retain;
        self
    }

    /// Whether a known field arriving with a mismatched wire type is demoted
    /// from a fatal error to an unknown-field entry. Off by default.
    pub fn ignore_incorrect_types(mut self, ignore: bool) -> DecodeOptions {
        self.ignore_incorrect_types = ignore;
        self
    }
}

/// Additional information passed to every decode/merge function.
///
/// Carries the decode options and the remaining recursion budget. The context
/// is passed by value; when calling into a nested message, use
/// `enter_recursion`.
#[derive(Clone, Copy, Debug)]
pub struct DecodeContext {
    options: DecodeOptions,
    /// How many times we can recurse in the current decode stack before we
    /// hit the recursion limit, defined by `RECURSION_LIMIT`.
    recurse_count: u32,
}

impl Default for DecodeContext {
    #[inline]
    fn default() -> DecodeContext {
        DecodeContext::new(DecodeOptions::default())
    }
}

impl DecodeContext {
    pub fn new(options: DecodeOptions) -> DecodeContext {
        DecodeContext {
            options,
            recurse_count: crate::RECURSION_LIMIT,
        }
    }

    #[inline]
    pub fn retain_unknown_fields(&self) -> bool {
        self.options.retain_unknown_fields
    }

    #[inline]
    pub fn ignore_incorrect_types(&self) -> bool {
        self.options.ignore_incorrect_types
    }

    /// Call this function before recursively decoding.
    ///
    /// There is no `exit` function since this function creates a new
    /// `DecodeContext` to be used at the next level of recursion.
    #[inline]
    pub(crate) fn enter_recursion(&self) -> DecodeContext {
        DecodeContext {
            options: self.options,
            recurse_count: self.recurse_count - 1,
        }
    }

    /// Checks whether the recursion limit has been reached in the stack of
    /// decodes described by this context.
    #[inline]
    pub(crate) fn limit_reached(&self) -> Result<(), DecodeError> {
        if self.recurse_count == 0 {
            Err(DecodeErrorKind::RecursionLimitReached.into())
        } else {
            Ok(())
        }
    }
}

pub const MIN_TAG: u32 = 1;
pub const MAX_TAG: u32 = (1 << 29) - 1;

/// Encodes a Protobuf field key, which consists of a wire type designator and
/// the field number.
#[inline]
pub fn encode_key(tag: u32, wire_type: WireType, buf: &mut impl BufMut) {
    debug_assert!((MIN_TAG..=MAX_TAG).contains(&tag));
    let key = (tag << 3) | wire_type as u32;
    encode_varint(u64::from(key), buf);
}

/// Decodes a Protobuf field key, which consists of a wire type designator and
/// the field number.
#[inline(always)]
pub fn decode_key(r: &mut WireReader<'_>) -> Result<(u32, WireType), DecodeError> {
    let key = decode_varint(r)?;
    if key > u64::from(u32::MAX) {
        return Err(DecodeErrorKind::InvalidKey { key }.into());
    }
    let wire_type = WireType::try_from(key & 0x07)?;
    let field_number = key as u32 >> 3;

    if field_number < MIN_TAG {
        return Err(DecodeErrorKind::InvalidTag.into());
    }

    Ok((field_number, wire_type))
}

/// Returns the width of an encoded Protobuf field key with the given field
/// number. The returned width will be between 1 and 5 bytes (inclusive).
#[inline]
pub fn key_len(tag: u32) -> usize {
    encoded_len_varint(u64::from(tag << 3))
}

/// Helper function which abstracts reading a length delimiter prefix followed
/// by decoding values until the delimited region is exhausted.
pub fn merge_loop<T, M>(
    value: &mut T,
    r: &mut WireReader<'_>,
    ctx: DecodeContext,
    mut merge: M,
) -> Result<(), DecodeError>
where
    M: FnMut(&mut T, &mut WireReader<'_>, DecodeContext) -> Result<(), DecodeError>,
{
    let len = decode_varint(r)?;
    let remaining = r.remaining();
    if len > remaining as u64 {
        return Err(DecodeErrorKind::Truncated.into());
    }

    let limit = remaining - len as usize;
    while r.remaining() > limit {
        merge(value, r, ctx)?;
    }

    if r.remaining() != limit {
        return Err(DecodeErrorKind::DelimitedLengthExceeded.into());
    }
    Ok(())
}

/// Consumes the body of the field framed by `wire_type`. Group delimiters
/// (wire types 3 and 4) are fatal.
pub fn skip_field(wire_type: WireType, r: &mut WireReader<'_>) -> Result<(), DecodeError> {
    let len = match wire_type {
        WireType::Varint => decode_varint(r).map(|_| 0)?,
        WireType::ThirtyTwoBit => 4,
        WireType::SixtyFourBit => 8,
        WireType::LengthDelimited => decode_varint(r)?,
        WireType::StartGroup | WireType::EndGroup => {
            return Err(DecodeErrorKind::GroupUnsupported.into());
        }
    };

    if len > r.remaining() as u64 {
        return Err(DecodeErrorKind::Truncated.into());
    }

    r.skip(len as usize)
}

/// Resolves a known field whose key arrived with an unexpected wire type:
/// fatal by default, demoted to unknown-field capture when the decode options
/// ask for it.
pub fn mismatched_field(
    unknown: &mut UnknownFieldSet,
    expected: WireType,
    field_number: u32,
    wire_type: WireType,
    field_start: usize,
    r: &mut WireReader<'_>,
    ctx: DecodeContext,
) -> Result<(), DecodeError> {
    if ctx.ignore_incorrect_types() {
        unknown.merge_field(field_number, wire_type, field_start, r, ctx)
    } else {
        Err(DecodeErrorKind::UnexpectedWireType {
            actual: wire_type,
            expected,
        }
        .into())
    }
}

/// Helper macro which emits an `encode_repeated` function for the type.
macro_rules! encode_repeated {
    ($ty:ty) => {
        pub fn encode_repeated(tag: u32, values: &[$ty], buf: &mut impl BufMut) {
            for value in values {
                encode(tag, value, buf);
            }
        }
    };
}

/// Helper macro which emits a `merge_repeated` function for the numeric type.
/// Packed and unpacked framings are both accepted.
macro_rules! merge_repeated_numeric {
    ($ty:ty,
     $wire_type:expr,
     $merge:ident,
     $merge_repeated:ident) => {
        pub fn $merge_repeated(
            wire_type: WireType,
            values: &mut Vec<$ty>,
            r: &mut WireReader<'_>,
            ctx: DecodeContext,
        ) -> Result<(), DecodeError> {
            if wire_type == WireType::LengthDelimited {
                // Packed.
                merge_loop(values, r, ctx, |values, r, ctx| {
                    let index = values.len();
                    let mut value = Default::default();
                    $merge($wire_type, &mut value, r, ctx)
                        .map_err(|err| err.at_index(index))?;
                    values.push(value);
                    Ok(())
                })
            } else {
                // Unpacked.
                check_wire_type($wire_type, wire_type)?;
                let index = values.len();
                let mut value = Default::default();
                $merge(wire_type, &mut value, r, ctx).map_err(|err| err.at_index(index))?;
                values.push(value);
                Ok(())
            }
        }
    };
}

/// Macro which emits a module containing a set of encoding functions for a
/// variable width numeric type.
macro_rules! varint {
    ($ty:ty,
     $proto_ty:ident) => (
        varint!($ty,
                $proto_ty,
                to_uint64(value) { *value as u64 },
                from_uint64(value) { value as $ty });
    );

    ($ty:ty,
     $proto_ty:ident,
     to_uint64($to_uint64_value:ident) $to_uint64:expr,
     from_uint64($from_uint64_value:ident) $from_uint64:expr) => (

         pub mod $proto_ty {
            use crate::encoding::*;

            pub fn encode(tag: u32, $to_uint64_value: &$ty, buf: &mut impl BufMut) {
                encode_key(tag, WireType::Varint, buf);
                encode_varint($to_uint64, buf);
            }

            pub fn merge(wire_type: WireType, value: &mut $ty, r: &mut WireReader<'_>, _ctx: DecodeContext) -> Result<(), DecodeError> {
                check_wire_type(WireType::Varint, wire_type)?;
                let $from_uint64_value = decode_varint(r)?;
                *value = $from_uint64;
                Ok(())
            }

            encode_repeated!($ty);

            pub fn encode_packed(tag: u32, values: &[$ty], buf: &mut impl BufMut) {
                if values.is_empty() { return; }

                encode_key(tag, WireType::LengthDelimited, buf);
                let len: usize = values.iter().map(|$to_uint64_value| {
                    encoded_len_varint($to_uint64)
                }).sum();
                encode_varint(len as u64, buf);

                for $to_uint64_value in values {
                    encode_varint($to_uint64, buf);
                }
            }

            merge_repeated_numeric!($ty, WireType::Varint, merge, merge_repeated);

            #[inline]
            pub fn encoded_len(tag: u32, $to_uint64_value: &$ty) -> usize {
                key_len(tag) + encoded_len_varint($to_uint64)
            }

            #[inline]
            pub fn encoded_len_repeated(tag: u32, values: &[$ty]) -> usize {
                key_len(tag) * values.len() + values.iter().map(|$to_uint64_value| {
                    encoded_len_varint($to_uint64)
                }).sum::<usize>()
            }

            #[inline]
            pub fn encoded_len_packed(tag: u32, values: &[$ty]) -> usize {
                if values.is_empty() {
                    0
                } else {
                    let len = values.iter()
                                    .map(|$to_uint64_value| encoded_len_varint($to_uint64))
                                    .sum::<usize>();
                    key_len(tag) + encoded_len_varint(len as u64) + len
                }
            }

         }

    );
}
varint!(bool, bool,
        to_uint64(value) u64::from(*value),
        from_uint64(value) value != 0);
varint!(i32, int32);
varint!(i64, int64);
varint!(u64, uint64);
varint!(u32, uint32,
to_uint64(value) u64::from(*value),
from_uint64(value) u32::try_from(value).map_err(|_| {
    DecodeError::from(DecodeErrorKind::IntegerOutOfRange {
        type_name: "uint32",
        value,
    })
})?);
varint!(i32, sint32,
to_uint64(value) {
    ((value << 1) ^ (value >> 31)) as u32 as u64
},
from_uint64(value) {
    let value = value as u32;
    ((value >> 1) as i32) ^ (-((value & 1) as i32))
});
varint!(i64, sint64,
to_uint64(value) {
    ((value << 1) ^ (value >> 63)) as u64
},
from_uint64(value) {
    ((value >> 1) as i64) ^ (-((value & 1) as i64))
});

/// Macro which emits a module containing a set of encoding functions for a
/// fixed width numeric type.
macro_rules! fixed_width {
    ($ty:ty,
     $width:expr,
     $wire_type:expr,
     $proto_ty:ident,
     $put:ident,
     $get:ident) => {
        pub mod $proto_ty {
            use crate::encoding::*;

            pub fn encode(tag: u32, value: &$ty, buf: &mut impl BufMut) {
                encode_key(tag, $wire_type, buf);
                buf.$put(*value);
            }

            pub fn merge(
                wire_type: WireType,
                value: &mut $ty,
                r: &mut WireReader<'_>,
                _ctx: DecodeContext,
            ) -> Result<(), DecodeError> {
                check_wire_type($wire_type, wire_type)?;
                *value = r.$get()?;
                Ok(())
            }

            encode_repeated!($ty);

            pub fn encode_packed(tag: u32, values: &[$ty], buf: &mut impl BufMut) {
                if values.is_empty() {
                    return;
                }

                encode_key(tag, WireType::LengthDelimited, buf);
                let len = values.len() as u64 * $width;
                encode_varint(len, buf);

                for value in values {
                    buf.$put(*value);
                }
            }

            merge_repeated_numeric!($ty, $wire_type, merge, merge_repeated);

            #[inline]
            pub fn encoded_len(tag: u32, _: &$ty) -> usize {
                key_len(tag) + $width
            }

            #[inline]
            pub fn encoded_len_repeated(tag: u32, values: &[$ty]) -> usize {
                (key_len(tag) + $width) * values.len()
            }

            #[inline]
            pub fn encoded_len_packed(tag: u32, values: &[$ty]) -> usize {
                if values.is_empty() {
                    0
                } else {
                    let len = $width * values.len();
                    key_len(tag) + encoded_len_varint(len as u64) + len
                }
            }

        }
    };
}
fixed_width!(
    f32,
    4,
    WireType::ThirtyTwoBit,
    float,
    put_f32_le,
    get_f32_le
);
fixed_width!(
    f64,
    8,
    WireType::SixtyFourBit,
    double,
    put_f64_le,
    get_f64_le
);
fixed_width!(
    u32,
    4,
    WireType::ThirtyTwoBit,
    fixed32,
    put_u32_le,
    get_u32_le
);
fixed_width!(
    u64,
    8,
    WireType::SixtyFourBit,
    fixed64,
    put_u64_le,
    get_u64_le
);
fixed_width!(
    i32,
    4,
    WireType::ThirtyTwoBit,
    sfixed32,
    put_i32_le,
    get_i32_le
);
fixed_width!(
    i64,
    8,
    WireType::SixtyFourBit,
    sfixed64,
    put_i64_le,
    get_i64_le
);

/// Macro which emits encoding functions for a length-delimited type.
macro_rules! length_delimited {
    ($ty:ty) => {
        encode_repeated!($ty);

        pub fn merge_repeated(
            wire_type: WireType,
            values: &mut Vec<$ty>,
            r: &mut WireReader<'_>,
            ctx: DecodeContext,
        ) -> Result<(), DecodeError> {
            check_wire_type(WireType::LengthDelimited, wire_type)?;
            let index = values.len();
            let mut value = Default::default();
            merge(wire_type, &mut value, r, ctx).map_err(|err| err.at_index(index))?;
            values.push(value);
            Ok(())
        }

        #[inline]
        pub fn encoded_len(tag: u32, value: &$ty) -> usize {
            key_len(tag) + encoded_len_varint(value.len() as u64) + value.len()
        }

        #[inline]
        pub fn encoded_len_repeated(tag: u32, values: &[$ty]) -> usize {
            key_len(tag) * values.len()
                + values
                    .iter()
                    .map(|value| encoded_len_varint(value.len() as u64) + value.len())
                    .sum::<usize>()
        }
    };
}

pub mod string {
    use super::*;

    pub fn encode(tag: u32, value: &String, buf: &mut impl BufMut) {
        encode_key(tag, WireType::LengthDelimited, buf);
        encode_varint(value.len() as u64, buf);
        buf.put_slice(value.as_bytes());
    }

    pub fn merge(
        wire_type: WireType,
        value: &mut String,
        r: &mut WireReader<'_>,
        _ctx: DecodeContext,
    ) -> Result<(), DecodeError> {
        check_wire_type(WireType::LengthDelimited, wire_type)?;
        let len = decode_varint(r)?;
        if len > r.remaining() as u64 {
            return Err(DecodeErrorKind::Truncated.into());
        }
        let bytes = r.read_bytes(len as usize)?;
        let s = str::from_utf8(bytes).map_err(|_| DecodeErrorKind::InvalidUtf8)?;
        // Duplicate occurrences of a singular field overwrite: last value wins.
        value.clear();
        value.push_str(s);
        Ok(())
    }

    length_delimited!(String);

}

pub mod bytes {
    use super::*;

    pub fn encode(tag: u32, value: &Vec<u8>, buf: &mut impl BufMut) {
        encode_key(tag, WireType::LengthDelimited, buf);
        encode_varint(value.len() as u64, buf);
        buf.put_slice(value);
    }

    pub fn merge(
        wire_type: WireType,
        value: &mut Vec<u8>,
        r: &mut WireReader<'_>,
        _ctx: DecodeContext,
    ) -> Result<(), DecodeError> {
        check_wire_type(WireType::LengthDelimited, wire_type)?;
        let len = decode_varint(r)?;
        if len > r.remaining() as u64 {
            return Err(DecodeErrorKind::Truncated.into());
        }
        let bytes = r.read_bytes(len as usize)?;
        // Last value wins for duplicate occurrences of a singular field.
        value.clear();
        value.extend_from_slice(bytes);
        Ok(())
    }

    length_delimited!(Vec<u8>);

}

pub mod enumeration {
    use super::*;
    use crate::error::UnknownEnumValue;

    pub fn encode<E>(tag: u32, value: &E, buf: &mut impl BufMut)
    where
        E: Copy + Into<i32>,
    {
        encode_key(tag, WireType::Varint, buf);
        // Sign-extended 64-bit form, like int32.
        encode_varint(i64::from((*value).into()) as u64, buf);
    }

    pub fn merge<E>(
        wire_type: WireType,
        value: &mut E,
        r: &mut WireReader<'_>,
        _ctx: DecodeContext,
    ) -> Result<(), DecodeError>
    where
        E: TryFrom<i32, Error = UnknownEnumValue>,
    {
        check_wire_type(WireType::Varint, wire_type)?;
        let raw = decode_varint(r)? as i32;
        *value = E::try_from(raw)
            .map_err(|UnknownEnumValue(value)| DecodeErrorKind::UnknownEnumValue { value })?;
        Ok(())
    }

    pub fn encode_repeated<E>(tag: u32, values: &[E], buf: &mut impl BufMut)
    where
        E: Copy + Into<i32>,
    {
        for value in values {
            encode(tag, value, buf);
        }
    }

    pub fn encode_packed<E>(tag: u32, values: &[E], buf: &mut impl BufMut)
    where
        E: Copy + Into<i32>,
    {
        if values.is_empty() {
            return;
        }

        encode_key(tag, WireType::LengthDelimited, buf);
        let len: usize = values
            .iter()
            .map(|value| encoded_len_varint(i64::from((*value).into()) as u64))
            .sum();
        encode_varint(len as u64, buf);

        for value in values {
            encode_varint(i64::from((*value).into()) as u64, buf);
        }
    }

    pub fn merge_repeated<E>(
        wire_type: WireType,
        values: &mut Vec<E>,
        r: &mut WireReader<'_>,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError>
    where
        E: Default + TryFrom<i32, Error = UnknownEnumValue>,
    {
        if wire_type == WireType::LengthDelimited {
            // Packed.
            merge_loop(values, r, ctx, |values, r, ctx| {
                let index = values.len();
                let mut value = E::default();
                merge(WireType::Varint, &mut value, r, ctx)
                    .map_err(|err| err.at_index(index))?;
                values.push(value);
                Ok(())
            })
        } else {
            // Unpacked.
            check_wire_type(WireType::Varint, wire_type)?;
            let index = values.len();
            let mut value = E::default();
            merge(wire_type, &mut value, r, ctx).map_err(|err| err.at_index(index))?;
            values.push(value);
            Ok(())
        }
    }

    #[inline]
    pub fn encoded_len<E>(tag: u32, value: &E) -> usize
    where
        E: Copy + Into<i32>,
    {
        key_len(tag) + encoded_len_varint(i64::from((*value).into()) as u64)
    }

    #[inline]
    pub fn encoded_len_repeated<E>(tag: u32, values: &[E]) -> usize
    where
        E: Copy + Into<i32>,
    {
        key_len(tag) * values.len()
            + values
                .iter()
                .map(|value| encoded_len_varint(i64::from((*value).into()) as u64))
                .sum::<usize>()
    }

    #[inline]
    pub fn encoded_len_packed<E>(tag: u32, values: &[E]) -> usize
    where
        E: Copy + Into<i32>,
    {
        if values.is_empty() {
            0
        } else {
            let len = values
                .iter()
                .map(|value| encoded_len_varint(i64::from((*value).into()) as u64))
                .sum::<usize>();
            key_len(tag) + encoded_len_varint(len as u64) + len
        }
    }
}

pub mod message {
    use super::*;

    pub fn encode<M>(tag: u32, msg: &M, buf: &mut impl BufMut)
    where
        M: Message,
    {
        encode_key(tag, WireType::LengthDelimited, buf);
        encode_varint(msg.encoded_len() as u64, buf);
        msg.encode_raw(buf);
    }

    pub fn merge<M>(
        wire_type: WireType,
        msg: &mut M,
        r: &mut WireReader<'_>,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError>
    where
        M: Message,
    {
        check_wire_type(WireType::LengthDelimited, wire_type)?;
        ctx.limit_reached()?;
        merge_loop(
            msg,
            r,
            ctx.enter_recursion(),
            |msg: &mut M, r: &mut WireReader<'_>, ctx| {
                let field_start = r.position();
                let (field_number, wire_type) = decode_key(r)?;
                msg.merge_field(field_number, wire_type, field_start, r, ctx)
            },
        )
    }

    pub fn encode_repeated<M>(tag: u32, messages: &[M], buf: &mut impl BufMut)
    where
        M: Message,
    {
        for msg in messages {
            encode(tag, msg, buf);
        }
    }

    pub fn merge_repeated<M>(
        wire_type: WireType,
        messages: &mut Vec<M>,
        r: &mut WireReader<'_>,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError>
    where
        M: Message + Default,
    {
        check_wire_type(WireType::LengthDelimited, wire_type)?;
        let index = messages.len();
        let mut msg = M::default();
        merge(WireType::LengthDelimited, &mut msg, r, ctx)
            .map_err(|err| err.at_index(index))?;
        messages.push(msg);
        Ok(())
    }

    #[inline]
    pub fn encoded_len<M>(tag: u32, msg: &M) -> usize
    where
        M: Message,
    {
        let len = msg.encoded_len();
        key_len(tag) + encoded_len_varint(len as u64) + len
    }

    #[inline]
    pub fn encoded_len_repeated<M>(tag: u32, messages: &[M]) -> usize
    where
        M: Message,
    {
        key_len(tag) * messages.len()
            + messages
                .iter()
                .map(Message::encoded_len)
                .map(|len| len + encoded_len_varint(len as u64))
                .sum::<usize>()
    }
}

/// Rust doesn't have a `Map` trait, so macros are currently the best way to be
/// generic over `HashMap` and `BTreeMap`.
macro_rules! map {
    ($map_ty:ident) => {
        use crate::encoding::*;
        use core::hash::Hash;

        /// Generic protobuf map encode function.
        ///
        /// Map entries are wire-equivalent to a two-field message; key and
        /// value are always written, even when they hold their defaults.
        pub fn encode<K, V, B, KE, KL, VE, VL>(
            key_encode: KE,
            key_encoded_len: KL,
            val_encode: VE,
            val_encoded_len: VL,
            tag: u32,
            values: &$map_ty<K, V>,
            buf: &mut B,
        ) where
            K: Eq + Hash + Ord,
            B: BufMut,
            KE: Fn(u32, &K, &mut B),
            KL: Fn(u32, &K) -> usize,
            VE: Fn(u32, &V, &mut B),
            VL: Fn(u32, &V) -> usize,
        {
            for (key, val) in values.iter() {
                let len = key_encoded_len(1, key) + val_encoded_len(2, val);

                encode_key(tag, WireType::LengthDelimited, buf);
                encode_varint(len as u64, buf);
                key_encode(1, key, buf);
                val_encode(2, val, buf);
            }
        }

        /// Generic protobuf map merge function.
        ///
        /// Only entry fields 1 and 2 are honored; other field numbers inside
        /// an entry are skipped silently. A missing key or value is filled
        /// with the type's default, and duplicate keys resolve last-wins.
        pub fn merge<K, V, KM, VM>(
            key_merge: KM,
            val_merge: VM,
            values: &mut $map_ty<K, V>,
            r: &mut WireReader<'_>,
            ctx: DecodeContext,
        ) -> Result<(), DecodeError>
        where
            K: Default + Eq + Hash + Ord,
            V: Default,
            KM: Fn(WireType, &mut K, &mut WireReader<'_>, DecodeContext) -> Result<(), DecodeError>,
            VM: Fn(WireType, &mut V, &mut WireReader<'_>, DecodeContext) -> Result<(), DecodeError>,
        {
            ctx.limit_reached()?;
            let mut key = K::default();
            let mut val = V::default();
            merge_loop(
                &mut (&mut key, &mut val),
                r,
                ctx.enter_recursion(),
                |&mut (ref mut key, ref mut val), r, ctx| {
                    let (field_number, wire_type) = decode_key(r)?;
                    match field_number {
                        1 => key_merge(wire_type, key, r, ctx),
                        2 => val_merge(wire_type, val, r, ctx),
                        _ => skip_field(wire_type, r),
                    }
                },
            )?;
            values.insert(key, val);

            Ok(())
        }

        /// Generic protobuf map encoded-length function.
        pub fn encoded_len<K, V, KL, VL>(
            key_encoded_len: KL,
            val_encoded_len: VL,
            tag: u32,
            values: &$map_ty<K, V>,
        ) -> usize
        where
            K: Eq + Hash + Ord,
            KL: Fn(u32, &K) -> usize,
            VL: Fn(u32, &V) -> usize,
        {
            key_len(tag) * values.len()
                + values
                    .iter()
                    .map(|(key, val)| {
                        let len = key_encoded_len(1, key) + val_encoded_len(2, val);
                        encoded_len_varint(len as u64) + len
                    })
                    .sum::<usize>()
        }
    };
}

pub mod btree_map {
    use std::collections::BTreeMap;
    map!(BTreeMap);
}

pub mod hash_map {
    use std::collections::HashMap;
    map!(HashMap);
}
