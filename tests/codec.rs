//! End-to-end tests of the message engine through a generated-shape module.
//!
//! The `demo` module below mirrors what `protolith-build` emits for the demo
//! schema (see the generator's own tests): an enum, a plain message, a
//! message exercising every field-group shape, and a recursive message with a
//! boxed slot.

#![allow(dead_code)]

use std::collections::BTreeMap;

use protolith::{DecodeErrorKind, DecodeOptions, MapKey, Message, Value};

pub mod demo {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    #[repr(i32)]
    pub enum MyEnum {
        Value0 = 0,
        Value1 = 1,
        Value3 = 3,
    }

    impl MyEnum {
        /// Returns `true` if `value` is a variant of `MyEnum`.
        pub fn is_valid(value: i32) -> bool {
            match value {
                0 => true,
                1 => true,
                3 => true,
                _ => false,
            }
        }

        /// The declared name of the member.
        pub fn name(&self) -> &'static str {
            match self {
                MyEnum::Value0 => "VALUE0",
                MyEnum::Value1 => "VALUE1",
                MyEnum::Value3 => "VALUE3",
            }
        }
    }

    impl ::core::default::Default for MyEnum {
        fn default() -> MyEnum {
            MyEnum::Value0
        }
    }

    impl ::core::convert::From<MyEnum> for i32 {
        fn from(value: MyEnum) -> i32 {
            value as i32
        }
    }

    impl ::core::convert::TryFrom<i32> for MyEnum {
        type Error = ::protolith::UnknownEnumValue;

        fn try_from(value: i32) -> ::core::result::Result<MyEnum, ::protolith::UnknownEnumValue> {
            match value {
                0 => ::core::result::Result::Ok(MyEnum::Value0),
                1 => ::core::result::Result::Ok(MyEnum::Value1),
                3 => ::core::result::Result::Ok(MyEnum::Value3),
                _ => ::core::result::Result::Err(::protolith::UnknownEnumValue(value)),
            }
        }
    }

    #[derive(Clone, PartialEq)]
    pub struct Inner {
        pub name: ::std::string::String,
        pub count: i32,
        /// Wire fields not present in the schema, retained verbatim.
        pub unknown_fields: ::protolith::UnknownFieldSet,
    }

    impl ::protolith::Message for Inner {
        fn encode_raw(&self, buf: &mut impl ::protolith::bytes::BufMut) {
            if !self.name.is_empty() {
                ::protolith::encoding::string::encode(1, &self.name, buf);
            }
            if self.count != 0 {
                ::protolith::encoding::int32::encode(2, &self.count, buf);
            }
            self.unknown_fields.encode_raw(buf);
        }

        fn merge_field(
            &mut self,
            field_number: u32,
            wire_type: ::protolith::encoding::WireType,
            field_start: usize,
            r: &mut ::protolith::WireReader<'_>,
            ctx: ::protolith::encoding::DecodeContext,
        ) -> ::core::result::Result<(), ::protolith::DecodeError> {
            match field_number {
                1 => {
                    let result = if wire_type == ::protolith::encoding::WireType::LengthDelimited {
                        ::protolith::encoding::string::merge(wire_type, &mut self.name, r, ctx)
                    } else {
                        ::protolith::encoding::mismatched_field(
                            &mut self.unknown_fields,
                            ::protolith::encoding::WireType::LengthDelimited,
                            field_number,
                            wire_type,
                            field_start,
                            r,
                            ctx,
                        )
                    };
                    result.map_err(|err| err.at_field("name", 1, field_start))
                }
                2 => {
                    let result = if wire_type == ::protolith::encoding::WireType::Varint {
                        ::protolith::encoding::int32::merge(wire_type, &mut self.count, r, ctx)
                    } else {
                        ::protolith::encoding::mismatched_field(
                            &mut self.unknown_fields,
                            ::protolith::encoding::WireType::Varint,
                            field_number,
                            wire_type,
                            field_start,
                            r,
                            ctx,
                        )
                    };
                    result.map_err(|err| err.at_field("count", 2, field_start))
                }
                _ => self.unknown_fields.merge_field(field_number, wire_type, field_start, r, ctx),
            }
        }

        fn encoded_len(&self) -> usize {
            0
                + if !self.name.is_empty() { ::protolith::encoding::string::encoded_len(1, &self.name) } else { 0 }
                + if self.count != 0 { ::protolith::encoding::int32::encoded_len(2, &self.count) } else { 0 }
                + self.unknown_fields.encoded_len()
        }

        fn clear(&mut self) {
            self.name = ::core::default::Default::default();
            self.count = ::core::default::Default::default();
            self.unknown_fields.clear();
        }
    }

    impl ::core::default::Default for Inner {
        fn default() -> Self {
            Inner {
                name: ::core::default::Default::default(),
                count: ::core::default::Default::default(),
                unknown_fields: ::core::default::Default::default(),
            }
        }
    }

    impl ::core::fmt::Debug for Inner {
        fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
            let mut builder = f.debug_struct("demo.Inner");
            builder.field("name", &::protolith::fmt::TruncatedStr(&self.name));
            builder.field("count", &self.count);
            builder.finish()
        }
    }

    impl Inner {
        /// Projects the message onto a generic [`::protolith::Value`] tree.
        pub fn to_value(&self) -> ::protolith::Value {
            let mut fields = ::std::collections::BTreeMap::new();
            fields.insert("name", ::protolith::Value::String(self.name.clone()));
            fields.insert("count", ::protolith::Value::I32(self.count));
            ::protolith::Value::Message(fields)
        }

        /// Whether any unknown fields were retained by decoding.
        pub fn has_unknown(&self) -> bool {
            !self.unknown_fields.is_empty()
        }

        /// Drops all retained unknown fields.
        pub fn clear_unknown(&mut self) {
            self.unknown_fields.clear()
        }
    }

    #[derive(Clone, PartialEq)]
    pub struct LongMessage {
        pub f_oneof: long_message::FOneof,
        pub f_uint64: ::std::vec::Vec<u64>,
        pub f_maybe_bytes: ::core::option::Option<::std::vec::Vec<u8>>,
        pub f_map_str_float: ::std::collections::BTreeMap<::std::string::String, f32>,
        pub f_inner: ::core::option::Option<Inner>,
        pub f_sint32: i32,
        /// Wire fields not present in the schema, retained verbatim.
        pub unknown_fields: ::protolith::UnknownFieldSet,
    }

    impl ::protolith::Message for LongMessage {
        fn encode_raw(&self, buf: &mut impl ::protolith::bytes::BufMut) {
            self.f_oneof.encode(buf);
            ::protolith::encoding::uint64::encode_packed(3, &self.f_uint64, buf);
            if let ::core::option::Option::Some(value) = &self.f_maybe_bytes {
                ::protolith::encoding::bytes::encode(4, value, buf);
            }
            ::protolith::encoding::btree_map::encode(
                ::protolith::encoding::string::encode,
                ::protolith::encoding::string::encoded_len,
                ::protolith::encoding::float::encode,
                ::protolith::encoding::float::encoded_len,
                5,
                &self.f_map_str_float,
                buf,
            );
            if let ::core::option::Option::Some(value) = &self.f_inner {
                if ::protolith::Message::encoded_len(value) != 0 {
                    ::protolith::encoding::message::encode(6, value, buf);
                }
            }
            if self.f_sint32 != 0 {
                ::protolith::encoding::sint32::encode(7, &self.f_sint32, buf);
            }
            self.unknown_fields.encode_raw(buf);
        }

        fn merge_field(
            &mut self,
            field_number: u32,
            wire_type: ::protolith::encoding::WireType,
            field_start: usize,
            r: &mut ::protolith::WireReader<'_>,
            ctx: ::protolith::encoding::DecodeContext,
        ) -> ::core::result::Result<(), ::protolith::DecodeError> {
            match field_number {
                1 | 2 => {
                    let expected = match field_number {
                        1 => ::protolith::encoding::WireType::Varint,
                        _ => ::protolith::encoding::WireType::LengthDelimited,
                    };
                    let result = if wire_type == expected {
                        long_message::FOneof::merge(&mut self.f_oneof, field_number, wire_type, r, ctx)
                    } else {
                        ::protolith::encoding::mismatched_field(
                            &mut self.unknown_fields,
                            expected,
                            field_number,
                            wire_type,
                            field_start,
                            r,
                            ctx,
                        )
                    };
                    result.map_err(|err| err.at_field("f_oneof", field_number, field_start))
                }
                3 => {
                    let result = if wire_type == ::protolith::encoding::WireType::Varint
                        || wire_type == ::protolith::encoding::WireType::LengthDelimited
                    {
                        ::protolith::encoding::uint64::merge_repeated(wire_type, &mut self.f_uint64, r, ctx)
                    } else {
                        ::protolith::encoding::mismatched_field(
                            &mut self.unknown_fields,
                            ::protolith::encoding::WireType::Varint,
                            field_number,
                            wire_type,
                            field_start,
                            r,
                            ctx,
                        )
                    };
                    result.map_err(|err| err.at_field("f_uint64", 3, field_start))
                }
                4 => {
                    let result = if wire_type == ::protolith::encoding::WireType::LengthDelimited {
                        let value = self.f_maybe_bytes.get_or_insert_with(::core::default::Default::default);
                        ::protolith::encoding::bytes::merge(wire_type, value, r, ctx)
                    } else {
                        ::protolith::encoding::mismatched_field(
                            &mut self.unknown_fields,
                            ::protolith::encoding::WireType::LengthDelimited,
                            field_number,
                            wire_type,
                            field_start,
                            r,
                            ctx,
                        )
                    };
                    result.map_err(|err| err.at_field("f_maybe_bytes", 4, field_start))
                }
                5 => {
                    let result = if wire_type == ::protolith::encoding::WireType::LengthDelimited {
                        ::protolith::encoding::btree_map::merge(
                            ::protolith::encoding::string::merge,
                            ::protolith::encoding::float::merge,
                            &mut self.f_map_str_float,
                            r,
                            ctx,
                        )
                    } else {
                        ::protolith::encoding::mismatched_field(
                            &mut self.unknown_fields,
                            ::protolith::encoding::WireType::LengthDelimited,
                            field_number,
                            wire_type,
                            field_start,
                            r,
                            ctx,
                        )
                    };
                    result.map_err(|err| err.at_field("f_map_str_float", 5, field_start))
                }
                6 => {
                    let result = if wire_type == ::protolith::encoding::WireType::LengthDelimited {
                        let value = self.f_inner.get_or_insert_with(::core::default::Default::default);
                        ::protolith::encoding::message::merge(wire_type, value, r, ctx)
                    } else {
                        ::protolith::encoding::mismatched_field(
                            &mut self.unknown_fields,
                            ::protolith::encoding::WireType::LengthDelimited,
                            field_number,
                            wire_type,
                            field_start,
                            r,
                            ctx,
                        )
                    };
                    result.map_err(|err| err.at_field("f_inner", 6, field_start))
                }
                7 => {
                    let result = if wire_type == ::protolith::encoding::WireType::Varint {
                        ::protolith::encoding::sint32::merge(wire_type, &mut self.f_sint32, r, ctx)
                    } else {
                        ::protolith::encoding::mismatched_field(
                            &mut self.unknown_fields,
                            ::protolith::encoding::WireType::Varint,
                            field_number,
                            wire_type,
                            field_start,
                            r,
                            ctx,
                        )
                    };
                    result.map_err(|err| err.at_field("f_sint32", 7, field_start))
                }
                _ => self.unknown_fields.merge_field(field_number, wire_type, field_start, r, ctx),
            }
        }

        fn encoded_len(&self) -> usize {
            0
                + self.f_oneof.encoded_len()
                + ::protolith::encoding::uint64::encoded_len_packed(3, &self.f_uint64)
                + self.f_maybe_bytes.as_ref().map_or(0, |value| ::protolith::encoding::bytes::encoded_len(4, value))
                + ::protolith::encoding::btree_map::encoded_len(
                    ::protolith::encoding::string::encoded_len,
                    ::protolith::encoding::float::encoded_len,
                    5,
                    &self.f_map_str_float,
                )
                + self.f_inner.as_ref().map_or(0, |value| {
                    if ::protolith::Message::encoded_len(value) != 0 {
                        ::protolith::encoding::message::encoded_len(6, value)
                    } else {
                        0
                    }
                })
                + if self.f_sint32 != 0 { ::protolith::encoding::sint32::encoded_len(7, &self.f_sint32) } else { 0 }
                + self.unknown_fields.encoded_len()
        }

        fn clear(&mut self) {
            self.f_oneof = ::core::default::Default::default();
            self.f_uint64.clear();
            self.f_maybe_bytes = ::core::option::Option::None;
            self.f_map_str_float.clear();
            self.f_inner = ::core::option::Option::None;
            self.f_sint32 = ::core::default::Default::default();
            self.unknown_fields.clear();
        }
    }

    impl ::core::default::Default for LongMessage {
        fn default() -> Self {
            LongMessage {
                f_oneof: ::core::default::Default::default(),
                f_uint64: ::core::default::Default::default(),
                f_maybe_bytes: ::core::default::Default::default(),
                f_map_str_float: ::core::default::Default::default(),
                f_inner: ::core::default::Default::default(),
                f_sint32: ::core::default::Default::default(),
                unknown_fields: ::core::default::Default::default(),
            }
        }
    }

    impl ::core::fmt::Debug for LongMessage {
        fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
            let mut builder = f.debug_struct("demo.LongMessage");
            builder.field("f_oneof", &self.f_oneof);
            builder.field("f_uint64", &self.f_uint64);
            builder.field("f_maybe_bytes", &self.f_maybe_bytes.as_ref().map(|value| ::protolith::fmt::TruncatedBytes(value)));
            builder.field("f_map_str_float", &self.f_map_str_float);
            builder.field("f_inner", &self.f_inner);
            builder.field("f_sint32", &self.f_sint32);
            builder.finish()
        }
    }

    impl LongMessage {
        /// Projects the message onto a generic [`::protolith::Value`] tree.
        pub fn to_value(&self) -> ::protolith::Value {
            let mut fields = ::std::collections::BTreeMap::new();
            fields.insert("f_oneof", self.f_oneof.to_value());
            fields.insert("f_uint64", ::protolith::Value::List(self.f_uint64.iter().map(|value| ::protolith::Value::U64(*value)).collect()));
            fields.insert("f_maybe_bytes", match &self.f_maybe_bytes {
                ::core::option::Option::Some(value) => ::protolith::Value::Bytes(value.clone()),
                ::core::option::Option::None => ::protolith::Value::None,
            });
            fields.insert("f_map_str_float", ::protolith::Value::Map(self.f_map_str_float.iter().map(|(key, value)| (::protolith::MapKey::String(key.clone()), ::protolith::Value::F32(*value))).collect()));
            fields.insert("f_inner", match &self.f_inner {
                ::core::option::Option::Some(value) => value.to_value(),
                ::core::option::Option::None => ::protolith::Value::None,
            });
            fields.insert("f_sint32", ::protolith::Value::I32(self.f_sint32));
            ::protolith::Value::Message(fields)
        }

        /// Whether any unknown fields were retained by decoding.
        pub fn has_unknown(&self) -> bool {
            !self.unknown_fields.is_empty()
        }

        /// Drops all retained unknown fields.
        pub fn clear_unknown(&mut self) {
            self.unknown_fields.clear()
        }
    }

    /// Nested oneof types in `LongMessage`.
    pub mod long_message {
        #[derive(Clone, PartialEq)]
        pub enum FOneof {
            FEnum(super::MyEnum),
            FText(::std::string::String),
        }

        impl FOneof {
            /// Encodes the chosen candidate, eliding a default value.
            pub fn encode(&self, buf: &mut impl ::protolith::bytes::BufMut) {
                match self {
                    FOneof::FEnum(value) => {
                        if *value != super::MyEnum::default() {
                            ::protolith::encoding::enumeration::encode(1, value, buf);
                        }
                    }
                    FOneof::FText(value) => {
                        if !value.is_empty() {
                            ::protolith::encoding::string::encode(2, value, buf);
                        }
                    }
                }
            }

            /// Decodes one candidate field into the shared slot.
            pub fn merge(
                value: &mut FOneof,
                field_number: u32,
                wire_type: ::protolith::encoding::WireType,
                r: &mut ::protolith::WireReader<'_>,
                ctx: ::protolith::encoding::DecodeContext,
            ) -> ::core::result::Result<(), ::protolith::DecodeError> {
                match field_number {
                    1 => {
                        let mut v: super::MyEnum = ::core::default::Default::default();
                        ::protolith::encoding::enumeration::merge(wire_type, &mut v, r, ctx)?;
                        *value = FOneof::FEnum(v);
                        ::core::result::Result::Ok(())
                    }
                    2 => {
                        let mut v: ::std::string::String = ::core::default::Default::default();
                        ::protolith::encoding::string::merge(wire_type, &mut v, r, ctx)?;
                        *value = FOneof::FText(v);
                        ::core::result::Result::Ok(())
                    }
                    _ => unreachable!("invalid oneof field number: {}", field_number),
                }
            }

            pub fn encoded_len(&self) -> usize {
                match self {
                    FOneof::FEnum(value) => {
                        if *value != super::MyEnum::default() {
                            ::protolith::encoding::enumeration::encoded_len(1, value)
                        } else {
                            0
                        }
                    }
                    FOneof::FText(value) => {
                        if !value.is_empty() {
                            ::protolith::encoding::string::encoded_len(2, value)
                        } else {
                            0
                        }
                    }
                }
            }

            pub fn to_value(&self) -> ::protolith::Value {
                match self {
                    FOneof::FEnum(value) => ::protolith::Value::Enum(value.name()),
                    FOneof::FText(value) => ::protolith::Value::String(value.clone()),
                }
            }
        }

        impl ::core::default::Default for FOneof {
            fn default() -> Self {
                FOneof::FEnum(::core::default::Default::default())
            }
        }

        impl ::core::fmt::Debug for FOneof {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                match self {
                    FOneof::FEnum(value) => f.debug_tuple("FEnum").field(value).finish(),
                    FOneof::FText(value) => f.debug_tuple("FText").field(&::protolith::fmt::TruncatedStr(value)).finish(),
                }
            }
        }
    }

    #[derive(Clone, PartialEq)]
    pub struct Node {
        pub id: u32,
        pub next: ::core::option::Option<::std::boxed::Box<Node>>,
        /// Wire fields not present in the schema, retained verbatim.
        pub unknown_fields: ::protolith::UnknownFieldSet,
    }

    impl ::protolith::Message for Node {
        fn encode_raw(&self, buf: &mut impl ::protolith::bytes::BufMut) {
            if self.id != 0 {
                ::protolith::encoding::uint32::encode(1, &self.id, buf);
            }
            if let ::core::option::Option::Some(value) = &self.next {
                if ::protolith::Message::encoded_len(value) != 0 {
                    ::protolith::encoding::message::encode(2, value, buf);
                }
            }
            self.unknown_fields.encode_raw(buf);
        }

        fn merge_field(
            &mut self,
            field_number: u32,
            wire_type: ::protolith::encoding::WireType,
            field_start: usize,
            r: &mut ::protolith::WireReader<'_>,
            ctx: ::protolith::encoding::DecodeContext,
        ) -> ::core::result::Result<(), ::protolith::DecodeError> {
            match field_number {
                1 => {
                    let result = if wire_type == ::protolith::encoding::WireType::Varint {
                        ::protolith::encoding::uint32::merge(wire_type, &mut self.id, r, ctx)
                    } else {
                        ::protolith::encoding::mismatched_field(
                            &mut self.unknown_fields,
                            ::protolith::encoding::WireType::Varint,
                            field_number,
                            wire_type,
                            field_start,
                            r,
                            ctx,
                        )
                    };
                    result.map_err(|err| err.at_field("id", 1, field_start))
                }
                2 => {
                    let result = if wire_type == ::protolith::encoding::WireType::LengthDelimited {
                        let value = self.next.get_or_insert_with(::core::default::Default::default);
                        ::protolith::encoding::message::merge(wire_type, value, r, ctx)
                    } else {
                        ::protolith::encoding::mismatched_field(
                            &mut self.unknown_fields,
                            ::protolith::encoding::WireType::LengthDelimited,
                            field_number,
                            wire_type,
                            field_start,
                            r,
                            ctx,
                        )
                    };
                    result.map_err(|err| err.at_field("next", 2, field_start))
                }
                _ => self.unknown_fields.merge_field(field_number, wire_type, field_start, r, ctx),
            }
        }

        fn encoded_len(&self) -> usize {
            0
                + if self.id != 0 { ::protolith::encoding::uint32::encoded_len(1, &self.id) } else { 0 }
                + self.next.as_ref().map_or(0, |value| {
                    if ::protolith::Message::encoded_len(value) != 0 {
                        ::protolith::encoding::message::encoded_len(2, value)
                    } else {
                        0
                    }
                })
                + self.unknown_fields.encoded_len()
        }

        fn clear(&mut self) {
            self.id = ::core::default::Default::default();
            self.next = ::core::option::Option::None;
            self.unknown_fields.clear();
        }
    }

    impl ::core::default::Default for Node {
        fn default() -> Self {
            Node {
                id: ::core::default::Default::default(),
                next: ::core::default::Default::default(),
                unknown_fields: ::core::default::Default::default(),
            }
        }
    }

    impl ::core::fmt::Debug for Node {
        fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
            let mut builder = f.debug_struct("demo.Node");
            builder.field("id", &self.id);
            builder.field("next", &self.next);
            builder.finish()
        }
    }

    impl Node {
        /// Projects the message onto a generic [`::protolith::Value`] tree.
        pub fn to_value(&self) -> ::protolith::Value {
            let mut fields = ::std::collections::BTreeMap::new();
            fields.insert("id", ::protolith::Value::U32(self.id));
            fields.insert("next", match &self.next {
                ::core::option::Option::Some(value) => value.to_value(),
                ::core::option::Option::None => ::protolith::Value::None,
            });
            ::protolith::Value::Message(fields)
        }

        /// Whether any unknown fields were retained by decoding.
        pub fn has_unknown(&self) -> bool {
            !self.unknown_fields.is_empty()
        }

        /// Drops all retained unknown fields.
        pub fn clear_unknown(&mut self) {
            self.unknown_fields.clear()
        }
    }
}

use demo::long_message::FOneof;
use demo::{Inner, LongMessage, MyEnum, Node};

#[test]
fn populated_message_encodes_canonically() {
    let msg = LongMessage {
        f_oneof: FOneof::FText("hi".to_string()),
        f_uint64: vec![1, 2, 300],
        f_map_str_float: BTreeMap::from([("k".to_string(), 1.5f32)]),
        ..Default::default()
    };

    let bytes = msg.encode_to_vec();
    assert_eq!(
        bytes,
        [
            0x12, 0x02, 0x68, 0x69, // f_oneof: field 2, "hi"
            0x1A, 0x04, 0x01, 0x02, 0xAC, 0x02, // f_uint64 packed
            0x2A, 0x08, 0x0A, 0x01, 0x6B, 0x15, 0x00, 0x00, 0xC0, 0x3F, // map entry
        ]
    );
    assert_eq!(msg.encoded_len(), bytes.len());

    // Round trip and canonical stability.
    let decoded = LongMessage::decode(&bytes).unwrap();
    assert_eq!(decoded, msg);
    assert_eq!(decoded.encode_to_vec(), bytes);
}

#[test]
fn enum_members_are_bijective_with_their_integers() {
    assert!(MyEnum::is_valid(3));
    assert!(!MyEnum::is_valid(2));
    assert_eq!(i32::from(MyEnum::Value3), 3);
    assert_eq!(MyEnum::try_from(1), Ok(MyEnum::Value1));
    assert_eq!(
        MyEnum::try_from(2),
        Err(protolith::UnknownEnumValue(2))
    );
    assert_eq!(MyEnum::default(), MyEnum::Value0);
    assert_eq!(MyEnum::Value1.name(), "VALUE1");
}

#[test]
fn enum_oneof_round_trips_as_member() {
    let msg = LongMessage {
        f_oneof: FOneof::FEnum(MyEnum::Value3),
        ..Default::default()
    };
    let bytes = msg.encode_to_vec();
    assert_eq!(bytes, [0x08, 0x03]);

    let decoded = LongMessage::decode(&bytes).unwrap();
    assert_eq!(decoded.f_oneof, FOneof::FEnum(MyEnum::Value3));
    assert_eq!(decoded, msg);
}

#[test]
fn all_defaults_encode_to_empty() {
    assert_eq!(LongMessage::default().encode_to_vec(), Vec::<u8>::new());
    // The oneof slot holds the zero-valued enum, which is the type default
    // and is elided.
    assert_eq!(
        LongMessage::default().f_oneof,
        FOneof::FEnum(MyEnum::Value0)
    );
}

#[test]
fn wire_type_mismatch_is_fatal_by_default() {
    // Field 2 is the string oneof candidate, framed here as a varint.
    let err = LongMessage::decode(&[0x10, 0x01]).unwrap_err();
    assert_eq!(
        err.kind(),
        &DecodeErrorKind::UnexpectedWireType {
            actual: protolith::encoding::WireType::Varint,
            expected: protolith::encoding::WireType::LengthDelimited,
        }
    );
    assert_eq!(
        err.to_string(),
        "failed to decode message: (Field:f_oneof#2+0x0) \
         invalid wire type: Varint (expected LengthDelimited)"
    );
}

#[test]
fn wire_type_mismatch_demotes_to_unknown_when_asked() {
    let options = DecodeOptions::new().ignore_incorrect_types(true);
    let msg = LongMessage::decode_with(&[0x10, 0x01], options).unwrap();

    assert!(msg.has_unknown());
    assert_eq!(msg.f_oneof, FOneof::default());
    // The mismatched bytes survive verbatim at the end of re-serialization.
    assert_eq!(msg.encode_to_vec(), [0x10, 0x01]);
}

#[test]
fn unpacked_duplicates_accumulate() {
    let msg = LongMessage::decode(&[0x18, 0xAC, 0x02, 0x18, 0x05]).unwrap();
    assert_eq!(msg.f_uint64, [300, 5]);
}

#[test]
fn packed_and_unpacked_decode_equal() {
    let packed = LongMessage::decode(&[0x1A, 0x04, 0x01, 0x02, 0xAC, 0x02]).unwrap();
    let unpacked =
        LongMessage::decode(&[0x18, 0x01, 0x18, 0x02, 0x18, 0xAC, 0x02]).unwrap();
    assert_eq!(packed, unpacked);
    assert_eq!(packed.f_uint64, [1, 2, 300]);
}

#[test]
fn oversized_varint_fails_with_field_context() {
    let mut bytes = vec![0x08];
    bytes.extend_from_slice(&[0xFF; 10]);
    bytes.push(0x02);

    let err = LongMessage::decode(&bytes).unwrap_err();
    assert_eq!(err.kind(), &DecodeErrorKind::VarintTooLong);
    assert_eq!(
        err.to_string(),
        "failed to decode message: (Field:f_oneof#1+0x0) \
         varint has more than 10 7-bit digits"
    );
}

#[test]
fn repeated_element_errors_carry_the_index() {
    // Packed region of two bytes whose second element is a truncated varint.
    let err = LongMessage::decode(&[0x1A, 0x02, 0x01, 0x80]).unwrap_err();
    assert_eq!(err.kind(), &DecodeErrorKind::Truncated);
    assert_eq!(
        err.to_string(),
        "failed to decode message: (Field:f_uint64#3+0x0)(Index:1) buffer underflow"
    );
}

#[test]
fn nested_field_errors_chain_context_frames() {
    // f_inner { name: <one 0xFF byte> } — invalid UTF-8 two levels down.
    let err = LongMessage::decode(&[0x32, 0x03, 0x0A, 0x01, 0xFF]).unwrap_err();
    assert_eq!(err.kind(), &DecodeErrorKind::InvalidUtf8);
    assert_eq!(
        err.to_string(),
        "failed to decode message: (Field:f_inner#6+0x0)(Field:name#1+0x2) \
         invalid string value: data is not UTF-8 encoded"
    );
}

#[test]
fn unknown_enum_values_fail() {
    let err = LongMessage::decode(&[0x08, 0x04]).unwrap_err();
    assert_eq!(err.kind(), &DecodeErrorKind::UnknownEnumValue { value: 4 });
}

#[test]
fn unknown_fields_round_trip_verbatim() {
    // f_sint32 = -2, plus field 99 (not in the schema).
    let bytes = [
        0x38, 0x03, // field 7, zigzag(-2)
        0x9A, 0x06, 0x03, 0x61, 0x62, 0x63, // field 99, "abc"
    ];
    let msg = LongMessage::decode(&bytes).unwrap();
    assert_eq!(msg.f_sint32, -2);
    assert!(msg.has_unknown());
    assert_eq!(msg.unknown_fields.len(), 1);

    // Known fields first, retained unknown fields appended last.
    assert_eq!(msg.encode_to_vec(), bytes);

    let mut cleared = msg.clone();
    cleared.clear_unknown();
    assert!(!cleared.has_unknown());
    assert_eq!(cleared.encode_to_vec(), [0x38, 0x03]);
}

#[test]
fn unknown_fields_can_be_dropped_at_decode_time() {
    let bytes = [0x9A, 0x06, 0x03, 0x61, 0x62, 0x63];
    let options = DecodeOptions::new().retain_unknown_fields(false);
    let msg = LongMessage::decode_with(&bytes, options).unwrap();
    assert!(!msg.has_unknown());
    assert_eq!(msg.encode_to_vec(), Vec::<u8>::new());
}

#[test]
fn singular_fields_overwrite_on_merge() {
    // The oneof sees the string candidate, then the enum candidate.
    let msg = LongMessage::decode(&[0x12, 0x02, 0x68, 0x69, 0x08, 0x03]).unwrap();
    assert_eq!(msg.f_oneof, FOneof::FEnum(MyEnum::Value3));

    // parse_into_self merges: repeated accumulates, singular overwrites.
    let mut msg = LongMessage::decode(&[0x18, 0x01, 0x38, 0x02]).unwrap();
    msg.merge(&[0x18, 0x02, 0x38, 0x04]).unwrap();
    assert_eq!(msg.f_uint64, [1, 2]);
    assert_eq!(msg.f_sint32, 2);
}

#[test]
fn optional_fields_track_presence() {
    let absent = LongMessage::default();
    assert_eq!(absent.encode_to_vec(), Vec::<u8>::new());

    let present_empty = LongMessage {
        f_maybe_bytes: Some(vec![]),
        ..Default::default()
    };
    assert_eq!(present_empty.encode_to_vec(), [0x22, 0x00]);

    let decoded = LongMessage::decode(&[0x22, 0x00]).unwrap();
    assert_eq!(decoded.f_maybe_bytes, Some(vec![]));
    assert_ne!(decoded, absent);
}

#[test]
fn empty_submessages_are_elided() {
    let msg = LongMessage {
        f_inner: Some(Inner::default()),
        ..Default::default()
    };
    assert_eq!(msg.encode_to_vec(), Vec::<u8>::new());

    let msg = LongMessage {
        f_inner: Some(Inner {
            count: 5,
            ..Default::default()
        }),
        ..Default::default()
    };
    assert_eq!(msg.encode_to_vec(), [0x32, 0x02, 0x10, 0x05]);
}

#[test]
fn split_submessages_merge_across_duplicate_tags() {
    // Two occurrences of field 6; the second contributes `name` while the
    // first contributed `count`.
    let bytes = [
        0x32, 0x02, 0x10, 0x05, // f_inner { count: 5 }
        0x32, 0x03, 0x0A, 0x01, 0x78, // f_inner { name: "x" }
    ];
    let msg = LongMessage::decode(&bytes).unwrap();
    assert_eq!(
        msg.f_inner,
        Some(Inner {
            name: "x".to_string(),
            count: 5,
            ..Default::default()
        })
    );
}

#[test]
fn map_round_trips_through_reserialization() {
    let msg = LongMessage {
        f_map_str_float: BTreeMap::from([
            ("a".to_string(), 1.0f32),
            ("b".to_string(), -2.5f32),
        ]),
        ..Default::default()
    };
    let bytes = msg.encode_to_vec();
    let decoded = LongMessage::decode(&bytes).unwrap();
    assert_eq!(decoded.f_map_str_float, msg.f_map_str_float);
    assert_eq!(LongMessage::decode(&decoded.encode_to_vec()).unwrap(), decoded);
}

#[test]
fn value_projection_unwraps_recursively() {
    let msg = LongMessage {
        f_oneof: FOneof::FText("hi".to_string()),
        f_uint64: vec![7],
        f_map_str_float: BTreeMap::from([("k".to_string(), 1.5f32)]),
        f_inner: Some(Inner {
            name: "inner".to_string(),
            count: 3,
            ..Default::default()
        }),
        ..Default::default()
    };

    let value = msg.to_value();
    let fields = value.as_message().unwrap();
    assert_eq!(fields["f_oneof"], Value::String("hi".to_string()));
    assert_eq!(fields["f_uint64"], Value::List(vec![Value::U64(7)]));
    assert!(fields["f_maybe_bytes"].is_none());
    assert_eq!(
        fields["f_map_str_float"],
        Value::Map(BTreeMap::from([(
            MapKey::String("k".to_string()),
            Value::F32(1.5)
        )]))
    );
    let inner = fields["f_inner"].as_message().unwrap();
    assert_eq!(inner["name"], Value::String("inner".to_string()));
    assert_eq!(inner["count"], Value::I32(3));

    // The default oneof projects as the zero-valued enum member.
    let default_fields = LongMessage::default().to_value();
    assert_eq!(
        default_fields.as_message().unwrap()["f_oneof"],
        Value::Enum("VALUE0")
    );
}

#[test]
fn debug_abbreviates_large_slots() {
    let msg = LongMessage {
        f_maybe_bytes: Some(vec![0; 101]),
        ..Default::default()
    };
    let repr = format!("{:?}", msg);
    assert!(repr.starts_with("demo.LongMessage"));
    assert!(repr.contains("(101 bytes)"));

    let short = LongMessage {
        f_oneof: FOneof::FText("hi".to_string()),
        ..Default::default()
    };
    assert!(format!("{:?}", short).contains("FText(\"hi\")"));
}

#[test]
fn clear_resets_to_defaults() {
    let mut msg = LongMessage::decode(&[
        0x12, 0x02, 0x68, 0x69, 0x18, 0x01, 0x9A, 0x06, 0x00,
    ])
    .unwrap();
    assert!(msg.has_unknown());
    msg.clear();
    assert_eq!(msg, LongMessage::default());
    assert_eq!(msg.encode_to_vec(), Vec::<u8>::new());
}

#[test]
fn recursive_messages_round_trip_behind_boxes() {
    let msg = Node {
        id: 1,
        next: Some(Box::new(Node {
            id: 2,
            ..Default::default()
        })),
        ..Default::default()
    };
    let bytes = msg.encode_to_vec();
    assert_eq!(bytes, [0x08, 0x01, 0x12, 0x02, 0x08, 0x02]);
    assert_eq!(Node::decode(&bytes).unwrap(), msg);

    let value = msg.to_value();
    let next = value.as_message().unwrap()["next"].as_message().unwrap();
    assert_eq!(next["id"], Value::U32(2));
}

#[test]
fn pathological_nesting_hits_the_recursion_limit() {
    fn nest(levels: usize) -> Vec<u8> {
        let mut bytes = vec![0x08, 0x01];
        for _ in 0..levels {
            let mut wrapped = vec![0x12];
            protolith::encoding::encode_varint(bytes.len() as u64, &mut wrapped);
            wrapped.extend_from_slice(&bytes);
            bytes = wrapped;
        }
        bytes
    }

    assert!(Node::decode(&nest(50)).is_ok());
    let err = Node::decode(&nest(101)).unwrap_err();
    assert_eq!(err.kind(), &DecodeErrorKind::RecursionLimitReached);
}

#[test]
fn length_delimited_framing_round_trips() {
    let msg = LongMessage {
        f_uint64: vec![9],
        ..Default::default()
    };
    let framed = msg.encode_length_delimited_to_vec();
    let decoded = LongMessage::decode_length_delimited(&framed).unwrap();
    assert_eq!(decoded, msg);
}

#[test]
fn truncated_length_prefix_fails() {
    // Field 4 claims 5 bytes but only 1 follows.
    let err = LongMessage::decode(&[0x22, 0x05, 0x61]).unwrap_err();
    assert_eq!(err.kind(), &DecodeErrorKind::Truncated);
}

#[test]
fn group_wire_types_are_rejected() {
    // Field 20 with wire type 3 (start group).
    let err = LongMessage::decode(&[0xA3, 0x01]).unwrap_err();
    assert_eq!(err.kind(), &DecodeErrorKind::GroupUnsupported);
}
