//! Walks a resolved compilation unit and appends generated Rust source.
//!
//! One generated module per input schema module: enum types, message structs
//! with one slot per field group, `protolith::Message` impls dispatching on
//! hard-coded field numbers, and oneof sum types in a nested module per
//! message.

use itertools::Itertools;
use log::debug;

use crate::ident::{strip_enum_prefix, to_snake, to_upper_camel};
use crate::message_graph::{qualify, MessageGraph};
use crate::schema::{
    Cardinality, Enum, Field, FieldGroup, FieldType, MapKeyType, Message, Module, OneofGroup,
    TypeRef,
};
use crate::Config;

/// The Rust variant identifier for an enum value, with the enum-name prefix
/// stripped.
pub(crate) fn variant_ident(enum_name: &str, value_name: &str) -> String {
    strip_enum_prefix(&to_upper_camel(enum_name), &to_upper_camel(value_name))
}

pub(crate) struct CodeGenerator<'a> {
    config: &'a Config,
    message_graph: &'a MessageGraph,
    module: &'a Module,
    depth: u8,
    buf: &'a mut String,
}

impl<'a> CodeGenerator<'a> {
    pub(crate) fn generate(
        config: &Config,
        message_graph: &MessageGraph,
        module: &Module,
        buf: &mut String,
    ) {
        let mut code_gen = CodeGenerator {
            config,
            message_graph,
            module,
            depth: 0,
            buf,
        };

        code_gen.open(&format!("pub mod {} {{", to_snake(&module.name)));
        for desc in &module.enums {
            debug!("  enum: {:?}", desc.name);
            code_gen.append_enum(desc);
        }
        for message in &module.messages {
            debug!("  message: {:?}", message.name);
            code_gen.append_message(message);
        }
        code_gen.close("}");
        code_gen.buf.push('\n');
    }

    fn push_indent(&mut self) {
        for _ in 0..self.depth {
            self.buf.push_str("    ");
        }
    }

    fn push_line(&mut self, line: &str) {
        self.push_indent();
        self.buf.push_str(line);
        self.buf.push('\n');
    }

    fn open(&mut self, line: &str) {
        self.push_line(line);
        self.depth += 1;
    }

    fn close(&mut self, line: &str) {
        self.depth -= 1;
        self.push_line(line);
    }

    /// Closes and reopens a brace at the same depth, e.g. `} else {`.
    fn chain(&mut self, line: &str) {
        self.depth -= 1;
        self.push_line(line);
        self.depth += 1;
    }

    fn blank(&mut self) {
        self.buf.push('\n');
    }

    fn append_enum(&mut self, desc: &Enum) {
        let name = to_upper_camel(&desc.name);
        let variants: Vec<(String, i32)> = desc
            .values
            .iter()
            .map(|(value_name, value)| (variant_ident(&desc.name, value_name), *value))
            .collect();
        let default_variant = variants
            .iter()
            .find(|(_, value)| *value == 0)
            .map(|(variant, _)| variant.clone())
            .expect("validated: enums declare a zero value");

        self.push_line("#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]");
        self.push_line("#[repr(i32)]");
        self.open(&format!("pub enum {} {{", name));
        for (variant, value) in &variants {
            self.push_line(&format!("{} = {},", variant, value));
        }
        self.close("}");
        self.blank();

        self.open(&format!("impl {} {{", name));
        self.push_line(&format!(
            "/// Returns `true` if `value` is a variant of `{}`.",
            name
        ));
        self.open("pub fn is_valid(value: i32) -> bool {");
        self.open("match value {");
        for (_, value) in &variants {
            self.push_line(&format!("{} => true,", value));
        }
        self.push_line("_ => false,");
        self.close("}");
        self.close("}");
        self.blank();
        self.push_line("/// The declared name of the member.");
        self.open("pub fn name(&self) -> &'static str {");
        self.open("match self {");
        for ((variant, _), (value_name, _)) in variants.iter().zip(&desc.values) {
            self.push_line(&format!("{}::{} => {:?},", name, variant, value_name));
        }
        self.close("}");
        self.close("}");
        self.close("}");
        self.blank();

        self.open(&format!("impl ::core::default::Default for {} {{", name));
        self.open(&format!("fn default() -> {} {{", name));
        self.push_line(&format!("{}::{}", name, default_variant));
        self.close("}");
        self.close("}");
        self.blank();

        self.open(&format!("impl ::core::convert::From<{}> for i32 {{", name));
        self.open(&format!("fn from(value: {}) -> i32 {{", name));
        self.push_line("value as i32");
        self.close("}");
        self.close("}");
        self.blank();

        self.open(&format!("impl ::core::convert::TryFrom<i32> for {} {{", name));
        self.push_line("type Error = ::protolith::UnknownEnumValue;");
        self.blank();
        self.open(&format!(
            "fn try_from(value: i32) -> ::core::result::Result<{}, ::protolith::UnknownEnumValue> {{",
            name
        ));
        self.open("match value {");
        for (variant, value) in &variants {
            self.push_line(&format!(
                "{} => ::core::result::Result::Ok({}::{}),",
                value, name, variant
            ));
        }
        self.push_line("_ => ::core::result::Result::Err(::protolith::UnknownEnumValue(value)),");
        self.close("}");
        self.close("}");
        self.close("}");
        self.blank();
    }

    fn append_message(&mut self, message: &Message) {
        self.append_struct(message);
        self.blank();
        self.append_message_impl(message);
        self.blank();
        self.append_default_impl(message);
        self.blank();
        self.append_debug_impl(message);
        self.blank();
        self.append_inherent_impl(message);
        self.blank();
        self.append_oneof_module(message);
    }

    fn append_struct(&mut self, message: &Message) {
        let name = to_upper_camel(&message.name);
        self.push_line("#[derive(Clone, PartialEq)]");
        self.open(&format!("pub struct {} {{", name));
        for group in &message.groups {
            match group {
                FieldGroup::Single(field) => {
                    let slot = self.slot_type(field, message);
                    self.push_line(&format!("pub {}: {},", to_snake(&field.name), slot));
                }
                FieldGroup::Oneof(oneof) => {
                    let slot = self.oneof_slot_type(message, oneof);
                    self.push_line(&format!("pub {}: {},", to_snake(&oneof.name), slot));
                }
            }
        }
        self.push_line("/// Wire fields not present in the schema, retained verbatim.");
        self.push_line("pub unknown_fields: ::protolith::UnknownFieldSet,");
        self.close("}");
    }

    fn append_message_impl(&mut self, message: &Message) {
        let name = to_upper_camel(&message.name);
        self.open(&format!("impl ::protolith::Message for {} {{", name));

        self.open("fn encode_raw(&self, buf: &mut impl ::protolith::bytes::BufMut) {");
        for group in &message.groups {
            self.append_encode_group(group);
        }
        self.push_line("self.unknown_fields.encode_raw(buf);");
        self.close("}");
        self.blank();

        self.push_line("fn merge_field(");
        self.depth += 1;
        self.push_line("&mut self,");
        self.push_line("field_number: u32,");
        self.push_line("wire_type: ::protolith::encoding::WireType,");
        self.push_line("field_start: usize,");
        self.push_line("r: &mut ::protolith::WireReader<'_>,");
        self.push_line("ctx: ::protolith::encoding::DecodeContext,");
        self.depth -= 1;
        self.open(") -> ::core::result::Result<(), ::protolith::DecodeError> {");
        self.open("match field_number {");
        for group in &message.groups {
            self.append_merge_group(message, group);
        }
        self.push_line(
            "_ => self.unknown_fields.merge_field(field_number, wire_type, field_start, r, ctx),",
        );
        self.close("}");
        self.close("}");
        self.blank();

        self.open("fn encoded_len(&self) -> usize {");
        self.push_line("0");
        self.depth += 1;
        for group in &message.groups {
            self.append_encoded_len_group(group);
        }
        self.push_line("+ self.unknown_fields.encoded_len()");
        self.depth -= 1;
        self.close("}");
        self.blank();

        self.open("fn clear(&mut self) {");
        for group in &message.groups {
            self.append_clear_group(group);
        }
        self.push_line("self.unknown_fields.clear();");
        self.close("}");

        self.close("}");
    }

    fn append_encode_group(&mut self, group: &FieldGroup) {
        match group {
            FieldGroup::Single(field) => {
                let f = to_snake(&field.name);
                let n = field.number;
                match (&field.cardinality, &field.ty) {
                    (Cardinality::Repeated, ty) if ty.is_packable() => {
                        self.push_line(&format!(
                            "{}::encode_packed({}, &self.{}, buf);",
                            self.codec_path(ty),
                            n,
                            f
                        ));
                    }
                    (Cardinality::Repeated, ty) => {
                        self.push_line(&format!(
                            "{}::encode_repeated({}, &self.{}, buf);",
                            self.codec_path(ty),
                            n,
                            f
                        ));
                    }
                    (_, FieldType::Map { key, value }) => {
                        let key_codec = self.key_codec_path(*key);
                        let val_codec = self.codec_path(value);
                        self.open(&format!("{}::encode(", self.map_codec_path()));
                        self.push_line(&format!("{}::encode,", key_codec));
                        self.push_line(&format!("{}::encoded_len,", key_codec));
                        self.push_line(&format!("{}::encode,", val_codec));
                        self.push_line(&format!("{}::encoded_len,", val_codec));
                        self.push_line(&format!("{},", n));
                        self.push_line(&format!("&self.{},", f));
                        self.push_line("buf,");
                        self.close(");");
                    }
                    (Cardinality::Optional, ty) => {
                        self.open(&format!(
                            "if let ::core::option::Option::Some(value) = &self.{} {{",
                            f
                        ));
                        self.push_line(&format!("{}::encode({}, value, buf);", self.codec_path(ty), n));
                        self.close("}");
                    }
                    (Cardinality::Singular, FieldType::Message(_)) => {
                        // An all-default sub-message serializes to an empty
                        // body and is elided.
                        self.open(&format!(
                            "if let ::core::option::Option::Some(value) = &self.{} {{",
                            f
                        ));
                        self.open("if ::protolith::Message::encoded_len(value) != 0 {");
                        self.push_line(&format!(
                            "::protolith::encoding::message::encode({}, value, buf);",
                            n
                        ));
                        self.close("}");
                        self.close("}");
                    }
                    (Cardinality::Singular, ty) => {
                        let guard = self.default_guard(ty, &format!("self.{}", f), 0);
                        self.open(&format!("if {} {{", guard));
                        self.push_line(&format!(
                            "{}::encode({}, &self.{}, buf);",
                            self.codec_path(ty),
                            n,
                            f
                        ));
                        self.close("}");
                    }
                }
            }
            FieldGroup::Oneof(oneof) => {
                let g = to_snake(&oneof.name);
                if oneof.optional {
                    self.open(&format!(
                        "if let ::core::option::Option::Some(value) = &self.{} {{",
                        g
                    ));
                    self.push_line("value.encode(buf);");
                    self.close("}");
                } else {
                    self.push_line(&format!("self.{}.encode(buf);", g));
                }
            }
        }
    }

    fn append_merge_group(&mut self, message: &Message, group: &FieldGroup) {
        match group {
            FieldGroup::Single(field) => {
                let f = to_snake(&field.name);
                let n = field.number;
                let expected = wire_type_expr(&field.ty);
                let accept = if field.cardinality == Cardinality::Repeated
                    && field.ty.is_packable()
                {
                    format!(
                        "wire_type == {} || wire_type == ::protolith::encoding::WireType::LengthDelimited",
                        expected
                    )
                } else {
                    format!("wire_type == {}", expected)
                };

                self.open(&format!("{} => {{", n));
                self.open(&format!("let result = if {} {{", accept));
                match (&field.cardinality, &field.ty) {
                    (Cardinality::Repeated, ty) => {
                        self.push_line(&format!(
                            "{}::merge_repeated(wire_type, &mut self.{}, r, ctx)",
                            self.codec_path(ty),
                            f
                        ));
                    }
                    (_, FieldType::Map { key, value }) => {
                        let key_codec = self.key_codec_path(*key);
                        let val_codec = self.codec_path(value);
                        self.open(&format!("{}::merge(", self.map_codec_path()));
                        self.push_line(&format!("{}::merge,", key_codec));
                        self.push_line(&format!("{}::merge,", val_codec));
                        self.push_line(&format!("&mut self.{},", f));
                        self.push_line("r,");
                        self.push_line("ctx,");
                        self.close(")");
                    }
                    (Cardinality::Optional, ty) | (Cardinality::Singular, ty @ FieldType::Message(_)) => {
                        self.push_line(&format!(
                            "let value = self.{}.get_or_insert_with(::core::default::Default::default);",
                            f
                        ));
                        self.push_line(&format!(
                            "{}::merge(wire_type, value, r, ctx)",
                            self.codec_path(ty)
                        ));
                    }
                    (Cardinality::Singular, ty) => {
                        self.push_line(&format!(
                            "{}::merge(wire_type, &mut self.{}, r, ctx)",
                            self.codec_path(ty),
                            f
                        ));
                    }
                }
                self.chain("} else {");
                self.append_mismatched_field(expected);
                self.close("};");
                self.push_line(&format!(
                    "result.map_err(|err| err.at_field({:?}, {}, field_start))",
                    f, n
                ));
                self.close("}");
            }
            FieldGroup::Oneof(oneof) => {
                let g = to_snake(&oneof.name);
                let oneof_path = format!(
                    "{}::{}",
                    to_snake(&message.name),
                    to_upper_camel(&oneof.name)
                );
                let numbers = oneof
                    .fields
                    .iter()
                    .map(|field| field.number.to_string())
                    .join(" | ");

                self.open(&format!("{} => {{", numbers));
                if oneof.fields.len() == 1 {
                    self.push_line(&format!(
                        "let expected = {};",
                        wire_type_expr(&oneof.fields[0].ty)
                    ));
                } else {
                    self.open("let expected = match field_number {");
                    for field in &oneof.fields[..oneof.fields.len() - 1] {
                        self.push_line(&format!(
                            "{} => {},",
                            field.number,
                            wire_type_expr(&field.ty)
                        ));
                    }
                    self.push_line(&format!(
                        "_ => {},",
                        wire_type_expr(&oneof.fields[oneof.fields.len() - 1].ty)
                    ));
                    self.close("};");
                }
                self.open("let result = if wire_type == expected {");
                self.push_line(&format!(
                    "{}::merge(&mut self.{}, field_number, wire_type, r, ctx)",
                    oneof_path, g
                ));
                self.chain("} else {");
                self.append_mismatched_field("expected");
                self.close("};");
                self.push_line(&format!(
                    "result.map_err(|err| err.at_field({:?}, field_number, field_start))",
                    g
                ));
                self.close("}");
            }
        }
    }

    fn append_mismatched_field(&mut self, expected: &str) {
        self.open("::protolith::encoding::mismatched_field(");
        self.push_line("&mut self.unknown_fields,");
        self.push_line(&format!("{},", expected));
        self.push_line("field_number,");
        self.push_line("wire_type,");
        self.push_line("field_start,");
        self.push_line("r,");
        self.push_line("ctx,");
        self.close(")");
    }

    fn append_encoded_len_group(&mut self, group: &FieldGroup) {
        match group {
            FieldGroup::Single(field) => {
                let f = to_snake(&field.name);
                let n = field.number;
                match (&field.cardinality, &field.ty) {
                    (Cardinality::Repeated, ty) if ty.is_packable() => {
                        self.push_line(&format!(
                            "+ {}::encoded_len_packed({}, &self.{})",
                            self.codec_path(ty),
                            n,
                            f
                        ));
                    }
                    (Cardinality::Repeated, ty) => {
                        self.push_line(&format!(
                            "+ {}::encoded_len_repeated({}, &self.{})",
                            self.codec_path(ty),
                            n,
                            f
                        ));
                    }
                    (_, FieldType::Map { key, value }) => {
                        let key_codec = self.key_codec_path(*key);
                        let val_codec = self.codec_path(value);
                        self.open(&format!("+ {}::encoded_len(", self.map_codec_path()));
                        self.push_line(&format!("{}::encoded_len,", key_codec));
                        self.push_line(&format!("{}::encoded_len,", val_codec));
                        self.push_line(&format!("{},", n));
                        self.push_line(&format!("&self.{},", f));
                        self.close(")");
                    }
                    (Cardinality::Optional, ty) => {
                        self.push_line(&format!(
                            "+ self.{}.as_ref().map_or(0, |value| {}::encoded_len({}, value))",
                            f,
                            self.codec_path(ty),
                            n
                        ));
                    }
                    (Cardinality::Singular, FieldType::Message(_)) => {
                        self.open(&format!("+ self.{}.as_ref().map_or(0, |value| {{", f));
                        self.open("if ::protolith::Message::encoded_len(value) != 0 {");
                        self.push_line(&format!(
                            "::protolith::encoding::message::encoded_len({}, value)",
                            n
                        ));
                        self.chain("} else {");
                        self.push_line("0");
                        self.close("}");
                        self.close("})");
                    }
                    (Cardinality::Singular, ty) => {
                        let guard = self.default_guard(ty, &format!("self.{}", f), 0);
                        self.push_line(&format!(
                            "+ if {} {{ {}::encoded_len({}, &self.{}) }} else {{ 0 }}",
                            guard,
                            self.codec_path(ty),
                            n,
                            f
                        ));
                    }
                }
            }
            FieldGroup::Oneof(oneof) => {
                let g = to_snake(&oneof.name);
                if oneof.optional {
                    self.push_line(&format!(
                        "+ self.{}.as_ref().map_or(0, |value| value.encoded_len())",
                        g
                    ));
                } else {
                    self.push_line(&format!("+ self.{}.encoded_len()", g));
                }
            }
        }
    }

    fn append_clear_group(&mut self, group: &FieldGroup) {
        match group {
            FieldGroup::Single(field) => {
                let f = to_snake(&field.name);
                match (&field.cardinality, &field.ty) {
                    (Cardinality::Repeated, _) | (_, FieldType::Map { .. }) => {
                        self.push_line(&format!("self.{}.clear();", f));
                    }
                    (Cardinality::Optional, _) | (Cardinality::Singular, FieldType::Message(_)) => {
                        self.push_line(&format!("self.{} = ::core::option::Option::None;", f));
                    }
                    (Cardinality::Singular, _) => {
                        self.push_line(&format!(
                            "self.{} = ::core::default::Default::default();",
                            f
                        ));
                    }
                }
            }
            FieldGroup::Oneof(oneof) => {
                let g = to_snake(&oneof.name);
                if oneof.optional {
                    self.push_line(&format!("self.{} = ::core::option::Option::None;", g));
                } else {
                    self.push_line(&format!(
                        "self.{} = ::core::default::Default::default();",
                        g
                    ));
                }
            }
        }
    }

    fn append_default_impl(&mut self, message: &Message) {
        let name = to_upper_camel(&message.name);
        self.open(&format!("impl ::core::default::Default for {} {{", name));
        self.open("fn default() -> Self {");
        self.open(&format!("{} {{", name));
        for group in &message.groups {
            self.push_line(&format!(
                "{}: ::core::default::Default::default(),",
                to_snake(group.name())
            ));
        }
        self.push_line("unknown_fields: ::core::default::Default::default(),");
        self.close("}");
        self.close("}");
        self.close("}");
    }

    fn append_debug_impl(&mut self, message: &Message) {
        let name = to_upper_camel(&message.name);
        self.open(&format!("impl ::core::fmt::Debug for {} {{", name));
        self.open("fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {");
        self.push_line(&format!(
            "let mut builder = f.debug_struct({:?});",
            format!("{}.{}", to_snake(&self.module.name), name)
        ));
        for group in &message.groups {
            let g = to_snake(group.name());
            let line = match group {
                FieldGroup::Single(field) => match (&field.cardinality, &field.ty) {
                    (Cardinality::Singular, FieldType::String) => format!(
                        "builder.field({:?}, &::protolith::fmt::TruncatedStr(&self.{}));",
                        g, g
                    ),
                    (Cardinality::Singular, FieldType::Bytes) => format!(
                        "builder.field({:?}, &::protolith::fmt::TruncatedBytes(&self.{}));",
                        g, g
                    ),
                    (Cardinality::Optional, FieldType::String) => format!(
                        "builder.field({:?}, &self.{}.as_ref().map(|value| ::protolith::fmt::TruncatedStr(value)));",
                        g, g
                    ),
                    (Cardinality::Optional, FieldType::Bytes) => format!(
                        "builder.field({:?}, &self.{}.as_ref().map(|value| ::protolith::fmt::TruncatedBytes(value)));",
                        g, g
                    ),
                    _ => format!("builder.field({:?}, &self.{});", g, g),
                },
                FieldGroup::Oneof(_) => format!("builder.field({:?}, &self.{});", g, g),
            };
            self.push_line(&line);
        }
        self.push_line("builder.finish()");
        self.close("}");
        self.close("}");
    }

    fn append_inherent_impl(&mut self, message: &Message) {
        let name = to_upper_camel(&message.name);
        self.open(&format!("impl {} {{", name));
        self.push_line("/// Projects the message onto a generic [`::protolith::Value`] tree.");
        self.open("pub fn to_value(&self) -> ::protolith::Value {");
        if message.groups.is_empty() {
            self.push_line("::protolith::Value::Message(::std::collections::BTreeMap::new())");
        } else {
            self.push_line("let mut fields = ::std::collections::BTreeMap::new();");
            for group in &message.groups {
                self.append_to_value_group(group);
            }
            self.push_line("::protolith::Value::Message(fields)");
        }
        self.close("}");
        self.blank();
        self.push_line("/// Whether any unknown fields were retained by decoding.");
        self.open("pub fn has_unknown(&self) -> bool {");
        self.push_line("!self.unknown_fields.is_empty()");
        self.close("}");
        self.blank();
        self.push_line("/// Drops all retained unknown fields.");
        self.open("pub fn clear_unknown(&mut self) {");
        self.push_line("self.unknown_fields.clear()");
        self.close("}");
        self.close("}");
    }

    fn append_to_value_group(&mut self, group: &FieldGroup) {
        match group {
            FieldGroup::Single(field) => {
                let f = to_snake(&field.name);
                match (&field.cardinality, &field.ty) {
                    (Cardinality::Repeated, ty) => {
                        let expr = self.value_expr(ty, binding_expr(ty));
                        self.push_line(&format!(
                            "fields.insert({:?}, ::protolith::Value::List(self.{}.iter().map(|value| {}).collect()));",
                            f, f, expr
                        ));
                    }
                    (_, FieldType::Map { key, value }) => {
                        let key_expr = map_key_expr(*key);
                        let val_expr = self.value_expr(value, binding_expr(value));
                        self.push_line(&format!(
                            "fields.insert({:?}, ::protolith::Value::Map(self.{}.iter().map(|(key, value)| ({}, {})).collect()));",
                            f, f, key_expr, val_expr
                        ));
                    }
                    (Cardinality::Optional, ty) | (Cardinality::Singular, ty @ FieldType::Message(_)) => {
                        let expr = self.value_expr(ty, binding_expr(ty));
                        self.open(&format!("fields.insert({:?}, match &self.{} {{", f, f));
                        self.push_line(&format!(
                            "::core::option::Option::Some(value) => {},",
                            expr
                        ));
                        self.push_line("::core::option::Option::None => ::protolith::Value::None,");
                        self.close("});");
                    }
                    (Cardinality::Singular, ty) => {
                        let expr = self.value_expr(ty, &format!("self.{}", f));
                        self.push_line(&format!("fields.insert({:?}, {});", f, expr));
                    }
                }
            }
            FieldGroup::Oneof(oneof) => {
                let g = to_snake(&oneof.name);
                if oneof.optional {
                    self.open(&format!("fields.insert({:?}, match &self.{} {{", g, g));
                    self.push_line("::core::option::Option::Some(value) => value.to_value(),");
                    self.push_line("::core::option::Option::None => ::protolith::Value::None,");
                    self.close("});");
                } else {
                    self.push_line(&format!(
                        "fields.insert({:?}, self.{}.to_value());",
                        g, g
                    ));
                }
            }
        }
    }

    fn append_oneof_module(&mut self, message: &Message) {
        let oneofs: Vec<&OneofGroup> = message
            .groups
            .iter()
            .filter_map(|group| match group {
                FieldGroup::Oneof(oneof) => Some(oneof),
                FieldGroup::Single(_) => None,
            })
            .collect();
        if oneofs.is_empty() {
            return;
        }

        self.push_line(&format!(
            "/// Nested oneof types in `{}`.",
            to_upper_camel(&message.name)
        ));
        self.open(&format!("pub mod {} {{", to_snake(&message.name)));
        for (idx, oneof) in oneofs.iter().enumerate() {
            if idx > 0 {
                self.blank();
            }
            self.append_oneof(message, oneof);
        }
        self.close("}");
        self.blank();
    }

    fn append_oneof(&mut self, message: &Message, oneof: &OneofGroup) {
        let ty_name = to_upper_camel(&oneof.name);
        let candidates: Vec<(String, &Field)> = oneof
            .fields
            .iter()
            .map(|field| (to_upper_camel(&field.name), field))
            .collect();

        self.push_line("#[derive(Clone, PartialEq)]");
        self.open(&format!("pub enum {} {{", ty_name));
        for (variant, field) in &candidates {
            let boxed = self.boxed(field, message);
            let base = self.base_rust_type(&field.ty, boxed, 1);
            self.push_line(&format!("{}({}),", variant, base));
        }
        self.close("}");
        self.blank();

        self.open(&format!("impl {} {{", ty_name));

        // encode
        self.push_line("/// Encodes the chosen candidate, eliding a default value.");
        self.open("pub fn encode(&self, buf: &mut impl ::protolith::bytes::BufMut) {");
        self.open("match self {");
        for (variant, field) in &candidates {
            let n = field.number;
            self.open(&format!("{}::{}(value) => {{", ty_name, variant));
            if matches!(field.ty, FieldType::Message(_)) {
                self.open("if ::protolith::Message::encoded_len(value) != 0 {");
                self.push_line(&format!(
                    "::protolith::encoding::message::encode({}, value, buf);",
                    n
                ));
                self.close("}");
            } else {
                let guard = self.default_guard(&field.ty, binding_expr(&field.ty), 1);
                self.open(&format!("if {} {{", guard));
                self.push_line(&format!(
                    "{}::encode({}, value, buf);",
                    self.codec_path(&field.ty),
                    n
                ));
                self.close("}");
            }
            self.close("}");
        }
        self.close("}");
        self.close("}");
        self.blank();

        // merge
        let slot = if oneof.optional {
            format!("::core::option::Option<{}>", ty_name)
        } else {
            ty_name.clone()
        };
        self.push_line("/// Decodes one candidate field into the shared slot.");
        self.push_line("pub fn merge(");
        self.depth += 1;
        self.push_line(&format!("value: &mut {},", slot));
        self.push_line("field_number: u32,");
        self.push_line("wire_type: ::protolith::encoding::WireType,");
        self.push_line("r: &mut ::protolith::WireReader<'_>,");
        self.push_line("ctx: ::protolith::encoding::DecodeContext,");
        self.depth -= 1;
        self.open(") -> ::core::result::Result<(), ::protolith::DecodeError> {");
        self.open("match field_number {");
        for (variant, field) in &candidates {
            let n = field.number;
            let boxed = self.boxed(field, message);
            let base = self.base_rust_type(&field.ty, boxed, 1);
            let wrap = |inner: String| {
                if oneof.optional {
                    format!("::core::option::Option::Some({})", inner)
                } else {
                    inner
                }
            };
            self.open(&format!("{} => {{", n));
            if matches!(field.ty, FieldType::Message(_)) {
                // Split occurrences of the same sub-message merge together.
                let pattern = wrap(format!("{}::{}(existing)", ty_name, variant));
                self.open(&format!("if let {} = value {{", pattern));
                self.push_line(
                    "::protolith::encoding::message::merge(wire_type, existing, r, ctx)",
                );
                self.chain("} else {");
                self.push_line(&format!(
                    "let mut v: {} = ::core::default::Default::default();",
                    base
                ));
                self.push_line(
                    "::protolith::encoding::message::merge(wire_type, &mut v, r, ctx)?;",
                );
                self.push_line(&format!(
                    "*value = {};",
                    wrap(format!("{}::{}(v)", ty_name, variant))
                ));
                self.push_line("::core::result::Result::Ok(())");
                self.close("}");
            } else {
                self.push_line(&format!(
                    "let mut v: {} = ::core::default::Default::default();",
                    base
                ));
                self.push_line(&format!(
                    "{}::merge(wire_type, &mut v, r, ctx)?;",
                    self.codec_path(&field.ty)
                ));
                self.push_line(&format!(
                    "*value = {};",
                    wrap(format!("{}::{}(v)", ty_name, variant))
                ));
                self.push_line("::core::result::Result::Ok(())");
            }
            self.close("}");
        }
        self.push_line("_ => unreachable!(\"invalid oneof field number: {}\", field_number),");
        self.close("}");
        self.close("}");
        self.blank();

        // encoded_len
        self.open("pub fn encoded_len(&self) -> usize {");
        self.open("match self {");
        for (variant, field) in &candidates {
            let n = field.number;
            self.open(&format!("{}::{}(value) => {{", ty_name, variant));
            if matches!(field.ty, FieldType::Message(_)) {
                self.open("if ::protolith::Message::encoded_len(value) != 0 {");
                self.push_line(&format!(
                    "::protolith::encoding::message::encoded_len({}, value)",
                    n
                ));
                self.chain("} else {");
                self.push_line("0");
                self.close("}");
            } else {
                let guard = self.default_guard(&field.ty, binding_expr(&field.ty), 1);
                self.open(&format!("if {} {{", guard));
                self.push_line(&format!(
                    "{}::encoded_len({}, value)",
                    self.codec_path(&field.ty),
                    n
                ));
                self.chain("} else {");
                self.push_line("0");
                self.close("}");
            }
            self.close("}");
        }
        self.close("}");
        self.close("}");
        self.blank();

        // to_value
        self.open("pub fn to_value(&self) -> ::protolith::Value {");
        self.open("match self {");
        for (variant, field) in &candidates {
            let expr = self.value_expr(&field.ty, binding_expr(&field.ty));
            self.push_line(&format!("{}::{}(value) => {},", ty_name, variant, expr));
        }
        self.close("}");
        self.close("}");

        self.close("}");
        self.blank();

        if !oneof.optional {
            self.open(&format!("impl ::core::default::Default for {} {{", ty_name));
            self.open("fn default() -> Self {");
            self.push_line(&format!(
                "{}::{}(::core::default::Default::default())",
                ty_name, candidates[0].0
            ));
            self.close("}");
            self.close("}");
            self.blank();
        }

        self.open(&format!("impl ::core::fmt::Debug for {} {{", ty_name));
        self.open("fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {");
        self.open("match self {");
        for (variant, field) in &candidates {
            let wrapped = match field.ty {
                FieldType::String => format!(
                    "f.debug_tuple({:?}).field(&::protolith::fmt::TruncatedStr(value)).finish()",
                    variant
                ),
                FieldType::Bytes => format!(
                    "f.debug_tuple({:?}).field(&::protolith::fmt::TruncatedBytes(value)).finish()",
                    variant
                ),
                _ => format!("f.debug_tuple({:?}).field(value).finish()", variant),
            };
            self.push_line(&format!("{}::{}(value) => {},", ty_name, variant, wrapped));
        }
        self.close("}");
        self.close("}");
        self.close("}");
    }

    /// Whether a non-repeated message slot must be boxed to break a cycle.
    fn boxed(&self, field: &Field, message: &Message) -> bool {
        if field.cardinality == Cardinality::Repeated {
            return false;
        }
        if let FieldType::Message(type_ref) = &field.ty {
            let target = qualify(
                type_ref.module.as_deref().unwrap_or(&self.module.name),
                &type_ref.name,
            );
            let container = qualify(&self.module.name, &message.name);
            self.message_graph.is_nested(&target, &container)
        } else {
            false
        }
    }

    /// The path of a referenced type, relative to the emission site.
    /// `extra_super` is 1 inside a oneof submodule, 0 at module level.
    fn type_path(&self, type_ref: &TypeRef, extra_super: usize) -> String {
        let name = to_upper_camel(&type_ref.name);
        let supers = "super::".repeat(extra_super);
        match type_ref.module.as_deref() {
            None => format!("{}{}", supers, name),
            Some(module) if module == self.module.name => format!("{}{}", supers, name),
            Some(module) => format!("{}super::{}::{}", supers, to_snake(module), name),
        }
    }

    fn base_rust_type(&self, ty: &FieldType, boxed: bool, extra_super: usize) -> String {
        match ty {
            FieldType::Float => "f32".to_string(),
            FieldType::Double => "f64".to_string(),
            FieldType::Int32 | FieldType::Sint32 | FieldType::Sfixed32 => "i32".to_string(),
            FieldType::Int64 | FieldType::Sint64 | FieldType::Sfixed64 => "i64".to_string(),
            FieldType::Uint32 | FieldType::Fixed32 => "u32".to_string(),
            FieldType::Uint64 | FieldType::Fixed64 => "u64".to_string(),
            FieldType::Bool => "bool".to_string(),
            FieldType::String => "::std::string::String".to_string(),
            FieldType::Bytes => "::std::vec::Vec<u8>".to_string(),
            FieldType::Enum(type_ref) => self.type_path(type_ref, extra_super),
            FieldType::Message(type_ref) => {
                let path = self.type_path(type_ref, extra_super);
                if boxed {
                    format!("::std::boxed::Box<{}>", path)
                } else {
                    path
                }
            }
            FieldType::Map { key, value } => format!(
                "{}<{}, {}>",
                self.config.map_collection().rust_type(),
                key_rust_type(*key),
                self.base_rust_type(value, false, extra_super)
            ),
        }
    }

    fn slot_type(&self, field: &Field, message: &Message) -> String {
        let boxed = self.boxed(field, message);
        let base = self.base_rust_type(&field.ty, boxed, 0);
        match field.cardinality {
            Cardinality::Repeated => format!("::std::vec::Vec<{}>", base),
            Cardinality::Optional => format!("::core::option::Option<{}>", base),
            Cardinality::Singular => match field.ty {
                FieldType::Message(_) => format!("::core::option::Option<{}>", base),
                _ => base,
            },
        }
    }

    fn oneof_slot_type(&self, message: &Message, oneof: &OneofGroup) -> String {
        let base = format!(
            "{}::{}",
            to_snake(&message.name),
            to_upper_camel(&oneof.name)
        );
        if oneof.optional {
            format!("::core::option::Option<{}>", base)
        } else {
            base
        }
    }

    fn codec_path(&self, ty: &FieldType) -> String {
        format!("::protolith::encoding::{}", codec_module(ty))
    }

    fn key_codec_path(&self, key: MapKeyType) -> String {
        format!("::protolith::encoding::{}", key_codec_module(key))
    }

    fn map_codec_path(&self) -> String {
        format!(
            "::protolith::encoding::{}",
            self.config.map_collection().codec_module()
        )
    }

    /// The condition under which a singular value is not at its default and
    /// must be written.
    fn default_guard(&self, ty: &FieldType, expr: &str, extra_super: usize) -> String {
        match ty {
            FieldType::Float => format!("{} != 0f32", expr),
            FieldType::Double => format!("{} != 0f64", expr),
            FieldType::Bool => expr.to_string(),
            FieldType::String | FieldType::Bytes => format!("!{}.is_empty()", expr),
            FieldType::Enum(type_ref) => format!(
                "{} != {}::default()",
                expr,
                self.type_path(type_ref, extra_super)
            ),
            FieldType::Message(_) | FieldType::Map { .. } => {
                unreachable!("message and map fields have no scalar default guard")
            }
            _ => format!("{} != 0", expr),
        }
    }

    fn value_expr(&self, ty: &FieldType, expr: &str) -> String {
        match ty {
            FieldType::Float => format!("::protolith::Value::F32({})", expr),
            FieldType::Double => format!("::protolith::Value::F64({})", expr),
            FieldType::Int32 | FieldType::Sint32 | FieldType::Sfixed32 => {
                format!("::protolith::Value::I32({})", expr)
            }
            FieldType::Int64 | FieldType::Sint64 | FieldType::Sfixed64 => {
                format!("::protolith::Value::I64({})", expr)
            }
            FieldType::Uint32 | FieldType::Fixed32 => {
                format!("::protolith::Value::U32({})", expr)
            }
            FieldType::Uint64 | FieldType::Fixed64 => {
                format!("::protolith::Value::U64({})", expr)
            }
            FieldType::Bool => format!("::protolith::Value::Bool({})", expr),
            FieldType::String => format!("::protolith::Value::String({}.clone())", expr),
            FieldType::Bytes => format!("::protolith::Value::Bytes({}.clone())", expr),
            FieldType::Enum(_) => format!("::protolith::Value::Enum({}.name())", expr),
            FieldType::Message(_) => format!("{}.to_value()", expr),
            FieldType::Map { .. } => unreachable!("map values are projected at the call site"),
        }
    }
}

fn codec_module(ty: &FieldType) -> &'static str {
    match ty {
        FieldType::Float => "float",
        FieldType::Double => "double",
        FieldType::Int32 => "int32",
        FieldType::Int64 => "int64",
        FieldType::Uint32 => "uint32",
        FieldType::Uint64 => "uint64",
        FieldType::Sint32 => "sint32",
        FieldType::Sint64 => "sint64",
        FieldType::Fixed32 => "fixed32",
        FieldType::Fixed64 => "fixed64",
        FieldType::Sfixed32 => "sfixed32",
        FieldType::Sfixed64 => "sfixed64",
        FieldType::Bool => "bool",
        FieldType::String => "string",
        FieldType::Bytes => "bytes",
        FieldType::Enum(_) => "enumeration",
        FieldType::Message(_) => "message",
        FieldType::Map { .. } => unreachable!("map fields use the configured map codec"),
    }
}

fn wire_type_expr(ty: &FieldType) -> &'static str {
    match ty {
        FieldType::Int32
        | FieldType::Int64
        | FieldType::Uint32
        | FieldType::Uint64
        | FieldType::Sint32
        | FieldType::Sint64
        | FieldType::Bool
        | FieldType::Enum(_) => "::protolith::encoding::WireType::Varint",
        FieldType::Float | FieldType::Fixed32 | FieldType::Sfixed32 => {
            "::protolith::encoding::WireType::ThirtyTwoBit"
        }
        FieldType::Double | FieldType::Fixed64 | FieldType::Sfixed64 => {
            "::protolith::encoding::WireType::SixtyFourBit"
        }
        FieldType::String | FieldType::Bytes | FieldType::Message(_) | FieldType::Map { .. } => {
            "::protolith::encoding::WireType::LengthDelimited"
        }
    }
}

/// The expression for one element bound as `value: &T` in a closure or match
/// arm.
fn binding_expr(ty: &FieldType) -> &'static str {
    match ty {
        FieldType::String
        | FieldType::Bytes
        | FieldType::Enum(_)
        | FieldType::Message(_)
        | FieldType::Map { .. } => "value",
        _ => "*value",
    }
}

fn key_rust_type(key: MapKeyType) -> &'static str {
    match key {
        MapKeyType::Int32 | MapKeyType::Sint32 | MapKeyType::Sfixed32 => "i32",
        MapKeyType::Int64 | MapKeyType::Sint64 | MapKeyType::Sfixed64 => "i64",
        MapKeyType::Uint32 | MapKeyType::Fixed32 => "u32",
        MapKeyType::Uint64 | MapKeyType::Fixed64 => "u64",
        MapKeyType::Bool => "bool",
        MapKeyType::String => "::std::string::String",
    }
}

fn key_codec_module(key: MapKeyType) -> &'static str {
    match key {
        MapKeyType::Int32 => "int32",
        MapKeyType::Int64 => "int64",
        MapKeyType::Uint32 => "uint32",
        MapKeyType::Uint64 => "uint64",
        MapKeyType::Sint32 => "sint32",
        MapKeyType::Sint64 => "sint64",
        MapKeyType::Fixed32 => "fixed32",
        MapKeyType::Fixed64 => "fixed64",
        MapKeyType::Sfixed32 => "sfixed32",
        MapKeyType::Sfixed64 => "sfixed64",
        MapKeyType::Bool => "bool",
        MapKeyType::String => "string",
    }
}

fn map_key_expr(key: MapKeyType) -> &'static str {
    match key {
        MapKeyType::Int32 | MapKeyType::Sint32 | MapKeyType::Sfixed32 => {
            "::protolith::MapKey::I32(*key)"
        }
        MapKeyType::Int64 | MapKeyType::Sint64 | MapKeyType::Sfixed64 => {
            "::protolith::MapKey::I64(*key)"
        }
        MapKeyType::Uint32 | MapKeyType::Fixed32 => "::protolith::MapKey::U32(*key)",
        MapKeyType::Uint64 | MapKeyType::Fixed64 => "::protolith::MapKey::U64(*key)",
        MapKeyType::Bool => "::protolith::MapKey::Bool(*key)",
        MapKeyType::String => "::protolith::MapKey::String(key.clone())",
    }
}
