//! A dynamically typed projection of decoded messages.

use std::collections::BTreeMap;

/// A generic view of a message tree, produced by generated `to_value`
/// methods.
///
/// Sub-messages are recursively unwrapped into [`Value::Message`] maps keyed
/// by field-group name; repeated fields become [`Value::List`], map fields
/// become [`Value::Map`], and scalars pass through.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// An absent optional field or optional oneof group.
    None,
    Bool(bool),
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    String(String),
    Bytes(Vec<u8>),
    /// An enum member, by declared name.
    Enum(&'static str),
    List(Vec<Value>),
    Map(BTreeMap<MapKey, Value>),
    Message(BTreeMap<&'static str, Value>),
}

/// The key of a [`Value::Map`] entry.
///
/// Restricted to the types that are legal protobuf map keys.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MapKey {
    Bool(bool),
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    String(String),
}

impl Value {
    /// The fields of a message value, if this is one.
    pub fn as_message(&self) -> Option<&BTreeMap<&'static str, Value>> {
        match self {
            Value::Message(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }
}
