//! In-memory schema descriptors consumed by the generator.
//!
//! Descriptors are produced by an external `.proto` front-end; this crate
//! only defines the shapes it needs to generate code from.

/// A logical namespace, one per input schema file.
#[derive(Clone, Debug, PartialEq)]
pub struct Module {
    pub name: String,
    pub enums: Vec<Enum>,
    pub messages: Vec<Message>,
}

/// An enumeration: a name plus `(symbolic name, value)` pairs.
///
/// Values are signed 32-bit. Proto3 requires a zero-valued member, which
/// becomes the default.
#[derive(Clone, Debug, PartialEq)]
pub struct Enum {
    pub name: String,
    pub values: Vec<(String, i32)>,
}

/// A message: a name plus field groups in declaration order, which is also
/// serialization order.
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    pub name: String,
    pub groups: Vec<FieldGroup>,
}

/// The unit of host exposure: either a single field or a whole oneof, which
/// shares one slot.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldGroup {
    Single(Field),
    Oneof(OneofGroup),
}

impl FieldGroup {
    pub fn single(field: Field) -> FieldGroup {
        FieldGroup::Single(field)
    }

    pub fn oneof(group: OneofGroup) -> FieldGroup {
        FieldGroup::Oneof(group)
    }

    pub(crate) fn name(&self) -> &str {
        match self {
            FieldGroup::Single(field) => &field.name,
            FieldGroup::Oneof(group) => &group.name,
        }
    }

    pub(crate) fn fields(&self) -> impl Iterator<Item = &Field> {
        match self {
            FieldGroup::Single(field) => std::slice::from_ref(field).iter(),
            FieldGroup::Oneof(group) => group.fields.iter(),
        }
    }
}

/// A `oneof` clause. Its member fields share a single host slot.
#[derive(Clone, Debug, PartialEq)]
pub struct OneofGroup {
    pub name: String,
    /// When set, the slot is optional and absence is representable.
    pub optional: bool,
    pub fields: Vec<Field>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    pub name: String,
    pub number: u32,
    pub cardinality: Cardinality,
    pub ty: FieldType,
}

impl Field {
    pub fn singular(name: &str, number: u32, ty: FieldType) -> Field {
        Field {
            name: name.to_string(),
            number,
            cardinality: Cardinality::Singular,
            ty,
        }
    }

    pub fn optional(name: &str, number: u32, ty: FieldType) -> Field {
        Field {
            cardinality: Cardinality::Optional,
            ..Field::singular(name, number, ty)
        }
    }

    pub fn repeated(name: &str, number: u32, ty: FieldType) -> Field {
        Field {
            cardinality: Cardinality::Repeated,
            ..Field::singular(name, number, ty)
        }
    }

    /// A map field; maps are singular by construction.
    pub fn map(name: &str, number: u32, key: MapKeyType, value: FieldType) -> Field {
        Field::singular(
            name,
            number,
            FieldType::Map {
                key,
                value: Box::new(value),
            },
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cardinality {
    Singular,
    Optional,
    Repeated,
}

/// The data type of a field.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldType {
    Float,
    Double,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Sint32,
    Sint64,
    Fixed32,
    Fixed64,
    Sfixed32,
    Sfixed64,
    Bool,
    String,
    Bytes,
    Enum(TypeRef),
    Message(TypeRef),
    Map {
        key: MapKeyType,
        value: Box<FieldType>,
    },
}

impl FieldType {
    pub fn enum_ref(name: &str) -> FieldType {
        FieldType::Enum(TypeRef::local(name))
    }

    pub fn message_ref(name: &str) -> FieldType {
        FieldType::Message(TypeRef::local(name))
    }

    /// Whether repeated fields of this type may use the packed framing.
    pub(crate) fn is_packable(&self) -> bool {
        !matches!(
            self,
            FieldType::String | FieldType::Bytes | FieldType::Message(_) | FieldType::Map { .. }
        )
    }
}

/// The key type of a map field. Restricted to non-repeating scalar types with
/// a total order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MapKeyType {
    Int32,
    Int64,
    Uint32,
    Uint64,
    Sint32,
    Sint64,
    Fixed32,
    Fixed64,
    Sfixed32,
    Sfixed64,
    Bool,
    String,
}

/// A reference to an enum or message declared in this compilation unit.
#[derive(Clone, Debug, PartialEq)]
pub struct TypeRef {
    /// The referenced module; `None` means the referencing field's own module.
    pub module: Option<String>,
    pub name: String,
}

impl TypeRef {
    /// A reference to a type in the same module.
    pub fn local(name: &str) -> TypeRef {
        TypeRef {
            module: None,
            name: name.to_string(),
        }
    }

    /// A reference to a type in another module of the same compilation unit.
    pub fn qualified(module: &str, name: &str) -> TypeRef {
        TypeRef {
            module: Some(module.to_string()),
            name: name.to_string(),
        }
    }
}
