/// The map collection type generated for protobuf `map` fields.
#[non_exhaustive]
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub enum MapType {
    /// The [`std::collections::BTreeMap`] type. Deterministic iteration
    /// order, so serialization is byte-stable for equal messages.
    #[default]
    BTreeMap,
    /// The [`std::collections::HashMap`] type.
    HashMap,
}

impl MapType {
    /// The runtime encoding module implementing this collection.
    pub(crate) fn codec_module(&self) -> &'static str {
        match self {
            MapType::BTreeMap => "btree_map",
            MapType::HashMap => "hash_map",
        }
    }

    /// The fully-qualified Rust type for the collection.
    pub(crate) fn rust_type(&self) -> &'static str {
        match self {
            MapType::BTreeMap => "::std::collections::BTreeMap",
            MapType::HashMap => "::std::collections::HashMap",
        }
    }
}
