#![doc(html_root_url = "https://docs.rs/protolith-build/0.1.0")]

//! `protolith-build` compiles parsed proto3 schema descriptors into Rust
//! modules targeting the `protolith` runtime.
//!
//! `protolith-build` is designed to be used for build-time code generation as
//! part of a Cargo build-script. The `.proto` source parser is an external
//! collaborator; this crate consumes its output, an in-memory
//! [`Module`]/[`Message`]/[`Enum`] descriptor tree, and emits one generated
//! file per compilation unit.
//!
//! ```rust,no_run
//! use protolith_build::{Enum, Field, FieldGroup, FieldType, Message, Module};
//!
//! fn main() -> std::io::Result<()> {
//!     let module = Module {
//!         name: "items".to_string(),
//!         enums: vec![Enum {
//!             name: "Size".to_string(),
//!             values: vec![
//!                 ("SIZE_SMALL".to_string(), 0),
//!                 ("SIZE_LARGE".to_string(), 1),
//!             ],
//!         }],
//!         messages: vec![Message {
//!             name: "Shirt".to_string(),
//!             groups: vec![
//!                 FieldGroup::single(Field::singular("color", 1, FieldType::String)),
//!                 FieldGroup::single(Field::singular("size", 2, FieldType::enum_ref("Size"))),
//!             ],
//!         }],
//!     };
//!     protolith_build::compile_modules(&[module])
//! }
//! ```
//!
//! The generated file is then included where it should live:
//!
//! ```rust,ignore
//! pub mod items {
//!     include!(concat!(env!("OUT_DIR"), "/protolith.rs"));
//! }
//! ```

use std::collections::HashMap;
use std::env;
use std::fs;
use std::io;
use std::path::PathBuf;

use log::debug;
use multimap::MultiMap;

mod code_generator;
mod collections;
mod ident;
mod message_graph;
mod schema;

use crate::code_generator::CodeGenerator;
use crate::ident::{to_snake, to_upper_camel};
use crate::message_graph::{qualify, MessageGraph};

pub use crate::collections::MapType;
pub use crate::schema::{
    Cardinality, Enum, Field, FieldGroup, FieldType, MapKeyType, Message, Module, OneofGroup,
    TypeRef,
};

/// Configuration options for schema code generation.
pub struct Config {
    file_name: String,
    map_type: MapType,
    out_dir: Option<PathBuf>,
}

impl Config {
    /// Creates a new code generator configuration with default options.
    pub fn new() -> Config {
        Config::default()
    }

    /// Sets the output directory. Defaults to the `OUT_DIR` environment
    /// variable, which is set by Cargo for build scripts.
    pub fn out_dir(&mut self, path: impl Into<PathBuf>) -> &mut Config {
        self.out_dir = Some(path.into());
        self
    }

    /// Sets the name of the generated file. Defaults to `protolith.rs`.
    pub fn file_name(&mut self, name: impl Into<String>) -> &mut Config {
        self.file_name = name.into();
        self
    }

    /// Sets the collection type generated for map fields.
    pub fn map_type(&mut self, map_type: MapType) -> &mut Config {
        self.map_type = map_type;
        self
    }

    pub(crate) fn map_collection(&self) -> MapType {
        self.map_type
    }

    /// Generates the source text for a compilation unit.
    pub fn generate(&self, modules: &[Module]) -> io::Result<String> {
        let unit = Unit::build(modules)?;
        let message_graph = MessageGraph::new(modules);
        validate(modules, &unit, &message_graph)?;

        let mut buf = String::new();
        buf.push_str("// This file is @generated by protolith-build.\n");
        self.append_aliases(modules, &mut buf);

        for module in modules {
            debug!("module: {:?}", module.name);
            CodeGenerator::generate(self, &message_graph, module, &mut buf);
        }

        Ok(buf)
    }

    /// Generates the compilation unit and writes it into the output
    /// directory.
    pub fn compile(&self, modules: &[Module]) -> io::Result<()> {
        let target = match &self.out_dir {
            Some(dir) => dir.clone(),
            None => env::var_os("OUT_DIR")
                .map(PathBuf::from)
                .ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::Other,
                        "OUT_DIR environment variable is not set",
                    )
                })?,
        };

        let content = self.generate(modules)?;
        fs::write(target.join(&self.file_name), content)
    }

    /// Emits an unqualified `pub use` alias for every type whose name is
    /// unique across all modules of the unit.
    fn append_aliases(&self, modules: &[Module], buf: &mut String) {
        let mut names: MultiMap<String, &str> = MultiMap::new();
        for module in modules {
            for desc in &module.enums {
                names.insert(to_upper_camel(&desc.name), module.name.as_str());
            }
            for message in &module.messages {
                names.insert(to_upper_camel(&message.name), module.name.as_str());
            }
        }

        let mut any = false;
        for module in modules {
            let type_names = module
                .enums
                .iter()
                .map(|desc| desc.name.as_str())
                .chain(module.messages.iter().map(|message| message.name.as_str()));
            for name in type_names {
                let name = to_upper_camel(name);
                if names.get_vec(&name).map(Vec::len) == Some(1) {
                    buf.push_str(&format!(
                        "pub use self::{}::{};\n",
                        to_snake(&module.name),
                        name
                    ));
                    any = true;
                }
            }
        }
        if any {
            buf.push('\n');
        }
    }
}

impl Default for Config {
    fn default() -> Config {
        Config {
            file_name: "protolith.rs".to_string(),
            map_type: MapType::default(),
            out_dir: None,
        }
    }
}

/// Compiles a set of schema modules with the default configuration.
pub fn compile_modules(modules: &[Module]) -> io::Result<()> {
    Config::new().compile(modules)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SymbolKind {
    Enum,
    Message,
}

/// The symbol table of one compilation unit.
pub(crate) struct Unit {
    symbols: HashMap<(String, String), SymbolKind>,
}

impl Unit {
    fn build(modules: &[Module]) -> io::Result<Unit> {
        let mut module_names: HashMap<String, &str> = HashMap::new();
        for module in modules {
            if module.name.is_empty() {
                return Err(invalid_input("module with empty name".to_string()));
            }
            if let Some(first) = module_names.insert(to_snake(&module.name), &module.name) {
                return Err(invalid_input(format!(
                    "module name collision: {:?} and {:?}",
                    first, module.name
                )));
            }
        }

        let mut symbols = HashMap::new();
        for module in modules {
            let type_names = module
                .enums
                .iter()
                .map(|desc| (desc.name.as_str(), SymbolKind::Enum))
                .chain(
                    module
                        .messages
                        .iter()
                        .map(|message| (message.name.as_str(), SymbolKind::Message)),
                );
            for (name, kind) in type_names {
                if name.is_empty() {
                    return Err(invalid_input(format!(
                        "type with empty name in module {:?}",
                        module.name
                    )));
                }
                let previous =
                    symbols.insert((module.name.clone(), to_upper_camel(name)), kind);
                if previous.is_some() {
                    return Err(invalid_input(format!(
                        "type name collision in module {:?}: {}",
                        module.name, name
                    )));
                }
            }
        }

        Ok(Unit { symbols })
    }

    fn lookup(&self, module: &str, type_ref: &TypeRef) -> Option<SymbolKind> {
        let module = type_ref.module.as_deref().unwrap_or(module);
        self.symbols
            .get(&(module.to_string(), to_upper_camel(&type_ref.name)))
            .copied()
    }
}

fn validate(modules: &[Module], unit: &Unit, message_graph: &MessageGraph) -> io::Result<()> {
    for module in modules {
        for desc in &module.enums {
            validate_enum(module, desc)?;
        }
        for message in &module.messages {
            validate_message(module, message, unit, message_graph)?;
        }
    }
    Ok(())
}

fn validate_enum(module: &Module, desc: &Enum) -> io::Result<()> {
    let context = format!("enum {}.{}", module.name, desc.name);
    if desc.values.is_empty() {
        return Err(invalid_input(format!("{} has no values", context)));
    }
    if !desc.values.iter().any(|(_, value)| *value == 0) {
        return Err(invalid_input(format!(
            "{} is missing the mandatory zero value",
            context
        )));
    }

    let mut names = HashMap::new();
    let mut numbers = HashMap::new();
    for (name, value) in &desc.values {
        let variant = crate::code_generator::variant_ident(&desc.name, name);
        if let Some(first) = names.insert(variant.clone(), name) {
            return Err(invalid_input(format!(
                "{} value name collision: {:?} and {:?} (both map to {})",
                context, first, name, variant
            )));
        }
        if numbers.insert(*value, name).is_some() {
            return Err(invalid_input(format!(
                "{} declares value {} twice",
                context, value
            )));
        }
    }
    Ok(())
}

fn validate_message(
    module: &Module,
    message: &Message,
    unit: &Unit,
    message_graph: &MessageGraph,
) -> io::Result<()> {
    let context = format!("message {}.{}", module.name, message.name);

    let mut group_names = HashMap::new();
    let mut numbers = HashMap::new();
    for group in &message.groups {
        if group_names
            .insert(to_snake(group.name()), group.name())
            .is_some()
        {
            return Err(invalid_input(format!(
                "{} group name collision: {:?}",
                context, group.name()
            )));
        }

        for field in group.fields() {
            if !(protolith::encoding::MIN_TAG..=protolith::encoding::MAX_TAG)
                .contains(&field.number)
            {
                return Err(invalid_input(format!(
                    "{} field {:?} has out-of-range number {}",
                    context, field.name, field.number
                )));
            }
            if numbers.insert(field.number, &field.name).is_some() {
                return Err(invalid_input(format!(
                    "{} declares field number {} twice",
                    context, field.number
                )));
            }
            if matches!(field.ty, FieldType::Map { .. })
                && field.cardinality != Cardinality::Singular
            {
                return Err(invalid_input(format!(
                    "{} map field {:?} must be singular",
                    context, field.name
                )));
            }
            validate_field_type(module, &field.ty, &context, &field.name, unit)?;
        }

        if let FieldGroup::Oneof(oneof) = group {
            if oneof.fields.is_empty() {
                return Err(invalid_input(format!(
                    "{} oneof {:?} has no fields",
                    context, oneof.name
                )));
            }
            for field in &oneof.fields {
                if field.cardinality != Cardinality::Singular {
                    return Err(invalid_input(format!(
                        "{} oneof {:?} field {:?} must be singular",
                        context, oneof.name, field.name
                    )));
                }
                if matches!(field.ty, FieldType::Map { .. }) {
                    return Err(invalid_input(format!(
                        "{} oneof {:?} field {:?} may not be a map",
                        context, oneof.name, field.name
                    )));
                }
            }
            // A non-optional group defaults to its first candidate; a
            // recursive message there would have an unconstructible default.
            if !oneof.optional {
                if let FieldType::Message(type_ref) = &oneof.fields[0].ty {
                    let target = qualify(
                        type_ref.module.as_deref().unwrap_or(&module.name),
                        &type_ref.name,
                    );
                    let container = qualify(&module.name, &message.name);
                    if message_graph.is_nested(&target, &container) {
                        return Err(invalid_input(format!(
                            "{} oneof {:?} must be optional: its first candidate \
                             recursively contains the message",
                            context, oneof.name
                        )));
                    }
                }
            }
        }
    }

    Ok(())
}

fn validate_field_type(
    module: &Module,
    ty: &FieldType,
    context: &str,
    field_name: &str,
    unit: &Unit,
) -> io::Result<()> {
    match ty {
        FieldType::Enum(type_ref) => match unit.lookup(&module.name, type_ref) {
            Some(SymbolKind::Enum) => Ok(()),
            Some(SymbolKind::Message) => Err(invalid_input(format!(
                "{} field {:?}: {:?} is a message, not an enum",
                context, field_name, type_ref.name
            ))),
            None => Err(invalid_input(format!(
                "{} field {:?}: unresolved enum reference {:?}",
                context, field_name, type_ref.name
            ))),
        },
        FieldType::Message(type_ref) => match unit.lookup(&module.name, type_ref) {
            Some(SymbolKind::Message) => Ok(()),
            Some(SymbolKind::Enum) => Err(invalid_input(format!(
                "{} field {:?}: {:?} is an enum, not a message",
                context, field_name, type_ref.name
            ))),
            None => Err(invalid_input(format!(
                "{} field {:?}: unresolved message reference {:?}",
                context, field_name, type_ref.name
            ))),
        },
        FieldType::Map { value, .. } => {
            if matches!(**value, FieldType::Map { .. }) {
                return Err(invalid_input(format!(
                    "{} field {:?}: map values may not be maps",
                    context, field_name
                )));
            }
            validate_field_type(module, value, context, field_name, unit)
        }
        _ => Ok(()),
    }
}

fn invalid_input(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, message)
}
