//! Utility functions for working with identifiers.

use heck::{ToSnakeCase, ToUpperCamelCase};

/// Converts a `camelCase` or `SCREAMING_SNAKE_CASE` identifier to a
/// `lower_snake` case Rust field identifier.
pub fn to_snake(s: &str) -> String {
    let ident = s.to_snake_case();

    // Use a raw identifier if the identifier matches a Rust keyword.
    if is_keyword(&ident) {
        format!("r#{}", ident)
    } else {
        ident
    }
}

/// Converts a `snake_case` identifier to an `UpperCamel` case Rust type
/// identifier.
pub fn to_upper_camel(s: &str) -> String {
    let ident = s.to_upper_camel_case();

    // Suffix an underscore for the `Self` Rust keyword as it is not allowed
    // as raw identifier.
    if ident == "Self" {
        format!("{}_", ident)
    } else {
        ident
    }
}

/// Strips an enum's type name from the prefix of an enum value.
///
/// This function assumes that both have been formatted to Rust's
/// UpperCamelCase.
pub fn strip_enum_prefix(prefix: &str, name: &str) -> String {
    let stripped = name.strip_prefix(prefix);

    // If the next character after the stripped prefix is not an uppercase
    // character then the name was not prefixed by the enum name (or stripping
    // would leave an invalid identifier), so keep it whole.
    match stripped {
        Some(stripped)
            if stripped
                .chars()
                .next()
                .map(char::is_uppercase)
                .unwrap_or(false) =>
        {
            stripped.to_string()
        }
        _ => name.to_string(),
    }
}

fn is_keyword(ident: &str) -> bool {
    matches!(
        ident,
        "as" | "async"
            | "await"
            | "break"
            | "const"
            | "continue"
            | "crate"
            | "dyn"
            | "else"
            | "enum"
            | "extern"
            | "false"
            | "fn"
            | "for"
            | "if"
            | "impl"
            | "in"
            | "let"
            | "loop"
            | "macro"
            | "match"
            | "mod"
            | "move"
            | "mut"
            | "pub"
            | "ref"
            | "return"
            | "static"
            | "struct"
            | "trait"
            | "true"
            | "type"
            | "unsafe"
            | "use"
            | "where"
            | "while"
    )
}
