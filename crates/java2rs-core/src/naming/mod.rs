// Identifier case conversion and the run-wide symbol name registry

use std::sync::OnceLock;

use regex::Regex;

pub mod registry;

pub use registry::{NameRegistry, RegisteredName, RegistryError};

fn acronym_boundary() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([A-Z]+)([A-Z][a-z])").expect("constant pattern"))
}

fn word_boundary() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([a-z0-9])([A-Z])").expect("constant pattern"))
}

/// Rust keywords that need the raw-identifier prefix when used as names
const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "crate", "dyn", "enum", "extern", "fn", "impl", "in", "let", "loop",
    "match", "mod", "move", "mut", "pub", "ref", "struct", "trait", "type", "unsafe", "use",
    "where", "become", "box", "macro", "override", "priv", "typeof", "unsized", "virtual",
    "yield", "try", "gen",
];

/// Names that cannot be raw identifiers
const NON_RAW_KEYWORDS: &[&str] = &["self", "Self", "super", "crate"];

/// Well-known numeric constants with a different spelling on Rust primitives
const CONSTANT_RENAMES: &[(&str, &str)] = &[
    ("NaN", "NAN"),
    ("NEGATIVE_INFINITY", "NEG_INFINITY"),
    ("POSITIVE_INFINITY", "INFINITY"),
    ("MIN_VALUE", "MIN"),
    ("MAX_VALUE", "MAX"),
];

/// `GLFWErrorCapture` -> `glfw_error_capture`, `getX` -> `get_x`
pub fn to_snake_case(name: &str) -> String {
    let split = acronym_boundary().replace_all(name, "${1}_${2}");
    let split = word_boundary().replace_all(&split, "${1}_${2}");
    split.to_lowercase()
}

pub fn to_screaming_snake_case(name: &str) -> String {
    if name.chars().all(|c| !c.is_ascii_lowercase()) {
        return name.to_string();
    }
    to_snake_case(name).to_uppercase()
}

/// `RED` -> `Red`, `dark_blue` -> `DarkBlue`, `myType` -> `MyType`
pub fn to_pascal_case(name: &str) -> String {
    let words: Vec<String> = if name.contains('_') || name.chars().all(|c| !c.is_ascii_lowercase())
    {
        name.split('_')
            .filter(|w| !w.is_empty())
            .map(|w| w.to_lowercase())
            .collect()
    } else {
        vec![name.to_string()]
    };
    words
        .iter()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Lower-case names become snake case; capitalized names (constants, types) are kept
pub fn snake_if_necessary(name: &str) -> String {
    if name.starts_with(|c: char| c.is_ascii_lowercase()) {
        to_snake_case(name)
    } else {
        name.to_string()
    }
}

/// Rust spelling of a well-known constant name, if it differs
pub fn renamed_constant(name: &str) -> Option<&'static str> {
    CONSTANT_RENAMES
        .iter()
        .find(|(java, _)| *java == name)
        .map(|(_, rust)| *rust)
}

/// Prefix Rust keywords with `r#`
pub fn escape_keyword(name: &str) -> String {
    if NON_RAW_KEYWORDS.contains(&name) {
        format!("{name}_")
    } else if RUST_KEYWORDS.contains(&name) {
        format!("r#{name}")
    } else {
        name.to_string()
    }
}

/// Snake-cased, keyword-safe identifier for locals, parameters, fields and methods
pub fn value_name(name: &str) -> String {
    escape_keyword(&snake_if_necessary(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snake_case_splits_acronyms() {
        assert_eq!(to_snake_case("GLFWErrorCapture"), "glfw_error_capture");
        assert_eq!(to_snake_case("getX"), "get_x");
        assert_eq!(to_snake_case("parseHTTPResponse2Fast"), "parse_http_response2_fast");
        assert_eq!(to_snake_case("already_snake"), "already_snake");
    }

    #[test]
    fn screaming_snake_keeps_constants() {
        assert_eq!(to_screaming_snake_case("maxSize"), "MAX_SIZE");
        assert_eq!(to_screaming_snake_case("MAX_SIZE"), "MAX_SIZE");
    }

    #[test]
    fn pascal_case_from_constants_and_camel() {
        assert_eq!(to_pascal_case("RED"), "Red");
        assert_eq!(to_pascal_case("DARK_BLUE"), "DarkBlue");
        assert_eq!(to_pascal_case("myType"), "MyType");
    }

    #[test]
    fn only_lower_case_names_are_converted() {
        assert_eq!(snake_if_necessary("myValue"), "my_value");
        assert_eq!(snake_if_necessary("MAX"), "MAX");
        assert_eq!(snake_if_necessary("Outer"), "Outer");
    }

    #[test]
    fn keywords_get_raw_prefix() {
        assert_eq!(value_name("type"), "r#type");
        assert_eq!(value_name("fn"), "r#fn");
        assert_eq!(value_name("self"), "self_");
        assert_eq!(value_name("count"), "count");
    }

    #[test]
    fn constant_renames() {
        assert_eq!(renamed_constant("MAX_VALUE"), Some("MAX"));
        assert_eq!(renamed_constant("NaN"), Some("NAN"));
        assert_eq!(renamed_constant("SIZE"), None);
    }
}
