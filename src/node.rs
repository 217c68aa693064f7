//! Grammar-level helpers for the permission tree: reserved keywords, boolean
//! literal spelling, and the legacy `no_bypass` alias.
//!
//! The tree itself is represented directly as [`serde_json::Value`] (there is
//! no parallel AST type). `Null` and `Number` are simply never valid nodes.

use once_cell::sync::Lazy;
use serde_json::Value;
use std::collections::HashSet;

/// A permission tree node. The grammar only ever produces `Bool`, `String`,
/// `Array`, and `Object` values; `Null` and `Number` are rejected wherever
/// they're encountered.
pub type Node = Value;

/// Reserved grammar keywords, canonical (upper-case) spelling.
pub const RESERVED_KEYS: [&str; 9] = [
    "NO_BYPASS", "AND", "NAND", "OR", "NOR", "XOR", "NOT", "TRUE", "FALSE",
];

static RESERVED_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| RESERVED_KEYS.iter().copied().collect());

/// The legacy, lower-case-only spelling of `NO_BYPASS` accepted at the root.
pub const LEGACY_NO_BYPASS: &str = "no_bypass";

/// The canonical spelling `NO_BYPASS` is renamed to at the root.
pub const NO_BYPASS: &str = "NO_BYPASS";

/// True if `name`, compared case-insensitively, is one of the grammar's
/// reserved keywords.
pub fn is_reserved_key(name: &str) -> bool {
    RESERVED_SET.contains(name.to_ascii_uppercase().as_str())
}

/// The grammar keyword a map key canonicalizes to, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    NoBypass,
    And,
    Nand,
    Or,
    Nor,
    Xor,
    Not,
    True,
    False,
}

impl Keyword {
    /// Case-insensitively canonicalize `key` to a grammar [`Keyword`], if it
    /// names one.
    pub fn parse(key: &str) -> Option<Self> {
        Some(match key.to_ascii_uppercase().as_str() {
            "NO_BYPASS" => Self::NoBypass,
            "AND" => Self::And,
            "NAND" => Self::Nand,
            "OR" => Self::Or,
            "NOR" => Self::Nor,
            "XOR" => Self::Xor,
            "NOT" => Self::Not,
            "TRUE" => Self::True,
            "FALSE" => Self::False,
            _ => return None,
        })
    }
}

/// Case-insensitively interpret `s` as the boolean-literal spelling
/// `"TRUE"`/`"FALSE"`, if it is one.
pub fn bool_literal(s: &str) -> Option<bool> {
    match s.to_ascii_uppercase().as_str() {
        "TRUE" => Some(true),
        "FALSE" => Some(false),
        _ => None,
    }
}

/// A name that parses as a finite number, rejected by `set_all` as
/// indistinguishable from an array index in many hosts.
pub fn looks_numeric(name: &str) -> bool {
    name.parse::<f64>().map(f64::is_finite).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_keys_are_case_insensitive() {
        assert!(is_reserved_key("and"));
        assert!(is_reserved_key("And"));
        assert!(is_reserved_key("NO_BYPASS"));
        assert!(is_reserved_key("no_bypass"));
        assert!(!is_reserved_key("role"));
    }

    #[test]
    fn keyword_parse_matches_reserved_keys() {
        for key in RESERVED_KEYS {
            assert!(Keyword::parse(key).is_some());
            assert!(Keyword::parse(&key.to_ascii_lowercase()).is_some());
        }
        assert!(Keyword::parse("flag").is_none());
    }

    #[test]
    fn bool_literal_is_case_insensitive() {
        assert_eq!(bool_literal("true"), Some(true));
        assert_eq!(bool_literal("FALSE"), Some(false));
        assert_eq!(bool_literal("Admin"), None);
    }

    #[test]
    fn numeric_looking_names() {
        assert!(looks_numeric("0"));
        assert!(looks_numeric("42"));
        assert!(looks_numeric("-3.5"));
        assert!(!looks_numeric("nan"));
        assert!(!looks_numeric("admin"));
        assert!(!looks_numeric(""));
    }
}
