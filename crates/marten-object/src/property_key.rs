//! Property keys

use crate::string::JsString;
use crate::symbol::Symbol;
use crate::value::Value;
use std::fmt;

/// Largest canonical array index (`2^32 - 2`)
pub const MAX_ARRAY_INDEX: u32 = u32::MAX - 1;

/// Property key.
///
/// Integer-looking strings are normalized to [`PropertyKey::Index`] on
/// construction, so `"10"` and `10` are the same key. Construct keys through
/// the `From` impls; building `Index(u32::MAX)` by hand breaks that
/// normalization.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    /// Canonical array index in `0..=MAX_ARRAY_INDEX`
    Index(u32),
    /// String property key (never a canonical index)
    String(JsString),
    /// Symbol property key
    Symbol(Symbol),
}

impl PropertyKey {
    /// Create a key from a string, normalizing canonical indices
    pub fn string(s: &str) -> Self {
        match parse_array_index(s) {
            Some(index) => Self::Index(index),
            None => Self::String(JsString::new(s)),
        }
    }

    /// Whether this is an integer index
    pub fn is_index(&self) -> bool {
        matches!(self, Self::Index(_))
    }

    /// Whether this is a (non-index) string key
    pub fn is_string(&self) -> bool {
        matches!(self, Self::String(_))
    }

    /// Whether this is a symbol key
    pub fn is_symbol(&self) -> bool {
        matches!(self, Self::Symbol(_))
    }

    /// Get the index, if this is an index key
    pub fn as_index(&self) -> Option<u32> {
        match self {
            Self::Index(index) => Some(*index),
            _ => None,
        }
    }

    /// Convert to the value form (`String` for indices and names)
    pub fn to_value(&self) -> Value {
        match self {
            Self::Index(index) => Value::String(JsString::from(index.to_string())),
            Self::String(s) => Value::String(s.clone()),
            Self::Symbol(symbol) => Value::Symbol(symbol.clone()),
        }
    }

    /// SetFunctionName-style name: symbols become `[description]`
    pub fn function_name(&self) -> String {
        match self {
            Self::Index(index) => index.to_string(),
            Self::String(s) => s.to_string(),
            Self::Symbol(symbol) => match symbol.description() {
                Some(description) => format!("[{description}]"),
                None => String::new(),
            },
        }
    }
}

/// Parse a canonical array index: decimal, no sign, no leading zeros
/// (except `"0"` itself), at most `MAX_ARRAY_INDEX`.
fn parse_array_index(s: &str) -> Option<u32> {
    let bytes = s.as_bytes();
    if bytes.is_empty() || bytes.len() > 10 {
        return None;
    }
    if bytes.len() > 1 && bytes[0] == b'0' {
        return None;
    }
    if !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    let value: u64 = s.parse().ok()?;
    if value > MAX_ARRAY_INDEX as u64 {
        return None;
    }
    Some(value as u32)
}

impl From<&str> for PropertyKey {
    fn from(s: &str) -> Self {
        Self::string(s)
    }
}

impl From<JsString> for PropertyKey {
    fn from(s: JsString) -> Self {
        match parse_array_index(s.as_str()) {
            Some(index) => Self::Index(index),
            None => Self::String(s),
        }
    }
}

impl From<u32> for PropertyKey {
    fn from(index: u32) -> Self {
        if index > MAX_ARRAY_INDEX {
            Self::String(JsString::from(index.to_string()))
        } else {
            Self::Index(index)
        }
    }
}

impl From<Symbol> for PropertyKey {
    fn from(symbol: Symbol) -> Self {
        Self::Symbol(symbol)
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "{index}"),
            Self::String(s) => write!(f, "{s}"),
            Self::Symbol(symbol) => write!(f, "{symbol}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashSet;

    #[test]
    fn test_string_indices_are_canonicalized() {
        assert_eq!(PropertyKey::from("10"), PropertyKey::from(10u32));
        assert_eq!(PropertyKey::from("0"), PropertyKey::Index(0));
        assert_eq!(
            PropertyKey::from("4294967294"),
            PropertyKey::Index(MAX_ARRAY_INDEX)
        );
    }

    #[test]
    fn test_non_canonical_strings_stay_strings() {
        for s in ["01", "-1", "1.0", "", " 1", "4294967295", "99999999999", "1e3"] {
            assert!(PropertyKey::from(s).is_string(), "{s:?} should be a string key");
        }
    }

    #[test]
    fn test_u32_max_is_not_an_index() {
        let key = PropertyKey::from(u32::MAX);
        assert!(key.is_string());
        assert_eq!(key, PropertyKey::from("4294967295"));
    }

    #[test]
    fn test_hash_agrees_with_canonical_form() {
        let mut set = FxHashSet::default();
        set.insert(PropertyKey::from("7"));
        assert!(set.contains(&PropertyKey::from(7u32)));
        assert!(!set.contains(&PropertyKey::from("07")));
    }

    #[test]
    fn test_function_name() {
        let symbol = Symbol::new(Some("iterator".into()));
        assert_eq!(PropertyKey::from(symbol).function_name(), "[iterator]");
        assert_eq!(PropertyKey::from(Symbol::new(None)).function_name(), "");
        assert_eq!(PropertyKey::from("push").function_name(), "push");
    }
}
