//! Immutable strings and the per-context intern table

use rustc_hash::FxHashSet;
use std::borrow::Borrow;
use std::fmt;
use std::rc::Rc;

/// An immutable, cheaply clonable string.
///
/// Equality and hashing are by content, so an interned and a non-interned
/// copy of the same text compare equal.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JsString(Rc<str>);

impl JsString {
    /// Create a string
    pub fn new(s: &str) -> Self {
        Self(Rc::from(s))
    }

    /// Get the string contents
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the string is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether both handles share the same allocation
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Borrow<str> for JsString {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for JsString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for JsString {
    fn from(s: String) -> Self {
        Self(Rc::from(s))
    }
}

impl fmt::Display for JsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for JsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", &*self.0)
    }
}

/// String intern table owned by a [`Context`](crate::Context).
#[derive(Default)]
pub struct StringTable {
    strings: FxHashSet<JsString>,
}

impl StringTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the canonical copy of `s`, inserting it on first use
    pub fn intern(&mut self, s: &str) -> JsString {
        if let Some(existing) = self.strings.get(s) {
            return existing.clone();
        }
        let string = JsString::new(s);
        self.strings.insert(string.clone());
        string
    }

    /// Number of interned strings
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}
