//! Unique symbols and the `Symbol.for` registry

use crate::string::JsString;
use rustc_hash::FxHashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

struct SymbolData {
    description: Option<JsString>,
}

/// A unique symbol. Two symbols are equal only if they are the same symbol.
#[derive(Clone)]
pub struct Symbol(Rc<SymbolData>);

impl Symbol {
    /// Create a new symbol, distinct from every other symbol.
    ///
    /// Prefer [`SymbolRegistry::new_symbol`] so the context can account for it.
    pub fn new(description: Option<JsString>) -> Self {
        Self(Rc::new(SymbolData { description }))
    }

    /// The description given at creation
    pub fn description(&self) -> Option<&JsString> {
        self.0.description.as_ref()
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Rc::as_ptr(&self.0) as *const () as usize).hash(state);
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.description() {
            Some(description) => write!(f, "Symbol({description})"),
            None => f.write_str("Symbol()"),
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Per-context symbol registry.
///
/// Backs `Symbol.for` / `Symbol.keyFor`: the same key always yields the same
/// symbol within one registry, and never a symbol of another registry.
#[derive(Default)]
pub struct SymbolRegistry {
    by_key: FxHashMap<JsString, Symbol>,
    by_symbol: FxHashMap<Symbol, JsString>,
    created: u64,
}

impl SymbolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an unregistered symbol
    pub fn new_symbol(&mut self, description: Option<JsString>) -> Symbol {
        self.created += 1;
        Symbol::new(description)
    }

    /// `Symbol.for(key)`
    pub fn for_key(&mut self, key: JsString) -> Symbol {
        if let Some(symbol) = self.by_key.get(&key) {
            return symbol.clone();
        }
        let symbol = self.new_symbol(Some(key.clone()));
        self.by_key.insert(key.clone(), symbol.clone());
        self.by_symbol.insert(symbol.clone(), key);
        symbol
    }

    /// `Symbol.keyFor(symbol)`
    pub fn key_for(&self, symbol: &Symbol) -> Option<JsString> {
        self.by_symbol.get(symbol).cloned()
    }

    /// Number of symbols created through this registry
    pub fn created(&self) -> u64 {
        self.created
    }
}
