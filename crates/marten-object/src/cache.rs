//! Cacheable lookup metadata.
//!
//! `internal_get`/`internal_set` accept an optional out-parameter describing
//! how the result of a lookup may be memoized by an inline cache. The
//! metadata is advisory: it never changes what the lookup returns.
//!
//! A filled-in record names a slot that is valid for a later lookup when the
//! receiver presents the same [`ShapeId`] (and, for prototype hits, the
//! prototype still has the recorded shape). Shape ids change on every
//! dictionary mutation, so a stale record can never match.
//!
//! A shape records attribute bits, not whether a slot holds a data value or an
//! accessor pair: a non-writable data property and an accessor with the same
//! enumerable/configurable bits share a transition. Consumers must check that
//! the slot read through `get_direct` is still [`PropertyValue::Data`] before
//! using it as the result.
//!
//! [`PropertyValue::Data`]: crate::property::PropertyValue::Data

use crate::object::ObjectRef;
use crate::shape::ShapeId;

/// How a lookup result may be cached
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CacheableKind {
    /// Must be looked up again next time
    #[default]
    NotCacheable,
    /// Found as a named data property directly on the queried object
    OwnProperty,
    /// Found as a named data property on an object in the prototype chain
    InPrototypeChain,
}

/// Out-parameter of `internal_get`/`internal_set`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheablePropertyMetadata {
    /// Cacheability of the lookup
    pub kind: CacheableKind,
    /// Storage slot of the property on the holder
    pub property_offset: Option<u32>,
    /// Shape of the holder at lookup time
    pub shape: Option<ShapeId>,
    /// Holder, for `InPrototypeChain` hits
    pub prototype: Option<ObjectRef>,
}

impl CacheablePropertyMetadata {
    /// Whether the lookup may be cached
    pub fn is_cacheable(&self) -> bool {
        self.kind != CacheableKind::NotCacheable
    }
}

/// Where in a prototype walk an internal method was invoked
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PropertyLookupPhase {
    /// On the object the lookup started at
    #[default]
    OwnProperty,
    /// On a prototype, on behalf of an object further down the chain
    PrototypeChain,
}
