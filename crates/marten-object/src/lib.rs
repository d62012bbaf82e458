//! # Marten Object
//!
//! Object and property model for the Marten runtime.
//!
//! ## Design Principles
//!
//! - **Hidden classes**: objects with identical property-addition history share
//!   one [`Shape`]; deletions and attribute changes move a single object to a
//!   private dictionary shape
//! - **Internal methods as a table**: every object carries a pointer to an
//!   [`InternalMethods`] table; exotic kinds override only the entries they need
//! - **Handles, not pointers**: objects live in the [`Context`]'s heap and are
//!   addressed by [`ObjectRef`]; the collector finds every edge through [`Trace`]
//! - **Three failure channels**: protocol failures are `Ok(false)`/`Ok(None)`,
//!   language-level throws are `Err(VmError)`, core bugs panic
//!
//! [`Trace`]: marten_gc::Trace

#![warn(clippy::all)]
#![warn(missing_docs)]

pub mod cache;
pub mod context;
pub mod error;
pub mod function;
pub mod indexed;
pub mod internal_methods;
pub mod object;
pub mod operations;
pub mod ordinary;
pub mod private;
pub mod property;
pub mod property_key;
pub mod shape;
pub mod string;
pub mod symbol;
pub mod value;

pub use cache::{CacheableKind, CacheablePropertyMetadata, PropertyLookupPhase};
pub use context::{Context, ContextConfig, Intrinsics};
pub use error::{VmError, VmResult};
pub use function::{NativeBehaviour, NativeFunction};
pub use indexed::{IndexedStorage, SPARSE_ARRAY_HOLE_THRESHOLD};
pub use internal_methods::{
    IMMUTABLE_PROTOTYPE_INTERNAL_METHODS, InternalMethods, ORDINARY_INTERNAL_METHODS,
};
pub use object::{
    IntrinsicAccessor, MayInterfereWithIndexedPropertyAccess, Object, ObjectFlags, ObjectKind,
    ObjectRef,
};
pub use operations::{IntegrityLevel, OwnPropertyEntry, PropertyKind, ShouldThrowExceptions};
pub use private::{PrivateElement, PrivateElementKind, PrivateName};
pub use property::{
    Accessor, PropertyAttributes, PropertyDescriptor, PropertyValue, ValueAndAttributes,
};
pub use property_key::PropertyKey;
pub use shape::{PropertyMetadata, Shape, ShapeId, ShapeKind, ShapeRegistry, ShapeStats};
pub use string::{JsString, StringTable};
pub use symbol::{Symbol, SymbolRegistry};
pub use value::Value;
