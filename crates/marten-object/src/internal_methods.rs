//! ### [6.1.7.2 Object Internal Methods and Internal Slots](https://tc39.es/ecma262/#sec-object-internal-methods-and-internal-slots)
//!
//! Every object carries a `&'static` [`InternalMethods`] table. Ordinary
//! objects use [`ORDINARY_INTERNAL_METHODS`]; an exotic kind builds its own
//! table with struct update syntax, replacing only the entries whose behaviour
//! it changes:
//!
//! ```ignore
//! const MY_EXOTIC_INTERNAL_METHODS: InternalMethods = InternalMethods {
//!     get: my_exotic_get,
//!     ..ORDINARY_INTERNAL_METHODS
//! };
//! ```
//!
//! All entries return [`VmResult`]: `Ok(false)`/`Ok(None)` is a protocol
//! refusal, `Err` is an exception raised by user code (a getter, a setter,
//! a proxy trap) along the way.

use crate::cache::{CacheablePropertyMetadata, PropertyLookupPhase};
use crate::context::Context;
use crate::error::VmResult;
use crate::object::ObjectRef;
use crate::ordinary;
use crate::property::PropertyDescriptor;
use crate::property_key::PropertyKey;
use crate::value::Value;

/// `[[GetPrototypeOf]] ( )`
pub type GetPrototypeOf = fn(&mut Context, ObjectRef) -> VmResult<Option<ObjectRef>>;
/// `[[SetPrototypeOf]] ( V )`
pub type SetPrototypeOf = fn(&mut Context, ObjectRef, Option<ObjectRef>) -> VmResult<bool>;
/// `[[IsExtensible]] ( )`
pub type IsExtensible = fn(&mut Context, ObjectRef) -> VmResult<bool>;
/// `[[PreventExtensions]] ( )`
pub type PreventExtensions = fn(&mut Context, ObjectRef) -> VmResult<bool>;
/// `[[GetOwnProperty]] ( P )`
pub type GetOwnProperty =
    fn(&mut Context, ObjectRef, &PropertyKey) -> VmResult<Option<PropertyDescriptor>>;
/// `[[DefineOwnProperty]] ( P, Desc )`.
///
/// The last argument is the result of `[[GetOwnProperty]](P)` when the caller
/// already has it; `None` means "not looked up yet".
pub type DefineOwnProperty = fn(
    &mut Context,
    ObjectRef,
    &PropertyKey,
    PropertyDescriptor,
    Option<Option<PropertyDescriptor>>,
) -> VmResult<bool>;
/// `[[HasProperty]] ( P )`
pub type HasProperty = fn(&mut Context, ObjectRef, &PropertyKey) -> VmResult<bool>;
/// `[[Get]] ( P, Receiver )`
pub type Get = fn(
    &mut Context,
    ObjectRef,
    &PropertyKey,
    Value,
    Option<&mut CacheablePropertyMetadata>,
    PropertyLookupPhase,
) -> VmResult<Value>;
/// `[[Set]] ( P, V, Receiver )`
pub type Set = fn(
    &mut Context,
    ObjectRef,
    &PropertyKey,
    Value,
    Value,
    Option<&mut CacheablePropertyMetadata>,
    PropertyLookupPhase,
) -> VmResult<bool>;
/// `[[Delete]] ( P )`
pub type Delete = fn(&mut Context, ObjectRef, &PropertyKey) -> VmResult<bool>;
/// `[[OwnPropertyKeys]] ( )`
pub type OwnPropertyKeys = fn(&mut Context, ObjectRef) -> VmResult<Vec<PropertyKey>>;

/// Internal-method table of an object kind
#[derive(Clone, Copy)]
pub struct InternalMethods {
    /// `[[GetPrototypeOf]]`
    pub get_prototype_of: GetPrototypeOf,
    /// `[[SetPrototypeOf]]`
    pub set_prototype_of: SetPrototypeOf,
    /// `[[IsExtensible]]`
    pub is_extensible: IsExtensible,
    /// `[[PreventExtensions]]`
    pub prevent_extensions: PreventExtensions,
    /// `[[GetOwnProperty]]`
    pub get_own_property: GetOwnProperty,
    /// `[[DefineOwnProperty]]`
    pub define_own_property: DefineOwnProperty,
    /// `[[HasProperty]]`
    pub has_property: HasProperty,
    /// `[[Get]]`
    pub get: Get,
    /// `[[Set]]`
    pub set: Set,
    /// `[[Delete]]`
    pub delete: Delete,
    /// `[[OwnPropertyKeys]]`
    pub own_property_keys: OwnPropertyKeys,
}

/// Ordinary object internal methods
pub const ORDINARY_INTERNAL_METHODS: InternalMethods = InternalMethods {
    get_prototype_of: ordinary::ordinary_get_prototype_of,
    set_prototype_of: ordinary::ordinary_set_prototype_of,
    is_extensible: ordinary::ordinary_is_extensible,
    prevent_extensions: ordinary::ordinary_prevent_extensions,
    get_own_property: ordinary::ordinary_get_own_property,
    define_own_property: ordinary::ordinary_define_own_property,
    has_property: ordinary::ordinary_has_property,
    get: ordinary::ordinary_get,
    set: ordinary::ordinary_set,
    delete: ordinary::ordinary_delete,
    own_property_keys: ordinary::ordinary_own_property_keys,
};

/// ### [10.4.7 Immutable Prototype Exotic Objects](https://tc39.es/ecma262/#sec-immutable-prototype-exotic-objects)
pub const IMMUTABLE_PROTOTYPE_INTERNAL_METHODS: InternalMethods = InternalMethods {
    set_prototype_of: ordinary::immutable_prototype_set_prototype_of,
    ..ORDINARY_INTERNAL_METHODS
};

impl ObjectRef {
    fn methods(self, ctx: &Context) -> &'static InternalMethods {
        ctx.object(self).methods
    }

    /// `[[GetPrototypeOf]]`
    pub fn internal_get_prototype_of(self, ctx: &mut Context) -> VmResult<Option<ObjectRef>> {
        (self.methods(ctx).get_prototype_of)(ctx, self)
    }

    /// `[[SetPrototypeOf]]`
    pub fn internal_set_prototype_of(
        self,
        ctx: &mut Context,
        prototype: Option<ObjectRef>,
    ) -> VmResult<bool> {
        (self.methods(ctx).set_prototype_of)(ctx, self, prototype)
    }

    /// `[[IsExtensible]]`
    pub fn internal_is_extensible(self, ctx: &mut Context) -> VmResult<bool> {
        (self.methods(ctx).is_extensible)(ctx, self)
    }

    /// `[[PreventExtensions]]`
    pub fn internal_prevent_extensions(self, ctx: &mut Context) -> VmResult<bool> {
        (self.methods(ctx).prevent_extensions)(ctx, self)
    }

    /// `[[GetOwnProperty]]`
    pub fn internal_get_own_property(
        self,
        ctx: &mut Context,
        key: &PropertyKey,
    ) -> VmResult<Option<PropertyDescriptor>> {
        (self.methods(ctx).get_own_property)(ctx, self, key)
    }

    /// `[[DefineOwnProperty]]`
    pub fn internal_define_own_property(
        self,
        ctx: &mut Context,
        key: &PropertyKey,
        descriptor: PropertyDescriptor,
        precomputed_own_property: Option<Option<PropertyDescriptor>>,
    ) -> VmResult<bool> {
        let define_own_property = self.methods(ctx).define_own_property;
        define_own_property(ctx, self, key, descriptor, precomputed_own_property)
    }

    /// `[[HasProperty]]`
    pub fn internal_has_property(self, ctx: &mut Context, key: &PropertyKey) -> VmResult<bool> {
        (self.methods(ctx).has_property)(ctx, self, key)
    }

    /// `[[Get]]`
    pub fn internal_get(
        self,
        ctx: &mut Context,
        key: &PropertyKey,
        receiver: Value,
        cacheable_metadata: Option<&mut CacheablePropertyMetadata>,
        phase: PropertyLookupPhase,
    ) -> VmResult<Value> {
        (self.methods(ctx).get)(ctx, self, key, receiver, cacheable_metadata, phase)
    }

    /// `[[Set]]`
    pub fn internal_set(
        self,
        ctx: &mut Context,
        key: &PropertyKey,
        value: Value,
        receiver: Value,
        cacheable_metadata: Option<&mut CacheablePropertyMetadata>,
        phase: PropertyLookupPhase,
    ) -> VmResult<bool> {
        (self.methods(ctx).set)(ctx, self, key, value, receiver, cacheable_metadata, phase)
    }

    /// `[[Delete]]`
    pub fn internal_delete(self, ctx: &mut Context, key: &PropertyKey) -> VmResult<bool> {
        (self.methods(ctx).delete)(ctx, self, key)
    }

    /// `[[OwnPropertyKeys]]`
    pub fn internal_own_property_keys(self, ctx: &mut Context) -> VmResult<Vec<PropertyKey>> {
        (self.methods(ctx).own_property_keys)(ctx, self)
    }
}
