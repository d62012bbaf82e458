//! Object cells and the storage layer below the internal methods.
//!
//! An [`Object`] couples a [`Shape`] (named-property layout), a storage vector
//! indexed by shape slots, [`IndexedStorage`] for integer keys and a list of
//! private elements. Objects live in the [`Context`] heap and are addressed by
//! [`ObjectRef`].
//!
//! The `storage_*` functions read and write own properties without any
//! validation; the internal methods in [`crate::ordinary`] are built on them.

use crate::context::Context;
use crate::function::NativeFunction;
use crate::indexed::IndexedStorage;
use crate::internal_methods::{InternalMethods, ORDINARY_INTERNAL_METHODS};
use crate::private::PrivateElement;
use crate::property::{PropertyAttributes, PropertyValue, ValueAndAttributes};
use crate::property_key::PropertyKey;
use crate::shape::Shape;
use crate::value::Value;
use marten_gc::{GcRef, Trace, Tracer};
use rustc_hash::FxHashMap;
use std::fmt;
use std::rc::Rc;

/// Dictionary shapes are rebuilt once they have at least this many holes and
/// more holes than live properties.
const COMPACTION_MIN_HOLES: usize = 8;

/// Handle to an object in a [`Context`]'s heap.
///
/// Copying a handle does not keep the object alive: only objects reachable
/// from the context's roots survive a collection.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectRef(pub(crate) GcRef<Object>);

impl ObjectRef {
    /// Underlying heap handle
    pub fn gc_ref(self) -> GcRef<Object> {
        self.0
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectRef({}@{})", self.0.index(), self.0.generation())
    }
}

bitflags::bitflags! {
    /// Capability flags declared when an object is created
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ObjectFlags: u8 {
        /// Indexed access may be intercepted; elements always use sparse storage
        const MAY_INTERFERE_WITH_INDEXED_PROPERTY_ACCESS = 1 << 0;
        /// Typed-array-like: integer keys are answered by the internal methods,
        /// never by element storage or the prototype chain
        const TYPED_ARRAY_LIKE = 1 << 1;
    }
}

/// Construction-time declaration for exotic objects
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MayInterfereWithIndexedPropertyAccess {
    /// Indexed access behaves ordinarily
    No,
    /// Indexed access may be intercepted
    Yes,
}

/// Lazily evaluated initial value of a property
pub type IntrinsicAccessor = fn(&mut Context) -> Value;

/// What kind of object a cell holds
pub enum ObjectKind {
    /// Ordinary object
    Ordinary,
    /// Callable native function
    Function(NativeFunction),
}

/// An object cell
pub struct Object {
    shape: Rc<Shape>,
    /// Indexed by shape slot; `storage.len() == shape.storage_len()`
    pub(crate) storage: Vec<PropertyValue>,
    pub(crate) indexed: IndexedStorage,
    pub(crate) private_elements: Vec<PrivateElement>,
    intrinsic_accessors: FxHashMap<PropertyKey, IntrinsicAccessor>,
    pub(crate) extensible: bool,
    flags: ObjectFlags,
    kind: ObjectKind,
    pub(crate) methods: &'static InternalMethods,
}

impl Object {
    pub(crate) fn new(
        shape: Rc<Shape>,
        kind: ObjectKind,
        methods: &'static InternalMethods,
        flags: ObjectFlags,
    ) -> Self {
        let indexed = if flags.contains(ObjectFlags::MAY_INTERFERE_WITH_INDEXED_PROPERTY_ACCESS)
        {
            IndexedStorage::sparse()
        } else {
            IndexedStorage::new()
        };
        Self {
            storage: vec![PropertyValue::default(); shape.storage_len()],
            shape,
            indexed,
            private_elements: Vec::new(),
            intrinsic_accessors: FxHashMap::default(),
            extensible: true,
            flags,
            kind,
            methods,
        }
    }

    /// Allocate an ordinary object with an explicit prototype
    pub fn create(ctx: &mut Context, prototype: Option<ObjectRef>) -> ObjectRef {
        let shape = ctx.shapes.shape_for_prototype(prototype);
        ctx.allocate(Object::new(
            shape,
            ObjectKind::Ordinary,
            &ORDINARY_INTERNAL_METHODS,
            ObjectFlags::empty(),
        ))
    }

    /// Allocate an ordinary object inheriting from `%Object.prototype%`
    pub fn create_with_default_prototype(ctx: &mut Context) -> ObjectRef {
        let prototype = ctx.intrinsics().object_prototype();
        Self::create(ctx, Some(prototype))
    }

    /// Allocate an ordinary object whose prototype will be assigned later
    pub fn create_without_prototype(ctx: &mut Context) -> ObjectRef {
        Self::create(ctx, None)
    }

    /// Allocate an object with a shape built ahead of time.
    ///
    /// Storage is sized to the shape and holds `undefined` until filled with
    /// [`ObjectRef::put_direct`].
    pub fn create_with_premade_shape(ctx: &mut Context, shape: Rc<Shape>) -> ObjectRef {
        assert!(
            !shape.is_dictionary(),
            "premade shapes must be shared shapes"
        );
        ctx.allocate(Object::new(
            shape,
            ObjectKind::Ordinary,
            &ORDINARY_INTERNAL_METHODS,
            ObjectFlags::empty(),
        ))
    }

    /// Allocate an object with its own internal-method table
    pub fn create_exotic(
        ctx: &mut Context,
        prototype: Option<ObjectRef>,
        kind: ObjectKind,
        methods: &'static InternalMethods,
        flags: ObjectFlags,
    ) -> ObjectRef {
        let shape = ctx.shapes.shape_for_prototype(prototype);
        ctx.allocate(Object::new(shape, kind, methods, flags))
    }

    /// Current shape
    pub fn shape(&self) -> &Rc<Shape> {
        &self.shape
    }

    /// Prototype, as recorded in the shape
    pub fn prototype(&self) -> Option<ObjectRef> {
        self.shape.prototype()
    }

    /// `[[Extensible]]`
    pub fn is_extensible(&self) -> bool {
        self.extensible
    }

    /// Capability flags
    pub fn flags(&self) -> ObjectFlags {
        self.flags
    }

    /// Whether integer keys bypass element storage
    pub fn is_typed_array_like(&self) -> bool {
        self.flags.contains(ObjectFlags::TYPED_ARRAY_LIKE)
    }

    /// Whether indexed access may be intercepted
    pub fn may_interfere_with_indexed_property_access(
        &self,
    ) -> MayInterfereWithIndexedPropertyAccess {
        if self
            .flags
            .contains(ObjectFlags::MAY_INTERFERE_WITH_INDEXED_PROPERTY_ACCESS)
        {
            MayInterfereWithIndexedPropertyAccess::Yes
        } else {
            MayInterfereWithIndexedPropertyAccess::No
        }
    }

    /// Cell kind
    pub fn kind(&self) -> &ObjectKind {
        &self.kind
    }

    /// Whether the object has a `[[Call]]` behaviour
    pub fn is_callable(&self) -> bool {
        matches!(self.kind, ObjectKind::Function(_))
    }

    /// Internal-method table
    pub fn methods(&self) -> &'static InternalMethods {
        self.methods
    }

    /// Integer-keyed elements
    pub fn indexed(&self) -> &IndexedStorage {
        &self.indexed
    }

    /// Private elements in addition order
    pub fn private_elements(&self) -> &[PrivateElement] {
        &self.private_elements
    }

    /// Whether a lazily materialized property is still pending
    pub fn has_intrinsic_accessors(&self) -> bool {
        !self.intrinsic_accessors.is_empty()
    }

    /// Report every object this cell references: the prototype, property
    /// values and accessor functions in named, indexed and private storage.
    pub fn visit_edges(&self, mut visitor: impl FnMut(ObjectRef)) {
        if let Some(prototype) = self.shape.prototype() {
            visitor(prototype);
        }
        for value in &self.storage {
            value.for_each_object(&mut visitor);
        }
        for value in self.indexed.values() {
            value.for_each_object(&mut visitor);
        }
        for element in &self.private_elements {
            element.value().for_each_object(&mut visitor);
        }
    }
}

impl Trace for Object {
    fn trace(&self, tracer: &mut dyn Tracer<Self>) {
        self.visit_edges(|object| tracer.mark(object.0));
    }
}

impl ObjectRef {
    /// Read a storage slot directly.
    ///
    /// # Panics
    ///
    /// If `offset` is outside the object's storage.
    pub fn get_direct(self, ctx: &Context, offset: u32) -> &PropertyValue {
        let object = ctx.object(self);
        match object.storage.get(offset as usize) {
            Some(value) => value,
            None => panic!(
                "slot {offset} out of range for {self:?} with {} slots",
                object.storage.len()
            ),
        }
    }

    /// Write a storage slot directly, bypassing shape and attribute checks.
    ///
    /// # Panics
    ///
    /// If `offset` is outside the object's storage.
    pub fn put_direct(self, ctx: &mut Context, offset: u32, value: PropertyValue) {
        let object = ctx.object_mut(self);
        let len = object.storage.len();
        match object.storage.get_mut(offset as usize) {
            Some(slot) => *slot = value,
            None => panic!("slot {offset} out of range for {self:?} with {len} slots"),
        }
    }

    /// Read an own property from storage without invoking getters.
    ///
    /// Materializes a pending intrinsic accessor for `key` first.
    pub fn storage_get(self, ctx: &mut Context, key: &PropertyKey) -> Option<ValueAndAttributes> {
        if let Some(index) = key.as_index() {
            return ctx.object(self).indexed.get(index);
        }
        self.materialize_intrinsic_accessor(ctx, key);
        let object = ctx.object(self);
        let metadata = object.shape.lookup(key)?;
        Some(ValueAndAttributes {
            value: object.storage[metadata.offset as usize].clone(),
            attributes: metadata.attributes,
        })
    }

    /// Whether an own property exists in storage
    pub fn storage_has(self, ctx: &Context, key: &PropertyKey) -> bool {
        let object = ctx.object(self);
        match key.as_index() {
            Some(index) => object.indexed.has(index),
            None => object.shape.lookup(key).is_some(),
        }
    }

    /// Create or overwrite an own property without validation.
    ///
    /// Changing the attributes of an existing named property moves the object
    /// to a dictionary shape.
    pub fn storage_set(self, ctx: &mut Context, key: &PropertyKey, element: ValueAndAttributes) {
        if let Some(index) = key.as_index() {
            ctx.object_mut(self).indexed.put(index, element);
            return;
        }

        let shapes = &mut ctx.shapes;
        let object = &mut ctx.heap[self.0];
        object.intrinsic_accessors.remove(key);

        if let Some(metadata) = object.shape.lookup(key) {
            if metadata.attributes != element.attributes {
                if !object.shape.is_dictionary() {
                    object.shape = shapes.to_dictionary(&object.shape);
                }
                shapes.dictionary_set_attributes(&mut object.shape, key, element.attributes);
            }
            object.storage[metadata.offset as usize] = element.value;
            return;
        }

        if object.shape.is_dictionary() {
            shapes.dictionary_add(&mut object.shape, key.clone(), element.attributes);
        } else {
            object.shape =
                shapes.add_property_transition(&object.shape, key.clone(), element.attributes);
        }
        object.storage.push(element.value);
        assert_eq!(
            object.storage.len(),
            object.shape.storage_len(),
            "storage out of sync with shape after adding {key}"
        );
    }

    /// Remove an own property without validation.
    ///
    /// Named properties move the object to a dictionary shape; the freed slot
    /// stays a hole until the dictionary is compacted.
    pub fn storage_delete(self, ctx: &mut Context, key: &PropertyKey) {
        if let Some(index) = key.as_index() {
            ctx.object_mut(self).indexed.remove(index);
            return;
        }

        let shapes = &mut ctx.shapes;
        let object = &mut ctx.heap[self.0];
        object.intrinsic_accessors.remove(key);
        let Some(metadata) = object.shape.lookup(key) else {
            return;
        };

        if !object.shape.is_dictionary() {
            object.shape = shapes.to_dictionary(&object.shape);
        }
        shapes.dictionary_remove(&mut object.shape, key);
        object.storage[metadata.offset as usize] = PropertyValue::default();

        let holes = object.shape.hole_count();
        if holes >= COMPACTION_MIN_HOLES && holes > object.shape.property_count() {
            let old_offsets = shapes.dictionary_compact(&mut object.shape);
            let mut old_storage = std::mem::take(&mut object.storage);
            object.storage = old_offsets
                .into_iter()
                .map(|offset| std::mem::take(&mut old_storage[offset as usize]))
                .collect();
        }
    }

    /// Replace the prototype without any checks.
    ///
    /// `[[SetPrototypeOf]]` is built on this; calling it directly can create
    /// prototype cycles.
    pub fn set_prototype(self, ctx: &mut Context, prototype: Option<ObjectRef>) {
        let shapes = &mut ctx.shapes;
        let object = &mut ctx.heap[self.0];
        if object.shape.prototype() == prototype {
            return;
        }
        if object.shape.is_dictionary() {
            shapes.dictionary_set_prototype(&mut object.shape, prototype);
        } else {
            object.shape = shapes.prototype_transition(&object.shape, prototype);
        }
    }

    /// Register a lazily computed initial value for an existing named property.
    ///
    /// The object moves to a dictionary shape: a shared shape would let another
    /// object with the same shape id present a slot that is still pending.
    pub(crate) fn set_intrinsic_accessor(
        self,
        ctx: &mut Context,
        key: PropertyKey,
        accessor: IntrinsicAccessor,
    ) {
        let shapes = &mut ctx.shapes;
        let object = &mut ctx.heap[self.0];
        if !object.shape.is_dictionary() {
            object.shape = shapes.to_dictionary(&object.shape);
        }
        object.intrinsic_accessors.insert(key, accessor);
    }

    fn materialize_intrinsic_accessor(self, ctx: &mut Context, key: &PropertyKey) {
        let object = ctx.object_mut(self);
        if object.intrinsic_accessors.is_empty() {
            return;
        }
        let Some(accessor) = object.intrinsic_accessors.remove(key) else {
            return;
        };
        let value = accessor(ctx);
        let object = ctx.object_mut(self);
        if let Some(metadata) = object.shape.lookup(key) {
            object.storage[metadata.offset as usize] = PropertyValue::Data(value);
        }
    }

    /// Attribute bits of an own named property, if present
    pub(crate) fn named_property_metadata(
        self,
        ctx: &Context,
        key: &PropertyKey,
    ) -> Option<(crate::shape::ShapeId, u32, PropertyAttributes)> {
        if key.is_index() {
            return None;
        }
        let shape = ctx.object(self).shape();
        shape
            .lookup(key)
            .map(|metadata| (shape.id(), metadata.offset, metadata.attributes))
    }
}
