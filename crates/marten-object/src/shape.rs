//! Hidden Classes (Shapes) for property access optimization.
//!
//! A Shape describes the named-property layout of an object: which keys it
//! has, the storage slot of each, their attributes, and the object's
//! prototype. Shapes are shared between objects with the same history using a
//! transition tree. Integer-indexed properties never appear in a Shape.
//!
//! Shared shapes are immutable. An object that deletes a property or changes
//! one's attributes moves to a private *dictionary* shape, which it then
//! mutates in place; every such mutation assigns a fresh [`ShapeId`] so inline
//! caches keyed by shape identity can never observe a stale layout.

use crate::object::ObjectRef;
use crate::property::PropertyAttributes;
use crate::property_key::PropertyKey;
use indexmap::IndexMap;
use rustc_hash::{FxBuildHasher, FxHashMap};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Identity of a shape. Never reused within one [`ShapeRegistry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeId(u32);

impl ShapeId {
    /// Raw id
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

/// Slot and attributes of a named property
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PropertyMetadata {
    /// Index into the object's storage vector
    pub offset: u32,
    /// Attribute bits
    pub attributes: PropertyAttributes,
}

/// Edge in the transition tree
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TransitionKey {
    /// Add a property with the given attributes
    Put(PropertyKey, PropertyAttributes),
    /// Change the prototype
    Prototype(Option<ObjectRef>),
}

/// Whether a shape may be shared
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShapeKind {
    /// Member of the transition tree, immutable, shared between objects
    Shared,
    /// Private to one object, mutated in place
    Dictionary,
}

/// A Shape defines the layout of properties in an object.
pub struct Shape {
    id: ShapeId,
    kind: ShapeKind,
    /// The parent shape from which this shape was transitioned.
    /// None for roots and dictionaries.
    parent: Option<Rc<Shape>>,
    /// The edge that led here from `parent`
    transition: Option<TransitionKey>,
    prototype: Option<ObjectRef>,
    /// All named properties in first-insertion order
    properties: IndexMap<PropertyKey, PropertyMetadata, FxBuildHasher>,
    /// Storage length required by objects of this shape
    next_offset: u32,
    /// Child -> parent is strong (Rc), parent -> child is Weak.
    /// RefCell since transitions are not on the lookup fast path.
    transitions: RefCell<FxHashMap<TransitionKey, Weak<Shape>>>,
}

impl Shape {
    /// Shape identity
    pub fn id(&self) -> ShapeId {
        self.id
    }

    /// Shared or dictionary
    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    /// Whether this is a private dictionary shape
    pub fn is_dictionary(&self) -> bool {
        self.kind == ShapeKind::Dictionary
    }

    /// Parent in the transition tree
    pub fn parent(&self) -> Option<&Rc<Shape>> {
        self.parent.as_ref()
    }

    /// Edge from the parent
    pub fn transition_key(&self) -> Option<&TransitionKey> {
        self.transition.as_ref()
    }

    /// Prototype of objects with this shape
    pub fn prototype(&self) -> Option<ObjectRef> {
        self.prototype
    }

    /// Look up a named property
    #[inline]
    pub fn lookup(&self, key: &PropertyKey) -> Option<PropertyMetadata> {
        self.properties.get(key).copied()
    }

    /// Number of named properties
    pub fn property_count(&self) -> usize {
        self.properties.len()
    }

    /// Storage vector length required by this shape
    pub fn storage_len(&self) -> usize {
        self.next_offset as usize
    }

    /// Slots left behind by deletions (dictionary shapes only)
    pub fn hole_count(&self) -> usize {
        self.storage_len() - self.property_count()
    }

    /// Keys in first-insertion order
    pub fn keys(&self) -> impl Iterator<Item = &PropertyKey> {
        self.properties.keys()
    }

    /// Keys with their metadata, in first-insertion order
    pub fn properties(&self) -> impl Iterator<Item = (&PropertyKey, PropertyMetadata)> {
        self.properties.iter().map(|(key, metadata)| (key, *metadata))
    }

    /// Number of live cached child transitions
    pub fn transition_count(&self) -> usize {
        self.transitions
            .borrow()
            .values()
            .filter(|child| child.strong_count() > 0)
            .count()
    }

    fn cached_transition(&self, key: &TransitionKey) -> Option<Rc<Shape>> {
        self.transitions.borrow().get(key).and_then(Weak::upgrade)
    }

    fn cache_transition(&self, key: TransitionKey, child: &Rc<Shape>) {
        let mut transitions = self.transitions.borrow_mut();
        transitions.retain(|_, existing| existing.strong_count() > 0);
        transitions.insert(key, Rc::downgrade(child));
    }

    fn clone_as_dictionary(&self, id: ShapeId) -> Shape {
        Shape {
            id,
            kind: ShapeKind::Dictionary,
            parent: None,
            transition: None,
            prototype: self.prototype,
            properties: self.properties.clone(),
            next_offset: self.next_offset,
            transitions: RefCell::default(),
        }
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shape")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("prototype", &self.prototype)
            .field("property_count", &self.property_count())
            .finish()
    }
}

/// Counters kept by a [`ShapeRegistry`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ShapeStats {
    /// Shapes created, including dictionary shapes
    pub shapes_created: u64,
    /// Transition lookups answered from the cache
    pub transitions_reused: u64,
    /// Objects moved from a shared shape to a dictionary shape
    pub dictionary_conversions: u64,
}

/// Owner of the transition tree root and of shape id allocation.
///
/// One registry per [`Context`](crate::Context): shapes of independent
/// contexts never meet.
pub struct ShapeRegistry {
    next_id: u32,
    empty: Rc<Shape>,
    stats: ShapeStats,
}

impl Default for ShapeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ShapeRegistry {
    /// Create a registry with a fresh root shape
    pub fn new() -> Self {
        let empty = Rc::new(Shape {
            id: ShapeId(0),
            kind: ShapeKind::Shared,
            parent: None,
            transition: None,
            prototype: None,
            properties: IndexMap::default(),
            next_offset: 0,
            transitions: RefCell::default(),
        });
        Self {
            next_id: 1,
            empty,
            stats: ShapeStats {
                shapes_created: 1,
                ..Default::default()
            },
        }
    }

    fn allocate_id(&mut self) -> ShapeId {
        let id = ShapeId(self.next_id);
        self.next_id = self
            .next_id
            .checked_add(1)
            .unwrap_or_else(|| panic!("shape id space exhausted"));
        self.stats.shapes_created += 1;
        id
    }

    /// Root shape: no properties, no prototype
    pub fn empty_shape(&self) -> &Rc<Shape> {
        &self.empty
    }

    /// Counters
    pub fn stats(&self) -> ShapeStats {
        self.stats
    }

    /// Root shape for objects with the given prototype
    pub fn shape_for_prototype(&mut self, prototype: Option<ObjectRef>) -> Rc<Shape> {
        let empty = Rc::clone(&self.empty);
        self.prototype_transition(&empty, prototype)
    }

    /// Return the unique child of `shape` that adds `key` with `attributes`.
    ///
    /// # Panics
    ///
    /// If `shape` is a dictionary or already has `key`: both would corrupt
    /// every object sharing the shape.
    pub fn add_property_transition(
        &mut self,
        shape: &Rc<Shape>,
        key: PropertyKey,
        attributes: PropertyAttributes,
    ) -> Rc<Shape> {
        assert!(
            !shape.is_dictionary(),
            "shared transition requested on dictionary shape {:?}",
            shape.id
        );
        assert!(
            !key.is_index(),
            "index key {key} must live in indexed storage"
        );
        assert!(
            !shape.properties.contains_key(&key),
            "shape {:?} already has property {key}",
            shape.id
        );

        let transition = TransitionKey::Put(key.clone(), attributes);
        if let Some(child) = shape.cached_transition(&transition) {
            self.stats.transitions_reused += 1;
            return child;
        }

        let mut properties = shape.properties.clone();
        properties.insert(
            key.clone(),
            PropertyMetadata {
                offset: shape.next_offset,
                attributes,
            },
        );
        let child = Rc::new(Shape {
            id: self.allocate_id(),
            kind: ShapeKind::Shared,
            parent: Some(Rc::clone(shape)),
            transition: Some(transition.clone()),
            prototype: shape.prototype,
            properties,
            next_offset: shape.next_offset + 1,
            transitions: RefCell::default(),
        });
        tracing::trace!(
            target: "marten::shape",
            parent = shape.id.0,
            child = child.id.0,
            key = %key,
            "created property transition"
        );
        shape.cache_transition(transition, &child);
        child
    }

    /// Return the unique child of `shape` that differs only in prototype
    pub fn prototype_transition(
        &mut self,
        shape: &Rc<Shape>,
        prototype: Option<ObjectRef>,
    ) -> Rc<Shape> {
        assert!(
            !shape.is_dictionary(),
            "shared transition requested on dictionary shape {:?}",
            shape.id
        );
        if shape.prototype == prototype {
            return Rc::clone(shape);
        }

        let transition = TransitionKey::Prototype(prototype);
        if let Some(child) = shape.cached_transition(&transition) {
            self.stats.transitions_reused += 1;
            return child;
        }

        let child = Rc::new(Shape {
            id: self.allocate_id(),
            kind: ShapeKind::Shared,
            parent: Some(Rc::clone(shape)),
            transition: Some(transition.clone()),
            prototype,
            properties: shape.properties.clone(),
            next_offset: shape.next_offset,
            transitions: RefCell::default(),
        });
        tracing::trace!(
            target: "marten::shape",
            parent = shape.id.0,
            child = child.id.0,
            "created prototype transition"
        );
        shape.cache_transition(transition, &child);
        child
    }

    /// Build a shape for a known property list in one go.
    ///
    /// The result is the same shape incremental addition of `properties` in
    /// order would reach, so objects built either way share it.
    pub fn create_premade(
        &mut self,
        prototype: Option<ObjectRef>,
        properties: impl IntoIterator<Item = (PropertyKey, PropertyAttributes)>,
    ) -> Rc<Shape> {
        let mut shape = self.shape_for_prototype(prototype);
        for (key, attributes) in properties {
            shape = self.add_property_transition(&shape, key, attributes);
        }
        shape
    }

    /// Detach a private copy of `shape` from the transition tree
    pub fn to_dictionary(&mut self, shape: &Rc<Shape>) -> Rc<Shape> {
        let id = self.allocate_id();
        self.stats.dictionary_conversions += 1;
        tracing::debug!(
            target: "marten::shape",
            from = shape.id.0,
            to = id.0,
            properties = shape.property_count(),
            "converted to dictionary shape"
        );
        Rc::new(shape.clone_as_dictionary(id))
    }

    /// Get a uniquely owned dictionary shape with a fresh id, ready to mutate
    fn dictionary_mut<'a>(&mut self, shape: &'a mut Rc<Shape>) -> &'a mut Shape {
        assert!(
            shape.is_dictionary(),
            "in-place mutation of shared shape {:?}",
            shape.id
        );
        let id = self.allocate_id();
        if Rc::get_mut(shape).is_none() {
            *shape = Rc::new(shape.clone_as_dictionary(id));
        }
        let Some(unique) = Rc::get_mut(shape) else {
            unreachable!("freshly cloned dictionary shape is uniquely owned")
        };
        unique.id = id;
        unique
    }

    /// Add a property to a dictionary shape, returning its slot
    pub fn dictionary_add(
        &mut self,
        shape: &mut Rc<Shape>,
        key: PropertyKey,
        attributes: PropertyAttributes,
    ) -> u32 {
        assert!(!key.is_index(), "index key {key} must live in indexed storage");
        let shape = self.dictionary_mut(shape);
        assert!(
            !shape.properties.contains_key(&key),
            "dictionary shape {:?} already has property {key}",
            shape.id
        );
        let offset = shape.next_offset;
        shape.next_offset += 1;
        shape.properties.insert(key, PropertyMetadata { offset, attributes });
        offset
    }

    /// Rewrite the attributes of an existing property of a dictionary shape
    pub fn dictionary_set_attributes(
        &mut self,
        shape: &mut Rc<Shape>,
        key: &PropertyKey,
        attributes: PropertyAttributes,
    ) {
        let shape = self.dictionary_mut(shape);
        let id = shape.id;
        let Some(metadata) = shape.properties.get_mut(key) else {
            panic!("dictionary shape {id:?} has no property {key}");
        };
        metadata.attributes = attributes;
    }

    /// Remove a property from a dictionary shape. Its slot becomes a hole.
    pub fn dictionary_remove(
        &mut self,
        shape: &mut Rc<Shape>,
        key: &PropertyKey,
    ) -> Option<PropertyMetadata> {
        self.dictionary_mut(shape).properties.shift_remove(key)
    }

    /// Change the prototype recorded in a dictionary shape
    pub fn dictionary_set_prototype(
        &mut self,
        shape: &mut Rc<Shape>,
        prototype: Option<ObjectRef>,
    ) {
        self.dictionary_mut(shape).prototype = prototype;
    }

    /// Renumber the slots of a dictionary shape densely, in key order.
    ///
    /// Returns the old slot of each property, indexed by new slot, so the
    /// owner can rebuild its storage vector.
    pub fn dictionary_compact(&mut self, shape: &mut Rc<Shape>) -> Vec<u32> {
        let shape = self.dictionary_mut(shape);
        let mut old_offsets = Vec::with_capacity(shape.properties.len());
        for (new_offset, metadata) in shape.properties.values_mut().enumerate() {
            old_offsets.push(metadata.offset);
            metadata.offset = new_offset as u32;
        }
        shape.next_offset = old_offsets.len() as u32;
        tracing::debug!(
            target: "marten::shape",
            shape = shape.id.0,
            properties = old_offsets.len(),
            "compacted dictionary shape"
        );
        old_offsets
    }
}
