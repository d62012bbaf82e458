//! Execution context
//!
//! The context owns everything one single-threaded object graph needs: the
//! object heap, the shape registry, the string and symbol tables, and the
//! intrinsic objects. Independent contexts share nothing.

use std::rc::Rc;

use marten_gc::{GcConfig, GcStats, Heap};

use crate::error::{VmError, VmResult};
use crate::function::{NativeFunction, define_length_and_name};
use crate::internal_methods::{IMMUTABLE_PROTOTYPE_INTERNAL_METHODS, ORDINARY_INTERNAL_METHODS};
use crate::object::{Object, ObjectFlags, ObjectKind, ObjectRef};
use crate::property_key::PropertyKey;
use crate::shape::ShapeRegistry;
use crate::string::{JsString, StringTable};
use crate::symbol::{Symbol, SymbolRegistry};
use crate::value::Value;

/// Context configuration
#[derive(Debug, Clone)]
pub struct ContextConfig {
    /// Maximum nesting of [`Context::call`] (default: 1000)
    pub max_call_depth: usize,
    /// Maximum number of prototype hops a single lookup may take before the
    /// property is treated as absent (default: 256)
    pub max_prototype_chain_depth: usize,
    /// Heap configuration
    pub gc: GcConfig,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_call_depth: 1000,
            max_prototype_chain_depth: 256,
            gc: GcConfig::default(),
        }
    }
}

impl ContextConfig {
    /// Set the maximum call depth
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    /// Set the maximum prototype chain depth
    pub fn with_max_prototype_chain_depth(mut self, depth: usize) -> Self {
        self.max_prototype_chain_depth = depth;
        self
    }

    /// Set the heap configuration
    pub fn with_gc_config(mut self, gc: GcConfig) -> Self {
        self.gc = gc;
        self
    }
}

/// Objects every context creates at startup
#[derive(Debug, Clone, Copy)]
pub struct Intrinsics {
    object_prototype: ObjectRef,
    function_prototype: ObjectRef,
}

impl Intrinsics {
    /// `%Object.prototype%`: an immutable-prototype exotic object
    pub fn object_prototype(&self) -> ObjectRef {
        self.object_prototype
    }

    /// `%Function.prototype%`: callable, returns `undefined`
    pub fn function_prototype(&self) -> ObjectRef {
        self.function_prototype
    }
}

/// Execution context: owner of one object graph
pub struct Context {
    pub(crate) heap: Heap<Object>,
    pub(crate) shapes: ShapeRegistry,
    strings: StringTable,
    symbols: SymbolRegistry,
    intrinsics: Intrinsics,
    global_object: ObjectRef,
    config: ContextConfig,
    call_depth: usize,
    prototype_chain_depth: usize,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    /// Create a context with the default configuration
    pub fn new() -> Self {
        Self::with_config(ContextConfig::default())
    }

    /// Create a context
    pub fn with_config(config: ContextConfig) -> Self {
        let mut heap = Heap::with_config(config.gc.clone());
        let mut shapes = ShapeRegistry::new();

        let object_prototype = ObjectRef(heap.allocate(Object::new(
            shapes.shape_for_prototype(None),
            ObjectKind::Ordinary,
            &IMMUTABLE_PROTOTYPE_INTERNAL_METHODS,
            ObjectFlags::empty(),
        )));
        let function_prototype = ObjectRef(heap.allocate(Object::new(
            shapes.shape_for_prototype(Some(object_prototype)),
            ObjectKind::Function(NativeFunction::new(
                JsString::new(""),
                Rc::new(|_, _, _| Ok(Value::Undefined)),
            )),
            &ORDINARY_INTERNAL_METHODS,
            ObjectFlags::empty(),
        )));
        // The global object is built before any realm could hand it a
        // prototype, and receives one afterwards.
        let global_object = ObjectRef(heap.allocate(Object::new(
            shapes.shape_for_prototype(None),
            ObjectKind::Ordinary,
            &ORDINARY_INTERNAL_METHODS,
            ObjectFlags::empty(),
        )));

        let mut ctx = Self {
            heap,
            shapes,
            strings: StringTable::new(),
            symbols: SymbolRegistry::new(),
            intrinsics: Intrinsics {
                object_prototype,
                function_prototype,
            },
            global_object,
            config,
            call_depth: 0,
            prototype_chain_depth: 0,
        };
        global_object.set_prototype(&mut ctx, Some(object_prototype));
        let empty_name = ctx.intern("");
        define_length_and_name(&mut ctx, function_prototype, 0, empty_name);
        ctx
    }

    /// Configuration
    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// Intrinsic objects
    pub fn intrinsics(&self) -> &Intrinsics {
        &self.intrinsics
    }

    /// The global object
    pub fn global_object(&self) -> ObjectRef {
        self.global_object
    }

    /// Borrow an object.
    ///
    /// # Panics
    ///
    /// If `object` was reclaimed by the collector.
    #[inline]
    pub fn object(&self, object: ObjectRef) -> &Object {
        &self.heap[object.0]
    }

    /// Borrow an object mutably.
    ///
    /// # Panics
    ///
    /// If `object` was reclaimed by the collector.
    #[inline]
    pub fn object_mut(&mut self, object: ObjectRef) -> &mut Object {
        &mut self.heap[object.0]
    }

    /// Whether `object` still refers to a live object
    pub fn is_live(&self, object: ObjectRef) -> bool {
        self.heap.contains(object.0)
    }

    pub(crate) fn allocate(&mut self, object: Object) -> ObjectRef {
        ObjectRef(self.heap.allocate(object))
    }

    /// Shape registry
    pub fn shapes(&self) -> &ShapeRegistry {
        &self.shapes
    }

    /// Shape registry, mutably (for building premade shapes)
    pub fn shapes_mut(&mut self) -> &mut ShapeRegistry {
        &mut self.shapes
    }

    /// Intern a string
    pub fn intern(&mut self, s: &str) -> JsString {
        self.strings.intern(s)
    }

    /// Property key for an interned string
    pub fn key(&mut self, s: &str) -> PropertyKey {
        PropertyKey::from(self.strings.intern(s))
    }

    /// Symbol registry
    pub fn symbols(&mut self) -> &mut SymbolRegistry {
        &mut self.symbols
    }

    /// Create a new unique symbol
    pub fn new_symbol(&mut self, description: Option<&str>) -> Symbol {
        let description = description.map(|d| self.strings.intern(d));
        self.symbols.new_symbol(description)
    }

    /// Whether `value` is a callable object
    pub fn is_callable(&self, value: &Value) -> bool {
        value
            .as_object()
            .is_some_and(|object| self.object(object).is_callable())
    }

    /// Call a function object.
    ///
    /// Fails with a `TypeError` if `callee` is not callable, and with
    /// `StackOverflow` past [`ContextConfig::max_call_depth`] nested calls.
    pub fn call(&mut self, callee: &Value, this: Value, args: &[Value]) -> VmResult<Value> {
        let behaviour = match callee.as_object().map(|object| self.object(object).kind()) {
            Some(ObjectKind::Function(function)) => Rc::clone(function.behaviour()),
            _ => {
                return Err(VmError::type_error(format!(
                    "{} is not a function",
                    callee.type_name()
                )));
            }
        };
        if self.call_depth >= self.config.max_call_depth {
            return Err(VmError::StackOverflow);
        }

        self.call_depth += 1;
        // A getter starts a fresh lookup: its own prototype walks get the
        // full depth budget.
        let saved_chain_depth = std::mem::replace(&mut self.prototype_chain_depth, 0);
        let result = behaviour(self, this, args);
        self.prototype_chain_depth = saved_chain_depth;
        self.call_depth -= 1;
        result
    }

    /// Run `f` one prototype hop deeper.
    ///
    /// Returns `None` without running `f` once the configured depth is
    /// exhausted, which only happens on a cyclic or absurdly long chain.
    pub(crate) fn with_prototype_hop<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> VmResult<T>,
    ) -> VmResult<Option<T>> {
        if self.prototype_chain_depth >= self.config.max_prototype_chain_depth {
            tracing::warn!(
                target: "marten::object",
                depth = self.prototype_chain_depth,
                "prototype chain depth limit reached, treating property as absent"
            );
            return Ok(None);
        }
        self.prototype_chain_depth += 1;
        let result = f(self);
        self.prototype_chain_depth -= 1;
        result.map(Some)
    }

    /// Run a full collection.
    ///
    /// Roots are the intrinsics, the global object and `extra_roots`; every
    /// other object not reachable from them is reclaimed. Returns the number
    /// of objects freed.
    pub fn collect_garbage(&mut self, extra_roots: &[ObjectRef]) -> usize {
        let mut roots = vec![
            self.intrinsics.object_prototype.0,
            self.intrinsics.function_prototype.0,
            self.global_object.0,
        ];
        roots.extend(extra_roots.iter().map(|object| object.0));
        let freed = self.heap.collect(&roots);
        tracing::debug!(
            target: "marten::gc",
            freed,
            live = self.heap.len(),
            "collected garbage"
        );
        freed
    }

    /// Collect if the allocation threshold was reached
    pub fn collect_garbage_if_needed(&mut self, extra_roots: &[ObjectRef]) -> Option<usize> {
        self.heap
            .should_collect()
            .then(|| self.collect_garbage(extra_roots))
    }

    /// Heap statistics
    pub fn heap_stats(&self) -> GcStats {
        self.heap.stats()
    }

    /// Number of live objects
    pub fn live_objects(&self) -> usize {
        self.heap.len()
    }
}
