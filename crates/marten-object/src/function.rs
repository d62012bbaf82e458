//! Native function objects

use crate::context::Context;
use crate::error::VmResult;
use crate::internal_methods::ORDINARY_INTERNAL_METHODS;
use crate::object::{Object, ObjectFlags, ObjectKind, ObjectRef};
use crate::property::PropertyAttributes;
use crate::string::JsString;
use crate::value::Value;
use std::fmt;
use std::rc::Rc;

/// Behaviour of a native function: `(ctx, this, arguments) -> result`.
///
/// Closures must not capture [`ObjectRef`]s: the collector cannot see inside
/// them, so a captured handle may outlive its object. Reach objects through
/// `this`, the arguments, or the context instead.
pub type NativeBehaviour = Rc<dyn Fn(&mut Context, Value, &[Value]) -> VmResult<Value>>;

/// The `[[Call]]` slot of a function object
pub struct NativeFunction {
    name: JsString,
    behaviour: NativeBehaviour,
}

impl NativeFunction {
    /// Wrap a behaviour
    pub fn new(name: JsString, behaviour: NativeBehaviour) -> Self {
        Self { name, behaviour }
    }

    /// Name the function was created with
    pub fn name(&self) -> &JsString {
        &self.name
    }

    /// The behaviour invoked by [`Context::call`]
    pub fn behaviour(&self) -> &NativeBehaviour {
        &self.behaviour
    }

    /// Allocate a function object inheriting from `%Function.prototype%`.
    ///
    /// Defines `length` and `name` as non-writable, non-enumerable,
    /// configurable own properties, in that order.
    pub fn create(
        ctx: &mut Context,
        name: &str,
        length: u32,
        behaviour: impl Fn(&mut Context, Value, &[Value]) -> VmResult<Value> + 'static,
    ) -> ObjectRef {
        Self::create_from_behaviour(ctx, name, length, Rc::new(behaviour))
    }

    /// [`NativeFunction::create`] for an already shared behaviour
    pub fn create_from_behaviour(
        ctx: &mut Context,
        name: &str,
        length: u32,
        behaviour: NativeBehaviour,
    ) -> ObjectRef {
        let prototype = ctx.intrinsics().function_prototype();
        let name = ctx.intern(name);
        let function = Object::create_exotic(
            ctx,
            Some(prototype),
            ObjectKind::Function(NativeFunction::new(name.clone(), behaviour)),
            &ORDINARY_INTERNAL_METHODS,
            ObjectFlags::empty(),
        );
        define_length_and_name(ctx, function, length, name);
        function
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

pub(crate) fn define_length_and_name(
    ctx: &mut Context,
    function: ObjectRef,
    length: u32,
    name: JsString,
) {
    let length_key = ctx.key("length");
    function.define_direct_property(
        ctx,
        &length_key,
        Value::Number(length as f64),
        PropertyAttributes::CONFIGURABLE,
    );
    let name_key = ctx.key("name");
    function.define_direct_property(
        ctx,
        &name_key,
        Value::String(name),
        PropertyAttributes::CONFIGURABLE,
    );
}
