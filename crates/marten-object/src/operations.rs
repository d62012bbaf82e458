//! ## [7.3 Operations on Objects](https://tc39.es/ecma262/#sec-operations-on-objects)
//!
//! Abstract operations layered on the internal methods, plus the
//! non-standard construction helpers used when building builtins.

use crate::cache::PropertyLookupPhase;
use crate::context::Context;
use crate::error::{VmError, VmResult};
use crate::function::{NativeBehaviour, NativeFunction};
use crate::object::{IntrinsicAccessor, Object, ObjectRef};
use crate::property::{
    Accessor, PropertyAttributes, PropertyDescriptor, PropertyValue, ValueAndAttributes,
};
use crate::property_key::PropertyKey;
use crate::value::Value;
use rustc_hash::FxHashSet;
use std::ops::ControlFlow;

/// Whether a failed operation throws or reports `false`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShouldThrowExceptions {
    /// Report failure silently (sloppy mode)
    No,
    /// Throw a `TypeError` (strict mode)
    Yes,
}

/// Target of [`ObjectRef::set_integrity_level`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntegrityLevel {
    /// No additions, removals or reconfiguration
    Sealed,
    /// Sealed, and data properties are read-only
    Frozen,
}

/// What [`ObjectRef::enumerable_own_property_names`] produces per property
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PropertyKind {
    /// Keys only
    Key,
    /// Values only
    Value,
    /// `[key, value]` pairs
    KeyAndValue,
}

/// One entry produced by [`ObjectRef::enumerable_own_property_names`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OwnPropertyEntry {
    /// Property key as a string value
    Key(Value),
    /// Property value
    Value(Value),
    /// Key and value
    KeyAndValue(Value, Value),
}

impl ObjectRef {
    /// ### [7.3.2 Get ( O, P )](https://tc39.es/ecma262/#sec-get-o-p)
    pub fn get(self, ctx: &mut Context, key: &PropertyKey) -> VmResult<Value> {
        // 1. Return ? O.[[Get]](P, O).
        self.internal_get(
            ctx,
            key,
            Value::Object(self),
            None,
            PropertyLookupPhase::OwnProperty,
        )
    }

    /// ### [7.3.4 Set ( O, P, V, Throw )](https://tc39.es/ecma262/#sec-set-o-p-v-throw)
    pub fn set(
        self,
        ctx: &mut Context,
        key: &PropertyKey,
        value: Value,
        throw_exceptions: ShouldThrowExceptions,
    ) -> VmResult<()> {
        // 1. Let success be ? O.[[Set]](P, V, O).
        let success = self.internal_set(
            ctx,
            key,
            value,
            Value::Object(self),
            None,
            PropertyLookupPhase::OwnProperty,
        )?;

        // 2. If success is false and Throw is true, throw a TypeError exception.
        if !success && throw_exceptions == ShouldThrowExceptions::Yes {
            return Err(VmError::type_error(format!(
                "Cannot assign to read only property '{key}' of object"
            )));
        }

        // 3. Return unused.
        Ok(())
    }

    /// ### [7.3.5 CreateDataProperty ( O, P, V )](https://tc39.es/ecma262/#sec-createdataproperty)
    pub fn create_data_property(
        self,
        ctx: &mut Context,
        key: &PropertyKey,
        value: Value,
    ) -> VmResult<bool> {
        // 1. Let newDesc be the PropertyDescriptor { [[Value]]: V, [[Writable]]: true,
        //    [[Enumerable]]: true, [[Configurable]]: true }.
        let new_descriptor = PropertyDescriptor::data(value, PropertyAttributes::default());

        // 2. Return ? O.[[DefineOwnProperty]](P, newDesc).
        self.internal_define_own_property(ctx, key, new_descriptor, None)
    }

    /// ### [7.3.6 CreateDataPropertyOrThrow ( O, P, V )](https://tc39.es/ecma262/#sec-createdatapropertyorthrow)
    pub fn create_data_property_or_throw(
        self,
        ctx: &mut Context,
        key: &PropertyKey,
        value: Value,
    ) -> VmResult<()> {
        // 1. Let success be ? CreateDataProperty(O, P, V).
        // 2. If success is false, throw a TypeError exception.
        if !self.create_data_property(ctx, key, value)? {
            return Err(VmError::type_error(format!(
                "Cannot define property '{key}', object is not extensible or the property is non-configurable"
            )));
        }
        Ok(())
    }

    /// ### [7.3.8 CreateMethodProperty ( O, P, V )](https://tc39.es/ecma262/#sec-createmethodproperty)
    pub fn create_method_property(
        self,
        ctx: &mut Context,
        key: &PropertyKey,
        value: Value,
    ) -> VmResult<()> {
        // 1. Assert: O is an ordinary, extensible object with no non-configurable properties.
        // 2. Let newDesc be the PropertyDescriptor { [[Value]]: V, [[Writable]]: true,
        //    [[Enumerable]]: false, [[Configurable]]: true }.
        let new_descriptor = PropertyDescriptor::data(
            value,
            PropertyAttributes::WRITABLE | PropertyAttributes::CONFIGURABLE,
        );

        // 3. Perform ! DefinePropertyOrThrow(O, P, newDesc).
        self.define_property_or_throw(ctx, key, new_descriptor)
    }

    /// ### [7.3.7 CreateNonEnumerableDataPropertyOrThrow ( O, P, V )](https://tc39.es/ecma262/#sec-createnonenumerabledatapropertyorthrow)
    pub fn create_non_enumerable_data_property_or_throw(
        self,
        ctx: &mut Context,
        key: &PropertyKey,
        value: Value,
    ) -> VmResult<()> {
        // 2. Let newDesc be the PropertyDescriptor { [[Value]]: V, [[Writable]]: true,
        //    [[Enumerable]]: false, [[Configurable]]: true }.
        let new_descriptor = PropertyDescriptor::data(
            value,
            PropertyAttributes::WRITABLE | PropertyAttributes::CONFIGURABLE,
        );

        // 3. Perform ! DefinePropertyOrThrow(O, P, newDesc).
        self.define_property_or_throw(ctx, key, new_descriptor)
    }

    /// ### [7.3.9 DefinePropertyOrThrow ( O, P, desc )](https://tc39.es/ecma262/#sec-definepropertyorthrow)
    pub fn define_property_or_throw(
        self,
        ctx: &mut Context,
        key: &PropertyKey,
        descriptor: PropertyDescriptor,
    ) -> VmResult<()> {
        // 1. Let success be ? O.[[DefineOwnProperty]](P, desc).
        // 2. If success is false, throw a TypeError exception.
        if !self.internal_define_own_property(ctx, key, descriptor, None)? {
            return Err(VmError::type_error(format!("Cannot redefine property: {key}")));
        }
        Ok(())
    }

    /// ### [7.3.10 DeletePropertyOrThrow ( O, P )](https://tc39.es/ecma262/#sec-deletepropertyorthrow)
    pub fn delete_property_or_throw(self, ctx: &mut Context, key: &PropertyKey) -> VmResult<()> {
        // 1. Let success be ? O.[[Delete]](P).
        // 2. If success is false, throw a TypeError exception.
        if !self.internal_delete(ctx, key)? {
            return Err(VmError::type_error(format!("Cannot delete property '{key}'")));
        }
        Ok(())
    }

    /// ### [7.3.12 HasProperty ( O, P )](https://tc39.es/ecma262/#sec-hasproperty)
    pub fn has_property(self, ctx: &mut Context, key: &PropertyKey) -> VmResult<bool> {
        // 1. Return ? O.[[HasProperty]](P).
        self.internal_has_property(ctx, key)
    }

    /// ### [7.3.13 HasOwnProperty ( O, P )](https://tc39.es/ecma262/#sec-hasownproperty)
    pub fn has_own_property(self, ctx: &mut Context, key: &PropertyKey) -> VmResult<bool> {
        // 1. Let desc be ? O.[[GetOwnProperty]](P).
        // 2. If desc is undefined, return false.
        // 3. Return true.
        Ok(self.internal_get_own_property(ctx, key)?.is_some())
    }

    /// ### [7.2.5 IsExtensible ( O )](https://tc39.es/ecma262/#sec-isextensible-o)
    pub fn is_extensible(self, ctx: &mut Context) -> VmResult<bool> {
        // 1. Return ? O.[[IsExtensible]]().
        self.internal_is_extensible(ctx)
    }

    /// ### [7.3.15 SetIntegrityLevel ( O, level )](https://tc39.es/ecma262/#sec-setintegritylevel)
    pub fn set_integrity_level(self, ctx: &mut Context, level: IntegrityLevel) -> VmResult<bool> {
        // 3. Let status be ? O.[[PreventExtensions]]().
        // 4. If status is false, return false.
        if !self.internal_prevent_extensions(ctx)? {
            return Ok(false);
        }

        // 5. Let keys be ? O.[[OwnPropertyKeys]]().
        let keys = self.internal_own_property_keys(ctx)?;

        match level {
            // 6. If level is sealed, then
            //    a. For each element k of keys, do
            //       i. Perform ? DefinePropertyOrThrow(O, k, PropertyDescriptor { [[Configurable]]: false }).
            IntegrityLevel::Sealed => {
                for key in &keys {
                    self.define_property_or_throw(
                        ctx,
                        key,
                        PropertyDescriptor {
                            configurable: Some(false),
                            ..Default::default()
                        },
                    )?;
                }
            }
            // 7. Else,
            //    a. Assert: level is frozen.
            //    b. For each element k of keys, do
            IntegrityLevel::Frozen => {
                for key in &keys {
                    // i. Let currentDesc be ? O.[[GetOwnProperty]](k).
                    // ii. If currentDesc is not undefined, then
                    let Some(current) = self.internal_get_own_property(ctx, key)? else {
                        continue;
                    };
                    // 1. If IsAccessorDescriptor(currentDesc) is true, then
                    //    a. Let desc be the PropertyDescriptor { [[Configurable]]: false }.
                    // 2. Else,
                    //    a. Let desc be the PropertyDescriptor { [[Configurable]]: false, [[Writable]]: false }.
                    let descriptor = PropertyDescriptor {
                        configurable: Some(false),
                        writable: (!current.is_accessor()).then_some(false),
                        ..Default::default()
                    };
                    // 3. Perform ? DefinePropertyOrThrow(O, k, desc).
                    self.define_property_or_throw(ctx, key, descriptor)?;
                }
            }
        }

        // 8. Return true.
        Ok(true)
    }

    /// ### [7.3.16 TestIntegrityLevel ( O, level )](https://tc39.es/ecma262/#sec-testintegritylevel)
    pub fn test_integrity_level(self, ctx: &mut Context, level: IntegrityLevel) -> VmResult<bool> {
        // 1. Let extensible be ? IsExtensible(O).
        // 2. If extensible is true, return false.
        if self.is_extensible(ctx)? {
            return Ok(false);
        }

        // 3. NOTE: If the object is extensible, none of its properties are examined.
        // 4. Let keys be ? O.[[OwnPropertyKeys]]().
        let keys = self.internal_own_property_keys(ctx)?;

        // 5. For each element k of keys, do
        for key in &keys {
            // a. Let currentDesc be ? O.[[GetOwnProperty]](k).
            // b. If currentDesc is not undefined, then
            let Some(current) = self.internal_get_own_property(ctx, key)? else {
                continue;
            };
            // i. If currentDesc.[[Configurable]] is true, return false.
            if current.configurable == Some(true) {
                return Ok(false);
            }
            // ii. If level is frozen and IsDataDescriptor(currentDesc) is true, then
            //     1. If currentDesc.[[Writable]] is true, return false.
            if level == IntegrityLevel::Frozen
                && current.is_data()
                && current.writable == Some(true)
            {
                return Ok(false);
            }
        }

        // 6. Return true.
        Ok(true)
    }

    /// ### [7.3.23 EnumerableOwnProperties ( O, kind )](https://tc39.es/ecma262/#sec-enumerableownproperties)
    ///
    /// Symbol keys are skipped.
    pub fn enumerable_own_property_names(
        self,
        ctx: &mut Context,
        kind: PropertyKind,
    ) -> VmResult<Vec<OwnPropertyEntry>> {
        // 1. Let ownKeys be ? O.[[OwnPropertyKeys]]().
        let own_keys = self.internal_own_property_keys(ctx)?;

        // 2. Let results be a new empty List.
        let mut results = Vec::with_capacity(own_keys.len());

        // 3. For each element key of ownKeys, do
        //    a. If key is a String, then
        for key in own_keys.iter().filter(|key| !key.is_symbol()) {
            // i. Let desc be ? O.[[GetOwnProperty]](key).
            // ii. If desc is not undefined and desc.[[Enumerable]] is true, then
            let Some(descriptor) = self.internal_get_own_property(ctx, key)? else {
                continue;
            };
            if descriptor.enumerable != Some(true) {
                continue;
            }

            // 1. If kind is key, append key to results.
            if kind == PropertyKind::Key {
                results.push(OwnPropertyEntry::Key(key.to_value()));
                continue;
            }

            // 2. Else,
            //    a. Let value be ? Get(O, key).
            let value = self.get(ctx, key)?;
            //    b. If kind is value, append value to results.
            //    c. Else, append CreateArrayFromList(« key, value ») to results.
            results.push(match kind {
                PropertyKind::Value => OwnPropertyEntry::Value(value),
                _ => OwnPropertyEntry::KeyAndValue(key.to_value(), value),
            });
        }

        // 4. Return results.
        Ok(results)
    }

    /// ### [7.3.25 CopyDataProperties ( target, source, excludedItems )](https://tc39.es/ecma262/#sec-copydataproperties)
    ///
    /// Copies onto `self`. Keys in `excluded_keys` are skipped, as are
    /// properties whose value (after `[[Get]]`) is in `excluded_values`.
    pub fn copy_data_properties(
        self,
        ctx: &mut Context,
        source: &Value,
        excluded_keys: &FxHashSet<PropertyKey>,
        excluded_values: &FxHashSet<Value>,
    ) -> VmResult<()> {
        // 1. If source is either undefined or null, return unused.
        // 2. Let from be ! ToObject(source).
        //    Primitive wrappers carry no own data properties here.
        let Some(from) = source.as_object() else {
            return Ok(());
        };

        // 3. Let keys be ? from.[[OwnPropertyKeys]]().
        let keys = from.internal_own_property_keys(ctx)?;

        // 4. For each element nextKey of keys, do
        for next_key in keys {
            // a. Let excluded be false.
            // b. For each element e of excludedItems, do
            //    i. If SameValue(e, nextKey) is true, set excluded to true.
            if excluded_keys.contains(&next_key) {
                continue;
            }

            // c. If excluded is false, then
            //    i. Let desc be ? from.[[GetOwnProperty]](nextKey).
            //    ii. If desc is not undefined and desc.[[Enumerable]] is true, then
            let Some(descriptor) = from.internal_get_own_property(ctx, &next_key)? else {
                continue;
            };
            if descriptor.enumerable != Some(true) {
                continue;
            }

            // 1. Let propValue be ? Get(from, nextKey).
            let value = from.get(ctx, &next_key)?;
            if excluded_values.contains(&value) {
                continue;
            }

            // 2. Perform ! CreateDataPropertyOrThrow(target, nextKey, propValue).
            self.create_data_property_or_throw(ctx, &next_key, value)?;
        }

        // 5. Return unused.
        Ok(())
    }

    /// New object with `prototype` holding a copy of the enumerable own data
    /// of `self`, minus the excluded keys and values
    pub fn snapshot_own_properties(
        self,
        ctx: &mut Context,
        prototype: Option<ObjectRef>,
        excluded_keys: &FxHashSet<PropertyKey>,
        excluded_values: &FxHashSet<Value>,
    ) -> VmResult<ObjectRef> {
        let copy = Object::create(ctx, prototype);
        copy.copy_data_properties(ctx, &Value::Object(self), excluded_keys, excluded_values)?;
        Ok(copy)
    }

    /// ### [20.1.2.3.1 ObjectDefineProperties ( O, Properties )](https://tc39.es/ecma262/#sec-objectdefineproperties)
    pub fn define_properties(self, ctx: &mut Context, properties: &Value) -> VmResult<ObjectRef> {
        // 1. Let props be ? ToObject(Properties).
        let props = match properties {
            Value::Object(props) => *props,
            Value::Undefined | Value::Null => {
                return Err(VmError::type_error(format!(
                    "Cannot convert {} to object",
                    properties.type_name()
                )));
            }
            _ => return Ok(self),
        };

        // 2. Let keys be ? props.[[OwnPropertyKeys]]().
        let keys = props.internal_own_property_keys(ctx)?;

        // 3. Let descriptors be a new empty List.
        let mut descriptors = Vec::with_capacity(keys.len());

        // 4. For each element nextKey of keys, do
        for next_key in keys {
            // a. Let propDesc be ? props.[[GetOwnProperty]](nextKey).
            // b. If propDesc is not undefined and propDesc.[[Enumerable]] is true, then
            let Some(prop_descriptor) = props.internal_get_own_property(ctx, &next_key)? else {
                continue;
            };
            if prop_descriptor.enumerable != Some(true) {
                continue;
            }
            // i. Let descObj be ? Get(props, nextKey).
            let descriptor_object = props.get(ctx, &next_key)?;
            // ii. Let desc be ? ToPropertyDescriptor(descObj).
            let descriptor = to_property_descriptor(ctx, &descriptor_object)?;
            // iii. Append the Record { [[Key]]: nextKey, [[Descriptor]]: desc } to descriptors.
            descriptors.push((next_key, descriptor));
        }

        // 5. For each element property of descriptors, do
        //    a. Perform ? DefinePropertyOrThrow(O, property.[[Key]], property.[[Descriptor]]).
        for (key, descriptor) in descriptors {
            self.define_property_or_throw(ctx, &key, descriptor)?;
        }

        // 6. Return O.
        Ok(self)
    }

    /// ### [14.7.5.9 EnumerateObjectProperties ( O )](https://tc39.es/ecma262/#sec-enumerate-object-properties)
    ///
    /// Calls `callback` for every enumerable string key of `self` and its
    /// prototypes. A key is reported at most once; a key shadowed by a closer
    /// property (enumerable or not) is skipped. Returning
    /// [`ControlFlow::Break`] stops the walk.
    pub fn enumerate_object_properties(
        self,
        ctx: &mut Context,
        mut callback: impl FnMut(&mut Context, PropertyKey) -> VmResult<ControlFlow<()>>,
    ) -> VmResult<()> {
        let mut visited = FxHashSet::default();
        let mut target = Some(self);
        let mut hops = 0;

        while let Some(object) = target {
            for key in object.internal_own_property_keys(ctx)? {
                if key.is_symbol() {
                    continue;
                }
                // Deleted during the walk
                let Some(descriptor) = object.internal_get_own_property(ctx, &key)? else {
                    continue;
                };
                if !visited.insert(key.clone()) {
                    continue;
                }
                if descriptor.enumerable != Some(true) {
                    continue;
                }
                if callback(ctx, key)?.is_break() {
                    return Ok(());
                }
            }

            hops += 1;
            if hops > ctx.config().max_prototype_chain_depth {
                tracing::warn!(
                    target: "marten::object",
                    hops,
                    "stopping property enumeration: prototype chain exceeds depth limit"
                );
                return Ok(());
            }
            target = object.internal_get_prototype_of(ctx)?;
        }

        Ok(())
    }

    /// Look `key` up along the prototype chain without calling getters or
    /// any overridden internal method.
    ///
    /// Accessor properties are returned as the accessor pair. Integer keys
    /// stop at a typed-array-like object, whose elements are not in storage.
    pub fn get_without_side_effects(
        self,
        ctx: &mut Context,
        key: &PropertyKey,
    ) -> Option<PropertyValue> {
        let mut object = self;
        for _ in 0..=ctx.config().max_prototype_chain_depth {
            if key.is_index() && ctx.object(object).is_typed_array_like() {
                return None;
            }
            if let Some(stored) = object.storage_get(ctx, key) {
                return Some(stored.value);
            }
            object = ctx.object(object).prototype()?;
        }
        None
    }

    /// Add or overwrite a data property without validation
    pub fn define_direct_property(
        self,
        ctx: &mut Context,
        key: &PropertyKey,
        value: Value,
        attributes: PropertyAttributes,
    ) {
        self.storage_set(ctx, key, ValueAndAttributes::data(value, attributes));
    }

    /// Add or overwrite an accessor property without validation.
    ///
    /// A `None` half keeps the existing getter or setter, so a getter and a
    /// setter can be installed by two separate calls.
    pub fn define_direct_accessor(
        self,
        ctx: &mut Context,
        key: &PropertyKey,
        getter: Option<ObjectRef>,
        setter: Option<ObjectRef>,
        attributes: PropertyAttributes,
    ) {
        let accessor = match self.storage_get(ctx, key) {
            Some(ValueAndAttributes {
                value: PropertyValue::Accessor(existing),
                ..
            }) => Accessor {
                getter: getter.or(existing.getter),
                setter: setter.or(existing.setter),
            },
            _ => Accessor { getter, setter },
        };
        self.storage_set(ctx, key, ValueAndAttributes::accessor(accessor, attributes));
    }

    /// Add a named data property whose value is computed by `accessor` on
    /// first access.
    ///
    /// # Panics
    ///
    /// If `key` is an array index.
    pub fn define_intrinsic_accessor(
        self,
        ctx: &mut Context,
        key: PropertyKey,
        attributes: PropertyAttributes,
        accessor: IntrinsicAccessor,
    ) {
        assert!(
            !key.is_index(),
            "intrinsic accessors are only supported for named properties"
        );
        self.storage_set(ctx, &key, ValueAndAttributes::data(Value::Undefined, attributes));
        self.set_intrinsic_accessor(ctx, key, accessor);
    }

    /// Create a native function named after `key` and install it
    pub fn define_native_function(
        self,
        ctx: &mut Context,
        key: &PropertyKey,
        length: u32,
        attributes: PropertyAttributes,
        behaviour: impl Fn(&mut Context, Value, &[Value]) -> VmResult<Value> + 'static,
    ) -> ObjectRef {
        let function = NativeFunction::create(ctx, &key.function_name(), length, behaviour);
        self.define_direct_property(ctx, key, Value::Object(function), attributes);
        function
    }

    /// Create native getter/setter functions (`get x`, `set x`) and install
    /// them as an accessor property
    pub fn define_native_accessor(
        self,
        ctx: &mut Context,
        key: &PropertyKey,
        getter: Option<NativeBehaviour>,
        setter: Option<NativeBehaviour>,
        attributes: PropertyAttributes,
    ) {
        let name = key.function_name();
        let getter = getter.map(|behaviour| {
            NativeFunction::create_from_behaviour(ctx, &format!("get {name}"), 0, behaviour)
        });
        let setter = setter.map(|behaviour| {
            NativeFunction::create_from_behaviour(ctx, &format!("set {name}"), 1, behaviour)
        });
        self.define_direct_accessor(ctx, key, getter, setter, attributes);
    }
}

/// ### [6.2.6.5 ToPropertyDescriptor ( Obj )](https://tc39.es/ecma262/#sec-topropertydescriptor)
pub fn to_property_descriptor(ctx: &mut Context, value: &Value) -> VmResult<PropertyDescriptor> {
    // 1. If Obj is not an Object, throw a TypeError exception.
    let Some(object) = value.as_object() else {
        return Err(VmError::type_error(format!(
            "Property description must be an object: {}",
            value.type_name()
        )));
    };

    // 2. Let desc be a new Property Descriptor that initially has no fields.
    let mut descriptor = PropertyDescriptor::default();

    // 3-4. enumerable
    let key = ctx.key("enumerable");
    if object.has_property(ctx, &key)? {
        descriptor.enumerable = Some(object.get(ctx, &key)?.to_boolean());
    }

    // 5-6. configurable
    let key = ctx.key("configurable");
    if object.has_property(ctx, &key)? {
        descriptor.configurable = Some(object.get(ctx, &key)?.to_boolean());
    }

    // 7-8. value
    let key = ctx.key("value");
    if object.has_property(ctx, &key)? {
        descriptor.value = Some(object.get(ctx, &key)?);
    }

    // 9-10. writable
    let key = ctx.key("writable");
    if object.has_property(ctx, &key)? {
        descriptor.writable = Some(object.get(ctx, &key)?.to_boolean());
    }

    // 11-12. get
    let key = ctx.key("get");
    if object.has_property(ctx, &key)? {
        let getter = object.get(ctx, &key)?;
        // b. If IsCallable(getter) is false and getter is not undefined, throw a TypeError exception.
        if !getter.is_undefined() && !ctx.is_callable(&getter) {
            return Err(VmError::type_error(format!(
                "Getter must be a function: {}",
                getter.type_name()
            )));
        }
        descriptor.get = Some(getter.as_object());
    }

    // 13-14. set
    let key = ctx.key("set");
    if object.has_property(ctx, &key)? {
        let setter = object.get(ctx, &key)?;
        // b. If IsCallable(setter) is false and setter is not undefined, throw a TypeError exception.
        if !setter.is_undefined() && !ctx.is_callable(&setter) {
            return Err(VmError::type_error(format!(
                "Setter must be a function: {}",
                setter.type_name()
            )));
        }
        descriptor.set = Some(setter.as_object());
    }

    // 15. If desc has a [[Get]] field or desc has a [[Set]] field, then
    //     a. If desc has a [[Value]] field or desc has a [[Writable]] field,
    //        throw a TypeError exception.
    if descriptor.is_accessor() && descriptor.is_data() {
        return Err(VmError::type_error(
            "Invalid property descriptor. Cannot both specify accessors and a value or writable attribute",
        ));
    }

    // 16. Return desc.
    Ok(descriptor)
}

/// ### [6.2.6.4 FromPropertyDescriptor ( Desc )](https://tc39.es/ecma262/#sec-frompropertydescriptor)
pub fn from_property_descriptor(
    ctx: &mut Context,
    descriptor: Option<&PropertyDescriptor>,
) -> VmResult<Value> {
    // 1. If Desc is undefined, return undefined.
    let Some(descriptor) = descriptor else {
        return Ok(Value::Undefined);
    };

    // 2. Let obj be OrdinaryObjectCreate(%Object.prototype%).
    let object = Object::create_with_default_prototype(ctx);

    // 4-9. Create a data property for each present field, in order.
    let fields = [
        ("value", descriptor.value.clone()),
        ("writable", descriptor.writable.map(Value::Boolean)),
        ("get", descriptor.get.map(Value::from)),
        ("set", descriptor.set.map(Value::from)),
        ("enumerable", descriptor.enumerable.map(Value::Boolean)),
        ("configurable", descriptor.configurable.map(Value::Boolean)),
    ];
    for (name, value) in fields {
        if let Some(value) = value {
            let key = ctx.key(name);
            object.create_data_property_or_throw(ctx, &key, value)?;
        }
    }

    // 10. Return obj.
    Ok(Value::Object(object))
}
