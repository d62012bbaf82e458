//! ## [10.1 Ordinary Object Internal Methods and Internal Slots](https://tc39.es/ecma262/#sec-ordinary-object-internal-methods-and-internal-slots)

use crate::cache::{CacheableKind, CacheablePropertyMetadata, PropertyLookupPhase};
use crate::context::Context;
use crate::error::VmResult;
use crate::internal_methods::GetPrototypeOf;
use crate::object::ObjectRef;
use crate::property::{PropertyAttributes, PropertyDescriptor, ValueAndAttributes};
use crate::property_key::PropertyKey;
use crate::value::Value;

/// ### [10.1.1.1 OrdinaryGetPrototypeOf ( O )](https://tc39.es/ecma262/#sec-ordinarygetprototypeof)
pub fn ordinary_get_prototype_of(
    ctx: &mut Context,
    object: ObjectRef,
) -> VmResult<Option<ObjectRef>> {
    // 1. Return O.[[Prototype]].
    Ok(ctx.object(object).prototype())
}

/// ### [10.1.2.1 OrdinarySetPrototypeOf ( O, V )](https://tc39.es/ecma262/#sec-ordinarysetprototypeof)
pub fn ordinary_set_prototype_of(
    ctx: &mut Context,
    object: ObjectRef,
    prototype: Option<ObjectRef>,
) -> VmResult<bool> {
    // 1. Let current be O.[[Prototype]].
    let current = ctx.object(object).prototype();

    // 2. If SameValue(V, current) is true, return true.
    if prototype == current {
        return Ok(true);
    }

    // 3. Let extensible be O.[[Extensible]].
    // 4. If extensible is false, return false.
    if !ctx.object(object).extensible {
        return Ok(false);
    }

    // 5. Let p be V.
    let mut p = prototype;
    let mut hops = 0;
    // 6. Let done be false.
    // 7. Repeat, while done is false,
    //    a. If p is null, set done to true.
    while let Some(p_inner) = p {
        // b. Else if SameValue(p, O) is true, return false.
        if p_inner == object {
            return Ok(false);
        }
        // c. i. If p.[[GetPrototypeOf]] is not the ordinary object internal
        //       method defined in 10.1.1, set done to true.
        let get_prototype_of = ctx.object(p_inner).methods.get_prototype_of;
        if !std::ptr::fn_addr_eq(
            get_prototype_of,
            ordinary_get_prototype_of as GetPrototypeOf,
        ) {
            break;
        }
        // A pre-existing cycle that does not pass through O.
        hops += 1;
        if hops > ctx.config().max_prototype_chain_depth {
            tracing::warn!(
                target: "marten::object",
                hops,
                "refusing prototype change: existing chain exceeds depth limit"
            );
            return Ok(false);
        }
        //    ii. Else, set p to p.[[Prototype]].
        p = ctx.object(p_inner).prototype();
    }

    // 8. Set O.[[Prototype]] to V.
    object.set_prototype(ctx, prototype);

    // 9. Return true.
    Ok(true)
}

/// ### [10.1.3.1 OrdinaryIsExtensible ( O )](https://tc39.es/ecma262/#sec-ordinaryisextensible)
pub fn ordinary_is_extensible(ctx: &mut Context, object: ObjectRef) -> VmResult<bool> {
    // 1. Return O.[[Extensible]].
    Ok(ctx.object(object).extensible)
}

/// ### [10.1.4.1 OrdinaryPreventExtensions ( O )](https://tc39.es/ecma262/#sec-ordinarypreventextensions)
pub fn ordinary_prevent_extensions(ctx: &mut Context, object: ObjectRef) -> VmResult<bool> {
    // 1. Set O.[[Extensible]] to false.
    ctx.object_mut(object).extensible = false;

    // 2. Return true.
    Ok(true)
}

/// ### [10.1.5.1 OrdinaryGetOwnProperty ( O, P )](https://tc39.es/ecma262/#sec-ordinarygetownproperty)
pub fn ordinary_get_own_property(
    ctx: &mut Context,
    object: ObjectRef,
    key: &PropertyKey,
) -> VmResult<Option<PropertyDescriptor>> {
    // 1. If O does not have an own property with key P, return undefined.
    // 2-9. Build the descriptor from the stored value and attributes.
    Ok(object
        .storage_get(ctx, key)
        .map(|stored| PropertyDescriptor::from(&stored)))
}

/// ### [10.1.6.1 OrdinaryDefineOwnProperty ( O, P, Desc )](https://tc39.es/ecma262/#sec-ordinarydefineownproperty)
pub fn ordinary_define_own_property(
    ctx: &mut Context,
    object: ObjectRef,
    key: &PropertyKey,
    descriptor: PropertyDescriptor,
    precomputed_own_property: Option<Option<PropertyDescriptor>>,
) -> VmResult<bool> {
    // 1. Let current be ? O.[[GetOwnProperty]](P).
    let current = match precomputed_own_property {
        Some(current) => current,
        None => object.internal_get_own_property(ctx, key)?,
    };

    // 2. Let extensible be ? IsExtensible(O).
    let extensible = object.internal_is_extensible(ctx)?;

    // 3. Return ValidateAndApplyPropertyDescriptor(O, P, extensible, Desc, current).
    Ok(validate_and_apply_property_descriptor(
        ctx,
        Some(object),
        key,
        extensible,
        descriptor,
        current,
    ))
}

/// ### [10.1.6.2 IsCompatiblePropertyDescriptor ( Extensible, Desc, Current )](https://tc39.es/ecma262/#sec-iscompatiblepropertydescriptor)
pub fn is_compatible_property_descriptor(
    extensible: bool,
    descriptor: &PropertyDescriptor,
    current: Option<&PropertyDescriptor>,
) -> bool {
    validate_property_descriptor(extensible, descriptor, current)
}

/// Validation half of ValidateAndApplyPropertyDescriptor: steps 1-6
fn validate_property_descriptor(
    extensible: bool,
    descriptor: &PropertyDescriptor,
    current: Option<&PropertyDescriptor>,
) -> bool {
    // 2. If current is undefined, then
    //    a. If extensible is false, return false.
    let Some(current) = current else {
        return extensible;
    };

    // 4. If Desc does not have any fields, return true.
    if !descriptor.has_fields() {
        return true;
    }

    // 5. If current.[[Configurable]] is false, then
    if current.configurable == Some(false) {
        // a. If Desc has a [[Configurable]] field and Desc.[[Configurable]]
        //    is true, return false.
        if descriptor.configurable == Some(true) {
            return false;
        }
        // b. If Desc has an [[Enumerable]] field and
        //    SameValue(Desc.[[Enumerable]], current.[[Enumerable]]) is false,
        //    return false.
        if descriptor
            .enumerable
            .is_some_and(|enumerable| Some(enumerable) != current.enumerable)
        {
            return false;
        }
        // c. If IsGenericDescriptor(Desc) is false and
        //    SameValue(IsAccessorDescriptor(Desc), IsAccessorDescriptor(current))
        //    is false, return false.
        if !descriptor.is_generic() && descriptor.is_accessor() != current.is_accessor() {
            return false;
        }
        // d. If IsAccessorDescriptor(current) is true, then
        if current.is_accessor() {
            // i. If Desc has a [[Get]] field and SameValue(Desc.[[Get]],
            //    current.[[Get]]) is false, return false.
            if descriptor.get.is_some() && descriptor.get != current.get {
                return false;
            }
            // ii. If Desc has a [[Set]] field and SameValue(Desc.[[Set]],
            //     current.[[Set]]) is false, return false.
            if descriptor.set.is_some() && descriptor.set != current.set {
                return false;
            }
        }
        // e. Else if current.[[Writable]] is false, then
        else if current.writable == Some(false) {
            // i. If Desc has a [[Writable]] field and Desc.[[Writable]] is
            //    true, return false.
            if descriptor.writable == Some(true) {
                return false;
            }
            // ii. If Desc has a [[Value]] field and SameValue(Desc.[[Value]],
            //     current.[[Value]]) is false, return false.
            if let Some(value) = &descriptor.value
                && current.value.as_ref() != Some(value)
            {
                return false;
            }
        }
    }

    true
}

/// ### [10.1.6.3 ValidateAndApplyPropertyDescriptor ( O, P, extensible, Desc, current )](https://tc39.es/ecma262/#sec-validateandapplypropertydescriptor)
pub fn validate_and_apply_property_descriptor(
    ctx: &mut Context,
    object: Option<ObjectRef>,
    key: &PropertyKey,
    extensible: bool,
    descriptor: PropertyDescriptor,
    current: Option<PropertyDescriptor>,
) -> bool {
    // 1-5. Validate; reject without touching O.
    if !validate_property_descriptor(extensible, &descriptor, current.as_ref()) {
        return false;
    }

    // 1. Assert: P is a property key.
    let Some(object) = object else {
        return true;
    };

    let Some(current) = current else {
        // 2. c. If IsAccessorDescriptor(Desc) is true, create an own accessor
        //       property, else an own data property, with absent fields set to
        //       their default values.
        object.storage_set(ctx, key, ValueAndAttributes::from_descriptor(&descriptor));
        // d. Return true.
        return true;
    };

    // 4. If Desc does not have any fields, return true.
    if !descriptor.has_fields() {
        return true;
    }

    // 6. If O is not undefined, then
    let updated = if current.is_data() && descriptor.is_accessor() {
        // a. If IsDataDescriptor(current) is true and
        //    IsAccessorDescriptor(Desc) is true, then
        //    i-iii. Replace with an accessor property, keeping
        //           [[Configurable]] and [[Enumerable]] unless Desc has them.
        PropertyDescriptor {
            get: Some(descriptor.get.flatten()),
            set: Some(descriptor.set.flatten()),
            enumerable: descriptor.enumerable.or(current.enumerable),
            configurable: descriptor.configurable.or(current.configurable),
            ..Default::default()
        }
    } else if current.is_accessor() && descriptor.is_data() {
        // b. Else if IsAccessorDescriptor(current) is true and
        //    IsDataDescriptor(Desc) is true, then
        //    i-iii. Replace with a data property, keeping [[Configurable]] and
        //           [[Enumerable]] unless Desc has them.
        PropertyDescriptor {
            value: Some(descriptor.value.clone().unwrap_or_default()),
            writable: Some(descriptor.writable.unwrap_or(false)),
            enumerable: descriptor.enumerable.or(current.enumerable),
            configurable: descriptor.configurable.or(current.configurable),
            ..Default::default()
        }
    } else {
        // c. Else, for each field of Desc, set the corresponding attribute of
        //    the property to the value of the field.
        descriptor.merged_onto(&current)
    };
    object.storage_set(ctx, key, ValueAndAttributes::from_descriptor(&updated));

    // 7. Return true.
    true
}

/// ### [10.1.7.1 OrdinaryHasProperty ( O, P )](https://tc39.es/ecma262/#sec-ordinaryhasproperty)
pub fn ordinary_has_property(
    ctx: &mut Context,
    object: ObjectRef,
    key: &PropertyKey,
) -> VmResult<bool> {
    // 1. Let hasOwn be ? O.[[GetOwnProperty]](P).
    // 2. If hasOwn is not undefined, return true.
    if object.internal_get_own_property(ctx, key)?.is_some() {
        return Ok(true);
    }

    // 3. Let parent be ? O.[[GetPrototypeOf]]().
    // 4. If parent is not null, then
    //    a. Return ? parent.[[HasProperty]](P).
    // 5. Return false.
    let Some(parent) = object.internal_get_prototype_of(ctx)? else {
        return Ok(false);
    };
    Ok(ctx
        .with_prototype_hop(|ctx| parent.internal_has_property(ctx, key))?
        .unwrap_or(false))
}

/// Fill in `metadata` for a property found on `holder`
fn report_cacheable_property(
    ctx: &Context,
    holder: ObjectRef,
    key: &PropertyKey,
    descriptor: &PropertyDescriptor,
    metadata: Option<&mut CacheablePropertyMetadata>,
    phase: PropertyLookupPhase,
) {
    let Some(metadata) = metadata else {
        return;
    };
    // Accessors may behave differently on every call, and indexed elements
    // have no shape slot.
    let slot = descriptor
        .is_data()
        .then(|| holder.named_property_metadata(ctx, key))
        .flatten();
    *metadata = match slot {
        Some((shape, offset, _)) => CacheablePropertyMetadata {
            kind: match phase {
                PropertyLookupPhase::OwnProperty => CacheableKind::OwnProperty,
                PropertyLookupPhase::PrototypeChain => CacheableKind::InPrototypeChain,
            },
            property_offset: Some(offset),
            shape: Some(shape),
            prototype: match phase {
                PropertyLookupPhase::OwnProperty => None,
                PropertyLookupPhase::PrototypeChain => Some(holder),
            },
        },
        None => CacheablePropertyMetadata::default(),
    };
}

/// ### [10.1.8.1 OrdinaryGet ( O, P, Receiver )](https://tc39.es/ecma262/#sec-ordinaryget)
pub fn ordinary_get(
    ctx: &mut Context,
    object: ObjectRef,
    key: &PropertyKey,
    receiver: Value,
    cacheable_metadata: Option<&mut CacheablePropertyMetadata>,
    phase: PropertyLookupPhase,
) -> VmResult<Value> {
    // 1. Let desc be ? O.[[GetOwnProperty]](P).
    let Some(descriptor) = object.internal_get_own_property(ctx, key)? else {
        // 2. If desc is undefined, then
        //    a. Let parent be ? O.[[GetPrototypeOf]]().
        //    b. If parent is null, return undefined.
        let Some(parent) = object.internal_get_prototype_of(ctx)? else {
            return Ok(Value::Undefined);
        };
        //    c. Return ? parent.[[Get]](P, Receiver).
        return Ok(ctx
            .with_prototype_hop(|ctx| {
                parent.internal_get(
                    ctx,
                    key,
                    receiver,
                    cacheable_metadata,
                    PropertyLookupPhase::PrototypeChain,
                )
            })?
            .unwrap_or_default());
    };

    report_cacheable_property(ctx, object, key, &descriptor, cacheable_metadata, phase);

    // 3. If IsDataDescriptor(desc) is true, return desc.[[Value]].
    if descriptor.is_data() {
        return Ok(descriptor.value.unwrap_or_default());
    }

    // 4. Assert: IsAccessorDescriptor(desc) is true.
    // 5. Let getter be desc.[[Get]].
    // 6. If getter is undefined, return undefined.
    let Some(getter) = descriptor.get.flatten() else {
        return Ok(Value::Undefined);
    };

    // 7. Return ? Call(getter, Receiver).
    ctx.call(&Value::Object(getter), receiver, &[])
}

/// ### [10.1.9.1 OrdinarySet ( O, P, V, Receiver )](https://tc39.es/ecma262/#sec-ordinaryset)
pub fn ordinary_set(
    ctx: &mut Context,
    object: ObjectRef,
    key: &PropertyKey,
    value: Value,
    receiver: Value,
    cacheable_metadata: Option<&mut CacheablePropertyMetadata>,
    phase: PropertyLookupPhase,
) -> VmResult<bool> {
    // 1. Let ownDesc be ? O.[[GetOwnProperty]](P).
    let own_descriptor = object.internal_get_own_property(ctx, key)?;

    // 2. Return ? OrdinarySetWithOwnDescriptor(O, P, V, Receiver, ownDesc).
    ordinary_set_with_own_descriptor(
        ctx,
        object,
        key,
        value,
        receiver,
        own_descriptor,
        cacheable_metadata,
        phase,
    )
}

/// ### [10.1.9.2 OrdinarySetWithOwnDescriptor ( O, P, V, Receiver, ownDesc )](https://tc39.es/ecma262/#sec-ordinarysetwithowndescriptor)
#[allow(clippy::too_many_arguments)]
pub fn ordinary_set_with_own_descriptor(
    ctx: &mut Context,
    object: ObjectRef,
    key: &PropertyKey,
    value: Value,
    receiver: Value,
    own_descriptor: Option<PropertyDescriptor>,
    mut cacheable_metadata: Option<&mut CacheablePropertyMetadata>,
    phase: PropertyLookupPhase,
) -> VmResult<bool> {
    // 1. If ownDesc is undefined, then
    let own_descriptor = match own_descriptor {
        Some(own_descriptor) => own_descriptor,
        None => {
            // a. Let parent be ? O.[[GetPrototypeOf]]().
            // b. If parent is not null, then
            //    i. Return ? parent.[[Set]](P, V, Receiver).
            if let Some(parent) = object.internal_get_prototype_of(ctx)? {
                let forwarded = ctx.with_prototype_hop(|ctx| {
                    parent.internal_set(
                        ctx,
                        key,
                        value.clone(),
                        receiver.clone(),
                        cacheable_metadata.as_deref_mut(),
                        PropertyLookupPhase::PrototypeChain,
                    )
                })?;
                if let Some(result) = forwarded {
                    return Ok(result);
                }
            }
            // c. Else,
            //    i. Set ownDesc to the PropertyDescriptor { [[Value]]: undefined,
            //       [[Writable]]: true, [[Enumerable]]: true, [[Configurable]]: true }.
            PropertyDescriptor::data(Value::Undefined, PropertyAttributes::default())
        }
    };

    // 2. If IsDataDescriptor(ownDesc) is true, then
    if own_descriptor.is_data() {
        // a. If ownDesc.[[Writable]] is false, return false.
        if own_descriptor.writable == Some(false) {
            return Ok(false);
        }

        // b. If Receiver is not an Object, return false.
        let Value::Object(receiver) = receiver else {
            return Ok(false);
        };

        // c. Let existingDescriptor be ? Receiver.[[GetOwnProperty]](P).
        // d. If existingDescriptor is not undefined, then
        if let Some(existing_descriptor) = receiver.internal_get_own_property(ctx, key)? {
            // i. If IsAccessorDescriptor(existingDescriptor) is true, return false.
            if existing_descriptor.is_accessor() {
                return Ok(false);
            }

            // ii. If existingDescriptor.[[Writable]] is false, return false.
            if existing_descriptor.writable == Some(false) {
                return Ok(false);
            }

            if receiver == object && phase == PropertyLookupPhase::OwnProperty {
                report_cacheable_property(
                    ctx,
                    object,
                    key,
                    &existing_descriptor,
                    cacheable_metadata,
                    phase,
                );
            }

            // iii. Let valueDesc be the PropertyDescriptor { [[Value]]: V }.
            // iv. Return ? Receiver.[[DefineOwnProperty]](P, valueDesc).
            return receiver.internal_define_own_property(
                ctx,
                key,
                PropertyDescriptor::value_only(value),
                Some(Some(existing_descriptor)),
            );
        }

        // e. Else,
        //    i. Assert: Receiver does not currently have a property P.
        //    ii. Return ? CreateDataProperty(Receiver, P, V).
        return receiver.internal_define_own_property(
            ctx,
            key,
            PropertyDescriptor::data(value, PropertyAttributes::default()),
            Some(None),
        );
    }

    // 3. Assert: IsAccessorDescriptor(ownDesc) is true.
    // 4. Let setter be ownDesc.[[Set]].
    // 5. If setter is undefined, return false.
    let Some(setter) = own_descriptor.set.flatten() else {
        return Ok(false);
    };

    // 6. Perform ? Call(setter, Receiver, « V »).
    ctx.call(&Value::Object(setter), receiver, &[value])?;

    // 7. Return true.
    Ok(true)
}

/// ### [10.1.10.1 OrdinaryDelete ( O, P )](https://tc39.es/ecma262/#sec-ordinarydelete)
pub fn ordinary_delete(ctx: &mut Context, object: ObjectRef, key: &PropertyKey) -> VmResult<bool> {
    // 1. Let desc be ? O.[[GetOwnProperty]](P).
    // 2. If desc is undefined, return true.
    let Some(descriptor) = object.internal_get_own_property(ctx, key)? else {
        return Ok(true);
    };

    // 3. If desc.[[Configurable]] is true, then
    if descriptor.configurable == Some(true) {
        // a. Remove the own property with name P from O.
        object.storage_delete(ctx, key);
        // b. Return true.
        return Ok(true);
    }

    // 4. Return false.
    Ok(false)
}

/// ### [10.1.11.1 OrdinaryOwnPropertyKeys ( O )](https://tc39.es/ecma262/#sec-ordinaryownpropertykeys)
pub fn ordinary_own_property_keys(
    ctx: &mut Context,
    object: ObjectRef,
) -> VmResult<Vec<PropertyKey>> {
    let object = ctx.object(object);
    let shape = object.shape();

    // 1. Let keys be a new empty List.
    let mut keys = Vec::with_capacity(object.indexed.len() + shape.property_count());

    // 2. For each own property key P of O such that P is an array index, in
    //    ascending numeric index order, do
    //    a. Append P to keys.
    keys.extend(object.indexed.indices().into_iter().map(PropertyKey::Index));

    // 3. For each own property key P of O such that P is a String and P is
    //    not an array index, in ascending chronological order of property
    //    creation, do
    //    a. Append P to keys.
    keys.extend(shape.keys().filter(|key| key.is_string()).cloned());

    // 4. For each own property key P of O such that P is a Symbol, in
    //    ascending chronological order of property creation, do
    //    a. Append P to keys.
    keys.extend(shape.keys().filter(|key| key.is_symbol()).cloned());

    // 5. Return keys.
    Ok(keys)
}

/// ### [10.4.7.1 \[\[SetPrototypeOf\]\] ( V )](https://tc39.es/ecma262/#sec-immutable-prototype-exotic-objects-setprototypeof-v)
pub fn immutable_prototype_set_prototype_of(
    ctx: &mut Context,
    object: ObjectRef,
    prototype: Option<ObjectRef>,
) -> VmResult<bool> {
    // 1. Return ? SetImmutablePrototype(O, V).
    set_immutable_prototype(ctx, object, prototype)
}

/// ### [10.4.7.2 SetImmutablePrototype ( O, V )](https://tc39.es/ecma262/#sec-set-immutable-prototype)
pub fn set_immutable_prototype(
    ctx: &mut Context,
    object: ObjectRef,
    prototype: Option<ObjectRef>,
) -> VmResult<bool> {
    // 1. Let current be ? O.[[GetPrototypeOf]]().
    let current = object.internal_get_prototype_of(ctx)?;

    // 2. If SameValue(V, current) is true, return true.
    // 3. Return false.
    Ok(prototype == current)
}
