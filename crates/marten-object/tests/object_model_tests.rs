//! Object model integration tests
//!
//! Exercises the internal-method protocol end to end:
//! - Shape sharing, slot stability and dictionary isolation
//! - Property key ordering
//! - Descriptor validation and integrity levels
//! - Receiver semantics and prototype cycles
//! - Cacheable lookup metadata
//! - Exotic internal-method tables

use marten_object::ordinary::ordinary_get;
use marten_object::{
    CacheableKind, CacheablePropertyMetadata, Context, ContextConfig, IntegrityLevel,
    InternalMethods, NativeBehaviour, NativeFunction, ORDINARY_INTERNAL_METHODS, Object,
    ObjectFlags, ObjectKind, ObjectRef, PrivateName, PropertyAttributes, PropertyDescriptor,
    PropertyKey, PropertyLookupPhase, PropertyValue, ShouldThrowExceptions, Value, VmResult,
};
use std::cell::Cell;
use std::ops::ControlFlow;
use std::rc::Rc;

fn key(s: &str) -> PropertyKey {
    PropertyKey::from(s)
}

fn behaviour(
    f: impl Fn(&mut Context, Value, &[Value]) -> VmResult<Value> + 'static,
) -> NativeBehaviour {
    Rc::new(f)
}

fn get_with_metadata(
    ctx: &mut Context,
    object: ObjectRef,
    key: &PropertyKey,
) -> (Value, CacheablePropertyMetadata) {
    let mut metadata = CacheablePropertyMetadata::default();
    let value = object
        .internal_get(
            ctx,
            key,
            Value::Object(object),
            Some(&mut metadata),
            PropertyLookupPhase::OwnProperty,
        )
        .unwrap();
    (value, metadata)
}

// ============================================================================
// Shapes
// ============================================================================

#[test]
fn test_identical_histories_share_a_shape() {
    let mut ctx = Context::new();
    let objects: Vec<ObjectRef> = (0..4).map(|_| Object::create(&mut ctx, None)).collect();
    for &object in &objects {
        for name in ["x", "y", "z"] {
            object.create_data_property(&mut ctx, &key(name), Value::from(1)).unwrap();
        }
    }

    let first = Rc::clone(ctx.object(objects[0]).shape());
    for &object in &objects[1..] {
        assert!(Rc::ptr_eq(ctx.object(object).shape(), &first));
    }
    assert!(!first.is_dictionary());
}

#[test]
fn test_diverging_histories_never_reconverge() {
    let mut ctx = Context::new();
    let a = Object::create(&mut ctx, None);
    let b = Object::create(&mut ctx, None);
    a.create_data_property(&mut ctx, &key("x"), Value::Null).unwrap();
    a.create_data_property(&mut ctx, &key("y"), Value::Null).unwrap();
    b.create_data_property(&mut ctx, &key("y"), Value::Null).unwrap();
    b.create_data_property(&mut ctx, &key("x"), Value::Null).unwrap();
    assert!(!Rc::ptr_eq(ctx.object(a).shape(), ctx.object(b).shape()));

    // Same key, different attributes
    let c = Object::create(&mut ctx, None);
    let d = Object::create(&mut ctx, None);
    c.create_data_property(&mut ctx, &key("x"), Value::Null).unwrap();
    d.create_method_property(&mut ctx, &key("x"), Value::Null).unwrap();
    assert!(!Rc::ptr_eq(ctx.object(c).shape(), ctx.object(d).shape()));
}

#[test]
fn test_slot_stability() {
    let mut ctx = Context::new();
    let a = Object::create(&mut ctx, None);
    let b = Object::create(&mut ctx, None);
    for object in [a, b] {
        object.create_data_property(&mut ctx, &key("first"), Value::from(1)).unwrap();
        object.create_data_property(&mut ctx, &key("second"), Value::from(2)).unwrap();
    }
    // Writing values never moves a slot
    a.set(&mut ctx, &key("first"), Value::from(10), ShouldThrowExceptions::Yes)
        .unwrap();

    let (_, metadata_a) = get_with_metadata(&mut ctx, a, &key("second"));
    let (_, metadata_b) = get_with_metadata(&mut ctx, b, &key("second"));
    assert_eq!(metadata_a.shape, metadata_b.shape);
    assert_eq!(metadata_a.property_offset, Some(1));
    assert_eq!(metadata_b.property_offset, Some(1));
    assert_eq!(
        b.get_direct(&ctx, 1),
        &PropertyValue::Data(Value::from(2))
    );
}

#[test]
fn test_dictionary_isolation() {
    let mut ctx = Context::new();
    let a = Object::create(&mut ctx, None);
    let b = Object::create(&mut ctx, None);
    for object in [a, b] {
        object.create_data_property(&mut ctx, &key("x"), Value::from(1)).unwrap();
        object.create_data_property(&mut ctx, &key("y"), Value::from(2)).unwrap();
    }
    let shared = Rc::clone(ctx.object(b).shape());

    assert!(a.internal_delete(&mut ctx, &key("x")).unwrap());

    assert!(ctx.object(a).shape().is_dictionary());
    assert!(Rc::ptr_eq(ctx.object(b).shape(), &shared));
    assert!(!shared.is_dictionary());
    assert_eq!(b.get(&mut ctx, &key("x")).unwrap(), Value::from(1));
    assert_eq!(b.get(&mut ctx, &key("y")).unwrap(), Value::from(2));
    assert_eq!(a.get(&mut ctx, &key("x")).unwrap(), Value::Undefined);
    assert_eq!(a.get(&mut ctx, &key("y")).unwrap(), Value::from(2));
    assert_eq!(ctx.shapes().stats().dictionary_conversions, 1);
}

#[test]
fn test_dictionary_mutation_invalidates_cached_shape() {
    let mut ctx = Context::new();
    let object = Object::create(&mut ctx, None);
    object.create_data_property(&mut ctx, &key("x"), Value::from(1)).unwrap();
    object.create_data_property(&mut ctx, &key("y"), Value::from(2)).unwrap();
    object.internal_delete(&mut ctx, &key("x")).unwrap();

    let (_, before) = get_with_metadata(&mut ctx, object, &key("y"));
    assert_eq!(before.kind, CacheableKind::OwnProperty);
    object.create_data_property(&mut ctx, &key("z"), Value::from(3)).unwrap();
    let (_, after) = get_with_metadata(&mut ctx, object, &key("y"));
    assert_ne!(before.shape, after.shape);
    assert_eq!(before.property_offset, after.property_offset);
}

// ============================================================================
// Key ordering
// ============================================================================

#[test]
fn test_own_property_keys_ordering() {
    let mut ctx = Context::new();
    let object = Object::create(&mut ctx, None);
    let first_symbol = PropertyKey::from(ctx.new_symbol(Some("first")));
    let second_symbol = PropertyKey::from(ctx.new_symbol(Some("second")));

    for k in [
        key("b"),
        PropertyKey::from(2u32),
        second_symbol.clone(),
        key("a"),
        first_symbol.clone(),
        key("10"),
        PropertyKey::from(0u32),
        key("c"),
    ] {
        object.create_data_property(&mut ctx, &k, Value::Null).unwrap();
    }
    // Deleting and re-adding moves a key to the end of its group
    object.internal_delete(&mut ctx, &key("b")).unwrap();
    object.create_data_property(&mut ctx, &key("b"), Value::Null).unwrap();

    let keys = object.internal_own_property_keys(&mut ctx).unwrap();
    assert_eq!(
        keys,
        vec![
            PropertyKey::from(0u32),
            PropertyKey::from(2u32),
            PropertyKey::from(10u32),
            key("a"),
            key("c"),
            key("b"),
            second_symbol,
            first_symbol,
        ]
    );
}

#[test]
fn test_indexed_storage_goes_sparse_without_changing_order() {
    let mut ctx = Context::new();
    let object = Object::create(&mut ctx, None);
    for i in [0u32, 1, 2] {
        object
            .create_data_property(&mut ctx, &PropertyKey::from(i), Value::from(i as i32))
            .unwrap();
    }
    assert!(ctx.object(object).indexed().is_dense());

    object
        .create_data_property(&mut ctx, &PropertyKey::from(100_000u32), Value::from(9))
        .unwrap();
    assert!(!ctx.object(object).indexed().is_dense());

    let keys = object.internal_own_property_keys(&mut ctx).unwrap();
    assert_eq!(
        keys,
        vec![
            PropertyKey::from(0u32),
            PropertyKey::from(1u32),
            PropertyKey::from(2u32),
            PropertyKey::from(100_000u32),
        ]
    );
    assert_eq!(object.get(&mut ctx, &PropertyKey::from(1u32)).unwrap(), Value::from(1));
}

// ============================================================================
// Descriptors and integrity levels
// ============================================================================

#[test]
fn test_non_configurable_non_writable_is_immutable() {
    let mut ctx = Context::new();
    let object = Object::create(&mut ctx, None);
    let x = key("x");
    object
        .define_property_or_throw(
            &mut ctx,
            &x,
            PropertyDescriptor::data(Value::from(1), PropertyAttributes::empty()),
        )
        .unwrap();

    let changed = object
        .internal_define_own_property(
            &mut ctx,
            &x,
            PropertyDescriptor::value_only(Value::from(2)),
            None,
        )
        .unwrap();
    assert!(!changed);
    assert_eq!(object.get(&mut ctx, &x).unwrap(), Value::from(1));

    let same = object
        .internal_define_own_property(
            &mut ctx,
            &x,
            PropertyDescriptor::value_only(Value::from(1)),
            None,
        )
        .unwrap();
    assert!(same);

    let getter = Object::create(&mut ctx, None);
    let to_accessor = object
        .internal_define_own_property(
            &mut ctx,
            &x,
            PropertyDescriptor {
                get: Some(Some(getter)),
                ..Default::default()
            },
            None,
        )
        .unwrap();
    assert!(!to_accessor);
}

#[test]
fn test_non_configurable_accessor_keeps_functions() {
    let mut ctx = Context::new();
    let object = Object::create(&mut ctx, None);
    let getter = NativeFunction::create(&mut ctx, "get", 0, |_, _, _| Ok(Value::from(1)));
    let other = NativeFunction::create(&mut ctx, "other", 0, |_, _, _| Ok(Value::from(2)));
    object
        .define_property_or_throw(
            &mut ctx,
            &key("x"),
            PropertyDescriptor::accessor(Some(getter), None, PropertyAttributes::empty()),
        )
        .unwrap();

    let replaced = object
        .internal_define_own_property(
            &mut ctx,
            &key("x"),
            PropertyDescriptor {
                get: Some(Some(other)),
                ..Default::default()
            },
            None,
        )
        .unwrap();
    assert!(!replaced);
    assert_eq!(object.get(&mut ctx, &key("x")).unwrap(), Value::from(1));
}

#[test]
fn test_freeze_round_trip() {
    let mut ctx = Context::new();
    let object = Object::create(&mut ctx, None);
    let getter = NativeFunction::create(&mut ctx, "get", 0, |_, _, _| Ok(Value::Null));
    object.create_data_property(&mut ctx, &key("x"), Value::from(1)).unwrap();
    object.create_data_property(&mut ctx, &PropertyKey::from(0u32), Value::from(2)).unwrap();
    object
        .define_property_or_throw(
            &mut ctx,
            &key("a"),
            PropertyDescriptor::accessor(Some(getter), None, PropertyAttributes::CONFIGURABLE),
        )
        .unwrap();

    assert!(object.set_integrity_level(&mut ctx, IntegrityLevel::Frozen).unwrap());
    assert!(object.test_integrity_level(&mut ctx, IntegrityLevel::Frozen).unwrap());
    assert!(object.test_integrity_level(&mut ctx, IntegrityLevel::Sealed).unwrap());
    assert!(!object.internal_is_extensible(&mut ctx).unwrap());

    for k in object.internal_own_property_keys(&mut ctx).unwrap() {
        let descriptor = object.internal_get_own_property(&mut ctx, &k).unwrap().unwrap();
        assert_eq!(descriptor.configurable, Some(false));
        if descriptor.is_data() {
            assert_eq!(descriptor.writable, Some(false));
        }

        let receiver = Value::Object(object);
        let written = object
            .internal_set(
                &mut ctx,
                &k,
                Value::from(99),
                receiver,
                None,
                PropertyLookupPhase::OwnProperty,
            )
            .unwrap();
        assert!(!written, "{k} should not be writable");
    }
    assert_eq!(object.get(&mut ctx, &key("x")).unwrap(), Value::from(1));
    assert_eq!(object.get(&mut ctx, &PropertyKey::from(0u32)).unwrap(), Value::from(2));
    assert!(!object.create_data_property(&mut ctx, &key("new"), Value::Null).unwrap());
}

// ============================================================================
// Receivers and prototype chains
// ============================================================================

#[test]
fn test_getter_receives_original_receiver() {
    let mut ctx = Context::new();
    let prototype = Object::create(&mut ctx, None);
    prototype.define_native_accessor(
        &mut ctx,
        &key("self"),
        Some(behaviour(|_, this, _| Ok(this))),
        None,
        PropertyAttributes::CONFIGURABLE,
    );
    let child = Object::create(&mut ctx, Some(prototype));

    assert_eq!(child.get(&mut ctx, &key("self")).unwrap(), Value::Object(child));
    assert_eq!(prototype.get(&mut ctx, &key("self")).unwrap(), Value::Object(prototype));
}

#[test]
fn test_setter_on_prototype_runs_with_receiver() {
    let mut ctx = Context::new();
    let prototype = Object::create(&mut ctx, None);
    prototype.define_native_accessor(
        &mut ctx,
        &key("value"),
        None,
        Some(behaviour(|ctx, this, args| {
            let target = this.as_object().unwrap();
            let written = args.first().cloned().unwrap_or_default();
            target.define_direct_property(
                ctx,
                &PropertyKey::from("written"),
                written,
                PropertyAttributes::default(),
            );
            Ok(Value::Undefined)
        })),
        PropertyAttributes::CONFIGURABLE,
    );
    let child = Object::create(&mut ctx, Some(prototype));

    child
        .set(&mut ctx, &key("value"), Value::from(5), ShouldThrowExceptions::Yes)
        .unwrap();
    assert_eq!(child.get(&mut ctx, &key("written")).unwrap(), Value::from(5));
    assert!(!child.has_own_property(&mut ctx, &key("value")).unwrap());
    assert!(!prototype.has_own_property(&mut ctx, &key("written")).unwrap());
}

#[test]
fn test_set_creates_own_property_on_receiver() {
    let mut ctx = Context::new();
    let prototype = Object::create(&mut ctx, None);
    prototype.create_data_property(&mut ctx, &key("x"), Value::from(1)).unwrap();
    let child = Object::create(&mut ctx, Some(prototype));

    child.set(&mut ctx, &key("x"), Value::from(2), ShouldThrowExceptions::Yes).unwrap();
    assert_eq!(child.get(&mut ctx, &key("x")).unwrap(), Value::from(2));
    assert_eq!(prototype.get(&mut ctx, &key("x")).unwrap(), Value::from(1));
}

#[test]
fn test_read_only_prototype_property_blocks_assignment() {
    let mut ctx = Context::new();
    let prototype = Object::create(&mut ctx, None);
    prototype.define_direct_property(
        &mut ctx,
        &key("x"),
        Value::from(1),
        PropertyAttributes::CONFIGURABLE,
    );
    let child = Object::create(&mut ctx, Some(prototype));

    child.set(&mut ctx, &key("x"), Value::from(2), ShouldThrowExceptions::No).unwrap();
    assert!(!child.has_own_property(&mut ctx, &key("x")).unwrap());
    assert!(
        child
            .set(&mut ctx, &key("x"), Value::from(2), ShouldThrowExceptions::Yes)
            .unwrap_err()
            .is_type_error()
    );
}

#[test]
fn test_getter_may_mutate_the_object_being_read() {
    let mut ctx = Context::new();
    let object = Object::create(&mut ctx, None);
    object.define_native_accessor(
        &mut ctx,
        &key("grow"),
        Some(behaviour(|ctx, this, _| {
            let object = this.as_object().unwrap();
            for i in 0..16 {
                let key = PropertyKey::from(format!("p{i}").as_str());
                object.create_data_property(ctx, &key, Value::from(i))?;
            }
            object.internal_delete(ctx, &PropertyKey::from("p0"))?;
            Ok(Value::from(true))
        })),
        None,
        PropertyAttributes::CONFIGURABLE,
    );

    let (value, metadata) = get_with_metadata(&mut ctx, object, &key("grow"));
    assert_eq!(value, Value::from(true));
    assert!(!metadata.is_cacheable());
    assert_eq!(object.get(&mut ctx, &key("p15")).unwrap(), Value::from(15));
}

#[test]
fn test_cyclic_prototype_chain_is_not_found() {
    let config = ContextConfig::default().with_max_prototype_chain_depth(32);
    let mut ctx = Context::with_config(config);
    let a = Object::create(&mut ctx, None);
    let b = Object::create(&mut ctx, Some(a));
    // Forced: bypasses the [[SetPrototypeOf]] cycle check
    a.set_prototype(&mut ctx, Some(b));

    assert!(!a.has_property(&mut ctx, &key("missing")).unwrap());
    assert_eq!(a.get(&mut ctx, &key("missing")).unwrap(), Value::Undefined);

    let mut enumerated = 0;
    a.enumerate_object_properties(&mut ctx, |_, _| {
        enumerated += 1;
        Ok(ControlFlow::Continue(()))
    })
    .unwrap();
    assert_eq!(enumerated, 0);
    assert!(a.get_without_side_effects(&mut ctx, &key("missing")).is_none());

    // A third object cannot join the cycle
    let c = Object::create(&mut ctx, None);
    assert!(!c.internal_set_prototype_of(&mut ctx, Some(a)).unwrap());

    // Assignment still lands on the receiver
    a.set(&mut ctx, &key("x"), Value::from(1), ShouldThrowExceptions::Yes).unwrap();
    assert!(a.has_own_property(&mut ctx, &key("x")).unwrap());
    assert!(b.has_property(&mut ctx, &key("x")).unwrap());
}

#[test]
fn test_prototype_depth_limit() {
    let config = ContextConfig::default().with_max_prototype_chain_depth(4);
    let mut ctx = Context::with_config(config);
    let root = Object::create(&mut ctx, None);
    root.create_data_property(&mut ctx, &key("deep"), Value::from(1)).unwrap();
    let mut chain = root;
    for _ in 0..4 {
        chain = Object::create(&mut ctx, Some(chain));
    }
    assert_eq!(chain.get(&mut ctx, &key("deep")).unwrap(), Value::from(1));

    // One more level exceeds the limit
    let too_deep = Object::create(&mut ctx, Some(chain));
    assert_eq!(too_deep.get(&mut ctx, &key("deep")).unwrap(), Value::Undefined);
}

// ============================================================================
// End to end and cacheable metadata
// ============================================================================

#[test]
fn test_define_get_delete_scenario() {
    let mut ctx = Context::new();
    let object = Object::create(&mut ctx, None);
    let x = key("x");

    let defined = object
        .internal_define_own_property(
            &mut ctx,
            &x,
            PropertyDescriptor {
                value: Some(Value::from(1)),
                writable: Some(true),
                enumerable: Some(true),
                configurable: Some(true),
                ..Default::default()
            },
            None,
        )
        .unwrap();
    assert!(defined);

    let (value, metadata) = get_with_metadata(&mut ctx, object, &x);
    assert_eq!(value, Value::from(1));
    assert_eq!(metadata.kind, CacheableKind::OwnProperty);
    assert_eq!(metadata.property_offset, Some(0));
    assert_eq!(metadata.shape, Some(ctx.object(object).shape().id()));
    assert_eq!(metadata.prototype, None);

    assert!(object.internal_delete(&mut ctx, &x).unwrap());
    let (value, metadata) = get_with_metadata(&mut ctx, object, &x);
    assert_eq!(value, Value::Undefined);
    assert_eq!(metadata.kind, CacheableKind::NotCacheable);
}

#[test]
fn test_prototype_hit_is_cacheable_in_chain() {
    let mut ctx = Context::new();
    let prototype = Object::create(&mut ctx, None);
    prototype.create_data_property(&mut ctx, &key("a"), Value::from(1)).unwrap();
    prototype.create_data_property(&mut ctx, &key("b"), Value::from(2)).unwrap();
    let child = Object::create(&mut ctx, Some(prototype));

    let (value, metadata) = get_with_metadata(&mut ctx, child, &key("b"));
    assert_eq!(value, Value::from(2));
    assert_eq!(metadata.kind, CacheableKind::InPrototypeChain);
    assert_eq!(metadata.prototype, Some(prototype));
    assert_eq!(metadata.property_offset, Some(1));
    assert_eq!(metadata.shape, Some(ctx.object(prototype).shape().id()));
}

#[test]
fn test_accessors_and_elements_are_not_cacheable() {
    let mut ctx = Context::new();
    let object = Object::create(&mut ctx, None);
    object.define_native_accessor(
        &mut ctx,
        &key("a"),
        Some(behaviour(|_, _, _| Ok(Value::from(1)))),
        None,
        PropertyAttributes::CONFIGURABLE,
    );
    object.create_data_property(&mut ctx, &PropertyKey::from(0u32), Value::from(2)).unwrap();

    let (value, metadata) = get_with_metadata(&mut ctx, object, &key("a"));
    assert_eq!(value, Value::from(1));
    assert!(!metadata.is_cacheable());

    let (value, metadata) = get_with_metadata(&mut ctx, object, &PropertyKey::from(0u32));
    assert_eq!(value, Value::from(2));
    assert!(!metadata.is_cacheable());
}

#[test]
fn test_cached_slot_kind_is_not_implied_by_shape() {
    let mut ctx = Context::new();
    let attributes = PropertyAttributes::ENUMERABLE | PropertyAttributes::CONFIGURABLE;
    let getter = NativeFunction::create(&mut ctx, "get x", 0, |_, _, _| Ok(Value::from(2)));
    let data = Object::create(&mut ctx, None);
    let accessor = Object::create(&mut ctx, None);
    data.define_direct_property(&mut ctx, &key("x"), Value::from(1), attributes);
    accessor.define_direct_accessor(&mut ctx, &key("x"), Some(getter), None, attributes);
    assert!(Rc::ptr_eq(ctx.object(data).shape(), ctx.object(accessor).shape()));

    let (_, metadata) = get_with_metadata(&mut ctx, data, &key("x"));
    assert_eq!(metadata.kind, CacheableKind::OwnProperty);
    assert_eq!(metadata.shape, Some(ctx.object(accessor).shape().id()));
    let offset = metadata.property_offset.unwrap();
    assert!(matches!(accessor.get_direct(&ctx, offset), PropertyValue::Accessor(_)));

    let (value, metadata) = get_with_metadata(&mut ctx, accessor, &key("x"));
    assert_eq!(value, Value::from(2));
    assert!(!metadata.is_cacheable());
}

#[test]
fn test_set_reports_own_slot() {
    let mut ctx = Context::new();
    let object = Object::create(&mut ctx, None);
    object.create_data_property(&mut ctx, &key("x"), Value::from(1)).unwrap();

    let mut metadata = CacheablePropertyMetadata::default();
    let written = object
        .internal_set(
            &mut ctx,
            &key("x"),
            Value::from(2),
            Value::Object(object),
            Some(&mut metadata),
            PropertyLookupPhase::OwnProperty,
        )
        .unwrap();
    assert!(written);
    assert_eq!(metadata.kind, CacheableKind::OwnProperty);
    assert_eq!(metadata.property_offset, Some(0));
    assert_eq!(object.get_direct(&ctx, 0), &PropertyValue::Data(Value::from(2)));
}

// ============================================================================
// Intrinsic accessors, private elements, exotic tables
// ============================================================================

thread_local! {
    static FACTORY_CALLS: Cell<u32> = const { Cell::new(0) };
}

fn answer_factory(ctx: &mut Context) -> Value {
    FACTORY_CALLS.with(|calls| calls.set(calls.get() + 1));
    Value::from(ctx.intern("forty-two"))
}

#[test]
fn test_intrinsic_accessor_materializes_once() {
    let mut ctx = Context::new();
    let object = Object::create(&mut ctx, None);
    object.define_intrinsic_accessor(
        &mut ctx,
        key("answer"),
        PropertyAttributes::default(),
        answer_factory,
    );
    assert!(ctx.object(object).has_intrinsic_accessors());
    assert_eq!(FACTORY_CALLS.with(Cell::get), 0);

    assert_eq!(object.get(&mut ctx, &key("answer")).unwrap(), Value::from("forty-two"));
    assert_eq!(object.get(&mut ctx, &key("answer")).unwrap(), Value::from("forty-two"));
    assert_eq!(FACTORY_CALLS.with(Cell::get), 1);
    assert!(!ctx.object(object).has_intrinsic_accessors());

    // Behaves as an ordinary data property afterwards
    object
        .set(&mut ctx, &key("answer"), Value::from(42), ShouldThrowExceptions::Yes)
        .unwrap();
    assert_eq!(object.get(&mut ctx, &key("answer")).unwrap(), Value::from(42));
    assert_eq!(FACTORY_CALLS.with(Cell::get), 1);
}

#[test]
fn test_overwriting_intrinsic_accessor_skips_factory() {
    FACTORY_CALLS.with(|calls| calls.set(0));
    let mut ctx = Context::new();
    let object = Object::create(&mut ctx, None);
    object.define_intrinsic_accessor(
        &mut ctx,
        key("answer"),
        PropertyAttributes::default(),
        answer_factory,
    );
    object.define_direct_property(
        &mut ctx,
        &key("answer"),
        Value::Null,
        PropertyAttributes::default(),
    );

    assert_eq!(object.get(&mut ctx, &key("answer")).unwrap(), Value::Null);
    assert_eq!(FACTORY_CALLS.with(Cell::get), 0);
}

#[test]
fn test_pending_intrinsic_accessor_shape_is_never_shared() {
    FACTORY_CALLS.with(|calls| calls.set(0));
    let mut ctx = Context::new();
    let a = Object::create(&mut ctx, None);
    let b = Object::create(&mut ctx, None);
    for object in [a, b] {
        object.define_intrinsic_accessor(
            &mut ctx,
            key("answer"),
            PropertyAttributes::default(),
            answer_factory,
        );
    }
    assert_ne!(ctx.object(a).shape().id(), ctx.object(b).shape().id());

    let (value, metadata) = get_with_metadata(&mut ctx, a, &key("answer"));
    assert_eq!(value, Value::from("forty-two"));
    assert_eq!(metadata.kind, CacheableKind::OwnProperty);
    assert_ne!(metadata.shape, Some(ctx.object(b).shape().id()));

    // A cache hit on `a` stays valid once materialized
    assert_eq!(metadata.shape, Some(ctx.object(a).shape().id()));
    let offset = metadata.property_offset.unwrap();
    assert_eq!(
        a.get_direct(&ctx, offset),
        &PropertyValue::Data(Value::from("forty-two"))
    );

    assert_eq!(b.get(&mut ctx, &key("answer")).unwrap(), Value::from("forty-two"));
    assert_eq!(FACTORY_CALLS.with(Cell::get), 2);
}

#[test]
fn test_private_field_duplicate_keeps_first_value() {
    let mut ctx = Context::new();
    let object = Object::create(&mut ctx, None);
    let name = PrivateName::new(ctx.intern("secret"));

    object.private_field_add(&mut ctx, name.clone(), Value::from(1)).unwrap();
    assert!(
        object
            .private_field_add(&mut ctx, name.clone(), Value::from(2))
            .unwrap_err()
            .is_type_error()
    );
    assert_eq!(object.private_get(&mut ctx, &name).unwrap(), Value::from(1));
    // Private elements are invisible to key enumeration
    assert!(object.internal_own_property_keys(&mut ctx).unwrap().is_empty());
}

fn constant_get(
    ctx: &mut Context,
    object: ObjectRef,
    key: &PropertyKey,
    receiver: Value,
    metadata: Option<&mut CacheablePropertyMetadata>,
    phase: PropertyLookupPhase,
) -> VmResult<Value> {
    if key.is_index() {
        return Ok(Value::from("intercepted"));
    }
    ordinary_get(ctx, object, key, receiver, metadata, phase)
}

const INTERCEPTING_INTERNAL_METHODS: InternalMethods = InternalMethods {
    get: constant_get,
    ..ORDINARY_INTERNAL_METHODS
};

#[test]
fn test_exotic_table_overrides_only_get() {
    let mut ctx = Context::new();
    let object = Object::create_exotic(
        &mut ctx,
        None,
        ObjectKind::Ordinary,
        &INTERCEPTING_INTERNAL_METHODS,
        ObjectFlags::MAY_INTERFERE_WITH_INDEXED_PROPERTY_ACCESS,
    );
    assert!(!ctx.object(object).indexed().is_dense());
    assert_eq!(
        ctx.object(object).may_interfere_with_indexed_property_access(),
        marten_object::MayInterfereWithIndexedPropertyAccess::Yes
    );

    object.create_data_property(&mut ctx, &PropertyKey::from(0u32), Value::from(1)).unwrap();
    object.create_data_property(&mut ctx, &key("named"), Value::from(2)).unwrap();
    assert_eq!(object.get(&mut ctx, &PropertyKey::from(0u32)).unwrap(), Value::from("intercepted"));
    assert_eq!(object.get(&mut ctx, &key("named")).unwrap(), Value::from(2));
    assert!(object.has_own_property(&mut ctx, &PropertyKey::from(0u32)).unwrap());

    // Objects inheriting from it reach the override through the chain
    let child = Object::create(&mut ctx, Some(object));
    assert_eq!(child.get(&mut ctx, &PropertyKey::from(7u32)).unwrap(), Value::from("intercepted"));
}

#[test]
fn test_typed_array_like_elements_bypass_storage() {
    let mut ctx = Context::new();
    let prototype = Object::create(&mut ctx, None);
    prototype.create_data_property(&mut ctx, &PropertyKey::from(0u32), Value::from(1)).unwrap();
    prototype.create_data_property(&mut ctx, &key("named"), Value::from(2)).unwrap();

    let typed = Object::create_exotic(
        &mut ctx,
        Some(prototype),
        ObjectKind::Ordinary,
        &INTERCEPTING_INTERNAL_METHODS,
        ObjectFlags::TYPED_ARRAY_LIKE,
    );
    let plain = Object::create(&mut ctx, Some(prototype));
    assert!(ctx.object(typed).is_typed_array_like());
    assert!(!ctx.object(plain).is_typed_array_like());

    let index = PropertyKey::from(0u32);
    assert_eq!(typed.get_without_side_effects(&mut ctx, &index), None);
    assert_eq!(
        plain.get_without_side_effects(&mut ctx, &index),
        Some(PropertyValue::Data(Value::from(1)))
    );
    assert_eq!(
        typed.get_without_side_effects(&mut ctx, &key("named")),
        Some(PropertyValue::Data(Value::from(2)))
    );
    assert_eq!(typed.get(&mut ctx, &index).unwrap(), Value::from("intercepted"));
}

#[test]
fn test_object_prototype_is_immutable() {
    let mut ctx = Context::new();
    let object_prototype = ctx.intrinsics().object_prototype();
    let other = Object::create(&mut ctx, None);
    assert!(!object_prototype.internal_set_prototype_of(&mut ctx, Some(other)).unwrap());
    assert!(object_prototype.internal_set_prototype_of(&mut ctx, None).unwrap());

    let global = ctx.global_object();
    assert_eq!(global.internal_get_prototype_of(&mut ctx).unwrap(), Some(object_prototype));
}

#[test]
fn test_snapshot_and_copy_data_properties() {
    let mut ctx = Context::new();
    let source = Object::create_with_default_prototype(&mut ctx);
    let hidden = ctx.new_symbol(Some("hidden"));
    source.create_data_property(&mut ctx, &key("keep"), Value::from(1)).unwrap();
    source.create_data_property(&mut ctx, &key("drop"), Value::from(2)).unwrap();
    source.create_data_property(&mut ctx, &key("seen"), Value::from(3)).unwrap();
    source
        .create_data_property(&mut ctx, &PropertyKey::from(hidden.clone()), Value::from(4))
        .unwrap();
    source.create_method_property(&mut ctx, &key("method"), Value::from(5)).unwrap();

    let excluded_keys = [key("drop")].into_iter().collect();
    let excluded_values = [Value::from(3)].into_iter().collect();
    let prototype = ctx.intrinsics().object_prototype();
    let copy = source
        .snapshot_own_properties(&mut ctx, Some(prototype), &excluded_keys, &excluded_values)
        .unwrap();

    assert_eq!(
        copy.internal_own_property_keys(&mut ctx).unwrap(),
        vec![key("keep"), PropertyKey::from(hidden)]
    );
    assert_eq!(copy.internal_get_prototype_of(&mut ctx).unwrap(), Some(prototype));

    let target = Object::create(&mut ctx, None);
    target
        .copy_data_properties(&mut ctx, &Value::Null, &excluded_keys, &excluded_values)
        .unwrap();
    target
        .copy_data_properties(&mut ctx, &Value::from(1), &excluded_keys, &excluded_values)
        .unwrap();
    assert!(target.internal_own_property_keys(&mut ctx).unwrap().is_empty());
}
