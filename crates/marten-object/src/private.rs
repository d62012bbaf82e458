//! ## [7.3.26 PrivateElementFind ( O, P )](https://tc39.es/ecma262/#sec-privateelementfind) and friends
//!
//! Private elements are not part of the shape: each object keeps its own list,
//! searched by [`PrivateName`] identity.

use crate::context::Context;
use crate::error::{VmError, VmResult};
use crate::object::ObjectRef;
use crate::property::{Accessor, PropertyValue};
use crate::string::JsString;
use crate::value::Value;
use std::fmt;
use std::rc::Rc;

struct PrivateNameData {
    description: JsString,
}

/// An unforgeable private name.
///
/// Two names are equal only if they are clones of the same
/// [`PrivateName::new`] result; the description is for diagnostics.
#[derive(Clone)]
pub struct PrivateName(Rc<PrivateNameData>);

impl PrivateName {
    /// Create a fresh private name
    pub fn new(description: JsString) -> Self {
        Self(Rc::new(PrivateNameData { description }))
    }

    /// `[[Description]]`, without the leading `#`
    pub fn description(&self) -> &JsString {
        &self.0.description
    }
}

impl PartialEq for PrivateName {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for PrivateName {}

impl fmt::Debug for PrivateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0.description)
    }
}

/// `[[Kind]]` of a private element
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrivateElementKind {
    /// Writable field
    Field,
    /// Read-only method
    Method,
    /// Getter and/or setter
    Accessor,
}

/// ### [6.2.10 The PrivateElement Specification Type](https://tc39.es/ecma262/#sec-privateelement-specification-type)
#[derive(Clone, Debug)]
pub struct PrivateElement {
    key: PrivateName,
    kind: PrivateElementKind,
    value: PropertyValue,
}

impl PrivateElement {
    /// A private field holding `value`
    pub fn field(key: PrivateName, value: Value) -> Self {
        Self {
            key,
            kind: PrivateElementKind::Field,
            value: PropertyValue::Data(value),
        }
    }

    /// A private method
    pub fn method(key: PrivateName, function: ObjectRef) -> Self {
        Self {
            key,
            kind: PrivateElementKind::Method,
            value: PropertyValue::Data(Value::Object(function)),
        }
    }

    /// A private accessor
    pub fn accessor(
        key: PrivateName,
        getter: Option<ObjectRef>,
        setter: Option<ObjectRef>,
    ) -> Self {
        Self {
            key,
            kind: PrivateElementKind::Accessor,
            value: PropertyValue::Accessor(Accessor { getter, setter }),
        }
    }

    /// `[[Key]]`
    pub fn key(&self) -> &PrivateName {
        &self.key
    }

    /// `[[Kind]]`
    pub fn kind(&self) -> PrivateElementKind {
        self.kind
    }

    /// `[[Value]]` for fields and methods, `[[Get]]`/`[[Set]]` for accessors
    pub fn value(&self) -> &PropertyValue {
        &self.value
    }
}

impl ObjectRef {
    /// PrivateElementFind ( O, P )
    pub fn private_element_find<'a>(
        self,
        ctx: &'a Context,
        name: &PrivateName,
    ) -> Option<&'a PrivateElement> {
        ctx.object(self)
            .private_elements
            .iter()
            .find(|element| element.key == *name)
    }

    /// ### [7.3.27 PrivateFieldAdd ( O, P, value )](https://tc39.es/ecma262/#sec-privatefieldadd)
    pub fn private_field_add(
        self,
        ctx: &mut Context,
        name: PrivateName,
        value: Value,
    ) -> VmResult<()> {
        // 2. Let entry be PrivateElementFind(O, P).
        // 3. If entry is not empty, throw a TypeError exception.
        if self.private_element_find(ctx, &name).is_some() {
            return Err(VmError::type_error(format!(
                "cannot initialize #{} twice on the same object",
                name.description()
            )));
        }

        // 4. Append PrivateElement { [[Key]]: P, [[Kind]]: field, [[Value]]: value }
        //    to O.[[PrivateElements]].
        ctx.object_mut(self)
            .private_elements
            .push(PrivateElement::field(name, value));
        Ok(())
    }

    /// ### [7.3.28 PrivateMethodOrAccessorAdd ( O, method )](https://tc39.es/ecma262/#sec-privatemethodoraccessoradd)
    ///
    /// # Panics
    ///
    /// If `method` is a field.
    pub fn private_method_or_accessor_add(
        self,
        ctx: &mut Context,
        method: PrivateElement,
    ) -> VmResult<()> {
        // 1. Assert: method.[[Kind]] is either method or accessor.
        assert_ne!(
            method.kind,
            PrivateElementKind::Field,
            "private fields are added with private_field_add"
        );

        // 3. Let entry be PrivateElementFind(O, method.[[Key]]).
        // 4. If entry is not empty, throw a TypeError exception.
        if self.private_element_find(ctx, &method.key).is_some() {
            return Err(VmError::type_error(format!(
                "cannot initialize #{} twice on the same object",
                method.key.description()
            )));
        }

        // 5. Append method to O.[[PrivateElements]].
        ctx.object_mut(self).private_elements.push(method);
        Ok(())
    }

    /// ### [7.3.31 PrivateGet ( O, P )](https://tc39.es/ecma262/#sec-privateget)
    pub fn private_get(self, ctx: &mut Context, name: &PrivateName) -> VmResult<Value> {
        // 1. Let entry be PrivateElementFind(O, P).
        // 2. If entry is empty, throw a TypeError exception.
        let Some(entry) = self.private_element_find(ctx, name) else {
            return Err(VmError::type_error(format!(
                "cannot read private member #{} from an object whose class did not declare it",
                name.description()
            )));
        };

        // 3. If entry.[[Kind]] is either field or method, then
        //    a. Return entry.[[Value]].
        let getter = match entry.value() {
            PropertyValue::Data(value) => return Ok(value.clone()),
            // 4. Assert: entry.[[Kind]] is accessor.
            // 5. If entry.[[Get]] is undefined, throw a TypeError exception.
            PropertyValue::Accessor(Accessor { getter: None, .. }) => {
                return Err(VmError::type_error(format!(
                    "'#{}' was defined without a getter",
                    name.description()
                )));
            }
            PropertyValue::Accessor(Accessor {
                getter: Some(getter),
                ..
            }) => *getter,
        };

        // 6. Let getter be entry.[[Get]].
        // 7. Return ? Call(getter, O).
        ctx.call(&Value::Object(getter), Value::Object(self), &[])
    }

    /// ### [7.3.32 PrivateSet ( O, P, value )](https://tc39.es/ecma262/#sec-privateset)
    pub fn private_set(self, ctx: &mut Context, name: &PrivateName, value: Value) -> VmResult<()> {
        let object = ctx.object_mut(self);
        // 1. Let entry be PrivateElementFind(O, P).
        // 2. If entry is empty, throw a TypeError exception.
        let Some(entry) = object
            .private_elements
            .iter_mut()
            .find(|element| element.key == *name)
        else {
            return Err(VmError::type_error(format!(
                "cannot write private member #{} to an object whose class did not declare it",
                name.description()
            )));
        };

        let setter = match entry.kind {
            // 3. If entry.[[Kind]] is field, then
            //    a. Set entry.[[Value]] to value.
            PrivateElementKind::Field => {
                entry.value = PropertyValue::Data(value);
                return Ok(());
            }
            // 4. Else if entry.[[Kind]] is method, then
            //    a. Throw a TypeError exception.
            PrivateElementKind::Method => {
                return Err(VmError::type_error(format!(
                    "private method #{} is not writable",
                    name.description()
                )));
            }
            // 5. Else,
            //    b. If entry.[[Set]] is undefined, throw a TypeError exception.
            PrivateElementKind::Accessor => match &entry.value {
                PropertyValue::Accessor(Accessor {
                    setter: Some(setter),
                    ..
                }) => *setter,
                _ => {
                    return Err(VmError::type_error(format!(
                        "'#{}' was defined without a setter",
                        name.description()
                    )));
                }
            },
        };

        //    c. Let setter be entry.[[Set]].
        //    d. Perform ? Call(setter, O, « value »).
        ctx.call(&Value::Object(setter), Value::Object(self), &[value])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::NativeFunction;
    use crate::object::Object;

    fn name(ctx: &mut Context, description: &str) -> PrivateName {
        PrivateName::new(ctx.intern(description))
    }

    #[test]
    fn test_private_names_compare_by_identity() {
        let mut ctx = Context::new();
        let a = name(&mut ctx, "x");
        let b = name(&mut ctx, "x");
        assert_eq!(a, a.clone());
        assert_ne!(a, b);

        let object = Object::create(&mut ctx, None);
        object.private_field_add(&mut ctx, a.clone(), Value::from(1)).unwrap();
        assert!(object.private_element_find(&ctx, &b).is_none());
        assert!(object.private_get(&mut ctx, &b).unwrap_err().is_type_error());
    }

    #[test]
    fn test_duplicate_field_keeps_first_value() {
        let mut ctx = Context::new();
        let x = name(&mut ctx, "x");
        let object = Object::create(&mut ctx, None);
        object.private_field_add(&mut ctx, x.clone(), Value::from(1)).unwrap();
        let error = object
            .private_field_add(&mut ctx, x.clone(), Value::from(2))
            .unwrap_err();
        assert!(error.is_type_error());
        assert_eq!(object.private_get(&mut ctx, &x).unwrap(), Value::from(1));
        assert_eq!(ctx.object(object).private_elements().len(), 1);
    }

    #[test]
    fn test_private_set_field() {
        let mut ctx = Context::new();
        let x = name(&mut ctx, "x");
        let object = Object::create(&mut ctx, None);
        object.private_field_add(&mut ctx, x.clone(), Value::from(1)).unwrap();
        object.private_set(&mut ctx, &x, Value::from(5)).unwrap();
        assert_eq!(object.private_get(&mut ctx, &x).unwrap(), Value::from(5));
    }

    #[test]
    fn test_private_method_is_read_only() {
        let mut ctx = Context::new();
        let m = name(&mut ctx, "m");
        let function = NativeFunction::create(&mut ctx, "#m", 0, |_, _, _| Ok(Value::from(7)));
        let object = Object::create(&mut ctx, None);
        object
            .private_method_or_accessor_add(&mut ctx, PrivateElement::method(m.clone(), function))
            .unwrap();
        assert_eq!(object.private_get(&mut ctx, &m).unwrap(), Value::Object(function));
        assert!(object.private_set(&mut ctx, &m, Value::Null).unwrap_err().is_type_error());
        assert!(
            object
                .private_method_or_accessor_add(&mut ctx, PrivateElement::method(m, function))
                .unwrap_err()
                .is_type_error()
        );
    }

    #[test]
    fn test_private_accessor_calls_with_object_as_this() {
        let mut ctx = Context::new();
        let a = name(&mut ctx, "a");
        let getter = NativeFunction::create(&mut ctx, "get #a", 0, |_, this, _| Ok(this));
        let object = Object::create(&mut ctx, None);
        let element = PrivateElement::accessor(a.clone(), Some(getter), None);
        object
            .private_method_or_accessor_add(&mut ctx, element)
            .unwrap();
        assert_eq!(object.private_get(&mut ctx, &a).unwrap(), Value::Object(object));
        assert!(object.private_set(&mut ctx, &a, Value::from(1)).unwrap_err().is_type_error());
    }

    #[test]
    #[should_panic(expected = "private_field_add")]
    fn test_method_add_rejects_fields() {
        let mut ctx = Context::new();
        let x = name(&mut ctx, "x");
        let object = Object::create(&mut ctx, None);
        let _ =
            object.private_method_or_accessor_add(&mut ctx, PrivateElement::field(x, Value::Null));
    }
}
