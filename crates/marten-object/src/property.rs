//! Property attributes, stored property values and descriptors

use crate::object::ObjectRef;
use crate::value::Value;

bitflags::bitflags! {
    /// Property attribute bits.
    ///
    /// `WRITABLE` is meaningless for accessor properties and is ignored there.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PropertyAttributes: u8 {
        /// Value can be changed by assignment
        const WRITABLE = 1 << 0;
        /// Visible to for-in and `Object.keys`
        const ENUMERABLE = 1 << 1;
        /// Can be deleted or have its attributes changed
        const CONFIGURABLE = 1 << 2;
    }
}

impl PropertyAttributes {
    /// Whether `WRITABLE` is set
    pub fn is_writable(self) -> bool {
        self.contains(Self::WRITABLE)
    }

    /// Whether `ENUMERABLE` is set
    pub fn is_enumerable(self) -> bool {
        self.contains(Self::ENUMERABLE)
    }

    /// Whether `CONFIGURABLE` is set
    pub fn is_configurable(self) -> bool {
        self.contains(Self::CONFIGURABLE)
    }
}

/// Attributes of a property created by plain assignment: all bits set.
impl Default for PropertyAttributes {
    fn default() -> Self {
        Self::all()
    }
}

/// Getter/setter pair of an accessor property
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Accessor {
    /// Getter function, if any
    pub getter: Option<ObjectRef>,
    /// Setter function, if any
    pub setter: Option<ObjectRef>,
}

/// What a property slot holds
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    /// Data property value
    Data(Value),
    /// Accessor property
    Accessor(Accessor),
}

impl Default for PropertyValue {
    fn default() -> Self {
        Self::Data(Value::Undefined)
    }
}

impl PropertyValue {
    /// Report every object handle held by this value
    pub(crate) fn for_each_object(&self, mut f: impl FnMut(ObjectRef)) {
        match self {
            Self::Data(Value::Object(object)) => f(*object),
            Self::Data(_) => {}
            Self::Accessor(accessor) => {
                accessor.getter.into_iter().chain(accessor.setter).for_each(f);
            }
        }
    }
}

/// A stored property: value plus attributes
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValueAndAttributes {
    /// Stored value
    pub value: PropertyValue,
    /// Attribute bits
    pub attributes: PropertyAttributes,
}

impl ValueAndAttributes {
    /// A data property
    pub fn data(value: Value, attributes: PropertyAttributes) -> Self {
        Self {
            value: PropertyValue::Data(value),
            attributes,
        }
    }

    /// An accessor property
    pub fn accessor(accessor: Accessor, attributes: PropertyAttributes) -> Self {
        Self {
            value: PropertyValue::Accessor(accessor),
            attributes,
        }
    }

    /// Build storage from a descriptor, filling absent fields with defaults
    pub fn from_descriptor(descriptor: &PropertyDescriptor) -> Self {
        let mut descriptor = descriptor.clone();
        descriptor.complete();
        let attributes = descriptor.attributes();
        if descriptor.is_accessor() {
            Self::accessor(
                Accessor {
                    getter: descriptor.get.flatten(),
                    setter: descriptor.set.flatten(),
                },
                attributes,
            )
        } else {
            Self::data(descriptor.value.unwrap_or_default(), attributes)
        }
    }
}

/// A property descriptor with every field optional.
///
/// `None` means "absent"; for `get`/`set`, `Some(None)` means "present and
/// undefined". Absent fields are left untouched when the descriptor is merged
/// onto an existing property.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PropertyDescriptor {
    /// `[[Value]]`
    pub value: Option<Value>,
    /// `[[Writable]]`
    pub writable: Option<bool>,
    /// `[[Get]]`
    pub get: Option<Option<ObjectRef>>,
    /// `[[Set]]`
    pub set: Option<Option<ObjectRef>>,
    /// `[[Enumerable]]`
    pub enumerable: Option<bool>,
    /// `[[Configurable]]`
    pub configurable: Option<bool>,
}

impl PropertyDescriptor {
    /// Fully populated data descriptor
    pub fn data(value: Value, attributes: PropertyAttributes) -> Self {
        Self {
            value: Some(value),
            writable: Some(attributes.is_writable()),
            enumerable: Some(attributes.is_enumerable()),
            configurable: Some(attributes.is_configurable()),
            ..Default::default()
        }
    }

    /// Fully populated accessor descriptor
    pub fn accessor(
        getter: Option<ObjectRef>,
        setter: Option<ObjectRef>,
        attributes: PropertyAttributes,
    ) -> Self {
        Self {
            get: Some(getter),
            set: Some(setter),
            enumerable: Some(attributes.is_enumerable()),
            configurable: Some(attributes.is_configurable()),
            ..Default::default()
        }
    }

    /// Descriptor carrying only `[[Value]]`
    pub fn value_only(value: Value) -> Self {
        Self {
            value: Some(value),
            ..Default::default()
        }
    }

    /// IsAccessorDescriptor
    pub fn is_accessor(&self) -> bool {
        self.get.is_some() || self.set.is_some()
    }

    /// IsDataDescriptor
    pub fn is_data(&self) -> bool {
        self.value.is_some() || self.writable.is_some()
    }

    /// IsGenericDescriptor
    pub fn is_generic(&self) -> bool {
        !self.is_accessor() && !self.is_data()
    }

    /// Whether any field is present
    pub fn has_fields(&self) -> bool {
        self.value.is_some()
            || self.writable.is_some()
            || self.get.is_some()
            || self.set.is_some()
            || self.enumerable.is_some()
            || self.configurable.is_some()
    }

    /// Whether every field relevant to the descriptor's kind is present
    pub fn is_fully_populated(&self) -> bool {
        let kind_fields = if self.is_accessor() {
            self.get.is_some() && self.set.is_some()
        } else {
            self.value.is_some() && self.writable.is_some()
        };
        kind_fields && self.enumerable.is_some() && self.configurable.is_some()
    }

    /// CompletePropertyDescriptor
    pub fn complete(&mut self) {
        if self.is_generic() || self.is_data() {
            self.value.get_or_insert(Value::Undefined);
            self.writable.get_or_insert(false);
        } else {
            self.get.get_or_insert(None);
            self.set.get_or_insert(None);
        }
        self.enumerable.get_or_insert(false);
        self.configurable.get_or_insert(false);
    }

    /// Attribute bits; absent fields read as `false`
    pub fn attributes(&self) -> PropertyAttributes {
        let mut attributes = PropertyAttributes::empty();
        attributes.set(PropertyAttributes::WRITABLE, self.writable == Some(true));
        attributes.set(PropertyAttributes::ENUMERABLE, self.enumerable == Some(true));
        attributes.set(PropertyAttributes::CONFIGURABLE, self.configurable == Some(true));
        attributes
    }

    /// Overlay the present fields of `self` onto `current`
    pub fn merged_onto(&self, current: &PropertyDescriptor) -> PropertyDescriptor {
        PropertyDescriptor {
            value: self.value.clone().or_else(|| current.value.clone()),
            writable: self.writable.or(current.writable),
            get: self.get.or(current.get),
            set: self.set.or(current.set),
            enumerable: self.enumerable.or(current.enumerable),
            configurable: self.configurable.or(current.configurable),
        }
    }
}

impl From<&ValueAndAttributes> for PropertyDescriptor {
    fn from(stored: &ValueAndAttributes) -> Self {
        match &stored.value {
            PropertyValue::Data(value) => Self::data(value.clone(), stored.attributes),
            PropertyValue::Accessor(accessor) => {
                Self::accessor(accessor.getter, accessor.setter, stored.attributes)
            }
        }
    }
}
