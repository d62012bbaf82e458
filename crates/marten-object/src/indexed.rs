//! Storage for integer-indexed properties.
//!
//! Index keys never go through the shape table. While every element is a
//! plain data property with default attributes and writes stay near the end
//! of the array, elements live in a dense `Vec`. Anything else (an accessor,
//! non-default attributes, a write far past the end, or an object declaring
//! that it may interfere with indexed access) switches to a sorted sparse
//! map. The switch is one-way and not observable.

use crate::property::{PropertyAttributes, PropertyValue, ValueAndAttributes};
use crate::value::Value;
use std::collections::BTreeMap;

/// Largest gap past the current end a dense store tolerates before going sparse
pub const SPARSE_ARRAY_HOLE_THRESHOLD: usize = 200;

/// Integer-keyed element storage
#[derive(Clone, Debug)]
pub enum IndexedStorage {
    /// Default-attribute data elements; `None` is a hole
    Dense(Vec<Option<Value>>),
    /// Arbitrary elements, ascending by index
    Sparse(BTreeMap<u32, ValueAndAttributes>),
}

impl Default for IndexedStorage {
    fn default() -> Self {
        Self::Dense(Vec::new())
    }
}

impl IndexedStorage {
    /// Empty dense storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty sparse storage
    pub fn sparse() -> Self {
        Self::Sparse(BTreeMap::new())
    }

    /// Dense storage holding `values` at indices `0..`
    pub fn from_values(values: impl IntoIterator<Item = Value>) -> Self {
        Self::Dense(values.into_iter().map(Some).collect())
    }

    /// Whether the dense fast path is in use
    pub fn is_dense(&self) -> bool {
        matches!(self, Self::Dense(_))
    }

    /// Get the element at `index`
    pub fn get(&self, index: u32) -> Option<ValueAndAttributes> {
        match self {
            Self::Dense(elements) => elements
                .get(index as usize)
                .and_then(Option::as_ref)
                .map(|value| {
                    ValueAndAttributes::data(value.clone(), PropertyAttributes::default())
                }),
            Self::Sparse(elements) => elements.get(&index).cloned(),
        }
    }

    /// Whether an element exists at `index`
    pub fn has(&self, index: u32) -> bool {
        match self {
            Self::Dense(elements) => matches!(elements.get(index as usize), Some(Some(_))),
            Self::Sparse(elements) => elements.contains_key(&index),
        }
    }

    /// Insert or overwrite the element at `index`
    pub fn put(&mut self, index: u32, element: ValueAndAttributes) {
        if let Self::Dense(elements) = self {
            let fits_dense = element.attributes == PropertyAttributes::default()
                && (index as usize) < elements.len() + SPARSE_ARRAY_HOLE_THRESHOLD;
            if fits_dense && let PropertyValue::Data(value) = &element.value {
                let slot = index as usize;
                if slot >= elements.len() {
                    elements.resize(slot + 1, None);
                }
                elements[slot] = Some(value.clone());
                return;
            }
            self.switch_to_sparse();
        }
        if let Self::Sparse(elements) = self {
            elements.insert(index, element);
        }
    }

    /// Remove the element at `index`, returning whether one existed
    pub fn remove(&mut self, index: u32) -> bool {
        match self {
            Self::Dense(elements) => {
                let Some(slot) = elements.get_mut(index as usize) else {
                    return false;
                };
                let existed = slot.take().is_some();
                while matches!(elements.last(), Some(None)) {
                    elements.pop();
                }
                existed
            }
            Self::Sparse(elements) => elements.remove(&index).is_some(),
        }
    }

    /// Indices of present elements, ascending
    pub fn indices(&self) -> Vec<u32> {
        match self {
            Self::Dense(elements) => elements
                .iter()
                .enumerate()
                .filter(|(_, element)| element.is_some())
                .map(|(index, _)| index as u32)
                .collect(),
            Self::Sparse(elements) => elements.keys().copied().collect(),
        }
    }

    /// Number of present elements
    pub fn len(&self) -> usize {
        match self {
            Self::Dense(elements) => elements.iter().filter(|element| element.is_some()).count(),
            Self::Sparse(elements) => elements.len(),
        }
    }

    /// Whether no element is present
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// One past the highest present index
    pub fn array_like_size(&self) -> u64 {
        match self {
            Self::Dense(elements) => elements.len() as u64,
            Self::Sparse(elements) => elements
                .last_key_value()
                .map_or(0, |(index, _)| *index as u64 + 1),
        }
    }

    /// Visit every stored value
    pub(crate) fn values(&self) -> Box<dyn Iterator<Item = PropertyValue> + '_> {
        match self {
            Self::Dense(elements) => Box::new(
                elements
                    .iter()
                    .flatten()
                    .map(|value| PropertyValue::Data(value.clone())),
            ),
            Self::Sparse(elements) => {
                Box::new(elements.values().map(|element| element.value.clone()))
            }
        }
    }

    fn switch_to_sparse(&mut self) {
        if let Self::Dense(elements) = self {
            let sparse = std::mem::take(elements)
                .into_iter()
                .enumerate()
                .filter_map(|(index, value)| {
                    value.map(|value| {
                        (
                            index as u32,
                            ValueAndAttributes::data(value, PropertyAttributes::default()),
                        )
                    })
                })
                .collect();
            *self = Self::Sparse(sparse);
            tracing::trace!(target: "marten::object", "indexed storage switched to sparse");
        }
    }
}
