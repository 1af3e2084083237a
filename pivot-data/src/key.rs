//! FILENAME: pivot-data/src/key.rs
//! Row/column keys: ordered sequences of dimension values.

use std::ops::Deref;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::value::KeyValue;

/// Inline capacity covers the usual row/column attribute depth without allocating.
pub type KeyValues = SmallVec<[KeyValue; 4]>;

/// An ordered sequence of dimension values, one per attribute level.
///
/// A full-length key identifies one leaf row or column. A shorter key is a
/// partial (subtotal) key, and the empty key stands for "all values".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Key(KeyValues);

impl Key {
    pub fn new(values: KeyValues) -> Self {
        Key(values)
    }

    /// The empty key (grand total / "all values").
    pub fn empty() -> Self {
        Key(SmallVec::new())
    }

    /// Returns the first `len` elements as a new key (clamped to this key's length).
    pub fn prefix(&self, len: usize) -> Key {
        let len = len.min(self.0.len());
        Key(self.0[..len].iter().cloned().collect())
    }

    pub fn values(&self) -> &[KeyValue] {
        &self.0
    }

    pub fn last_value(&self) -> Option<&KeyValue> {
        self.0.last()
    }

    pub fn push(&mut self, value: KeyValue) {
        self.0.push(value);
    }
}

impl Deref for Key {
    type Target = [KeyValue];

    fn deref(&self) -> &[KeyValue] {
        &self.0
    }
}

impl AsRef<[KeyValue]> for Key {
    fn as_ref(&self) -> &[KeyValue] {
        &self.0
    }
}

impl From<&[KeyValue]> for Key {
    fn from(values: &[KeyValue]) -> Self {
        Key(values.iter().cloned().collect())
    }
}

impl From<Vec<KeyValue>> for Key {
    fn from(values: Vec<KeyValue>) -> Self {
        Key(SmallVec::from_vec(values))
    }
}

impl<T: Into<KeyValue>> FromIterator<T> for Key {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Key(iter.into_iter().map(Into::into).collect())
    }
}
