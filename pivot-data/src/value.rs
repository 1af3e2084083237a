//! FILENAME: pivot-data/src/value.rs
//! Dimension values - the elements of row and column keys.
//!
//! A `KeyValue` is hashable and totally ordered so keys can be used as map
//! keys and sorted with native (never locale-aware) comparison:
//! Empty < Number < Text < Boolean, then by value within a type.

use std::cmp::Ordering;
use std::fmt;
use serde::{Deserialize, Serialize};

// ============================================================================
// ORDERED FLOAT
// ============================================================================

/// Wrapper around f64 that implements Eq and Hash for use as map keys.
/// NaN values are treated as equal to each other, and -0.0 equals 0.0.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OrderedFloat(pub f64);

impl OrderedFloat {
    pub fn as_f64(&self) -> f64 {
        self.0
    }

    /// The value with -0.0 folded into 0.0, so equal values share one bit pattern.
    pub fn normalized(&self) -> f64 {
        if self.0 == 0.0 {
            0.0
        } else {
            self.0
        }
    }
}

impl PartialEq for OrderedFloat {
    fn eq(&self, other: &Self) -> bool {
        if self.0.is_nan() && other.0.is_nan() {
            true
        } else {
            self.0 == other.0
        }
    }
}

impl Eq for OrderedFloat {}

impl std::hash::Hash for OrderedFloat {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        if self.0.is_nan() {
            // All NaN values hash to the same thing
            u64::MAX.hash(state);
        } else {
            self.normalized().to_bits().hash(state);
        }
    }
}

impl PartialOrd for OrderedFloat {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedFloat {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.0.is_nan(), other.0.is_nan()) {
            (true, true) => Ordering::Equal,
            // NaN sorts after every number
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => self.0.partial_cmp(&other.0).unwrap_or(Ordering::Equal),
        }
    }
}

// ============================================================================
// KEY VALUE
// ============================================================================

/// One dimension value (one element of a row or column key).
///
/// Serialized untagged, so a key reads as a plain JSON array such as
/// `["East", 2024, null]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyValue {
    Empty,
    Boolean(bool),
    Number(OrderedFloat),
    Text(String),
}

impl KeyValue {
    pub fn text(s: impl Into<String>) -> Self {
        KeyValue::Text(s.into())
    }

    pub fn number(n: f64) -> Self {
        KeyValue::Number(OrderedFloat(n))
    }

    /// Numeric reading of this value, the way aggregators consume it.
    /// Text that parses as a number counts; everything else is non-numeric.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            KeyValue::Number(n) if !n.0.is_nan() => Some(n.0),
            KeyValue::Text(s) => s.trim().parse::<f64>().ok().filter(|n| !n.is_nan()),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, KeyValue::Empty)
    }

    fn type_rank(&self) -> u8 {
        match self {
            KeyValue::Empty => 0,
            KeyValue::Number(_) => 1,
            KeyValue::Text(_) => 2,
            KeyValue::Boolean(_) => 3,
        }
    }
}

impl PartialOrd for KeyValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for KeyValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (KeyValue::Empty, KeyValue::Empty) => Ordering::Equal,
            (KeyValue::Number(a), KeyValue::Number(b)) => a.cmp(b),
            (KeyValue::Text(a), KeyValue::Text(b)) => a.cmp(b),
            (KeyValue::Boolean(a), KeyValue::Boolean(b)) => a.cmp(b),
            _ => self.type_rank().cmp(&other.type_rank()),
        }
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::Empty => f.write_str("null"),
            KeyValue::Boolean(b) => write!(f, "{}", b),
            KeyValue::Number(n) => {
                let v = n.normalized();
                if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 {
                    write!(f, "{:.0}", v)
                } else {
                    write!(f, "{}", v)
                }
            }
            KeyValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for KeyValue {
    fn from(s: &str) -> Self {
        KeyValue::Text(s.to_string())
    }
}

impl From<String> for KeyValue {
    fn from(s: String) -> Self {
        KeyValue::Text(s)
    }
}

impl From<f64> for KeyValue {
    fn from(n: f64) -> Self {
        KeyValue::number(n)
    }
}

impl From<i64> for KeyValue {
    fn from(n: i64) -> Self {
        KeyValue::number(n as f64)
    }
}

impl From<bool> for KeyValue {
    fn from(b: bool) -> Self {
        KeyValue::Boolean(b)
    }
}

impl<T: Into<KeyValue>> From<Option<T>> for KeyValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(KeyValue::Empty, Into::into)
    }
}
