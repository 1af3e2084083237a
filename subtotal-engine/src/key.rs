//! FILENAME: subtotal-engine/src/key.rs
//! Key hierarchy helpers: prefixes, depth tests, ancestor collapse, identity.

use std::cmp::Ordering;
use std::fmt;

use pivot_data::{Key, KeyValue};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::collapse::CollapseState;

// ============================================================================
// KEY IDENTITY
// ============================================================================

/// Canonical string form of a key, used for set membership and memoization.
///
/// The encoding is an order-sensitive JSON array of the key's elements:
/// - text becomes a JSON string, booleans a JSON bool, empty values `null`
/// - finite numbers become JSON numbers (`-0.0` is written as `0`)
/// - non-finite numbers become a tagged object such as `{"$num":"NaN"}`
///
/// So the number `1` and the text `"1"` never share an identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyIdentity(String);

impl KeyIdentity {
    pub fn of(key: &[KeyValue]) -> Self {
        let elements: Vec<Value> = key.iter().map(encode_value).collect();
        KeyIdentity(Value::Array(elements).to_string())
    }

    /// Identity of the empty key.
    pub fn root() -> Self {
        KeyIdentity::of(&[])
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&Key> for KeyIdentity {
    fn from(key: &Key) -> Self {
        KeyIdentity::of(key)
    }
}

fn encode_value(value: &KeyValue) -> Value {
    match value {
        KeyValue::Empty => Value::Null,
        KeyValue::Boolean(b) => Value::Bool(*b),
        KeyValue::Text(s) => Value::String(s.clone()),
        KeyValue::Number(n) => {
            let v = n.normalized();
            match Number::from_f64(v) {
                Some(num) => Value::Number(num),
                None => {
                    let tag = if v.is_nan() {
                        "NaN"
                    } else if v > 0.0 {
                        "inf"
                    } else {
                        "-inf"
                    };
                    let mut tagged = Map::new();
                    tagged.insert("$num".to_string(), Value::String(tag.to_string()));
                    Value::Object(tagged)
                }
            }
        }
    }
}

// ============================================================================
// HIERARCHY FUNCTIONS
// ============================================================================

/// All prefixes of `key` of length 1..=len, shortest first.
pub fn prefixes(key: &[KeyValue]) -> Vec<Key> {
    (1..=key.len()).map(|len| Key::from(&key[..len])).collect()
}

/// Whether `key` is shorter than the full attribute depth.
/// A depth of zero means no subtotal is possible.
pub fn is_subtotal_key(key: &[KeyValue], max_depth: usize) -> bool {
    key.len() < max_depth
}

/// True if any strict prefix of `key` is collapsed.
pub fn has_collapsed_ancestor<C: CollapseState + ?Sized>(key: &[KeyValue], collapse: &C) -> bool {
    if key.len() <= 1 || collapse.is_empty() {
        return false;
    }
    (1..key.len()).any(|level| collapse.has(&KeyIdentity::of(&key[..level])))
}

/// Element-wise prefix match. The empty partial key matches every leaf.
pub fn matches_prefix(leaf: &[KeyValue], partial: &[KeyValue]) -> bool {
    partial.len() <= leaf.len() && leaf[..partial.len()] == *partial
}

/// Native element ordering over the shared length, then shorter keys first.
pub fn compare_keys(a: &[KeyValue], b: &[KeyValue]) -> Ordering {
    for (x, y) in a.iter().zip(b.iter()) {
        match x.cmp(y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    a.len().cmp(&b.len())
}

/// Elements `0..=level` of both keys agree. A missing element only agrees
/// with another missing element.
pub fn agree_through(a: &[KeyValue], b: &[KeyValue], level: usize) -> bool {
    (0..=level).all(|x| a.get(x) == b.get(x))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collapse::CollapseSet;

    fn key(parts: &[&str]) -> Key {
        parts.iter().copied().collect()
    }

    #[test]
    fn test_prefixes() {
        let k = key(&["A", "B", "C"]);
        let p = prefixes(&k);
        assert_eq!(p, vec![key(&["A"]), key(&["A", "B"]), key(&["A", "B", "C"])]);
        assert!(prefixes(&[]).is_empty());
    }

    #[test]
    fn test_is_subtotal_key() {
        assert!(is_subtotal_key(&key(&["A"]), 2));
        assert!(!is_subtotal_key(&key(&["A", "x"]), 2));
        assert!(!is_subtotal_key(&key(&["A"]), 0));
        assert!(!is_subtotal_key(&[], 0));
    }

    #[test]
    fn test_identity_distinguishes_types() {
        let text_one = KeyIdentity::of(&[KeyValue::text("1")]);
        let num_one = KeyIdentity::of(&[KeyValue::number(1.0)]);
        assert_ne!(text_one, num_one);
        assert_eq!(text_one.as_str(), r#"["1"]"#);

        let nan = KeyIdentity::of(&[KeyValue::number(f64::NAN)]);
        let empty = KeyIdentity::of(&[KeyValue::Empty]);
        assert_ne!(nan, empty);
        assert_eq!(empty.as_str(), "[null]");
    }

    #[test]
    fn test_identity_normalizes_negative_zero() {
        assert_eq!(
            KeyIdentity::of(&[KeyValue::number(-0.0)]),
            KeyIdentity::of(&[KeyValue::number(0.0)])
        );
    }

    #[test]
    fn test_identity_is_order_sensitive() {
        assert_ne!(KeyIdentity::of(&key(&["A", "B"])), KeyIdentity::of(&key(&["B", "A"])));
        assert_eq!(KeyIdentity::root().as_str(), "[]");
    }

    #[test]
    fn test_has_collapsed_ancestor() {
        let mut collapse = CollapseSet::new();
        collapse.toggle(KeyIdentity::of(&key(&["A"])));

        assert!(has_collapsed_ancestor(&key(&["A", "x"]), &collapse));
        assert!(has_collapsed_ancestor(&key(&["A", "x", "1"]), &collapse));
        // The collapsed group itself is not hidden
        assert!(!has_collapsed_ancestor(&key(&["A"]), &collapse));
        assert!(!has_collapsed_ancestor(&key(&["B", "x"]), &collapse));
    }

    #[test]
    fn test_matches_prefix() {
        let leaf = key(&["A", "x"]);
        assert!(matches_prefix(&leaf, &[]));
        assert!(matches_prefix(&leaf, &key(&["A"])));
        assert!(matches_prefix(&leaf, &leaf));
        assert!(!matches_prefix(&leaf, &key(&["B"])));
        assert!(!matches_prefix(&key(&["A"]), &leaf));
    }

    #[test]
    fn test_compare_keys() {
        assert_eq!(compare_keys(&key(&["A"]), &key(&["A", "x"])), Ordering::Less);
        assert_eq!(compare_keys(&key(&["A", "z"]), &key(&["B"])), Ordering::Less);
        assert_eq!(compare_keys(&key(&["B"]), &key(&["B"])), Ordering::Equal);
    }

    #[test]
    fn test_agree_through() {
        let a = key(&["A", "x"]);
        let b = key(&["A", "y"]);
        assert!(agree_through(&a, &b, 0));
        assert!(!agree_through(&a, &b, 1));
        assert!(!agree_through(&key(&["A"]), &a, 1));
        assert!(agree_through(&key(&["A"]), &key(&["A"]), 3));
    }
}
