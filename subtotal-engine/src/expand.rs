//! FILENAME: subtotal-engine/src/expand.rs
//! Subtotal Expander - turns flat leaf keys into display items.
//!
//! Subtotal markers are inserted for every prefix level of the key
//! hierarchy. Visibility is resolved here as well: any item with a collapsed
//! strict ancestor is left out, while the collapsed group's own marker is
//! still emitted so its toggle stays reachable.

use pivot_data::{Key, KeyValue};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::collapse::CollapseState;
use crate::key::{compare_keys, has_collapsed_ancestor, KeyIdentity};

// ============================================================================
// DISPLAY ITEM
// ============================================================================

/// One row or column of the rendered table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayItem {
    pub key: Key,
    pub is_subtotal: bool,
    /// Key length.
    pub level: usize,
    pub is_collapsed: bool,
    /// `"<last value> Subtotal"` for subtotal items.
    pub label: Option<String>,
}

impl DisplayItem {
    pub fn leaf(key: Key) -> Self {
        let level = key.len();
        DisplayItem {
            key,
            is_subtotal: false,
            level,
            is_collapsed: false,
            label: None,
        }
    }

    pub fn subtotal(key: Key, is_collapsed: bool) -> Self {
        let level = key.len();
        let label = Some(subtotal_label(&key));
        DisplayItem {
            key,
            is_subtotal: true,
            level,
            is_collapsed,
            label,
        }
    }

    pub fn identity(&self) -> KeyIdentity {
        KeyIdentity::of(&self.key)
    }
}

pub fn subtotal_label(key: &[KeyValue]) -> String {
    match key.last() {
        Some(value) => format!("{} Subtotal", value),
        None => "Subtotal".to_string(),
    }
}

// ============================================================================
// ORDERING
// ============================================================================

/// Where subtotal markers land relative to their group's members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubtotalOrdering {
    /// Marker before the first member of its group.
    PrefixFirst,
    /// Marker after the last member of its group, deepest level first.
    PrefixLast,
    /// Every distinct partial key, sorted by element order then depth.
    DistinctSorted,
}

impl Default for SubtotalOrdering {
    fn default() -> Self {
        SubtotalOrdering::PrefixFirst
    }
}

// ============================================================================
// EXPANDER
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubtotalExpander {
    attr_count: usize,
    ordering: SubtotalOrdering,
}

impl SubtotalExpander {
    /// Expander that emits each group's marker before its members.
    pub fn new(attr_count: usize) -> Self {
        Self::with_ordering(attr_count, SubtotalOrdering::PrefixFirst)
    }

    pub fn prefix_last(attr_count: usize) -> Self {
        Self::with_ordering(attr_count, SubtotalOrdering::PrefixLast)
    }

    pub fn distinct_sorted(attr_count: usize) -> Self {
        Self::with_ordering(attr_count, SubtotalOrdering::DistinctSorted)
    }

    pub fn with_ordering(attr_count: usize, ordering: SubtotalOrdering) -> Self {
        SubtotalExpander {
            attr_count,
            ordering,
        }
    }

    pub fn attr_count(&self) -> usize {
        self.attr_count
    }

    pub fn ordering(&self) -> SubtotalOrdering {
        self.ordering
    }

    /// Expands `leaf_keys` (in data source order) into display items.
    pub fn expand<C: CollapseState + ?Sized>(&self, leaf_keys: &[Key], collapse: &C) -> Vec<DisplayItem> {
        if self.attr_count <= 1 {
            return leaf_keys.iter().cloned().map(DisplayItem::leaf).collect();
        }

        match self.ordering {
            SubtotalOrdering::PrefixFirst => self.expand_prefix_first(leaf_keys, collapse),
            SubtotalOrdering::PrefixLast => self.expand_prefix_last(leaf_keys, collapse),
            SubtotalOrdering::DistinctSorted => self.expand_distinct_sorted(leaf_keys, collapse),
        }
    }

    /// Deepest level that gets a subtotal marker for `key`, exclusive.
    fn depth(&self, key: &[KeyValue]) -> usize {
        self.attr_count.min(key.len())
    }

    fn expand_prefix_first<C: CollapseState + ?Sized>(&self, leaf_keys: &[Key], collapse: &C) -> Vec<DisplayItem> {
        let mut result = Vec::with_capacity(leaf_keys.len() * 2);
        let mut emitted: FxHashSet<KeyIdentity> = FxHashSet::default();

        for leaf in leaf_keys {
            for level in 1..self.depth(leaf) {
                let partial = leaf.prefix(level);
                let identity = KeyIdentity::of(&partial);
                if !emitted.insert(identity.clone()) {
                    continue;
                }
                if has_collapsed_ancestor(&partial, collapse) {
                    continue;
                }
                let collapsed = collapse.has(&identity);
                result.push(DisplayItem::subtotal(partial, collapsed));
            }

            if !has_collapsed_ancestor(leaf, collapse) {
                result.push(DisplayItem::leaf(leaf.clone()));
            }
        }

        result
    }

    fn expand_prefix_last<C: CollapseState + ?Sized>(&self, leaf_keys: &[Key], collapse: &C) -> Vec<DisplayItem> {
        let mut result = Vec::with_capacity(leaf_keys.len() * 2);
        let mut emitted: FxHashSet<KeyIdentity> = FxHashSet::default();

        for (i, leaf) in leaf_keys.iter().enumerate() {
            if !has_collapsed_ancestor(leaf, collapse) {
                result.push(DisplayItem::leaf(leaf.clone()));
            }

            let next = leaf_keys.get(i + 1);
            for level in (1..self.depth(leaf)).rev() {
                let group_continues = next
                    .map(|n| n.len() >= level && n[..level] == leaf[..level])
                    .unwrap_or(false);
                if group_continues {
                    continue;
                }

                let partial = leaf.prefix(level);
                let identity = KeyIdentity::of(&partial);
                if !emitted.insert(identity.clone()) {
                    continue;
                }
                if has_collapsed_ancestor(&partial, collapse) {
                    continue;
                }
                let collapsed = collapse.has(&identity);
                result.push(DisplayItem::subtotal(partial, collapsed));
            }
        }

        result
    }

    fn expand_distinct_sorted<C: CollapseState + ?Sized>(&self, leaf_keys: &[Key], collapse: &C) -> Vec<DisplayItem> {
        let mut seen: FxHashSet<KeyIdentity> = FxHashSet::default();
        // (partial key, is_subtotal) in first-seen order
        let mut partials: Vec<(Key, bool)> = Vec::new();

        for leaf in leaf_keys {
            let depth = self.depth(leaf);
            for level in 1..=depth {
                let partial = leaf.prefix(level);
                if seen.insert(KeyIdentity::of(&partial)) {
                    partials.push((partial, level < self.attr_count));
                }
            }
        }

        partials.sort_by(|(a, _), (b, _)| compare_keys(a, b));

        partials
            .into_iter()
            .filter(|(partial, _)| !has_collapsed_ancestor(partial, collapse))
            .map(|(partial, is_subtotal)| {
                if is_subtotal {
                    let collapsed = collapse.has(&KeyIdentity::of(&partial));
                    DisplayItem::subtotal(partial, collapsed)
                } else {
                    DisplayItem::leaf(partial)
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collapse::CollapseSet;

    fn key(parts: &[&str]) -> Key {
        parts.iter().copied().collect()
    }

    fn keys(items: &[DisplayItem]) -> Vec<Key> {
        items.iter().map(|item| item.key.clone()).collect()
    }

    fn sample_rows() -> Vec<Key> {
        vec![key(&["A", "x"]), key(&["A", "y"]), key(&["B", "z"])]
    }

    #[test]
    fn test_single_level_is_passthrough() {
        let leaves = vec![key(&["A"]), key(&["B"])];
        let items = SubtotalExpander::new(1).expand(&leaves, &CollapseSet::new());
        assert_eq!(keys(&items), leaves);
        assert!(items.iter().all(|i| !i.is_subtotal));
    }

    #[test]
    fn test_prefix_first() {
        let items = SubtotalExpander::new(2).expand(&sample_rows(), &CollapseSet::new());
        assert_eq!(
            keys(&items),
            vec![key(&["A"]), key(&["A", "x"]), key(&["A", "y"]), key(&["B"]), key(&["B", "z"])]
        );
        assert!(items[0].is_subtotal);
        assert_eq!(items[0].label.as_deref(), Some("A Subtotal"));
        assert_eq!(items[0].level, 1);
        assert!(!items[1].is_subtotal);
        assert_eq!(items[1].label, None);
    }

    #[test]
    fn test_prefix_first_collapsed() {
        let mut collapse = CollapseSet::new();
        collapse.toggle(KeyIdentity::of(&key(&["A"])));

        let items = SubtotalExpander::new(2).expand(&sample_rows(), &collapse);
        assert_eq!(keys(&items), vec![key(&["A"]), key(&["B"]), key(&["B", "z"])]);
        assert!(items[0].is_collapsed);
        assert!(!items[1].is_collapsed);
    }

    #[test]
    fn test_prefix_first_hides_nested_markers() {
        let leaves = vec![key(&["A", "x", "1"]), key(&["A", "x", "2"]), key(&["A", "y", "1"])];
        let mut collapse = CollapseSet::new();
        collapse.toggle(KeyIdentity::of(&key(&["A"])));

        let items = SubtotalExpander::new(3).expand(&leaves, &collapse);
        assert_eq!(keys(&items), vec![key(&["A"])]);
    }

    #[test]
    fn test_prefix_last() {
        let items = SubtotalExpander::prefix_last(2).expand(&sample_rows(), &CollapseSet::new());
        assert_eq!(
            keys(&items),
            vec![key(&["A", "x"]), key(&["A", "y"]), key(&["A"]), key(&["B", "z"]), key(&["B"])]
        );
    }

    #[test]
    fn test_prefix_last_deepest_first() {
        let leaves = vec![key(&["A", "x", "1"]), key(&["A", "y", "1"])];
        let items = SubtotalExpander::prefix_last(3).expand(&leaves, &CollapseSet::new());
        assert_eq!(
            keys(&items),
            vec![
                key(&["A", "x", "1"]),
                key(&["A", "x"]),
                key(&["A", "y", "1"]),
                key(&["A", "y"]),
                key(&["A"]),
            ]
        );
    }

    #[test]
    fn test_distinct_sorted() {
        let leaves = vec![key(&["B", "z"]), key(&["A", "y"]), key(&["A", "x"])];
        let items = SubtotalExpander::distinct_sorted(2).expand(&leaves, &CollapseSet::new());
        assert_eq!(
            keys(&items),
            vec![key(&["A"]), key(&["A", "x"]), key(&["A", "y"]), key(&["B"]), key(&["B", "z"])]
        );
        assert!(items[0].is_subtotal);
        assert!(!items[1].is_subtotal);
    }

    #[test]
    fn test_distinct_sorted_collapsed() {
        let mut collapse = CollapseSet::new();
        collapse.toggle(KeyIdentity::of(&key(&["B"])));

        let items = SubtotalExpander::distinct_sorted(2).expand(&sample_rows(), &collapse);
        assert_eq!(
            keys(&items),
            vec![key(&["A"]), key(&["A", "x"]), key(&["A", "y"]), key(&["B"])]
        );
        assert!(items[3].is_collapsed);
    }

    #[test]
    fn test_distinct_sorted_short_key_is_subtotal_in_any_order() {
        let forward = vec![key(&["A"]), key(&["A", "x"])];
        let reversed = vec![key(&["A", "x"]), key(&["A"])];

        for leaves in [forward, reversed] {
            let items = SubtotalExpander::distinct_sorted(2).expand(&leaves, &CollapseSet::new());
            assert_eq!(keys(&items), vec![key(&["A"]), key(&["A", "x"])]);
            assert!(items[0].is_subtotal);
            assert_eq!(items[0].label.as_deref(), Some("A Subtotal"));
            assert!(!items[1].is_subtotal);
        }
    }

    #[test]
    fn test_depth_clamped_to_key_length() {
        // Configured depth exceeds the observed key length
        let leaves = vec![key(&["A", "x"])];
        let items = SubtotalExpander::new(5).expand(&leaves, &CollapseSet::new());
        assert_eq!(keys(&items), vec![key(&["A"]), key(&["A", "x"])]);
    }

    #[test]
    fn test_non_contiguous_groups_emit_one_marker() {
        let leaves = vec![key(&["A", "x"]), key(&["B", "y"]), key(&["A", "z"])];
        let items = SubtotalExpander::new(2).expand(&leaves, &CollapseSet::new());
        let markers = items.iter().filter(|i| i.is_subtotal).count();
        assert_eq!(markers, 2);

        let items = SubtotalExpander::prefix_last(2).expand(&leaves, &CollapseSet::new());
        let markers = items.iter().filter(|i| i.is_subtotal).count();
        assert_eq!(markers, 2);
    }

    #[test]
    fn test_numeric_label() {
        let item = DisplayItem::subtotal(vec![KeyValue::number(2024.0)].into(), false);
        assert_eq!(item.label.as_deref(), Some("2024 Subtotal"));
    }
}
