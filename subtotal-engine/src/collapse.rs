//! FILENAME: subtotal-engine/src/collapse.rs
//! Collapse state: which subtotal groups the user has folded.
//!
//! Toggling a group never touches its descendants. A collapsed parent hides
//! them structurally, so expanding it again restores whatever descendant
//! state existed before.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::key::KeyIdentity;

/// Which side of the table a key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    Row,
    Column,
}

/// Set of collapsed group identities.
pub trait CollapseState {
    /// Whether the group rooted at `identity` is collapsed.
    fn has(&self, identity: &KeyIdentity) -> bool;

    /// Flips membership of `identity`. Returns the new collapsed state.
    fn toggle(&mut self, identity: KeyIdentity) -> bool;

    /// Allows ancestor scans to be skipped when nothing is collapsed.
    fn is_empty(&self) -> bool {
        false
    }
}

// ============================================================================
// COLLAPSE SET
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollapseSet {
    collapsed: FxHashSet<KeyIdentity>,
}

impl CollapseSet {
    pub fn new() -> Self {
        CollapseSet::default()
    }

    pub fn len(&self) -> usize {
        self.collapsed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collapsed.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &KeyIdentity> {
        self.collapsed.iter()
    }

    pub fn clear(&mut self) {
        self.collapsed.clear();
    }
}

impl CollapseState for CollapseSet {
    fn has(&self, identity: &KeyIdentity) -> bool {
        self.collapsed.contains(identity)
    }

    fn toggle(&mut self, identity: KeyIdentity) -> bool {
        if self.collapsed.remove(&identity) {
            false
        } else {
            self.collapsed.insert(identity);
            true
        }
    }

    fn is_empty(&self) -> bool {
        self.collapsed.is_empty()
    }
}

impl FromIterator<KeyIdentity> for CollapseSet {
    fn from_iter<I: IntoIterator<Item = KeyIdentity>>(iter: I) -> Self {
        CollapseSet {
            collapsed: iter.into_iter().collect(),
        }
    }
}

// ============================================================================
// TABLE COLLAPSE
// ============================================================================

/// Independent row and column collapse sets of one table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCollapse {
    pub rows: CollapseSet,
    pub cols: CollapseSet,
}

impl TableCollapse {
    pub fn new() -> Self {
        TableCollapse::default()
    }

    pub fn axis(&self, axis: Axis) -> &CollapseSet {
        match axis {
            Axis::Row => &self.rows,
            Axis::Column => &self.cols,
        }
    }

    pub fn axis_mut(&mut self, axis: Axis) -> &mut CollapseSet {
        match axis {
            Axis::Row => &mut self.rows,
            Axis::Column => &mut self.cols,
        }
    }

    pub fn toggle(&mut self, axis: Axis, identity: KeyIdentity) -> bool {
        self.axis_mut(axis).toggle(identity)
    }

    pub fn is_collapsed(&self, axis: Axis, identity: &KeyIdentity) -> bool {
        self.axis(axis).has(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pivot_data::KeyValue;

    fn id(parts: &[&str]) -> KeyIdentity {
        let values: Vec<KeyValue> = parts.iter().map(|p| KeyValue::text(*p)).collect();
        KeyIdentity::of(&values)
    }

    #[test]
    fn test_toggle_twice_restores() {
        let mut set = CollapseSet::new();
        assert!(set.toggle(id(&["A"])));
        assert!(set.has(&id(&["A"])));
        assert!(!set.toggle(id(&["A"])));
        assert!(!set.has(&id(&["A"])));
        assert!(CollapseState::is_empty(&set));
    }

    #[test]
    fn test_descendants_untouched() {
        let mut set = CollapseSet::new();
        set.toggle(id(&["A", "x"]));
        set.toggle(id(&["A"]));
        set.toggle(id(&["A"]));
        assert!(set.has(&id(&["A", "x"])));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_axes_are_independent() {
        let mut table = TableCollapse::new();
        table.toggle(Axis::Row, id(&["A"]));

        assert!(table.is_collapsed(Axis::Row, &id(&["A"])));
        assert!(!table.is_collapsed(Axis::Column, &id(&["A"])));
    }
}
