//! FILENAME: subtotal-engine/src/lib.rs
//! Subtotal pivot table engine.
//!
//! Takes leaf pivot data (see `pivot_data`) and produces a table with
//! subtotal rows and columns at every level of the key hierarchy, with
//! independent collapse/expand per group.
//!
//! Layers:
//! - `key`: Key hierarchy helpers and canonical key identities
//! - `collapse`: Per-axis collapse state
//! - `expand`: Leaf keys -> display items (subtotal markers, visibility)
//! - `span`: Merged header spans
//! - `aggregate`: Memoized subtotal values summed from leaf cells
//! - `definition` / `view` / `engine`: Configuration, view model, render pass

pub mod key;
pub mod collapse;
pub mod expand;
pub mod span;
pub mod aggregate;
pub mod definition;
pub mod view;
pub mod engine;
pub mod error;

pub use key::{compare_keys, has_collapsed_ancestor, is_subtotal_key, matches_prefix, prefixes, KeyIdentity};
pub use collapse::{Axis, CollapseSet, CollapseState, TableCollapse};
pub use expand::{DisplayItem, SubtotalExpander, SubtotalOrdering};
pub use span::{span_at, Span, SpanGrid};
pub use aggregate::AggregatorCache;
pub use definition::*;
pub use view::*;
pub use engine::{PivotDataFactory, RenderOutcome, RenderedTable, SubtotalTable, TableRenderer};
pub use error::SubtotalError;
