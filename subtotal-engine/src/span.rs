//! FILENAME: subtotal-engine/src/span.rs
//! Merged header spans over a display item sequence.
//!
//! Consecutive non-subtotal items that agree on key elements `0..=level`
//! merge into one header cell at that level. Subtotal items never merge.

use serde::{Deserialize, Serialize};

use crate::expand::DisplayItem;
use crate::key::agree_through;

/// Span of one header cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Span {
    /// Render a cell covering this many items (always >= 1).
    Render(usize),
    /// Merged into a preceding item; render nothing.
    Suppress,
}

impl Span {
    pub fn size(&self) -> Option<usize> {
        match self {
            Span::Render(n) => Some(*n),
            Span::Suppress => None,
        }
    }

    pub fn is_suppressed(&self) -> bool {
        matches!(self, Span::Suppress)
    }
}

/// Span of item `i` at key level `j`. Out-of-range positions are suppressed.
pub fn span_at(items: &[DisplayItem], i: usize, j: usize) -> Span {
    let item = match items.get(i) {
        Some(item) => item,
        None => return Span::Suppress,
    };
    if item.is_subtotal {
        return Span::Render(1);
    }

    if i > 0 {
        let prev = &items[i - 1];
        if !prev.is_subtotal && agree_through(&prev.key, &item.key, j) {
            return Span::Suppress;
        }
    }

    let len = items[i..]
        .iter()
        .take_while(|next| !next.is_subtotal && agree_through(&item.key, &next.key, j))
        .count();
    Span::Render(len)
}

// ============================================================================
// SPAN GRID
// ============================================================================

/// Precomputed spans for every (level, position) of one render pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanGrid {
    /// Indexed as spans[level][position].
    spans: Vec<Vec<Span>>,
}

impl SpanGrid {
    /// Walks each level once, one run at a time.
    pub fn compute(items: &[DisplayItem], levels: usize) -> Self {
        let n = items.len();
        let mut spans = Vec::with_capacity(levels);

        for j in 0..levels {
            let mut row = vec![Span::Suppress; n];
            let mut i = 0;
            while i < n {
                if items[i].is_subtotal {
                    row[i] = Span::Render(1);
                    i += 1;
                    continue;
                }
                let mut end = i + 1;
                while end < n
                    && !items[end].is_subtotal
                    && agree_through(&items[i].key, &items[end].key, j)
                {
                    end += 1;
                }
                row[i] = Span::Render(end - i);
                i = end;
            }
            spans.push(row);
        }

        SpanGrid { spans }
    }

    pub fn get(&self, position: usize, level: usize) -> Span {
        self.spans
            .get(level)
            .and_then(|row| row.get(position))
            .copied()
            .unwrap_or(Span::Suppress)
    }

    pub fn levels(&self) -> usize {
        self.spans.len()
    }
}
