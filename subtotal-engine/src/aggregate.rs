//! FILENAME: subtotal-engine/src/aggregate.rs
//! Aggregator Cache - subtotal values computed on demand from leaf cells.
//!
//! Full-length lookups go straight to the data source. Anything shorter is
//! a subtotal: the matching leaf rows and columns are crossed, every leaf
//! value is fetched, and usable numbers are summed. Results are memoized per
//! (row identity, column identity) for the lifetime of one render pass.

use log::trace;
use pivot_data::{AggregatorResult, Formatter, Key, KeyValue, PivotDataSource};
use rustc_hash::FxHashMap;

use crate::key::{matches_prefix, KeyIdentity};

#[derive(Debug, Clone)]
struct CachedSubtotal {
    result: AggregatorResult,
    matched: usize,
}

/// Memoizing subtotal lookup over a borrowed data source.
pub struct AggregatorCache<'a> {
    source: &'a dyn PivotDataSource,
    row_depth: usize,
    col_depth: usize,
    /// Leaf keys per axis. An axis without attributes has the single empty key.
    row_leaves: Vec<Key>,
    col_leaves: Vec<Key>,
    formatter: Formatter,
    memo: FxHashMap<(KeyIdentity, KeyIdentity), CachedSubtotal>,
}

impl<'a> AggregatorCache<'a> {
    pub fn new(source: &'a dyn PivotDataSource) -> Self {
        let row_depth = source.row_attrs().len();
        let col_depth = source.col_attrs().len();

        AggregatorCache {
            source,
            row_depth,
            col_depth,
            row_leaves: leaf_set(source.row_keys(), row_depth),
            col_leaves: leaf_set(source.col_keys(), col_depth),
            formatter: source.aggregator(&[], &[]).formatter,
            memo: FxHashMap::default(),
        }
    }

    pub fn source(&self) -> &'a dyn PivotDataSource {
        self.source
    }

    /// Aggregate for any pair of (possibly partial) keys.
    /// The empty pair is the source's own grand total.
    pub fn get_aggregator(&mut self, row_key: &[KeyValue], col_key: &[KeyValue]) -> AggregatorResult {
        let grand_total = row_key.is_empty() && col_key.is_empty();
        if grand_total || self.is_leaf_cell(row_key, col_key) {
            return self.source.aggregator(row_key, col_key);
        }
        self.subtotal(row_key, col_key).result.clone()
    }

    /// Number of leaf cells that contributed a usable value to a subtotal.
    /// Full-length cells report 1 when they hold a value, else 0.
    pub fn matched_count(&mut self, row_key: &[KeyValue], col_key: &[KeyValue]) -> usize {
        if self.is_leaf_cell(row_key, col_key) {
            return usize::from(self.source.aggregator(row_key, col_key).numeric_value().is_some());
        }
        self.subtotal(row_key, col_key).matched
    }

    /// Number of memoized subtotal entries.
    pub fn len(&self) -> usize {
        self.memo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memo.is_empty()
    }

    fn is_leaf_cell(&self, row_key: &[KeyValue], col_key: &[KeyValue]) -> bool {
        row_key.len() == self.row_depth && col_key.len() == self.col_depth
    }

    fn subtotal(&mut self, row_key: &[KeyValue], col_key: &[KeyValue]) -> &CachedSubtotal {
        let memo_key = (KeyIdentity::of(row_key), KeyIdentity::of(col_key));

        if self.memo.contains_key(&memo_key) {
            trace!("subtotal cache hit {} x {}", memo_key.0, memo_key.1);
        } else {
            trace!("subtotal cache miss {} x {}", memo_key.0, memo_key.1);
            let computed = self.compute_subtotal(row_key, col_key);
            self.memo.insert(memo_key.clone(), computed);
        }

        &self.memo[&memo_key]
    }

    fn compute_subtotal(&self, row_key: &[KeyValue], col_key: &[KeyValue]) -> CachedSubtotal {
        let rows: Vec<&Key> = self
            .row_leaves
            .iter()
            .filter(|leaf| matches_prefix(leaf, row_key))
            .collect();
        let cols: Vec<&Key> = self
            .col_leaves
            .iter()
            .filter(|leaf| matches_prefix(leaf, col_key))
            .collect();

        let mut sum = 0.0;
        let mut matched = 0usize;
        for row in &rows {
            for col in &cols {
                if let Some(v) = self.source.aggregator(row, col).numeric_value() {
                    sum += v;
                    matched += 1;
                }
            }
        }

        let value = if matched > 0 { Some(sum) } else { None };
        CachedSubtotal {
            result: AggregatorResult::new(value, self.formatter.clone()),
            matched,
        }
    }
}

fn leaf_set(keys: &[Key], depth: usize) -> Vec<Key> {
    if depth == 0 {
        vec![Key::empty()]
    } else {
        keys.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    /// Small in-test source with explicit leaf values.
    struct FixedSource {
        rows: Vec<String>,
        cols: Vec<String>,
        row_keys: Vec<Key>,
        col_keys: Vec<Key>,
        values: FxHashMap<(Key, Key), Option<f64>>,
        grand: Option<f64>,
    }

    impl PivotDataSource for FixedSource {
        fn row_attrs(&self) -> &[String] {
            &self.rows
        }
        fn col_attrs(&self) -> &[String] {
            &self.cols
        }
        fn row_keys(&self) -> &[Key] {
            &self.row_keys
        }
        fn col_keys(&self) -> &[Key] {
            &self.col_keys
        }
        fn aggregator(&self, row_key: &[KeyValue], col_key: &[KeyValue]) -> AggregatorResult {
            let formatter: Formatter = Arc::new(|v| format!("<{}>", v));
            if row_key.is_empty() && col_key.is_empty() {
                return AggregatorResult::new(self.grand, formatter);
            }
            let value = self
                .values
                .get(&(Key::from(row_key), Key::from(col_key)))
                .copied()
                .flatten();
            AggregatorResult::new(value, formatter)
        }
    }

    fn key(parts: &[&str]) -> Key {
        parts.iter().copied().collect()
    }

    fn create_test_source() -> FixedSource {
        let row_keys = vec![key(&["A", "x"]), key(&["A", "y"]), key(&["A", "w"]), key(&["B", "z"])];
        let col_keys = vec![key(&["Q1"])];
        let mut values = FxHashMap::default();
        values.insert((key(&["A", "x"]), key(&["Q1"])), Some(10.0));
        values.insert((key(&["A", "y"]), key(&["Q1"])), None);
        values.insert((key(&["A", "w"]), key(&["Q1"])), Some(20.0));
        values.insert((key(&["B", "z"]), key(&["Q1"])), Some(f64::NAN));
        FixedSource {
            rows: vec!["Region".to_string(), "City".to_string()],
            cols: vec!["Quarter".to_string()],
            row_keys,
            col_keys,
            values,
            grand: Some(123.0),
        }
    }

    #[test]
    fn test_subtotal_skips_missing_and_nan() {
        let source = create_test_source();
        let mut cache = AggregatorCache::new(&source);

        let result = cache.get_aggregator(&key(&["A"]), &key(&["Q1"]));
        assert_eq!(result.value, Some(30.0));
        assert_eq!(cache.matched_count(&key(&["A"]), &key(&["Q1"])), 2);
    }

    #[test]
    fn test_all_missing_is_no_data() {
        let source = create_test_source();
        let mut cache = AggregatorCache::new(&source);

        let result = cache.get_aggregator(&key(&["B"]), &key(&["Q1"]));
        assert_eq!(result.value, None);
        assert_eq!(result.formatted(), "");
        assert_eq!(cache.matched_count(&key(&["B"]), &[]), 0);
    }

    #[test]
    fn test_full_keys_delegate() {
        let source = create_test_source();
        let mut cache = AggregatorCache::new(&source);

        let result = cache.get_aggregator(&key(&["A", "x"]), &key(&["Q1"]));
        assert_eq!(result.value, Some(10.0));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_grand_total_from_source() {
        let source = create_test_source();
        let mut cache = AggregatorCache::new(&source);

        let result = cache.get_aggregator(&[], &[]);
        assert_eq!(result.value, Some(123.0));
        assert_eq!(result.formatted(), "<123>");
        // 4 row leaves x 1 column leaf, minus one missing and one NaN value
        assert_eq!(cache.matched_count(&[], &[]), 2);
    }

    #[test]
    fn test_subtotal_uses_grand_total_formatter() {
        let source = create_test_source();
        let mut cache = AggregatorCache::new(&source);
        assert_eq!(cache.get_aggregator(&[], &key(&["Q1"])).formatted(), "<30>");
    }

    #[test]
    fn test_memoized_once() {
        let source = create_test_source();
        let mut cache = AggregatorCache::new(&source);

        cache.get_aggregator(&key(&["A"]), &[]);
        cache.get_aggregator(&key(&["A"]), &[]);
        cache.matched_count(&key(&["A"]), &[]);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_empty_column_axis() {
        let mut source = create_test_source();
        source.cols.clear();
        source.col_keys.clear();
        source.values = FxHashMap::default();
        source.values.insert((key(&["A", "x"]), Key::empty()), Some(4.0));
        source.values.insert((key(&["A", "y"]), Key::empty()), Some(6.0));

        let mut cache = AggregatorCache::new(&source);
        assert_eq!(cache.get_aggregator(&key(&["A"]), &[]).value, Some(10.0));
        // Full row key with no column attributes is a leaf cell
        assert_eq!(cache.get_aggregator(&key(&["A", "y"]), &[]).value, Some(6.0));
    }
}
