//! FILENAME: pivot-data/src/records.rs
//! In-memory pivot data built from tabular records.
//!
//! Build is a single pass over the records:
//! - each record is projected onto its row key and column key
//! - the value attribute is accumulated into the (row key, column key) leaf
//! Row, column and grand totals are then merged from the leaves, and the
//! leaf keys are sorted per the configured `KeyOrder`.

use std::cmp::Ordering;
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::accumulator::AggregateAccumulator;
use crate::definition::{AggregationType, KeyOrder, PivotConfig};
use crate::error::PivotDataError;
use crate::key::Key;
use crate::number_format::{format_number, NumberFormat};
use crate::source::{AggregatorResult, Formatter, PivotDataSource};
use crate::value::KeyValue;

/// Index of an attribute (column) in the source records.
pub type AttrIndex = usize;

// ============================================================================
// RECORD TABLE
// ============================================================================

/// Source records: a header row naming the attributes plus one value per
/// attribute in each record.
#[derive(Debug, Clone, Default)]
pub struct RecordTable {
    headers: Vec<String>,
    records: Vec<Vec<KeyValue>>,
}

impl RecordTable {
    pub fn new(headers: Vec<String>) -> Self {
        RecordTable {
            headers,
            records: Vec::new(),
        }
    }

    /// Appends a record. Its width must match the header row.
    pub fn push(&mut self, record: Vec<KeyValue>) -> Result<(), PivotDataError> {
        if record.len() != self.headers.len() {
            return Err(PivotDataError::RecordWidth {
                row: self.records.len(),
                expected: self.headers.len(),
                found: record.len(),
            });
        }
        self.records.push(record);
        Ok(())
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn attr_index(&self, name: &str) -> Result<AttrIndex, PivotDataError> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| PivotDataError::UnknownAttribute(name.to_string()))
    }

    /// Cross-tabulates the records per `config`.
    pub fn pivot(&self, config: &PivotConfig) -> Result<RecordPivotData, PivotDataError> {
        RecordPivotData::build(self, config)
    }
}

// ============================================================================
// RECORD PIVOT DATA
// ============================================================================

/// Leaf-level pivot data computed from a `RecordTable`.
pub struct RecordPivotData {
    row_attrs: Vec<String>,
    col_attrs: Vec<String>,
    aggregation: AggregationType,
    formatter: Formatter,

    row_keys: Vec<Key>,
    col_keys: Vec<Key>,

    leaves: FxHashMap<(Key, Key), AggregateAccumulator>,
    row_totals: FxHashMap<Key, AggregateAccumulator>,
    col_totals: FxHashMap<Key, AggregateAccumulator>,
    grand_total: AggregateAccumulator,
}

impl RecordPivotData {
    fn build(table: &RecordTable, config: &PivotConfig) -> Result<Self, PivotDataError> {
        let row_indices = resolve_attrs(table, &config.rows)?;
        let col_indices = resolve_attrs(table, &config.cols)?;

        let value_index = match (config.aggregation.needs_value(), config.vals.first()) {
            (true, Some(name)) => Some(table.attr_index(name)?),
            (true, None) => {
                return Err(PivotDataError::UnknownAttribute(format!(
                    "<value attribute for {:?}>",
                    config.aggregation
                )))
            }
            (false, _) => None,
        };

        let mut filters: Vec<(AttrIndex, FxHashSet<&KeyValue>)> = Vec::new();
        for (attr, excluded) in &config.value_filter {
            let index = table.attr_index(attr)?;
            filters.push((index, excluded.iter().collect()));
        }

        let mut leaves: FxHashMap<(Key, Key), AggregateAccumulator> = FxHashMap::default();
        let mut row_keys: Vec<Key> = Vec::new();
        let mut col_keys: Vec<Key> = Vec::new();
        let mut seen_rows: FxHashSet<Key> = FxHashSet::default();
        let mut seen_cols: FxHashSet<Key> = FxHashSet::default();

        for record in &table.records {
            let excluded = filters
                .iter()
                .any(|(index, values)| values.contains(&record[*index]));
            if excluded {
                continue;
            }

            let row_key: Key = row_indices.iter().map(|&i| record[i].clone()).collect();
            let col_key: Key = col_indices.iter().map(|&i| record[i].clone()).collect();

            // An axis without attributes has no leaf keys of its own
            if !row_key.is_empty() && seen_rows.insert(row_key.clone()) {
                row_keys.push(row_key.clone());
            }
            if !col_key.is_empty() && seen_cols.insert(col_key.clone()) {
                col_keys.push(col_key.clone());
            }

            let reading = match value_index {
                Some(i) => record[i].as_number(),
                None => None,
            };

            leaves
                .entry((row_key, col_key))
                .or_insert_with(AggregateAccumulator::new)
                .add(reading);
        }

        let mut row_totals: FxHashMap<Key, AggregateAccumulator> = FxHashMap::default();
        let mut col_totals: FxHashMap<Key, AggregateAccumulator> = FxHashMap::default();
        let mut grand_total = AggregateAccumulator::new();
        for ((row_key, col_key), acc) in &leaves {
            row_totals.entry(row_key.clone()).or_default().merge(acc);
            col_totals.entry(col_key.clone()).or_default().merge(acc);
            grand_total.merge(acc);
        }

        let format = if config.aggregation.is_count() {
            NumberFormat::fixed(0)
        } else {
            NumberFormat::fixed(2)
        };
        let formatter: Formatter = Arc::new(move |v| format_number(v, &format));

        sort_keys(&mut row_keys, config.row_order, &row_totals, config.aggregation);
        sort_keys(&mut col_keys, config.col_order, &col_totals, config.aggregation);

        Ok(RecordPivotData {
            row_attrs: config.rows.clone(),
            col_attrs: config.cols.clone(),
            aggregation: config.aggregation,
            formatter,
            row_keys,
            col_keys,
            leaves,
            row_totals,
            col_totals,
            grand_total,
        })
    }

    pub fn aggregation(&self) -> AggregationType {
        self.aggregation
    }

    /// Number of distinct (row key, column key) leaves with data.
    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    fn accumulator(&self, row_key: &[KeyValue], col_key: &[KeyValue]) -> Option<&AggregateAccumulator> {
        match (row_key.is_empty(), col_key.is_empty()) {
            (true, true) => Some(&self.grand_total),
            (true, false) => self.col_totals.get(&Key::from(col_key)),
            (false, true) => self.row_totals.get(&Key::from(row_key)),
            (false, false) => self.leaves.get(&(Key::from(row_key), Key::from(col_key))),
        }
    }
}

impl PivotDataSource for RecordPivotData {
    fn row_attrs(&self) -> &[String] {
        &self.row_attrs
    }

    fn col_attrs(&self) -> &[String] {
        &self.col_attrs
    }

    fn row_keys(&self) -> &[Key] {
        &self.row_keys
    }

    fn col_keys(&self) -> &[Key] {
        &self.col_keys
    }

    fn aggregator(&self, row_key: &[KeyValue], col_key: &[KeyValue]) -> AggregatorResult {
        let value = self
            .accumulator(row_key, col_key)
            .and_then(|acc| acc.compute(self.aggregation));
        AggregatorResult::new(value, Arc::clone(&self.formatter))
    }
}

fn resolve_attrs(table: &RecordTable, names: &[String]) -> Result<Vec<AttrIndex>, PivotDataError> {
    names.iter().map(|name| table.attr_index(name)).collect()
}

/// Sorts leaf keys in place. Value orders fall back to key order on ties;
/// keys without a numeric total sort as the lowest value.
fn sort_keys(
    keys: &mut [Key],
    order: KeyOrder,
    totals: &FxHashMap<Key, AggregateAccumulator>,
    aggregation: AggregationType,
) {
    let total_of = |key: &Key| {
        totals
            .get(key)
            .and_then(|acc| acc.compute(aggregation))
            .unwrap_or(f64::NEG_INFINITY)
    };

    match order {
        KeyOrder::KeyAToZ => keys.sort(),
        KeyOrder::ValueAToZ => keys.sort_by(|a, b| {
            compare_totals(total_of(a), total_of(b)).then_with(|| a.cmp(b))
        }),
        KeyOrder::ValueZToA => keys.sort_by(|a, b| {
            compare_totals(total_of(b), total_of(a)).then_with(|| a.cmp(b))
        }),
    }
}

fn compare_totals(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}
