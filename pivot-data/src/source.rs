//! FILENAME: pivot-data/src/source.rs
//! The pivot data contract consumed by the subtotal engine.
//!
//! A data source enumerates the leaf row/column keys (already sorted) and
//! answers aggregate lookups for full-length keys. `aggregator(&[], &[])`
//! must always succeed: it is the grand total.

use std::fmt;
use std::sync::Arc;

use crate::key::Key;
use crate::number_format::{format_number, NumberFormat};
use crate::value::KeyValue;

/// Turns an aggregate value into display text.
pub type Formatter = Arc<dyn Fn(f64) -> String + Send + Sync>;

/// Formatter that renders the value with general number formatting.
pub fn identity_formatter() -> Formatter {
    Arc::new(|v| format_number(v, &NumberFormat::General))
}

/// The result of one aggregate lookup.
#[derive(Clone)]
pub struct AggregatorResult {
    /// `None` when no data contributed, so the cell renders as "no data" rather than 0.
    pub value: Option<f64>,

    pub formatter: Formatter,
}

impl AggregatorResult {
    pub fn new(value: Option<f64>, formatter: Formatter) -> Self {
        AggregatorResult { value, formatter }
    }

    /// Result with no value and general formatting.
    pub fn empty() -> Self {
        AggregatorResult {
            value: None,
            formatter: identity_formatter(),
        }
    }

    /// The value if it is a usable number (not missing, not NaN).
    pub fn numeric_value(&self) -> Option<f64> {
        self.value.filter(|v| !v.is_nan())
    }

    /// Display text for the value; empty when there is no value.
    pub fn formatted(&self) -> String {
        match self.numeric_value() {
            Some(v) => (self.formatter)(v),
            None => String::new(),
        }
    }
}

impl fmt::Debug for AggregatorResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AggregatorResult")
            .field("value", &self.value)
            .finish_non_exhaustive()
    }
}

/// Leaf-level pivot data.
pub trait PivotDataSource {
    /// Row attribute names, outermost first. Their count is the row key depth.
    fn row_attrs(&self) -> &[String];

    /// Column attribute names, outermost first.
    fn col_attrs(&self) -> &[String];

    /// Leaf row keys in display order.
    fn row_keys(&self) -> &[Key];

    /// Leaf column keys in display order.
    fn col_keys(&self) -> &[Key];

    /// Aggregate for a leaf cell. Both keys are full-length, or empty for totals.
    fn aggregator(&self, row_key: &[KeyValue], col_key: &[KeyValue]) -> AggregatorResult;
}

impl<T: PivotDataSource + ?Sized> PivotDataSource for Box<T> {
    fn row_attrs(&self) -> &[String] {
        (**self).row_attrs()
    }

    fn col_attrs(&self) -> &[String] {
        (**self).col_attrs()
    }

    fn row_keys(&self) -> &[Key] {
        (**self).row_keys()
    }

    fn col_keys(&self) -> &[Key] {
        (**self).col_keys()
    }

    fn aggregator(&self, row_key: &[KeyValue], col_key: &[KeyValue]) -> AggregatorResult {
        (**self).aggregator(row_key, col_key)
    }
}
