//! FILENAME: pivot-data/src/definition.rs
//! Pivot Data Definition - what to cross-tabulate and how to aggregate it.
//!
//! These structures are plain serializable configuration. Field names
//! match the renderer props they come from (`rows`, `cols`, `vals`,
//! `aggregatorName`, `rowOrder`, `colOrder`, `valueFilter`).

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::PivotDataError;
use crate::value::KeyValue;

// ============================================================================
// AGGREGATION
// ============================================================================

/// Supported per-cell aggregation functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggregationType {
    Sum,
    /// Counts records, numeric or not.
    Count,
    /// Counts records whose value is numeric.
    CountNumbers,
    Average,
    Min,
    Max,
}

impl Default for AggregationType {
    fn default() -> Self {
        AggregationType::Count
    }
}

impl AggregationType {
    /// Whether this aggregation reads a value attribute at all.
    pub fn needs_value(&self) -> bool {
        !matches!(self, AggregationType::Count)
    }

    /// Whether results are whole counts (formatted without decimals).
    pub fn is_count(&self) -> bool {
        matches!(self, AggregationType::Count | AggregationType::CountNumbers)
    }
}

// ============================================================================
// KEY ORDER
// ============================================================================

/// Sort order for leaf keys on one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyOrder {
    /// Native element ordering of the key values.
    KeyAToZ,
    /// Ascending by the key's total aggregate.
    ValueAToZ,
    /// Descending by the key's total aggregate.
    ValueZToA,
}

impl Default for KeyOrder {
    fn default() -> Self {
        KeyOrder::KeyAToZ
    }
}

// ============================================================================
// MAIN CONFIG STRUCT
// ============================================================================

/// Configuration of the leaf pivot data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PivotConfig {
    /// Row attributes, outermost first.
    pub rows: Vec<String>,

    /// Column attributes, outermost first.
    pub cols: Vec<String>,

    /// Value attributes read by the aggregator (the first one is used).
    pub vals: Vec<String>,

    #[serde(rename = "aggregatorName")]
    pub aggregation: AggregationType,

    pub row_order: KeyOrder,

    pub col_order: KeyOrder,

    /// Per attribute, the values whose records are excluded.
    pub value_filter: FxHashMap<String, Vec<KeyValue>>,
}

impl PivotConfig {
    pub fn new(rows: Vec<String>, cols: Vec<String>) -> Self {
        PivotConfig {
            rows,
            cols,
            ..PivotConfig::default()
        }
    }

    /// Parses a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, PivotDataError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_aggregation(mut self, aggregation: AggregationType, val: &str) -> Self {
        self.aggregation = aggregation;
        self.vals = vec![val.to_string()];
        self
    }

    /// Excludes records whose `attr` equals `value`.
    pub fn exclude(mut self, attr: &str, value: impl Into<KeyValue>) -> Self {
        self.value_filter
            .entry(attr.to_string())
            .or_default()
            .push(value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_json() {
        let config = PivotConfig::from_json(
            r#"{
                "rows": ["Region", "Product"],
                "cols": ["Quarter"],
                "vals": ["Sales"],
                "aggregatorName": "Sum",
                "rowOrder": "value_z_to_a",
                "valueFilter": { "Region": ["West"] }
            }"#,
        )
        .unwrap();

        assert_eq!(config.rows, vec!["Region", "Product"]);
        assert_eq!(config.cols, vec!["Quarter"]);
        assert_eq!(config.aggregation, AggregationType::Sum);
        assert_eq!(config.row_order, KeyOrder::ValueZToA);
        assert_eq!(config.col_order, KeyOrder::KeyAToZ);
        assert_eq!(config.value_filter["Region"], vec![KeyValue::text("West")]);
    }

    #[test]
    fn test_config_defaults() {
        let config = PivotConfig::from_json("{}").unwrap();
        assert!(config.rows.is_empty());
        assert_eq!(config.aggregation, AggregationType::Count);
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(matches!(
            PivotConfig::from_json("{ rows: "),
            Err(PivotDataError::InvalidConfig(_))
        ));
    }
}
