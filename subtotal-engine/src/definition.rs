//! FILENAME: subtotal-engine/src/definition.rs
//! Table Definition - renderer configuration for a subtotal table.
//!
//! Wraps the leaf `PivotConfig` with the subtotal specific options. JSON
//! field names follow the renderer props (`rowTotal`, `subtotalOptions`,
//! `localeStrings`, ...). Function-valued options are attached in code.

use std::fmt;
use std::sync::Arc;

use pivot_data::{KeyValue, PivotConfig, PivotDataSource};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::SubtotalError;
use crate::expand::SubtotalOrdering;

/// Attribute name -> value of a clicked cell, built from non-null key elements.
pub type FilterMap = FxHashMap<String, KeyValue>;

/// Formats one attribute's values in header labels.
pub type LabelFn = Arc<dyn Fn(&KeyValue) -> String + Send + Sync>;

/// Invoked with (cell value, filters, data source) when a value cell is clicked.
pub type ClickCallback = Arc<dyn Fn(Option<f64>, &FilterMap, &dyn PivotDataSource) + Send + Sync>;

// ============================================================================
// SUBTOTAL OPTIONS
// ============================================================================

/// Per-axis subtotal display options. These are carried through to the view
/// for the presentation layer to honor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtotalDisplay {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub display_on_top: bool,
    #[serde(default)]
    pub hide_on_expand: bool,
}

impl Default for SubtotalDisplay {
    fn default() -> Self {
        SubtotalDisplay {
            enabled: true,
            display_on_top: false,
            hide_on_expand: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtotalOptions {
    #[serde(default = "default_arrow_collapsed")]
    pub arrow_collapsed: String,
    #[serde(default = "default_arrow_expanded")]
    pub arrow_expanded: String,
    #[serde(default)]
    pub row_subtotal_display: SubtotalDisplay,
    #[serde(default)]
    pub col_subtotal_display: SubtotalDisplay,
}

impl Default for SubtotalOptions {
    fn default() -> Self {
        SubtotalOptions {
            arrow_collapsed: default_arrow_collapsed(),
            arrow_expanded: default_arrow_expanded(),
            row_subtotal_display: SubtotalDisplay::default(),
            col_subtotal_display: SubtotalDisplay::default(),
        }
    }
}

impl SubtotalOptions {
    pub fn arrow(&self, collapsed: bool) -> &str {
        if collapsed {
            &self.arrow_collapsed
        } else {
            &self.arrow_expanded
        }
    }
}

fn default_arrow_collapsed() -> String {
    "\u{25B6}".to_string()
}

fn default_arrow_expanded() -> String {
    "\u{25BC}".to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocaleStrings {
    #[serde(default = "default_totals")]
    pub totals: String,
}

impl Default for LocaleStrings {
    fn default() -> Self {
        LocaleStrings {
            totals: default_totals(),
        }
    }
}

fn default_totals() -> String {
    "Totals".to_string()
}

// ============================================================================
// FUNCTION-VALUED OPTIONS
// ============================================================================

/// Per-attribute header label formatters.
#[derive(Clone, Default)]
pub struct AttributeLabels(FxHashMap<String, LabelFn>);

impl AttributeLabels {
    pub fn insert(&mut self, attr: &str, label: LabelFn) {
        self.0.insert(attr.to_string(), label);
    }

    /// Header text for `value` of `attr`; plain display text without a formatter.
    pub fn apply(&self, attr: &str, value: &KeyValue) -> String {
        match self.0.get(attr) {
            Some(label) => label(value),
            None => value.to_string(),
        }
    }
}

impl fmt::Debug for AttributeLabels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.0.keys()).finish()
    }
}

#[derive(Clone, Default)]
pub struct TableOptions {
    pub click_callback: Option<ClickCallback>,
}

impl fmt::Debug for TableOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableOptions")
            .field("click_callback", &self.click_callback.is_some())
            .finish()
    }
}

// ============================================================================
// MAIN CONFIG STRUCT
// ============================================================================

/// Complete configuration of a subtotal table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableConfig {
    /// Leaf data: attributes, aggregation, ordering and filters.
    #[serde(flatten)]
    pub pivot: PivotConfig,

    /// Show the row totals column.
    #[serde(default = "default_true")]
    pub row_total: bool,

    /// Show the column totals row.
    #[serde(default = "default_true")]
    pub col_total: bool,

    #[serde(default)]
    pub subtotal_options: SubtotalOptions,

    #[serde(default)]
    pub locale_strings: LocaleStrings,

    #[serde(default)]
    pub row_ordering: SubtotalOrdering,

    #[serde(default)]
    pub col_ordering: SubtotalOrdering,

    #[serde(skip)]
    pub labels: AttributeLabels,

    #[serde(skip)]
    pub table_options: TableOptions,
}

impl Default for TableConfig {
    fn default() -> Self {
        TableConfig {
            pivot: PivotConfig::default(),
            row_total: true,
            col_total: true,
            subtotal_options: SubtotalOptions::default(),
            locale_strings: LocaleStrings::default(),
            row_ordering: SubtotalOrdering::default(),
            col_ordering: SubtotalOrdering::default(),
            labels: AttributeLabels::default(),
            table_options: TableOptions::default(),
        }
    }
}

impl TableConfig {
    pub fn new(pivot: PivotConfig) -> Self {
        TableConfig {
            pivot,
            ..TableConfig::default()
        }
    }

    /// Parses a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, SubtotalError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_label<F>(mut self, attr: &str, label: F) -> Self
    where
        F: Fn(&KeyValue) -> String + Send + Sync + 'static,
    {
        self.labels.insert(attr, Arc::new(label));
        self
    }

    pub fn with_click_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(Option<f64>, &FilterMap, &dyn PivotDataSource) + Send + Sync + 'static,
    {
        self.table_options.click_callback = Some(Arc::new(callback));
        self
    }

    pub fn with_orderings(mut self, rows: SubtotalOrdering, cols: SubtotalOrdering) -> Self {
        self.row_ordering = rows;
        self.col_ordering = cols;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pivot_data::AggregationType;

    #[test]
    fn test_defaults() {
        let config = TableConfig::from_json("{}").unwrap();
        assert!(config.row_total);
        assert!(config.col_total);
        assert_eq!(config.subtotal_options.arrow(true), "\u{25B6}");
        assert_eq!(config.subtotal_options.arrow(false), "\u{25BC}");
        assert!(config.subtotal_options.row_subtotal_display.enabled);
        assert_eq!(config.locale_strings.totals, "Totals");
        assert_eq!(config.row_ordering, SubtotalOrdering::PrefixFirst);
        assert!(config.table_options.click_callback.is_none());
    }

    #[test]
    fn test_from_json() {
        let config = TableConfig::from_json(
            r#"{
                "rows": ["Region", "City"],
                "cols": ["Year"],
                "vals": ["Sales"],
                "aggregatorName": "Sum",
                "rowTotal": false,
                "colOrdering": "distinct_sorted",
                "subtotalOptions": {
                    "arrowCollapsed": "+",
                    "colSubtotalDisplay": { "displayOnTop": true }
                },
                "localeStrings": { "totals": "Summe" }
            }"#,
        )
        .unwrap();

        assert_eq!(config.pivot.rows, vec!["Region", "City"]);
        assert_eq!(config.pivot.aggregation, AggregationType::Sum);
        assert!(!config.row_total);
        assert!(config.col_total);
        assert_eq!(config.col_ordering, SubtotalOrdering::DistinctSorted);
        assert_eq!(config.subtotal_options.arrow_collapsed, "+");
        assert_eq!(config.subtotal_options.arrow_expanded, "\u{25BC}");
        assert!(config.subtotal_options.col_subtotal_display.display_on_top);
        assert!(config.subtotal_options.col_subtotal_display.enabled);
        assert_eq!(config.locale_strings.totals, "Summe");
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(TableConfig::from_json("[1, 2"), Err(SubtotalError::Config(_))));
    }

    #[test]
    fn test_labels() {
        let config = TableConfig::default().with_label("Year", |v| format!("FY{}", v));
        assert_eq!(config.labels.apply("Year", &KeyValue::number(2024.0)), "FY2024");
        assert_eq!(config.labels.apply("Region", &KeyValue::text("North")), "North");
    }
}
