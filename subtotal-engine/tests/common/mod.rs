//! FILENAME: subtotal-engine/tests/common/mod.rs
//! Fixtures shared by the subtotal engine integration tests.

#![allow(dead_code)]

use pivot_data::{AggregationType, Key, KeyValue, PivotConfig, RecordTable};
use subtotal_engine::{RenderedTable, SubtotalTable, TableConfig};

/// Sales data used across the render tests.
pub struct SalesFixture;

impl SalesFixture {
    pub fn headers() -> Vec<&'static str> {
        vec!["Region", "Product", "Quarter", "Sales", "Quantity"]
    }

    pub fn data() -> Vec<(&'static str, &'static str, &'static str, f64, f64)> {
        vec![
            ("North", "Widget", "Q1", 10000.0, 100.0),
            ("North", "Widget", "Q2", 12000.0, 120.0),
            ("North", "Gadget", "Q1", 8000.0, 80.0),
            ("North", "Gadget", "Q2", 9000.0, 90.0),
            ("South", "Widget", "Q1", 15000.0, 150.0),
            ("South", "Widget", "Q2", 14000.0, 140.0),
            ("South", "Gadget", "Q1", 11000.0, 110.0),
            ("South", "Gadget", "Q2", 13000.0, 130.0),
            ("East", "Widget", "Q1", 9000.0, 90.0),
            ("East", "Widget", "Q2", 11000.0, 110.0),
            ("East", "Gadget", "Q1", 7000.0, 70.0),
            ("East", "Gadget", "Q2", 8500.0, 85.0),
        ]
    }

    pub fn table() -> RecordTable {
        let headers = Self::headers().into_iter().map(String::from).collect();
        let mut table = RecordTable::new(headers);
        for (region, product, quarter, sales, quantity) in Self::data() {
            table
                .push(vec![
                    KeyValue::text(region),
                    KeyValue::text(product),
                    KeyValue::text(quarter),
                    KeyValue::number(sales),
                    KeyValue::number(quantity),
                ])
                .unwrap();
        }
        table
    }
}

/// Sum of Sales over the given row and column attributes.
pub fn sales_config(rows: &[&str], cols: &[&str]) -> TableConfig {
    let pivot = PivotConfig::new(
        rows.iter().map(|s| s.to_string()).collect(),
        cols.iter().map(|s| s.to_string()).collect(),
    )
    .with_aggregation(AggregationType::Sum, "Sales");
    TableConfig::new(pivot)
}

pub fn create_table(config: TableConfig) -> SubtotalTable {
    SubtotalTable::with_data_factory(config, SalesFixture::table())
}

/// Renders and unwraps the table outcome.
pub fn render(table: &SubtotalTable) -> RenderedTable {
    match table.render().into_table() {
        Some(rendered) => rendered,
        None => panic!("expected a rendered table"),
    }
}

pub fn key(parts: &[&str]) -> Key {
    parts.iter().copied().collect()
}
