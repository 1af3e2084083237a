//! FILENAME: subtotal-engine/src/view.rs
//! Subtotal View - presentation-neutral output of one render pass.
//!
//! The view is a list of table rows, each a list of cells with row/column
//! spans. Header rows come first (`column_header_row_count` of them),
//! followed by the body rows and the optional column totals row. Cells carry:
//! - a cell type and background hint for styling
//! - a collapse toggle on subtotal headers
//! - the filter map of value cells, handed to the click callback

use pivot_data::{AggregatorResult, Key};
use serde::{Deserialize, Serialize};

use crate::collapse::Axis;
use crate::definition::FilterMap;
use crate::expand::DisplayItem;
use crate::key::KeyIdentity;

// ============================================================================
// CELL TYPES AND METADATA
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellType {
    /// Empty top-left area above the row labels.
    Corner,
    /// Attribute name (row or column axis).
    AxisLabel,
    RowHeader,
    ColumnHeader,
    /// Row subtotal label with collapse toggle.
    RowSubtotalHeader,
    /// Column subtotal label with collapse toggle.
    ColumnSubtotalHeader,
    /// "Totals" label.
    TotalLabel,
    Data,
    /// Subtotal row x leaf column.
    RowSubtotal,
    /// Leaf row x subtotal column.
    ColumnSubtotal,
    /// Subtotal row x subtotal column.
    DoubleSubtotal,
    /// Row total of a leaf row.
    RowTotal,
    /// Row total of a subtotal row.
    RowSubtotalTotal,
    /// Column total of a leaf column.
    ColumnTotal,
    /// Column total of a subtotal column.
    ColumnSubtotalTotal,
    GrandTotal,
    /// Layout filler.
    Blank,
}

impl CellType {
    /// Whether the cell shows an aggregate value.
    pub fn is_value(&self) -> bool {
        matches!(
            self,
            CellType::Data
                | CellType::RowSubtotal
                | CellType::ColumnSubtotal
                | CellType::DoubleSubtotal
                | CellType::RowTotal
                | CellType::RowSubtotalTotal
                | CellType::ColumnTotal
                | CellType::ColumnSubtotalTotal
                | CellType::GrandTotal
        )
    }
}

/// Background style hints for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackgroundStyle {
    Normal,
    Header,
    Subtotal,
    /// Subtotal crossing another subtotal or a total.
    DoubleSubtotal,
    Total,
}

impl Default for BackgroundStyle {
    fn default() -> Self {
        BackgroundStyle::Normal
    }
}

/// Everything the presentation layer needs to wire a collapse toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollapseToggle {
    pub axis: Axis,
    pub identity: KeyIdentity,
    pub collapsed: bool,
    pub arrow: String,
}

// ============================================================================
// VIEW CELL
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewCell {
    pub cell_type: CellType,

    /// Pre-formatted display string.
    pub text: String,

    /// Aggregate value of value cells; `None` renders as no data.
    pub value: Option<f64>,

    pub row_span: usize,
    pub col_span: usize,

    pub is_bold: bool,
    pub background_style: BackgroundStyle,

    pub toggle: Option<CollapseToggle>,

    /// Attribute filters of value cells.
    pub filters: Option<FilterMap>,
}

impl ViewCell {
    fn new(cell_type: CellType, text: String, background_style: BackgroundStyle) -> Self {
        ViewCell {
            cell_type,
            text,
            value: None,
            row_span: 1,
            col_span: 1,
            is_bold: false,
            background_style,
            toggle: None,
            filters: None,
        }
    }

    pub fn header(cell_type: CellType, text: impl Into<String>) -> Self {
        ViewCell::new(cell_type, text.into(), BackgroundStyle::Header)
    }

    pub fn corner() -> Self {
        ViewCell::new(CellType::Corner, String::new(), BackgroundStyle::Header)
    }

    pub fn blank() -> Self {
        ViewCell::new(CellType::Blank, String::new(), BackgroundStyle::Header)
    }

    /// Value cell showing `result` formatted by its own formatter.
    pub fn value(cell_type: CellType, result: &AggregatorResult, filters: FilterMap) -> Self {
        let mut cell = ViewCell::new(cell_type, result.formatted(), BackgroundStyle::Normal);
        cell.value = result.numeric_value();
        cell.filters = Some(filters);
        cell
    }

    pub fn with_span(mut self, row_span: usize, col_span: usize) -> Self {
        self.row_span = row_span;
        self.col_span = col_span;
        self
    }

    pub fn with_toggle(mut self, toggle: CollapseToggle) -> Self {
        self.toggle = Some(toggle);
        self
    }

    pub fn as_subtotal(mut self) -> Self {
        self.is_bold = true;
        self.background_style = BackgroundStyle::Subtotal;
        self
    }

    pub fn as_double_subtotal(mut self) -> Self {
        self.is_bold = true;
        self.background_style = BackgroundStyle::DoubleSubtotal;
        self
    }

    pub fn as_total(mut self) -> Self {
        self.background_style = BackgroundStyle::Total;
        self
    }
}

// ============================================================================
// ROW DESCRIPTORS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowType {
    /// One header row per column attribute.
    ColumnHeader,
    /// Row attribute names.
    AttributeLabel,
    Data,
    Subtotal,
    /// Column totals and the grand total.
    ColumnTotals,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowDescriptor {
    pub row_type: RowType,

    /// Index into `SubtotalView::row_items` for body rows.
    pub item_index: Option<usize>,

    pub key: Option<Key>,
}

impl RowDescriptor {
    pub fn header(row_type: RowType) -> Self {
        RowDescriptor {
            row_type,
            item_index: None,
            key: None,
        }
    }

    pub fn body(item_index: usize, item: &DisplayItem) -> Self {
        RowDescriptor {
            row_type: if item.is_subtotal { RowType::Subtotal } else { RowType::Data },
            item_index: Some(item_index),
            key: Some(item.key.clone()),
        }
    }
}

// ============================================================================
// MAIN VIEW STRUCT
// ============================================================================

/// The complete rendered subtotal table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubtotalView {
    /// Table rows; each row lists only the cells it renders.
    pub cells: Vec<Vec<ViewCell>>,

    /// Metadata for each row of `cells`.
    pub rows: Vec<RowDescriptor>,

    /// Number of header rows at the top of `cells`.
    pub column_header_row_count: usize,

    /// Visible row items in display order.
    pub row_items: Vec<DisplayItem>,

    /// Visible column items in display order.
    pub col_items: Vec<DisplayItem>,
}

impl SubtotalView {
    pub fn add_row(&mut self, cells: Vec<ViewCell>, descriptor: RowDescriptor) {
        self.cells.push(cells);
        self.rows.push(descriptor);
    }

    pub fn row_count(&self) -> usize {
        self.cells.len()
    }

    pub fn get_cell(&self, row: usize, cell: usize) -> Option<&ViewCell> {
        self.cells.get(row).and_then(|r| r.get(cell))
    }

    /// Body rows (everything below the header).
    pub fn body(&self) -> &[Vec<ViewCell>] {
        let start = self.column_header_row_count.min(self.cells.len());
        &self.cells[start..]
    }

    /// Every collapse toggle in the view, in table order.
    pub fn toggles(&self) -> impl Iterator<Item = &CollapseToggle> {
        self.cells.iter().flatten().filter_map(|cell| cell.toggle.as_ref())
    }

    /// Display text of every cell in a row.
    pub fn row_text(&self, row: usize) -> Vec<&str> {
        self.cells
            .get(row)
            .map(|r| r.iter().map(|c| c.text.as_str()).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pivot_data::identity_formatter;

    #[test]
    fn test_value_cell() {
        let result = AggregatorResult::new(Some(12.0), identity_formatter());
        let cell = ViewCell::value(CellType::Data, &result, FilterMap::default());
        assert_eq!(cell.text, "12");
        assert_eq!(cell.value, Some(12.0));
        assert!(cell.filters.is_some());
        assert!(cell.cell_type.is_value());
    }

    #[test]
    fn test_no_data_cell() {
        let result = AggregatorResult::empty();
        let cell = ViewCell::value(CellType::RowSubtotal, &result, FilterMap::default()).as_subtotal();
        assert_eq!(cell.text, "");
        assert_eq!(cell.value, None);
        assert!(cell.is_bold);
        assert_eq!(cell.background_style, BackgroundStyle::Subtotal);
    }

    #[test]
    fn test_header_cells_are_not_values() {
        let cell = ViewCell::header(CellType::RowHeader, "North").with_span(2, 1);
        assert!(!cell.cell_type.is_value());
        assert_eq!(cell.row_span, 2);
        assert!(cell.filters.is_none());
    }

    #[test]
    fn test_view_rows() {
        let mut view = SubtotalView::default();
        view.add_row(vec![ViewCell::corner(), ViewCell::header(CellType::AxisLabel, "Year")], RowDescriptor::header(RowType::ColumnHeader));
        view.column_header_row_count = 1;
        view.add_row(vec![ViewCell::header(CellType::RowHeader, "A")], RowDescriptor::header(RowType::Data));

        assert_eq!(view.row_count(), 2);
        assert_eq!(view.body().len(), 1);
        assert_eq!(view.row_text(0), vec!["", "Year"]);
        assert!(view.get_cell(5, 0).is_none());
    }
}
