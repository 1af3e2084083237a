//! FILENAME: subtotal-engine/src/engine.rs
//! Subtotal Table Engine - one render pass from configuration to view.
//!
//! A pass builds the pivot data through the attached factory, expands both
//! axes against the current collapse state, and lays out the table using
//! the span grids and a fresh aggregator cache. Nothing but the collapse
//! state survives between passes.

use log::{debug, error};
use pivot_data::{KeyValue, PivotConfig, PivotDataError, PivotDataSource, RecordTable};

use crate::aggregate::AggregatorCache;
use crate::collapse::{Axis, TableCollapse};
use crate::definition::{ClickCallback, FilterMap, TableConfig};
use crate::error::SubtotalError;
use crate::expand::{DisplayItem, SubtotalExpander};
use crate::key::KeyIdentity;
use crate::span::{Span, SpanGrid};
use crate::view::{CellType, CollapseToggle, RowDescriptor, RowType, SubtotalView, ViewCell};

// ============================================================================
// DATA FACTORY
// ============================================================================

/// Builds the leaf pivot data for a render pass.
pub trait PivotDataFactory {
    fn build(&self, config: &PivotConfig) -> Result<Box<dyn PivotDataSource>, PivotDataError>;
}

impl<F> PivotDataFactory for F
where
    F: Fn(&PivotConfig) -> Result<Box<dyn PivotDataSource>, PivotDataError>,
{
    fn build(&self, config: &PivotConfig) -> Result<Box<dyn PivotDataSource>, PivotDataError> {
        self(config)
    }
}

impl PivotDataFactory for RecordTable {
    fn build(&self, config: &PivotConfig) -> Result<Box<dyn PivotDataSource>, PivotDataError> {
        Ok(Box::new(self.pivot(config)?))
    }
}

// ============================================================================
// RENDER OUTCOME
// ============================================================================

/// Result of a render pass.
pub enum RenderOutcome {
    Table(RenderedTable),
    /// The pass was aborted; `message` is shown in place of the table.
    Placeholder { message: String },
}

impl RenderOutcome {
    pub fn table(&self) -> Option<&RenderedTable> {
        match self {
            RenderOutcome::Table(table) => Some(table),
            RenderOutcome::Placeholder { .. } => None,
        }
    }

    pub fn into_table(self) -> Option<RenderedTable> {
        match self {
            RenderOutcome::Table(table) => Some(table),
            RenderOutcome::Placeholder { .. } => None,
        }
    }

    pub fn placeholder(&self) -> Option<&str> {
        match self {
            RenderOutcome::Table(_) => None,
            RenderOutcome::Placeholder { message } => Some(message),
        }
    }
}

/// A rendered view together with the data it was computed from.
pub struct RenderedTable {
    view: SubtotalView,
    data: Box<dyn PivotDataSource>,
    click_callback: Option<ClickCallback>,
}

impl RenderedTable {
    pub fn view(&self) -> &SubtotalView {
        &self.view
    }

    pub fn into_view(self) -> SubtotalView {
        self.view
    }

    pub fn data(&self) -> &dyn PivotDataSource {
        self.data.as_ref()
    }

    /// Dispatches a click on the cell at (`row`, `cell`) of the view.
    /// Returns true if the click callback ran.
    pub fn click(&self, row: usize, cell: usize) -> bool {
        let callback = match &self.click_callback {
            Some(callback) => callback,
            None => return false,
        };
        let target = match self.view.get_cell(row, cell) {
            Some(target) => target,
            None => return false,
        };
        match &target.filters {
            Some(filters) => {
                callback(target.value, filters, self.data.as_ref());
                true
            }
            None => false,
        }
    }
}

// ============================================================================
// SUBTOTAL TABLE
// ============================================================================

/// A subtotal table: configuration, data factory and collapse state.
pub struct SubtotalTable {
    config: TableConfig,
    collapse: TableCollapse,
    factory: Option<Box<dyn PivotDataFactory>>,
}

impl SubtotalTable {
    /// Table without a data factory. Rendering yields a placeholder until one is attached.
    pub fn new(config: TableConfig) -> Self {
        SubtotalTable {
            config,
            collapse: TableCollapse::new(),
            factory: None,
        }
    }

    pub fn with_data_factory<F: PivotDataFactory + 'static>(config: TableConfig, factory: F) -> Self {
        SubtotalTable {
            config,
            collapse: TableCollapse::new(),
            factory: Some(Box::new(factory)),
        }
    }

    pub fn set_data_factory<F: PivotDataFactory + 'static>(&mut self, factory: F) {
        self.factory = Some(Box::new(factory));
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut TableConfig {
        &mut self.config
    }

    pub fn collapse(&self) -> &TableCollapse {
        &self.collapse
    }

    /// Flips the collapse state of a row group. Returns the new state.
    pub fn toggle_row(&mut self, identity: KeyIdentity) -> bool {
        self.collapse.toggle(Axis::Row, identity)
    }

    /// Flips the collapse state of a column group. Returns the new state.
    pub fn toggle_col(&mut self, identity: KeyIdentity) -> bool {
        self.collapse.toggle(Axis::Column, identity)
    }

    /// Applies a toggle descriptor taken from a rendered view.
    pub fn apply_toggle(&mut self, toggle: &CollapseToggle) -> bool {
        self.collapse.toggle(toggle.axis, toggle.identity.clone())
    }

    /// Runs a render pass. Failures become a placeholder; collapse state is kept.
    pub fn render(&self) -> RenderOutcome {
        match self.try_render() {
            Ok(table) => RenderOutcome::Table(table),
            Err(e) => {
                error!("[SUBTOTAL] render failed: {}", e);
                let message = match e {
                    SubtotalError::DataSourceMissing => format!("Error: {}", e),
                    _ => "Error rendering pivot table".to_string(),
                };
                RenderOutcome::Placeholder { message }
            }
        }
    }

    pub fn try_render(&self) -> Result<RenderedTable, SubtotalError> {
        let factory = self.factory.as_ref().ok_or(SubtotalError::DataSourceMissing)?;
        let data = factory.build(&self.config.pivot)?;

        let view = TableRenderer::new(&self.config, &self.collapse, data.as_ref()).render();
        debug!(
            "[SUBTOTAL] rendered rows={} cols={} table_rows={}",
            view.row_items.len(),
            view.col_items.len(),
            view.row_count()
        );

        Ok(RenderedTable {
            view,
            data,
            click_callback: self.config.table_options.click_callback.clone(),
        })
    }
}

// ============================================================================
// TABLE RENDERER
// ============================================================================

/// Lays out one render pass.
pub struct TableRenderer<'a> {
    config: &'a TableConfig,
    data: &'a dyn PivotDataSource,
    cache: AggregatorCache<'a>,

    row_attrs: &'a [String],
    col_attrs: &'a [String],

    row_items: Vec<DisplayItem>,
    col_items: Vec<DisplayItem>,

    row_spans: SpanGrid,
    col_spans: SpanGrid,
}

impl<'a> TableRenderer<'a> {
    pub fn new(config: &'a TableConfig, collapse: &TableCollapse, data: &'a dyn PivotDataSource) -> Self {
        let row_attrs = data.row_attrs();
        let col_attrs = data.col_attrs();

        let row_items = SubtotalExpander::with_ordering(row_attrs.len(), config.row_ordering)
            .expand(data.row_keys(), &collapse.rows);
        let col_items = SubtotalExpander::with_ordering(col_attrs.len(), config.col_ordering)
            .expand(data.col_keys(), &collapse.cols);

        let row_spans = SpanGrid::compute(&row_items, max_level(&row_items));
        let col_spans = SpanGrid::compute(&col_items, max_level(&col_items));

        TableRenderer {
            config,
            data,
            cache: AggregatorCache::new(data),
            row_attrs,
            col_attrs,
            row_items,
            col_items,
            row_spans,
            col_spans,
        }
    }

    pub fn render(mut self) -> SubtotalView {
        let mut view = SubtotalView::default();

        self.render_header(&mut view);
        view.column_header_row_count = view.row_count();
        self.render_body(&mut view);
        if self.config.col_total {
            self.render_totals_row(&mut view);
        }

        view.row_items = self.row_items;
        view.col_items = self.col_items;
        view
    }

    fn has_row_attrs(&self) -> bool {
        !self.row_attrs.is_empty()
    }

    fn has_col_attrs(&self) -> bool {
        !self.col_attrs.is_empty()
    }

    fn label(&self, attrs: &[String], level: usize, value: &KeyValue) -> String {
        let attr = attrs.get(level).map(String::as_str).unwrap_or("");
        self.config.labels.apply(attr, value)
    }

    fn toggle(&self, axis: Axis, item: &DisplayItem) -> CollapseToggle {
        CollapseToggle {
            axis,
            identity: item.identity(),
            collapsed: item.is_collapsed,
            arrow: self.config.subtotal_options.arrow(item.is_collapsed).to_string(),
        }
    }

    /// Attribute filters for a value cell: column values first, then row
    /// values, skipping empty elements.
    fn filters(&self, row_key: &[KeyValue], col_key: &[KeyValue]) -> FilterMap {
        let mut filters = FilterMap::default();
        for (attr, value) in self.col_attrs.iter().zip(col_key) {
            if !value.is_empty() {
                filters.insert(attr.clone(), value.clone());
            }
        }
        for (attr, value) in self.row_attrs.iter().zip(row_key) {
            if !value.is_empty() {
                filters.insert(attr.clone(), value.clone());
            }
        }
        filters
    }

    fn value_cell(&mut self, cell_type: CellType, row_key: &[KeyValue], col_key: &[KeyValue]) -> ViewCell {
        let result = self.cache.get_aggregator(row_key, col_key);
        let filters = self.filters(row_key, col_key);
        ViewCell::value(cell_type, &result, filters)
    }

    // ------------------------------------------------------------------------
    // Header
    // ------------------------------------------------------------------------

    fn render_header(&self, view: &mut SubtotalView) {
        let row_attr_count = self.row_attrs.len();
        let col_attr_count = self.col_attrs.len();
        let label_row = usize::from(self.has_row_attrs());

        for (j, col_attr) in self.col_attrs.iter().enumerate() {
            let mut cells = Vec::new();

            if j == 0 && self.has_row_attrs() {
                cells.push(ViewCell::corner().with_span(col_attr_count, row_attr_count));
            }

            cells.push(ViewCell::header(CellType::AxisLabel, col_attr.clone()));

            for (i, item) in self.col_items.iter().enumerate() {
                if j >= item.key.len() {
                    continue;
                }
                let col_span = match self.col_spans.get(i, j) {
                    Span::Render(n) => n,
                    Span::Suppress => continue,
                };
                let is_last_level = j == item.key.len() - 1;

                if item.is_subtotal && is_last_level {
                    let text = item.label.clone().unwrap_or_default();
                    let row_span = (col_attr_count - j) + label_row;
                    cells.push(
                        ViewCell::header(CellType::ColumnSubtotalHeader, text)
                            .with_span(row_span, col_span)
                            .with_toggle(self.toggle(Axis::Column, item))
                            .as_subtotal(),
                    );
                } else {
                    let text = self.label(self.col_attrs, j, &item.key[j]);
                    let row_span = if is_last_level && self.has_row_attrs() { 2 } else { 1 };
                    cells.push(ViewCell::header(CellType::ColumnHeader, text).with_span(row_span, col_span));
                }
            }

            if j == 0 && self.config.row_total {
                cells.push(
                    ViewCell::header(CellType::TotalLabel, self.config.locale_strings.totals.clone())
                        .with_span(col_attr_count + label_row, 1),
                );
            }

            view.add_row(cells, RowDescriptor::header(RowType::ColumnHeader));
        }

        if self.has_row_attrs() {
            let mut cells: Vec<ViewCell> = self
                .row_attrs
                .iter()
                .map(|attr| ViewCell::header(CellType::AxisLabel, attr.clone()))
                .collect();

            if self.has_col_attrs() {
                cells.push(ViewCell::blank());
            } else if self.config.row_total {
                cells.push(ViewCell::header(
                    CellType::TotalLabel,
                    self.config.locale_strings.totals.clone(),
                ));
            }

            view.add_row(cells, RowDescriptor::header(RowType::AttributeLabel));
        }
    }

    // ------------------------------------------------------------------------
    // Body
    // ------------------------------------------------------------------------

    fn render_body(&mut self, view: &mut SubtotalView) {
        for i in 0..self.row_items.len() {
            let item = self.row_items[i].clone();
            let cells = if item.is_subtotal {
                self.subtotal_row(&item)
            } else {
                self.leaf_row(i, &item)
            };
            view.add_row(cells, RowDescriptor::body(i, &item));
        }
    }

    fn subtotal_row(&mut self, item: &DisplayItem) -> Vec<ViewCell> {
        let mut cells = Vec::with_capacity(self.col_items.len() + 2);

        let label_span = self.row_attrs.len() + usize::from(self.has_col_attrs());
        cells.push(
            ViewCell::header(CellType::RowSubtotalHeader, item.label.clone().unwrap_or_default())
                .with_span(1, label_span)
                .with_toggle(self.toggle(Axis::Row, item))
                .as_subtotal(),
        );

        for j in 0..self.col_items.len() {
            let col_key = self.col_items[j].key.clone();
            let cell = if self.col_items[j].is_subtotal {
                self.value_cell(CellType::DoubleSubtotal, &item.key, &col_key)
                    .as_double_subtotal()
            } else {
                self.value_cell(CellType::RowSubtotal, &item.key, &col_key)
                    .as_subtotal()
            };
            cells.push(cell);
        }

        if self.config.row_total {
            cells.push(
                self.value_cell(CellType::RowSubtotalTotal, &item.key, &[])
                    .as_double_subtotal(),
            );
        }

        cells
    }

    fn leaf_row(&mut self, i: usize, item: &DisplayItem) -> Vec<ViewCell> {
        let mut cells = Vec::with_capacity(item.key.len() + self.col_items.len() + 1);
        let row_attr_count = self.row_attrs.len();

        for (j, value) in item.key.iter().enumerate() {
            let row_span = match self.row_spans.get(i, j) {
                Span::Render(n) => n,
                Span::Suppress => continue,
            };
            let col_span = if j + 1 == row_attr_count && self.has_col_attrs() { 2 } else { 1 };
            let text = self.label(self.row_attrs, j, value);
            cells.push(ViewCell::header(CellType::RowHeader, text).with_span(row_span, col_span));
        }

        for j in 0..self.col_items.len() {
            let col_key = self.col_items[j].key.clone();
            let cell = if self.col_items[j].is_subtotal {
                self.value_cell(CellType::ColumnSubtotal, &item.key, &col_key)
                    .as_subtotal()
            } else {
                self.value_cell(CellType::Data, &item.key, &col_key)
            };
            cells.push(cell);
        }

        if self.config.row_total {
            cells.push(self.value_cell(CellType::RowTotal, &item.key, &[]).as_total());
        }

        cells
    }

    fn render_totals_row(&mut self, view: &mut SubtotalView) {
        let mut cells = Vec::with_capacity(self.col_items.len() + 2);

        let label_span = (self.row_attrs.len() + usize::from(self.has_col_attrs())).max(1);
        cells.push(
            ViewCell::header(CellType::TotalLabel, self.config.locale_strings.totals.clone())
                .with_span(1, label_span),
        );

        for j in 0..self.col_items.len() {
            let col_key = self.col_items[j].key.clone();
            let cell = if self.col_items[j].is_subtotal {
                self.value_cell(CellType::ColumnSubtotalTotal, &[], &col_key)
                    .as_double_subtotal()
            } else {
                self.value_cell(CellType::ColumnTotal, &[], &col_key).as_total()
            };
            cells.push(cell);
        }

        if self.config.row_total {
            let grand_total = self.data.aggregator(&[], &[]);
            cells.push(ViewCell::value(CellType::GrandTotal, &grand_total, FilterMap::default()).as_total());
        }

        view.add_row(cells, RowDescriptor::header(RowType::ColumnTotals));
    }
}

fn max_level(items: &[DisplayItem]) -> usize {
    items.iter().map(|item| item.key.len()).max().unwrap_or(0)
}

