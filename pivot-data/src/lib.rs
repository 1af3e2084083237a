//! FILENAME: pivot-data/src/lib.rs
//! Leaf-level pivot data shared by the subtotal engine.
//!
//! Layers:
//! - `value` / `key`: Dimension values and the keys built from them
//! - `source`: The data source contract (leaf keys + per-leaf aggregates)
//! - `definition`: Serializable configuration (what to cross-tabulate)
//! - `records`: In-memory data source over tabular records

pub mod value;
pub mod key;
pub mod source;
pub mod definition;
pub mod accumulator;
pub mod records;
pub mod number_format;
pub mod error;

pub use value::{KeyValue, OrderedFloat};
pub use key::{Key, KeyValues};
pub use source::{identity_formatter, AggregatorResult, Formatter, PivotDataSource};
pub use definition::*;
pub use accumulator::AggregateAccumulator;
pub use records::{RecordPivotData, RecordTable};
pub use number_format::{format_number, NumberFormat};
pub use error::PivotDataError;
