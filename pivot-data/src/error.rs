//! FILENAME: pivot-data/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PivotDataError {
    #[error("Unknown attribute: {0}")]
    UnknownAttribute(String),

    #[error("Record {row} has {found} values, expected {expected}")]
    RecordWidth {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Invalid pivot configuration: {0}")]
    InvalidConfig(#[from] serde_json::Error),
}
