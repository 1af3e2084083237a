//! FILENAME: subtotal-engine/src/error.rs

use pivot_data::PivotDataError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SubtotalError {
    #[error("Pivot data source not initialized. Attach a data factory before rendering.")]
    DataSourceMissing,

    #[error("Error building pivot data: {0}")]
    DataSource(#[from] PivotDataError),

    #[error("Invalid table configuration: {0}")]
    Config(#[from] serde_json::Error),
}
