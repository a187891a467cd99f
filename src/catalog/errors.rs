//! Catalog loader errors
//!
//! The reconciliation core never sees raw spreadsheet cells; every loader
//! failure is reported through one of these variants instead.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Catalog loading errors
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The sheet has a header but no usable data rows
    #[error("catalog sheet is empty: {0}")]
    EmptySheet(PathBuf),

    /// The file could not be opened or decoded
    #[error("catalog file unreadable: {path}: {reason}")]
    UnreadableFile { path: PathBuf, reason: String },

    /// One or more required columns are absent from the header
    #[error("catalog is missing required columns: {}", .0.join(", "))]
    MissingRequiredColumns(Vec<String>),

    /// A quantity cell is not an integral count
    #[error("catalog row {row}: invalid expected quantity '{raw}'")]
    InvalidQuantity { row: usize, raw: String },
}

impl CatalogError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            CatalogError::EmptySheet(_) => "STOCK_CATALOG_EMPTY_SHEET",
            CatalogError::UnreadableFile { .. } => "STOCK_CATALOG_UNREADABLE",
            CatalogError::MissingRequiredColumns(_) => "STOCK_CATALOG_MISSING_COLUMNS",
            CatalogError::InvalidQuantity { .. } => "STOCK_CATALOG_INVALID_QUANTITY",
        }
    }
}
