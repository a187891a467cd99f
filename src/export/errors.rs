//! Export errors

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::persistence::Retryable;

/// Result type for ledger export
pub type ExportResult<T> = Result<T, ExportError>;

#[derive(Debug, Error)]
pub enum ExportError {
    /// Template path does not name a readable file
    #[error("template not found: {}", .0.display())]
    TemplateMissing(PathBuf),

    /// Filesystem failure while copying or writing
    #[error("export io failed at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// CSV encoding failure
    #[error("ledger csv encoding failed: {0}")]
    Csv(#[from] csv::Error),
}

impl ExportError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ExportError::Io {
            path: path.into(),
            source,
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            ExportError::TemplateMissing(_) => "STOCK_EXPORT_TEMPLATE_MISSING",
            ExportError::Io { .. } => "STOCK_EXPORT_IO",
            ExportError::Csv(_) => "STOCK_EXPORT_CSV",
        }
    }
}

impl Retryable for ExportError {
    fn is_retryable(&self) -> bool {
        matches!(self, ExportError::Io { .. })
    }
}
