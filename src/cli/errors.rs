//! CLI error types
//!
//! Subsystem errors pass through unchanged so their codes reach the
//! operator; the CLI adds only request and lifecycle failures of its own.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::config::ConfigError;
use crate::export::ExportError;
use crate::persistence::PersistError;
use crate::session::SessionError;

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Persist(#[from] PersistError),

    #[error(transparent)]
    Export(#[from] ExportError),

    /// stdin/stdout failure
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// Line is not a valid request
    #[error("invalid request: {0}")]
    BadRequest(String),

    /// Only `recover` or `quit` accepted until the recovery offer is answered
    #[error("a snapshot is waiting; answer with op \"recover\" (restore or discard) first")]
    RecoveryRequired,

    /// Command needs a snapshot and there is none
    #[error("no snapshot at {}", .0.display())]
    NoSnapshot(PathBuf),

    /// Async runtime could not start
    #[error("runtime failed to start: {0}")]
    Runtime(String),
}

impl CliError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            CliError::Config(e) => e.code(),
            CliError::Catalog(e) => e.code(),
            CliError::Session(e) => e.code(),
            CliError::Persist(e) => e.code(),
            CliError::Export(e) => e.code(),
            CliError::Io(_) => "STOCK_CLI_IO_ERROR",
            CliError::BadRequest(_) => "STOCK_CLI_BAD_REQUEST",
            CliError::RecoveryRequired => "STOCK_CLI_RECOVERY_REQUIRED",
            CliError::NoSnapshot(_) => "STOCK_CLI_NO_SNAPSHOT",
            CliError::Runtime(_) => "STOCK_CLI_RUNTIME",
        }
    }

    /// Whether the operator must acknowledge before retrying.
    ///
    /// Validation, conflict and quota refusals are; IO and lifecycle
    /// failures are reported and the loop carries on.
    pub fn needs_ack(&self) -> bool {
        matches!(self, CliError::Session(_) | CliError::RecoveryRequired)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::BadRequest(e.to_string())
    }
}
