//! Persistence errors
//!
//! IO failures are retried and then surfaced; they never touch in-memory
//! state. A corrupt snapshot is reported once at startup and the file is
//! kept for inspection.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for persistence operations
pub type PersistResult<T> = Result<T, PersistError>;

/// Classification of persistence failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistErrorKind {
    /// Filesystem failure; transient in principle
    Io,
    /// Snapshot on disk cannot be parsed
    CorruptState,
    /// Write refused until the operator answers the recovery offer
    RecoveryPending,
}

/// Persistence errors
#[derive(Debug, Error)]
pub enum PersistError {
    /// Read, write, fsync or rename failed
    #[error("snapshot io failed at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Snapshot exists but is not a valid snapshot document
    #[error("snapshot is corrupt: {}: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    /// In-memory state could not be encoded
    #[error("snapshot serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The previous snapshot could not be copied aside, so it is not overwritten
    #[error("could not preserve {} before overwrite: {source}", path.display())]
    PreserveFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Recovery offer still open
    #[error("recovery decision pending; snapshot writes are held")]
    RecoveryPending,

    /// `resolve` called without an open recovery offer
    #[error("no recovery offer is open")]
    NoRecoveryOffer,
}

impl PersistError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        PersistError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> PersistErrorKind {
        match self {
            PersistError::Io { .. }
            | PersistError::Serialize(_)
            | PersistError::PreserveFailed { .. } => PersistErrorKind::Io,
            PersistError::Corrupt { .. } => PersistErrorKind::CorruptState,
            PersistError::RecoveryPending | PersistError::NoRecoveryOffer => {
                PersistErrorKind::RecoveryPending
            }
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            PersistError::Io { .. } => "STOCK_PERSIST_IO",
            PersistError::Corrupt { .. } => "STOCK_PERSIST_CORRUPT",
            PersistError::Serialize(_) => "STOCK_PERSIST_SERIALIZE",
            PersistError::PreserveFailed { .. } => "STOCK_PERSIST_PRESERVE_FAILED",
            PersistError::RecoveryPending => "STOCK_PERSIST_RECOVERY_PENDING",
            PersistError::NoRecoveryOffer => "STOCK_PERSIST_NO_RECOVERY_OFFER",
        }
    }
}

impl super::retry::Retryable for PersistError {
    fn is_retryable(&self) -> bool {
        matches!(self, PersistError::Io { .. } | PersistError::PreserveFailed { .. })
    }
}
