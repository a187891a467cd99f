//! Session error types
//!
//! Every variant is recoverable: the triggering action is refused, the
//! session is left exactly as it was, and the operator acknowledges before
//! retrying.

use thiserror::Error;

/// Result type for session transitions
pub type SessionResult<T> = Result<T, SessionError>;

/// Classification used by the adapter layer to decide how to prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionErrorKind {
    /// Required input missing or malformed
    Validation,
    /// Proposed box or relocation code aliases a catalog box
    Conflict,
    /// Fewer known entries than the box quota; overridable
    Quota,
    /// Uncommitted entries block the action; commit or discard first
    Pending,
}

/// Session transition errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Commit without a crew name
    #[error("crew is required to commit")]
    MissingCrew,

    /// Commit without a date
    #[error("date is required to commit")]
    MissingDate,

    /// Blank scan
    #[error("scanned code is empty")]
    EmptyCode,

    /// Blank box id
    #[error("box id is empty")]
    EmptyBoxId,

    /// Scan or commit while idle
    #[error("no box assigned")]
    NoBoxAssigned,

    /// Edit of an entry that is not in the session
    #[error("no scan entry for sku '{0}'")]
    UnknownEntry(String),

    /// Negative counts are never accepted
    #[error("quantity for '{sku}' must not be negative (got {value})")]
    NegativeQuantity { sku: String, value: i64 },

    /// Expected quantity comes from the catalog for known skus
    #[error("expected quantity of catalog sku '{0}' cannot be edited")]
    ExpectedQtyLocked(String),

    /// Commit of an empty session
    #[error("session has no entries to commit")]
    NothingToCommit,

    /// A fresh box id collides with a catalog box
    #[error("box id '{0}' already exists in the catalog")]
    BoxConflict(String),

    /// A relocation code collides with a catalog box
    #[error("relocation code '{0}' collides with a catalog box")]
    RelocationConflict(String),

    /// Box is read-only while entries are uncommitted
    #[error("box '{box_id}' has {pending} uncommitted entries; commit or discard first")]
    BoxLocked { box_id: String, pending: usize },

    /// Known entries below the box quota
    #[error("only {scanned} of {quota} catalog items scanned in box '{box_id}'")]
    QuotaShortfall {
        box_id: String,
        scanned: usize,
        quota: usize,
    },
}

impl SessionError {
    /// Classification for prompting.
    pub fn kind(&self) -> SessionErrorKind {
        match self {
            SessionError::BoxConflict(_) | SessionError::RelocationConflict(_) => {
                SessionErrorKind::Conflict
            }
            SessionError::QuotaShortfall { .. } => SessionErrorKind::Quota,
            SessionError::BoxLocked { .. } => SessionErrorKind::Pending,
            _ => SessionErrorKind::Validation,
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            SessionError::MissingCrew => "STOCK_SESSION_MISSING_CREW",
            SessionError::MissingDate => "STOCK_SESSION_MISSING_DATE",
            SessionError::EmptyCode => "STOCK_SESSION_EMPTY_CODE",
            SessionError::EmptyBoxId => "STOCK_SESSION_EMPTY_BOX_ID",
            SessionError::NoBoxAssigned => "STOCK_SESSION_NO_BOX",
            SessionError::UnknownEntry(_) => "STOCK_SESSION_UNKNOWN_ENTRY",
            SessionError::NegativeQuantity { .. } => "STOCK_SESSION_NEGATIVE_QTY",
            SessionError::ExpectedQtyLocked(_) => "STOCK_SESSION_EXPECTED_LOCKED",
            SessionError::NothingToCommit => "STOCK_SESSION_NOTHING_TO_COMMIT",
            SessionError::BoxConflict(_) => "STOCK_SESSION_BOX_CONFLICT",
            SessionError::RelocationConflict(_) => "STOCK_SESSION_RELOCATION_CONFLICT",
            SessionError::BoxLocked { .. } => "STOCK_SESSION_BOX_LOCKED",
            SessionError::QuotaShortfall { .. } => "STOCK_SESSION_QUOTA_SHORTFALL",
        }
    }
}
