//! Scanning session
//!
//! Owns the current box assignment and the scans not yet committed to the
//! ledger. The session is an explicit value; every change goes through
//! [`apply`], which returns the next state plus the effects to act on.
//!
//! # Phases
//!
//! ```text
//! Idle --AssignBox--> BoxAssigned --Scan--> Scanning --Commit--> Committed --> Idle
//!                          ^                    |
//!                          +------Discard-------+
//! ```
//!
//! From the first scan until commit or discard the box id is read-only.

mod entry;
mod errors;
mod state;
mod summary;
mod transition;

pub use entry::ScanEntry;
pub use errors::{SessionError, SessionErrorKind, SessionResult};
pub use state::{BoxAssignment, SessionPhase, SessionState};
pub use summary::SessionSummary;
pub use transition::{
    apply, CommitBatch, CommitRequest, Effect, FieldEdit, PendingPolicy, QuotaOverride,
    ScanOutcome, SessionEvent, Transition,
};

/// Session key form of a sku.
pub fn normalize_sku(sku: &str) -> &str {
    sku.trim()
}
