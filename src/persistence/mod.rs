//! Persistence guard
//!
//! Crash-safe snapshots of the session and ledger:
//! - atomic replace (temp file, fsync, rename)
//! - debounced and periodic autosave driven by injected time
//! - one final write at shutdown
//! - operator-confirmed recovery at startup

mod errors;
mod guard;
mod recovery;
pub mod retry;
mod scheduler;
mod snapshot;
mod store;
pub mod timer;

pub use errors::{PersistError, PersistErrorKind, PersistResult};
pub use guard::PersistenceGuard;
pub use recovery::{restore_parts, RecoveryChoice, RecoveryOffer};
pub use retry::{RetryPolicy, Retryable};
pub use scheduler::{AutosaveScheduler, FlushReason};
pub use snapshot::{BackupSnapshot, SnapshotSummary};
pub use store::SnapshotStore;
pub use timer::{TimerSlot, TimerToken};
