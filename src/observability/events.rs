//! Observable events
//!
//! Every log line carries one of these as its `event` field, so a log
//! reader can filter on a fixed vocabulary instead of message text.

use std::fmt;

/// Observable events in a stocktake run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// Process startup begins
    BootStart,
    /// Event loop ready for requests
    Serving,
    /// Shutdown initiated
    ShutdownStart,
    /// Final write done, exiting
    ShutdownComplete,

    // Inputs
    /// Configuration file loaded and validated
    ConfigLoaded,
    /// Catalog CSV loaded
    CatalogLoaded,

    // Session
    /// Box assigned to the session
    BoxAssigned,
    /// Box released by a discard
    BoxReleased,
    /// Scan matched a catalog row of the assigned box
    ScanRecorded,
    /// Scan matched a catalog row of another box
    ScanWrongBox,
    /// Scan matched nothing
    ScanNotFound,
    /// Entry field edited
    EntryEdited,
    /// Session rejected an operator action
    ActionRejected,
    /// Session committed to the ledger
    SessionCommitted,
    /// Commit went through below quota
    QuotaOverridden,
    /// Uncommitted entries discarded
    SessionDiscarded,

    // Persistence
    /// Snapshot written atomically
    SnapshotWritten,
    /// A snapshot or export write attempt failed and will be retried
    WriteRetry,
    /// Snapshot write failed after all retries
    SnapshotWriteFailed,
    /// Autosave timer armed or cancelled
    AutosaveScheduled,

    // Recovery
    /// Snapshot found at startup; operator asked to choose
    RecoveryOffered,
    /// Snapshot restored into memory
    RecoveryRestored,
    /// Operator declined the snapshot
    RecoveryDiscarded,
    /// Snapshot could not be parsed at startup
    SnapshotCorrupt,
    /// Copy of an old snapshot kept before it is overwritten
    SnapshotPreserved,

    // Export
    /// Ledger exported
    ExportComplete,
    /// Export failed after all retries
    ExportFailed,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::BootStart => "STOCKTAKE_STARTUP_BEGIN",
            Event::Serving => "STOCKTAKE_SERVING",
            Event::ShutdownStart => "SHUTDOWN_START",
            Event::ShutdownComplete => "SHUTDOWN_COMPLETE",

            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::CatalogLoaded => "CATALOG_LOADED",

            Event::BoxAssigned => "BOX_ASSIGNED",
            Event::BoxReleased => "BOX_RELEASED",
            Event::ScanRecorded => "SCAN_RECORDED",
            Event::ScanWrongBox => "SCAN_WRONG_BOX",
            Event::ScanNotFound => "SCAN_NOT_FOUND",
            Event::EntryEdited => "ENTRY_EDITED",
            Event::ActionRejected => "ACTION_REJECTED",
            Event::SessionCommitted => "SESSION_COMMITTED",
            Event::QuotaOverridden => "QUOTA_OVERRIDDEN",
            Event::SessionDiscarded => "SESSION_DISCARDED",

            Event::SnapshotWritten => "SNAPSHOT_WRITTEN",
            Event::WriteRetry => "WRITE_RETRY",
            Event::SnapshotWriteFailed => "SNAPSHOT_WRITE_FAILED",
            Event::AutosaveScheduled => "AUTOSAVE_SCHEDULED",

            Event::RecoveryOffered => "RECOVERY_OFFERED",
            Event::RecoveryRestored => "RECOVERY_RESTORED",
            Event::RecoveryDiscarded => "RECOVERY_DISCARDED",
            Event::SnapshotCorrupt => "SNAPSHOT_CORRUPT",
            Event::SnapshotPreserved => "SNAPSHOT_PRESERVED",

            Event::ExportComplete => "EXPORT_COMPLETE",
            Event::ExportFailed => "EXPORT_FAILED",
        }
    }

    /// Returns true if the event reports lost durability
    pub fn is_failure(&self) -> bool {
        matches!(self, Event::SnapshotWriteFailed | Event::ExportFailed)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
