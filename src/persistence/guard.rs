//! Persistence guard
//!
//! Owns the snapshot store and the autosave policy. The guard never holds
//! session or ledger state itself; callers hand it a fresh
//! [`BackupSnapshot`] whenever it decides to write.
//!
//! Write gating:
//! - while a recovery offer is open, nothing is written
//! - after a discard or a corrupt startup, the old file is copied aside
//!   before the first overwrite; if that copy fails, the write is refused

use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use super::errors::{PersistError, PersistResult};
use super::recovery::{RecoveryChoice, RecoveryOffer};
use super::retry::RetryPolicy;
use super::scheduler::{AutosaveScheduler, FlushReason};
use super::snapshot::BackupSnapshot;
use super::store::SnapshotStore;
use crate::config::Config;
use crate::observability::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteGate {
    Open,
    AwaitingRecovery,
    PreserveFirst(&'static str),
}

pub struct PersistenceGuard {
    store: SnapshotStore,
    retry: RetryPolicy,
    scheduler: AutosaveScheduler,
    gate: WriteGate,
    offered: Option<BackupSnapshot>,
    last_saved: Option<i64>,
}

impl PersistenceGuard {
    pub fn new(
        store: SnapshotStore,
        retry: RetryPolicy,
        debounce: Duration,
        interval: Duration,
        now: Instant,
    ) -> Self {
        Self {
            store,
            retry,
            scheduler: AutosaveScheduler::new(debounce, interval, now),
            gate: WriteGate::Open,
            offered: None,
            last_saved: None,
        }
    }

    pub fn from_config(config: &Config, now: Instant) -> Self {
        Self::new(
            SnapshotStore::new(&config.data_dir, &config.snapshot_file),
            config.retry_policy(),
            config.debounce(),
            config.autosave_interval(),
            now,
        )
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn is_dirty(&self) -> bool {
        self.scheduler.is_dirty()
    }

    pub fn awaiting_recovery(&self) -> bool {
        self.gate == WriteGate::AwaitingRecovery
    }

    /// Timestamp of the last snapshot this process wrote.
    pub fn last_saved(&self) -> Option<i64> {
        self.last_saved
    }

    /// Inspect the snapshot on disk.
    pub fn startup(&mut self) -> RecoveryOffer {
        match self.store.read() {
            Ok(None) => {
                self.gate = WriteGate::Open;
                RecoveryOffer::Fresh
            }
            Ok(Some(snapshot)) => {
                let summary = snapshot.summary();
                info!(
                    event = %Event::RecoveryOffered,
                    entries = summary.scan_entries,
                    ledger_records = summary.ledger_records,
                    timestamp = summary.timestamp,
                    "snapshot found"
                );
                self.offered = Some(snapshot);
                self.gate = WriteGate::AwaitingRecovery;
                RecoveryOffer::Available(summary)
            }
            Err(e) => {
                warn!(
                    event = %Event::SnapshotCorrupt,
                    code = e.code(),
                    error = %e,
                    "snapshot unreadable, starting idle"
                );
                let preserved = self.preserve_or_defer("corrupt");
                RecoveryOffer::Corrupt {
                    reason: e.to_string(),
                    preserved,
                }
            }
        }
    }

    /// Apply the operator's answer to an open offer.
    ///
    /// `Restore` hands back the snapshot to load. `Discard` keeps the file
    /// on disk under a new name and returns `None`.
    pub fn resolve(&mut self, choice: RecoveryChoice) -> PersistResult<Option<BackupSnapshot>> {
        if self.gate != WriteGate::AwaitingRecovery {
            return Err(PersistError::NoRecoveryOffer);
        }
        let snapshot = self.offered.take().ok_or(PersistError::NoRecoveryOffer)?;

        match choice {
            RecoveryChoice::Restore => {
                self.gate = WriteGate::Open;
                self.last_saved = Some(snapshot.timestamp);
                info!(
                    event = %Event::RecoveryRestored,
                    entries = snapshot.scan_entries.len(),
                    ledger_records = snapshot.ledger_records.len(),
                    "snapshot restored"
                );
                Ok(Some(snapshot))
            }
            RecoveryChoice::Discard => {
                self.gate = WriteGate::Open;
                let preserved = self.preserve_or_defer("discarded");
                info!(
                    event = %Event::RecoveryDiscarded,
                    preserved = ?preserved,
                    "snapshot discarded by operator"
                );
                Ok(None)
            }
        }
    }

    fn preserve_or_defer(&mut self, label: &'static str) -> Option<std::path::PathBuf> {
        match self.store.preserve_copy(label) {
            Ok(path) => {
                self.gate = WriteGate::Open;
                path
            }
            Err(e) => {
                warn!(code = e.code(), error = %e, "preserve failed, holding overwrite");
                self.gate = WriteGate::PreserveFirst(label);
                None
            }
        }
    }

    /// Record a state change; arms the debounce.
    pub fn notify_mutation(&mut self, now: Instant) {
        self.scheduler.mark_dirty(now);
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    /// Fire due timers and write if one asks for it.
    ///
    /// `capture` is only called when a write actually happens.
    pub fn tick<F>(&mut self, now: Instant, capture: F) -> Option<PersistResult<FlushReason>>
    where
        F: FnOnce() -> BackupSnapshot,
    {
        let reason = self.scheduler.poll(now)?;
        Some(self.flush(reason, &capture()).map(|_| reason))
    }

    /// Write `snapshot` now.
    ///
    /// Failures are logged and returned; the caller's in-memory state is
    /// untouched and stays dirty for the next attempt.
    pub fn flush(&mut self, reason: FlushReason, snapshot: &BackupSnapshot) -> PersistResult<()> {
        let result = self.write_gated(snapshot);
        self.scheduler.on_flushed(result.is_ok());

        match &result {
            Ok(()) => {
                self.last_saved = Some(snapshot.timestamp);
                info!(
                    event = %Event::SnapshotWritten,
                    reason = reason.as_str(),
                    entries = snapshot.scan_entries.len(),
                    ledger_records = snapshot.ledger_records.len(),
                    path = %self.store.path().display(),
                    "snapshot written"
                );
            }
            Err(e) => {
                error!(
                    event = %Event::SnapshotWriteFailed,
                    reason = reason.as_str(),
                    code = e.code(),
                    error = %e,
                    "snapshot write failed; state kept in memory"
                );
            }
        }
        result
    }

    fn write_gated(&mut self, snapshot: &BackupSnapshot) -> PersistResult<()> {
        match self.gate {
            WriteGate::AwaitingRecovery => return Err(PersistError::RecoveryPending),
            WriteGate::PreserveFirst(label) => {
                self.retry.run("preserve", || self.store.preserve_copy(label))?;
                self.gate = WriteGate::Open;
            }
            WriteGate::Open => {}
        }
        self.retry.run("snapshot", || self.store.write(snapshot))
    }

    /// Cancel timers and write once if there is unsaved state.
    ///
    /// Returns whether a write happened. Nothing is written while a recovery
    /// offer is still open. Idempotent.
    pub fn shutdown<F>(&mut self, capture: F) -> PersistResult<bool>
    where
        F: FnOnce() -> BackupSnapshot,
    {
        let reason = self.scheduler.begin_shutdown();
        if self.awaiting_recovery() {
            return Ok(false);
        }
        match reason {
            Some(reason) => self.flush(reason, &capture()).map(|_| true),
            None => Ok(false),
        }
    }
}
