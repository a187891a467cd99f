//! Startup recovery
//!
//! A snapshot found at startup is never applied or deleted on its own. The
//! operator is shown a [`SnapshotSummary`] and picks restore or discard.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::snapshot::{BackupSnapshot, SnapshotSummary};
use crate::catalog::Catalog;
use crate::ledger::Ledger;
use crate::session::SessionState;

/// What startup found on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecoveryOffer {
    /// No snapshot; start empty
    Fresh,
    /// A readable snapshot awaits the operator's choice
    Available(SnapshotSummary),
    /// Snapshot could not be parsed; session starts idle
    Corrupt {
        reason: String,
        /// Where the unreadable file was copied, if the copy succeeded
        preserved: Option<PathBuf>,
    },
}

impl RecoveryOffer {
    pub fn needs_choice(&self) -> bool {
        matches!(self, RecoveryOffer::Available(_))
    }
}

/// Operator answer to an [`RecoveryOffer::Available`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecoveryChoice {
    Restore,
    Discard,
}

impl fmt::Display for RecoveryChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoveryChoice::Restore => f.write_str("restore"),
            RecoveryChoice::Discard => f.write_str("discard"),
        }
    }
}

impl FromStr for RecoveryChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "restore" => Ok(RecoveryChoice::Restore),
            "discard" => Ok(RecoveryChoice::Discard),
            other => Err(format!("unknown recovery choice '{}'", other)),
        }
    }
}

/// Turn a snapshot back into session and ledger values.
///
/// Box quota is re-derived from the catalog loaded now.
pub fn restore_parts(snapshot: BackupSnapshot, catalog: &Catalog) -> (SessionState, Ledger) {
    let state = SessionState::restore(snapshot.current_box, snapshot.scan_entries, catalog);
    let ledger = Ledger::from_records(snapshot.ledger_records);
    (state, ledger)
}
