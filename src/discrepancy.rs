//! Discrepancy detection
//!
//! Classifies a counted quantity against the expected one. The result is
//! stored on the scan entry every time the count changes, so readers never
//! recompute it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Tolerance for quantity comparison. Counts parsed from spreadsheets can
/// carry float noise (`2.9999`).
pub const QTY_EPSILON: f64 = 0.01;

/// Reconciliation status of a scan entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryStatus {
    /// Counted equals expected
    Match,
    /// Counted below expected
    Shortage,
    /// Counted above expected
    Surplus,
    /// No catalog baseline to compare against
    Unresolved,
    /// Catalog knows the code, but in a different box than the one audited
    WrongBox,
}

impl EntryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryStatus::Match => "Match",
            EntryStatus::Shortage => "Shortage",
            EntryStatus::Surplus => "Surplus",
            EntryStatus::Unresolved => "Unresolved",
            EntryStatus::WrongBox => "WrongBox",
        }
    }

    /// Whether the entry has no catalog baseline.
    pub fn is_unresolved(&self) -> bool {
        matches!(self, EntryStatus::Unresolved | EntryStatus::WrongBox)
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Match" => Ok(EntryStatus::Match),
            "Shortage" => Ok(EntryStatus::Shortage),
            "Surplus" => Ok(EntryStatus::Surplus),
            "Unresolved" => Ok(EntryStatus::Unresolved),
            "WrongBox" => Ok(EntryStatus::WrongBox),
            other => Err(format!("unknown entry status '{}'", other)),
        }
    }
}

/// Classify `actual` against `expected`.
pub fn classify(actual: f64, expected: f64, is_known_sku: bool) -> EntryStatus {
    if !is_known_sku {
        return EntryStatus::Unresolved;
    }
    if (actual - expected).abs() <= QTY_EPSILON {
        EntryStatus::Match
    } else if actual < expected {
        EntryStatus::Shortage
    } else {
        EntryStatus::Surplus
    }
}

/// Classify integral counts. A cleared count (`None`) compares as zero.
pub fn classify_counts(actual: Option<i64>, expected: i64, is_known_sku: bool) -> EntryStatus {
    classify(actual.unwrap_or(0) as f64, expected as f64, is_known_sku)
}
