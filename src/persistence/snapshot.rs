//! Backup snapshot document
//!
//! On-disk shape:
//!
//! ```text
//! {
//!   "scanEntries":   { "<sku>": { title, actualQty, assignedBox, originBox,
//!                                 relocatedBox, expectedQty, status, note,
//!                                 isKnownSku }, ... },
//!   "ledgerRecords": [ { direction, receiptNo, ..., crew }, ... ],
//!   "currentBox":    "B1" | null,
//!   "timestamp":     1760600000
//! }
//! ```
//!
//! `actualQty` is a string everywhere (`""` for a cleared count);
//! `expectedQty` is a number. `scanEntries` keeps first-scan order on both
//! write and read.

use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::ledger::{Ledger, LedgerRecord};
use crate::session::{ScanEntry, SessionState};

/// Complete recoverable image of session and ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupSnapshot {
    #[serde(with = "entry_map")]
    pub scan_entries: Vec<ScanEntry>,
    pub ledger_records: Vec<LedgerRecord>,
    pub current_box: Option<String>,
    /// Unix seconds
    pub timestamp: i64,
}

impl BackupSnapshot {
    /// Capture session and ledger as they are now.
    pub fn capture(state: &SessionState, ledger: &Ledger, timestamp: i64) -> Self {
        Self {
            scan_entries: state.entries().to_vec(),
            ledger_records: ledger.records().to_vec(),
            current_box: state.box_id().map(str::to_string),
            timestamp,
        }
    }

    /// Timestamp for a snapshot taken now.
    pub fn now_secs() -> i64 {
        Utc::now().timestamp()
    }

    pub fn saved_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.timestamp, 0).single()
    }

    pub fn summary(&self) -> SnapshotSummary {
        SnapshotSummary {
            scan_entries: self.scan_entries.len(),
            ledger_records: self.ledger_records.len(),
            current_box: self.current_box.clone(),
            timestamp: self.timestamp,
            saved_at: self.saved_at().map(|t| t.to_rfc3339()),
        }
    }

    pub fn to_json_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
    }

    pub fn from_json_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}

/// What the recovery prompt shows about a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotSummary {
    pub scan_entries: usize,
    pub ledger_records: usize,
    pub current_box: Option<String>,
    pub timestamp: i64,
    /// RFC 3339 rendering of `timestamp`
    pub saved_at: Option<String>,
}

impl fmt::Display for SnapshotSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} uncommitted entries, {} ledger records, box {}, saved {}",
            self.scan_entries,
            self.ledger_records,
            self.current_box.as_deref().unwrap_or("-"),
            self.saved_at.as_deref().unwrap_or("at an unknown time"),
        )
    }
}

/// `scanEntries`: sku-keyed object whose values omit the sku.
mod entry_map {
    use std::fmt;

    use serde::de::{self, MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::discrepancy::EntryStatus;
    use crate::quantity;
    use crate::session::ScanEntry;

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct EntryOut<'a> {
        title: &'a str,
        #[serde(with = "quantity::opt_as_string")]
        actual_qty: Option<i64>,
        assigned_box: &'a str,
        origin_box: &'a str,
        relocated_box: &'a str,
        #[serde(with = "quantity::number")]
        expected_qty: i64,
        status: &'static str,
        note: &'a str,
        is_known_sku: bool,
    }

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct EntryIn {
        title: String,
        #[serde(with = "quantity::opt_as_string")]
        actual_qty: Option<i64>,
        assigned_box: String,
        origin_box: String,
        #[serde(default)]
        relocated_box: String,
        #[serde(with = "quantity::number")]
        expected_qty: i64,
        status: String,
        #[serde(default)]
        note: String,
        is_known_sku: bool,
    }

    pub fn serialize<S: Serializer>(entries: &[ScanEntry], serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for e in entries {
            map.serialize_entry(
                &e.sku,
                &EntryOut {
                    title: &e.title,
                    actual_qty: e.actual_qty,
                    assigned_box: &e.assigned_box,
                    origin_box: &e.origin_box,
                    relocated_box: &e.relocated_box,
                    expected_qty: e.expected_qty,
                    status: e.status.as_str(),
                    note: &e.note,
                    is_known_sku: e.is_known_sku,
                },
            )?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<ScanEntry>, D::Error> {
        deserializer.deserialize_map(EntryMapVisitor)
    }

    struct EntryMapVisitor;

    impl<'de> Visitor<'de> for EntryMapVisitor {
        type Value = Vec<ScanEntry>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("an object of scan entries keyed by sku")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
            let mut out: Vec<ScanEntry> = Vec::with_capacity(access.size_hint().unwrap_or(0));
            while let Some((sku, raw)) = access.next_entry::<String, EntryIn>()? {
                let status: EntryStatus = raw.status.parse().map_err(de::Error::custom)?;
                let entry = ScanEntry {
                    sku,
                    title: raw.title,
                    actual_qty: raw.actual_qty,
                    assigned_box: raw.assigned_box,
                    origin_box: raw.origin_box,
                    relocated_box: raw.relocated_box,
                    expected_qty: raw.expected_qty,
                    status,
                    note: raw.note,
                    is_known_sku: raw.is_known_sku,
                };
                // A repeated key keeps its first position and its last value.
                match out.iter_mut().find(|e| e.sku == entry.sku) {
                    Some(slot) => *slot = entry,
                    None => out.push(entry),
                }
            }
            Ok(out)
        }
    }
}
