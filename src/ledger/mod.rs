//! Cumulative ledger
//!
//! The ledger only grows through commits. Records are deduplicated by
//! `(sku, originBox)` with additive quantities; see [`aggregator`] for the
//! merge rule.

pub mod aggregator;
mod record;

pub use aggregator::{
    build_records, is_quota_override, merge_into, override_markers, rebuild, QUOTA_OVERRIDE_TAG,
};
pub use record::{receipt_no, LedgerKey, LedgerRecord, LEDGER_COLUMNS};

use crate::session::CommitBatch;

/// Deduplicated ledger records in first-commit order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    records: Vec<LedgerRecord>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw records, folding any duplicate keys.
    ///
    /// Used on restore, so hand-edited snapshots with repeated keys come back
    /// consistent with the summation rule.
    pub fn from_records(records: Vec<LedgerRecord>) -> Self {
        Self {
            records: rebuild(records),
        }
    }

    pub fn records(&self) -> &[LedgerRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, sku: &str, origin_box: &str) -> Option<&LedgerRecord> {
        self.records.iter().find(|r| r.matches_key(sku, origin_box))
    }

    /// Merge one commit. Returns the number of records it contributed.
    pub fn apply_commit(&mut self, batch: &CommitBatch) -> usize {
        let incoming = build_records(batch);
        let count = incoming.len();
        merge_into(&mut self.records, incoming);
        count
    }

    /// Replace the records after a manual edit and re-derive the merge.
    pub fn replace_records(&mut self, records: Vec<LedgerRecord>) {
        self.records = rebuild(records);
    }

    /// Total counted quantity across all records.
    pub fn total_qty(&self) -> i64 {
        self.records
            .iter()
            .fold(0i64, |acc, r| acc.saturating_add(r.actual_qty))
    }

    pub fn into_records(self) -> Vec<LedgerRecord> {
        self.records
    }
}
