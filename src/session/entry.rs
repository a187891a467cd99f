//! Scan entry

use crate::catalog::CatalogRecord;
use crate::discrepancy::{classify_counts, EntryStatus};

/// One counted sku in the active session.
///
/// `origin_box` is set from the box assignment at first scan and never
/// changes afterwards; together with `sku` it forms the ledger key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanEntry {
    pub sku: String,
    pub title: String,
    /// Counted quantity; `None` when the operator cleared it
    pub actual_qty: Option<i64>,
    pub assigned_box: String,
    pub origin_box: String,
    /// Free-text physical move target; empty when not moved
    pub relocated_box: String,
    pub expected_qty: i64,
    pub status: EntryStatus,
    pub note: String,
    pub is_known_sku: bool,
}

impl ScanEntry {
    /// First scan of a catalog sku found in the assigned box.
    pub fn known(record: &CatalogRecord, box_id: &str) -> Self {
        let mut entry = Self {
            sku: record.sku.clone(),
            title: record.title.clone(),
            actual_qty: Some(1),
            assigned_box: box_id.to_string(),
            origin_box: box_id.to_string(),
            relocated_box: String::new(),
            expected_qty: record.expected_qty,
            status: EntryStatus::Unresolved,
            note: String::new(),
            is_known_sku: true,
        };
        entry.refresh_status();
        entry
    }

    /// First scan of a sku the catalog places in `owner_box`.
    ///
    /// The count is attributed to `box_id`, where the physical count
    /// happened, not to the catalog's box.
    pub fn wrong_box(record: &CatalogRecord, box_id: &str, owner_box: &str) -> Self {
        Self {
            sku: record.sku.clone(),
            title: record.title.clone(),
            actual_qty: Some(1),
            assigned_box: box_id.to_string(),
            origin_box: box_id.to_string(),
            relocated_box: String::new(),
            expected_qty: 0,
            status: EntryStatus::WrongBox,
            note: format!("catalog box: {}", owner_box),
            is_known_sku: false,
        }
    }

    /// First scan of a code the catalog does not know.
    pub fn unknown(code: &str, box_id: &str) -> Self {
        Self {
            sku: code.to_string(),
            title: String::new(),
            actual_qty: Some(1),
            assigned_box: box_id.to_string(),
            origin_box: box_id.to_string(),
            relocated_box: String::new(),
            expected_qty: 0,
            status: EntryStatus::Unresolved,
            note: String::new(),
            is_known_sku: false,
        }
    }

    /// Repeat scan: counts accumulate, manual edits are kept. The count
    /// saturates at `i64::MAX`.
    pub fn increment(&mut self) {
        self.actual_qty = Some(self.actual_qty.unwrap_or(0).saturating_add(1));
        self.refresh_status();
    }

    /// Re-run discrepancy detection after any quantity change.
    pub fn refresh_status(&mut self) {
        let status = classify_counts(self.actual_qty, self.expected_qty, self.is_known_sku);
        self.status = if self.is_wrong_box() {
            EntryStatus::WrongBox
        } else {
            status
        };
    }

    /// Whether this entry came from a wrong-box scan.
    pub fn is_wrong_box(&self) -> bool {
        !self.is_known_sku && self.status == EntryStatus::WrongBox
    }
}
