//! Ledger record

use serde::{Deserialize, Serialize};

use crate::quantity;

/// Column order of a ledger row, used by exports.
pub const LEDGER_COLUMNS: [&str; 12] = [
    "direction",
    "receiptNo",
    "date",
    "relocatedBox",
    "sku",
    "title",
    "actualQty",
    "originBox",
    "status",
    "note",
    "group",
    "crew",
];

/// Dedup key of a ledger record: `(sku, originBox)`.
pub type LedgerKey = (String, String);

/// One durable line of the cumulative ledger.
///
/// Field order matches [`LEDGER_COLUMNS`]. `actual_qty` is the sum of every
/// commit ever written for the record's key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerRecord {
    pub direction: String,
    pub receipt_no: String,
    pub date: String,
    pub relocated_box: String,
    pub sku: String,
    pub title: String,
    #[serde(with = "quantity::as_string")]
    pub actual_qty: i64,
    pub origin_box: String,
    pub status: String,
    pub note: String,
    pub group: String,
    pub crew: String,
}

impl LedgerRecord {
    pub fn key(&self) -> LedgerKey {
        (self.sku.clone(), self.origin_box.clone())
    }

    pub fn matches_key(&self, sku: &str, origin_box: &str) -> bool {
        self.sku == sku && self.origin_box == origin_box
    }

    /// Row values in [`LEDGER_COLUMNS`] order.
    pub fn to_row(&self) -> [String; 12] {
        [
            self.direction.clone(),
            self.receipt_no.clone(),
            self.date.clone(),
            self.relocated_box.clone(),
            self.sku.clone(),
            self.title.clone(),
            self.actual_qty.to_string(),
            self.origin_box.clone(),
            self.status.clone(),
            self.note.clone(),
            self.group.clone(),
            self.crew.clone(),
        ]
    }
}

/// Receipt number derived from the commit date.
pub fn receipt_no(date: &str) -> String {
    format!("P-{}", date)
}
