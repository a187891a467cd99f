//! Reference catalog
//!
//! The catalog is the read-only manifest the scan matcher resolves codes
//! against. It is produced by a loader (see [`load_csv`]) and never mutated
//! afterwards; reloading builds a new `Catalog`.

mod errors;
mod loader;
mod record;

pub use errors::{CatalogError, CatalogResult};
pub use loader::{load_csv, parse_csv_reader, REQUIRED_COLUMNS};
pub use record::CatalogRecord;

use std::collections::{BTreeSet, HashMap};

/// Immutable collection of catalog records with per-box indexes.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    records: Vec<CatalogRecord>,
    /// Record positions per box id, in catalog order
    by_box: HashMap<String, Vec<usize>>,
}

impl Catalog {
    /// Build a catalog from loader output. Record order is preserved.
    pub fn new(records: Vec<CatalogRecord>) -> Self {
        let mut by_box: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, record) in records.iter().enumerate() {
            by_box.entry(record.box_id.clone()).or_default().push(idx);
        }
        Self { records, by_box }
    }

    /// All records in catalog order.
    pub fn records(&self) -> &[CatalogRecord] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the catalog has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records belonging to `box_id`, in catalog order.
    pub fn in_box<'a>(
        &'a self,
        box_id: &str,
    ) -> impl Iterator<Item = &'a CatalogRecord> + Clone + 'a {
        self.by_box
            .get(box_id)
            .map(|idxs| idxs.as_slice())
            .unwrap_or(&[])
            .iter()
            .map(move |&i| &self.records[i])
    }

    /// Whether any record lives in `box_id`.
    pub fn contains_box(&self, box_id: &str) -> bool {
        self.by_box.contains_key(box_id)
    }

    /// Number of catalog rows expected in `box_id`.
    pub fn quota(&self, box_id: &str) -> usize {
        self.by_box.get(box_id).map(Vec::len).unwrap_or(0)
    }

    /// Distinct box ids, sorted.
    pub fn box_ids(&self) -> BTreeSet<&str> {
        self.by_box.keys().map(String::as_str).collect()
    }
}
