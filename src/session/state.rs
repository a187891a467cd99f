//! Session state
//!
//! `SessionState` is a plain value. Transitions in [`super::transition`]
//! take a state by reference and return the next one, so the state machine
//! can be driven and tested without any UI.

use crate::catalog::Catalog;

use super::entry::ScanEntry;
use super::normalize_sku;

/// The box currently being audited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoxAssignment {
    pub box_id: String,
    /// Number of catalog rows for this box; zero for fresh boxes
    pub quota: usize,
    /// True when the box id is not a catalog box
    pub fresh: bool,
}

impl BoxAssignment {
    /// Resolve quota and freshness of `box_id` against `catalog`.
    pub fn resolve(box_id: &str, catalog: &Catalog) -> Self {
        Self {
            box_id: box_id.to_string(),
            quota: catalog.quota(box_id),
            fresh: !catalog.contains_box(box_id),
        }
    }
}

/// Observable phase of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    /// No box assigned
    Idle,
    /// Box assigned, nothing scanned yet
    BoxAssigned { box_id: String, quota: usize },
    /// At least one uncommitted entry; box is read-only
    Scanning {
        box_id: String,
        quota: usize,
        pending: usize,
    },
    /// Entries flushed to the ledger. Only reported by the commit
    /// transition itself; the resulting state reads as `Idle`.
    Committed,
}

impl SessionPhase {
    pub fn name(&self) -> &'static str {
        match self {
            SessionPhase::Idle => "Idle",
            SessionPhase::BoxAssigned { .. } => "BoxAssigned",
            SessionPhase::Scanning { .. } => "Scanning",
            SessionPhase::Committed => "Committed",
        }
    }
}

/// Current box plus uncommitted entries, in first-scan order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    current_box: Option<BoxAssignment>,
    entries: Vec<ScanEntry>,
}

impl SessionState {
    /// Idle session with no entries.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a session from persisted parts.
    ///
    /// Quota and freshness are derived from the catalog loaded now, since a
    /// snapshot only stores the box id.
    pub fn restore(current_box: Option<String>, entries: Vec<ScanEntry>, catalog: &Catalog) -> Self {
        Self {
            current_box: current_box.map(|b| BoxAssignment::resolve(&b, catalog)),
            entries,
        }
    }

    pub fn current_box(&self) -> Option<&BoxAssignment> {
        self.current_box.as_ref()
    }

    pub fn box_id(&self) -> Option<&str> {
        self.current_box.as_ref().map(|b| b.box_id.as_str())
    }

    pub fn entries(&self) -> &[ScanEntry] {
        &self.entries
    }

    /// Look up an entry by sku (surrounding whitespace ignored).
    pub fn entry(&self, sku: &str) -> Option<&ScanEntry> {
        let sku = normalize_sku(sku);
        self.entries.iter().find(|e| e.sku == sku)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether uncommitted entries exist.
    pub fn has_pending(&self) -> bool {
        !self.entries.is_empty()
    }

    /// Entries matched against the assigned box's own catalog rows that
    /// still carry a count. Cleared counts are not committed, so they do
    /// not count toward quota either.
    pub fn known_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.is_known_sku && e.actual_qty.is_some())
            .count()
    }

    /// Derived phase.
    pub fn phase(&self) -> SessionPhase {
        match &self.current_box {
            None => SessionPhase::Idle,
            Some(b) if self.entries.is_empty() => SessionPhase::BoxAssigned {
                box_id: b.box_id.clone(),
                quota: b.quota,
            },
            Some(b) => SessionPhase::Scanning {
                box_id: b.box_id.clone(),
                quota: b.quota,
                pending: self.entries.len(),
            },
        }
    }

    pub(crate) fn entry_mut(&mut self, sku: &str) -> Option<&mut ScanEntry> {
        let sku = normalize_sku(sku);
        self.entries.iter_mut().find(|e| e.sku == sku)
    }

    pub(crate) fn push_entry(&mut self, entry: ScanEntry) {
        self.entries.push(entry);
    }

    pub(crate) fn take_entries(&mut self) -> Vec<ScanEntry> {
        std::mem::take(&mut self.entries)
    }

    pub(crate) fn set_box(&mut self, assignment: Option<BoxAssignment>) {
        self.current_box = assignment;
    }
}
