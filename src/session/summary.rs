//! Session summary for status displays

use std::collections::BTreeMap;

use serde::Serialize;

use super::state::SessionState;

/// Counts describing the active session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub phase: &'static str,
    pub box_id: Option<String>,
    pub quota: usize,
    pub fresh_box: bool,
    pub entries: usize,
    pub known_entries: usize,
    pub total_scanned: i64,
    pub by_status: BTreeMap<&'static str, usize>,
}

impl SessionSummary {
    pub fn of(state: &SessionState) -> Self {
        let mut by_status = BTreeMap::new();
        for entry in state.entries() {
            *by_status.entry(entry.status.as_str()).or_insert(0) += 1;
        }

        let assignment = state.current_box();
        Self {
            phase: state.phase().name(),
            box_id: assignment.map(|b| b.box_id.clone()),
            quota: assignment.map(|b| b.quota).unwrap_or(0),
            fresh_box: assignment.map(|b| b.fresh).unwrap_or(false),
            entries: state.len(),
            known_entries: state.known_count(),
            total_scanned: state
                .entries()
                .iter()
                .filter_map(|e| e.actual_qty)
                .fold(0i64, i64::saturating_add),
            by_status,
        }
    }

    /// Whether committing now would hit the quota soft block.
    pub fn below_quota(&self) -> bool {
        self.known_entries < self.quota
    }
}
