//! Session transitions
//!
//! `apply(state, catalog, event)` returns the next state and the effects the
//! caller must act on (ledger merge on commit, notices for the operator). A
//! refused event returns an error and the caller keeps the old state, so a
//! transition never half-applies.

use crate::catalog::Catalog;
use crate::discrepancy::EntryStatus;
use crate::matcher::{match_code, normalize_code, MatchRule, ScanMatch};

use super::entry::ScanEntry;
use super::errors::{SessionError, SessionResult};
use super::state::{BoxAssignment, SessionPhase, SessionState};

/// What to do with uncommitted entries when a new box is assigned.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PendingPolicy {
    /// Refuse with [`SessionError::BoxLocked`] so the operator can choose
    #[default]
    Refuse,
    /// Commit the pending entries, then assign
    CommitFirst(CommitRequest),
    /// Drop the pending entries, then assign
    DiscardFirst,
}

/// Operator correction to one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldEdit {
    /// Set or clear the counted quantity
    ActualQty(Option<i64>),
    RelocatedBox(String),
    Note(String),
    AssignedBox(String),
    /// Only allowed on entries without a catalog baseline
    ExpectedQty(i64),
}

impl FieldEdit {
    pub fn field_name(&self) -> &'static str {
        match self {
            FieldEdit::ActualQty(_) => "actualQty",
            FieldEdit::RelocatedBox(_) => "relocatedBox",
            FieldEdit::Note(_) => "note",
            FieldEdit::AssignedBox(_) => "assignedBox",
            FieldEdit::ExpectedQty(_) => "expectedQty",
        }
    }
}

/// Operator-supplied context for a commit.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommitRequest {
    pub direction: String,
    pub date: String,
    pub crew: String,
    pub group: String,
    /// Overrides every entry's relocated box when set and non-empty
    pub relocated_box: Option<String>,
    /// Commit even when fewer known entries than the quota were scanned
    pub override_quota: bool,
}

/// Recorded when a commit went through below quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaOverride {
    pub scanned: usize,
    pub quota: usize,
}

/// Everything the ledger aggregator needs from one commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitBatch {
    pub box_id: String,
    /// Entries with a non-empty counted quantity, in scan order
    pub entries: Vec<ScanEntry>,
    pub request: CommitRequest,
    pub quota_override: Option<QuotaOverride>,
}

/// How a scan resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    Matched(MatchRule),
    /// Known sku, catalog places it in `owner_box`
    WrongBox { owner_box: String },
    /// Code absent from the whole catalog
    NotFound,
}

/// Side effects of a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    BoxAssigned {
        box_id: String,
        quota: usize,
        fresh: bool,
    },
    BoxReleased,
    Scanned {
        sku: String,
        actual_qty: Option<i64>,
        status: EntryStatus,
        outcome: ScanOutcome,
    },
    Edited {
        sku: String,
        field: &'static str,
        status: EntryStatus,
    },
    Committed(CommitBatch),
    Discarded {
        count: usize,
    },
}

/// Input events driving the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    AssignBox {
        box_id: String,
        /// Operator is opening a new box code rather than auditing a catalog box
        fresh: bool,
        pending: PendingPolicy,
    },
    Scan {
        code: String,
    },
    Edit {
        sku: String,
        edit: FieldEdit,
    },
    Commit(CommitRequest),
    Discard {
        reset_box: bool,
    },
}

/// Result of applying one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: SessionState,
    /// Phase the transition landed in (`Committed` for commits)
    pub phase: SessionPhase,
    pub effects: Vec<Effect>,
}

impl Transition {
    /// Whether persisted state changed.
    pub fn is_mutation(&self) -> bool {
        !self.effects.is_empty()
    }

    /// The commit batch, if this transition committed.
    pub fn commit_batch(&self) -> Option<&CommitBatch> {
        self.effects.iter().find_map(|e| match e {
            Effect::Committed(batch) => Some(batch),
            _ => None,
        })
    }
}

/// Apply `event` to `state`.
pub fn apply(
    state: &SessionState,
    catalog: &Catalog,
    event: SessionEvent,
) -> SessionResult<Transition> {
    let mut next = state.clone();
    let mut effects = Vec::new();

    match event {
        SessionEvent::AssignBox {
            box_id,
            fresh,
            pending,
        } => assign_box(&mut next, catalog, &box_id, fresh, pending, &mut effects)?,
        SessionEvent::Scan { code } => scan(&mut next, catalog, &code, &mut effects)?,
        SessionEvent::Edit { sku, edit } => edit_field(&mut next, catalog, &sku, edit, &mut effects)?,
        SessionEvent::Commit(request) => commit(&mut next, catalog, request, &mut effects)?,
        SessionEvent::Discard { reset_box } => discard(&mut next, reset_box, &mut effects),
    }

    let phase = if effects.iter().any(|e| matches!(e, Effect::Committed(_)))
        && next.current_box().is_none()
    {
        SessionPhase::Committed
    } else {
        next.phase()
    };

    Ok(Transition {
        state: next,
        phase,
        effects,
    })
}

fn assign_box(
    state: &mut SessionState,
    catalog: &Catalog,
    box_id: &str,
    fresh: bool,
    pending: PendingPolicy,
    effects: &mut Vec<Effect>,
) -> SessionResult<()> {
    let box_id = box_id.trim();
    if box_id.is_empty() {
        return Err(SessionError::EmptyBoxId);
    }
    if fresh && catalog.contains_box(box_id) {
        return Err(SessionError::BoxConflict(box_id.to_string()));
    }

    if state.has_pending() {
        // Re-assigning the box being scanned changes nothing
        if state.box_id() == Some(box_id) {
            return Ok(());
        }
        match pending {
            PendingPolicy::Refuse => {
                return Err(SessionError::BoxLocked {
                    box_id: state.box_id().unwrap_or_default().to_string(),
                    pending: state.len(),
                });
            }
            PendingPolicy::CommitFirst(request) => commit(state, catalog, request, effects)?,
            PendingPolicy::DiscardFirst => discard(state, false, effects),
        }
    }

    let assignment = BoxAssignment::resolve(box_id, catalog);
    effects.push(Effect::BoxAssigned {
        box_id: assignment.box_id.clone(),
        quota: assignment.quota,
        fresh: assignment.fresh,
    });
    state.set_box(Some(assignment));
    Ok(())
}

fn scan(
    state: &mut SessionState,
    catalog: &Catalog,
    code: &str,
    effects: &mut Vec<Effect>,
) -> SessionResult<()> {
    let code = normalize_code(code);
    if code.is_empty() {
        return Err(SessionError::EmptyCode);
    }
    let box_id = state
        .box_id()
        .ok_or(SessionError::NoBoxAssigned)?
        .to_string();

    let (key, outcome, fresh_entry) = match match_code(catalog, code, Some(box_id.as_str())) {
        ScanMatch::Matched { record, rule } => (
            record.sku.clone(),
            ScanOutcome::Matched(rule),
            ScanEntry::known(record, &box_id),
        ),
        ScanMatch::MatchedOtherBox {
            record, box_id: owner, ..
        } => (
            record.sku.clone(),
            ScanOutcome::WrongBox {
                owner_box: owner.to_string(),
            },
            ScanEntry::wrong_box(record, &box_id, owner),
        ),
        ScanMatch::Unrecognized => (
            code.to_string(),
            ScanOutcome::NotFound,
            ScanEntry::unknown(code, &box_id),
        ),
    };

    let entry = match state.entry_mut(&key) {
        Some(existing) => {
            existing.increment();
            existing.clone()
        }
        None => {
            state.push_entry(fresh_entry.clone());
            fresh_entry
        }
    };

    effects.push(Effect::Scanned {
        sku: entry.sku,
        actual_qty: entry.actual_qty,
        status: entry.status,
        outcome,
    });
    Ok(())
}

fn edit_field(
    state: &mut SessionState,
    catalog: &Catalog,
    sku: &str,
    edit: FieldEdit,
    effects: &mut Vec<Effect>,
) -> SessionResult<()> {
    let field = edit.field_name();
    let entry = state
        .entry_mut(sku)
        .ok_or_else(|| SessionError::UnknownEntry(sku.trim().to_string()))?;

    match edit {
        FieldEdit::ActualQty(qty) => {
            if let Some(value) = qty.filter(|q| *q < 0) {
                return Err(SessionError::NegativeQuantity {
                    sku: entry.sku.clone(),
                    value,
                });
            }
            entry.actual_qty = qty;
        }
        FieldEdit::RelocatedBox(code) => {
            let code = code.trim();
            if !code.is_empty() && catalog.contains_box(code) {
                return Err(SessionError::RelocationConflict(code.to_string()));
            }
            entry.relocated_box = code.to_string();
        }
        FieldEdit::Note(note) => entry.note = note,
        FieldEdit::AssignedBox(box_id) => {
            let box_id = box_id.trim();
            if box_id.is_empty() {
                return Err(SessionError::EmptyBoxId);
            }
            entry.assigned_box = box_id.to_string();
        }
        FieldEdit::ExpectedQty(qty) => {
            if entry.is_known_sku {
                return Err(SessionError::ExpectedQtyLocked(entry.sku.clone()));
            }
            if qty < 0 {
                return Err(SessionError::NegativeQuantity {
                    sku: entry.sku.clone(),
                    value: qty,
                });
            }
            entry.expected_qty = qty;
        }
    }
    entry.refresh_status();

    effects.push(Effect::Edited {
        sku: entry.sku.clone(),
        field,
        status: entry.status,
    });
    Ok(())
}

fn commit(
    state: &mut SessionState,
    catalog: &Catalog,
    mut request: CommitRequest,
    effects: &mut Vec<Effect>,
) -> SessionResult<()> {
    request.crew = request.crew.trim().to_string();
    request.date = request.date.trim().to_string();
    if request.crew.is_empty() {
        return Err(SessionError::MissingCrew);
    }
    if request.date.is_empty() {
        return Err(SessionError::MissingDate);
    }

    let assignment = state
        .current_box()
        .cloned()
        .ok_or(SessionError::NoBoxAssigned)?;
    if state.is_empty() {
        return Err(SessionError::NothingToCommit);
    }

    if let Some(code) = request.relocated_box.as_deref().map(str::trim) {
        if !code.is_empty() && catalog.contains_box(code) {
            return Err(SessionError::RelocationConflict(code.to_string()));
        }
    }

    let scanned = state.known_count();
    let quota_override = if scanned < assignment.quota {
        if !request.override_quota {
            return Err(SessionError::QuotaShortfall {
                box_id: assignment.box_id,
                scanned,
                quota: assignment.quota,
            });
        }
        Some(QuotaOverride {
            scanned,
            quota: assignment.quota,
        })
    } else {
        None
    };

    let entries = state
        .take_entries()
        .into_iter()
        .filter(|e| e.actual_qty.is_some())
        .collect();
    state.set_box(None);

    effects.push(Effect::Committed(CommitBatch {
        box_id: assignment.box_id,
        entries,
        request,
        quota_override,
    }));
    Ok(())
}

fn discard(state: &mut SessionState, reset_box: bool, effects: &mut Vec<Effect>) {
    let count = state.take_entries().len();
    if count > 0 {
        effects.push(Effect::Discarded { count });
    }
    if reset_box && state.current_box().is_some() {
        state.set_box(None);
        effects.push(Effect::BoxReleased);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogRecord;

    fn catalog() -> Catalog {
        Catalog::new(vec![
            CatalogRecord::new("9780131103627", "K&R", 2, "B1"),
            CatalogRecord::new("1111", "Filler", 1, "B1"),
            CatalogRecord::new("2222", "Elsewhere", 1, "B2"),
        ])
    }

    fn run(state: &SessionState, catalog: &Catalog, event: SessionEvent) -> SessionState {
        apply(state, catalog, event).unwrap().state
    }

    fn assigned(catalog: &Catalog, box_id: &str) -> SessionState {
        run(
            &SessionState::new(),
            catalog,
            SessionEvent::AssignBox {
                box_id: box_id.into(),
                fresh: false,
                pending: PendingPolicy::Refuse,
            },
        )
    }

    fn scan_ev(code: &str) -> SessionEvent {
        SessionEvent::Scan { code: code.into() }
    }

    fn commit_req(crew: &str) -> CommitRequest {
        CommitRequest {
            direction: "IN".into(),
            date: "2026-10-16".into(),
            crew: crew.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_rescan_accumulates() {
        let c = catalog();
        let s = assigned(&c, "B1");
        let s = run(&s, &c, scan_ev("9780131103627"));
        let s = run(&s, &c, scan_ev("9780131103627"));

        assert_eq!(s.len(), 1);
        let entry = s.entry("9780131103627").unwrap();
        assert_eq!(entry.actual_qty, Some(2));
        assert_eq!(entry.status, EntryStatus::Match);
    }

    #[test]
    fn test_rescan_keeps_note() {
        let c = catalog();
        let s = assigned(&c, "B1");
        let s = run(&s, &c, scan_ev("1111"));
        let s = run(
            &s,
            &c,
            SessionEvent::Edit {
                sku: "1111".into(),
                edit: FieldEdit::Note("spine torn".into()),
            },
        );
        let s = run(&s, &c, scan_ev("1111"));
        let entry = s.entry("1111").unwrap();
        assert_eq!(entry.note, "spine torn");
        assert_eq!(entry.actual_qty, Some(2));
        assert_eq!(entry.status, EntryStatus::Surplus);
    }

    #[test]
    fn test_wrong_box_recorded_against_assigned_box() {
        let c = catalog();
        let s = assigned(&c, "B1");
        let t = apply(&s, &c, scan_ev("2222")).unwrap();

        match &t.effects[0] {
            Effect::Scanned { outcome, status, .. } => {
                assert_eq!(
                    outcome,
                    &ScanOutcome::WrongBox {
                        owner_box: "B2".into()
                    }
                );
                assert_eq!(*status, EntryStatus::WrongBox);
            }
            other => panic!("unexpected effect: {:?}", other),
        }
        let entry = t.state.entry("2222").unwrap();
        assert_eq!(entry.origin_box, "B1");
        assert_eq!(entry.assigned_box, "B1");
        assert!(!entry.is_known_sku);
        assert_eq!(entry.expected_qty, 0);
    }

    #[test]
    fn test_unknown_code_recorded_as_not_found() {
        let c = catalog();
        let s = assigned(&c, "B1");
        let t = apply(&s, &c, scan_ev(" 4242 ")).unwrap();
        assert!(matches!(
            &t.effects[0],
            Effect::Scanned {
                outcome: ScanOutcome::NotFound,
                status: EntryStatus::Unresolved,
                ..
            }
        ));
        assert_eq!(t.state.entry("4242").unwrap().actual_qty, Some(1));
    }

    #[test]
    fn test_scan_requires_box() {
        let c = catalog();
        let err = apply(&SessionState::new(), &c, scan_ev("1111")).unwrap_err();
        assert_eq!(err, SessionError::NoBoxAssigned);
    }

    #[test]
    fn test_fresh_box_conflict() {
        let c = catalog();
        let err = apply(
            &SessionState::new(),
            &c,
            SessionEvent::AssignBox {
                box_id: "B2".into(),
                fresh: true,
                pending: PendingPolicy::Refuse,
            },
        )
        .unwrap_err();
        assert_eq!(err, SessionError::BoxConflict("B2".into()));
    }

    #[test]
    fn test_box_locked_while_scanning() {
        let c = catalog();
        let s = assigned(&c, "B1");
        let s = run(&s, &c, scan_ev("1111"));

        let err = apply(
            &s,
            &c,
            SessionEvent::AssignBox {
                box_id: "B2".into(),
                fresh: false,
                pending: PendingPolicy::Refuse,
            },
        )
        .unwrap_err();
        assert_eq!(err.kind(), crate::session::SessionErrorKind::Pending);
    }

    #[test]
    fn test_discard_then_assign() {
        let c = catalog();
        let s = assigned(&c, "B1");
        let s = run(&s, &c, scan_ev("1111"));
        let t = apply(
            &s,
            &c,
            SessionEvent::AssignBox {
                box_id: "B2".into(),
                fresh: false,
                pending: PendingPolicy::DiscardFirst,
            },
        )
        .unwrap();
        assert!(t.state.is_empty());
        assert_eq!(t.state.box_id(), Some("B2"));
        assert!(matches!(t.effects[0], Effect::Discarded { count: 1 }));
    }

    #[test]
    fn test_commit_then_assign() {
        let c = catalog();
        let s = assigned(&c, "B1");
        let s = run(&s, &c, scan_ev("1111"));
        let s = run(&s, &c, scan_ev("9780131103627"));
        let t = apply(
            &s,
            &c,
            SessionEvent::AssignBox {
                box_id: "B2".into(),
                fresh: false,
                pending: PendingPolicy::CommitFirst(commit_req("alice")),
            },
        )
        .unwrap();
        assert_eq!(t.state.box_id(), Some("B2"));
        assert_eq!(t.commit_batch().unwrap().entries.len(), 2);
    }

    #[test]
    fn test_commit_requires_crew_and_leaves_state() {
        let c = catalog();
        let s = assigned(&c, "B1");
        let s = run(&s, &c, scan_ev("1111"));
        let err = apply(&s, &c, SessionEvent::Commit(commit_req("  "))).unwrap_err();
        assert_eq!(err, SessionError::MissingCrew);
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn test_commit_below_quota_soft_blocks() {
        let c = catalog();
        let s = assigned(&c, "B1");
        let s = run(&s, &c, scan_ev("1111"));

        let err = apply(&s, &c, SessionEvent::Commit(commit_req("alice"))).unwrap_err();
        assert_eq!(
            err,
            SessionError::QuotaShortfall {
                box_id: "B1".into(),
                scanned: 1,
                quota: 2
            }
        );

        let mut req = commit_req("alice");
        req.override_quota = true;
        let t = apply(&s, &c, SessionEvent::Commit(req)).unwrap();
        let batch = t.commit_batch().unwrap();
        assert_eq!(
            batch.quota_override,
            Some(QuotaOverride {
                scanned: 1,
                quota: 2
            })
        );
        assert_eq!(t.phase, SessionPhase::Committed);
        assert_eq!(t.state.phase(), SessionPhase::Idle);
        assert!(t.state.is_empty());
    }

    #[test]
    fn test_quota_ignores_unknown_and_wrong_box_entries() {
        let c = catalog();
        let s = assigned(&c, "B1");
        let s = run(&s, &c, scan_ev("1111"));
        let s = run(&s, &c, scan_ev("2222"));
        let s = run(&s, &c, scan_ev("nope"));
        assert_eq!(s.known_count(), 1);
        assert!(apply(&s, &c, SessionEvent::Commit(commit_req("alice"))).is_err());
    }

    #[test]
    fn test_cleared_quantities_skipped_and_below_quota() {
        let c = catalog();
        let s = assigned(&c, "B1");
        let s = run(&s, &c, scan_ev("1111"));
        let s = run(&s, &c, scan_ev("9780131103627"));
        let s = run(
            &s,
            &c,
            SessionEvent::Edit {
                sku: "1111".into(),
                edit: FieldEdit::ActualQty(None),
            },
        );
        assert_eq!(s.known_count(), 1);

        // The cleared row leaves the box below quota
        let err = apply(&s, &c, SessionEvent::Commit(commit_req("bob"))).unwrap_err();
        assert_eq!(
            err,
            SessionError::QuotaShortfall {
                box_id: "B1".into(),
                scanned: 1,
                quota: 2,
            }
        );

        let mut req = commit_req("bob");
        req.override_quota = true;
        let t = apply(&s, &c, SessionEvent::Commit(req)).unwrap();
        let batch = t.commit_batch().unwrap();
        assert_eq!(batch.entries.len(), 1);
        assert_eq!(batch.entries[0].sku, "9780131103627");
        assert_eq!(
            batch.quota_override,
            Some(QuotaOverride {
                scanned: 1,
                quota: 2
            })
        );
    }

    #[test]
    fn test_expected_qty_edit_only_for_unknown() {
        let c = catalog();
        let s = assigned(&c, "B1");
        let s = run(&s, &c, scan_ev("1111"));
        let s = run(&s, &c, scan_ev("ZZZ"));

        let err = apply(
            &s,
            &c,
            SessionEvent::Edit {
                sku: "1111".into(),
                edit: FieldEdit::ExpectedQty(9),
            },
        )
        .unwrap_err();
        assert_eq!(err, SessionError::ExpectedQtyLocked("1111".into()));

        let s = run(
            &s,
            &c,
            SessionEvent::Edit {
                sku: "ZZZ".into(),
                edit: FieldEdit::ExpectedQty(4),
            },
        );
        let entry = s.entry("ZZZ").unwrap();
        assert_eq!(entry.expected_qty, 4);
        assert_eq!(entry.status, EntryStatus::Unresolved);
    }

    #[test]
    fn test_relocation_conflict_and_negative_qty() {
        let c = catalog();
        let s = assigned(&c, "B1");
        let s = run(&s, &c, scan_ev("1111"));

        let err = apply(
            &s,
            &c,
            SessionEvent::Edit {
                sku: "1111".into(),
                edit: FieldEdit::RelocatedBox("B2".into()),
            },
        )
        .unwrap_err();
        assert_eq!(err, SessionError::RelocationConflict("B2".into()));

        let err = apply(
            &s,
            &c,
            SessionEvent::Edit {
                sku: "1111".into(),
                edit: FieldEdit::ActualQty(Some(-1)),
            },
        )
        .unwrap_err();
        assert!(matches!(err, SessionError::NegativeQuantity { value: -1, .. }));
    }

    #[test]
    fn test_discard_keeps_box_unless_reset() {
        let c = catalog();
        let s = assigned(&c, "B1");
        let s = run(&s, &c, scan_ev("1111"));
        let kept = run(&s, &c, SessionEvent::Discard { reset_box: false });
        assert!(kept.is_empty());
        assert_eq!(kept.box_id(), Some("B1"));

        let reset = run(&s, &c, SessionEvent::Discard { reset_box: true });
        assert_eq!(reset.phase(), SessionPhase::Idle);
    }
}
