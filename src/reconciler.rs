//! Reconciler
//!
//! Holds the catalog, the live session and the ledger together and routes
//! session transitions: the new state replaces the old one, commit batches
//! are merged into the ledger, and every effect is logged. Persistence and
//! IO stay outside; callers snapshot the reconciler when the guard asks.

use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::ledger::Ledger;
use crate::observability::Event;
use crate::persistence::{restore_parts, BackupSnapshot};
use crate::session::{
    apply, Effect, ScanOutcome, SessionError, SessionEvent, SessionResult, SessionState,
    SessionSummary, Transition,
};

#[derive(Debug, Clone)]
pub struct Reconciler {
    catalog: Catalog,
    session: SessionState,
    ledger: Ledger,
}

impl Reconciler {
    /// Idle session and empty ledger over `catalog`.
    pub fn new(catalog: Catalog) -> Self {
        Self::with_parts(catalog, SessionState::new(), Ledger::new())
    }

    pub fn with_parts(catalog: Catalog, session: SessionState, ledger: Ledger) -> Self {
        Self {
            catalog,
            session,
            ledger,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Apply one event. On error nothing changes.
    pub fn handle(&mut self, event: SessionEvent) -> SessionResult<Transition> {
        let transition = match apply(&self.session, &self.catalog, event) {
            Ok(t) => t,
            Err(e) => {
                self.log_rejection(&e);
                return Err(e);
            }
        };

        for effect in &transition.effects {
            if let Effect::Committed(batch) = effect {
                let merged = self.ledger.apply_commit(batch);
                if let Some(ov) = batch.quota_override {
                    warn!(
                        event = %Event::QuotaOverridden,
                        box_id = %batch.box_id,
                        scanned = ov.scanned,
                        quota = ov.quota,
                        "commit below quota accepted"
                    );
                }
                info!(
                    event = %Event::SessionCommitted,
                    box_id = %batch.box_id,
                    records = merged,
                    ledger_records = self.ledger.len(),
                    crew = %batch.request.crew,
                    "session committed"
                );
            } else {
                log_effect(effect);
            }
        }

        self.session = transition.state.clone();
        Ok(transition)
    }

    fn log_rejection(&self, e: &SessionError) {
        warn!(
            event = %Event::ActionRejected,
            code = e.code(),
            phase = self.session.phase().name(),
            error = %e,
            "action rejected"
        );
    }

    /// Image of session and ledger for the persistence guard.
    pub fn snapshot(&self, timestamp: i64) -> BackupSnapshot {
        BackupSnapshot::capture(&self.session, &self.ledger, timestamp)
    }

    /// Replace session and ledger with a restored snapshot.
    pub fn restore(&mut self, snapshot: BackupSnapshot) {
        let (session, ledger) = restore_parts(snapshot, &self.catalog);
        self.session = session;
        self.ledger = ledger;
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary::of(&self.session)
    }

    /// Swap in a newly loaded catalog.
    ///
    /// Existing entries keep the status they were scanned with; the current
    /// box's quota and freshness are re-derived from the new catalog.
    pub fn replace_catalog(&mut self, catalog: Catalog) {
        let box_id = self.session.box_id().map(str::to_string);
        let entries = self.session.entries().to_vec();
        self.session = SessionState::restore(box_id, entries, &catalog);
        self.catalog = catalog;
        info!(
            event = %Event::CatalogLoaded,
            records = self.catalog.len(),
            boxes = self.catalog.box_ids().len(),
            "catalog replaced"
        );
    }
}

fn log_effect(effect: &Effect) {
    match effect {
        Effect::BoxAssigned {
            box_id,
            quota,
            fresh,
        } => info!(event = %Event::BoxAssigned, %box_id, quota, fresh, "box assigned"),
        Effect::BoxReleased => info!(event = %Event::BoxReleased, "box released"),
        Effect::Scanned {
            sku,
            actual_qty,
            status,
            outcome,
        } => match outcome {
            ScanOutcome::Matched(rule) => info!(
                event = %Event::ScanRecorded,
                %sku,
                actual_qty = ?actual_qty,
                %status,
                rule = ?rule,
                "scan recorded"
            ),
            ScanOutcome::WrongBox { owner_box } => warn!(
                event = %Event::ScanWrongBox,
                %sku,
                %owner_box,
                actual_qty = ?actual_qty,
                "scan belongs to another box"
            ),
            ScanOutcome::NotFound => info!(
                event = %Event::ScanNotFound,
                %sku,
                actual_qty = ?actual_qty,
                "scan not in catalog"
            ),
        },
        Effect::Edited { sku, field, status } => {
            info!(event = %Event::EntryEdited, %sku, field, %status, "entry edited")
        }
        Effect::Discarded { count } => {
            info!(event = %Event::SessionDiscarded, count, "entries discarded")
        }
        Effect::Committed(_) => {}
    }
}
