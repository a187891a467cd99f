//! Request handling for `start`
//!
//! `Console` turns protocol requests into reconciler events and persistence
//! calls and returns the JSON lines to print. It does no terminal IO of its
//! own, so the event loop stays a thin select over stdin, timers and
//! signals, and the whole flow can be driven from tests.

use std::time::Instant;

use chrono::Local;
use serde_json::{json, Value};
use tracing::info;

use crate::catalog::{load_csv, Catalog};
use crate::config::Config;
use crate::export::export_ledger;
use crate::observability::Event;
use crate::persistence::{BackupSnapshot, FlushReason, PersistenceGuard, RecoveryOffer};
use crate::reconciler::Reconciler;
use crate::session::{SessionEvent, Transition};

use super::errors::{CliError, CliResult};
use super::io;
use super::protocol::{field_edit, pending_policy, transition_json, Request};

/// Output of one request.
#[derive(Debug, Default)]
pub struct Step {
    pub output: Vec<Value>,
    pub quit: bool,
}

impl Step {
    fn reply(value: Value) -> Self {
        Self {
            output: vec![value],
            quit: false,
        }
    }
}

pub struct Console {
    config: Config,
    reconciler: Reconciler,
    guard: PersistenceGuard,
    offer_open: bool,
}

impl Console {
    /// Build the console and inspect the snapshot on disk.
    ///
    /// Returns the startup notice (recovery offer or fresh start).
    pub fn open(config: Config, catalog: Catalog, now: Instant) -> (Self, Value) {
        let mut guard = PersistenceGuard::from_config(&config, now);
        let offer = guard.startup();
        let offer_open = offer.needs_choice();

        let notice = match &offer {
            RecoveryOffer::Available(summary) => io::notice(
                "recovery_offer",
                json!({ "snapshot": summary, "choices": ["restore", "discard"] }),
            ),
            RecoveryOffer::Corrupt { reason, preserved } => io::notice(
                "corrupt_snapshot",
                json!({ "reason": reason, "preserved": preserved, "code": "STOCK_PERSIST_CORRUPT" }),
            ),
            RecoveryOffer::Fresh => io::notice("ready", json!({ "catalog_records": catalog.len() })),
        };

        let console = Self {
            config,
            reconciler: Reconciler::new(catalog),
            guard,
            offer_open,
        };
        (console, notice)
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    pub fn awaiting_recovery(&self) -> bool {
        self.offer_open
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.guard.next_deadline()
    }

    /// Parse and handle one input line. Blank lines produce no output.
    pub fn handle_line(&mut self, line: &str, now: Instant) -> Step {
        if line.trim().is_empty() {
            return Step::default();
        }
        match Request::parse(line) {
            Ok(req) => self.handle(req, now),
            Err(e) => Step::reply(io::error(&e)),
        }
    }

    pub fn handle(&mut self, req: Request, now: Instant) -> Step {
        if matches!(req, Request::Quit) {
            return Step {
                output: vec![io::ok(json!({ "bye": true }))],
                quit: true,
            };
        }
        if self.offer_open && !req.allowed_during_recovery() {
            return Step::reply(io::error(&CliError::RecoveryRequired));
        }
        match self.dispatch(req, now) {
            Ok(data) => Step::reply(io::ok(data)),
            Err(e) => Step::reply(io::error(&e)),
        }
    }

    fn dispatch(&mut self, req: Request, now: Instant) -> CliResult<Value> {
        let today = Local::now().format("%Y-%m-%d").to_string();
        let direction = self.config.default_direction.clone();

        match req {
            Request::Recover { choice } => {
                let restored = self.guard.resolve(choice)?;
                self.offer_open = false;
                let was_restored = restored.is_some();
                if let Some(snapshot) = restored {
                    self.reconciler.restore(snapshot);
                }
                Ok(json!({
                    "choice": choice.to_string(),
                    "restored": was_restored,
                    "session": self.reconciler.summary(),
                    "ledger_records": self.reconciler.ledger().len(),
                }))
            }
            Request::AssignBox {
                box_id,
                fresh,
                pending,
                commit,
            } => {
                let pending = pending_policy(pending, commit, &direction, &today)?;
                self.apply(
                    SessionEvent::AssignBox {
                        box_id,
                        fresh,
                        pending,
                    },
                    now,
                )
            }
            Request::Scan { code } => self.apply(SessionEvent::Scan { code }, now),
            Request::Edit { sku, field, value } => {
                let edit = field_edit(field, &value)?;
                self.apply(SessionEvent::Edit { sku, edit }, now)
            }
            Request::Commit(args) => {
                self.apply(SessionEvent::Commit(args.into_request(&direction, &today)), now)
            }
            Request::Discard { reset_box } => self.apply(SessionEvent::Discard { reset_box }, now),
            Request::Status => Ok(self.status()),
            Request::Save => {
                let snapshot = self.capture();
                self.guard.flush(FlushReason::Manual, &snapshot)?;
                Ok(json!({ "saved": true, "timestamp": snapshot.timestamp }))
            }
            Request::ReloadCatalog { path } => {
                let catalog = Catalog::new(load_csv(&path)?);
                self.reconciler.replace_catalog(catalog);
                Ok(json!({
                    "catalog_records": self.reconciler.catalog().len(),
                    "session": self.reconciler.summary(),
                }))
            }
            Request::Export { template, out_dir } => {
                let report = export_ledger(
                    self.reconciler.ledger(),
                    &template,
                    &out_dir,
                    &self.config.retry_policy(),
                )?;
                Ok(serde_json::to_value(report).map_err(std::io::Error::from)?)
            }
            Request::Quit => Ok(json!({ "bye": true })),
        }
    }

    fn apply(&mut self, event: SessionEvent, now: Instant) -> CliResult<Value> {
        let transition: Transition = self.reconciler.handle(event)?;
        if transition.is_mutation() {
            self.guard.notify_mutation(now);
        }
        let mut data = transition_json(&transition);
        data["session"] = json!(self.reconciler.summary());
        Ok(data)
    }

    fn status(&self) -> Value {
        json!({
            "session": self.reconciler.summary(),
            "ledger_records": self.reconciler.ledger().len(),
            "ledger_total_qty": self.reconciler.ledger().total_qty(),
            "dirty": self.guard.is_dirty(),
            "last_saved": self.guard.last_saved(),
            "awaiting_recovery": self.offer_open,
        })
    }

    fn capture(&self) -> BackupSnapshot {
        self.reconciler.snapshot(BackupSnapshot::now_secs())
    }

    /// Fire due autosave timers. Failed writes become notices.
    pub fn on_deadline(&mut self, now: Instant) -> Vec<Value> {
        let reconciler = &self.reconciler;
        match self
            .guard
            .tick(now, || reconciler.snapshot(BackupSnapshot::now_secs()))
        {
            Some(Err(e)) => vec![io::notice(
                "snapshot_write_failed",
                json!({ "code": e.code(), "message": e.to_string() }),
            )],
            _ => Vec::new(),
        }
    }

    /// Cancel timers and write once. Idempotent.
    pub fn shutdown(&mut self) -> Vec<Value> {
        info!(event = %Event::ShutdownStart, "shutting down");
        let reconciler = &self.reconciler;
        let result = self
            .guard
            .shutdown(|| reconciler.snapshot(BackupSnapshot::now_secs()));
        let output = match result {
            Ok(_) => Vec::new(),
            Err(e) => vec![io::notice(
                "snapshot_write_failed",
                json!({ "code": e.code(), "message": e.to_string() }),
            )],
        };
        info!(event = %Event::ShutdownComplete, "shutdown complete");
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogRecord;
    use crate::persistence::SnapshotStore;
    use tempfile::TempDir;

    fn catalog() -> Catalog {
        Catalog::new(vec![
            CatalogRecord::new("978-0-13-110362-7", "The C Language", 2, "B1"),
            CatalogRecord::new("555", "Stapler", 1, "B2"),
        ])
    }

    fn console(dir: &TempDir) -> (Console, Value) {
        Console::open(Config::with_data_dir(dir.path()), catalog(), Instant::now())
    }

    fn send(c: &mut Console, line: &str) -> Value {
        let mut step = c.handle_line(line, Instant::now());
        assert_eq!(step.output.len(), 1, "one reply per request");
        step.output.remove(0)
    }

    #[test]
    fn test_scan_flow_over_protocol() {
        let dir = TempDir::new().unwrap();
        let (mut c, notice) = console(&dir);
        assert_eq!(notice["kind"], "ready");

        send(&mut c, r#"{"op":"assign_box","box_id":"B1"}"#);
        send(&mut c, r#"{"op":"scan","code":"9780131103627"}"#);
        let reply = send(&mut c, r#"{"op":"scan","code":"9780131103627"}"#);
        assert_eq!(reply["status"], "ok");
        assert_eq!(reply["data"]["effects"][0]["actual_qty"], 2);
        assert_eq!(reply["data"]["effects"][0]["rule"], "digits");

        let reply = send(&mut c, r#"{"op":"scan","code":"555"}"#);
        assert_eq!(reply["data"]["effects"][0]["outcome"], "wrong_box");

        let reply = send(&mut c, r#"{"op":"commit","group":"A"}"#);
        assert_eq!(reply["status"], "error");
        assert_eq!(reply["ack_required"], true);

        let reply = send(&mut c, r#"{"op":"commit","crew":"night","date":"2026-10-16"}"#);
        assert_eq!(reply["data"]["phase"], "Committed");
        assert_eq!(c.reconciler().ledger().len(), 2);
    }

    #[test]
    fn test_recovery_gate() {
        let dir = TempDir::new().unwrap();
        {
            let (mut c, _) = console(&dir);
            send(&mut c, r#"{"op":"assign_box","box_id":"B1"}"#);
            send(&mut c, r#"{"op":"scan","code":"978-0-13-110362-7"}"#);
            assert!(c.shutdown().is_empty());
        }

        let (mut c, notice) = console(&dir);
        assert_eq!(notice["kind"], "recovery_offer");
        assert_eq!(notice["data"]["snapshot"]["scan_entries"], 1);

        let reply = send(&mut c, r#"{"op":"scan","code":"555"}"#);
        assert_eq!(reply["code"], "STOCK_CLI_RECOVERY_REQUIRED");

        let reply = send(&mut c, r#"{"op":"recover","choice":"restore"}"#);
        assert_eq!(reply["data"]["restored"], true);
        assert_eq!(c.reconciler().session().len(), 1);
        assert_eq!(c.reconciler().session().box_id(), Some("B1"));
    }

    #[test]
    fn test_quit_during_recovery_keeps_snapshot() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path(), "backup.json");
        let (mut c, _) = console(&dir);
        send(&mut c, r#"{"op":"assign_box","box_id":"B1"}"#);
        c.shutdown();
        let before = store.read().unwrap();

        let (mut c, _) = console(&dir);
        let step = c.handle_line(r#"{"op":"quit"}"#, Instant::now());
        assert!(step.quit);
        c.shutdown();
        assert_eq!(store.read().unwrap(), before);
    }

    #[test]
    fn test_bad_line_reports_error() {
        let dir = TempDir::new().unwrap();
        let (mut c, _) = console(&dir);
        let reply = send(&mut c, "{not json");
        assert_eq!(reply["code"], "STOCK_CLI_BAD_REQUEST");
        assert!(c.handle_line("   ", Instant::now()).output.is_empty());
    }
}
