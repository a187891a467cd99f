//! End-to-end reconciliation over a real catalog file
//!
//! Catalog CSV → scans across boxes → commits → ledger → export.

use std::fs;

use stocktake::catalog::{load_csv, Catalog};
use stocktake::discrepancy::EntryStatus;
use stocktake::export::export_ledger;
use stocktake::ledger::{is_quota_override, Ledger};
use stocktake::persistence::RetryPolicy;
use stocktake::reconciler::Reconciler;
use stocktake::session::{
    CommitRequest, Effect, FieldEdit, PendingPolicy, ScanOutcome, SessionError, SessionErrorKind,
    SessionEvent,
};
use tempfile::TempDir;

const CATALOG: &str = "SKU,Title,Expected_Qty,Box_ID\n\
978-0-13-110362-7,The C Programming Language,2,B1\n\
111-222,Stapler,1,B1\n\
ABC-0042,Label roll,1.0,B1\n\
555,Tape,3,B2\n";

fn reconciler(dir: &TempDir) -> Reconciler {
    let path = dir.path().join("catalog.csv");
    fs::write(&path, CATALOG).unwrap();
    Reconciler::new(Catalog::new(load_csv(&path).unwrap()))
}

fn assign(r: &mut Reconciler, box_id: &str, fresh: bool) -> Result<(), SessionError> {
    r.handle(SessionEvent::AssignBox {
        box_id: box_id.into(),
        fresh,
        pending: PendingPolicy::Refuse,
    })
    .map(|_| ())
}

fn scan(r: &mut Reconciler, code: &str) -> Effect {
    let mut t = r.handle(SessionEvent::Scan { code: code.into() }).unwrap();
    t.effects.remove(0)
}

fn commit(override_quota: bool) -> SessionEvent {
    SessionEvent::Commit(CommitRequest {
        direction: "IN".into(),
        date: "2026-10-16".into(),
        crew: "night shift".into(),
        group: "A".into(),
        relocated_box: None,
        override_quota,
    })
}

#[test]
fn test_full_box_audit() {
    let dir = TempDir::new().unwrap();
    let mut r = reconciler(&dir);
    assign(&mut r, "B1", false).unwrap();
    assert_eq!(r.summary().quota, 3);

    // Digit-normalized match, accumulated
    scan(&mut r, "9780131103627");
    match scan(&mut r, "9780131103627") {
        Effect::Scanned {
            actual_qty, status, ..
        } => {
            assert_eq!(actual_qty, Some(2));
            assert_eq!(status, EntryStatus::Match);
        }
        other => panic!("unexpected effect: {:?}", other),
    }

    scan(&mut r, "111-222");
    scan(&mut r, "abc-0042 ".trim());

    // Sku of B2 while auditing B1
    match scan(&mut r, "555") {
        Effect::Scanned { outcome, status, .. } => {
            assert_eq!(
                outcome,
                ScanOutcome::WrongBox {
                    owner_box: "B2".into()
                }
            );
            assert_eq!(status, EntryStatus::WrongBox);
        }
        other => panic!("unexpected effect: {:?}", other),
    }

    // Completely unknown code
    match scan(&mut r, "ZZZ-1") {
        Effect::Scanned { outcome, status, .. } => {
            assert_eq!(outcome, ScanOutcome::NotFound);
            assert_eq!(status, EntryStatus::Unresolved);
        }
        other => panic!("unexpected effect: {:?}", other),
    }

    // Box is locked while entries are pending
    let err = assign(&mut r, "B2", false).unwrap_err();
    assert!(matches!(err, SessionError::BoxLocked { .. }));

    r.handle(commit(false)).unwrap();
    let ledger = r.ledger();
    assert_eq!(ledger.len(), 5);
    let wrong = ledger.get("555", "B1").unwrap();
    assert_eq!(wrong.status, "WrongBox");
    assert_eq!(ledger.get("978-0-13-110362-7", "B1").unwrap().receipt_no, "P-2026-10-16");
}

#[test]
fn test_ledger_additive_across_sessions() {
    let dir = TempDir::new().unwrap();
    let mut r = reconciler(&dir);

    assign(&mut r, "B2", false).unwrap();
    for _ in 0..3 {
        scan(&mut r, "555");
    }
    r.handle(commit(false)).unwrap();

    assign(&mut r, "B2", false).unwrap();
    scan(&mut r, "555");
    r.handle(SessionEvent::Edit {
        sku: "555".into(),
        edit: FieldEdit::ActualQty(Some(2)),
    })
    .unwrap();
    r.handle(commit(false)).unwrap();

    let rec = r.ledger().get("555", "B2").unwrap();
    assert_eq!(rec.actual_qty, 5);
    // Status of the last commit wins
    assert_eq!(rec.status, "Shortage");

    let rebuilt = Ledger::from_records(r.ledger().records().to_vec());
    assert_eq!(&rebuilt, r.ledger());
}

#[test]
fn test_quota_soft_block_and_override() {
    let dir = TempDir::new().unwrap();
    let mut r = reconciler(&dir);
    assign(&mut r, "B1", false).unwrap();
    scan(&mut r, "111-222");

    let err = r.handle(commit(false)).unwrap_err();
    assert_eq!(err.kind(), SessionErrorKind::Quota);
    assert!(r.ledger().is_empty());
    assert_eq!(r.session().len(), 1);

    r.handle(commit(true)).unwrap();
    let rec = r.ledger().get("111-222", "B1").unwrap();
    assert!(is_quota_override(rec));
}

#[test]
fn test_fresh_box_conflict() {
    let dir = TempDir::new().unwrap();
    let mut r = reconciler(&dir);
    let err = assign(&mut r, "B2", true).unwrap_err();
    assert_eq!(err.kind(), SessionErrorKind::Conflict);

    assign(&mut r, "NEW-9", true).unwrap();
    assert!(r.summary().fresh_box);
}

#[test]
fn test_missing_crew_never_partially_commits() {
    let dir = TempDir::new().unwrap();
    let mut r = reconciler(&dir);
    assign(&mut r, "B2", false).unwrap();
    scan(&mut r, "555");

    let mut request = CommitRequest {
        direction: "IN".into(),
        date: "2026-10-16".into(),
        ..Default::default()
    };
    let err = r.handle(SessionEvent::Commit(request.clone())).unwrap_err();
    assert_eq!(err, SessionError::MissingCrew);
    assert!(r.ledger().is_empty());
    assert_eq!(r.session().len(), 1);

    request.crew = "day".into();
    request.override_quota = true;
    r.handle(SessionEvent::Commit(request)).unwrap();
    assert_eq!(r.ledger().len(), 1);
}

#[test]
fn test_export_after_commits() {
    let dir = TempDir::new().unwrap();
    let mut r = reconciler(&dir);
    assign(&mut r, "B2", false).unwrap();
    scan(&mut r, "555");
    r.handle(commit(true)).unwrap();

    let template = dir.path().join("template.xlsx");
    fs::write(&template, [0u8, 159, 146, 150]).unwrap();
    let out = dir.path().join("out");

    let report = export_ledger(r.ledger(), &template, &out, &RetryPolicy::none()).unwrap();
    assert_eq!(fs::read(out.join("template.xlsx")).unwrap(), vec![0u8, 159, 146, 150]);

    let mut rdr = csv::Reader::from_path(&report.ledger_file).unwrap();
    let headers = rdr.headers().unwrap().clone();
    assert_eq!(headers.get(6), Some("actualQty"));
    let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get(4), Some("555"));
    assert_eq!(rows[0].get(11), Some("night shift"));
}
