//! Crash during snapshot write
//!
//! Before the rename lands, a restart must see the previous snapshot,
//! complete and parseable. After it, the new one.

use stocktake::crash_point::points;

use crate::crash::{responses, Workspace};

const FIRST_SESSION: &[&str] = &[
    r#"{"op":"assign_box","box_id":"B1"}"#,
    r#"{"op":"scan","code":"9780131103627"}"#,
    r#"{"op":"scan","code":"9780131103627"}"#,
    r#"{"op":"quit"}"#,
];

const SECOND_SESSION: &[&str] = &[
    r#"{"op":"recover","choice":"restore"}"#,
    r#"{"op":"scan","code":"111-222"}"#,
    r#"{"op":"save"}"#,
    r#"{"op":"quit"}"#,
];

fn seeded() -> Workspace {
    let ws = Workspace::new();
    let result = ws.start(FIRST_SESSION, None);
    assert!(!result.crashed(), "stderr: {}", result.stderr);

    let snap = ws.snapshot().expect("shutdown write");
    assert_eq!(snap.scan_entries.len(), 1);
    assert_eq!(snap.scan_entries[0].actual_qty, Some(2));
    ws
}

#[test]
fn test_clean_run_writes_on_shutdown() {
    let ws = seeded();
    let result = ws.start(SECOND_SESSION, None);
    assert!(!result.crashed());

    let out = responses(&result);
    assert_eq!(out[0]["kind"], "recovery_offer");
    assert_eq!(out[1]["data"]["restored"], true);
    assert_eq!(ws.snapshot().unwrap().scan_entries.len(), 2);
}

#[test]
fn test_crash_before_rename_keeps_previous_snapshot() {
    for point in [
        points::SNAPSHOT_BEFORE_TEMP_WRITE,
        points::SNAPSHOT_AFTER_TEMP_WRITE,
        points::SNAPSHOT_BEFORE_RENAME,
    ] {
        let ws = seeded();
        let before = ws.snapshot();

        let result = ws.start(SECOND_SESSION, Some(point));
        assert!(result.crashed(), "expected abort at {}", point);
        assert_eq!(ws.snapshot(), before, "snapshot changed after crash at {}", point);
    }
}

#[test]
fn test_crash_after_rename_keeps_new_snapshot() {
    let ws = seeded();
    let result = ws.start(SECOND_SESSION, Some(points::SNAPSHOT_AFTER_RENAME));
    assert!(result.crashed());

    let snap = ws.snapshot().unwrap();
    assert_eq!(snap.scan_entries.len(), 2);
    assert_eq!(snap.current_box.as_deref(), Some("B1"));
}

#[test]
fn test_restart_after_crash_restores_field_for_field() {
    let ws = seeded();
    let before = ws.snapshot().unwrap();
    ws.start(SECOND_SESSION, Some(points::SNAPSHOT_BEFORE_RENAME));

    // Third run restores and shuts down without changes
    let result = ws.start(
        &[r#"{"op":"recover","choice":"restore"}"#, r#"{"op":"status"}"#],
        None,
    );
    let out = responses(&result);
    assert_eq!(out[2]["data"]["session"]["entries"], 1);
    assert_eq!(out[2]["data"]["session"]["box_id"], "B1");
    assert_eq!(ws.snapshot().unwrap(), before);
}
