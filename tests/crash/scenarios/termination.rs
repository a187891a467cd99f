//! Termination signal while requests are being served
//!
//! SIGTERM must take the same shutdown path as `quit`: one final write of
//! whatever is not on disk yet.

use crate::crash::{responses, Workspace};

#[test]
fn test_sigterm_writes_pending_scans() {
    let ws = Workspace::new();
    let result = ws.start_then_terminate(&[
        r#"{"op":"assign_box","box_id":"B1"}"#,
        r#"{"op":"scan","code":"9780131103627"}"#,
    ]);

    assert!(result.status.success(), "stderr: {}", result.stderr);
    let out = responses(&result);
    assert_eq!(out[2]["status"], "ok");

    let snap = ws.snapshot().expect("snapshot written on SIGTERM");
    assert_eq!(snap.current_box.as_deref(), Some("B1"));
    assert_eq!(snap.scan_entries.len(), 1);
    assert_eq!(snap.scan_entries[0].actual_qty, Some(1));
}
