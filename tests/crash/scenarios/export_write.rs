//! Crash during ledger export
//!
//! No `ledger-*.csv` may appear unless it is complete.

use std::fs;

use stocktake::crash_point::points;

use crate::crash::{responses, Workspace};

fn committed() -> Workspace {
    let ws = Workspace::new();
    let result = ws.start(
        &[
            r#"{"op":"assign_box","box_id":"B1"}"#,
            r#"{"op":"scan","code":"111-222"}"#,
            r#"{"op":"commit","crew":"night","date":"2026-10-16","override_quota":true}"#,
            r#"{"op":"quit"}"#,
        ],
        None,
    );
    assert!(!result.crashed(), "stderr: {}", result.stderr);
    assert_eq!(ws.snapshot().unwrap().ledger_records.len(), 1);
    ws
}

fn ledger_files(dir: &std::path::Path) -> Vec<String> {
    match fs::read_dir(dir) {
        Ok(entries) => entries
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .filter(|n| n.starts_with("ledger-") && n.ends_with(".csv"))
            .collect(),
        Err(_) => Vec::new(),
    }
}

#[test]
fn test_export_complete() {
    let ws = committed();
    let template = ws.dir.path().join("template.xlsx");
    fs::write(&template, b"template bytes").unwrap();
    let out_dir = ws.dir.path().join("out");

    let result = ws.export(&template, &out_dir, None);
    assert!(!result.crashed(), "stderr: {}", result.stderr);
    let out = responses(&result);
    assert_eq!(out[0]["data"]["export"]["records"], 1);

    let files = ledger_files(&out_dir);
    assert_eq!(files.len(), 1);
    let csv = fs::read_to_string(out_dir.join(&files[0])).unwrap();
    assert!(csv.contains("[quota override: 1 of 2 scanned]"));
    assert_eq!(fs::read(out_dir.join("template.xlsx")).unwrap(), b"template bytes");
}

#[test]
fn test_crash_before_rename_leaves_no_ledger_file() {
    let ws = committed();
    let template = ws.dir.path().join("template.xlsx");
    fs::write(&template, b"template bytes").unwrap();
    let out_dir = ws.dir.path().join("out");

    let result = ws.export(&template, &out_dir, Some(points::EXPORT_BEFORE_RENAME));
    assert!(result.crashed());
    assert!(ledger_files(&out_dir).is_empty());
}
