//! Ledger export
//!
//! Two files land in the output directory:
//! - an untouched copy of the operator's template
//! - `ledger-<utc time>.csv` with one row per ledger record, written via a
//!   temp file and rename so a partial file is never visible

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info};

use super::errors::{ExportError, ExportResult};
use crate::crash_point::{maybe_crash, points};
use crate::ledger::{Ledger, LEDGER_COLUMNS};
use crate::observability::Event;
use crate::persistence::RetryPolicy;

/// Files produced by one export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportReport {
    /// `None` when the template already lives in the output directory
    pub template_copy: Option<PathBuf>,
    pub ledger_file: PathBuf,
    pub records: usize,
}

/// Export `ledger` next to a copy of `template`.
pub fn export_ledger(
    ledger: &Ledger,
    template: &Path,
    out_dir: &Path,
    retry: &RetryPolicy,
) -> ExportResult<ExportReport> {
    export_ledger_at(ledger, template, out_dir, retry, Utc::now())
}

/// [`export_ledger`] with the timestamp used in the file name given.
pub fn export_ledger_at(
    ledger: &Ledger,
    template: &Path,
    out_dir: &Path,
    retry: &RetryPolicy,
    now: DateTime<Utc>,
) -> ExportResult<ExportReport> {
    let result = write_export(ledger, template, out_dir, retry, now);
    match &result {
        Ok(report) => info!(
            event = %Event::ExportComplete,
            records = report.records,
            ledger_file = %report.ledger_file.display(),
            "ledger exported"
        ),
        Err(e) => error!(
            event = %Event::ExportFailed,
            code = e.code(),
            error = %e,
            "ledger export failed"
        ),
    }
    result
}

fn write_export(
    ledger: &Ledger,
    template: &Path,
    out_dir: &Path,
    retry: &RetryPolicy,
    now: DateTime<Utc>,
) -> ExportResult<ExportReport> {
    if !template.is_file() {
        return Err(ExportError::TemplateMissing(template.to_path_buf()));
    }
    let template_name = template
        .file_name()
        .ok_or_else(|| ExportError::TemplateMissing(template.to_path_buf()))?;

    fs::create_dir_all(out_dir).map_err(|e| ExportError::io(out_dir, e))?;

    let copy_target = out_dir.join(template_name);
    let template_copy = if same_file(template, &copy_target) {
        None
    } else {
        retry.run("template copy", || {
            fs::copy(template, &copy_target).map_err(|e| ExportError::io(&copy_target, e))
        })?;
        Some(copy_target)
    };

    let ledger_file = out_dir.join(format!("ledger-{}.csv", now.format("%Y%m%dT%H%M%S%3fZ")));
    retry.run("ledger csv", || write_csv(ledger, &ledger_file))?;

    Ok(ExportReport {
        template_copy,
        ledger_file,
        records: ledger.len(),
    })
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn write_csv(ledger: &Ledger, path: &Path) -> ExportResult<()> {
    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = PathBuf::from(temp_name);

    let result = write_csv_temp(ledger, &temp_path).and_then(|()| {
        maybe_crash(points::EXPORT_BEFORE_RENAME);
        fs::rename(&temp_path, path).map_err(|e| ExportError::io(path, e))
    });
    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

fn write_csv_temp(ledger: &Ledger, temp_path: &Path) -> ExportResult<()> {
    let file = File::create(temp_path).map_err(|e| ExportError::io(temp_path, e))?;
    let mut wtr = csv::Writer::from_writer(file);

    wtr.write_record(LEDGER_COLUMNS)?;
    for record in ledger.records() {
        wtr.write_record(record.to_row())?;
    }

    let file = wtr
        .into_inner()
        .map_err(|e| ExportError::io(temp_path, e.into_error()))?;
    file.sync_all().map_err(|e| ExportError::io(temp_path, e))?;
    Ok(())
}
