//! Ledger aggregation
//!
//! Merge rule per key `(sku, originBox)`:
//! - absent: append
//! - present: quantities add; `status`, `note` and `relocatedBox` take the
//!   incoming values; every other column keeps its first-written value.
//!   Quota override markers already on the record survive a note overwrite.
//!
//! The rule is a left fold, so folding the full history from scratch gives
//! the same ledger as merging commit by commit.

use std::collections::HashMap;

use crate::session::{CommitBatch, QuotaOverride};

use super::record::{receipt_no, LedgerKey, LedgerRecord};

/// Marker written into ledger notes of commits that went through below quota.
/// The full form is `[quota override: <scanned> of <quota> scanned]`.
pub const QUOTA_OVERRIDE_TAG: &str = "[quota override";

/// Turn one commit into ledger records (not yet merged).
pub fn build_records(batch: &CommitBatch) -> Vec<LedgerRecord> {
    let req = &batch.request;
    let relocation_override = req
        .relocated_box
        .as_deref()
        .map(str::trim)
        .filter(|b| !b.is_empty());

    batch
        .entries
        .iter()
        .filter_map(|entry| {
            let qty = entry.actual_qty?;
            Some(LedgerRecord {
                direction: req.direction.clone(),
                receipt_no: receipt_no(&req.date),
                date: req.date.clone(),
                relocated_box: relocation_override
                    .map(str::to_string)
                    .unwrap_or_else(|| entry.relocated_box.clone()),
                sku: entry.sku.clone(),
                title: entry.title.clone(),
                actual_qty: qty,
                origin_box: entry.origin_box.clone(),
                status: entry.status.as_str().to_string(),
                note: annotate_note(&entry.note, batch.quota_override),
                group: req.group.clone(),
                crew: req.crew.clone(),
            })
        })
        .collect()
}

/// Append the quota override marker to a note when the commit was overridden.
pub fn annotate_note(note: &str, quota_override: Option<QuotaOverride>) -> String {
    match quota_override {
        None => note.to_string(),
        Some(ov) => {
            let tag = format!(
                "{}: {} of {} scanned]",
                QUOTA_OVERRIDE_TAG, ov.scanned, ov.quota
            );
            if note.trim().is_empty() {
                tag
            } else {
                format!("{} {}", note.trim(), tag)
            }
        }
    }
}

/// Whether a record was written by a below-quota override commit.
///
/// Only the complete marker counts; free text that merely starts like it
/// does not.
pub fn is_quota_override(record: &LedgerRecord) -> bool {
    !override_markers(&record.note).is_empty()
}

/// Well-formed override markers in `note`, in order.
pub fn override_markers(note: &str) -> Vec<&str> {
    let prefix = format!("{}: ", QUOTA_OVERRIDE_TAG);
    let mut out = Vec::new();
    for (start, _) in note.match_indices(&prefix) {
        let rest = &note[start + prefix.len()..];
        let Some(end) = rest.find(']') else {
            continue;
        };
        if is_marker_body(&rest[..end]) {
            out.push(&note[start..start + prefix.len() + end + 1]);
        }
    }
    out
}

/// `<digits> of <digits> scanned`
fn is_marker_body(body: &str) -> bool {
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    match body.strip_suffix(" scanned").and_then(|b| b.split_once(" of ")) {
        Some((scanned, quota)) => digits(scanned) && digits(quota),
        None => false,
    }
}

/// Incoming note plus any override markers of `existing` it lacks.
fn carry_markers(existing: &str, incoming: String) -> String {
    let missing: Vec<&str> = override_markers(existing)
        .into_iter()
        .filter(|m| !incoming.contains(m))
        .collect();
    if missing.is_empty() {
        return incoming;
    }
    let mut note = incoming.trim().to_string();
    for marker in missing {
        if !note.is_empty() {
            note.push(' ');
        }
        note.push_str(marker);
    }
    note
}

/// Merge `incoming` into `records`, preserving first-seen order of keys.
pub fn merge_into<I>(records: &mut Vec<LedgerRecord>, incoming: I)
where
    I: IntoIterator<Item = LedgerRecord>,
{
    let mut index: HashMap<LedgerKey, usize> = HashMap::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        index.entry(rec.key()).or_insert(i);
    }

    for rec in incoming {
        match index.get(&rec.key()) {
            Some(&i) => {
                let existing = &mut records[i];
                existing.actual_qty = existing.actual_qty.saturating_add(rec.actual_qty);
                existing.status = rec.status;
                existing.note = carry_markers(&existing.note, rec.note);
                existing.relocated_box = rec.relocated_box;
            }
            None => {
                index.insert(rec.key(), records.len());
                records.push(rec);
            }
        }
    }
}

/// Fold a full history of records into a deduplicated ledger.
pub fn rebuild<I>(history: I) -> Vec<LedgerRecord>
where
    I: IntoIterator<Item = LedgerRecord>,
{
    let mut out = Vec::new();
    merge_into(&mut out, history);
    out
}
