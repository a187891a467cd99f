//! Line protocol
//!
//! One JSON request per stdin line, tagged by `op`:
//!
//! ```text
//! {"op":"recover","choice":"restore"}
//! {"op":"assign_box","box_id":"B1","fresh":false,"pending":"refuse"}
//! {"op":"scan","code":"9780131103627"}
//! {"op":"edit","sku":"9780131103627","field":"actualQty","value":"4"}
//! {"op":"commit","crew":"night","group":"A","direction":"IN","date":"2026-10-16",
//!  "relocated_box":null,"override_quota":false}
//! {"op":"discard","reset_box":true}
//! {"op":"status"}
//! {"op":"save"}
//! {"op":"reload_catalog","path":"catalog.csv"}
//! {"op":"export","template":"template.xlsx","out_dir":"out"}
//! {"op":"quit"}
//! ```

use std::path::PathBuf;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::persistence::RecoveryChoice;
use crate::quantity::parse_quantity;
use crate::session::{CommitRequest, Effect, FieldEdit, PendingPolicy, ScanOutcome, Transition};

use super::errors::{CliError, CliResult};

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    Recover {
        choice: RecoveryChoice,
    },
    AssignBox {
        box_id: String,
        #[serde(default)]
        fresh: bool,
        #[serde(default)]
        pending: PendingMode,
        /// Commit context, required when `pending` is `commit`
        #[serde(default)]
        commit: Option<CommitArgs>,
    },
    Scan {
        code: String,
    },
    Edit {
        sku: String,
        field: EditField,
        #[serde(default)]
        value: Value,
    },
    Commit(CommitArgs),
    Discard {
        #[serde(default)]
        reset_box: bool,
    },
    Status,
    Save,
    ReloadCatalog {
        path: PathBuf,
    },
    Export {
        template: PathBuf,
        out_dir: PathBuf,
    },
    Quit,
}

impl Request {
    pub fn parse(line: &str) -> CliResult<Self> {
        serde_json::from_str(line).map_err(CliError::from)
    }

    /// Allowed while a recovery offer is still open.
    pub fn allowed_during_recovery(&self) -> bool {
        matches!(self, Request::Recover { .. } | Request::Quit | Request::Status)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingMode {
    #[default]
    Refuse,
    Commit,
    Discard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum EditField {
    #[serde(rename = "actualQty", alias = "actual_qty")]
    ActualQty,
    #[serde(rename = "relocatedBox", alias = "relocated_box")]
    RelocatedBox,
    #[serde(rename = "note")]
    Note,
    #[serde(rename = "assignedBox", alias = "assigned_box")]
    AssignedBox,
    #[serde(rename = "expectedQty", alias = "expected_qty")]
    ExpectedQty,
}

/// Commit fields as sent on the wire. Direction and date fall back to
/// configured and current values when absent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CommitArgs {
    pub crew: String,
    pub group: String,
    pub direction: Option<String>,
    pub date: Option<String>,
    pub relocated_box: Option<String>,
    pub override_quota: bool,
}

impl CommitArgs {
    pub fn into_request(self, default_direction: &str, today: &str) -> CommitRequest {
        let non_blank = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        CommitRequest {
            direction: non_blank(self.direction).unwrap_or_else(|| default_direction.to_string()),
            date: non_blank(self.date).unwrap_or_else(|| today.to_string()),
            crew: self.crew,
            group: self.group,
            relocated_box: self.relocated_box,
            override_quota: self.override_quota,
        }
    }
}

/// Build the pending policy for an `assign_box` request.
pub fn pending_policy(
    mode: PendingMode,
    commit: Option<CommitArgs>,
    default_direction: &str,
    today: &str,
) -> CliResult<PendingPolicy> {
    match mode {
        PendingMode::Refuse => Ok(PendingPolicy::Refuse),
        PendingMode::Discard => Ok(PendingPolicy::DiscardFirst),
        PendingMode::Commit => commit
            .map(|c| PendingPolicy::CommitFirst(c.into_request(default_direction, today)))
            .ok_or_else(|| {
                CliError::BadRequest("pending \"commit\" needs a \"commit\" object".into())
            }),
    }
}

/// Interpret an edit value for `field`.
pub fn field_edit(field: EditField, value: &Value) -> CliResult<FieldEdit> {
    match field {
        EditField::ActualQty => match value {
            Value::Null => Ok(FieldEdit::ActualQty(None)),
            Value::String(s) if s.trim().is_empty() => Ok(FieldEdit::ActualQty(None)),
            other => quantity(other).map(|q| FieldEdit::ActualQty(Some(q))),
        },
        EditField::ExpectedQty => quantity(value).map(FieldEdit::ExpectedQty),
        EditField::RelocatedBox => text(value).map(FieldEdit::RelocatedBox),
        EditField::Note => text(value).map(FieldEdit::Note),
        EditField::AssignedBox => text(value).map(FieldEdit::AssignedBox),
    }
}

fn quantity(value: &Value) -> CliResult<i64> {
    let parsed = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().and_then(|f| parse_quantity(&f.to_string()))),
        Value::String(s) => parse_quantity(s),
        _ => None,
    };
    parsed.ok_or_else(|| CliError::BadRequest(format!("{} is not a whole quantity", value)))
}

fn text(value: &Value) -> CliResult<String> {
    match value {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s.clone()),
        other => Err(CliError::BadRequest(format!("{} is not text", other))),
    }
}

pub fn effect_json(effect: &Effect) -> Value {
    match effect {
        Effect::BoxAssigned {
            box_id,
            quota,
            fresh,
        } => json!({ "effect": "box_assigned", "box_id": box_id, "quota": quota, "fresh": fresh }),
        Effect::BoxReleased => json!({ "effect": "box_released" }),
        Effect::Scanned {
            sku,
            actual_qty,
            status,
            outcome,
        } => {
            let mut v = json!({
                "effect": "scanned",
                "sku": sku,
                "actual_qty": actual_qty,
                "status": status.as_str(),
            });
            match outcome {
                ScanOutcome::Matched(rule) => {
                    v["outcome"] = json!("matched");
                    v["rule"] = json!(rule.as_str());
                }
                ScanOutcome::WrongBox { owner_box } => {
                    v["outcome"] = json!("wrong_box");
                    v["owner_box"] = json!(owner_box);
                }
                ScanOutcome::NotFound => v["outcome"] = json!("not_found"),
            }
            v
        }
        Effect::Edited { sku, field, status } => {
            json!({ "effect": "edited", "sku": sku, "field": field, "status": status.as_str() })
        }
        Effect::Committed(batch) => json!({
            "effect": "committed",
            "box_id": batch.box_id,
            "entries": batch.entries.len(),
            "quota_override": batch.quota_override.map(|o| json!({ "scanned": o.scanned, "quota": o.quota })),
        }),
        Effect::Discarded { count } => json!({ "effect": "discarded", "count": count }),
    }
}

pub fn transition_json(transition: &Transition) -> Value {
    json!({
        "phase": transition.phase.name(),
        "effects": transition.effects.iter().map(effect_json).collect::<Vec<_>>(),
    })
}
