//! JSON line output
//!
//! One JSON object per line on stdout:
//! - `{"status":"ok","data":...}`
//! - `{"status":"error","code":...,"message":...,"ack_required":...}`
//! - `{"status":"notice","kind":...,"data":...}` for messages the operator
//!   did not ask for (recovery offer, failed autosave)

use std::io::{self, Write};

use serde_json::{json, Value};

use super::errors::{CliError, CliResult};

pub fn ok(data: Value) -> Value {
    json!({ "status": "ok", "data": data })
}

pub fn error(err: &CliError) -> Value {
    json!({
        "status": "error",
        "code": err.code(),
        "message": err.to_string(),
        "ack_required": err.needs_ack(),
    })
}

pub fn notice(kind: &str, data: Value) -> Value {
    json!({ "status": "notice", "kind": kind, "data": data })
}

/// Write one response line to stdout and flush.
pub fn write_line(value: &Value) -> CliResult<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, value).map_err(io::Error::from)?;
    writeln!(stdout)?;
    stdout.flush()?;
    Ok(())
}

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    write_line(&ok(data))
}
