//! Ledger export to the operator's output directory.

mod errors;
mod writer;

pub use errors::{ExportError, ExportResult};
pub use writer::{export_ledger, export_ledger_at, ExportReport};
