//! Command-line adapter
//!
//! - init: write config, create data directory
//! - start: serve the JSON line protocol over stdin/stdout
//! - inspect: summarize the snapshot on disk
//! - export: export the snapshot's ledger

mod args;
mod commands;
mod console;
mod errors;
mod event_loop;
mod io;
pub mod protocol;

pub use args::{Cli, Command};
pub use commands::{export, init, inspect, run, run_command, start};
pub use console::{Console, Step};
pub use errors::{CliError, CliResult};
