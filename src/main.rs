//! stocktake CLI entry point
//!
//! Parses arguments and dispatches through `cli::run`; errors go to stderr
//! with their code and the process exits non-zero. All setup (config,
//! logging, runtime) happens inside the commands.

use stocktake::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}: {}", e.code(), e);
        std::process::exit(1);
    }
}
