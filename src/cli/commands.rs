//! CLI command implementations

use std::fs;
use std::path::Path;
use std::time::Instant;

use serde_json::json;
use tracing::info;

use crate::catalog::{load_csv, Catalog};
use crate::config::{Config, ConfigError};
use crate::export::export_ledger;
use crate::ledger::Ledger;
use crate::observability::{init_tracing, Event};
use crate::persistence::SnapshotStore;

use super::args::Command;
use super::console::Console;
use super::errors::{CliError, CliResult};
use super::event_loop;
use super::io::write_response;

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Init { config, data_dir } => init(&config, &data_dir),
        Command::Start { config, catalog } => start(&config, &catalog),
        Command::Inspect { config } => inspect(&config),
        Command::Export {
            config,
            template,
            out_dir,
        } => export(&config, &template, &out_dir),
    }
}

fn load_config(config_path: &Path) -> CliResult<Config> {
    let config = Config::load(config_path)?;
    init_tracing(&config.log_level);
    info!(
        event = %Event::ConfigLoaded,
        path = %config_path.display(),
        data_dir = %config.data_dir.display(),
        "configuration loaded"
    );
    Ok(config)
}

/// Write a default config (unless one exists) and create the data directory.
pub fn init(config_path: &Path, data_dir: &Path) -> CliResult<()> {
    let written = !config_path.exists();
    let config = if written {
        let config = Config::with_data_dir(data_dir);
        config.validate()?;
        config.write_new(config_path)?;
        config
    } else {
        Config::load(config_path)?
    };

    fs::create_dir_all(&config.data_dir).map_err(|e| ConfigError::Write {
        path: config.data_dir.clone(),
        reason: e.to_string(),
    })?;

    write_response(json!({
        "initialized": true,
        "config_written": written,
        "config": config,
    }))
}

/// Load config and catalog, then serve the line protocol until shutdown.
pub fn start(config_path: &Path, catalog_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    info!(event = %Event::BootStart, catalog = %catalog_path.display(), "starting");

    let catalog = Catalog::new(load_csv(catalog_path)?);
    info!(
        event = %Event::CatalogLoaded,
        records = catalog.len(),
        boxes = catalog.box_ids().len(),
        "catalog loaded"
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::Runtime(e.to_string()))?;

    let (console, notice) = Console::open(config, catalog, Instant::now());
    runtime.block_on(event_loop::serve(console, notice))
}

/// Print a summary of the snapshot on disk.
pub fn inspect(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    let store = SnapshotStore::new(&config.data_dir, &config.snapshot_file);

    match store.read()? {
        Some(snapshot) => write_response(json!({
            "path": store.path(),
            "snapshot": snapshot.summary(),
            "ledger_total_qty": Ledger::from_records(snapshot.ledger_records).total_qty(),
        })),
        None => write_response(json!({ "path": store.path(), "snapshot": null })),
    }
}

/// Export the snapshot's ledger without starting a session.
pub fn export(config_path: &Path, template: &Path, out_dir: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    let store = SnapshotStore::new(&config.data_dir, &config.snapshot_file);
    let snapshot = store
        .read()?
        .ok_or_else(|| CliError::NoSnapshot(store.path().to_path_buf()))?;

    let ledger = Ledger::from_records(snapshot.ledger_records);
    let report = export_ledger(&ledger, template, out_dir, &config.retry_policy())?;
    write_response(json!({ "export": report }))
}
