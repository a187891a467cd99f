//! CLI argument definitions using clap
//!
//! Commands:
//! - stocktake init --config <path> [--data-dir <dir>]
//! - stocktake start --config <path> --catalog <csv>
//! - stocktake inspect --config <path>
//! - stocktake export --config <path> --template <file> --out-dir <dir>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::DEFAULT_CONFIG_PATH;

/// stocktake - barcode inventory reconciliation
#[derive(Parser, Debug)]
#[command(name = "stocktake")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a default configuration and create the data directory
    Init {
        /// Path to configuration file
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        /// Data directory recorded in a newly written config
        #[arg(long, default_value = "./stocktake-data")]
        data_dir: PathBuf,
    },

    /// Run a scanning session, reading JSON requests from stdin
    Start {
        /// Path to configuration file
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        /// Catalog CSV (sku, title, expected_qty, box_id)
        #[arg(long)]
        catalog: PathBuf,
    },

    /// Summarize the snapshot on disk and exit
    Inspect {
        /// Path to configuration file
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },

    /// Export the ledger held in the snapshot and exit
    Export {
        /// Path to configuration file
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        /// Template file copied unchanged next to the ledger
        #[arg(long)]
        template: PathBuf,

        /// Output directory
        #[arg(long)]
        out_dir: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
