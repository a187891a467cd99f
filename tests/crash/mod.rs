//! Crash testing support
//!
//! Scenarios run the real `stocktake` binary with `STOCKTAKE_CRASH_POINT`
//! set and check what survives on disk.

pub mod harness;
pub mod scenarios;

pub use harness::*;
