//! stocktake: barcode inventory reconciliation
//!
//! A box-by-box counting session over a reference catalog:
//!
//! - [`matcher`] resolves noisy scanned codes to catalog rows
//! - [`session`] holds the open box and its uncommitted counts
//! - [`discrepancy`] classifies counts against expectations
//! - [`ledger`] accumulates committed counts per `(sku, originBox)`
//! - [`persistence`] snapshots session and ledger atomically and offers
//!   recovery after a crash
//!
//! The core is synchronous and IO-free; [`cli`] adapts it to a JSON line
//! protocol on stdin/stdout.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod crash_point;
pub mod discrepancy;
pub mod export;
pub mod ledger;
pub mod matcher;
pub mod observability;
pub mod persistence;
pub mod quantity;
pub mod reconciler;
pub mod session;
