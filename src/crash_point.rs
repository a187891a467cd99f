//! Crash point injection for durability tests
//!
//! When `STOCKTAKE_CRASH_POINT` names a point, reaching it terminates the
//! process with `std::process::abort()`: no cleanup, no unwinding, no
//! final autosave.
//!
//! ```bash
//! STOCKTAKE_CRASH_POINT=snapshot_before_rename stocktake start --catalog c.csv
//! ```

use std::sync::OnceLock;

/// Environment variable read once per process
pub const CRASH_POINT_ENV: &str = "STOCKTAKE_CRASH_POINT";

static CRASH_POINT: OnceLock<Option<String>> = OnceLock::new();

#[inline]
fn get_crash_point() -> Option<&'static str> {
    CRASH_POINT
        .get_or_init(|| std::env::var(CRASH_POINT_ENV).ok())
        .as_deref()
}

/// Returns true if `STOCKTAKE_CRASH_POINT` equals `name`.
#[inline]
pub fn crash_point_enabled(name: &str) -> bool {
    get_crash_point().map(|p| p == name).unwrap_or(false)
}

/// Abort the process if the named crash point is enabled.
#[inline]
pub fn maybe_crash(name: &str) {
    if crash_point_enabled(name) {
        eprintln!("[CRASH] Triggering crash at point: {}", name);
        std::process::abort();
    }
}

/// All defined crash point names
pub mod points {
    // Snapshot write
    pub const SNAPSHOT_BEFORE_TEMP_WRITE: &str = "snapshot_before_temp_write";
    pub const SNAPSHOT_AFTER_TEMP_WRITE: &str = "snapshot_after_temp_write";
    pub const SNAPSHOT_BEFORE_RENAME: &str = "snapshot_before_rename";
    pub const SNAPSHOT_AFTER_RENAME: &str = "snapshot_after_rename";

    // Ledger export
    pub const EXPORT_BEFORE_RENAME: &str = "export_before_rename";

    pub fn all() -> &'static [&'static str] {
        &[
            SNAPSHOT_BEFORE_TEMP_WRITE,
            SNAPSHOT_AFTER_TEMP_WRITE,
            SNAPSHOT_BEFORE_RENAME,
            SNAPSHOT_AFTER_RENAME,
            EXPORT_BEFORE_RENAME,
        ]
    }
}
