//! Snapshot file store
//!
//! Writes follow temp → fsync → rename → fsync(dir). The temp file lives in
//! the same directory as the snapshot so the rename never crosses a
//! filesystem. Until the rename lands, readers see the previous snapshot.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info};

use super::errors::{PersistError, PersistResult};
use super::snapshot::BackupSnapshot;
use crate::crash_point::{maybe_crash, points};
use crate::observability::Event;

/// Location of the snapshot and its temp file.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
    temp_path: PathBuf,
}

impl SnapshotStore {
    /// Store for `data_dir/file_name`.
    pub fn new(data_dir: &Path, file_name: &str) -> Self {
        Self {
            path: data_dir.join(file_name),
            temp_path: data_dir.join(format!("{}.tmp", file_name)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Replace the snapshot atomically.
    ///
    /// On any error the previous snapshot is left as it was.
    pub fn write(&self, snapshot: &BackupSnapshot) -> PersistResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| PersistError::io(parent, e))?;
        }

        let content = snapshot.to_json_bytes()?;

        maybe_crash(points::SNAPSHOT_BEFORE_TEMP_WRITE);

        if let Err(e) = self.write_temp(&content) {
            let _ = fs::remove_file(&self.temp_path);
            return Err(e);
        }

        maybe_crash(points::SNAPSHOT_AFTER_TEMP_WRITE);
        maybe_crash(points::SNAPSHOT_BEFORE_RENAME);

        if let Err(e) = fs::rename(&self.temp_path, &self.path) {
            let _ = fs::remove_file(&self.temp_path);
            return Err(PersistError::io(&self.path, e));
        }

        maybe_crash(points::SNAPSHOT_AFTER_RENAME);

        // fsync the directory so the rename itself is durable
        if let Some(parent) = self.path.parent() {
            if let Ok(dir) = File::open(parent) {
                let _ = dir.sync_all();
            }
        }

        debug!(path = %self.path.display(), bytes = content.len(), "snapshot replaced");
        Ok(())
    }

    fn write_temp(&self, content: &[u8]) -> PersistResult<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.temp_path)
            .map_err(|e| PersistError::io(&self.temp_path, e))?;

        file.write_all(content)
            .map_err(|e| PersistError::io(&self.temp_path, e))?;
        file.sync_all()
            .map_err(|e| PersistError::io(&self.temp_path, e))?;
        Ok(())
    }

    /// Read the snapshot if present.
    ///
    /// - `Ok(None)`: no snapshot file
    /// - `Err(Corrupt)`: file exists but is not a snapshot document
    pub fn read(&self) -> PersistResult<Option<BackupSnapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let bytes = fs::read(&self.path).map_err(|e| PersistError::io(&self.path, e))?;
        BackupSnapshot::from_json_slice(&bytes)
            .map(Some)
            .map_err(|e| PersistError::Corrupt {
                path: self.path.clone(),
                reason: e.to_string(),
            })
    }

    /// Copy the current snapshot to `<stem>.<label>-<utc time>.json`.
    ///
    /// Returns `Ok(None)` when there is nothing to preserve.
    pub fn preserve_copy(&self, label: &str) -> PersistResult<Option<PathBuf>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let stem = self
            .path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("snapshot");
        let stamp = Utc::now().format("%Y%m%dT%H%M%S%3fZ");
        let target = self
            .path
            .with_file_name(format!("{}.{}-{}.json", stem, label, stamp));

        fs::copy(&self.path, &target).map_err(|source| PersistError::PreserveFailed {
            path: self.path.clone(),
            source,
        })?;

        info!(
            event = %Event::SnapshotPreserved,
            from = %self.path.display(),
            to = %target.display(),
            label,
            "previous snapshot preserved"
        );
        Ok(Some(target))
    }
}
