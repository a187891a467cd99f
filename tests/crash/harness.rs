//! Subprocess harness
//!
//! - writes a config and catalog into a temp directory
//! - feeds protocol lines to `stocktake start` on stdin
//! - optionally injects a crash point through the environment

use std::fs;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use stocktake::crash_point::CRASH_POINT_ENV;
use stocktake::persistence::{BackupSnapshot, SnapshotStore};
use tempfile::TempDir;

pub const CATALOG_CSV: &str = "sku,title,expected_qty,box_id\n\
978-0-13-110362-7,The C Programming Language,2,B1\n\
111-222,Stapler,1,B1\n\
555,Tape,3,B2\n";

/// Result of one subprocess run
#[derive(Debug)]
pub struct RunResult {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl RunResult {
    /// Whether the process died instead of exiting.
    pub fn crashed(&self) -> bool {
        !self.status.success()
    }
}

/// A temp workspace with config, data dir and catalog.
pub struct Workspace {
    pub dir: TempDir,
    pub config: PathBuf,
    pub catalog: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("stocktake.json");
        let catalog = dir.path().join("catalog.csv");
        let data_dir = dir.path().join("data");

        fs::write(
            &config,
            serde_json::json!({ "data_dir": data_dir, "retry_backoff_ms": 1 }).to_string(),
        )
        .unwrap();
        fs::write(&catalog, CATALOG_CSV).unwrap();

        Self {
            dir,
            config,
            catalog,
        }
    }

    pub fn data_dir(&self) -> PathBuf {
        self.dir.path().join("data")
    }

    pub fn store(&self) -> SnapshotStore {
        SnapshotStore::new(&self.data_dir(), "backup.json")
    }

    pub fn snapshot(&self) -> Option<BackupSnapshot> {
        self.store().read().unwrap()
    }

    /// Run `stocktake start` with `lines` on stdin.
    pub fn start(&self, lines: &[&str], crash_point: Option<&str>) -> RunResult {
        let args = [
            "start",
            "--config",
            path_str(&self.config),
            "--catalog",
            path_str(&self.catalog),
        ];
        run(&args, lines, crash_point)
    }

    /// Run `stocktake export`.
    pub fn export(&self, template: &Path, out_dir: &Path, crash_point: Option<&str>) -> RunResult {
        let args = [
            "export",
            "--config",
            path_str(&self.config),
            "--template",
            path_str(template),
            "--out-dir",
            path_str(out_dir),
        ];
        run(&args, &[], crash_point)
    }

    /// Run `stocktake start`, wait until every line is answered, then send
    /// SIGTERM while stdin is still open.
    #[cfg(unix)]
    pub fn start_then_terminate(&self, lines: &[&str]) -> RunResult {
        let mut child = Command::new(env!("CARGO_BIN_EXE_stocktake"))
            .args([
                "start",
                "--config",
                path_str(&self.config),
                "--catalog",
                path_str(&self.catalog),
            ])
            .env_remove(CRASH_POINT_ENV)
            .env("RUST_LOG", "warn")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .unwrap();

        let mut stdin = child.stdin.take().unwrap();
        for line in lines {
            writeln!(stdin, "{}", line).unwrap();
        }
        stdin.flush().unwrap();

        // startup notice plus one reply per request
        let mut reader = BufReader::new(child.stdout.take().unwrap());
        let mut stdout = String::new();
        for _ in 0..=lines.len() {
            reader.read_line(&mut stdout).unwrap();
        }

        let killed = Command::new("kill")
            .args(["-TERM", &child.id().to_string()])
            .status()
            .unwrap();
        assert!(killed.success());

        reader.read_to_string(&mut stdout).unwrap();
        let mut stderr = String::new();
        child.stderr.take().unwrap().read_to_string(&mut stderr).unwrap();
        let status = child.wait().unwrap();
        drop(stdin);

        RunResult {
            status,
            stdout,
            stderr,
        }
    }
}

fn path_str(p: &Path) -> &str {
    p.to_str().unwrap()
}

fn run(args: &[&str], lines: &[&str], crash_point: Option<&str>) -> RunResult {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_stocktake"));
    cmd.args(args)
        .env_remove(CRASH_POINT_ENV)
        .env("RUST_LOG", "warn")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(point) = crash_point {
        cmd.env(CRASH_POINT_ENV, point);
    }

    let mut child = cmd.spawn().unwrap();
    {
        let mut stdin = child.stdin.take().unwrap();
        let mut input = lines.join("\n");
        input.push('\n');
        // The child may abort before reading everything
        let _ = stdin.write_all(input.as_bytes());
    }
    let output = child.wait_with_output().unwrap();

    RunResult {
        status: output.status,
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    }
}

/// Parse every stdout line as JSON.
pub fn responses(result: &RunResult) -> Vec<serde_json::Value> {
    result
        .stdout
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}
