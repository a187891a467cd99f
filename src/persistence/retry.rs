//! Bounded retry with linear backoff for file writes.

use std::thread;
use std::time::Duration;

use tracing::warn;

use crate::observability::Event;

/// Errors that may succeed when the same operation is tried again.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

/// How many times to try a write and how long to wait between tries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first; at least 1
    pub attempts: u32,
    /// Wait before attempt `n + 1` is `backoff * n`
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    pub fn new(attempts: u32, backoff: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            backoff,
        }
    }

    /// Single attempt, no waiting.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// attempts run out. The last error is returned.
    pub fn run<T, E, F>(&self, what: &str, mut op: F) -> Result<T, E>
    where
        E: Retryable + std::fmt::Display,
        F: FnMut() -> Result<T, E>,
    {
        let attempts = self.attempts.max(1);
        let mut attempt = 1;
        loop {
            match op() {
                Ok(v) => return Ok(v),
                Err(e) if e.is_retryable() && attempt < attempts => {
                    warn!(
                        event = %Event::WriteRetry,
                        what,
                        attempt,
                        attempts,
                        error = %e,
                        "write failed, retrying"
                    );
                    if !self.backoff.is_zero() {
                        thread::sleep(self.backoff * attempt);
                    }
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
