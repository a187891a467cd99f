//! Single-slot cancellable timer
//!
//! A slot holds at most one pending deadline. Scheduling replaces whatever
//! was pending, and every schedule gets a fresh generation token. A firing
//! is honoured only when its token is still the current one, so a cancelled
//! or superseded timer can never fire late.

use std::time::Instant;

/// Identity of one scheduled firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

impl TimerToken {
    pub fn generation(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct TimerSlot {
    generation: u64,
    pending: Option<(TimerToken, Instant)>,
}

impl TimerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the slot for `deadline`, cancelling any pending firing.
    pub fn schedule(&mut self, deadline: Instant) -> TimerToken {
        self.generation += 1;
        let token = TimerToken(self.generation);
        self.pending = Some((token, deadline));
        token
    }

    /// Cancel the pending firing. Returns false when nothing was pending.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.map(|(_, at)| at)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Whether `token` is the firing currently armed.
    pub fn is_current(&self, token: TimerToken) -> bool {
        matches!(self.pending, Some((t, _)) if t == token)
    }

    /// Fire `token` if it is still armed. Stale tokens are a no-op.
    pub fn fire(&mut self, token: TimerToken) -> bool {
        if self.is_current(token) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    /// Fire the armed timer if its deadline has passed.
    pub fn fire_if_due(&mut self, now: Instant) -> Option<TimerToken> {
        match self.pending {
            Some((token, at)) if at <= now => {
                self.pending = None;
                Some(token)
            }
            _ => None,
        }
    }
}
