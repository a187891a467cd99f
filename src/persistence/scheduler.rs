//! Autosave scheduling
//!
//! Two independent slots:
//! - debounce: re-armed by every mutation, fires `debounce` after the last one
//! - periodic: fires every `interval`, writes only when dirty
//!
//! Time is passed in, never read, so the policy is tested without sleeping.

use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::debug;

use super::timer::TimerSlot;
use crate::observability::Event;

/// Why a snapshot write happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlushReason {
    Debounce,
    Periodic,
    Shutdown,
    Manual,
}

impl FlushReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlushReason::Debounce => "debounce",
            FlushReason::Periodic => "periodic",
            FlushReason::Shutdown => "shutdown",
            FlushReason::Manual => "manual",
        }
    }
}

#[derive(Debug)]
pub struct AutosaveScheduler {
    debounce: Duration,
    interval: Duration,
    debounce_slot: TimerSlot,
    periodic_slot: TimerSlot,
    dirty: bool,
    shutting_down: bool,
}

impl AutosaveScheduler {
    /// Start the periodic timer at `now`.
    pub fn new(debounce: Duration, interval: Duration, now: Instant) -> Self {
        let mut periodic_slot = TimerSlot::new();
        periodic_slot.schedule(now + interval);
        Self {
            debounce,
            interval,
            debounce_slot: TimerSlot::new(),
            periodic_slot,
            dirty: false,
            shutting_down: false,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down
    }

    /// Record a mutation and re-arm the debounce.
    pub fn mark_dirty(&mut self, now: Instant) {
        self.dirty = true;
        if self.shutting_down {
            return;
        }
        let token = self.debounce_slot.schedule(now + self.debounce);
        debug!(
            event = %Event::AutosaveScheduled,
            generation = token.generation(),
            delay_ms = self.debounce.as_millis() as u64,
            "debounced write armed"
        );
    }

    /// Earliest armed deadline, for the event loop to sleep until.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.debounce_slot.deadline(), self.periodic_slot.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Fire due timers. Returns the reason to write, if any.
    ///
    /// Both timers due at once yield a single write.
    pub fn poll(&mut self, now: Instant) -> Option<FlushReason> {
        if self.shutting_down {
            return None;
        }

        let debounce_fired = self.debounce_slot.fire_if_due(now).is_some();
        let periodic_fired = self.periodic_slot.fire_if_due(now).is_some();
        if periodic_fired {
            self.periodic_slot.schedule(now + self.interval);
        }

        if !self.dirty {
            return None;
        }
        if debounce_fired {
            Some(FlushReason::Debounce)
        } else if periodic_fired {
            Some(FlushReason::Periodic)
        } else {
            None
        }
    }

    /// Record the outcome of a write. A failed write stays dirty and is
    /// retried by the next periodic tick.
    pub fn on_flushed(&mut self, succeeded: bool) {
        if succeeded {
            self.dirty = false;
            self.debounce_slot.cancel();
        }
    }

    /// Cancel both timers. The first call returns `Shutdown` when there is
    /// unsaved state; later calls return `None`.
    pub fn begin_shutdown(&mut self) -> Option<FlushReason> {
        if self.shutting_down {
            return None;
        }
        self.shutting_down = true;
        self.debounce_slot.cancel();
        self.periodic_slot.cancel();
        self.dirty.then_some(FlushReason::Shutdown)
    }
}
