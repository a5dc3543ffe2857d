//! Additive, capped backoff for channel creation retries.

use std::time::Duration;

/// Wait schedule for one channel creation sequence.
///
/// The wait starts at `initial_ms`, grows by `step_ms` after every failed
/// attempt and never exceeds `max_ms`. Waits above the cap, initial or
/// overridden, are clamped to it so the schedule never decreases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreationBackoff {
    current_ms: u64,
    max_ms: u64,
    step_ms: u64,
    attempts: u32,
}

impl CreationBackoff {
    pub fn new(initial_ms: u64, max_ms: u64, step_ms: u64) -> Self {
        Self {
            current_ms: initial_ms.min(max_ms),
            max_ms,
            step_ms,
            attempts: 0,
        }
    }

    /// Wait to apply before the next attempt.
    pub fn current(&self) -> Duration {
        Duration::from_millis(self.current_ms)
    }

    pub fn current_ms(&self) -> u64 {
        self.current_ms
    }

    /// Number of failed attempts recorded so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Replace the wait for the upcoming retry.
    pub fn override_wait(&mut self, wait_ms: u64) {
        self.current_ms = wait_ms.min(self.max_ms);
    }

    /// Record a failed attempt and grow the wait for the next one.
    pub fn advance(&mut self) -> Duration {
        self.attempts = self.attempts.saturating_add(1);
        self.current_ms = self.current_ms.saturating_add(self.step_ms).min(self.max_ms);
        self.current()
    }
}
