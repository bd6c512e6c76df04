//! The deferred re-authentication check.
//!
//! At most one check is pending at a time: arming replaces the previous deadline
//! and every handle carries a generation so a cancelled check can never fire late.

use std::time::Instant;

/// Identifies one armed deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerHandle(u64);

/// A single-slot, cancellable deadline polled by its owner.
#[derive(Debug, Default)]
pub struct ReauthTimer {
    next_generation: u64,
    pending: Option<(TimerHandle, Instant)>,
}

impl ReauthTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms the timer for `due`, replacing any pending deadline.
    pub fn arm(&mut self, due: Instant) -> TimerHandle {
        let handle = TimerHandle(self.next_generation);
        self.next_generation += 1;
        self.pending = Some((handle, due));
        handle
    }

    /// Cancels the pending deadline, returning its handle if one was armed.
    pub fn cancel(&mut self) -> Option<TimerHandle> {
        self.pending.take().map(|(handle, _)| handle)
    }

    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    pub fn due_at(&self) -> Option<Instant> {
        self.pending.map(|(_, due)| due)
    }

    /// Disarms and returns the handle if the deadline has passed.
    pub fn fire_if_due(&mut self, now: Instant) -> Option<TimerHandle> {
        match self.pending {
            Some((handle, due)) if now >= due => {
                self.pending = None;
                Some(handle)
            }
            _ => None,
        }
    }
}
