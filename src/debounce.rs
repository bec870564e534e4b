//! Settle timer that defers work until scrolling stops.

/// Settle timer for scroll events.
///
/// Every scroll restarts the timer; the expensive recomputation runs once
/// no scroll has arrived for `delay_ms`.
#[derive(Debug, Clone)]
pub struct ScrollDebouncer {
    delay_ms: u64,
    pending: Option<u64>,
}

impl ScrollDebouncer {
    pub const fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            pending: None,
        }
    }

    pub const fn delay_ms(&self) -> u64 {
        self.delay_ms
    }

    pub const fn queue(&mut self, now_ms: u64) {
        self.pending = Some(now_ms.saturating_add(self.delay_ms));
    }

    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Milliseconds until the pending recomputation fires.
    pub const fn remaining_ms(&self, now_ms: u64) -> Option<u64> {
        match self.pending {
            Some(due) => Some(due.saturating_sub(now_ms)),
            None => None,
        }
    }

    pub const fn take_ready(&mut self, now_ms: u64) -> bool {
        match self.pending {
            Some(due) if now_ms >= due => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    pub const fn cancel(&mut self) {
        self.pending = None;
    }
}
