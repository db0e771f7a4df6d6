//! Update throttling

use crate::foundation::time::Millis;

/// Rate limiter for animation state updates
///
/// When throttling is on, an update is applied only if at least
/// `interval_ms` passed since the last applied one. The first update of a run
/// always applies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameGate {
    interval_ms: Millis,
    throttle: bool,
    last_applied: Option<Millis>,
}

impl FrameGate {
    /// Create a gate
    pub fn new(interval_ms: Millis, throttle: bool) -> Self {
        Self {
            interval_ms,
            throttle,
            last_applied: None,
        }
    }

    /// Whether an update at `now` should be applied; records it if so
    pub fn should_apply(&mut self, now: Millis) -> bool {
        let due = match self.last_applied {
            None => true,
            Some(_) if !self.throttle => true,
            Some(last) => now - last >= self.interval_ms,
        };
        if due {
            self.last_applied = Some(now);
        }
        due
    }
}
