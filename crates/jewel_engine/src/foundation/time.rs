//! Time management utilities
//!
//! Everything time-dependent in the engine takes an explicit timestamp in
//! milliseconds. A [`Clock`] supplies those timestamps: the host uses
//! [`SystemClock`], tests drive a [`ManualClock`].

use std::cell::Cell;
use std::time::{Duration, Instant};

/// Timestamp or span in milliseconds
pub type Millis = f64;

/// Source of monotonic timestamps
pub trait Clock {
    /// Milliseconds since the clock's origin
    fn now_ms(&self) -> Millis;
}

/// Wall clock measuring from the moment it was created
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    /// Create a clock whose origin is now
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }

    /// Elapsed time since the origin
    pub fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> Millis {
        self.elapsed().as_secs_f64() * 1000.0
    }
}

/// Manually advanced clock for deterministic tests and simulations
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Millis>,
}

impl ManualClock {
    /// Create a clock at time zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a clock at the given time
    pub fn starting_at(now: Millis) -> Self {
        Self { now: Cell::new(now) }
    }

    /// Move time forward
    pub fn advance(&self, ms: Millis) {
        self.now.set(self.now.get() + ms);
    }

    /// Jump to an absolute time
    pub fn set(&self, now: Millis) {
        self.now.set(now);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> Millis {
        self.now.get()
    }
}

/// Frame counter with per-frame delta, for host loops
#[derive(Debug, Default)]
pub struct FrameTimer {
    last_frame: Option<Millis>,
    delta_ms: Millis,
    frame_count: u64,
}

impl FrameTimer {
    /// Create a new timer
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a frame at `now`
    pub fn tick(&mut self, now: Millis) {
        self.delta_ms = self.last_frame.map_or(0.0, |last| now - last);
        self.last_frame = Some(now);
        self.frame_count += 1;
    }

    /// Time between the last two frames
    pub fn delta_ms(&self) -> Millis {
        self.delta_ms
    }

    /// Get the current frame count
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::starting_at(100.0);
        clock.advance(16.0);
        assert!((clock.now_ms() - 116.0).abs() < f64::EPSILON);
        clock.set(5.0);
        assert!((clock.now_ms() - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_frame_timer_delta() {
        let mut timer = FrameTimer::new();
        timer.tick(10.0);
        assert!(timer.delta_ms().abs() < f64::EPSILON);
        timer.tick(26.5);
        assert!((timer.delta_ms() - 16.5).abs() < f64::EPSILON);
        assert_eq!(timer.frame_count(), 2);
    }
}
