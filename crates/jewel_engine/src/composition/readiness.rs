//! One-shot readiness signal

use crate::foundation::collections::{SceneId, TextureId};
use crate::foundation::time::Millis;

/// What the readiness decision depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessInputs {
    /// Live base clone
    pub base: Option<SceneId>,
    /// Live head clone
    pub head: Option<SceneId>,
    /// Installed environment texture
    pub environment: Option<TextureId>,
    /// Whether the ring model uses head assets
    pub has_heads: bool,
}

impl ReadinessInputs {
    /// Base present, plus head and environment map when the ring has heads
    pub fn is_complete(&self) -> bool {
        self.base.is_some() && (!self.has_heads || (self.head.is_some() && self.environment.is_some()))
    }
}

/// Fires once after the inputs have been complete and unchanged for the
/// settle delay
///
/// Any change of the inputs restarts the delay. After firing, the gate stays
/// quiet until [`rearm`](Self::rearm).
#[derive(Debug, Clone)]
pub struct ReadinessGate {
    settle_delay_ms: Millis,
    armed: bool,
    timer: Option<(ReadinessInputs, Millis)>,
}

impl ReadinessGate {
    /// Create an armed gate
    pub fn new(settle_delay_ms: Millis) -> Self {
        Self {
            settle_delay_ms,
            armed: true,
            timer: None,
        }
    }

    /// Whether the gate can still fire
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Allow the gate to fire again
    pub fn rearm(&mut self) {
        self.armed = true;
        self.timer = None;
    }

    /// Feed the current inputs; returns true exactly when the signal fires
    pub fn update(&mut self, inputs: ReadinessInputs, now: Millis) -> bool {
        if !self.armed {
            return false;
        }
        if !inputs.is_complete() {
            self.timer = None;
            return false;
        }
        let started = match self.timer {
            Some((seen, started)) if seen == inputs => started,
            _ => {
                self.timer = Some((inputs, now));
                now
            }
        };
        if now - started >= self.settle_delay_ms {
            self.armed = false;
            self.timer = None;
            true
        } else {
            false
        }
    }
}
