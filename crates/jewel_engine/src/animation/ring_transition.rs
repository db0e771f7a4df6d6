//! Ring-model transition phases

use super::ease_in_out_cubic;
use crate::core::config::RingTransitionTiming;
use crate::foundation::math::constants::HALF_PI;
use crate::foundation::math::utils::lerp;
use crate::foundation::time::Millis;

/// Group scale while the model is hidden
pub const HOLD_SCALE: f32 = 0.8;

/// Group yaw while the model is hidden
pub const HOLD_ROTATION: f32 = HALF_PI;

/// Phase of a ring-model transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RingPhase {
    /// No transition running
    #[default]
    Idle,
    /// Old model fading out, shrinking and turning away
    FadeOut,
    /// Model invisible; the swap happens here
    Hold,
    /// New model fading in
    FadeIn,
    /// Run finished, state snapped to steady
    Done,
}

/// Ring signals at one instant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingPose {
    /// Reveal progress in `[0, 1]`
    pub reveal: f32,
    /// Uniform group scale
    pub scale: f32,
    /// Group yaw in radians
    pub rotation: f32,
}

impl RingPose {
    /// Fully shown, unscaled, unrotated
    pub const STEADY: Self = Self {
        reveal: 1.0,
        scale: 1.0,
        rotation: 0.0,
    };

    const HIDDEN: Self = Self {
        reveal: 0.0,
        scale: HOLD_SCALE,
        rotation: HOLD_ROTATION,
    };

    /// Interpolate from steady (`t = 0`) to hidden (`t = 1`)
    fn hiding(t: f32) -> Self {
        Self {
            reveal: lerp(Self::STEADY.reveal, Self::HIDDEN.reveal, t),
            scale: lerp(Self::STEADY.scale, Self::HIDDEN.scale, t),
            rotation: lerp(Self::STEADY.rotation, Self::HIDDEN.rotation, t),
        }
    }
}

/// Phase and pose `elapsed` ms after the trigger
#[allow(clippy::cast_possible_truncation)]
pub fn ring_pose_at(elapsed: Millis, timing: &RingTransitionTiming) -> (RingPhase, RingPose) {
    let fade_in_start = timing.fade_out_ms + timing.hold_ms;
    if elapsed >= timing.total_ms() {
        (RingPhase::Done, RingPose::STEADY)
    } else if elapsed < timing.fade_out_ms {
        let eased = ease_in_out_cubic((elapsed.max(0.0) / timing.fade_out_ms) as f32);
        (RingPhase::FadeOut, RingPose::hiding(eased))
    } else if elapsed < fade_in_start {
        (RingPhase::Hold, RingPose::HIDDEN)
    } else {
        let eased = ease_in_out_cubic(((elapsed - fade_in_start) / timing.fade_in_ms) as f32);
        (RingPhase::FadeIn, RingPose::hiding(1.0 - eased))
    }
}
