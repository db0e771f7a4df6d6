//! Transition animator

use super::{ease_in_out_cubic, ring_pose_at, FrameGate, RingPhase, RingPose};
use crate::core::config::DeviceTierProfile;
use crate::foundation::time::Millis;

/// Time-varying signals read by the composition root every frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionState {
    /// Diamond-shape reveal in `[0, 1]`
    pub anim_progress: f32,
    /// Ring-model cross-fade in `[0, 1]`
    pub ring_transition_progress: f32,
    /// Uniform scale applied to the composed group
    pub ring_scale: f32,
    /// Yaw applied to the composed group, radians
    pub ring_rotation: f32,
}

impl TransitionState {
    /// Nothing in flight
    pub const STEADY: Self = Self {
        anim_progress: 1.0,
        ring_transition_progress: 1.0,
        ring_scale: 1.0,
        ring_rotation: 0.0,
    };

    fn set_ring_pose(&mut self, pose: RingPose) {
        self.ring_transition_progress = pose.reveal;
        self.ring_scale = pose.scale;
        self.ring_rotation = pose.rotation;
    }
}

impl Default for TransitionState {
    fn default() -> Self {
        Self::STEADY
    }
}

#[derive(Debug, Clone, Copy)]
struct Run {
    started_at: Millis,
    gate: FrameGate,
}

impl Run {
    fn start(now: Millis, profile: &DeviceTierProfile) -> Self {
        Self {
            started_at: now,
            gate: FrameGate::new(profile.frame_interval_ms, profile.throttle_updates),
        }
    }
}

/// Drives the ring-model and diamond-shape channels
///
/// Inputs are recorded with [`set_ring_model`](Self::set_ring_model) and
/// [`set_diamond_shape`](Self::set_diamond_shape); the host calls
/// [`tick`](Self::tick) on every display refresh while
/// [`wants_frame`](Self::wants_frame) is true.
#[derive(Debug, Clone)]
pub struct TransitionAnimator {
    profile: DeviceTierProfile,
    ring_model: Option<String>,
    diamond_shape: Option<String>,
    ring_run: Option<Run>,
    shape_run: Option<Run>,
    ring_phase: RingPhase,
    state: TransitionState,
}

impl TransitionAnimator {
    /// Create an animator in steady state
    pub fn new(profile: DeviceTierProfile) -> Self {
        Self {
            profile,
            ring_model: None,
            diamond_shape: None,
            ring_run: None,
            shape_run: None,
            ring_phase: RingPhase::Idle,
            state: TransitionState::STEADY,
        }
    }

    /// Current signals
    pub fn state(&self) -> TransitionState {
        self.state
    }

    /// Phase of the ring-model channel as of the last tick
    pub fn ring_phase(&self) -> RingPhase {
        self.ring_phase
    }

    /// Active timing profile
    pub fn profile(&self) -> &DeviceTierProfile {
        &self.profile
    }

    /// Whether any channel still needs frames
    pub fn wants_frame(&self) -> bool {
        self.ring_run.is_some() || self.shape_run.is_some()
    }

    /// Record the ring model; a change after the first value starts a
    /// transition, replacing any run in flight
    ///
    /// Returns whether a transition started.
    pub fn set_ring_model(&mut self, model: &str, now: Millis) -> bool {
        match self.ring_model.as_deref() {
            Some(prev) if prev == model => false,
            Some(prev) => {
                log::debug!("Ring transition {prev} -> {model} at {now:.0} ms");
                self.ring_model = Some(model.to_string());
                self.ring_run = Some(Run::start(now, &self.profile));
                self.ring_phase = RingPhase::FadeOut;
                true
            }
            None => {
                self.ring_model = Some(model.to_string());
                self.state.set_ring_pose(RingPose::STEADY);
                false
            }
        }
    }

    /// Record the diamond shape; a change restarts the reveal from zero
    ///
    /// Setting the current shape again does nothing. Returns whether a reveal
    /// started.
    pub fn set_diamond_shape(&mut self, shape: &str, now: Millis) -> bool {
        match self.diamond_shape.as_deref() {
            Some(prev) if prev == shape => false,
            Some(prev) => {
                log::debug!("Shape reveal {prev} -> {shape} at {now:.0} ms");
                self.diamond_shape = Some(shape.to_string());
                self.state.anim_progress = 0.0;
                self.shape_run = Some(Run::start(now, &self.profile));
                true
            }
            None => {
                self.diamond_shape = Some(shape.to_string());
                false
            }
        }
    }

    /// Switch timing profile; any transition in flight snaps to steady state
    pub fn set_profile(&mut self, profile: DeviceTierProfile) {
        self.cancel_all();
        self.profile = profile;
    }

    /// Stop both channels and return to steady state
    pub fn cancel_all(&mut self) {
        self.ring_run = None;
        self.shape_run = None;
        self.ring_phase = RingPhase::Idle;
        self.state = TransitionState::STEADY;
    }

    /// Advance both channels to `now`
    ///
    /// Returns whether any signal was updated.
    pub fn tick(&mut self, now: Millis) -> bool {
        self.tick_ring(now) | self.tick_shape(now)
    }

    fn tick_ring(&mut self, now: Millis) -> bool {
        let Some(run) = self.ring_run.as_mut() else {
            return false;
        };
        let (phase, pose) = ring_pose_at(now - run.started_at, &self.profile.ring_transition);
        self.ring_phase = phase;
        if phase == RingPhase::Done {
            self.ring_run = None;
            self.state.set_ring_pose(RingPose::STEADY);
            log::debug!("Ring transition complete at {now:.0} ms");
            true
        } else if run.gate.should_apply(now) {
            self.state.set_ring_pose(pose);
            true
        } else {
            false
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn tick_shape(&mut self, now: Millis) -> bool {
        let Some(run) = self.shape_run.as_mut() else {
            return false;
        };
        let elapsed = now - run.started_at;
        let duration = self.profile.shape_transition_ms;
        if elapsed >= duration {
            self.shape_run = None;
            self.state.anim_progress = 1.0;
            true
        } else if run.gate.should_apply(now) {
            self.state.anim_progress = ease_in_out_cubic((elapsed.max(0.0) / duration) as f32);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::constants::HALF_PI;
    use crate::foundation::time::{Clock, ManualClock};
    use approx::assert_relative_eq;

    fn mounted(profile: DeviceTierProfile) -> TransitionAnimator {
        let mut animator = TransitionAnimator::new(profile);
        assert!(!animator.set_ring_model("classic", 0.0));
        assert!(!animator.set_diamond_shape("round", 0.0));
        animator
    }

    #[test]
    fn test_first_values_do_not_animate() {
        let animator = mounted(DeviceTierProfile::full());
        assert_eq!(animator.state(), TransitionState::STEADY);
        assert!(!animator.wants_frame());
    }

    #[test]
    fn test_ring_transition_samples() {
        let clock = ManualClock::new();
        let mut animator = mounted(DeviceTierProfile::full());
        assert!(animator.set_ring_model("halo", clock.now_ms()));
        assert_relative_eq!(animator.state().ring_transition_progress, 1.0);

        clock.set(200.0);
        animator.tick(clock.now_ms());
        let at_200 = animator.state().ring_transition_progress;
        assert!(at_200 > 0.0 && at_200 < 1.0);

        clock.set(500.0);
        animator.tick(clock.now_ms());
        assert_eq!(animator.ring_phase(), RingPhase::Hold);
        assert_relative_eq!(animator.state().ring_transition_progress, 0.0);
        assert_relative_eq!(animator.state().ring_scale, 0.8);
        assert_relative_eq!(animator.state().ring_rotation, HALF_PI);

        clock.set(1050.0);
        animator.tick(clock.now_ms());
        assert_eq!(animator.state(), TransitionState::STEADY);
        assert!(!animator.wants_frame());
    }

    #[test]
    fn test_ring_retrigger_restarts_from_new_trigger() {
        let mut animator = mounted(DeviceTierProfile::full());
        animator.set_ring_model("halo", 0.0);
        animator.tick(450.0);
        assert_eq!(animator.ring_phase(), RingPhase::Hold);

        assert!(animator.set_ring_model("pave", 450.0));
        animator.tick(650.0);
        assert_eq!(animator.ring_phase(), RingPhase::FadeOut);
        assert_relative_eq!(animator.state().ring_transition_progress, 0.5);
    }

    #[test]
    fn test_shape_retrigger_restarts_reveal_from_zero() {
        let mut animator = mounted(DeviceTierProfile::full());
        animator.set_diamond_shape("oval", 0.0);
        animator.tick(300.0);
        assert_relative_eq!(animator.state().anim_progress, 0.5);

        assert!(animator.set_diamond_shape("pear", 300.0));
        assert_relative_eq!(animator.state().anim_progress, 0.0);

        animator.tick(600.0);
        assert_relative_eq!(animator.state().anim_progress, 0.5);
        assert!(animator.wants_frame());

        animator.tick(899.0);
        assert!(animator.state().anim_progress < 1.0);
        animator.tick(900.0);
        assert_relative_eq!(animator.state().anim_progress, 1.0);
        assert!(!animator.wants_frame());
    }

    #[test]
    fn test_same_ring_model_is_ignored() {
        let mut animator = mounted(DeviceTierProfile::full());
        assert!(!animator.set_ring_model("classic", 10.0));
        assert!(!animator.wants_frame());
    }

    #[test]
    fn test_shape_reveal_runs_zero_to_one() {
        let mut animator = mounted(DeviceTierProfile::full());
        assert!(animator.set_diamond_shape("oval", 0.0));
        assert_relative_eq!(animator.state().anim_progress, 0.0);

        animator.tick(300.0);
        assert_relative_eq!(animator.state().anim_progress, 0.5);

        animator.tick(600.0);
        assert_relative_eq!(animator.state().anim_progress, 1.0);
        assert!(!animator.wants_frame());
    }

    #[test]
    fn test_same_shape_does_not_restart() {
        let mut animator = mounted(DeviceTierProfile::full());
        animator.set_diamond_shape("oval", 0.0);
        animator.tick(150.0);
        let before = animator.state().anim_progress;

        assert!(!animator.set_diamond_shape("oval", 150.0));
        assert_relative_eq!(animator.state().anim_progress, before);

        animator.tick(600.0);
        assert_relative_eq!(animator.state().anim_progress, 1.0);
    }

    #[test]
    fn test_same_shape_when_idle_schedules_nothing() {
        let mut animator = mounted(DeviceTierProfile::full());
        assert!(!animator.set_diamond_shape("round", 5.0));
        assert!(!animator.wants_frame());
        assert_relative_eq!(animator.state().anim_progress, 1.0);
    }

    #[test]
    fn test_constrained_updates_are_throttled() {
        let mut animator = mounted(DeviceTierProfile::constrained());
        animator.set_diamond_shape("pear", 0.0);

        let applied: Vec<Millis> = (0..=25)
            .map(|i| f64::from(i) * 16.0)
            .filter(|&t| animator.tick(t))
            .collect();

        assert_eq!(&applied[..4], [0.0, 48.0, 96.0, 144.0]);
        assert_eq!(applied.last().copied(), Some(400.0));
        assert_relative_eq!(animator.state().anim_progress, 1.0);
    }

    #[test]
    fn test_profile_switch_snaps_to_steady() {
        let mut animator = mounted(DeviceTierProfile::full());
        animator.set_ring_model("halo", 0.0);
        animator.set_diamond_shape("oval", 0.0);
        animator.tick(200.0);

        animator.set_profile(DeviceTierProfile::constrained());

        assert_eq!(animator.state(), TransitionState::STEADY);
        assert!(!animator.wants_frame());
        assert!((animator.profile().frame_interval_ms - 33.0).abs() < f64::EPSILON);
    }
}
