//! # Transition Animation
//!
//! Time-driven animation of configuration changes. Two channels run
//! independently:
//!
//! - **Ring model**: fade out, hold while the model is swapped, fade in.
//!   Drives reveal progress, group scale and group yaw.
//! - **Diamond shape**: single reveal from 0 to 1.
//!
//! Everything is a pure function of wall-clock timestamps supplied by the
//! caller, so a [`ManualClock`](crate::foundation::time::ManualClock) can
//! drive the animator in tests.

mod animator;
mod easing;
mod frame_gate;
mod ring_transition;

pub use animator::{TransitionAnimator, TransitionState};
pub use easing::ease_in_out_cubic;
pub use frame_gate::FrameGate;
pub use ring_transition::{ring_pose_at, RingPhase, RingPose, HOLD_ROTATION, HOLD_SCALE};
