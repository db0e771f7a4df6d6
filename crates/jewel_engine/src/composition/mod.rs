//! # Composition Root
//!
//! Ties the pipeline together for one mounted ring:
//!
//! ```text
//! RingConfigSource ──► URLs ──► AssetCache ──► SceneClone (deep clone,
//!                                               recolor, extract gems)
//! TextureLoader ──► EnvironmentMapLoader ─────┐        │
//! TransitionAnimator ─────────────────────────┴──► ComposedFrame
//! ```
//!
//! The composer owns every clone it builds and releases them through the
//! host's [`ResourceDisposer`](crate::core::host::ResourceDisposer), never
//! touching the shared assets in the cache.

mod composer;
mod frame;
mod lifecycle;
mod props;
mod readiness;
mod scene_clone;

#[cfg(test)]
mod tests;

pub use composer::RingComposer;
pub use frame::{ComposedFrame, GemReveal, GemRenderUnit, GemSource};
pub use lifecycle::{dispose_material, dispose_placements, dispose_scene};
pub use props::{CompositionProps, RenderMode};
pub use readiness::{ReadinessGate, ReadinessInputs};
pub use scene_clone::SceneClone;
