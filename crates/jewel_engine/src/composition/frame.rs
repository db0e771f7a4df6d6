//! Per-frame output of the composition root

use std::sync::Arc;

use super::RenderMode;
use crate::animation::TransitionState;
use crate::core::config::DeviceTier;
use crate::environment::EnvironmentTexture;
use crate::foundation::math::{Quat, Transform, Vec3};
use crate::scene::{Geometry, SceneGraph};

/// Which clone a gem came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GemSource {
    /// Band model
    Base,
    /// Head model
    Head,
}

/// Reveal masking inputs for head gems
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GemReveal {
    /// Lowest world-space Y of the gem
    pub min_y: f32,
    /// World-space height of the gem
    pub height: f32,
    /// Shape reveal progress
    pub anim_progress: f32,
}

/// Everything a gem renderer needs to draw one gem
#[derive(Debug, Clone)]
pub struct GemRenderUnit<'a> {
    /// Stable key, `base-{ring}-{i}` or `head-{shape}-{i}`
    pub key: String,
    /// Originating clone
    pub source: GemSource,
    /// Geometry copy owned by the placement
    pub geometry: &'a Geometry,
    /// World position
    pub position: Vec3,
    /// World orientation
    pub orientation: Quat,
    /// World scale
    pub scale: Vec3,
    /// Shared reflection texture
    pub environment: Arc<EnvironmentTexture>,
    /// Gem opacity
    pub opacity: f32,
    /// Gem type
    pub gem: &'a str,
    /// Shading quality
    pub render_mode: RenderMode,
    /// Device class
    pub device_tier: DeviceTier,
    /// Present for head gems only
    pub reveal: Option<GemReveal>,
}

/// Snapshot of the composed scene for one frame
#[derive(Debug)]
pub struct ComposedFrame<'a> {
    /// Transform of the group holding both clones and all gems
    pub group: Transform,
    /// Whether the metal clones are drawn at all
    pub clones_visible: bool,
    /// Base clone
    pub base: &'a SceneGraph,
    /// Head clone, when the ring model has heads and it has loaded
    pub head: Option<&'a SceneGraph>,
    /// Gem units; empty until the environment map is available
    pub gems: Vec<GemRenderUnit<'a>>,
    /// Animation signals used for this frame
    pub transition: TransitionState,
}

impl ComposedFrame<'_> {
    /// Gem units from the given clone
    pub fn gems_from(&self, source: GemSource) -> impl Iterator<Item = &GemRenderUnit<'_>> {
        self.gems.iter().filter(move |g| g.source == source)
    }
}
