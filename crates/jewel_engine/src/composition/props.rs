//! Inputs of the composition root

use serde::{Deserialize, Serialize};

use crate::core::config::DeviceTier;

/// Gem shading quality requested by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// Cheaper gem shading
    #[default]
    Performance,
    /// Full refraction and dispersion
    Quality,
}

/// Everything the host can change about the displayed ring
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositionProps {
    /// Ring catalogue key
    pub ring_model: String,
    /// Diamond shape key, selects the head model
    pub diamond_shape: String,
    /// Metal palette key
    pub metal: String,
    /// Gem type, passed through to gem units
    pub gem: String,
    /// Gem shading quality
    pub render_mode: RenderMode,
    /// Device class
    pub device_tier: DeviceTier,
}

impl Default for CompositionProps {
    fn default() -> Self {
        Self {
            ring_model: "ring".to_string(),
            diamond_shape: "round".to_string(),
            metal: "white-gold".to_string(),
            gem: "diamond".to_string(),
            render_mode: RenderMode::default(),
            device_tier: DeviceTier::default(),
        }
    }
}

impl CompositionProps {
    /// Builder: ring model
    pub fn with_ring_model(mut self, ring_model: impl Into<String>) -> Self {
        self.ring_model = ring_model.into();
        self
    }

    /// Builder: diamond shape
    pub fn with_diamond_shape(mut self, shape: impl Into<String>) -> Self {
        self.diamond_shape = shape.into();
        self
    }

    /// Builder: metal
    pub fn with_metal(mut self, metal: impl Into<String>) -> Self {
        self.metal = metal.into();
        self
    }

    /// Builder: gem type
    pub fn with_gem(mut self, gem: impl Into<String>) -> Self {
        self.gem = gem.into();
        self
    }

    /// Builder: render mode
    pub fn with_render_mode(mut self, render_mode: RenderMode) -> Self {
        self.render_mode = render_mode;
        self
    }

    /// Builder: device tier
    pub fn with_device_tier(mut self, device_tier: DeviceTier) -> Self {
        self.device_tier = device_tier;
        self
    }
}
