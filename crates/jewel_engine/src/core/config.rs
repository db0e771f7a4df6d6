//! # Unified Configuration System
//!
//! Consolidates every tunable of the configurator core into one serializable
//! tree. Defaults reproduce the shipped behavior, so an empty config file is a
//! valid config.
//!
//! ## Configuration Categories
//!
//! - **Engine Config**: logging and debug features
//! - **Tier Profiles**: animation timing, update throttling, environment-map
//!   deferral and group placement for constrained and full devices
//! - **Asset Defaults**: fallback URLs and catalogue keys
//! - **Metal Config**: metal palette and fixed PBR parameters
//! - **Gem Naming**: which mesh names are gems
//! - **Readiness**: settle delay before the host is told the model is ready

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::{Config, ConfigError};
use crate::foundation::math::Vec3;
use crate::foundation::time::Millis;
use crate::materials::{Color, PbrParams};

/// Coarse device classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceTier {
    /// Small or low-power device: shorter animations, throttled updates,
    /// deferred environment map
    Constrained,
    /// Desktop-class device
    #[default]
    Full,
}

/// Phase durations of the ring-model transition
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RingTransitionTiming {
    /// Fade-out phase length
    pub fade_out_ms: Millis,
    /// Hold phase length (model is swapped while invisible)
    pub hold_ms: Millis,
    /// Fade-in phase length
    pub fade_in_ms: Millis,
    /// Run length; the state snaps to steady once it elapses, even if the
    /// fade-in has not finished
    pub duration_ms: Millis,
}

impl RingTransitionTiming {
    /// Total transition length
    pub fn total_ms(&self) -> Millis {
        self.duration_ms
    }

    /// Sum of the three phases
    pub fn phases_ms(&self) -> Millis {
        self.fade_out_ms + self.hold_ms + self.fade_in_ms
    }
}

/// Where the composed group sits in the host scene
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroupPlacement {
    /// Group position
    pub position: Vec3,
    /// Uniform group scale
    pub scale: f32,
}

/// Everything that differs between device tiers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeviceTierProfile {
    /// Minimum spacing between applied animation updates
    pub frame_interval_ms: Millis,
    /// Whether animation updates are rate limited to `frame_interval_ms`
    pub throttle_updates: bool,
    /// Ring-model transition phases
    pub ring_transition: RingTransitionTiming,
    /// Diamond-shape reveal length
    pub shape_transition_ms: Millis,
    /// Wait for host idle time before loading the environment map
    pub defer_environment_map: bool,
    /// Upper bound on the idle wait
    pub idle_timeout_ms: Millis,
    /// Group placement in the host scene
    pub group_placement: GroupPlacement,
}

impl DeviceTierProfile {
    /// Desktop-class defaults
    pub fn full() -> Self {
        Self {
            frame_interval_ms: 16.0,
            throttle_updates: false,
            ring_transition: RingTransitionTiming {
                fade_out_ms: 400.0,
                hold_ms: 150.0,
                fade_in_ms: 600.0,
                duration_ms: 1050.0,
            },
            shape_transition_ms: 600.0,
            defer_environment_map: false,
            idle_timeout_ms: 2000.0,
            group_placement: GroupPlacement {
                position: Vec3::new(0.1, -0.29, -0.3),
                scale: 0.10,
            },
        }
    }

    /// Constrained-device defaults
    pub fn constrained() -> Self {
        Self {
            frame_interval_ms: 33.0,
            throttle_updates: true,
            ring_transition: RingTransitionTiming {
                fade_out_ms: 250.0,
                hold_ms: 150.0,
                fade_in_ms: 400.0,
                duration_ms: 700.0,
            },
            shape_transition_ms: 400.0,
            defer_environment_map: true,
            idle_timeout_ms: 2000.0,
            group_placement: GroupPlacement {
                position: Vec3::new(0.1, 0.50, -0.3),
                scale: 0.075,
            },
        }
    }

    /// Validate the profile
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.ring_transition;
        if t.fade_out_ms <= 0.0 || t.fade_in_ms <= 0.0 || t.hold_ms < 0.0 {
            return Err(ConfigError::Invalid("ring transition phases must be positive".to_string()));
        }
        if t.duration_ms < t.fade_out_ms + t.hold_ms || t.duration_ms > t.phases_ms() {
            return Err(ConfigError::Invalid(
                "ring transition duration must end inside the fade-in phase".to_string(),
            ));
        }
        if self.shape_transition_ms <= 0.0 {
            return Err(ConfigError::Invalid("shape transition must be positive".to_string()));
        }
        if self.throttle_updates && self.frame_interval_ms <= 0.0 {
            return Err(ConfigError::Invalid("throttled frame interval must be positive".to_string()));
        }
        if self.group_placement.scale <= 0.0 {
            return Err(ConfigError::Invalid("group scale must be positive".to_string()));
        }
        Ok(())
    }
}

/// Profiles for both tiers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierProfiles {
    /// Constrained-device profile
    pub constrained: DeviceTierProfile,
    /// Full-device profile
    pub full: DeviceTierProfile,
}

impl Default for TierProfiles {
    fn default() -> Self {
        Self {
            constrained: DeviceTierProfile::constrained(),
            full: DeviceTierProfile::full(),
        }
    }
}

impl TierProfiles {
    /// Profile for a tier
    pub fn for_tier(&self, tier: DeviceTier) -> &DeviceTierProfile {
        match tier {
            DeviceTier::Constrained => &self.constrained,
            DeviceTier::Full => &self.full,
        }
    }
}

/// # Engine Configuration
///
/// Logging and debug behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Default log filter (overridden by `RUST_LOG`)
    pub log_level: String,
    /// Whether to enable debug features
    pub debug_mode: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            debug_mode: cfg!(debug_assertions),
        }
    }
}

impl EngineConfig {
    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }
}

/// # Asset Defaults
///
/// URLs and catalogue keys used when the ring catalogue is missing or does
/// not name what was asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetDefaults {
    /// Base ring used before the catalogue resolves
    pub base_ring_url: String,
    /// Environment map used before the catalogue resolves
    pub environment_map_url: String,
    /// Ring model used when the requested one is not in the catalogue
    pub fallback_ring_model: String,
    /// Head used when the requested shape has no head asset
    pub fallback_head_shape: String,
}

impl Default for AssetDefaults {
    fn default() -> Self {
        Self {
            base_ring_url: "/assets/models/ring/earmetal.glb".to_string(),
            environment_map_url: "/assets/diamond/gem.exr".to_string(),
            fallback_ring_model: "ring".to_string(),
            fallback_head_shape: "round".to_string(),
        }
    }
}

/// # Metal Configuration
///
/// Named metal colors and the fixed PBR parameters applied to metal meshes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetalConfig {
    /// Metal name → `#RRGGBB`
    pub palette: BTreeMap<String, String>,
    /// Color for names missing from the palette
    pub default_color: String,
    /// Parameters of newly created metal materials
    pub pbr: PbrParams,
}

impl Default for MetalConfig {
    fn default() -> Self {
        let palette = [
            ("yellow-gold", "#E5C07B"),
            ("white-gold", "#E8E8E8"),
            ("rose-gold", "#E0A899"),
            ("platinum", "#E5E4E2"),
            ("silver", "#C0C0C0"),
        ]
        .into_iter()
        .map(|(name, hex)| (name.to_string(), hex.to_string()))
        .collect();

        Self {
            palette,
            default_color: "#D9D9D9".to_string(),
            pbr: PbrParams::default(),
        }
    }
}

impl MetalConfig {
    /// Color for a metal name, falling back to the default color
    pub fn color_for(&self, metal: &str) -> Color {
        self.palette
            .get(metal)
            .and_then(|hex| Color::from_hex(hex).ok())
            .or_else(|| Color::from_hex(&self.default_color).ok())
            .unwrap_or(Color::WHITE)
    }

    /// Validate every palette entry
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, hex) in &self.palette {
            Color::from_hex(hex).map_err(|e| ConfigError::Invalid(format!("metal '{name}': {e}")))?;
        }
        Color::from_hex(&self.default_color).map_err(|e| ConfigError::Invalid(format!("default metal: {e}")))?;
        Ok(())
    }
}

/// # Gem Naming Convention
///
/// A mesh is a gem when its name contains any of the patterns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GemNamingRule {
    /// Substrings that mark a gem mesh
    pub patterns: Vec<String>,
    /// Whether matching is case sensitive
    pub case_sensitive: bool,
}

impl Default for GemNamingRule {
    fn default() -> Self {
        Self {
            patterns: vec!["diamond".to_string(), "gem".to_string()],
            case_sensitive: false,
        }
    }
}

impl GemNamingRule {
    /// Whether a mesh name denotes a gem
    pub fn matches(&self, name: &str) -> bool {
        if self.case_sensitive {
            self.patterns.iter().any(|p| name.contains(p.as_str()))
        } else {
            let lower = name.to_lowercase();
            self.patterns.iter().any(|p| lower.contains(&p.to_lowercase()))
        }
    }
}

/// # Readiness Configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadinessConfig {
    /// Pause between "everything present" and the readiness signal
    pub settle_delay_ms: Millis,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self { settle_delay_ms: 300.0 }
    }
}

/// # Complete Configurator Configuration
///
/// Top-level configuration that encompasses all subsystems.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ConfiguratorConfig {
    /// Engine core configuration
    pub engine: EngineConfig,
    /// Per-tier timing and placement
    pub tiers: TierProfiles,
    /// Fallback asset locations
    pub assets: AssetDefaults,
    /// Metal palette and material parameters
    pub metals: MetalConfig,
    /// Gem naming convention
    pub gems: GemNamingRule,
    /// Readiness signaling
    pub readiness: ReadinessConfig,
}

impl ConfiguratorConfig {
    /// Builder: replace the tier profiles
    pub fn with_tiers(mut self, tiers: TierProfiles) -> Self {
        self.tiers = tiers;
        self
    }

    /// Builder: replace the gem naming rule
    pub fn with_gem_rule(mut self, gems: GemNamingRule) -> Self {
        self.gems = gems;
        self
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tiers.constrained.validate()?;
        self.tiers.full.validate()?;
        self.metals.validate()?;
        if self.gems.patterns.iter().all(String::is_empty) {
            return Err(ConfigError::Invalid("gem naming rule needs at least one pattern".to_string()));
        }
        if self.readiness.settle_delay_ms < 0.0 {
            return Err(ConfigError::Invalid("settle delay cannot be negative".to_string()));
        }
        Ok(())
    }
}

impl Config for ConfiguratorConfig {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigFormat;

    #[test]
    fn test_defaults_are_valid() {
        ConfiguratorConfig::default().validate().unwrap();
    }

    #[test]
    fn test_tier_defaults() {
        let tiers = TierProfiles::default();
        assert!((tiers.for_tier(DeviceTier::Full).ring_transition.total_ms() - 1050.0).abs() < f64::EPSILON);
        assert!((tiers.for_tier(DeviceTier::Constrained).ring_transition.total_ms() - 700.0).abs() < f64::EPSILON);
        assert!(tiers.constrained.throttle_updates);
        assert!(!tiers.full.throttle_updates);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let text = r#"
            [gems]
            patterns = ["stone"]

            [readiness]
            settle_delay_ms = 120.0
        "#;
        let config = ConfiguratorConfig::from_str_with_format(text, ConfigFormat::Toml).unwrap();

        assert!(config.gems.matches("Center_Stone"));
        assert!(!config.gems.matches("Diamond_01"));
        assert!((config.readiness.settle_delay_ms - 120.0).abs() < f64::EPSILON);
        assert_eq!(config.assets, AssetDefaults::default());
    }

    #[test]
    fn test_metal_color_fallback() {
        let metals = MetalConfig::default();
        assert_eq!(metals.color_for("rose-gold"), Color::from_hex("#E0A899").unwrap());
        assert_eq!(metals.color_for("unobtainium"), Color::from_hex("#D9D9D9").unwrap());
    }

    #[test]
    fn test_gem_rule_case_insensitive() {
        let rule = GemNamingRule::default();
        assert!(rule.matches("DIAMOND_center"));
        assert!(rule.matches("side_gem.002"));
        assert!(!rule.matches("band"));
    }

    #[test]
    fn test_invalid_palette_rejected() {
        let mut config = ConfiguratorConfig::default();
        config.metals.palette.insert("broken".into(), "#12".into());
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
