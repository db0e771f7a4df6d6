//! # Core Module
//!
//! Shared abstractions used throughout the engine.
//!
//! ## Organization
//!
//! - **Config**: Unified configuration for every subsystem, including the
//!   per-device-tier timing profiles
//! - **Host**: Traits the rendering host implements so the engine can release
//!   GPU resources, ask for idle time and signal readiness

pub mod config;
pub mod host;

// Re-export foundation modules for convenience
pub use crate::foundation;

// Re-export commonly used config types
pub use config::{
    AssetDefaults,
    ConfiguratorConfig,
    DeviceTier,
    DeviceTierProfile,
    EngineConfig,
    GemNamingRule,
    GroupPlacement,
    MetalConfig,
    ReadinessConfig,
    RingTransitionTiming,
    TierProfiles,
};
pub use crate::config::{Config, ConfigError};
pub use host::{IdleScheduler, RenderHost, ResourceDisposer, ResourceTracker, TextureCapabilities};
