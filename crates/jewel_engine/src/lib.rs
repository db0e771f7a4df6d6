//! # Jewel Engine
//!
//! Asset composition and transition animation core for an interactive 3D
//! ring configurator. The engine does not render. It prepares what a
//! renderer draws and tells it which GPU resources to release.
//!
//! ## Features
//!
//! - **Scene Graph**: Arena-backed hierarchy with deep cloning and
//!   world-space bounds
//! - **Gem Extraction**: Gem meshes become world-space placements for a
//!   dedicated gem renderer
//! - **Metal Recolor**: In-place color updates that keep material identity
//! - **Environment Map**: Deferred, cancellable reflection texture loading
//! - **Transitions**: Phase-based ring-model and diamond-shape animations
//!   with per-device-tier timing
//! - **Composition**: One root that wires it all together and guarantees
//!   teardown
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use jewel_engine::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfiguratorConfig::load_or_default("configurator.toml")?;
//!     let catalogue = RingConfigData::load_or_default("rings.toml")?;
//!     let clock = SystemClock::new();
//!     let mut host = ResourceTracker::new();
//!
//!     let mut composer = RingComposer::new(
//!         config,
//!         CompositionProps::default(),
//!         MemoryAssetCache::new(),
//!         StaticRingConfigSource::new(catalogue),
//!         ThreadedTextureLoader::new("public"),
//!         clock.now_ms(),
//!     )?;
//!
//!     composer.update(clock.now_ms(), &mut host);
//!     if let Some(frame) = composer.frame() {
//!         println!("{} gems", frame.gems.len());
//!     }
//!     composer.unmount(&mut host);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Core engine modules
pub mod core;

pub mod foundation;
pub mod config;
pub mod materials;
pub mod scene;
pub mod assets;
pub mod environment;
pub mod animation;
pub mod composition;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        animation::{TransitionAnimator, TransitionState},
        assets::{
            AssetCache, AssetHandle, MemoryAssetCache, RingConfig, RingConfigData, RingConfigSource,
            StaticRingConfigSource, TextureLoader, ThreadedTextureLoader,
        },
        composition::{ComposedFrame, CompositionProps, GemRenderUnit, RenderMode, RingComposer},
        config::{Config, ConfigError},
        core::{
            config::{ConfiguratorConfig, DeviceTier, DeviceTierProfile, GemNamingRule},
            host::{RenderHost, ResourceDisposer, ResourceTracker},
        },
        environment::EnvironmentTexture,
        foundation::{
            math::{Mat4, Quat, Transform, Vec3},
            time::{Clock, ManualClock, Millis, SystemClock},
        },
        materials::{Color, Material, MaterialKind},
        scene::{Geometry, Mesh, SceneGraph, SceneNode},
    };
}
