//! Environment map for gem reflections
//!
//! One equirectangular image is loaded per mount and shared by every gem
//! unit. On constrained devices the load waits for host idle time so it does
//! not compete with the first paint.

mod env_map;

pub use env_map::{
    ColorSpace, EnvironmentMapLoader, EnvironmentTexture, FilterMode, SamplingSettings, TextureConfigError,
    TextureMapping,
};
