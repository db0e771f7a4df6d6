//! Asset collaborators
//!
//! The engine does not fetch or parse model files itself. It pulls scene
//! graphs from an [`AssetCache`], ring catalogues from a [`RingConfigSource`]
//! and environment images from a [`TextureLoader`]; each has an in-memory or
//! threaded implementation here.

mod cache;
mod ring_config;
mod texture_loader;

use thiserror::Error;

pub use cache::{AssetCache, AssetHandle, MemoryAssetCache};
pub use ring_config::{RingConfig, RingConfigData, RingConfigSource, StaticRingConfigSource};
pub use texture_loader::{
    ScriptedTextureLoader, TextureData, TextureLoadError, TextureLoader, TextureReply, ThreadedTextureLoader,
};

/// Asset lookup errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AssetError {
    /// No asset is registered under the URL
    #[error("Asset not found: {0}")]
    NotFound(String),
    /// The asset exists but could not be produced
    #[error("Asset load failed for {url}: {reason}")]
    LoadFailed {
        /// Requested URL
        url: String,
        /// Loader message
        reason: String,
    },
    /// The loaded data is unusable
    #[error("Invalid asset data: {0}")]
    InvalidData(String),
}
