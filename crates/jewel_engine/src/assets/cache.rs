//! Read-through scene asset cache

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::AssetError;
use crate::foundation::collections::SceneId;
use crate::scene::SceneGraph;

/// Shared, immutable reference to a loaded scene graph
///
/// The engine never mutates the graph behind a handle; it deep-clones it.
#[derive(Debug, Clone)]
pub struct AssetHandle {
    url: Arc<str>,
    scene: Arc<SceneGraph>,
}

impl AssetHandle {
    /// Wrap a loaded graph
    pub fn new(url: impl Into<Arc<str>>, scene: SceneGraph) -> Self {
        Self {
            url: url.into(),
            scene: Arc::new(scene),
        }
    }

    /// Identity of the underlying graph
    pub fn id(&self) -> SceneId {
        self.scene.id()
    }

    /// Source URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The loaded graph
    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }
}

/// Scene asset loading, cached by URL
pub trait AssetCache {
    /// Loaded asset for `url`, `None` while pending or after a failure
    ///
    /// Repeated calls for the same URL must not re-fetch.
    fn load(&mut self, url: &str) -> Option<AssetHandle>;

    /// Like [`AssetCache::load`], but does nothing until `ready` is true
    fn load_if(&mut self, url: &str, ready: bool) -> Option<AssetHandle> {
        if ready {
            self.load(url)
        } else {
            None
        }
    }

    /// Warm the cache without using the result
    fn preload(&mut self, url: &str) {
        let _ = self.load(url);
    }
}

/// In-memory cache seeded with pre-built graphs
#[derive(Debug, Default)]
pub struct MemoryAssetCache {
    entries: HashMap<String, AssetHandle>,
    loads: HashMap<String, usize>,
    missing_logged: HashSet<String>,
}

impl MemoryAssetCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a graph available under `url`
    pub fn register(&mut self, url: impl Into<String>, scene: SceneGraph) -> AssetHandle {
        let url = url.into();
        let handle = AssetHandle::new(url.as_str(), scene);
        self.entries.insert(url, handle.clone());
        handle
    }

    /// Remove a graph, simulating a failed or evicted load
    pub fn unregister(&mut self, url: &str) -> Option<AssetHandle> {
        self.entries.remove(url)
    }

    /// Fallible lookup
    pub fn get(&self, url: &str) -> Result<&AssetHandle, AssetError> {
        self.entries.get(url).ok_or_else(|| AssetError::NotFound(url.to_string()))
    }

    /// How many times `url` went through [`AssetCache::load`], hits included
    pub fn load_count(&self, url: &str) -> usize {
        self.loads.get(url).copied().unwrap_or(0)
    }

    /// Registered URLs
    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl AssetCache for MemoryAssetCache {
    fn load(&mut self, url: &str) -> Option<AssetHandle> {
        *self.loads.entry(url.to_string()).or_default() += 1;
        match self.get(url) {
            Ok(handle) => Some(handle.clone()),
            Err(e) => {
                if self.missing_logged.insert(url.to_string()) {
                    log::warn!("{e}");
                }
                None
            }
        }
    }
}
