//! Host-side collaborator traits
//!
//! The engine never talks to a GPU. Whatever owns the device implements these
//! traits; the engine calls them when it releases a resource, when it wants
//! to know whether the host has spare time, and when the composed model is
//! ready to be revealed.

use std::collections::HashSet;

use crate::foundation::collections::{GeometryId, MaterialId, TextureId};

/// Releases GPU-resident resources
pub trait ResourceDisposer {
    /// Free a geometry buffer
    fn dispose_geometry(&mut self, id: GeometryId);
    /// Free a material and its compiled program binding
    fn dispose_material(&mut self, id: MaterialId);
    /// Free a texture
    fn dispose_texture(&mut self, id: TextureId);
}

/// Host idle-time scheduling
pub trait IdleScheduler {
    /// Whether the host can report idle time at all; when it cannot, deferred
    /// work runs immediately
    fn idle_callbacks_supported(&self) -> bool {
        true
    }

    /// Whether the host currently has spare capacity for deferred work
    fn has_idle_capacity(&self) -> bool;
}

/// What the host's graphics backend can do with textures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureCapabilities {
    /// Maximum anisotropic filtering level, 1 when unsupported
    pub max_anisotropy: u16,
    /// Whether sRGB decoding of textures is supported
    pub supports_srgb: bool,
}

impl Default for TextureCapabilities {
    fn default() -> Self {
        Self {
            max_anisotropy: 16,
            supports_srgb: true,
        }
    }
}

/// The rendering host the composition root drives
pub trait RenderHost: ResourceDisposer + IdleScheduler {
    /// Texture features of the backend
    fn texture_capabilities(&self) -> TextureCapabilities {
        TextureCapabilities::default()
    }

    /// The composed model is ready to be shown
    fn model_ready(&mut self);
}

/// Bookkeeping host that records every call
///
/// Used by tests and headless previews to verify that every resource a mount
/// created is released exactly once.
#[derive(Debug)]
pub struct ResourceTracker {
    /// Disposed geometries in call order
    pub disposed_geometries: Vec<GeometryId>,
    /// Disposed materials in call order
    pub disposed_materials: Vec<MaterialId>,
    /// Disposed textures in call order
    pub disposed_textures: Vec<TextureId>,
    /// Number of readiness signals received
    pub ready_signals: usize,
    /// Reported idle capacity
    pub idle: bool,
    /// Whether idle callbacks are reported as supported
    pub idle_supported: bool,
    /// Reported texture capabilities
    pub capabilities: TextureCapabilities,
}

impl Default for ResourceTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceTracker {
    /// Create a tracker with idle capacity and full texture support
    pub fn new() -> Self {
        Self {
            disposed_geometries: Vec::new(),
            disposed_materials: Vec::new(),
            disposed_textures: Vec::new(),
            ready_signals: 0,
            idle: true,
            idle_supported: true,
            capabilities: TextureCapabilities::default(),
        }
    }

    /// Total dispose calls of every kind
    pub fn total_disposals(&self) -> usize {
        self.disposed_geometries.len() + self.disposed_materials.len() + self.disposed_textures.len()
    }

    /// Whether any resource was disposed more than once
    pub fn has_double_disposal(&self) -> bool {
        fn dup<T: std::hash::Hash + Eq + Copy>(ids: &[T]) -> bool {
            let mut seen = HashSet::new();
            ids.iter().any(|id| !seen.insert(*id))
        }
        dup(&self.disposed_geometries) || dup(&self.disposed_materials) || dup(&self.disposed_textures)
    }
}

impl ResourceDisposer for ResourceTracker {
    fn dispose_geometry(&mut self, id: GeometryId) {
        log::trace!("dispose {id}");
        self.disposed_geometries.push(id);
    }

    fn dispose_material(&mut self, id: MaterialId) {
        log::trace!("dispose {id}");
        self.disposed_materials.push(id);
    }

    fn dispose_texture(&mut self, id: TextureId) {
        log::trace!("dispose {id}");
        self.disposed_textures.push(id);
    }
}

impl IdleScheduler for ResourceTracker {
    fn idle_callbacks_supported(&self) -> bool {
        self.idle_supported
    }

    fn has_idle_capacity(&self) -> bool {
        self.idle
    }
}

impl RenderHost for ResourceTracker {
    fn texture_capabilities(&self) -> TextureCapabilities {
        self.capabilities
    }

    fn model_ready(&mut self) {
        self.ready_signals += 1;
    }
}
