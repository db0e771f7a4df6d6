//! Material type definitions
//!
//! A [`Material`] is a CPU-side mirror of a GPU material binding. Mutations
//! record what the renderer has to push on its next upload in
//! [`MaterialDirty`]; only a new identity (a freshly assigned material)
//! forces a shader program build.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use super::Color;
use crate::foundation::collections::{MaterialId, TextureId};

bitflags! {
    /// Pending uploads for a material
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MaterialDirty: u8 {
        /// Base color changed, uniform upload only
        const COLOR = 1 << 0;
        /// Opacity or blending changed, uniform upload only
        const OPACITY = 1 << 1;
        /// New material object, requires a shader program build
        const PROGRAM = 1 << 2;
    }
}

/// Shading model of a material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaterialKind {
    /// Standard metallic-roughness PBR, the kind the recolor pass reuses
    Standard,
    /// Extended PBR (clearcoat, transmission) as authored in source assets
    Physical,
    /// Unlit color/texture
    Basic,
}

/// Fixed physically-based parameters applied to metal surfaces
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PbrParams {
    /// Metalness factor
    pub metalness: f32,
    /// Roughness factor
    pub roughness: f32,
    /// Environment map contribution multiplier
    pub env_map_intensity: f32,
}

impl Default for PbrParams {
    fn default() -> Self {
        Self {
            metalness: 1.0,
            roughness: 0.05,
            env_map_intensity: 2.5,
        }
    }
}

/// Texture bound to a material's base color slot
#[derive(Debug, PartialEq, Eq)]
pub struct TextureMap {
    /// GPU texture identity
    pub id: TextureId,
    /// Source name, for debugging
    pub name: Option<String>,
}

impl TextureMap {
    /// Create a map with a fresh texture identity
    pub fn new(name: Option<String>) -> Self {
        Self { id: TextureId::fresh(), name }
    }

    /// Deep copy with a fresh identity
    pub fn duplicate(&self) -> Self {
        Self::new(self.name.clone())
    }
}

/// Material resource
///
/// Not `Clone`: copying a material must go through [`Material::duplicate`]
/// so the copy gets its own identity.
#[derive(Debug)]
pub struct Material {
    id: MaterialId,
    kind: MaterialKind,
    /// Optional name for debugging
    pub name: Option<String>,
    color: Color,
    /// Metalness factor
    pub metalness: f32,
    /// Roughness factor
    pub roughness: f32,
    /// Environment map contribution multiplier
    pub env_map_intensity: f32,
    opacity: f32,
    transparent: bool,
    map: Option<TextureMap>,
    dirty: MaterialDirty,
}

impl Material {
    /// Create a new material of the given kind with neutral parameters
    pub fn new(kind: MaterialKind) -> Self {
        Self {
            id: MaterialId::fresh(),
            kind,
            name: None,
            color: Color::WHITE,
            metalness: 0.0,
            roughness: 1.0,
            env_map_intensity: 1.0,
            opacity: 1.0,
            transparent: false,
            map: None,
            dirty: MaterialDirty::PROGRAM,
        }
    }

    /// Create a new standard PBR material for a metal surface
    pub fn standard_pbr(color: Color, params: &PbrParams) -> Self {
        Self {
            metalness: params.metalness,
            roughness: params.roughness,
            env_map_intensity: params.env_map_intensity,
            ..Self::new(MaterialKind::Standard)
        }
        .with_color(color)
    }

    /// Set the material name for debugging
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Builder: set the base color
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Builder: attach a base color texture
    pub fn with_map(mut self, map: TextureMap) -> Self {
        self.map = Some(map);
        self
    }

    /// Deep copy with fresh identities for the material and its map
    pub fn duplicate(&self) -> Self {
        Self {
            id: MaterialId::fresh(),
            kind: self.kind,
            name: self.name.clone(),
            color: self.color,
            metalness: self.metalness,
            roughness: self.roughness,
            env_map_intensity: self.env_map_intensity,
            opacity: self.opacity,
            transparent: self.transparent,
            map: self.map.as_ref().map(TextureMap::duplicate),
            dirty: MaterialDirty::PROGRAM,
        }
    }

    /// Material identity
    pub fn id(&self) -> MaterialId {
        self.id
    }

    /// Shading model
    pub fn kind(&self) -> MaterialKind {
        self.kind
    }

    /// Whether a recolor may update this material in place
    pub fn is_reusable_pbr(&self) -> bool {
        self.kind == MaterialKind::Standard
    }

    /// Base color
    pub fn color(&self) -> Color {
        self.color
    }

    /// Update the base color in place
    pub fn set_color(&mut self, color: Color) {
        if self.color != color {
            self.color = color;
            self.dirty |= MaterialDirty::COLOR;
        }
    }

    /// Current opacity
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Whether the material is alpha blended
    pub fn is_transparent(&self) -> bool {
        self.transparent
    }

    /// Set opacity; blending is enabled whenever opacity is below one
    pub fn set_opacity(&mut self, opacity: f32) {
        let opacity = opacity.clamp(0.0, 1.0);
        let transparent = opacity < 1.0;
        if (self.opacity - opacity).abs() > f32::EPSILON || self.transparent != transparent {
            self.opacity = opacity;
            self.transparent = transparent;
            self.dirty |= MaterialDirty::OPACITY;
        }
    }

    /// Bound base color texture
    pub fn map(&self) -> Option<&TextureMap> {
        self.map.as_ref()
    }

    /// Pending uploads
    pub fn dirty(&self) -> MaterialDirty {
        self.dirty
    }

    /// Take and clear pending uploads (called by the renderer after upload)
    pub fn take_dirty(&mut self) -> MaterialDirty {
        std::mem::take(&mut self.dirty)
    }
}

/// Material slot of a mesh: one material, or one per geometry group
#[derive(Debug)]
pub enum MeshMaterial {
    /// Single material for the whole mesh
    Single(Material),
    /// One material per geometry group
    Multi(Vec<Material>),
}

impl MeshMaterial {
    /// Iterate over every material
    pub fn iter(&self) -> std::slice::Iter<'_, Material> {
        match self {
            Self::Single(material) => std::slice::from_ref(material).iter(),
            Self::Multi(materials) => materials.iter(),
        }
    }

    /// Iterate mutably over every material
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Material> {
        match self {
            Self::Single(material) => std::slice::from_mut(material).iter_mut(),
            Self::Multi(materials) => materials.iter_mut(),
        }
    }

    /// Number of material objects
    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Multi(materials) => materials.len(),
        }
    }

    /// Whether the slot holds no material at all
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deep copy of every material
    pub fn duplicate(&self) -> Self {
        match self {
            Self::Single(material) => Self::Single(material.duplicate()),
            Self::Multi(materials) => Self::Multi(materials.iter().map(Material::duplicate).collect()),
        }
    }

    /// Identities in slot order
    pub fn ids(&self) -> Vec<MaterialId> {
        self.iter().map(Material::id).collect()
    }

    /// Consume into the owned materials
    pub fn into_vec(self) -> Vec<Material> {
        match self {
            Self::Single(material) => vec![material],
            Self::Multi(materials) => materials,
        }
    }
}

impl From<Material> for MeshMaterial {
    fn from(material: Material) -> Self {
        Self::Single(material)
    }
}
