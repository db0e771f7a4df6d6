//! Material system
//!
//! Materials carry a stable identity ([`MaterialId`]). The renderer keys its
//! compiled shader programs by that identity, so the cheapest way to change a
//! metal's look is to mutate the existing material in place rather than
//! assigning a new one.
//!
//! [`MaterialId`]: crate::foundation::collections::MaterialId

mod color;
mod material;
mod recolor;

pub use color::{Color, ColorError};
pub use material::{Material, MaterialDirty, MaterialKind, MeshMaterial, PbrParams, TextureMap};
pub use recolor::{apply_metal, apply_opacity, RecolorOutcome};
