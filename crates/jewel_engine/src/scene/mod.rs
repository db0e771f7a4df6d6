//! Scene graph and gem extraction
//!
//! ## Architecture
//!
//! ```text
//! AssetHandle (immutable, cached by URL)
//!      ↓ deep_clone
//! SceneGraph (owned clone, recolored)
//!      ↓ extract_gems
//! Vec<GemPlacement> (world-space snapshot)
//! ```
//!
//! Mutation and reading are separate phases: a clone is recolored and its
//! world matrices refreshed before extraction reads transforms and bounds.

mod gem_extractor;
mod geometry;
mod scene_graph;

pub use gem_extractor::{extract_gems, GemPlacement};
pub use geometry::Geometry;
pub use scene_graph::{Mesh, SceneGraph, SceneGraphError, SceneNode};
