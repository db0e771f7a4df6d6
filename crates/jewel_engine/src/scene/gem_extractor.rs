//! Gem extraction
//!
//! Gems are not drawn through the scene graph. Each gem mesh is hidden and
//! turned into a [`GemPlacement`] that a specialized gem renderer consumes.

use super::{Geometry, SceneGraph};
use crate::core::config::GemNamingRule;
use crate::foundation::math::{Quat, Transform, Vec3};

/// World-space snapshot of one gem mesh
///
/// Owns a copy of the geometry, so disposing or mutating the source clone
/// never affects the unit drawing the gem.
#[derive(Debug)]
pub struct GemPlacement {
    /// Source mesh name
    pub name: String,
    /// World position
    pub position: Vec3,
    /// World orientation
    pub orientation: Quat,
    /// World scale
    pub scale: Vec3,
    /// Independent geometry copy
    pub geometry: Geometry,
    /// Lowest world-space Y of the gem's bounds
    pub min_y: f32,
    /// World-space bounds height, never negative
    pub height: f32,
}

/// Hide every gem mesh in `graph` and return its world-space placement
///
/// World matrices are refreshed first, so parent transforms are current.
/// Output follows traversal order.
pub fn extract_gems(graph: &mut SceneGraph, rule: &GemNamingRule) -> Vec<GemPlacement> {
    graph.update_world_matrices();

    let mut placements = Vec::new();
    for key in graph.mesh_nodes() {
        let Some(node) = graph.node(key) else { continue };
        if !rule.matches(&node.name) {
            continue;
        }
        let Some(mesh) = node.mesh.as_ref() else { continue };

        let world = Transform::from_matrix(*node.world_matrix());
        let (min_y, height) = graph
            .world_bounds(key)
            .map_or((world.position.y, 0.0), |b| (b.min.y, (b.max.y - b.min.y).max(0.0)));

        placements.push(GemPlacement {
            name: node.name.clone(),
            position: world.position,
            orientation: world.rotation,
            scale: world.scale,
            geometry: mesh.geometry.duplicate(),
            min_y,
            height,
        });

        if let Some(node) = graph.node_mut(key) {
            node.visible = false;
        }
    }

    log::debug!("Extracted {} gem placements from scene {}", placements.len(), graph.id());
    placements
}
