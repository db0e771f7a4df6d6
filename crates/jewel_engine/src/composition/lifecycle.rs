//! Release of clone-owned GPU resources

use crate::core::host::ResourceDisposer;
use crate::materials::Material;
use crate::scene::{GemPlacement, SceneGraph};

/// Dispose a material and its texture map
pub fn dispose_material<H: ResourceDisposer + ?Sized>(material: &Material, host: &mut H) {
    if let Some(map) = material.map() {
        host.dispose_texture(map.id);
    }
    host.dispose_material(material.id());
}

/// Dispose every geometry, material and texture map of a graph
///
/// Returns the number of meshes released.
pub fn dispose_scene<H: ResourceDisposer + ?Sized>(graph: &SceneGraph, host: &mut H) -> usize {
    let mut meshes = 0;
    for key in graph.mesh_nodes() {
        let Some(mesh) = graph.node(key).and_then(|n| n.mesh.as_ref()) else {
            continue;
        };
        host.dispose_geometry(mesh.geometry.id());
        for material in mesh.material.iter() {
            dispose_material(material, host);
        }
        meshes += 1;
    }
    meshes
}

/// Dispose the geometry copies held by gem placements
pub fn dispose_placements<H: ResourceDisposer + ?Sized>(placements: &[GemPlacement], host: &mut H) {
    for placement in placements {
        host.dispose_geometry(placement.geometry.id());
    }
}
