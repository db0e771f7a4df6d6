//! Mount-owned copies of loaded assets

use crate::assets::AssetHandle;
use crate::core::config::GemNamingRule;
use crate::core::host::ResourceDisposer;
use crate::foundation::collections::SceneId;
use crate::materials::{apply_metal, Color, PbrParams};
use crate::scene::{extract_gems, GemPlacement, SceneGraph};

use super::lifecycle::{dispose_material, dispose_placements, dispose_scene};

/// Deep copy of an asset, recolored, with its gems extracted
///
/// Owned by exactly one composer and disposed when superseded or unmounted.
#[derive(Debug)]
pub struct SceneClone {
    graph: SceneGraph,
    source: SceneId,
    source_url: String,
    metal: String,
    placements: Vec<GemPlacement>,
}

impl SceneClone {
    /// Clone `handle`, paint its metal and extract its gems
    ///
    /// Materials replaced by the recolor pass are disposed right away.
    pub fn build<H: ResourceDisposer + ?Sized>(
        handle: &AssetHandle,
        metal: &str,
        color: Color,
        rule: &GemNamingRule,
        params: &PbrParams,
        host: &mut H,
    ) -> Self {
        let mut graph = handle.scene().deep_clone();
        let outcome = apply_metal(&mut graph, color, rule, params);
        for material in &outcome.displaced {
            dispose_material(material, host);
        }
        let placements = extract_gems(&mut graph, rule);

        log::debug!(
            "Cloned {} as {} ({} meshes, {} gems, metal {metal})",
            handle.url(),
            graph.id(),
            graph.mesh_count(),
            placements.len()
        );

        Self {
            graph,
            source: handle.id(),
            source_url: handle.url().to_string(),
            metal: metal.to_string(),
            placements,
        }
    }

    /// Whether this clone was built from `handle` with `metal`
    pub fn is_current(&self, handle: &AssetHandle, metal: &str) -> bool {
        self.source == handle.id() && self.metal == metal
    }

    /// The cloned graph
    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    /// The cloned graph, mutably
    pub fn graph_mut(&mut self) -> &mut SceneGraph {
        &mut self.graph
    }

    /// Identity of the source asset
    pub fn source(&self) -> SceneId {
        self.source
    }

    /// URL of the source asset
    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    /// Metal it was painted with
    pub fn metal(&self) -> &str {
        &self.metal
    }

    /// Gem placements extracted at build time
    pub fn placements(&self) -> &[GemPlacement] {
        &self.placements
    }

    /// Release every resource this clone owns
    pub fn dispose<H: ResourceDisposer + ?Sized>(self, host: &mut H) {
        let meshes = dispose_scene(&self.graph, host);
        dispose_placements(&self.placements, host);
        log::debug!(
            "Disposed clone {} of {} ({meshes} meshes, {} gem copies)",
            self.graph.id(),
            self.source_url,
            self.placements.len()
        );
    }
}
