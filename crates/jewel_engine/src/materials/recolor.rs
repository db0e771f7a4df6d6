//! Metal recolor and fade passes over a scene clone

use super::{Color, Material, PbrParams};
use crate::core::config::GemNamingRule;
use crate::scene::SceneGraph;

/// Result of a recolor pass
#[derive(Debug, Default)]
pub struct RecolorOutcome {
    /// Materials whose color was updated in place
    pub reused: usize,
    /// Material slots that received a new PBR material
    pub replaced: usize,
    /// Gem meshes left untouched
    pub skipped_gems: usize,
    /// Materials removed from the graph; the caller owns their disposal
    pub displaced: Vec<Material>,
}

/// Apply a metal color to every non-gem mesh
///
/// Standard PBR materials keep their identity and only change color, so the
/// renderer does not rebuild their shader program. Any other material is
/// swapped for a new standard material built from `params`; the old one is
/// handed back in [`RecolorOutcome::displaced`]. Gem meshes are skipped.
pub fn apply_metal(graph: &mut SceneGraph, color: Color, rule: &GemNamingRule, params: &PbrParams) -> RecolorOutcome {
    let mut outcome = RecolorOutcome::default();
    graph.for_each_mesh_mut(|name, mesh| {
        if rule.matches(name) {
            outcome.skipped_gems += 1;
            return;
        }
        for slot in mesh.material.iter_mut() {
            if slot.is_reusable_pbr() {
                slot.set_color(color);
                outcome.reused += 1;
            } else {
                let fresh = Material::standard_pbr(color, params).with_name(format!("{name}/metal"));
                outcome.displaced.push(std::mem::replace(slot, fresh));
                outcome.replaced += 1;
            }
        }
    });
    log::trace!(
        "Recolor {}: {} reused, {} replaced, {} gems skipped",
        color.to_hex(),
        outcome.reused,
        outcome.replaced,
        outcome.skipped_gems
    );
    outcome
}

/// Fade every non-gem material to `opacity`
///
/// Returns how many materials actually changed.
pub fn apply_opacity(graph: &mut SceneGraph, opacity: f32, rule: &GemNamingRule) -> usize {
    let mut changed = 0;
    graph.for_each_mesh_mut(|name, mesh| {
        if rule.matches(name) {
            return;
        }
        for material in mesh.material.iter_mut() {
            let before = material.opacity();
            material.set_opacity(opacity);
            if (material.opacity() - before).abs() > f32::EPSILON {
                changed += 1;
            }
        }
    });
    changed
}
