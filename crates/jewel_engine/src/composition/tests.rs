//! Scenario tests for the composition root

use std::collections::HashSet;

use approx::assert_relative_eq;

use super::*;
use crate::animation::TransitionState;
use crate::assets::{MemoryAssetCache, RingConfig, RingConfigData, ScriptedTextureLoader, StaticRingConfigSource};
use crate::core::config::{ConfiguratorConfig, DeviceTier, DeviceTierProfile};
use crate::core::host::ResourceTracker;
use crate::foundation::collections::{GeometryId, MaterialId};
use crate::foundation::math::{Transform, Vec3};
use crate::foundation::time::{Clock, ManualClock, Millis};
use crate::materials::{Color, Material, MaterialKind, TextureMap};
use crate::scene::{Geometry, Mesh, SceneGraph, SceneNode};

const ENV: &str = "/env/studio.exr";
const CLASSIC: &str = "/rings/classic.glb";
const SOLITAIRE: &str = "/rings/solitaire.glb";
const HEAD_ROUND: &str = "/heads/round.glb";
const HEAD_OVAL: &str = "/heads/oval.glb";

fn cube(half: f32) -> Geometry {
    Geometry::new(vec![Vec3::repeat(-half), Vec3::repeat(half)], vec![])
}

fn band_scene() -> SceneGraph {
    let mut g = SceneGraph::new();
    let root = g.add_root(SceneNode::new("ring"));
    let band_material = Material::new(MaterialKind::Physical).with_map(TextureMap::new(Some("brushed".into())));
    g.add_child(root, SceneNode::new("band").with_mesh(Mesh::new(cube(1.0), band_material)))
        .unwrap();
    for (i, x) in [-1.0, 1.0].into_iter().enumerate() {
        g.add_child(
            root,
            SceneNode::new(format!("Diamond_side_{i}"))
                .with_transform(Transform::from_position(Vec3::new(x, 1.0, 0.0)))
                .with_mesh(Mesh::new(cube(0.1), Material::new(MaterialKind::Physical))),
        )
        .unwrap();
    }
    g
}

fn head_scene() -> SceneGraph {
    let mut g = SceneGraph::new();
    let root = g.add_root(SceneNode::new("head").with_transform(Transform::from_position(Vec3::new(0.0, 1.2, 0.0))));
    g.add_child(root, SceneNode::new("prongs").with_mesh(Mesh::new(cube(0.3), Material::new(MaterialKind::Basic))))
        .unwrap();
    g.add_child(
        root,
        SceneNode::new("Diamond_center").with_mesh(Mesh::new(cube(0.25), Material::new(MaterialKind::Physical))),
    )
    .unwrap();
    g
}

fn catalogue() -> RingConfigData {
    let mut data = RingConfigData::default()
        .with_ring("ring", RingConfig::new(CLASSIC))
        .with_ring(
            "solitaire",
            RingConfig::new(SOLITAIRE)
                .with_head("round", HEAD_ROUND)
                .with_head("oval", HEAD_OVAL),
        );
    data.diamond_env_map_url = ENV.to_string();
    data
}

fn asset_cache() -> MemoryAssetCache {
    let mut cache = MemoryAssetCache::new();
    cache.register(CLASSIC, band_scene());
    cache.register(SOLITAIRE, band_scene());
    cache.register(HEAD_ROUND, head_scene());
    cache.register(HEAD_OVAL, head_scene());
    cache
}

type TestComposer = RingComposer<MemoryAssetCache, StaticRingConfigSource, ScriptedTextureLoader>;

struct Harness {
    clock: ManualClock,
    host: ResourceTracker,
    textures: ScriptedTextureLoader,
    composer: TestComposer,
}

impl Harness {
    fn mount(props: CompositionProps) -> Self {
        Self::mount_with(props, asset_cache())
    }

    fn mount_with(props: CompositionProps, assets: MemoryAssetCache) -> Self {
        Self::mount_with_source(props, assets, StaticRingConfigSource::new(catalogue()))
    }

    fn mount_with_source(props: CompositionProps, assets: MemoryAssetCache, configs: StaticRingConfigSource) -> Self {
        let clock = ManualClock::new();
        let textures = ScriptedTextureLoader::new();
        let composer = RingComposer::new(
            ConfiguratorConfig::default(),
            props,
            assets,
            configs,
            textures.clone(),
            clock.now_ms(),
        )
        .unwrap();
        Self {
            clock,
            host: ResourceTracker::new(),
            textures,
            composer,
        }
    }

    fn update_at(&mut self, t: Millis) {
        self.clock.set(t);
        self.composer.update(self.clock.now_ms(), &mut self.host);
    }

    /// Update every 16 ms from the current time up to and including `t`
    fn run_to(&mut self, t: Millis) {
        let mut now = self.clock.now_ms();
        while now + 16.0 < t {
            now += 16.0;
            self.update_at(now);
        }
        self.update_at(t);
    }

    fn set(&mut self, change: impl FnOnce(&mut CompositionProps)) {
        let mut props = self.composer.props().clone();
        change(&mut props);
        self.composer.set_props(props, self.clock.now_ms());
    }

    fn load_environment(&mut self) {
        assert!(self.textures.complete(ENV));
        let now = self.clock.now_ms();
        self.update_at(now);
    }

    fn unmount(self) -> ResourceTracker {
        let mut host = self.host;
        self.composer.unmount(&mut host);
        host
    }
}

fn clone_resources(clone: &SceneClone) -> (Vec<GeometryId>, Vec<MaterialId>) {
    let graph = clone.graph();
    let mut geometries = Vec::new();
    let mut materials = Vec::new();
    for key in graph.mesh_nodes() {
        let mesh = graph.node(key).unwrap().mesh.as_ref().unwrap();
        geometries.push(mesh.geometry.id());
        materials.extend(mesh.material.ids());
    }
    geometries.extend(clone.placements().iter().map(|p| p.geometry.id()));
    (geometries, materials)
}

fn first_material(graph: &SceneGraph, name: &str) -> (MaterialKind, Color) {
    let key = graph
        .mesh_nodes()
        .into_iter()
        .find(|k| graph.node(*k).unwrap().name == name)
        .unwrap();
    let material = graph.node(key).unwrap().mesh.as_ref().unwrap().material.iter().next().unwrap();
    (material.kind(), material.color())
}

#[test]
fn test_headless_ring_composes_base_and_gems() {
    let mut h = Harness::mount(CompositionProps::default());
    h.update_at(0.0);

    let frame = h.composer.frame().unwrap();
    assert!(frame.head.is_none());
    assert!(frame.gems.is_empty());
    assert_eq!(h.composer.base().unwrap().source_url(), CLASSIC);
    assert_eq!(h.composer.base().unwrap().placements().len(), 2);
    assert_eq!(h.textures.pending(), [ENV]);

    h.load_environment();
    let frame = h.composer.frame().unwrap();
    let keys: Vec<_> = frame.gems.iter().map(|g| g.key.as_str()).collect();
    assert_eq!(keys, ["base-ring-0", "base-ring-1"]);
    for gem in &frame.gems {
        assert_relative_eq!(gem.opacity, 1.0);
        assert!(gem.reveal.is_none());
        assert_eq!(gem.gem, "diamond");
        assert_eq!(gem.render_mode, RenderMode::Performance);
        assert_eq!(gem.device_tier, DeviceTier::Full);
        assert_eq!(gem.environment.url(), ENV);
    }
    h.unmount();
}

#[test]
fn test_clone_is_recolored_without_touching_the_cache() {
    let mut h = Harness::mount(CompositionProps::default().with_metal("rose-gold"));
    h.update_at(0.0);

    let base = h.composer.base().unwrap();
    let (kind, color) = first_material(base.graph(), "band");
    assert_eq!(kind, MaterialKind::Standard);
    assert_eq!(color, Color::from_hex("#E0A899").unwrap());
    let (gem_kind, _) = first_material(base.graph(), "Diamond_side_0");
    assert_eq!(gem_kind, MaterialKind::Physical);

    let source = h.composer.assets().get(CLASSIC).unwrap();
    let (source_kind, _) = first_material(source.scene(), "band");
    assert_eq!(source_kind, MaterialKind::Physical);
    assert!(source
        .scene()
        .mesh_nodes()
        .into_iter()
        .all(|k| source.scene().node(k).unwrap().visible));
    h.unmount();
}

#[test]
fn test_gem_placements_are_world_space() {
    let mut h = Harness::mount(CompositionProps::default().with_ring_model("solitaire"));
    h.update_at(0.0);

    let head = h.composer.head().unwrap();
    assert_eq!(head.placements().len(), 1);
    let center = &head.placements()[0];
    assert_relative_eq!(center.position, Vec3::new(0.0, 1.2, 0.0), epsilon = 1e-5);
    assert_relative_eq!(center.min_y, 0.95, epsilon = 1e-5);
    assert_relative_eq!(center.height, 0.5, epsilon = 1e-5);
    h.unmount();
}

#[test]
fn test_readiness_fires_once_and_rearms_on_shape_change() {
    let mut h = Harness::mount(CompositionProps::default());
    h.update_at(0.0);
    h.update_at(299.0);
    assert_eq!(h.host.ready_signals, 0);

    h.update_at(300.0);
    assert_eq!(h.host.ready_signals, 1);
    h.run_to(1000.0);
    assert_eq!(h.host.ready_signals, 1);

    h.set(|p| p.diamond_shape = "oval".into());
    h.update_at(1000.0);
    h.update_at(1299.0);
    assert_eq!(h.host.ready_signals, 1);
    h.update_at(1300.0);
    assert_eq!(h.host.ready_signals, 2);

    h.set(|p| p.diamond_shape = "oval".into());
    h.run_to(2000.0);
    assert_eq!(h.host.ready_signals, 2);
    h.unmount();
}

#[test]
fn test_readiness_with_heads_waits_for_environment() {
    let mut h = Harness::mount(CompositionProps::default().with_ring_model("solitaire"));
    h.run_to(1000.0);
    assert!(h.composer.head().is_some());
    assert_eq!(h.host.ready_signals, 0);

    h.load_environment();
    h.update_at(1299.0);
    assert_eq!(h.host.ready_signals, 0);
    h.update_at(1300.0);
    assert_eq!(h.host.ready_signals, 1);
    h.unmount();
}

#[test]
fn test_head_gem_opacity_follows_shape_reveal() {
    let mut h = Harness::mount(CompositionProps::default().with_ring_model("solitaire"));
    h.update_at(0.0);
    h.load_environment();

    h.clock.set(100.0);
    h.set(|p| p.diamond_shape = "oval".into());
    h.update_at(100.0);
    assert_eq!(h.composer.head().unwrap().source_url(), HEAD_OVAL);

    let frame = h.composer.frame().unwrap();
    let head: Vec<_> = frame.gems_from(GemSource::Head).collect();
    assert_eq!(head.len(), 1);
    assert_eq!(head[0].key, "head-oval-0");
    assert_relative_eq!(head[0].opacity, 0.0);
    assert!(frame.gems_from(GemSource::Base).all(|g| (g.opacity - 1.0).abs() < 1e-6));

    h.update_at(250.0);
    let frame = h.composer.frame().unwrap();
    let gem = frame.gems_from(GemSource::Head).next().unwrap();
    assert_relative_eq!(gem.reveal.unwrap().anim_progress, 0.0625);
    assert_relative_eq!(gem.opacity, 0.125);

    h.update_at(400.0);
    let frame = h.composer.frame().unwrap();
    let gem = frame.gems_from(GemSource::Head).next().unwrap();
    assert_relative_eq!(gem.reveal.unwrap().anim_progress, 0.5);
    assert_relative_eq!(gem.opacity, 1.0);
    h.unmount();
}

#[test]
fn test_ring_model_swaps_while_hidden() {
    let mut h = Harness::mount(CompositionProps::default());
    h.update_at(0.0);
    h.load_environment();
    let (old_geometries, _) = clone_resources(h.composer.base().unwrap());

    h.clock.set(100.0);
    h.set(|p| p.ring_model = "solitaire".into());
    assert!(h.composer.wants_frame());

    h.run_to(300.0);
    assert_eq!(h.composer.active_ring_model(), "ring");
    assert_eq!(h.composer.base().unwrap().source_url(), CLASSIC);
    let frame = h.composer.frame().unwrap();
    assert_relative_eq!(frame.transition.ring_transition_progress, 0.5);
    assert_relative_eq!(frame.group.scale, Vec3::repeat(0.10 * 0.9), epsilon = 1e-6);

    h.run_to(600.0);
    assert_eq!(h.composer.active_ring_model(), "solitaire");
    assert_eq!(h.composer.base().unwrap().source_url(), SOLITAIRE);
    assert!(h.composer.head().is_some());
    let frame = h.composer.frame().unwrap();
    assert!(!frame.clones_visible);
    assert!(frame.gems_from(GemSource::Base).all(|g| g.key.starts_with("base-solitaire-") && g.opacity.abs() < 1e-6));
    assert!(old_geometries.iter().all(|id| h.host.disposed_geometries.contains(id)));

    h.run_to(1150.0);
    let frame = h.composer.frame().unwrap();
    assert!(frame.clones_visible);
    assert_eq!(frame.transition, TransitionState::STEADY);
    assert!(!h.composer.wants_frame());
    h.unmount();
}

#[test]
fn test_ring_model_swaps_while_hidden_with_slow_catalogue() {
    let configs = StaticRingConfigSource::with_latency(catalogue(), 20);
    let mut h = Harness::mount_with_source(CompositionProps::default(), asset_cache(), configs);
    h.run_to(500.0);
    assert_eq!(h.composer.base().unwrap().source_url(), CLASSIC);

    h.set(|p| p.ring_model = "solitaire".into());
    let mut installed_at = None;
    let mut now = 500.0;
    while now < 500.0 + 1050.0 && installed_at.is_none() {
        now += 16.0;
        h.update_at(now);
        if h.composer.base().unwrap().source_url() == SOLITAIRE {
            let reveal = h.composer.transition().ring_transition_progress;
            installed_at = Some((now - 500.0, reveal));
        }
    }

    let (elapsed, reveal) = installed_at.expect("solitaire base never installed");
    assert!((400.0..550.0).contains(&elapsed), "installed at {elapsed} ms");
    assert!(reveal.abs() < 1e-6, "installed at reveal {reveal}");
    assert!(h.composer.head().is_some());

    h.run_to(2000.0);
    assert_eq!(h.composer.base().unwrap().source_url(), SOLITAIRE);
    h.unmount();
}

#[test]
fn test_metal_change_rebuilds_and_disposes_clones() {
    let mut h = Harness::mount(CompositionProps::default().with_ring_model("solitaire"));
    h.update_at(0.0);
    let (old_geometries, old_materials) = clone_resources(h.composer.base().unwrap());

    h.set(|p| p.metal = "yellow-gold".into());
    h.update_at(16.0);

    let base = h.composer.base().unwrap();
    assert_eq!(first_material(base.graph(), "band").1, Color::from_hex("#E5C07B").unwrap());
    let (new_geometries, _) = clone_resources(base);
    assert!(new_geometries.iter().all(|id| !old_geometries.contains(id)));
    assert!(old_geometries.iter().all(|id| h.host.disposed_geometries.contains(id)));
    assert!(old_materials.iter().all(|id| h.host.disposed_materials.contains(id)));
    assert!(!h.host.has_double_disposal());
    h.unmount();
}

#[test]
fn test_unmount_releases_every_clone_resource() {
    let mut h = Harness::mount(CompositionProps::default().with_ring_model("solitaire"));
    let mut geometries = HashSet::new();
    let mut materials = HashSet::new();
    let mut capture = |h: &Harness| {
        for clone in [h.composer.base(), h.composer.head()].into_iter().flatten() {
            let (g, m) = clone_resources(clone);
            geometries.extend(g);
            materials.extend(m);
        }
    };

    h.update_at(0.0);
    capture(&h);
    h.load_environment();
    let texture = h.composer.environment().current().unwrap().id;

    h.set(|p| p.metal = "platinum".into());
    h.update_at(16.0);
    capture(&h);
    h.set(|p| p.diamond_shape = "oval".into());
    h.update_at(32.0);
    capture(&h);

    let source_geometry = {
        let source = h.composer.assets().get(SOLITAIRE).unwrap().scene();
        source.node(source.mesh_nodes()[0]).unwrap().mesh.as_ref().unwrap().geometry.id()
    };

    let host = h.unmount();

    let disposed_geometries: HashSet<_> = host.disposed_geometries.iter().copied().collect();
    let disposed_materials: HashSet<_> = host.disposed_materials.iter().copied().collect();
    assert_eq!(disposed_geometries, geometries);
    assert_eq!(host.disposed_geometries.len(), geometries.len());
    assert!(materials.is_subset(&disposed_materials));
    assert!(host.disposed_textures.contains(&texture));
    assert!(!disposed_geometries.contains(&source_geometry));
    assert!(!host.has_double_disposal());
}

#[test]
fn test_late_environment_completion_after_unmount_is_dropped() {
    let mut h = Harness::mount(CompositionProps::default());
    h.update_at(0.0);
    let textures = h.textures.clone();
    let host = h.unmount();

    let disposed_before = host.disposed_textures.len();
    assert!(!textures.complete(ENV));
    assert_eq!(host.disposed_textures.len(), disposed_before);
    assert!(textures.pending().is_empty());
}

#[test]
fn test_device_tier_change_moves_group_and_defers_environment() {
    let mut h = Harness::mount(CompositionProps::default());
    h.update_at(0.0);
    h.load_environment();
    let full = DeviceTierProfile::full().group_placement;
    assert_relative_eq!(h.composer.frame().unwrap().group.position, full.position);

    h.clock.set(100.0);
    h.set(|p| p.ring_model = "solitaire".into());
    h.run_to(200.0);
    h.host.idle = false;
    h.set(|p| p.device_tier = DeviceTier::Constrained);
    h.update_at(216.0);

    let constrained = DeviceTierProfile::constrained().group_placement;
    let frame = h.composer.frame().unwrap();
    assert_relative_eq!(frame.group.position, constrained.position);
    assert_relative_eq!(frame.group.scale, Vec3::repeat(constrained.scale));
    assert_eq!(frame.transition, TransitionState::STEADY);
    assert_eq!(h.composer.active_ring_model(), "solitaire");
    assert!(h.composer.environment().current().is_none());
    assert!(frame.gems.is_empty());
    assert_eq!(h.textures.requested().len(), 1);

    h.host.idle = true;
    h.update_at(232.0);
    assert_eq!(h.textures.requested().len(), 2);
    h.unmount();
}

#[test]
fn test_unknown_ring_model_falls_back() {
    let mut h = Harness::mount(CompositionProps::default().with_ring_model("mystery"));
    h.update_at(0.0);
    assert_eq!(h.composer.base().unwrap().source_url(), CLASSIC);
    h.unmount();
}

#[test]
fn test_missing_base_suppresses_output() {
    let mut assets = asset_cache();
    assets.unregister(CLASSIC);
    let mut h = Harness::mount_with(CompositionProps::default(), assets);
    h.update_at(0.0);
    h.update_at(500.0);

    assert!(h.composer.frame().is_none());
    assert_eq!(h.host.ready_signals, 0);
    h.unmount();
}

#[test]
fn test_heads_are_preloaded_one_per_idle_frame() {
    let mut h = Harness::mount(CompositionProps::default().with_ring_model("solitaire"));
    h.host.idle = false;
    h.update_at(0.0);
    assert_eq!(h.composer.assets().load_count(HEAD_OVAL), 0);

    h.host.idle = true;
    h.update_at(16.0);
    assert_eq!(h.composer.assets().load_count(HEAD_OVAL), 1);
    let round_before = h.composer.assets().load_count(HEAD_ROUND);
    h.update_at(32.0);
    assert_eq!(h.composer.assets().load_count(HEAD_ROUND), round_before + 2);
    h.update_at(48.0);
    assert_eq!(h.composer.assets().load_count(HEAD_OVAL), 1);
    h.unmount();
}
