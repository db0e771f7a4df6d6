//! Headless ring configurator preview
//!
//! Mounts a ring composer over procedurally built ring scenes and drives it
//! at 60 Hz while a simulated shopper changes metal, diamond shape and ring
//! model. Frame summaries and resource bookkeeping go to the log.
//!
//! ```text
//! ring_preview [config.toml|ron] [rings.toml|ron] [--assets DIR] [--constrained] [--seconds N]
//! ```
//!
//! Without `--assets` the environment map is simulated and completes after a
//! short delay. With it, the map is decoded from `DIR` on a worker thread.

use std::collections::BTreeSet;
use std::path::PathBuf;

use jewel_engine::assets::ScriptedTextureLoader;
use jewel_engine::composition::GemSource;
use jewel_engine::scene::SceneGraphError;
use jewel_engine::foundation::{logging, time::FrameTimer};
use jewel_engine::prelude::*;
use nalgebra::{Unit, UnitQuaternion};
use rand::seq::SliceRandom;
use rand::Rng;

const FRAME_MS: Millis = 1000.0 / 60.0;
const SIMULATED_ENV_LATENCY_MS: Millis = 120.0;
const SIDE_STONES: usize = 6;

struct PreviewArgs {
    config_path: PathBuf,
    rings_path: PathBuf,
    asset_root: Option<PathBuf>,
    constrained: bool,
    seconds: f64,
}

impl PreviewArgs {
    fn parse() -> Result<Self, Box<dyn std::error::Error>> {
        let mut positional = Vec::new();
        let mut asset_root = None;
        let mut constrained = false;
        let mut seconds = 8.0;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--assets" => asset_root = Some(PathBuf::from(args.next().ok_or("--assets needs a directory")?)),
                "--constrained" => constrained = true,
                "--seconds" => seconds = args.next().ok_or("--seconds needs a value")?.parse()?,
                _ => positional.push(PathBuf::from(arg)),
            }
        }

        let mut positional = positional.into_iter();
        Ok(Self {
            config_path: positional.next().unwrap_or_else(|| PathBuf::from("configurator.toml")),
            rings_path: positional.next().unwrap_or_else(|| PathBuf::from("rings.toml")),
            asset_root,
            constrained,
            seconds,
        })
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = PreviewArgs::parse()?;
    let config = ConfiguratorConfig::load_or_default(&args.config_path)?;
    logging::init_with_level(&config.engine.log_level);

    log::info!("Starting ring preview...");
    let mut catalogue = RingConfigData::load_or_default(&args.rings_path)?;
    if catalogue.rings.is_empty() {
        log::info!("Ring catalogue is empty, using the demo catalogue");
        catalogue = demo_catalogue();
    }

    let assets = build_asset_cache(&config, &catalogue)?;
    log::info!("Registered {} procedural scenes", assets.urls().count());

    let tier = if args.constrained { DeviceTier::Constrained } else { DeviceTier::Full };
    let props = CompositionProps::default().with_device_tier(tier);

    let report = match &args.asset_root {
        Some(root) => {
            log::info!("Decoding environment maps from {}", root.display());
            let session = Session::new(config, catalogue, assets, ThreadedTextureLoader::new(root), None);
            session.run(props, args.seconds, true)?
        }
        None => {
            let textures = ScriptedTextureLoader::new();
            let session = Session::new(config, catalogue, assets, textures.clone(), Some(textures));
            session.run(props, args.seconds, false)?
        }
    };

    log::info!(
        "Preview finished: {} frames, {} ready signals, {} geometries / {} materials / {} textures released",
        report.frames,
        report.host.ready_signals,
        report.host.disposed_geometries.len(),
        report.host.disposed_materials.len(),
        report.host.disposed_textures.len(),
    );
    if report.host.has_double_disposal() {
        log::error!("A resource was released more than once");
    }

    Ok(())
}

/// Simulated time for the scripted loader, wall time when decoding from disk
enum PreviewClock {
    Simulated(ManualClock),
    Wall(SystemClock),
}

impl PreviewClock {
    fn now_ms(&self) -> Millis {
        match self {
            Self::Simulated(clock) => clock.now_ms(),
            Self::Wall(clock) => clock.now_ms(),
        }
    }

    fn next_frame(&self) {
        match self {
            Self::Simulated(clock) => clock.advance(FRAME_MS),
            Self::Wall(_) => std::thread::sleep(std::time::Duration::from_secs_f64(FRAME_MS / 1000.0)),
        }
    }
}

struct SessionReport {
    frames: u64,
    host: ResourceTracker,
}

struct Session<L: TextureLoader> {
    config: ConfiguratorConfig,
    catalogue: RingConfigData,
    assets: MemoryAssetCache,
    loader: L,
    scripted: Option<ScriptedTextureLoader>,
}

impl<L: TextureLoader> Session<L> {
    fn new(
        config: ConfiguratorConfig,
        catalogue: RingConfigData,
        assets: MemoryAssetCache,
        loader: L,
        scripted: Option<ScriptedTextureLoader>,
    ) -> Self {
        Self {
            config,
            catalogue,
            assets,
            loader,
            scripted,
        }
    }

    fn run(self, mut props: CompositionProps, seconds: f64, real_time: bool) -> Result<SessionReport, ConfigError> {
        let Self {
            config,
            catalogue,
            assets,
            loader,
            scripted,
        } = self;

        let metals: Vec<String> = config.metals.palette.keys().cloned().collect();
        let models: Vec<String> = catalogue.rings.keys().cloned().collect();
        let shapes: Vec<String> = catalogue
            .rings
            .values()
            .filter_map(|ring| ring.heads.as_ref())
            .flat_map(|heads| heads.keys().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let clock = if real_time {
            PreviewClock::Wall(SystemClock::new())
        } else {
            PreviewClock::Simulated(ManualClock::new())
        };
        let mut host = ResourceTracker::new();
        let mut rng = rand::thread_rng();
        let mut timer = FrameTimer::new();
        let mut env_requested_at: Option<Millis> = None;
        let mut ready_signals = 0;

        let mut composer = RingComposer::new(
            config,
            props.clone(),
            assets,
            StaticRingConfigSource::with_latency(catalogue, 3),
            loader,
            clock.now_ms(),
        )?;

        let end = seconds * 1000.0;
        while clock.now_ms() < end {
            let now = clock.now_ms();
            timer.tick(now);
            host.idle = timer.frame_count() % 3 == 0;

            // A shopper changes one option every ~1.5 s
            if timer.frame_count() % 90 == 0 && timer.frame_count() > 0 {
                props = mutate_props(props, &mut rng, &metals, &models, &shapes);
                log::info!(
                    "t={:.0}ms selection: {} / {} / {}",
                    now,
                    props.ring_model,
                    props.diamond_shape,
                    props.metal
                );
                composer.set_props(props.clone(), now);
            }

            composer.update(now, &mut host);

            if let Some(textures) = &scripted {
                pump_scripted(textures, now, &mut env_requested_at);
            }

            if host.ready_signals != ready_signals {
                ready_signals = host.ready_signals;
                log::info!("t={now:.0}ms model ready ({} signals)", ready_signals);
            }

            if composer.wants_frame() || timer.frame_count() % 30 == 0 {
                log_frame(&composer, now);
            }

            clock.next_frame();
        }

        let frames = timer.frame_count();
        composer.unmount(&mut host);
        Ok(SessionReport { frames, host })
    }
}

/// Complete simulated environment-map loads after a fixed latency
fn pump_scripted(textures: &ScriptedTextureLoader, now: Millis, requested_at: &mut Option<Millis>) {
    let pending = textures.pending();
    if pending.is_empty() {
        *requested_at = None;
        return;
    }
    let since = *requested_at.get_or_insert(now);
    if now - since >= SIMULATED_ENV_LATENCY_MS {
        for url in pending {
            textures.complete(&url);
        }
        *requested_at = None;
    }
}

fn log_frame<A, C, L>(composer: &RingComposer<A, C, L>, now: Millis)
where
    A: AssetCache,
    C: RingConfigSource,
    L: TextureLoader,
{
    let Some(frame) = composer.frame() else {
        log::debug!("t={now:.0}ms no frame yet");
        return;
    };
    let head_opacity = frame.gems_from(GemSource::Head).next().map(|gem| gem.opacity);
    log::debug!(
        "t={:.0}ms ring={} visible={} reveal={:.2} scale={:.2} yaw={:.2} shape={:.2} gems={} head_opacity={:?}",
        now,
        composer.active_ring_model(),
        frame.clones_visible,
        frame.transition.ring_transition_progress,
        frame.transition.ring_scale,
        frame.transition.ring_rotation,
        frame.transition.anim_progress,
        frame.gems.len(),
        head_opacity,
    );
}

fn mutate_props(
    props: CompositionProps,
    rng: &mut impl Rng,
    metals: &[String],
    models: &[String],
    shapes: &[String],
) -> CompositionProps {
    match rng.gen_range(0..3) {
        0 => match metals.choose(rng) {
            Some(metal) => props.with_metal(metal.clone()),
            None => props,
        },
        1 => match shapes.choose(rng) {
            Some(shape) => props.with_diamond_shape(shape.clone()),
            None => props,
        },
        _ => match models.choose(rng) {
            Some(model) => props.with_ring_model(model.clone()),
            None => props,
        },
    }
}

fn demo_catalogue() -> RingConfigData {
    RingConfigData::default()
        .with_ring("ring", RingConfig::new("/assets/models/ring/earmetal.glb"))
        .with_ring("halo", RingConfig::new("/assets/models/ring/halo.glb"))
        .with_ring(
            "solitaire",
            RingConfig::new("/assets/models/ring/solitaire.glb")
                .with_head("round", "/assets/models/ring/heads/round.glb")
                .with_head("oval", "/assets/models/ring/heads/oval.glb")
                .with_head("princess", "/assets/models/ring/heads/princess.glb"),
        )
}

/// Register a procedural scene for every URL the configuration can request
fn build_asset_cache(config: &ConfiguratorConfig, catalogue: &RingConfigData) -> Result<MemoryAssetCache, SceneGraphError> {
    let mut cache = MemoryAssetCache::new();
    cache.register(config.assets.base_ring_url.clone(), band_scene(SIDE_STONES)?);
    for ring in catalogue.rings.values() {
        cache.register(ring.base_ring_url.clone(), band_scene(SIDE_STONES)?);
        if let Some(heads) = &ring.heads {
            for (shape, url) in heads {
                cache.register(url.clone(), head_scene(shape)?);
            }
        }
    }
    Ok(cache)
}

fn block(half: Vec3) -> Geometry {
    let corners = [
        Vec3::new(-half.x, -half.y, -half.z),
        Vec3::new(half.x, -half.y, -half.z),
        Vec3::new(half.x, half.y, -half.z),
        Vec3::new(-half.x, half.y, -half.z),
        Vec3::new(-half.x, -half.y, half.z),
        Vec3::new(half.x, -half.y, half.z),
        Vec3::new(half.x, half.y, half.z),
        Vec3::new(-half.x, half.y, half.z),
    ];
    let indices = vec![
        0, 1, 2, 0, 2, 3, 4, 6, 5, 4, 7, 6, 0, 4, 5, 0, 5, 1, 3, 2, 6, 3, 6, 7, 0, 3, 7, 0, 7, 4, 1, 5, 6, 1, 6, 2,
    ];
    Geometry::new(corners.to_vec(), indices)
}

/// A band with side stones set around its upper half
fn band_scene(side_stones: usize) -> Result<SceneGraph, SceneGraphError> {
    let mut graph = SceneGraph::new();
    let root = graph.add_root(SceneNode::new("ring"));
    let band = SceneNode::new("band").with_mesh(Mesh::new(
        block(Vec3::new(1.0, 1.0, 0.15)),
        Material::new(MaterialKind::Physical).with_name("band_cast"),
    ));
    graph.add_child(root, band)?;

    let z_axis = Unit::new_normalize(Vec3::z());
    for i in 0..side_stones {
        let angle = std::f32::consts::PI * (i as f32 + 0.5) / side_stones as f32;
        let rotation = UnitQuaternion::from_axis_angle(&z_axis, angle - std::f32::consts::FRAC_PI_2);
        let transform = Transform::from_position(Vec3::new(angle.cos(), angle.sin(), 0.0)).with_rotation(rotation);
        let stone = SceneNode::new(format!("Diamond_side_{i:02}"))
            .with_transform(transform)
            .with_mesh(Mesh::new(block(Vec3::repeat(0.06)), Material::new(MaterialKind::Physical)));
        graph.add_child(root, stone)?;
    }
    Ok(graph)
}

/// A head with prongs and a centre stone whose proportions follow the shape
fn head_scene(shape: &str) -> Result<SceneGraph, SceneGraphError> {
    let stone = match shape {
        "oval" => Vec3::new(0.18, 0.12, 0.26),
        "princess" => Vec3::new(0.2, 0.14, 0.2),
        _ => Vec3::new(0.22, 0.14, 0.22),
    };
    let mut graph = SceneGraph::new();
    let root = graph.add_root(
        SceneNode::new(format!("head_{shape}")).with_transform(Transform::from_position(Vec3::new(0.0, 1.15, 0.0))),
    );
    let prongs = SceneNode::new("prongs").with_mesh(Mesh::new(
        block(Vec3::new(0.25, 0.2, 0.25)),
        Material::new(MaterialKind::Basic),
    ));
    graph.add_child(root, prongs)?;
    let centre = SceneNode::new("Diamond_center")
        .with_transform(Transform::from_position(Vec3::new(0.0, 0.2, 0.0)))
        .with_mesh(Mesh::new(block(stone), Material::new(MaterialKind::Physical)));
    graph.add_child(root, centre)?;
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_procedural_scenes_carry_named_gems() {
        let rule = GemNamingRule::default();
        let band = band_scene(SIDE_STONES).unwrap();
        let gems = band
            .mesh_nodes()
            .into_iter()
            .filter(|key| rule.matches(&band.node(*key).unwrap().name))
            .count();
        assert_eq!(gems, SIDE_STONES);
        assert_eq!(band.mesh_count(), SIDE_STONES + 1);

        let head = head_scene("oval").unwrap();
        assert_eq!(head.mesh_count(), 2);
    }

    #[test]
    fn test_asset_cache_covers_every_catalogue_url() {
        let config = ConfiguratorConfig::default();
        let catalogue = demo_catalogue();
        let cache = build_asset_cache(&config, &catalogue).unwrap();

        assert!(cache.get(&config.assets.base_ring_url).is_ok());
        for ring in catalogue.rings.values() {
            assert!(cache.get(&ring.base_ring_url).is_ok());
            for url in ring.head_urls() {
                assert!(cache.get(url).is_ok(), "{url} not registered");
            }
        }
    }
}
