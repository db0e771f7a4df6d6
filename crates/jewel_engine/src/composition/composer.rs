//! The ring composer

use std::collections::VecDeque;
use std::sync::Arc;

use super::frame::{ComposedFrame, GemReveal, GemRenderUnit, GemSource};
use super::readiness::{ReadinessGate, ReadinessInputs};
use super::{CompositionProps, SceneClone};
use crate::animation::{RingPhase, TransitionAnimator, TransitionState};
use crate::assets::{AssetCache, AssetHandle, RingConfig, RingConfigData, RingConfigSource, TextureLoader};
use crate::config::ConfigError;
use crate::core::config::{ConfiguratorConfig, DeviceTierProfile};
use crate::core::host::RenderHost;
use crate::environment::{EnvironmentMapLoader, EnvironmentTexture};
use crate::foundation::math::{Quat, Transform, Vec3};
use crate::foundation::time::Millis;
use crate::materials::apply_opacity;
use crate::scene::GemPlacement;

/// Composition root of the configurator
///
/// Owns the base and head clones, the environment map and the animator.
/// The host calls [`update`](Self::update) once per display refresh and
/// draws whatever [`frame`](Self::frame) returns. Every resource the composer
/// created is released by [`unmount`](Self::unmount).
pub struct RingComposer<A, C, L> {
    config: ConfiguratorConfig,
    props: CompositionProps,
    assets: A,
    configs: C,
    env_map: EnvironmentMapLoader<L>,
    animator: TransitionAnimator,

    active_ring_model: String,
    pending_ring_model: Option<String>,
    catalogue: Option<RingConfigData>,
    ring: Option<RingConfig>,
    config_resolved: bool,
    env_map_url: String,
    preload_queue: VecDeque<String>,

    base: Option<SceneClone>,
    head: Option<SceneClone>,
    group: Transform,
    readiness: ReadinessGate,
}

impl<A, C, L> RingComposer<A, C, L>
where
    A: AssetCache,
    C: RingConfigSource,
    L: TextureLoader,
{
    /// Mount a composer
    ///
    /// The configuration is validated first. The first ring model and shape
    /// are recorded without animating, and the ring catalogue is requested.
    pub fn new(
        config: ConfiguratorConfig,
        props: CompositionProps,
        assets: A,
        mut configs: C,
        loader: L,
        now: Millis,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let profile = *config.tiers.for_tier(props.device_tier);
        let mut animator = TransitionAnimator::new(profile);
        animator.set_ring_model(&props.ring_model, now);
        animator.set_diamond_shape(&props.diamond_shape, now);
        configs.request();

        log::info!(
            "Mounting ring composer: model {}, shape {}, metal {}, {:?} tier",
            props.ring_model,
            props.diamond_shape,
            props.metal,
            props.device_tier
        );

        Ok(Self {
            active_ring_model: props.ring_model.clone(),
            env_map_url: config.assets.environment_map_url.clone(),
            readiness: ReadinessGate::new(config.readiness.settle_delay_ms),
            group: Self::group_transform(&profile, animator.state()),
            config,
            props,
            assets,
            configs,
            env_map: EnvironmentMapLoader::new(loader),
            animator,
            pending_ring_model: None,
            catalogue: None,
            ring: None,
            config_resolved: false,
            preload_queue: VecDeque::new(),
            base: None,
            head: None,
        })
    }

    /// Current inputs
    pub fn props(&self) -> &CompositionProps {
        &self.props
    }

    /// Ring model whose assets are on screen
    pub fn active_ring_model(&self) -> &str {
        &self.active_ring_model
    }

    /// Current animation signals
    pub fn transition(&self) -> TransitionState {
        self.animator.state()
    }

    /// Whether the host should keep scheduling refreshes for animation
    pub fn wants_frame(&self) -> bool {
        self.animator.wants_frame() || self.pending_ring_model.is_some()
    }

    /// Live base clone
    pub fn base(&self) -> Option<&SceneClone> {
        self.base.as_ref()
    }

    /// Live head clone
    pub fn head(&self) -> Option<&SceneClone> {
        self.head.as_ref()
    }

    /// Environment map state
    pub fn environment(&self) -> &EnvironmentMapLoader<L> {
        &self.env_map
    }

    /// The asset cache
    pub fn assets(&self) -> &A {
        &self.assets
    }

    /// The asset cache, mutably
    pub fn assets_mut(&mut self) -> &mut A {
        &mut self.assets
    }

    /// Whether the resolved ring model has head assets
    pub fn has_heads(&self) -> bool {
        self.ring.as_ref().is_some_and(RingConfig::has_heads)
    }

    /// Apply new inputs
    ///
    /// A device-tier change snaps animations to steady state and finishes any
    /// pending model swap. A ring-model change starts the ring transition;
    /// the new model is installed once the fade-out is over. A shape change
    /// starts the reveal and re-arms the readiness signal. The catalogue is
    /// re-requested as soon as a model transition starts. Metal changes are
    /// picked up by the next [`update`](Self::update).
    pub fn set_props(&mut self, props: CompositionProps, now: Millis) {
        let old = std::mem::replace(&mut self.props, props);

        if old.device_tier != self.props.device_tier {
            log::debug!("Device tier {:?} -> {:?}", old.device_tier, self.props.device_tier);
            self.animator.set_profile(*self.profile());
            if let Some(model) = self.pending_ring_model.take() {
                self.swap_ring_model(model);
            }
        }

        if old.ring_model != self.props.ring_model
            && self.animator.set_ring_model(&self.props.ring_model, now)
        {
            self.pending_ring_model = Some(self.props.ring_model.clone());
            self.configs.request();
        }

        if old.diamond_shape != self.props.diamond_shape {
            self.animator.set_diamond_shape(&self.props.diamond_shape, now);
            self.readiness.rearm();
        }
    }

    /// Advance one display refresh
    pub fn update<H: RenderHost>(&mut self, now: Millis, host: &mut H) {
        if let Some(data) = self.configs.poll_config() {
            self.apply_catalogue(data);
        }

        self.animator.tick(now);
        if self.animator.ring_phase() != RingPhase::FadeOut {
            if let Some(model) = self.pending_ring_model.take() {
                self.swap_ring_model(model);
            }
        }

        self.refresh_clones(host);

        let profile = *self.profile();
        self.env_map
            .set_source(&self.env_map_url, self.props.device_tier, &profile, now, host);
        self.env_map.poll(now, host);

        if !self.preload_queue.is_empty() && (host.has_idle_capacity() || !host.idle_callbacks_supported()) {
            if let Some(url) = self.preload_queue.pop_front() {
                log::trace!("Preloading head {url}");
                self.assets.preload(&url);
            }
        }

        let state = self.animator.state();
        self.group = Self::group_transform(&profile, state);
        for clone in [self.base.as_mut(), self.head.as_mut()].into_iter().flatten() {
            apply_opacity(clone.graph_mut(), state.ring_transition_progress, &self.config.gems);
        }

        let inputs = ReadinessInputs {
            base: self.base.as_ref().map(|c| c.graph().id()),
            head: self.head.as_ref().map(|c| c.graph().id()),
            environment: self.env_map.current().map(|t| t.id),
            has_heads: self.has_heads(),
        };
        if self.readiness.update(inputs, now) {
            log::info!("Model ready: {} / {}", self.active_ring_model, self.props.diamond_shape);
            host.model_ready();
        }
    }

    /// Snapshot for drawing, `None` while the base model is unavailable
    pub fn frame(&self) -> Option<ComposedFrame<'_>> {
        let base = self.base.as_ref()?;
        let state = self.animator.state();

        let mut gems = Vec::new();
        if let Some(environment) = self.env_map.current() {
            for (i, p) in base.placements().iter().enumerate() {
                gems.push(self.gem_unit(
                    GemSource::Base,
                    format!("base-{}-{i}", self.active_ring_model),
                    p,
                    environment,
                    state.ring_transition_progress,
                    None,
                ));
            }

            if let Some(head) = self.head.as_ref() {
                let opacity = state.ring_transition_progress * (state.anim_progress * 2.0).min(1.0);
                for (i, p) in head.placements().iter().enumerate() {
                    let reveal = GemReveal {
                        min_y: p.min_y,
                        height: p.height,
                        anim_progress: state.anim_progress,
                    };
                    gems.push(self.gem_unit(
                        GemSource::Head,
                        format!("head-{}-{i}", self.props.diamond_shape),
                        p,
                        environment,
                        opacity,
                        Some(reveal),
                    ));
                }
            }
        }

        Some(ComposedFrame {
            group: self.group,
            clones_visible: state.ring_transition_progress > 0.0,
            base: base.graph(),
            head: self.head.as_ref().map(SceneClone::graph),
            gems,
            transition: state,
        })
    }

    /// Tear down: cancel the environment load and dispose every clone and
    /// texture this composer created
    pub fn unmount<H: RenderHost>(mut self, host: &mut H) {
        self.animator.cancel_all();
        self.env_map.teardown(host);
        for clone in [self.base.take(), self.head.take()].into_iter().flatten() {
            clone.dispose(host);
        }
        log::info!("Ring composer unmounted");
    }

    fn gem_unit<'a>(
        &'a self,
        source: GemSource,
        key: String,
        placement: &'a GemPlacement,
        environment: &Arc<EnvironmentTexture>,
        opacity: f32,
        reveal: Option<GemReveal>,
    ) -> GemRenderUnit<'a> {
        GemRenderUnit {
            key,
            source,
            geometry: &placement.geometry,
            position: placement.position,
            orientation: placement.orientation,
            scale: placement.scale,
            environment: Arc::clone(environment),
            opacity,
            gem: &self.props.gem,
            render_mode: self.props.render_mode,
            device_tier: self.props.device_tier,
            reveal,
        }
    }

    fn profile(&self) -> &DeviceTierProfile {
        self.config.tiers.for_tier(self.props.device_tier)
    }

    fn group_transform(profile: &DeviceTierProfile, state: TransitionState) -> Transform {
        let placement = profile.group_placement;
        Transform::from_parts(
            placement.position,
            Quat::from_axis_angle(&Vec3::y_axis(), state.ring_rotation),
            Vec3::repeat(placement.scale * state.ring_scale),
        )
    }

    /// Install `model` as the displayed ring
    ///
    /// Resolves against the last catalogue right away so the following clone
    /// refresh builds the new base while the ring is still hidden.
    fn swap_ring_model(&mut self, model: String) {
        log::debug!("Swapping ring model {} -> {model}", self.active_ring_model);
        self.active_ring_model = model;
        if self.catalogue.is_some() {
            self.resolve_active_ring();
        } else {
            log::debug!("No ring catalogue yet, {} resolves when it arrives", self.active_ring_model);
        }
    }

    fn apply_catalogue(&mut self, data: RingConfigData) {
        self.catalogue = Some(data);
        self.resolve_active_ring();
    }

    fn resolve_active_ring(&mut self) {
        let Some(data) = self.catalogue.as_ref() else {
            return;
        };
        self.ring = data
            .resolve(&self.active_ring_model, &self.config.assets.fallback_ring_model)
            .cloned();
        self.config_resolved = true;
        self.env_map_url.clone_from(&data.diamond_env_map_url);

        self.preload_queue.clear();
        if let Some(ring) = self.ring.as_ref().filter(|r| r.has_heads()) {
            self.preload_queue.extend(ring.head_urls().map(str::to_string));
        }
    }

    fn refresh_clones<H: RenderHost>(&mut self, host: &mut H) {
        let base_url = self
            .ring
            .as_ref()
            .map_or(self.config.assets.base_ring_url.as_str(), |r| r.base_ring_url.as_str())
            .to_string();
        let base_handle = self.assets.load(&base_url);
        Self::replace_clone(&mut self.base, base_handle.as_ref(), &self.props.metal, &self.config, host);

        let head_url = self
            .ring
            .as_ref()
            .and_then(|r| r.head_url(&self.props.diamond_shape, &self.config.assets.fallback_head_shape))
            .map(str::to_string);
        let head_handle = match head_url {
            Some(url) => self.assets.load_if(&url, self.config_resolved),
            None => None,
        };
        Self::replace_clone(&mut self.head, head_handle.as_ref(), &self.props.metal, &self.config, host);
    }

    fn replace_clone<H: RenderHost>(
        slot: &mut Option<SceneClone>,
        handle: Option<&AssetHandle>,
        metal: &str,
        config: &ConfiguratorConfig,
        host: &mut H,
    ) {
        let up_to_date = match (slot.as_ref(), handle) {
            (Some(clone), Some(handle)) => clone.is_current(handle, metal),
            (None, None) => true,
            _ => false,
        };
        if up_to_date {
            return;
        }
        if let Some(old) = slot.take() {
            old.dispose(host);
        }
        if let Some(handle) = handle {
            let color = config.metals.color_for(metal);
            *slot = Some(SceneClone::build(
                handle,
                metal,
                color,
                &config.gems,
                &config.metals.pbr,
                host,
            ));
        }
    }
}

impl<A, C, L> Drop for RingComposer<A, C, L> {
    fn drop(&mut self) {
        let leaked = usize::from(self.base.is_some()) + usize::from(self.head.is_some());
        if leaked > 0 {
            log::warn!("Ring composer dropped without unmount, {leaked} clones were not disposed");
        }
    }
}
