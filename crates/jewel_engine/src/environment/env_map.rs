//! Environment map loader state machine

use std::sync::Arc;

use crossbeam_channel::{Receiver, TryRecvError};
use thiserror::Error;

use crate::assets::{TextureData, TextureLoader, TextureReply};
use crate::core::config::{DeviceTier, DeviceTierProfile};
use crate::core::host::{RenderHost, TextureCapabilities};
use crate::foundation::collections::TextureId;
use crate::foundation::time::Millis;

/// How the texture is projected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureMapping {
    /// Latitude/longitude panorama used as a reflection probe
    EquirectangularReflection,
}

/// Texture filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    /// Bilinear
    Linear,
    /// Trilinear across mip levels
    LinearMipmapLinear,
}

/// Texture decoding color space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    /// Perceptual, color managed
    Srgb,
    /// No conversion
    Linear,
}

/// Texture configuration that the backend cannot honor
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TextureConfigError {
    /// sRGB decoding requested but not available
    #[error("sRGB texture decoding is not supported")]
    UnsupportedColorSpace,
    /// Backend reports no anisotropic filtering levels at all
    #[error("Anisotropic filtering is not supported")]
    UnsupportedAnisotropy,
}

/// Sampler and upload settings of the environment texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingSettings {
    /// Projection
    pub mapping: TextureMapping,
    /// Build a mip chain on upload
    pub generate_mipmaps: bool,
    /// Minification filter
    pub min_filter: FilterMode,
    /// Magnification filter
    pub mag_filter: FilterMode,
    /// Anisotropic filtering level
    pub anisotropy: u16,
    /// Decoding color space
    pub color_space: ColorSpace,
}

impl SamplingSettings {
    /// Reflection-probe settings for the given backend
    ///
    /// Asks for the maximum anisotropy and sRGB decoding; either one falls
    /// back to the plain setting with a warning when unsupported.
    pub fn for_reflection(caps: TextureCapabilities) -> Self {
        let anisotropy = Self::anisotropy(caps).unwrap_or_else(|e| {
            log::warn!("{e}, using no anisotropic filtering");
            1
        });
        let color_space = Self::color_space(caps).unwrap_or_else(|e| {
            log::warn!("{e}, falling back to linear decoding");
            ColorSpace::Linear
        });
        Self {
            mapping: TextureMapping::EquirectangularReflection,
            generate_mipmaps: true,
            min_filter: FilterMode::LinearMipmapLinear,
            mag_filter: FilterMode::Linear,
            anisotropy,
            color_space,
        }
    }

    fn anisotropy(caps: TextureCapabilities) -> Result<u16, TextureConfigError> {
        if caps.max_anisotropy == 0 {
            Err(TextureConfigError::UnsupportedAnisotropy)
        } else {
            Ok(caps.max_anisotropy)
        }
    }

    fn color_space(caps: TextureCapabilities) -> Result<ColorSpace, TextureConfigError> {
        if caps.supports_srgb {
            Ok(ColorSpace::Srgb)
        } else {
            Err(TextureConfigError::UnsupportedColorSpace)
        }
    }
}

/// A loaded, configured environment texture
#[derive(Debug)]
pub struct EnvironmentTexture {
    /// GPU texture identity
    pub id: TextureId,
    /// Sampler settings the host must apply on upload
    pub sampling: SamplingSettings,
    /// Decoded image
    pub data: TextureData,
}

impl EnvironmentTexture {
    /// Source URL
    pub fn url(&self) -> &str {
        &self.data.url
    }
}

enum LoadState {
    Inactive,
    Deferred { deadline: Millis },
    Loading { generation: u64, rx: Receiver<TextureReply> },
    Ready,
    Failed,
}

/// Loads and owns the environment texture
///
/// Every restart bumps a generation counter. A reply is installed only if it
/// belongs to the current generation, and the receiver of a superseded load
/// is dropped, so a late completion can never reach a torn-down consumer.
pub struct EnvironmentMapLoader<L> {
    loader: L,
    source: Option<(String, DeviceTier)>,
    state: LoadState,
    generation: u64,
    current: Option<Arc<EnvironmentTexture>>,
}

impl<L: TextureLoader> EnvironmentMapLoader<L> {
    /// Create an idle loader
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            source: None,
            state: LoadState::Inactive,
            generation: 0,
            current: None,
        }
    }

    /// Current texture, `None` until loaded or after a failure
    pub fn current(&self) -> Option<&Arc<EnvironmentTexture>> {
        self.current.as_ref()
    }

    /// Whether a load is deferred or in flight
    pub fn is_pending(&self) -> bool {
        matches!(self.state, LoadState::Deferred { .. } | LoadState::Loading { .. })
    }

    /// Whether the last load failed
    pub fn has_failed(&self) -> bool {
        matches!(self.state, LoadState::Failed)
    }

    /// Point the loader at `url` for the given tier
    ///
    /// Does nothing when neither changed. Otherwise cancels whatever is
    /// pending, disposes the current texture and starts over. Returns whether
    /// a restart happened.
    pub fn set_source<H: RenderHost>(
        &mut self,
        url: &str,
        tier: DeviceTier,
        profile: &DeviceTierProfile,
        now: Millis,
        host: &mut H,
    ) -> bool {
        if self.source.as_ref().is_some_and(|(u, t)| u == url && *t == tier) {
            return false;
        }
        self.release(host);
        self.source = Some((url.to_string(), tier));

        if profile.defer_environment_map && host.idle_callbacks_supported() {
            log::debug!("Deferring environment map {url} until idle (max {} ms)", profile.idle_timeout_ms);
            self.state = LoadState::Deferred {
                deadline: now + profile.idle_timeout_ms,
            };
        } else {
            self.start_load();
        }
        true
    }

    /// Advance deferred and in-flight loads
    ///
    /// Returns whether a new texture was installed.
    pub fn poll<H: RenderHost>(&mut self, now: Millis, host: &mut H) -> bool {
        match std::mem::replace(&mut self.state, LoadState::Inactive) {
            LoadState::Deferred { deadline } => {
                if host.has_idle_capacity() || now >= deadline {
                    self.start_load();
                } else {
                    self.state = LoadState::Deferred { deadline };
                }
                false
            }
            LoadState::Loading { generation, rx } => match rx.try_recv() {
                Ok(reply) => self.finish(generation, reply, host.texture_capabilities()),
                Err(TryRecvError::Empty) => {
                    self.state = LoadState::Loading { generation, rx };
                    false
                }
                Err(TryRecvError::Disconnected) => {
                    log::warn!("Environment map loader went away before replying");
                    self.state = LoadState::Failed;
                    false
                }
            },
            other => {
                self.state = other;
                false
            }
        }
    }

    /// Cancel everything and dispose the current texture
    pub fn teardown<H: RenderHost>(&mut self, host: &mut H) {
        self.release(host);
        self.source = None;
    }

    fn release<H: RenderHost>(&mut self, host: &mut H) {
        self.generation += 1;
        self.state = LoadState::Inactive;
        if let Some(texture) = self.current.take() {
            log::debug!("Disposing environment map {}", texture.url());
            host.dispose_texture(texture.id);
        }
    }

    fn start_load(&mut self) {
        let Some((url, _)) = self.source.as_ref() else {
            return;
        };
        log::info!("Loading environment map {url}");
        self.state = LoadState::Loading {
            generation: self.generation,
            rx: self.loader.request(url),
        };
    }

    fn finish(&mut self, generation: u64, reply: TextureReply, caps: TextureCapabilities) -> bool {
        if generation != self.generation {
            return false;
        }
        match reply {
            Ok(data) => {
                let texture = EnvironmentTexture {
                    id: TextureId::fresh(),
                    sampling: SamplingSettings::for_reflection(caps),
                    data,
                };
                log::info!(
                    "Environment map {} ready ({}x{}, {:?})",
                    texture.url(),
                    texture.data.width,
                    texture.data.height,
                    texture.sampling.color_space
                );
                self.current = Some(Arc::new(texture));
                self.state = LoadState::Ready;
                true
            }
            Err(e) => {
                log::warn!("Environment map failed to load: {e}");
                self.state = LoadState::Failed;
                false
            }
        }
    }
}
