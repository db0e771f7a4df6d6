//! Ring catalogue data and its source

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::Config;

/// Assets of one ring model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingConfig {
    /// Base (band) model URL
    pub base_ring_url: String,
    /// Head model URL per diamond shape; absent for rings without heads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heads: Option<BTreeMap<String, String>>,
}

impl RingConfig {
    /// A ring without heads
    pub fn new(base_ring_url: impl Into<String>) -> Self {
        Self {
            base_ring_url: base_ring_url.into(),
            heads: None,
        }
    }

    /// Builder: add a head model for a shape
    pub fn with_head(mut self, shape: impl Into<String>, url: impl Into<String>) -> Self {
        self.heads.get_or_insert_with(BTreeMap::new).insert(shape.into(), url.into());
        self
    }

    /// Whether the ring has at least one head model
    pub fn has_heads(&self) -> bool {
        self.heads.as_ref().is_some_and(|h| !h.is_empty())
    }

    /// Head URL for a diamond shape
    ///
    /// Tries the exact key, then a case-insensitive match, then the
    /// `fallback_shape` head. `None` when the ring has no heads.
    pub fn head_url(&self, shape: &str, fallback_shape: &str) -> Option<&str> {
        let heads = self.heads.as_ref().filter(|h| !h.is_empty())?;
        heads
            .get(shape)
            .or_else(|| heads.iter().find(|(k, _)| k.eq_ignore_ascii_case(shape)).map(|(_, v)| v))
            .or_else(|| heads.get(fallback_shape))
            .map(String::as_str)
    }

    /// Every head URL, for preloading
    pub fn head_urls(&self) -> impl Iterator<Item = &str> {
        self.heads.iter().flat_map(|h| h.values().map(String::as_str))
    }
}

/// The whole ring catalogue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RingConfigData {
    /// Ring models by identifier
    pub rings: BTreeMap<String, RingConfig>,
    /// Environment map used for gem reflections
    pub diamond_env_map_url: String,
}

impl Default for RingConfigData {
    fn default() -> Self {
        Self {
            rings: BTreeMap::new(),
            diamond_env_map_url: "/assets/diamond/gem.exr".to_string(),
        }
    }
}

impl RingConfigData {
    /// Builder: add a ring model
    pub fn with_ring(mut self, id: impl Into<String>, ring: RingConfig) -> Self {
        self.rings.insert(id.into(), ring);
        self
    }

    /// Config for `model`, falling back to the `fallback_model` entry
    pub fn resolve(&self, model: &str, fallback_model: &str) -> Option<&RingConfig> {
        if let Some(ring) = self.rings.get(model) {
            return Some(ring);
        }
        let fallback = self.rings.get(fallback_model);
        if fallback.is_some() {
            log::warn!("Unknown ring model '{model}', using '{fallback_model}'");
        } else {
            log::warn!("Unknown ring model '{model}' and no '{fallback_model}' fallback");
        }
        fallback
    }
}

impl Config for RingConfigData {}

/// Asynchronous provider of the ring catalogue
pub trait RingConfigSource {
    /// Request the catalogue; later calls to [`RingConfigSource::poll_config`]
    /// deliver it
    fn request(&mut self);

    /// The catalogue once it has resolved, `None` while pending
    fn poll_config(&mut self) -> Option<RingConfigData>;
}

/// Source that resolves after a fixed number of polls
#[derive(Debug, Clone)]
pub struct StaticRingConfigSource {
    data: RingConfigData,
    latency_polls: u32,
    remaining: Option<u32>,
}

impl StaticRingConfigSource {
    /// Resolves on the first poll after a request
    pub fn new(data: RingConfigData) -> Self {
        Self::with_latency(data, 0)
    }

    /// Resolves after `latency_polls` pending polls
    pub fn with_latency(data: RingConfigData, latency_polls: u32) -> Self {
        Self {
            data,
            latency_polls,
            remaining: None,
        }
    }

    /// Replace the catalogue served to later requests
    pub fn set_data(&mut self, data: RingConfigData) {
        self.data = data;
    }
}

impl RingConfigSource for StaticRingConfigSource {
    fn request(&mut self) {
        self.remaining = Some(self.latency_polls);
    }

    fn poll_config(&mut self) -> Option<RingConfigData> {
        match self.remaining {
            Some(0) => {
                self.remaining = None;
                Some(self.data.clone())
            }
            Some(n) => {
                self.remaining = Some(n - 1);
                None
            }
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigFormat;

    fn catalogue() -> RingConfigData {
        RingConfigData::default()
            .with_ring("ring", RingConfig::new("/ring.glb"))
            .with_ring(
                "solitaire",
                RingConfig::new("/solitaire.glb")
                    .with_head("round", "/heads/round.glb")
                    .with_head("Oval", "/heads/oval.glb"),
            )
    }

    #[test]
    fn test_resolve_falls_back_to_default_ring() {
        let data = catalogue();
        assert_eq!(data.resolve("solitaire", "ring").unwrap().base_ring_url, "/solitaire.glb");
        assert_eq!(data.resolve("mystery", "ring").unwrap().base_ring_url, "/ring.glb");
        assert!(RingConfigData::default().resolve("mystery", "ring").is_none());
    }

    #[test]
    fn test_head_url_lookup_order() {
        let data = catalogue();
        let ring = data.resolve("solitaire", "ring").unwrap();
        assert!(ring.has_heads());
        assert_eq!(ring.head_url("round", "round"), Some("/heads/round.glb"));
        assert_eq!(ring.head_url("oval", "round"), Some("/heads/oval.glb"));
        assert_eq!(ring.head_url("princess", "round"), Some("/heads/round.glb"));

        let plain = data.resolve("ring", "ring").unwrap();
        assert!(!plain.has_heads());
        assert_eq!(plain.head_url("round", "round"), None);
    }

    #[test]
    fn test_empty_head_map_means_no_heads() {
        let ring = RingConfig {
            base_ring_url: "/x.glb".into(),
            heads: Some(BTreeMap::new()),
        };
        assert!(!ring.has_heads());
    }

    #[test]
    fn test_catalogue_parses_from_toml() {
        let text = r#"
            diamond_env_map_url = "/env/studio.hdr"

            [rings.ring]
            base_ring_url = "/ring.glb"

            [rings.halo]
            base_ring_url = "/halo.glb"
            heads = { round = "/heads/halo-round.glb" }
        "#;
        let data = RingConfigData::from_str_with_format(text, ConfigFormat::Toml).unwrap();
        assert_eq!(data.diamond_env_map_url, "/env/studio.hdr");
        assert!(data.rings["halo"].has_heads());
        assert!(!data.rings["ring"].has_heads());
    }

    #[test]
    fn test_static_source_latency() {
        let mut source = StaticRingConfigSource::with_latency(catalogue(), 2);
        assert!(source.poll_config().is_none());
        source.request();
        assert!(source.poll_config().is_none());
        assert!(source.poll_config().is_none());
        assert!(source.poll_config().is_some());
        assert!(source.poll_config().is_none());
    }
}
