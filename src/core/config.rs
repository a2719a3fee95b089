//! Configuration for tile loading, caching and viewport limits
//!
//! Like the rest of the engine, configuration is resolved once at startup:
//! pick a preset profile or deserialize a (possibly partial) JSON document,
//! then hand the resolved values to [`crate::LiveMapBuilder`]. The core uses
//! the numeric limits as given and does not re-validate them later.

use crate::core::constants::{
    DEFAULT_MAX_ZOOM, DEFAULT_MIN_ZOOM, DEFAULT_TILE_CACHE_CAPACITY, EMPTY_FRAGMENTS_CACHE_LIMIT,
    REGIONS_CACHE_LIMIT,
};
use crate::projections::ProjectionType;
use crate::{MapError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum LiveMapProfile {
    Balanced,
    LowMemory,
    HighThroughput,
    Custom(LiveMapConfig),
}

impl LiveMapProfile {
    pub fn resolve(&self) -> LiveMapConfig {
        match self {
            Self::Balanced => LiveMapConfig {
                tile_loading: TileLoadingConfig::default(),
                viewport: ViewportConfig::default(),
                projection: ProjectionType::Mercator,
            },
            Self::LowMemory => LiveMapConfig {
                tile_loading: TileLoadingConfig {
                    tile_cache_capacity: 256,
                    max_concurrent_downloads: 2,
                    empty_fragments_cache_limit: 10_000,
                    regions_cache_limit: 1_000,
                    max_retries: 1,
                    retry_delay_ms: 250,
                    exponential_backoff: false,
                },
                viewport: ViewportConfig::default(),
                projection: ProjectionType::Mercator,
            },
            Self::HighThroughput => LiveMapConfig {
                tile_loading: TileLoadingConfig {
                    tile_cache_capacity: 4_096,
                    max_concurrent_downloads: 16,
                    empty_fragments_cache_limit: EMPTY_FRAGMENTS_CACHE_LIMIT,
                    regions_cache_limit: REGIONS_CACHE_LIMIT,
                    max_retries: 5,
                    retry_delay_ms: 100,
                    exponential_backoff: true,
                },
                viewport: ViewportConfig::default(),
                projection: ProjectionType::Mercator,
            },
            Self::Custom(config) => config.clone(),
        }
    }
}

impl Default for LiveMapProfile {
    fn default() -> Self {
        Self::Balanced
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveMapConfig {
    pub tile_loading: TileLoadingConfig,
    pub viewport: ViewportConfig,
    pub projection: ProjectionType,
}

impl Default for LiveMapConfig {
    fn default() -> Self {
        LiveMapProfile::default().resolve()
    }
}

impl LiveMapConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: LiveMapConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Rejects limits the engine cannot work with at all
    pub fn validate(&self) -> Result<()> {
        if self.viewport.min_zoom > self.viewport.max_zoom {
            return Err(MapError::Config(format!(
                "min_zoom {} exceeds max_zoom {}",
                self.viewport.min_zoom, self.viewport.max_zoom
            )));
        }
        if self.tile_loading.max_concurrent_downloads == 0 {
            return Err(MapError::Config(
                "max_concurrent_downloads must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileLoadingConfig {
    pub tile_cache_capacity: usize,
    pub max_concurrent_downloads: usize,
    pub empty_fragments_cache_limit: usize,
    pub regions_cache_limit: usize,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub exponential_backoff: bool,
}

impl TileLoadingConfig {
    /// Delay before retry number `attempt` (1-based)
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        let base = self.retry_delay_ms;
        if self.exponential_backoff {
            let factor = 1u64 << attempt.saturating_sub(1).min(16);
            Duration::from_millis(base.saturating_mul(factor))
        } else {
            Duration::from_millis(base)
        }
    }
}

impl Default for TileLoadingConfig {
    fn default() -> Self {
        Self {
            tile_cache_capacity: DEFAULT_TILE_CACHE_CAPACITY,
            max_concurrent_downloads: 6,
            empty_fragments_cache_limit: EMPTY_FRAGMENTS_CACHE_LIMIT,
            regions_cache_limit: REGIONS_CACHE_LIMIT,
            max_retries: 3,
            retry_delay_ms: 500,
            exponential_backoff: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub min_zoom: u32,
    pub max_zoom: u32,
    pub width: f64,
    pub height: f64,
    /// Vertical wraparound; horizontal wraparound follows the projection
    pub loop_y: bool,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
            width: 800.0,
            height: 600.0,
            loop_y: false,
        }
    }
}
