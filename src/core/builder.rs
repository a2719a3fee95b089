//! Map builder for fluent API configuration
//!
//! [`LiveMapBuilder`] resolves a configuration profile, creates the map
//! projection over the world rectangle and wires the viewport, caches and
//! tile requester into a [`LiveMap`].

use crate::{
    core::{
        config::{LiveMapConfig, LiveMapProfile},
        constants::WORLD_RECT,
        geometry::{Client, Geographic, Vec2},
        map::LiveMap,
        viewport::Viewport,
        viewport_helper::ViewportHelper,
    },
    projections::{MapProjection, ProjectionType},
    tiles::{cache::TileCache, fragments::EmptyFragmentsCache, requester::TileRequester},
    MapError, Result,
};

/// Region name used for the empty-fragment memory of the base tile layer
pub const DEFAULT_REGION: &str = "base";

/// Builder for creating and configuring LiveMap instances
pub struct LiveMapBuilder {
    config: LiveMapConfig,
    requester: Option<Box<dyn TileRequester>>,
    /// Initial centre in longitude/latitude
    center: Option<Vec2<Geographic>>,
    zoom: Option<u32>,
    region: String,
}

impl LiveMapBuilder {
    /// Create a new builder with the balanced profile
    pub fn new() -> Self {
        Self::from_config(LiveMapConfig::default())
    }

    pub fn from_config(config: LiveMapConfig) -> Self {
        Self {
            config,
            requester: None,
            center: None,
            zoom: None,
            region: DEFAULT_REGION.to_string(),
        }
    }

    /// Replace the whole configuration with a profile's values
    pub fn with_profile(mut self, profile: LiveMapProfile) -> Self {
        self.config = profile.resolve();
        self
    }

    pub fn with_projection(mut self, projection: ProjectionType) -> Self {
        self.config.projection = projection;
        self
    }

    /// Viewport size in client pixels
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.config.viewport.width = width;
        self.config.viewport.height = height;
        self
    }

    pub fn with_zoom_limits(mut self, min_zoom: u32, max_zoom: u32) -> Self {
        self.config.viewport.min_zoom = min_zoom;
        self.config.viewport.max_zoom = max_zoom;
        self
    }

    pub fn with_loop_y(mut self, loop_y: bool) -> Self {
        self.config.viewport.loop_y = loop_y;
        self
    }

    /// Set the initial center and zoom level
    pub fn with_center_and_zoom(mut self, lon: f64, lat: f64, zoom: u32) -> Self {
        self.center = Some(Vec2::new(lon, lat));
        self.zoom = Some(zoom);
        self
    }

    pub fn with_requester(mut self, requester: Box<dyn TileRequester>) -> Self {
        self.requester = Some(requester);
        self
    }

    /// Fetch tiles on `runtime` through `fetcher`, using the tile loading
    /// limits of the current configuration
    #[cfg(feature = "tokio-runtime")]
    pub fn with_fetcher(
        mut self,
        runtime: tokio::runtime::Handle,
        fetcher: std::sync::Arc<dyn crate::tiles::loader::TileFetcher>,
    ) -> Self {
        let loader =
            crate::tiles::loader::TileLoader::new(runtime, fetcher, self.config.tile_loading.clone());
        self.requester = Some(Box::new(loader));
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn config(&self) -> &LiveMapConfig {
        &self.config
    }

    pub fn build(self) -> Result<LiveMap> {
        self.config.validate()?;
        let requester = self
            .requester
            .ok_or_else(|| MapError::Config("no tile requester configured".to_string()))?;

        let projection = MapProjection::create(self.config.projection, WORLD_RECT)?;
        let helper = ViewportHelper::new(WORLD_RECT, projection.cylindrical(), self.config.viewport.loop_y);
        let viewport_config = &self.config.viewport;
        let mut viewport = Viewport::new(
            helper,
            Vec2::<Client>::new(viewport_config.width, viewport_config.height),
            viewport_config.min_zoom,
            viewport_config.max_zoom,
        );
        if let Some(zoom) = self.zoom {
            viewport.set_zoom(zoom);
        }

        let tile_loading = &self.config.tile_loading;
        log::info!(
            "building live map: projection={}, zoom {}..={}, tile cache {}",
            self.config.projection,
            viewport_config.min_zoom,
            viewport_config.max_zoom,
            tile_loading.tile_cache_capacity
        );

        let mut map = LiveMap::new(
            viewport,
            projection,
            requester,
            TileCache::new(tile_loading.tile_cache_capacity),
            EmptyFragmentsCache::new(
                tile_loading.regions_cache_limit,
                tile_loading.empty_fragments_cache_limit,
            ),
            self.region,
        );
        if let Some(center) = self.center {
            map.set_center(center)?;
        }
        Ok(map)
    }
}

impl Default for LiveMapBuilder {
    fn default() -> Self {
        Self::new()
    }
}
