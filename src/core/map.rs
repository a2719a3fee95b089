//! Per-frame driver tying the viewport, grid diff, tile requests and caches
//! together.

use crate::core::geo::GeoRectangle;
use crate::core::geometry::{Geographic, Rect, Vec2, World};
use crate::core::viewport::Viewport;
use crate::projections::MapProjection;
use crate::tiles::cache::TileCache;
use crate::tiles::fragments::EmptyFragmentsCache;
use crate::tiles::grid::{update_grid, ViewportGridState};
use crate::tiles::quad_key::QuadKey;
use crate::tiles::requester::TileRequester;
use crate::{MapError, Result};
use fxhash::FxHashSet;
use std::sync::Arc;

/// What one call to [`LiveMap::tick`] did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub frame: u64,
    pub cells_loaded: usize,
    pub cells_removed: usize,
    /// Quads handed to the requester this frame
    pub quads_requested: usize,
    /// Newly needed quads already in the tile cache or known empty
    pub quads_reused: usize,
    pub quads_released: usize,
    /// Referenced quads fetched again after the tile cache evicted them
    pub quads_refetched: usize,
    pub tiles_received: usize,
    pub empty_fragments: usize,
    /// Completions for quads no longer referenced
    pub stale_discarded: usize,
    pub failures: usize,
}

/// The interactive map core.
///
/// Single-threaded: the embedding application calls [`LiveMap::tick`] once
/// per animation frame after adjusting the viewport. Tile loading happens
/// behind the [`TileRequester`] and its results are only ever observed here.
pub struct LiveMap {
    viewport: Viewport,
    projection: MapProjection,
    grid: ViewportGridState,
    requester: Box<dyn TileRequester>,
    tiles: TileCache,
    fragments: EmptyFragmentsCache,
    /// Key under which empty quads are remembered
    region: String,
    /// Quads handed to the requester and not yet completed or cancelled
    requested: FxHashSet<QuadKey>,
    /// Referenced quads whose last load failed; retried once re-referenced
    failed: FxHashSet<QuadKey>,
    frame: u64,
}

impl LiveMap {
    pub fn new(
        viewport: Viewport,
        projection: MapProjection,
        requester: Box<dyn TileRequester>,
        tiles: TileCache,
        fragments: EmptyFragmentsCache,
        region: impl Into<String>,
    ) -> Self {
        Self {
            viewport,
            projection,
            grid: ViewportGridState::new(),
            requester,
            tiles,
            fragments,
            region: region.into(),
            requested: FxHashSet::default(),
            failed: FxHashSet::default(),
            frame: 0,
        }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn projection(&self) -> &MapProjection {
        &self.projection
    }

    pub fn grid(&self) -> &ViewportGridState {
        &self.grid
    }

    pub fn tiles(&self) -> &TileCache {
        &self.tiles
    }

    pub fn fragments(&self) -> &EmptyFragmentsCache {
        &self.fragments
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn pending_requests(&self) -> usize {
        self.requester.pending()
    }

    /// Payload of a referenced quad, if it has arrived
    pub fn tile(&mut self, quad: &QuadKey) -> Option<Arc<Vec<u8>>> {
        self.tiles.get(quad)
    }

    /// Exact payload or the nearest cached ancestor standing in for it
    pub fn tile_or_donor(&mut self, quad: &QuadKey) -> Option<(QuadKey, Arc<Vec<u8>>)> {
        match self.tiles.get(quad) {
            Some(data) => Some((quad.clone(), data)),
            None => self.tiles.donor_for(quad),
        }
    }

    /// Centres the map on a longitude/latitude point
    pub fn set_center(&mut self, lon_lat: Vec2<Geographic>) -> Result<()> {
        let position = self.projection.project(lon_lat).ok_or_else(|| {
            MapError::Projection(format!("cannot project {lon_lat:?}"))
        })?;
        self.viewport.set_position(position);
        Ok(())
    }

    /// Longitude/latitude at the viewport centre, when it is on the globe
    pub fn center(&self) -> Option<Vec2<Geographic>> {
        self.projection.invert(self.viewport.position())
    }

    /// Picks the deepest zoom whose window still shows all of `rect` and
    /// centres on it
    pub fn fit_rectangle(&mut self, rect: &GeoRectangle) -> Result<()> {
        let pieces: Vec<Rect<World>> = rect
            .split_by_antimeridian()
            .iter()
            .filter_map(|piece| self.projection.project_rect(piece))
            .collect();
        if pieces.is_empty() {
            return Err(MapError::Projection(format!(
                "rectangle {rect:?} is outside the projection"
            )));
        }

        let bbox = self.viewport.helper().calculate_bounding_box(&pieces)?;
        let size = self.viewport.size();
        let zoom = (self.viewport.min_zoom()..=self.viewport.max_zoom())
            .rev()
            .find(|&z| {
                let scale = f64::from(1u32 << z.min(31));
                bbox.width() * scale <= size.x && bbox.height() * scale <= size.y
            })
            .unwrap_or(self.viewport.min_zoom());

        log::debug!("fit {rect:?}: world bbox {bbox:?}, zoom {zoom}");
        self.viewport.set_zoom(zoom);
        self.viewport.set_position(bbox.center());
        Ok(())
    }

    /// Runs one frame: diff the visible cells, release and request quads,
    /// then take in whatever loads have finished.
    pub fn tick(&mut self) -> TickReport {
        self.frame += 1;
        let mut report = TickReport {
            frame: self.frame,
            ..TickReport::default()
        };

        let visible = self.viewport.visible_cells();
        self.grid = update_grid(std::mem::take(&mut self.grid), &visible, &self.projection);
        report.cells_loaded = self.grid.cells_to_load().len();
        report.cells_removed = self.grid.cells_to_remove().len();

        for quad in self.grid.quads_to_remove() {
            if self.requested.remove(quad) {
                self.requester.cancel(quad);
            }
            self.failed.remove(quad);
            report.quads_released += 1;
        }

        let mut to_request: Vec<&QuadKey> = self.grid.quads_to_load().iter().collect();
        to_request.sort();
        for quad in to_request {
            if self.tiles.contains(quad) || self.fragments.is_empty_fragment(&self.region, quad) {
                report.quads_reused += 1;
            } else {
                self.requester.request(quad);
                self.requested.insert(quad.clone());
                report.quads_requested += 1;
            }
        }

        for result in self.requester.poll_completed() {
            self.requested.remove(&result.quad);
            if !self.grid.contains_quad(&result.quad) {
                log::debug!("discarding stale tile {}", result.quad);
                report.stale_discarded += 1;
                continue;
            }
            match result.data {
                Ok(data) if data.is_empty() => {
                    self.fragments.mark_empty(&self.region, result.quad);
                    report.empty_fragments += 1;
                }
                Ok(data) => {
                    self.tiles.put(result.quad, data);
                    report.tiles_received += 1;
                }
                Err(e) => {
                    log::warn!("tile {} failed: {}", result.quad, e);
                    self.failed.insert(result.quad);
                    report.failures += 1;
                }
            }
        }

        report.quads_refetched = self.refetch_evicted();

        if report.quads_requested + report.quads_refetched + report.quads_released + report.tiles_received
            > 0
        {
            log::debug!("{report:?}");
        }
        report
    }

    /// Requests referenced quads that are neither cached, known empty, in
    /// flight nor failed. The tile cache can evict a quad while cells still
    /// reference it; without this it would never load again.
    fn refetch_evicted(&mut self) -> usize {
        let mut missing: Vec<QuadKey> = self
            .grid
            .quads()
            .keys()
            .filter(|quad| {
                !self.tiles.contains(quad)
                    && !self.requested.contains(*quad)
                    && !self.failed.contains(*quad)
                    && !self.fragments.is_empty_fragment(&self.region, quad)
            })
            .cloned()
            .collect();
        if missing.is_empty() {
            return 0;
        }

        missing.sort();
        if self.grid.quads().len() > self.tiles.capacity() {
            log::warn!(
                "{} referenced quads exceed the tile cache capacity of {}",
                self.grid.quads().len(),
                self.tiles.capacity()
            );
        }
        for quad in &missing {
            log::debug!("refetching evicted tile {quad}");
            self.requester.request(quad);
        }
        let count = missing.len();
        self.requested.extend(missing);
        count
    }
}

impl std::fmt::Debug for LiveMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveMap")
            .field("frame", &self.frame)
            .field("viewport", &self.viewport)
            .field("referenced_quads", &self.grid.quads().len())
            .field("cached_tiles", &self.tiles.len())
            .field("pending_requests", &self.requester.pending())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constants::WORLD_RECT;
    use crate::core::geometry::Client;
    use crate::core::viewport_helper::ViewportHelper;
    use crate::projections::ProjectionType;
    use crate::tiles::requester::TileResult;
    use fxhash::FxHashSet;
    use std::sync::Mutex;

    /// Completes every request on the next poll with the quad key as payload
    #[derive(Default)]
    struct Immediate {
        queued: Vec<QuadKey>,
        cancelled: Arc<Mutex<FxHashSet<QuadKey>>>,
    }

    impl TileRequester for Immediate {
        fn request(&mut self, quad: &QuadKey) {
            self.queued.push(quad.clone());
        }

        fn cancel(&mut self, quad: &QuadKey) {
            self.cancelled.lock().unwrap().insert(quad.clone());
        }

        fn poll_completed(&mut self) -> Vec<TileResult> {
            self.queued
                .drain(..)
                .map(|quad| TileResult {
                    data: Ok(Arc::new(quad.as_str().as_bytes().to_vec())),
                    quad,
                })
                .collect()
        }

        fn pending(&self) -> usize {
            self.queued.len()
        }
    }

    fn live_map(requester: Immediate) -> LiveMap {
        live_map_with_cache(requester, TileCache::new(64))
    }

    fn live_map_with_cache(requester: Immediate, tiles: TileCache) -> LiveMap {
        let projection = MapProjection::create(ProjectionType::Mercator, WORLD_RECT).unwrap();
        let viewport = Viewport::new(
            ViewportHelper::new(WORLD_RECT, true, false),
            Vec2::<Client>::new(512.0, 512.0),
            1,
            10,
        );
        LiveMap::new(
            viewport,
            projection,
            Box::new(requester),
            tiles,
            EmptyFragmentsCache::default(),
            "base",
        )
    }

    #[test]
    fn test_first_tick_requests_and_receives() {
        let mut map = live_map(Immediate::default());
        let report = map.tick();
        assert_eq!(report.frame, 1);
        assert_eq!(report.cells_loaded, 4);
        assert!(report.quads_requested > 0);
        assert_eq!(report.tiles_received, report.quads_requested);
        assert_eq!(map.tiles().len(), report.tiles_received);

        let idle = map.tick();
        assert_eq!(idle.cells_loaded, 0);
        assert_eq!(idle.quads_requested, 0);
        assert_eq!(idle.quads_refetched, 0);
    }

    #[test]
    fn test_evicted_referenced_tiles_are_fetched_again() {
        let mut map = live_map_with_cache(Immediate::default(), TileCache::new(2));
        for _ in 0..3 {
            let report = map.tick();
            assert_eq!(report.quads_refetched, 2, "{report:?}");

            let referenced: Vec<QuadKey> = map.grid().quads().keys().cloned().collect();
            assert_eq!(referenced.len(), 4);
            let missing = referenced
                .iter()
                .filter(|quad| !map.tiles().contains(quad))
                .count();
            assert_eq!(missing, map.pending_requests());
        }
    }

    #[test]
    fn test_failed_tiles_are_not_refetched_every_frame() {
        struct Failing(Vec<QuadKey>);

        impl TileRequester for Failing {
            fn request(&mut self, quad: &QuadKey) {
                self.0.push(quad.clone());
            }
            fn cancel(&mut self, _quad: &QuadKey) {}
            fn poll_completed(&mut self) -> Vec<TileResult> {
                self.0
                    .drain(..)
                    .map(|quad| TileResult {
                        quad,
                        data: Err(MapError::Network("HTTP 500".to_string())),
                    })
                    .collect()
            }
            fn pending(&self) -> usize {
                self.0.len()
            }
        }

        let projection = MapProjection::create(ProjectionType::Mercator, WORLD_RECT).unwrap();
        let viewport = Viewport::new(
            ViewportHelper::new(WORLD_RECT, true, false),
            Vec2::<Client>::new(512.0, 512.0),
            1,
            10,
        );
        let mut map = LiveMap::new(
            viewport,
            projection,
            Box::new(Failing(Vec::new())),
            TileCache::new(64),
            EmptyFragmentsCache::default(),
            "base",
        );
        let first = map.tick();
        assert_eq!(first.failures, 4);
        let second = map.tick();
        assert_eq!(second.quads_refetched, 0);
        assert_eq!(map.pending_requests(), 0);
    }

    #[test]
    fn test_zooming_releases_quads() {
        let cancelled = Arc::new(Mutex::new(FxHashSet::default()));
        let mut map = live_map(Immediate {
            cancelled: Arc::clone(&cancelled),
            ..Default::default()
        });
        map.tick();
        map.viewport_mut().set_zoom(3);
        let report = map.tick();

        assert!(report.cells_removed > 0);
        assert!(report.quads_released > 0);
        assert_eq!(cancelled.lock().unwrap().len(), report.quads_released);
        for quad in cancelled.lock().unwrap().iter() {
            assert!(!map.grid().contains_quad(quad));
        }
    }

    #[test]
    fn test_fit_rectangle_across_antimeridian() {
        let mut map = live_map(Immediate::default());
        let rect = GeoRectangle::new(170.0, -20.0, -170.0, 0.0).unwrap();
        map.fit_rectangle(&rect).unwrap();

        let center = map.center().unwrap();
        assert!(center.x.abs() > 179.0, "center {center:?}");
        assert!(map.viewport().zoom() > 1);
        let window = map.viewport().window();
        assert!(window.width() >= 256.0 * 20.0 / 360.0);
    }

    #[test]
    fn test_set_center() {
        let mut map = live_map(Immediate::default());
        map.set_center(Vec2::new(0.0, 0.0)).unwrap();
        let position = map.viewport().position();
        assert!((position.x - 128.0).abs() < 1e-9 && (position.y - 128.0).abs() < 1e-9);
        assert!(map.set_center(Vec2::new(0.0, 90.0)).is_err());
    }
}
