//! Frame loop scenarios driving a LiveMap with background loading

mod common;

use common::{init_logging, MemoryFetcher};
use livemap::{
    GeoRectangle, LiveMap, LiveMapBuilder, LiveMapConfig, ProjectionType, TickReport, Vec2,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

fn build_map(fetcher: Arc<MemoryFetcher>, projection: ProjectionType) -> LiveMap {
    LiveMapBuilder::new()
        .with_projection(projection)
        .with_size(512.0, 512.0)
        .with_zoom_limits(1, 12)
        .with_fetcher(Handle::current(), fetcher)
        .build()
        .unwrap()
}

/// Ticks like an animation loop until nothing is pending
async fn settle(map: &mut LiveMap) -> Vec<TickReport> {
    let mut reports = vec![map.tick()];
    for _ in 0..400 {
        if map.pending_requests() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
        reports.push(map.tick());
    }
    reports
}

fn sum(reports: &[TickReport], field: fn(&TickReport) -> usize) -> usize {
    reports.iter().map(field).sum()
}

#[tokio::test]
async fn test_initial_view_loads_every_referenced_quad() {
    init_logging();
    let fetcher = Arc::new(MemoryFetcher::default());
    let mut map = build_map(fetcher.clone(), ProjectionType::Mercator);

    let reports = settle(&mut map).await;
    let referenced = map.grid().quads().len();

    assert!(referenced > 0);
    assert_eq!(sum(&reports, |r| r.quads_requested), referenced);
    assert_eq!(sum(&reports, |r| r.tiles_received), referenced);
    assert_eq!(map.tiles().len(), referenced);
    assert_eq!(sum(&reports, |r| r.failures), 0);
    for quad in map.grid().quads().keys().cloned().collect::<Vec<_>>() {
        assert!(map.tile(&quad).is_some(), "missing {quad}");
    }
}

#[tokio::test]
async fn test_empty_tiles_are_remembered() {
    init_logging();
    let fetcher = Arc::new(MemoryFetcher {
        empty_prefixes: vec!['3'],
        ..Default::default()
    });
    let mut map = build_map(fetcher.clone(), ProjectionType::Mercator);

    let reports = settle(&mut map).await;
    let empty = sum(&reports, |r| r.empty_fragments);
    assert!(empty > 0);
    assert_eq!(map.fragments().fragment_count(map.region()), empty);

    // Zoom in and back out: cached and empty quads are not fetched again
    let calls_before = fetcher.total_calls();
    let zoom = map.viewport().zoom();
    map.viewport_mut().set_zoom(zoom + 2);
    settle(&mut map).await;
    let calls_zoomed = fetcher.total_calls();
    map.viewport_mut().set_zoom(zoom);
    let back = settle(&mut map).await;

    assert!(calls_zoomed > calls_before);
    assert_eq!(fetcher.total_calls(), calls_zoomed);
    assert_eq!(sum(&back, |r| r.quads_requested), 0);
    assert_eq!(sum(&back, |r| r.quads_reused), map.grid().quads().len());
}

#[tokio::test]
async fn test_panning_releases_unseen_quads() {
    init_logging();
    let fetcher = Arc::new(MemoryFetcher::with_delay(Duration::from_millis(30)));
    let mut map = build_map(fetcher.clone(), ProjectionType::Mercator);
    map.viewport_mut().set_zoom(6);
    map.set_center(Vec2::new(-100.0, 40.0)).unwrap();
    settle(&mut map).await;
    let western = map.grid().quads().keys().cloned().collect::<Vec<_>>();

    map.set_center(Vec2::new(100.0, -40.0)).unwrap();
    let report = map.tick();
    assert!(report.cells_removed > 0);
    assert!(report.quads_released > 0);
    assert!(western.iter().all(|quad| !map.grid().contains_quad(quad)));

    let reports = settle(&mut map).await;
    assert_eq!(sum(&reports, |r| r.failures), 0);
    assert_eq!(map.pending_requests(), 0);
    assert!(map.grid().quads().keys().all(|q| map.tiles().contains(q)));
}

#[tokio::test]
async fn test_failed_tiles_are_reported() {
    init_logging();
    let fetcher = Arc::new(MemoryFetcher {
        failures: u32::MAX,
        ..Default::default()
    });
    let mut config = LiveMapConfig::default();
    config.tile_loading.max_retries = 1;
    config.tile_loading.retry_delay_ms = 1;
    let mut map = LiveMapBuilder::from_config(config)
        .with_size(256.0, 256.0)
        .with_zoom_limits(1, 4)
        .with_fetcher(Handle::current(), fetcher.clone())
        .build()
        .unwrap();

    let reports = settle(&mut map).await;
    let referenced = map.grid().quads().len();
    assert_eq!(sum(&reports, |r| r.failures), referenced);
    assert!(map.tiles().is_empty());
    assert_eq!(fetcher.total_calls() as usize, referenced * 2);
}

#[tokio::test]
async fn test_fit_rectangle_then_load() {
    init_logging();
    let fetcher = Arc::new(MemoryFetcher::default());
    let mut map = build_map(fetcher, ProjectionType::Geographic);

    let pacific = GeoRectangle::new(160.0, -30.0, -150.0, 10.0).unwrap();
    map.fit_rectangle(&pacific).unwrap();
    let center = map.center().unwrap();
    assert!(center.x.abs() > 170.0, "center {center:?}");

    settle(&mut map).await;
    assert!(!map.tiles().is_empty());
    assert_eq!(map.tiles().len(), map.grid().quads().len());
}

#[tokio::test]
async fn test_azimuthal_map_builds_and_loads() {
    init_logging();
    let fetcher = Arc::new(MemoryFetcher::default());
    let mut map = build_map(fetcher, ProjectionType::AzimuthalEqualArea);
    assert!(!map.viewport().helper().loop_x());

    settle(&mut map).await;
    assert_eq!(map.tiles().len(), map.grid().quads().len());
}
