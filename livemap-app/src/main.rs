use anyhow::Context;
use livemap::core::geo::normalize_lon;
use livemap::{
    Geographic, HttpTileFetcher, LiveMap, LiveMapBuilder, LiveMapConfig, QuadKey, QuadKeyUrlSource,
    TileFetcher, Vec2,
};
use std::sync::Arc;
use std::time::Duration;

/// Frame interval of the simulated animation loop
const FRAME: Duration = Duration::from_millis(16);

/// Stand-in tile server producing a few bytes per quad after a short delay
struct SyntheticFetcher {
    latency: Duration,
}

#[async_trait::async_trait]
impl TileFetcher for SyntheticFetcher {
    async fn fetch(&self, quad: &QuadKey) -> livemap::Result<Vec<u8>> {
        tokio::time::sleep(self.latency).await;
        // Deep southern quads have no data
        if quad.zoom() > 4 && quad.as_str().starts_with("33") {
            return Ok(Vec::new());
        }
        Ok(quad.as_str().as_bytes().to_vec())
    }
}

/// One step of the scripted camera path
struct Waypoint {
    lon: f64,
    lat: f64,
    zoom: u32,
    frames: u32,
}

const PATH: &[Waypoint] = &[
    Waypoint { lon: 0.0, lat: 20.0, zoom: 2, frames: 30 },
    Waypoint { lon: -74.0, lat: 40.7, zoom: 6, frames: 60 },
    Waypoint { lon: -30.0, lat: 45.0, zoom: 5, frames: 60 },
    Waypoint { lon: 2.35, lat: 48.85, zoom: 8, frames: 60 },
    Waypoint { lon: 179.0, lat: -17.0, zoom: 4, frames: 60 },
    Waypoint { lon: -179.0, lat: -17.0, zoom: 4, frames: 30 },
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => LiveMapConfig::from_json_file(&path)
            .with_context(|| format!("loading configuration from {path}"))?,
        None => LiveMapConfig::default(),
    };

    let fetcher: Arc<dyn TileFetcher> = match std::env::var("LIVEMAP_TILE_URL") {
        Ok(template) => {
            log::info!("fetching tiles from {template}");
            let client = HttpTileFetcher::build_client("livemap-app/0.1")?;
            Arc::new(HttpTileFetcher::new(client, Arc::new(QuadKeyUrlSource::new(template))))
        }
        Err(_) => Arc::new(SyntheticFetcher {
            latency: Duration::from_millis(40),
        }),
    };

    let mut map = LiveMapBuilder::from_config(config)
        .with_fetcher(tokio::runtime::Handle::current(), fetcher)
        .build()
        .context("building the live map")?;

    tokio::select! {
        result = run_path(&mut map) => result?,
        _ = tokio::signal::ctrl_c() => log::info!("interrupted"),
    }

    println!(
        "frames: {}, cached tiles: {}, empty quads: {}, pending: {}",
        map.frame(),
        map.tiles().len(),
        map.fragments().fragment_count(map.region()),
        map.pending_requests()
    );
    Ok(())
}

/// Point a fraction `t` of the way from `from` to `to`, crossing the
/// antimeridian when that is the shorter way
fn glide(from: Vec2<Geographic>, to: Vec2<Geographic>, t: f64) -> Vec2<Geographic> {
    let lon_delta = normalize_lon(to.x - from.x);
    Vec2::new(
        normalize_lon(from.x + lon_delta * t),
        from.y + (to.y - from.y) * t,
    )
}

/// Glides between waypoints, ticking the map once per frame
async fn run_path(map: &mut LiveMap) -> anyhow::Result<()> {
    let mut interval = tokio::time::interval(FRAME);
    let mut from = map.center().unwrap_or_default();

    for waypoint in PATH {
        let to = Vec2::new(waypoint.lon, waypoint.lat);
        map.viewport_mut().set_zoom(waypoint.zoom);

        for frame in 1..=waypoint.frames {
            interval.tick().await;
            let t = f64::from(frame) / f64::from(waypoint.frames);
            map.set_center(glide(from, to, t))?;

            let report = map.tick();
            if report.failures > 0 {
                log::warn!("frame {}: {} tiles failed", report.frame, report.failures);
            }
        }
        log::info!(
            "reached ({}, {}) at zoom {}: {} quads referenced, {} cached",
            waypoint.lon,
            waypoint.lat,
            waypoint.zoom,
            map.grid().quads().len(),
            map.tiles().len()
        );
        from = to;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glide_crosses_the_antimeridian() {
        let from = Vec2::new(179.0, -17.0);
        let to = Vec2::new(-179.0, -17.0);
        let halfway = glide(from, to, 0.5);
        assert!(halfway.x.abs() > 179.9, "{halfway:?}");
        let end = glide(from, to, 1.0);
        assert!((end.x + 179.0).abs() < 1e-9);
    }

    #[test]
    fn test_glide_within_a_hemisphere() {
        let point = glide(Vec2::new(-74.0, 40.0), Vec2::new(-30.0, 50.0), 0.5);
        assert!((point.x + 52.0).abs() < 1e-9);
        assert!((point.y - 45.0).abs() < 1e-9);
    }
}
