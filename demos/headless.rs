//! Fit a map to a region, let the tiles arrive, and print what was loaded.
//!
//! Run with `cargo run --example headless`.

use livemap::prelude::*;
use std::time::Duration;

/// Serves every quad from memory
struct InMemory;

#[async_trait::async_trait]
impl TileFetcher for InMemory {
    async fn fetch(&self, quad: &QuadKey) -> Result<Vec<u8>> {
        tokio::time::sleep(Duration::from_millis(10)).await;
        Ok(vec![quad.zoom() as u8; 16])
    }
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let alps = GeoRectangle::new(5.0, 43.5, 16.0, 48.5)?;
    println!("quads covering the Alps at zoom 6:");
    let mut keys: Vec<_> = calculate_quad_keys(&alps, 6).into_iter().collect();
    keys.sort();
    for key in &keys {
        println!("  {key} -> {:?}", key.compute_rect());
    }

    let mut map = LiveMapBuilder::new()
        .with_projection(ProjectionType::Mercator)
        .with_size(1024.0, 768.0)
        .with_fetcher(tokio::runtime::Handle::current(), Arc::new(InMemory))
        .build()?;
    map.fit_rectangle(&alps)?;
    println!(
        "fitted at zoom {} centred on {:?}",
        map.viewport().zoom(),
        map.center()
    );

    let mut report = map.tick();
    while map.pending_requests() > 0 {
        tokio::time::sleep(Duration::from_millis(16)).await;
        report = map.tick();
    }

    let mut loaded: Vec<QuadKey> = map.grid().quads().keys().cloned().collect();
    loaded.sort();
    println!("{} tiles referenced after frame {}:", loaded.len(), report.frame);
    for quad in &loaded {
        let bytes = map.tile(quad).map_or(0, |data| data.len());
        println!("  {quad} ({} refs, {bytes} bytes)", map.grid().ref_count(quad));
    }
    Ok(())
}
