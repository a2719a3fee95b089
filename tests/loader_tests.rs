//! Background tile loading against an in-memory server

mod common;

use common::{init_logging, MemoryFetcher};
use livemap::{QuadKey, TileLoader, TileLoadingConfig, TileRequester, TileResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

fn quick_config() -> TileLoadingConfig {
    TileLoadingConfig {
        max_concurrent_downloads: 4,
        max_retries: 3,
        retry_delay_ms: 1,
        exponential_backoff: false,
        ..Default::default()
    }
}

fn quad(key: &str) -> QuadKey {
    QuadKey::parse(key).unwrap()
}

/// Polls until `expected` results arrived or two seconds passed
async fn collect(loader: &mut TileLoader, expected: usize) -> Vec<TileResult> {
    let mut results = Vec::new();
    for _ in 0..400 {
        results.extend(loader.poll_completed());
        if results.len() >= expected {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    results
}

#[tokio::test]
async fn test_loads_requested_tiles() {
    init_logging();
    let fetcher = Arc::new(MemoryFetcher::default());
    let mut loader = TileLoader::new(Handle::current(), fetcher.clone(), quick_config());

    for key in ["0", "1", "21"] {
        loader.request(&quad(key));
    }
    // duplicate while in flight
    loader.request(&quad("0"));
    assert_eq!(loader.pending(), 3);

    let results = collect(&mut loader, 3).await;
    assert_eq!(results.len(), 3);
    for result in &results {
        let data = result.data.as_ref().unwrap();
        assert_eq!(data.as_slice(), result.quad.as_str().as_bytes());
    }
    assert_eq!(loader.pending(), 0);
    assert_eq!(fetcher.total_calls(), 3);
}

#[tokio::test]
async fn test_retries_until_success() {
    init_logging();
    let fetcher = Arc::new(MemoryFetcher {
        failures: 2,
        ..Default::default()
    });
    let mut loader = TileLoader::new(Handle::current(), fetcher.clone(), quick_config());

    loader.request(&quad("03"));
    let results = collect(&mut loader, 1).await;

    assert_eq!(results.len(), 1);
    assert!(results[0].data.is_ok());
    assert_eq!(fetcher.calls(&quad("03")), 3);
}

#[tokio::test]
async fn test_gives_up_after_max_retries() {
    init_logging();
    let fetcher = Arc::new(MemoryFetcher {
        failures: 10,
        ..Default::default()
    });
    let config = TileLoadingConfig {
        max_retries: 1,
        ..quick_config()
    };
    let mut loader = TileLoader::new(Handle::current(), fetcher.clone(), config);

    loader.request(&quad("1"));
    let results = collect(&mut loader, 1).await;

    assert_eq!(results.len(), 1);
    let err = results[0].data.as_ref().unwrap_err();
    assert!(err.to_string().contains("503"));
    assert_eq!(fetcher.calls(&quad("1")), 2);
    assert_eq!(loader.pending(), 0);
}

#[tokio::test]
async fn test_cancelled_request_never_completes() {
    init_logging();
    let fetcher = Arc::new(MemoryFetcher::with_delay(Duration::from_millis(200)));
    let mut loader = TileLoader::new(Handle::current(), fetcher, quick_config());

    loader.request(&quad("2"));
    loader.request(&quad("3"));
    loader.cancel(&quad("2"));
    assert_eq!(loader.pending(), 1);
    assert!(!loader.is_loading(&quad("2")));

    let results = collect(&mut loader, 1).await;
    tokio::time::sleep(Duration::from_millis(250)).await;
    let late = loader.poll_completed();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].quad, quad("3"));
    assert!(late.is_empty());
}

#[tokio::test]
async fn test_stale_completion_is_skipped() {
    init_logging();
    let fetcher = Arc::new(MemoryFetcher::default());
    let mut loader = TileLoader::new(Handle::current(), fetcher.clone(), quick_config());
    let key = quad("012");

    // Let the first fetch finish without polling it, then re-request
    loader.request(&key);
    tokio::time::sleep(Duration::from_millis(50)).await;
    loader.cancel(&key);
    loader.request(&key);

    let mut results = collect(&mut loader, 1).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    results.extend(loader.poll_completed());

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].quad, key);
    assert_eq!(fetcher.calls(&key), 2);
    assert_eq!(loader.pending(), 0);
}

#[tokio::test]
async fn test_concurrency_is_bounded() {
    init_logging();
    let fetcher = Arc::new(MemoryFetcher::with_delay(Duration::from_millis(20)));
    let config = TileLoadingConfig {
        max_concurrent_downloads: 2,
        ..quick_config()
    };
    let mut loader = TileLoader::new(Handle::current(), fetcher.clone(), config);

    let keys = ["00", "01", "02", "03", "10", "11"];
    for key in keys {
        loader.request(&quad(key));
    }
    let results = collect(&mut loader, keys.len()).await;

    assert_eq!(results.len(), keys.len());
    assert!(fetcher.peak_concurrency() <= 2, "peak {}", fetcher.peak_concurrency());
}
