//! Shared fixtures for the integration tests

#![allow(dead_code)]

use fxhash::FxHashMap;
use livemap::{MapError, QuadKey, Result, TileFetcher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// In-memory tile server.
///
/// Payloads are the quad key bytes. Quads whose key starts with one of
/// `empty_prefixes` come back empty, and every quad fails `failures` times
/// before it succeeds.
#[derive(Default)]
pub struct MemoryFetcher {
    pub delay: Duration,
    pub failures: u32,
    pub empty_prefixes: Vec<char>,
    pub(crate) calls: Mutex<FxHashMap<QuadKey, u32>>,
    pub(crate) active: AtomicUsize,
    pub(crate) peak: AtomicUsize,
}

impl MemoryFetcher {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Default::default()
        }
    }

    pub fn calls(&self, quad: &QuadKey) -> u32 {
        self.calls.lock().unwrap().get(quad).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> u32 {
        self.calls.lock().unwrap().values().sum()
    }

    /// Highest number of fetches observed running at once
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl TileFetcher for MemoryFetcher {
    async fn fetch(&self, quad: &QuadKey) -> Result<Vec<u8>> {
        let attempt = {
            let mut calls = self.calls.lock().unwrap();
            let count = calls.entry(quad.clone()).or_insert(0);
            *count += 1;
            *count
        };

        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(active, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        if attempt <= self.failures {
            return Err(MapError::Network(format!("HTTP 503 for tile {quad}")));
        }
        let empty = quad
            .as_str()
            .chars()
            .next()
            .map_or(false, |first| self.empty_prefixes.contains(&first));
        if empty {
            Ok(Vec::new())
        } else {
            Ok(quad.as_str().as_bytes().to_vec())
        }
    }
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
