use crossbeam_channel::{unbounded, Receiver, Sender};
use fxhash::FxHashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio::task::AbortHandle;

use super::requester::{TileRequester, TileResult};
use super::source::TileSource;
use crate::core::config::TileLoadingConfig;
use crate::tiles::quad_key::QuadKey;
use crate::{MapError, Result};

/// Fetches the raw payload of one quad
#[async_trait::async_trait]
pub trait TileFetcher: Send + Sync {
    async fn fetch(&self, quad: &QuadKey) -> Result<Vec<u8>>;
}

/// HTTP fetcher over a [`TileSource`].
///
/// The `reqwest::Client` is built once by the embedding application (see
/// [`HttpTileFetcher::build_client`]) and passed in, so connection pools are
/// shared across every fetch.
pub struct HttpTileFetcher {
    client: reqwest::Client,
    source: Arc<dyn TileSource>,
    timeout: Duration,
}

impl HttpTileFetcher {
    pub fn new(client: reqwest::Client, source: Arc<dyn TileSource>) -> Self {
        Self {
            client,
            source,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Client tuned for tile fetching
    pub fn build_client(user_agent: &str) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(30))
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(16)
            .build()
            .map_err(|e| MapError::Network(e.to_string()))
    }
}

#[async_trait::async_trait]
impl TileFetcher for HttpTileFetcher {
    async fn fetch(&self, quad: &QuadKey) -> Result<Vec<u8>> {
        let url = self.source.url(quad);
        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| MapError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(MapError::Network(format!(
                "HTTP {} for tile {}",
                response.status(),
                quad
            )));
        }

        let data = response
            .bytes()
            .await
            .map_err(|e| MapError::Network(e.to_string()))?;
        Ok(data.to_vec())
    }
}

struct InFlight {
    request_id: u64,
    abort: AbortHandle,
}

/// Completed fetch tagged with the request that produced it
struct Completion {
    request_id: u64,
    result: TileResult,
}

/// Async tile loader with bounded concurrency.
///
/// Each request becomes a task on the given tokio runtime that waits for a
/// semaphore permit, fetches with retry and backoff, and sends the outcome
/// over a channel. `poll_completed` drains that channel on the caller's
/// thread, so only results cross threads.
pub struct TileLoader {
    runtime: Handle,
    fetcher: Arc<dyn TileFetcher>,
    semaphore: Arc<Semaphore>,
    result_tx: Sender<Completion>,
    result_rx: Receiver<Completion>,
    in_flight: FxHashMap<QuadKey, InFlight>,
    next_request_id: u64,
    config: TileLoadingConfig,
}

impl TileLoader {
    pub fn new(runtime: Handle, fetcher: Arc<dyn TileFetcher>, config: TileLoadingConfig) -> Self {
        let (result_tx, result_rx) = unbounded();
        log::debug!(
            "tile loader starting with max_concurrent_downloads: {}",
            config.max_concurrent_downloads
        );
        Self {
            runtime,
            fetcher,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent_downloads.max(1))),
            result_tx,
            result_rx,
            in_flight: FxHashMap::default(),
            next_request_id: 0,
            config,
        }
    }

    pub fn config(&self) -> &TileLoadingConfig {
        &self.config
    }

    pub fn is_loading(&self, quad: &QuadKey) -> bool {
        self.in_flight.contains_key(quad)
    }

    async fn fetch_with_retry(
        fetcher: Arc<dyn TileFetcher>,
        quad: &QuadKey,
        config: &TileLoadingConfig,
    ) -> Result<Vec<u8>> {
        let mut attempt = 0;
        loop {
            log::trace!("fetch tile {} attempt {}", quad, attempt + 1);
            match fetcher.fetch(quad).await {
                Ok(data) => return Ok(data),
                Err(e) if attempt < config.max_retries => {
                    attempt += 1;
                    let delay = config.retry_delay(attempt);
                    log::warn!(
                        "tile {} download failed on attempt {}: {}; retrying in {:?}",
                        quad,
                        attempt,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    log::error!("giving up on tile {} after {} attempts: {}", quad, attempt + 1, e);
                    return Err(e);
                }
            }
        }
    }
}

impl TileRequester for TileLoader {
    fn request(&mut self, quad: &QuadKey) {
        if self.in_flight.contains_key(quad) {
            log::trace!("skipping duplicate tile request: {}", quad);
            return;
        }

        let request_id = self.next_request_id;
        self.next_request_id += 1;

        let fetcher = Arc::clone(&self.fetcher);
        let semaphore = Arc::clone(&self.semaphore);
        let result_tx = self.result_tx.clone();
        let config = self.config.clone();
        let task_quad = quad.clone();

        let handle = self.runtime.spawn(async move {
            let data = match semaphore.acquire_owned().await {
                Ok(_permit) => Self::fetch_with_retry(fetcher, &task_quad, &config)
                    .await
                    .map(Arc::new),
                Err(_) => Err(MapError::Network("tile loader shut down".to_string())),
            };
            let _ = result_tx.send(Completion {
                request_id,
                result: TileResult {
                    quad: task_quad,
                    data,
                },
            });
        });

        self.in_flight.insert(
            quad.clone(),
            InFlight {
                request_id,
                abort: handle.abort_handle(),
            },
        );
    }

    fn cancel(&mut self, quad: &QuadKey) {
        if let Some(in_flight) = self.in_flight.remove(quad) {
            log::trace!("cancelling tile {}", quad);
            in_flight.abort.abort();
        }
    }

    fn poll_completed(&mut self) -> Vec<TileResult> {
        let mut results = Vec::new();
        while let Ok(completion) = self.result_rx.try_recv() {
            let quad = &completion.result.quad;
            match self.in_flight.get(quad) {
                Some(current) if current.request_id == completion.request_id => {
                    self.in_flight.remove(quad);
                }
                // An older request for a quad that was cancelled and requested again
                Some(_) => continue,
                None => {}
            }
            results.push(completion.result);
        }
        results
    }

    fn pending(&self) -> usize {
        self.in_flight.len()
    }
}

impl Drop for TileLoader {
    fn drop(&mut self) {
        for (_, in_flight) in self.in_flight.drain() {
            in_flight.abort.abort();
        }
    }
}
