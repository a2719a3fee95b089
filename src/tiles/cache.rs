use crate::containers::LruCache;
use crate::core::constants::DEFAULT_TILE_CACHE_CAPACITY;
use crate::tiles::quad_key::QuadKey;
use std::sync::Arc;

/// In-memory tile payload cache using LRU eviction.
///
/// Owned and mutated by the frame driver only, so no locking is involved.
#[derive(Debug)]
pub struct TileCache {
    cache: LruCache<QuadKey, Arc<Vec<u8>>>,
}

impl TileCache {
    /// Create a new tile cache with the given capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: LruCache::new(capacity),
        }
    }

    /// Create a new tile cache with the default capacity
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_TILE_CACHE_CAPACITY)
    }

    /// Get a tile and mark it recently used
    pub fn get(&mut self, quad: &QuadKey) -> Option<Arc<Vec<u8>>> {
        self.cache.get(quad).cloned()
    }

    pub fn insert(&mut self, quad: QuadKey, data: Vec<u8>) {
        self.cache.put(quad, Arc::new(data));
    }

    pub fn put(&mut self, quad: QuadKey, data: Arc<Vec<u8>>) {
        self.cache.put(quad, data);
    }

    pub fn contains(&self, quad: &QuadKey) -> bool {
        self.cache.contains_key(quad)
    }

    pub fn remove(&mut self, quad: &QuadKey) -> Option<Arc<Vec<u8>>> {
        self.cache.remove(quad)
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.cache.limit()
    }

    /// Nearest cached ancestor of `quad`, shown scaled up while the exact
    /// tile is still loading
    pub fn donor_for(&mut self, quad: &QuadKey) -> Option<(QuadKey, Arc<Vec<u8>>)> {
        let donor = quad.ancestors().find(|ancestor| self.cache.contains_key(ancestor))?;
        let data = self.cache.get(&donor).cloned()?;
        Some((donor, data))
    }
}

impl Default for TileCache {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}
