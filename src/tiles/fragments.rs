//! Memory of quads known to hold no data, per region.
//!
//! Re-requesting an empty quad costs a full round trip for nothing, so
//! every empty response is remembered here. Both levels are LRU bounded: the
//! number of regions and the number of quads per region.

use crate::containers::LruCache;
use crate::core::constants::{EMPTY_FRAGMENTS_CACHE_LIMIT, REGIONS_CACHE_LIMIT};
use crate::tiles::quad_key::QuadKey;

#[derive(Debug)]
pub struct EmptyFragmentsCache {
    regions: LruCache<String, LruCache<QuadKey, ()>>,
    fragments_limit: usize,
}

impl EmptyFragmentsCache {
    pub fn new(regions_limit: usize, fragments_limit: usize) -> Self {
        Self {
            regions: LruCache::new(regions_limit),
            fragments_limit,
        }
    }

    pub fn mark_empty(&mut self, region: &str, quad: QuadKey) {
        let limit = self.fragments_limit;
        self.regions
            .get_or_put(region.to_string(), || LruCache::new(limit))
            .put(quad, ());
    }

    pub fn is_empty_fragment(&self, region: &str, quad: &QuadKey) -> bool {
        self.regions
            .peek(&region.to_string())
            .is_some_and(|quads| quads.contains_key(quad))
    }

    /// Forgets a quad in every region, e.g. after the source data changed
    pub fn forget(&mut self, quad: &QuadKey) {
        let regions: Vec<String> = self.regions.keys().cloned().collect();
        for region in regions {
            if let Some(quads) = self.regions.get_mut(&region) {
                quads.remove(quad);
            }
        }
    }

    pub fn remove_region(&mut self, region: &str) {
        self.regions.remove(&region.to_string());
    }

    pub fn regions_limit(&self) -> usize {
        self.regions.limit()
    }

    pub fn fragments_limit(&self) -> usize {
        self.fragments_limit
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    pub fn fragment_count(&self, region: &str) -> usize {
        self.regions
            .peek(&region.to_string())
            .map_or(0, |quads| quads.len())
    }
}

impl Default for EmptyFragmentsCache {
    fn default() -> Self {
        Self::new(REGIONS_CACHE_LIMIT, EMPTY_FRAGMENTS_CACHE_LIMIT)
    }
}
