//! Core constants shared by the viewport, tiling and cache layers.
//! Keeping them in a single place makes it easier to tweak engine-wide magic numbers.

use crate::core::geometry::{Rect, World};

/// Default square tile size in pixels.
pub const TILE_PIXEL_SIZE: f64 = 256.0;

/// World space: the whole projected map at zoom 0 fits this rectangle.
pub const WORLD_RECT: Rect<World> = Rect::new(0.0, 0.0, TILE_PIXEL_SIZE, TILE_PIXEL_SIZE);

/// Zoom limits used when the configuration does not override them.
pub const DEFAULT_MIN_ZOOM: u32 = 1;
pub const DEFAULT_MAX_ZOOM: u32 = 15;

/// Deepest zoom a quad key may address.
pub const MAX_QUAD_KEY_ZOOM: u32 = 30;

/// Points sampled per rectangle edge when pushing a rectangle through a
/// non-linear projection.
pub const SAMPLING_STEPS: usize = 16;

/// Empty fragments are cheap to remember but costly to re-request.
pub const EMPTY_FRAGMENTS_CACHE_LIMIT: usize = 50_000;

/// Upper bound on the number of regions tracked by the empty-fragment cache.
pub const REGIONS_CACHE_LIMIT: usize = 5_000;

/// Materialised tiles kept in memory by default.
pub const DEFAULT_TILE_CACHE_CAPACITY: usize = 1_024;
