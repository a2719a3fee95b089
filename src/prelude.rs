//! Prelude module for common livemap types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use livemap::prelude::*;`

pub use crate::core::{
    bbox::{calculate_loop_limit_range, union_points, union_rectangles, GeoBoundingBoxCalculator},
    builder::LiveMapBuilder,
    config::{LiveMapConfig, LiveMapProfile, TileLoadingConfig, ViewportConfig},
    geo::{GeoRectangle, EARTH_RECT},
    geometry::{Client, Geographic, Projected, Rect, Vec2, World},
    map::{LiveMap, TickReport},
    viewport::Viewport,
    viewport_helper::ViewportHelper,
};

pub use crate::containers::{
    linked_list::{DoubleLinkedList, NodeId},
    lru_cache::LruCache,
};

pub use crate::projections::{
    map_projection::{MapProjection, MapProjectionBuilder},
    GeoProjection, ProjectionType,
};

pub use crate::tiles::{
    cache::TileCache,
    fragments::EmptyFragmentsCache,
    grid::{update_grid, ViewportGridState},
    quad_key::{calculate_quad_keys, xy_to_key, CellKey, QuadKey},
    requester::{TileRequester, TileResult},
    source::{QuadKeyUrlSource, TileSource},
};

#[cfg(feature = "tokio-runtime")]
pub use crate::tiles::loader::{HttpTileFetcher, TileFetcher, TileLoader};

pub use crate::traits::Transform;

pub use crate::{Error as MapError, Result};

pub use std::sync::Arc;

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet, FxHasher};
