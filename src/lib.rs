//! # LiveMap
//!
//! Geospatial viewport and tile-addressing core for the interactive map of a
//! plotting library.
//!
//! The crate covers antimeridian-aware bounding boxes, hierarchical quad-key
//! tile addressing, world-space wraparound geometry, viewport state and the
//! reference-counted tile-set diff that decides which tiles to load and drop
//! on every animation frame. Rendering, styling and tile decoding are left to
//! the embedding application.

pub mod containers;
pub mod core;
pub mod prelude;
pub mod projections;
pub mod tiles;
pub mod traits;
pub use crate::core::constants;

// Re-export public API
pub use crate::core::{
    bbox::{calculate_loop_limit_range, union_points, union_rectangles, GeoBoundingBoxCalculator},
    builder::LiveMapBuilder,
    config::{LiveMapConfig, LiveMapProfile, TileLoadingConfig, ViewportConfig},
    geo::GeoRectangle,
    geometry::{Client, Geographic, Projected, Rect, Vec2, World},
    map::{LiveMap, TickReport},
    viewport::Viewport,
    viewport_helper::ViewportHelper,
};

pub use containers::{
    linked_list::{DoubleLinkedList, NodeId},
    lru_cache::LruCache,
};

pub use projections::{
    map_projection::{MapProjection, MapProjectionBuilder},
    GeoProjection, ProjectionType,
};

pub use tiles::{
    grid::{update_grid, ViewportGridState},
    quad_key::{calculate_quad_keys, xy_to_key, CellKey, QuadKey},
    requester::{TileRequester, TileResult},
    source::{QuadKeyUrlSource, TileSource},
};

#[cfg(feature = "tokio-runtime")]
pub use tiles::loader::{HttpTileFetcher, TileFetcher, TileLoader};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Network error: {0}")]
    Network(String),

    #[error("No coordinates for bounding box calculation.")]
    NoCoordinates,

    #[error("Invalid latitude range: [{min}..{max}]")]
    InvalidLatitudeRange { min: f64, max: f64 },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid quad key: '{0}' (must contain only digits 0-3)")]
    InvalidQuadKey(String),

    #[error("Projection error: {0}")]
    Projection(String),

    #[error("Unknown projection type: {0}")]
    UnknownProjection(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Error type alias for convenience
pub type Error = MapError;
