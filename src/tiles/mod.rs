pub mod cache;
pub mod fragments;
pub mod grid;
#[cfg(feature = "tokio-runtime")]
pub mod loader;
pub mod quad_key;
pub mod requester;
pub mod source;

// Re-exports for convenience
pub use cache::TileCache;
pub use fragments::EmptyFragmentsCache;
pub use grid::{update_grid, ViewportGridState};
#[cfg(feature = "tokio-runtime")]
pub use loader::{HttpTileFetcher, TileFetcher, TileLoader};
pub use quad_key::{CellKey, QuadKey};
pub use requester::{TileRequester, TileResult};
pub use source::{QuadKeyUrlSource, TileSource};
