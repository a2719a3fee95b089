use crate::tiles::quad_key::QuadKey;
use crate::Result;
use std::sync::Arc;

/// Result of a tile loading operation
#[derive(Debug)]
pub struct TileResult {
    pub quad: QuadKey,
    pub data: Result<Arc<Vec<u8>>>,
}

/// The frame driver's view of tile loading.
///
/// `request` and `cancel` never block; finished loads are handed back by
/// `poll_completed` on a later tick. A cancelled load may still complete,
/// so the driver checks that the quad is wanted before keeping the data.
pub trait TileRequester: Send {
    fn request(&mut self, quad: &QuadKey);

    fn cancel(&mut self, quad: &QuadKey);

    /// Completed loads since the previous poll, without blocking
    fn poll_completed(&mut self) -> Vec<TileResult>;

    /// Loads requested but not yet handed back
    fn pending(&self) -> usize;
}
