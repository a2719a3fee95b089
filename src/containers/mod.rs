//! Small collections used by the tile caches.

pub mod linked_list;
pub mod lru_cache;

pub use linked_list::{DoubleLinkedList, NodeId};
pub use lru_cache::LruCache;
