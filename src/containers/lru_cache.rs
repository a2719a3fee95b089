//! Fixed-capacity least-recently-used cache.
//!
//! Recency lives in a [`DoubleLinkedList`] of keys with the most recently
//! used key at the front. The map stores each key's list handle next to its
//! value, so touching and evicting are O(1).

use super::linked_list::{DoubleLinkedList, NodeId};
use fxhash::FxHashMap;
use std::hash::Hash;

struct Entry<V> {
    value: V,
    node: NodeId,
}

pub struct LruCache<K, V> {
    map: FxHashMap<K, Entry<V>>,
    order: DoubleLinkedList<K>,
    limit: usize,
}

impl<K, V> LruCache<K, V>
where
    K: Eq + Hash + Clone,
{
    /// A `limit` of zero is treated as one.
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            map: FxHashMap::default(),
            order: DoubleLinkedList::new(),
            limit,
        }
    }

    /// Returns the value and marks `key` as most recently used
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let entry = self.map.get(key)?;
        self.order.move_to_front(entry.node);
        Some(&entry.value)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let entry = self.map.get_mut(key)?;
        self.order.move_to_front(entry.node);
        Some(&mut entry.value)
    }

    /// Returns the value without touching recency
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.map.get(key).map(|entry| &entry.value)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    /// Inserts at the front, evicting from the back while over the limit.
    /// Returns the previous value for `key`, if any.
    pub fn put(&mut self, key: K, value: V) -> Option<V> {
        if let Some(entry) = self.map.get_mut(&key) {
            self.order.move_to_front(entry.node);
            return Some(std::mem::replace(&mut entry.value, value));
        }

        let node = self.order.push_front(key.clone());
        self.map.insert(key, Entry { value, node });
        self.evict();
        None
    }

    pub fn get_or_put<F>(&mut self, key: K, create: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        if !self.map.contains_key(&key) {
            let node = self.order.push_front(key.clone());
            self.map.insert(
                key.clone(),
                Entry {
                    value: create(),
                    node,
                },
            );
            self.evict();
        }
        let entry = self
            .map
            .get_mut(&key)
            .unwrap_or_else(|| unreachable!("entry inserted above"));
        self.order.move_to_front(entry.node);
        &mut entry.value
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let entry = self.map.remove(key)?;
        self.order.remove(entry.node);
        Some(entry.value)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Most recently used first
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.order.iter()
    }

    pub fn clear(&mut self) {
        self.map.clear();
        self.order.clear();
    }

    fn evict(&mut self) {
        while self.map.len() > self.limit {
            match self.order.pop_back() {
                Some(key) => {
                    self.map.remove(&key);
                }
                None => break,
            }
        }
    }
}

impl<K, V> std::fmt::Debug for LruCache<K, V>
where
    K: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LruCache")
            .field("limit", &self.limit)
            .field("keys", &self.order.iter().collect::<Vec<_>>())
            .finish()
    }
}
