use crate::core::constants::CACHE_CAPACITY;
use crate::core::geo::TileAddress;
use crate::prelude::HashMap;
use image::RgbaImage;
use std::sync::Arc;

/// Decoded tile shared between the cache and draw commands.
pub type TileImage = Arc<RgbaImage>;

#[derive(Debug)]
struct Slot<V> {
    address: TileAddress,
    value: V,
    /// Towards the most recently used end.
    newer: Option<usize>,
    /// Towards the least recently used end.
    older: Option<usize>,
}

/// In-memory tile cache with least-recently-used eviction.
///
/// Entries live in an arena of slots linked into a recency list, with a hash
/// index from address to slot. `get`, `put` and eviction are all O(1). The cache
/// is owned by the render thread and has no internal locking; fetch results are
/// handed over through the loader's channel before they are `put`.
#[derive(Debug)]
pub struct TileCache<V = TileImage> {
    slots: Vec<Option<Slot<V>>>,
    free: Vec<usize>,
    index: HashMap<TileAddress, usize>,
    newest: Option<usize>,
    oldest: Option<usize>,
    capacity: usize,
}

impl<V: Clone> TileCache<V> {
    /// Create a new tile cache with the given capacity (at least one entry)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: Vec::with_capacity(capacity + 1),
            free: Vec::new(),
            index: HashMap::default(),
            newest: None,
            oldest: None,
            capacity,
        }
    }

    /// Create a new tile cache with default capacity (256 tiles)
    pub fn with_default_capacity() -> Self {
        Self::new(CACHE_CAPACITY)
    }

    /// Looks up a tile and marks it as most recently used. Never fetches.
    pub fn get(&mut self, address: &TileAddress) -> Option<V> {
        let slot = *self.index.get(address)?;
        self.touch(slot);
        self.slots[slot].as_ref().map(|s| s.value.clone())
    }

    /// Looks up a tile without affecting its recency.
    pub fn peek(&self, address: &TileAddress) -> Option<&V> {
        let slot = *self.index.get(address)?;
        self.slots[slot].as_ref().map(|s| &s.value)
    }

    /// Inserts or overwrites a tile, then evicts least recently used tiles until
    /// the cache is back within capacity.
    pub fn put(&mut self, address: TileAddress, value: V) {
        if let Some(&slot) = self.index.get(&address) {
            if let Some(entry) = self.slots[slot].as_mut() {
                entry.value = value;
            }
            self.touch(slot);
            return;
        }

        let entry = Slot {
            address: address.clone(),
            value,
            newer: None,
            older: self.newest,
        };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(entry);
                slot
            }
            None => {
                self.slots.push(Some(entry));
                self.slots.len() - 1
            }
        };
        self.link_newest(slot);
        self.index.insert(address, slot);

        while self.index.len() > self.capacity {
            if let Some(evicted) = self.pop_oldest() {
                log::debug!("evicted tile {}", evicted);
            }
        }
    }

    /// Check if a tile is in the cache
    pub fn contains(&self, address: &TileAddress) -> bool {
        self.index.contains_key(address)
    }

    /// Remove a tile from the cache
    pub fn remove(&mut self, address: &TileAddress) -> Option<V> {
        let slot = self.index.remove(address)?;
        self.unlink(slot);
        self.free.push(slot);
        self.slots[slot].take().map(|s| s.value)
    }

    /// Clear all tiles from the cache
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.index.clear();
        self.newest = None;
        self.oldest = None;
    }

    /// Get the current number of cached tiles
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Get cache capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Addresses from most to least recently used.
    pub fn addresses_by_recency(&self) -> Vec<&TileAddress> {
        let mut out = Vec::with_capacity(self.len());
        let mut cursor = self.newest;
        while let Some(slot) = cursor {
            match self.slots[slot].as_ref() {
                Some(entry) => {
                    out.push(&entry.address);
                    cursor = entry.older;
                }
                None => break,
            }
        }
        out
    }

    fn touch(&mut self, slot: usize) {
        if self.newest == Some(slot) {
            return;
        }
        self.unlink(slot);
        self.link_newest(slot);
    }

    fn pop_oldest(&mut self) -> Option<TileAddress> {
        let slot = self.oldest?;
        self.unlink(slot);
        self.free.push(slot);
        let entry = self.slots[slot].take()?;
        self.index.remove(&entry.address);
        Some(entry.address)
    }

    fn link_newest(&mut self, slot: usize) {
        let previous = self.newest;
        if let Some(entry) = self.slots[slot].as_mut() {
            entry.newer = None;
            entry.older = previous;
        }
        if let Some(previous) = previous {
            if let Some(entry) = self.slots[previous].as_mut() {
                entry.newer = Some(slot);
            }
        }
        self.newest = Some(slot);
        if self.oldest.is_none() {
            self.oldest = Some(slot);
        }
    }

    fn unlink(&mut self, slot: usize) {
        let (newer, older) = match self.slots[slot].as_ref() {
            Some(entry) => (entry.newer, entry.older),
            None => return,
        };
        match newer {
            Some(n) => {
                if let Some(entry) = self.slots[n].as_mut() {
                    entry.older = older;
                }
            }
            None => self.newest = older,
        }
        match older {
            Some(o) => {
                if let Some(entry) = self.slots[o].as_mut() {
                    entry.newer = newer;
                }
            }
            None => self.oldest = newer,
        }
        if let Some(entry) = self.slots[slot].as_mut() {
            entry.newer = None;
            entry.older = None;
        }
    }
}

impl<V: Clone> Default for TileCache<V> {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(x: u32) -> TileAddress {
        TileAddress::new("https://tile.example/", x, x + 1, 5)
    }

    #[test]
    fn test_tile_cache_basic_operations() {
        let mut cache: TileCache<Vec<u8>> = TileCache::new(2);

        // Initially empty
        assert!(cache.is_empty());
        assert_eq!(cache.len(), 0);

        cache.put(addr(1), vec![1, 2, 3]);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(&addr(1)));
        assert_eq!(cache.get(&addr(1)), Some(vec![1, 2, 3]));
        assert_eq!(cache.get(&addr(9)), None);

        cache.put(addr(2), vec![4, 5, 6]);
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.get(&addr(1)), None);
    }

    #[test]
    fn test_access_protects_from_eviction() {
        let mut cache: TileCache<&'static str> = TileCache::new(2);
        cache.put(addr(1), "a");
        cache.put(addr(2), "b");
        assert_eq!(cache.get(&addr(1)), Some("a"));

        cache.put(addr(3), "c");
        assert_eq!(cache.len(), 2);
        assert!(cache.contains(&addr(1)));
        assert!(!cache.contains(&addr(2)));
        assert!(cache.contains(&addr(3)));
    }

    #[test]
    fn test_capacity_plus_one_evicts_least_recent() {
        let capacity = 16;
        let mut cache: TileCache<u32> = TileCache::new(capacity);
        for x in 0..capacity as u32 {
            cache.put(addr(x), x);
        }
        // Refresh everything except tile 5.
        for x in (0..capacity as u32).filter(|x| *x != 5) {
            cache.get(&addr(x));
        }

        cache.put(addr(100), 100);
        assert_eq!(cache.len(), capacity);
        assert!(!cache.contains(&addr(5)));
        assert!(cache.contains(&addr(100)));
    }

    #[test]
    fn test_overwrite_refreshes_without_growing() {
        let mut cache: TileCache<u32> = TileCache::new(2);
        cache.put(addr(1), 1);
        cache.put(addr(2), 2);
        cache.put(addr(1), 10);
        assert_eq!(cache.len(), 2);

        cache.put(addr(3), 3);
        assert_eq!(cache.peek(&addr(1)), Some(&10));
        assert!(!cache.contains(&addr(2)));
    }

    #[test]
    fn test_recency_order_and_slot_reuse() {
        let mut cache: TileCache<u32> = TileCache::new(3);
        cache.put(addr(1), 1);
        cache.put(addr(2), 2);
        cache.put(addr(3), 3);
        cache.get(&addr(1));
        assert_eq!(
            cache.addresses_by_recency(),
            vec![&addr(1), &addr(3), &addr(2)]
        );

        assert_eq!(cache.remove(&addr(3)), Some(3));
        cache.put(addr(4), 4);
        cache.put(addr(5), 5);
        assert_eq!(cache.len(), 3);
        assert_eq!(
            cache.addresses_by_recency(),
            vec![&addr(5), &addr(4), &addr(1)]
        );
        // The arena never grows past capacity + 1 slots.
        assert!(cache.slots.len() <= 4);
    }

    #[test]
    fn test_peek_does_not_refresh() {
        let mut cache: TileCache<u32> = TileCache::new(2);
        cache.put(addr(1), 1);
        cache.put(addr(2), 2);
        assert_eq!(cache.peek(&addr(1)), Some(&1));
        cache.put(addr(3), 3);
        assert!(!cache.contains(&addr(1)));
    }

    #[test]
    fn test_zero_capacity_holds_one() {
        let mut cache: TileCache<u32> = TileCache::new(0);
        cache.put(addr(1), 1);
        cache.put(addr(2), 2);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.capacity(), 1);
        assert!(cache.contains(&addr(2)));
    }
}
