//! Bounded cache of compiled policies with SIEVE eviction.
//!
//! The same handful of policy strings are compiled on every request, so the
//! engine keeps recent compilations keyed by their source text.
//!
//! # Eviction
//!
//! Each slot carries a `visited` bit set on every hit. When a new policy
//! arrives and the cache is full, the hand sweeps forward over the slots:
//! a visited slot has its bit cleared and is skipped, and the first
//! unvisited slot is replaced. Hits never reorder anything, so a lookup is a
//! hash probe plus a bit write.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::num::NonZeroUsize;

#[derive(Debug)]
struct Slot<K, V> {
    key: K,
    value: V,
    visited: bool,
}

/// Fixed-capacity map with SIEVE eviction.
#[derive(Debug)]
pub(crate) struct SieveCache<K, V> {
    /// Filled front to back; never shrinks except through `clear`.
    slots: Vec<Slot<K, V>>,
    positions: HashMap<K, usize>,
    hand: usize,
    capacity: NonZeroUsize,
}

impl<K, V> SieveCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub(crate) fn new(capacity: NonZeroUsize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity.get()),
            positions: HashMap::with_capacity(capacity.get()),
            hand: 0,
            capacity,
        }
    }

    /// Returns a clone of the cached value and marks the slot as visited.
    pub(crate) fn get<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let &pos = self.positions.get(key)?;
        let slot = &mut self.slots[pos];
        slot.visited = true;
        Some(slot.value.clone())
    }

    pub(crate) fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.positions.contains_key(key)
    }

    /// Inserts or replaces `key`. Returns the evicted key, if any.
    pub(crate) fn insert(&mut self, key: K, value: V) -> Option<K> {
        if let Some(&pos) = self.positions.get(&key) {
            let slot = &mut self.slots[pos];
            slot.value = value;
            slot.visited = true;
            return None;
        }

        let fresh = Slot {
            key: key.clone(),
            value,
            visited: false,
        };

        if self.slots.len() < self.capacity.get() {
            self.positions.insert(key, self.slots.len());
            self.slots.push(fresh);
            return None;
        }

        let victim = self.sweep();
        let evicted = std::mem::replace(&mut self.slots[victim], fresh);
        self.positions.remove(&evicted.key);
        self.positions.insert(key, victim);
        Some(evicted.key)
    }

    /// Advances the hand to the first unvisited slot, clearing visited bits
    /// on the way. Terminates within two passes.
    fn sweep(&mut self) -> usize {
        let len = self.slots.len();
        loop {
            let pos = self.hand;
            self.hand = (self.hand + 1) % len;
            let slot = &mut self.slots[pos];
            if !slot.visited {
                return pos;
            }
            slot.visited = false;
        }
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.positions.clear();
        self.hand = 0;
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(capacity: usize) -> SieveCache<&'static str, u32> {
        SieveCache::new(NonZeroUsize::new(capacity).unwrap())
    }

    #[test]
    fn test_hit_and_miss() {
        let mut cache = cache(2);
        assert_eq!(cache.insert("role == 'Doctor'", 1), None);
        assert_eq!(cache.get(&"role == 'Doctor'"), Some(1));
        assert_eq!(cache.get(&"role == 'Nurse'"), None);
        assert!(cache.contains(&"role == 'Doctor'"));
    }

    #[test]
    fn test_evicts_unvisited_first() {
        let mut cache = cache(3);
        cache.insert("a", 1);
        cache.insert("b", 2);
        cache.insert("c", 3);
        cache.get(&"a");
        cache.get(&"c");

        assert_eq!(cache.insert("d", 4), Some("b"));
        assert!(cache.contains(&"a"));
        assert!(cache.contains(&"c"));
        assert!(cache.contains(&"d"));
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_all_visited_sweeps_full_circle() {
        let mut cache = cache(3);
        for (k, v) in [("a", 1), ("b", 2), ("c", 3)] {
            cache.insert(k, v);
            cache.get(&k);
        }
        // Every bit is cleared on the first pass, so the hand comes back to
        // where it started.
        assert_eq!(cache.insert("d", 4), Some("a"));
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_replace_existing_key() {
        let mut cache = cache(2);
        cache.insert("a", 1);
        assert_eq!(cache.insert("a", 10), None);
        assert_eq!(cache.get(&"a"), Some(10));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_capacity_one() {
        let mut cache = cache(1);
        cache.insert("a", 1);
        assert_eq!(cache.insert("b", 2), Some("a"));
        assert_eq!(cache.get(&"a"), None);
        assert_eq!(cache.get(&"b"), Some(2));
        assert_eq!(cache.capacity(), 1);
    }

    #[test]
    fn test_clear() {
        let mut cache = cache(2);
        cache.insert("a", 1);
        cache.insert("b", 2);
        cache.clear();
        assert_eq!(cache.len(), 0);
        assert!(!cache.contains(&"a"));
        cache.insert("c", 3);
        assert_eq!(cache.get(&"c"), Some(3));
    }
}
