use std::cell::Cell;

use crate::utils::MyHash;

struct Entry<K, V> {
    key: K,
    value: V,
}

/// Direct-mapped computed table: a newer entry simply evicts the older one
/// sitting in the same slot.
pub struct Cache<K, V> {
    data: Vec<Option<Entry<K, V>>>,
    bitmask: u64,
    hits: Cell<usize>,
    misses: Cell<usize>,
}

impl<K, V> Cache<K, V> {
    /// Create a new cache with `2^bits` slots.
    pub fn new(bits: usize) -> Self {
        assert!(bits <= 31, "Bits should be in the range 0..=31");

        let size = 1 << bits;
        Self {
            data: std::iter::repeat_with(|| None).take(size).collect(),
            bitmask: (size - 1) as u64,
            hits: Cell::new(0),
            misses: Cell::new(0),
        }
    }

    pub fn hits(&self) -> usize {
        self.hits.get()
    }

    pub fn misses(&self) -> usize {
        self.misses.get()
    }

    pub fn clear(&mut self) {
        self.data.fill_with(|| None);
    }

    fn slot(&self, hash: u64) -> usize {
        (hash & self.bitmask) as usize
    }
}

impl<K: MyHash + Eq, V> Cache<K, V> {
    pub fn get(&self, key: &K) -> Option<&V> {
        match &self.data[self.slot(key.hash())] {
            Some(entry) if &entry.key == key => {
                self.hits.set(self.hits.get() + 1);
                Some(&entry.value)
            }
            _ => {
                self.misses.set(self.misses.get() + 1);
                None
            }
        }
    }

    pub fn insert(&mut self, key: K, value: V) {
        let slot = self.slot(key.hash());
        self.data[slot] = Some(Entry { key, value });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache() {
        let mut cache = Cache::<(u64, u64), i32>::new(3);

        cache.insert((1, 2), 3);
        cache.insert((2, 3), 1);
        cache.insert((1, 3), 2);

        assert_eq!(cache.get(&(1, 2)), Some(&3));
        assert_eq!(cache.get(&(2, 3)), Some(&1));
        assert_eq!(cache.get(&(1, 3)), Some(&2));
        assert_eq!(cache.get(&(2, 1)), None);
        assert_eq!(cache.get(&(3, 3)), None);
        assert_eq!(cache.hits(), 3);
        assert_eq!(cache.misses(), 2);
    }

    #[test]
    fn test_colliding_keys_do_not_alias() {
        // With a single slot every key collides; only the exact key may hit.
        let mut cache = Cache::<(u64, u64), i32>::new(0);
        cache.insert((1, 2), 42);
        assert_eq!(cache.get(&(2, 1)), None);
        assert_eq!(cache.get(&(1, 2)), Some(&42));
    }

    #[test]
    fn test_clear() {
        let mut cache = Cache::<(u64, u64), i32>::new(2);
        cache.insert((0, 1), 7);
        cache.clear();
        assert_eq!(cache.get(&(0, 1)), None);
    }
}
