//! Sorted, deduplicating value pool.
//!
//! Values keep two orderings: insertion order, which is the index callers
//! see, and value order, kept in a side vector of indices for binary
//! search. Loading replays an already-deduplicated sequence through
//! [`ValuePool::push_back`]; authoring goes through [`ValuePool::insert`].

use std::cmp::Ordering;

const DEFAULT_CAPACITY: usize = 0x1000;

/// A deduplicating pool of ordered values with stable indices.
///
/// ```rust
/// use cpsave_core::ValuePool;
///
/// let mut pool = ValuePool::new();
/// assert_eq!(pool.insert(30), 0);
/// assert_eq!(pool.insert(10), 1);
/// assert_eq!(pool.insert(30), 0);
/// assert!(pool.has_value(&10));
/// assert_eq!(pool.at(1), Some(&10));
/// ```
#[derive(Debug, Clone)]
pub struct ValuePool<T> {
    values: Vec<T>,
    // indices into `values`, ordered by value
    sorted: Vec<usize>,
}

impl<T> Default for ValuePool<T> {
    fn default() -> Self {
        Self {
            values: Vec::new(),
            sorted: Vec::new(),
        }
    }
}

impl<T: Ord> ValuePool<T> {
    /// Creates a pool with room for a typical TweakDB flat pool.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates a pool with room for `capacity` values.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
            sorted: Vec::with_capacity(capacity),
        }
    }

    /// Number of stored values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Number of values the pool holds without reallocating.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.values.capacity()
    }

    /// Whether the pool is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The value at insertion index `idx`.
    #[must_use]
    pub fn at(&self, idx: usize) -> Option<&T> {
        self.values.get(idx)
    }

    /// All values in insertion order.
    #[must_use]
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Iterates values in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.values.iter()
    }

    /// Whether an equal value is stored.
    #[must_use]
    pub fn has_value(&self, value: &T) -> bool {
        self.find(value).is_some()
    }

    /// Insertion index of an equal value, if stored.
    #[must_use]
    pub fn find(&self, value: &T) -> Option<usize> {
        self.search(|stored| stored.cmp(value))
            .ok()
            .map(|pos| self.sorted[pos])
    }

    /// Inserts `value` unless an equal one is stored; returns its index.
    pub fn insert(&mut self, value: T) -> usize {
        match self.search(|stored| stored.cmp(&value)) {
            Ok(pos) => self.sorted[pos],
            Err(pos) => self.append_at(pos, value),
        }
    }

    /// Appends `value` without a duplicate check and returns its index.
    ///
    /// The sorted index is still maintained. Callers guarantee `value` is not
    /// already stored; replaying a sequence of distinct values through this
    /// gives the same pool as inserting them one by one.
    pub fn push_back(&mut self, value: T) -> usize {
        let pos = match self.search(|stored| stored.cmp(&value)) {
            Ok(pos) | Err(pos) => pos,
        };
        self.append_at(pos, value)
    }

    fn append_at(&mut self, sorted_pos: usize, value: T) -> usize {
        let idx = self.values.len();
        self.values.push(value);
        self.sorted.insert(sorted_pos, idx);
        idx
    }

    /// Binary search over the sorted index. `order` compares a stored value
    /// against the value being looked for.
    fn search<F>(&self, mut order: F) -> Result<usize, usize>
    where
        F: FnMut(&T) -> Ordering,
    {
        self.sorted
            .binary_search_by(|&idx| order(&self.values[idx]))
    }
}

impl<'a, T> IntoIterator for &'a ValuePool<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    #[test]
    fn insert_is_idempotent() {
        let mut pool = ValuePool::new();
        assert_eq!(pool.insert("b"), 0);
        assert_eq!(pool.insert("a"), 1);
        assert_eq!(pool.insert("b"), 0);
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.values(), &["b", "a"]);
    }

    #[test]
    fn find_and_has_value() {
        let mut pool = ValuePool::with_capacity(4);
        for v in [5, 1, 9, 3] {
            pool.insert(v);
        }
        assert_eq!(pool.find(&9), Some(2));
        assert_eq!(pool.find(&4), None);
        assert!(pool.has_value(&1));
        assert!(!pool.has_value(&0));
        assert_eq!(pool.at(4), None);
    }

    #[test]
    fn push_back_keeps_lookup_working() {
        let mut pool = ValuePool::new();
        for v in [vec![3u8], vec![1], vec![2, 2]] {
            pool.push_back(v);
        }
        assert_eq!(pool.find(&vec![2, 2]), Some(2));
        assert_eq!(pool.insert(vec![1]), 1);
        assert_eq!(pool.insert(vec![0]), 3);
    }

    #[test]
    fn empty_pool() {
        let pool: ValuePool<i32> = ValuePool::default();
        assert!(pool.is_empty());
        assert!(!pool.has_value(&0));
        assert_eq!(pool.iter().count(), 0);
    }

    proptest! {
        #[test]
        fn has_value_iff_inserted(inserted in prop::collection::vec(any::<i16>(), 0..64), probe in any::<i16>()) {
            let mut pool = ValuePool::new();
            for v in &inserted {
                pool.insert(*v);
            }
            prop_assert_eq!(pool.has_value(&probe), inserted.contains(&probe));

            let distinct: BTreeSet<_> = inserted.iter().collect();
            prop_assert_eq!(pool.len(), distinct.len());
            for (idx, v) in pool.iter().enumerate() {
                prop_assert_eq!(pool.find(v), Some(idx));
            }
        }

        #[test]
        fn push_back_matches_insert(values in prop::collection::btree_set(any::<u32>(), 0..64), probe in any::<u32>()) {
            // shuffle-free but unsorted: reverse every other chunk
            let mut sequence: Vec<u32> = values.into_iter().collect();
            sequence.chunks_mut(3).step_by(2).for_each(<[u32]>::reverse);

            let mut inserted = ValuePool::new();
            let mut pushed = ValuePool::new();
            for v in &sequence {
                inserted.insert(*v);
                pushed.push_back(*v);
            }
            prop_assert_eq!(inserted.values(), pushed.values());
            prop_assert_eq!(&inserted.sorted, &pushed.sorted);
            prop_assert_eq!(inserted.has_value(&probe), pushed.has_value(&probe));
            for v in &sequence {
                prop_assert_eq!(inserted.find(v), pushed.find(v));
            }
        }
    }
}
