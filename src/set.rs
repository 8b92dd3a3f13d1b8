use std::{borrow::Borrow, fmt::Debug};

use crate::{AvlSet, Root};

impl<K> AvlSet<K> {
    /// Makes a new, empty `AvlSet`.
    pub const fn new() -> Self {
        Self { root: Root::new() }
    }

    /// Removes every key.
    pub fn clear(&mut self) {
        self.root.clear();
    }

    pub fn len(&self) -> usize {
        self.root.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.root().is_none()
    }

    /// Height of the underlying tree: 0 when empty, 1 for a single key.
    pub fn height(&self) -> usize {
        self.root.height()
    }

    pub fn first(&self) -> Option<&K> {
        self.root.first().map(|n| &unsafe { n.as_ref() }.key)
    }

    pub fn last(&self) -> Option<&K> {
        self.root.last().map(|n| &unsafe { n.as_ref() }.key)
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.root.find(key).is_some()
    }
}

impl<K: Ord> AvlSet<K> {
    /// Adds `key` to the set.
    ///
    /// Returns whether the key was newly inserted; inserting a key that is
    /// already present leaves the set untouched.
    ///
    /// # Examples
    ///
    /// ```
    /// use avlcount::AvlSet;
    ///
    /// let mut set = AvlSet::new();
    /// assert!(set.insert(2));
    /// assert!(!set.insert(2));
    /// assert_eq!(set.len(), 1);
    /// ```
    pub fn insert(&mut self, key: K) -> bool {
        self.root.insert(key)
    }

    /// Counts the keys `k` with `low < k <= high`.
    ///
    /// The interval is open below and closed above. An empty interval
    /// (`high <= low`) counts nothing.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use avlcount::AvlSet;
    ///
    /// let set: AvlSet<_> = [1, 2, 3, 4, 5].into_iter().collect();
    /// assert_eq!(set.count_in_range(&1, &4), 3);
    /// assert_eq!(set.count_in_range(&4, &1), 0);
    /// ```
    pub fn count_in_range<Q>(&self, low: &Q, high: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        if high <= low {
            return 0;
        }
        self.count_at_most(high) - self.count_at_most(low)
    }

    /// Counts the keys less than or equal to `bound`.
    ///
    /// # Examples
    ///
    /// ```
    /// use avlcount::AvlSet;
    ///
    /// let set: AvlSet<_> = [10, 20, 30].into_iter().collect();
    /// assert_eq!(set.count_at_most(&5), 0);
    /// assert_eq!(set.count_at_most(&20), 2);
    /// assert_eq!(set.count_at_most(&99), 3);
    /// ```
    pub fn count_at_most<Q>(&self, bound: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.root.count_less(self.root.upper_bound(bound))
    }

    /// Returns the zero-based rank of `key` in sorted order, or `None` if the
    /// key is not present.
    ///
    /// # Examples
    ///
    /// ```
    /// use avlcount::AvlSet;
    ///
    /// let set: AvlSet<_> = [10, 20].into_iter().collect();
    /// assert_eq!(set.rank_of(&20), Some(1));
    /// assert_eq!(set.rank_of(&15), None);
    /// ```
    pub fn rank_of<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.root.rank_of(key)
    }
}

impl<K> Default for AvlSet<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone> Clone for AvlSet<K> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.deep_copy(),
        }
    }

    fn clone_from(&mut self, source: &Self) {
        self.root.clear();
        self.root = source.root.deep_copy();
    }
}

impl<K> Debug for AvlSet<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AvlSet")
            .field("len", &self.len())
            .field("height", &self.height())
            .finish()
    }
}

// SAFETY: the set exclusively owns its nodes, and no node is reachable from
// outside it; sharing or sending it is sharing or sending the keys.
unsafe impl<K: Send> Send for AvlSet<K> {}
unsafe impl<K: Sync> Sync for AvlSet<K> {}

impl<K: Ord> FromIterator<K> for AvlSet<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> AvlSet<K> {
        let mut set = AvlSet::new();
        set.extend(iter);
        set
    }
}

impl<K: Ord> Extend<K> for AvlSet<K> {
    #[inline]
    fn extend<T: IntoIterator<Item = K>>(&mut self, iter: T) {
        iter.into_iter().for_each(move |k| {
            self.insert(k);
        });
    }
}

impl<'a, K: Ord + Copy + 'a> Extend<&'a K> for AvlSet<K> {
    fn extend<I: IntoIterator<Item = &'a K>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied());
    }
}
