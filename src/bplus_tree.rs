use core::borrow::Borrow;
use core::fmt;
use core::ops::{Bound, Index, RangeBounds};

use crate::raw::RawBPlusTree;
use crate::{Order, OrderError};

mod iter;

pub use iter::{Iter, Keys, Range, Values};

/// Returns true when no key can satisfy both bounds.
fn is_inverted<T, R>(range: &R) -> bool
where
    T: ?Sized + Ord,
    R: RangeBounds<T>,
{
    match (range.start_bound(), range.end_bound()) {
        (Bound::Excluded(start), Bound::Excluded(end)) => start >= end,
        (Bound::Included(start) | Bound::Excluded(start), Bound::Included(end) | Bound::Excluded(end)) => start > end,
        _ => false,
    }
}

/// An ordered index based on a [B+ tree].
///
/// Keys are unique and ordered by their [`Ord`] implementation; inserting an
/// existing key replaces its value. Entries live only in leaves, and the
/// leaves are chained in key order, so [`range_scan`](Self::range_scan) and
/// [`ascending_values`](Self::ascending_values) walk the chain instead of the
/// tree.
///
/// The branching factor ([`Order`]) is chosen at construction and fixed for
/// the lifetime of the tree. Every node except the root is kept at least half
/// full, so the height stays within `O(log_m n)`.
///
/// It is a logic error for a key to be modified in such a way that the key's
/// ordering relative to any other key changes while it is in the tree. The
/// behavior resulting from such a logic error is not specified, but will be
/// encapsulated to the `BPlusTree` that observed it.
///
/// # Examples
///
/// ```
/// use bptree_index::BPlusTree;
///
/// let mut index = BPlusTree::with_order(4)?;
/// for key in [10, 20, 5, 6, 12, 30, 7, 17] {
///     index.insert(key, key * 100);
/// }
///
/// assert_eq!(index.search(&12), Some(&1200));
/// assert_eq!(index.search(&13), None);
///
/// assert!(index.delete(&20));
/// assert!(!index.delete(&20));
///
/// let keys: Vec<_> = index.range_scan(&6, &17).map(|(k, _)| *k).collect();
/// assert_eq!(keys, [6, 7, 10, 12, 17]);
/// # Ok::<(), bptree_index::OrderError>(())
/// ```
///
/// [B+ tree]: https://en.wikipedia.org/wiki/B%2B_tree
#[derive(Clone)]
pub struct BPlusTree<K, V> {
    raw: RawBPlusTree<K, V>,
}

impl<K, V> BPlusTree<K, V> {
    /// Makes a new, empty `BPlusTree` with [`Order::DEFAULT`].
    ///
    /// Does not allocate anything on its own.
    ///
    /// # Examples
    ///
    /// ```
    /// use bptree_index::{BPlusTree, Order};
    ///
    /// let mut index = BPlusTree::new();
    /// index.insert(1, "a");
    /// assert_eq!(index.order(), Order::DEFAULT);
    /// ```
    #[must_use]
    pub const fn new() -> Self {
        Self::from_order(Order::DEFAULT)
    }

    /// Makes a new, empty `BPlusTree` with an already validated order.
    #[must_use]
    pub const fn from_order(order: Order) -> Self {
        Self {
            raw: RawBPlusTree::new(order),
        }
    }

    /// Makes a new, empty `BPlusTree` whose inner nodes own at most `m` children.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::TooSmall`] when `m < 3`.
    ///
    /// # Examples
    ///
    /// ```
    /// use bptree_index::{BPlusTree, OrderError};
    ///
    /// let index: BPlusTree<u32, u32> = BPlusTree::with_order(3).unwrap();
    /// assert_eq!(index.order().get(), 3);
    ///
    /// let err = BPlusTree::<u32, u32>::with_order(2).unwrap_err();
    /// assert_eq!(err, OrderError::TooSmall { order: 2 });
    /// ```
    pub fn with_order(m: usize) -> Result<Self, OrderError> {
        Ok(Self::from_order(Order::new(m)?))
    }

    /// Returns the branching factor this tree was built with.
    #[must_use]
    pub const fn order(&self) -> Order {
        self.raw.order()
    }

    /// Returns the number of entries in the tree.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub const fn len(&self) -> usize {
        self.raw.len()
    }

    /// Returns `true` if the tree contains no entries.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Returns the number of levels: 0 when empty, 1 while the root is a leaf.
    ///
    /// # Examples
    ///
    /// ```
    /// use bptree_index::BPlusTree;
    ///
    /// let mut index = BPlusTree::with_order(3).unwrap();
    /// assert_eq!(index.height(), 0);
    /// index.extend([(1, ()), (2, ())]);
    /// assert_eq!(index.height(), 1);
    /// index.insert(3, ());
    /// assert_eq!(index.height(), 2);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    #[must_use]
    pub fn height(&self) -> usize {
        self.raw.height()
    }

    /// Removes every entry, keeping the order.
    ///
    /// # Complexity
    ///
    /// O(n)
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// Returns an iterator over the entries in ascending key order.
    ///
    /// # Examples
    ///
    /// ```
    /// use bptree_index::BPlusTree;
    ///
    /// let index: BPlusTree<_, _> = [(3, "c"), (1, "a"), (2, "b")].into_iter().collect();
    /// let entries: Vec<_> = index.iter().collect();
    /// assert_eq!(entries, [(&1, &"a"), (&2, &"b"), (&3, &"c")]);
    /// ```
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.raw)
    }

    /// Returns an iterator over the keys in ascending order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys::new(&self.raw)
    }

    /// Returns the values in ascending key order by walking the leaf chain
    /// from the first leaf.
    ///
    /// # Examples
    ///
    /// ```
    /// use bptree_index::BPlusTree;
    ///
    /// let mut index = BPlusTree::with_order(4).unwrap();
    /// index.insert(2, 'b');
    /// index.insert(1, 'a');
    /// index.insert(3, 'c');
    ///
    /// let values: String = index.ascending_values().collect();
    /// assert_eq!(values, "abc");
    /// ```
    ///
    /// # Complexity
    ///
    /// O(1) to create the iterator; O(1) per item.
    pub fn ascending_values(&self) -> Values<'_, K, V> {
        Values::new(&self.raw)
    }
}

impl<K: Ord, V> BPlusTree<K, V> {
    /// Returns the value paired with `key`, or `None` if it is absent.
    ///
    /// The key may be any borrowed form of the tree's key type, but the
    /// ordering on the borrowed form *must* match the ordering on the key type.
    ///
    /// # Examples
    ///
    /// ```
    /// use bptree_index::BPlusTree;
    ///
    /// let mut index = BPlusTree::new();
    /// index.insert(String::from("alpha"), 1);
    /// assert_eq!(index.search("alpha"), Some(&1));
    /// assert_eq!(index.search("beta"), None);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn search<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.get(key)
    }

    /// Returns `true` if the tree contains `key`.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.search(key).is_some()
    }

    /// Returns the stored key and its value.
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.get_key_value(key)
    }

    /// Returns a mutable reference to the value paired with `key`.
    ///
    /// # Examples
    ///
    /// ```
    /// use bptree_index::BPlusTree;
    ///
    /// let mut index = BPlusTree::new();
    /// index.insert(1, 10);
    /// if let Some(value) = index.get_mut(&1) {
    ///     *value += 1;
    /// }
    /// assert_eq!(index.search(&1), Some(&11));
    /// ```
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.get_mut(key)
    }

    /// Returns the entry with the smallest key.
    ///
    /// # Complexity
    ///
    /// O(1)
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.raw.first_key_value()
    }

    /// Returns the entry with the largest key.
    ///
    /// # Complexity
    ///
    /// O(1)
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.raw.last_key_value()
    }

    /// Returns the entries with `low <= key <= high` in ascending order.
    ///
    /// The scan descends once to the leaf that would hold `low` and then
    /// follows the leaf chain. An inverted range (`low > high`) is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use bptree_index::BPlusTree;
    ///
    /// let index: BPlusTree<_, _> = (0..10).map(|k| (k, k * k)).collect();
    /// let squares: Vec<_> = index.range_scan(&3, &5).map(|(_, v)| *v).collect();
    /// assert_eq!(squares, [9, 16, 25]);
    /// assert_eq!(index.range_scan(&5, &3).count(), 0);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n) to create the iterator; O(1) per item.
    pub fn range_scan<Q>(&self, low: &Q, high: &Q) -> Range<'_, K, V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.range::<Q, _>((Bound::Included(low), Bound::Included(high)))
    }

    /// Returns the entries whose keys fall in `range`, in ascending order.
    ///
    /// Unlike `BTreeMap::range`, an inverted range yields nothing instead of
    /// panicking.
    ///
    /// # Examples
    ///
    /// ```
    /// use bptree_index::BPlusTree;
    ///
    /// let index: BPlusTree<_, _> = (1..=8).map(|k| (k, ())).collect();
    /// let keys: Vec<_> = index.range(3..6).map(|(k, _)| *k).collect();
    /// assert_eq!(keys, [3, 4, 5]);
    /// let tail: Vec<_> = index.range(7..).map(|(k, _)| *k).collect();
    /// assert_eq!(tail, [7, 8]);
    /// ```
    pub fn range<T, R>(&self, range: R) -> Range<'_, K, V>
    where
        T: ?Sized + Ord,
        K: Borrow<T>,
        R: RangeBounds<T>,
    {
        if is_inverted(&range) {
            return Range::empty(&self.raw);
        }
        let front = self.raw.lower_bound(range.start_bound());
        let end = self.raw.upper_bound(range.end_bound());
        Range::new(&self.raw, front, end)
    }
}

impl<K: Ord + Clone, V> BPlusTree<K, V> {
    /// Inserts a key-value pair.
    ///
    /// If the key was absent, `None` is returned and the tree may split
    /// nodes, growing by one level when the root splits. If the key was
    /// present, its value is replaced in place and the old value returned;
    /// the key itself and the tree's shape are left untouched.
    ///
    /// # Examples
    ///
    /// ```
    /// use bptree_index::BPlusTree;
    ///
    /// let mut index = BPlusTree::new();
    /// assert_eq!(index.insert(37, "a"), None);
    /// assert_eq!(index.insert(37, "b"), Some("a"));
    /// assert_eq!(index.len(), 1);
    /// assert_eq!(index[&37], "b");
    /// ```
    ///
    /// # Complexity
    ///
    /// O(m log n)
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.raw.insert(key, value)
    }

    /// Removes `key`, returning `true` if it was present.
    ///
    /// Deleting an absent key leaves the tree unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use bptree_index::BPlusTree;
    ///
    /// let mut index = BPlusTree::new();
    /// index.insert(1, "a");
    /// assert!(index.delete(&1));
    /// assert!(!index.delete(&1));
    /// ```
    ///
    /// # Complexity
    ///
    /// O(m log n)
    pub fn delete<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.remove_entry(key).is_some()
    }

    /// Removes `key`, returning its value if it was present.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.remove_entry(key).map(|(_, v)| v)
    }

    /// Removes `key`, returning the stored key and its value.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.remove_entry(key)
    }

    /// Removes and returns the entry with the smallest key.
    ///
    /// # Examples
    ///
    /// ```
    /// use bptree_index::BPlusTree;
    ///
    /// let mut index: BPlusTree<_, _> = [(2, 'b'), (1, 'a')].into_iter().collect();
    /// assert_eq!(index.pop_first(), Some((1, 'a')));
    /// assert_eq!(index.pop_first(), Some((2, 'b')));
    /// assert_eq!(index.pop_first(), None);
    /// ```
    pub fn pop_first(&mut self) -> Option<(K, V)> {
        let key = self.raw.first_key_value()?.0.clone();
        self.raw.remove_entry(&key)
    }

    /// Removes and returns the entry with the largest key.
    pub fn pop_last(&mut self) -> Option<(K, V)> {
        let key = self.raw.last_key_value()?.0.clone();
        self.raw.remove_entry(&key)
    }
}

impl<K, V> Default for BPlusTree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for BPlusTree<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Two trees are equal when they hold the same entries, whatever their order or shape.
impl<K: PartialEq, V: PartialEq> PartialEq for BPlusTree<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: Eq, V: Eq> Eq for BPlusTree<K, V> {}

impl<K: Ord + Clone, V> FromIterator<(K, V)> for BPlusTree<K, V> {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}

impl<K: Ord + Clone, V> Extend<(K, V)> for BPlusTree<K, V> {
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<'a, K, V> IntoIterator for &'a BPlusTree<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, Q, V> Index<&Q> for BPlusTree<K, V>
where
    K: Borrow<Q> + Ord,
    Q: ?Sized + Ord,
{
    type Output = V;

    /// Returns a reference to the value corresponding to the supplied key.
    ///
    /// # Panics
    ///
    /// Panics if the key is not present in the tree.
    fn index(&self, key: &Q) -> &V {
        self.search(key).expect("no entry found for key")
    }
}
