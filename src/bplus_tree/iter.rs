use core::fmt;
use core::iter::FusedIterator;

use crate::raw::{Position, RawBPlusTree};

/// An iterator over the entries of a `BPlusTree`, in ascending key order.
///
/// This `struct` is created by the [`iter`] method on [`BPlusTree`]. See its
/// documentation for more.
///
/// [`iter`]: super::BPlusTree::iter
/// [`BPlusTree`]: super::BPlusTree
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Iter<'a, K, V> {
    tree: &'a RawBPlusTree<K, V>,
    front: Position,
    remaining: usize,
}

/// An iterator over the keys of a `BPlusTree`.
///
/// This `struct` is created by the [`keys`](super::BPlusTree::keys) method on
/// [`BPlusTree`](super::BPlusTree).
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

/// An iterator over the values of a `BPlusTree`, in ascending key order.
///
/// This `struct` is created by the
/// [`ascending_values`](super::BPlusTree::ascending_values) method on
/// [`BPlusTree`](super::BPlusTree).
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

/// An iterator over a sub-range of entries in a `BPlusTree`.
///
/// This `struct` is created by the [`range_scan`] and [`range`] methods on
/// [`BPlusTree`]. It walks the leaf chain from the first entry in range and
/// stops at the first entry past the end.
///
/// [`range_scan`]: super::BPlusTree::range_scan
/// [`range`]: super::BPlusTree::range
/// [`BPlusTree`]: super::BPlusTree
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Range<'a, K, V> {
    tree: &'a RawBPlusTree<K, V>,
    front: Position,
    end: Position,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(super) fn new(tree: &'a RawBPlusTree<K, V>) -> Self {
        let front = tree.first_leaf().and_then(|leaf| tree.normalize(leaf, 0));
        Self {
            tree,
            front,
            remaining: tree.len(),
        }
    }
}

impl<'a, K, V> Keys<'a, K, V> {
    pub(super) fn new(tree: &'a RawBPlusTree<K, V>) -> Self {
        Self { inner: Iter::new(tree) }
    }
}

impl<'a, K, V> Values<'a, K, V> {
    pub(super) fn new(tree: &'a RawBPlusTree<K, V>) -> Self {
        Self { inner: Iter::new(tree) }
    }
}

impl<'a, K, V> Range<'a, K, V> {
    pub(super) fn new(tree: &'a RawBPlusTree<K, V>, front: Position, end: Position) -> Self {
        Self { tree, front, end }
    }

    pub(super) fn empty(tree: &'a RawBPlusTree<K, V>) -> Self {
        Self {
            tree,
            front: None,
            end: None,
        }
    }
}

impl<'a, K: 'a, V: 'a> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let (leaf_handle, index) = self.front?;
        let leaf = self.tree.leaf(leaf_handle);

        self.remaining -= 1;
        self.front = self.tree.normalize(leaf_handle, index + 1);

        Some((leaf.key(index), leaf.value(index)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree,
            front: self.front,
            remaining: self.remaining,
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Iter<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

impl<'a, K: 'a, V: 'a> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

impl<K, V> FusedIterator for Keys<'_, K, V> {}

impl<'a, K: 'a, V: 'a> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

impl<K, V> FusedIterator for Values<'_, K, V> {}

impl<'a, K: 'a, V: 'a> Iterator for Range<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.front == self.end {
            return None;
        }
        let (leaf_handle, index) = self.front?;
        let leaf = self.tree.leaf(leaf_handle);
        self.front = self.tree.normalize(leaf_handle, index + 1);

        Some((leaf.key(index), leaf.value(index)))
    }
}

impl<K, V> FusedIterator for Range<'_, K, V> {}

impl<K, V> Clone for Range<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree,
            front: self.front,
            end: self.end,
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Range<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}
