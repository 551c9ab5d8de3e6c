use core::borrow::Borrow;

use smallvec::SmallVec;

use super::handle::Handle;
use crate::Order;

/// Entries stored inline before a node spills to the heap.
const INLINE: usize = 8;

type Keys<K> = SmallVec<[K; INLINE]>;

#[derive(Clone)]
pub(crate) enum Node<K, V> {
    Inner(InnerNode<K>),
    Leaf(LeafNode<K, V>),
}

// Inner nodes route descent: keys[i] is the smallest key below children[i + 1].
#[derive(Clone)]
pub(crate) struct InnerNode<K> {
    parent: Option<Handle>,
    keys: Keys<K>,
    children: SmallVec<[Handle; INLINE + 1]>,
}

// Leaf nodes hold the entries; prev/next chain every leaf in key order.
#[derive(Clone)]
pub(crate) struct LeafNode<K, V> {
    parent: Option<Handle>,
    prev: Option<Handle>,
    next: Option<Handle>,
    keys: Keys<K>,
    values: SmallVec<[V; INLINE]>,
}

/// Result of searching for a key in a leaf.
pub(crate) enum SearchResult {
    /// Key was found at the given index.
    Found(usize),
    /// Key was not found; index is where it would be inserted.
    NotFound(usize),
}

impl<K, V> Node<K, V> {
    /// Returns the leaf node, panicking if this is not a leaf.
    pub(crate) fn as_leaf(&self) -> &LeafNode<K, V> {
        match self {
            Node::Leaf(leaf) => leaf,
            Node::Inner(_) => panic!("expected leaf node"),
        }
    }

    /// Returns the leaf node mutably, panicking if this is not a leaf.
    pub(crate) fn as_leaf_mut(&mut self) -> &mut LeafNode<K, V> {
        match self {
            Node::Leaf(leaf) => leaf,
            Node::Inner(_) => panic!("expected leaf node"),
        }
    }

    /// Returns the inner node, panicking if this is a leaf.
    pub(crate) fn as_inner(&self) -> &InnerNode<K> {
        match self {
            Node::Inner(inner) => inner,
            Node::Leaf(_) => panic!("expected inner node"),
        }
    }

    /// Returns the inner node mutably, panicking if this is a leaf.
    pub(crate) fn as_inner_mut(&mut self) -> &mut InnerNode<K> {
        match self {
            Node::Inner(inner) => inner,
            Node::Leaf(_) => panic!("expected inner node"),
        }
    }

    pub(crate) fn into_leaf(self) -> LeafNode<K, V> {
        match self {
            Node::Leaf(leaf) => leaf,
            Node::Inner(_) => panic!("expected leaf node"),
        }
    }

    pub(crate) fn into_inner(self) -> InnerNode<K> {
        match self {
            Node::Inner(inner) => inner,
            Node::Leaf(_) => panic!("expected inner node"),
        }
    }

    pub(crate) fn parent(&self) -> Option<Handle> {
        match self {
            Node::Inner(inner) => inner.parent,
            Node::Leaf(leaf) => leaf.parent,
        }
    }

    pub(crate) fn set_parent(&mut self, parent: Option<Handle>) {
        match self {
            Node::Inner(inner) => inner.parent = parent,
            Node::Leaf(leaf) => leaf.parent = parent,
        }
    }
}

impl<K> InnerNode<K> {
    /// Creates an inner node with a single child and no keys yet.
    pub(crate) fn with_first_child(child: Handle) -> Self {
        let mut children = SmallVec::new();
        children.push(child);
        Self {
            parent: None,
            keys: SmallVec::new(),
            children,
        }
    }

    pub(crate) fn key_count(&self) -> usize {
        self.keys.len()
    }

    pub(crate) fn child_count(&self) -> usize {
        self.children.len()
    }

    /// More than `m` children; must split.
    pub(crate) fn is_overfull(&self, order: Order) -> bool {
        self.children.len() > order.max_children()
    }

    /// Fewer than `⌈m/2⌉` children; must borrow or merge unless it is the root.
    pub(crate) fn is_underfull(&self, order: Order) -> bool {
        self.children.len() < order.min_children()
    }

    /// Can give a child to a sibling and stay legal.
    pub(crate) fn can_lend(&self, order: Order) -> bool {
        self.children.len() > order.min_children()
    }

    #[inline]
    pub(crate) fn key(&self, index: usize) -> &K {
        &self.keys[index]
    }

    pub(crate) fn keys(&self) -> &[K] {
        &self.keys
    }

    #[inline]
    pub(crate) fn child(&self, index: usize) -> Handle {
        self.children[index]
    }

    pub(crate) fn children(&self) -> &[Handle] {
        &self.children
    }

    /// Position of `child` in this node's child list.
    pub(crate) fn position_of(&self, child: Handle) -> Option<usize> {
        self.children.iter().position(|&c| c == child)
    }

    /// Index of the child whose subtree may contain `key`: the first `i`
    /// with `key < keys[i]`, or the last child.
    #[inline]
    pub(crate) fn search_child<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.keys.partition_point(|k| k.borrow() <= key)
    }

    /// Inserts `key` at `index` and `child` directly to its right.
    pub(crate) fn insert_child(&mut self, index: usize, key: K, child: Handle) {
        self.keys.insert(index, key);
        self.children.insert(index + 1, child);
    }

    /// Removes `keys[index]` together with the child to its right.
    pub(crate) fn remove_child(&mut self, index: usize) -> (K, Handle) {
        let key = self.keys.remove(index);
        let child = self.children.remove(index + 1);
        (key, child)
    }

    pub(crate) fn push_child(&mut self, key: K, child: Handle) {
        self.keys.push(key);
        self.children.push(child);
    }

    /// Prepends `child` as the new first child, with `key` separating it from the old one.
    pub(crate) fn push_child_front(&mut self, child: Handle, key: K) {
        self.children.insert(0, child);
        self.keys.insert(0, key);
    }

    /// Pops the last key and last child.
    pub(crate) fn pop_child(&mut self) -> Option<(K, Handle)> {
        let key = self.keys.pop()?;
        let child = self.children.pop()?;
        Some((key, child))
    }

    /// Pops the first child and the key that followed it.
    pub(crate) fn pop_child_front(&mut self) -> Option<(Handle, K)> {
        if self.keys.is_empty() {
            return None;
        }
        let child = self.children.remove(0);
        let key = self.keys.remove(0);
        Some((child, key))
    }

    pub(crate) fn set_key(&mut self, index: usize, key: K) {
        self.keys[index] = key;
    }

    /// Splits an overfull node. The left half keeps `⌈m/2⌉` children; the
    /// key between the halves is returned for promotion and kept in neither.
    pub(crate) fn split(&mut self, order: Order) -> (K, InnerNode<K>) {
        let keep = order.min_children();

        let right = InnerNode {
            parent: self.parent,
            keys: self.keys.drain(keep..).collect(),
            children: self.children.drain(keep..).collect(),
        };
        let median = self.keys.pop().expect("`InnerNode::split()` - node has no median key!");

        (median, right)
    }

    /// Appends `separator` and all of `right`'s keys and children.
    pub(crate) fn merge_with_right(&mut self, separator: K, mut right: InnerNode<K>) {
        self.keys.push(separator);
        self.keys.append(&mut right.keys);
        self.children.append(&mut right.children);
    }

    /// Removes and returns the only remaining child of a keyless node.
    pub(crate) fn take_only_child(&mut self) -> Option<Handle> {
        if self.keys.is_empty() && self.children.len() == 1 {
            self.children.pop()
        } else {
            None
        }
    }
}

impl<K, V> LeafNode<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            parent: None,
            prev: None,
            next: None,
            keys: SmallVec::new(),
            values: SmallVec::new(),
        }
    }

    pub(crate) fn key_count(&self) -> usize {
        self.keys.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Holds `m` entries; must split.
    pub(crate) fn is_overfull(&self, order: Order) -> bool {
        self.keys.len() > order.max_keys()
    }

    /// Fewer than `⌈m/2⌉ - 1` entries; must borrow or merge unless it is the root.
    pub(crate) fn is_underfull(&self, order: Order) -> bool {
        self.keys.len() < order.min_leaf_keys()
    }

    pub(crate) fn can_lend(&self, order: Order) -> bool {
        self.keys.len() > order.min_leaf_keys()
    }

    pub(crate) fn prev(&self) -> Option<Handle> {
        self.prev
    }

    pub(crate) fn set_prev(&mut self, prev: Option<Handle>) {
        self.prev = prev;
    }

    pub(crate) fn next(&self) -> Option<Handle> {
        self.next
    }

    pub(crate) fn set_next(&mut self, next: Option<Handle>) {
        self.next = next;
    }

    #[inline]
    pub(crate) fn key(&self, index: usize) -> &K {
        &self.keys[index]
    }

    pub(crate) fn keys(&self) -> &[K] {
        &self.keys
    }

    #[inline]
    pub(crate) fn value(&self, index: usize) -> &V {
        &self.values[index]
    }

    #[inline]
    pub(crate) fn value_mut(&mut self, index: usize) -> &mut V {
        &mut self.values[index]
    }

    pub(crate) fn first_key(&self) -> Option<&K> {
        self.keys.first()
    }

    /// Binary search for `key` by `Ord` equality.
    #[inline]
    pub(crate) fn search<Q>(&self, key: &Q) -> SearchResult
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        match self.keys.binary_search_by(|k| k.borrow().cmp(key)) {
            Ok(idx) => SearchResult::Found(idx),
            Err(idx) => SearchResult::NotFound(idx),
        }
    }

    /// Number of keys strictly less than `key`.
    pub(crate) fn count_below<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.keys.partition_point(|k| k.borrow() < key)
    }

    /// Number of keys less than or equal to `key`.
    pub(crate) fn count_at_most<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.keys.partition_point(|k| k.borrow() <= key)
    }

    pub(crate) fn insert(&mut self, index: usize, key: K, value: V) {
        self.keys.insert(index, key);
        self.values.insert(index, value);
    }

    pub(crate) fn remove(&mut self, index: usize) -> (K, V) {
        let key = self.keys.remove(index);
        let value = self.values.remove(index);
        (key, value)
    }

    pub(crate) fn push(&mut self, key: K, value: V) {
        self.keys.push(key);
        self.values.push(value);
    }

    pub(crate) fn push_front(&mut self, key: K, value: V) {
        self.keys.insert(0, key);
        self.values.insert(0, value);
    }

    pub(crate) fn pop(&mut self) -> Option<(K, V)> {
        let key = self.keys.pop()?;
        let value = self.values.pop()?;
        Some((key, value))
    }

    pub(crate) fn pop_front(&mut self) -> Option<(K, V)> {
        if self.keys.is_empty() {
            return None;
        }
        Some((self.keys.remove(0), self.values.remove(0)))
    }

    /// Splits an overfull leaf. The left half keeps `⌊m/2⌋` entries and the
    /// returned right half takes the rest; the caller copies its first key up.
    pub(crate) fn split(&mut self, order: Order) -> LeafNode<K, V> {
        let keep = order.leaf_split_point();

        LeafNode {
            parent: self.parent,
            prev: None,
            next: None,
            keys: self.keys.drain(keep..).collect(),
            values: self.values.drain(keep..).collect(),
        }
    }

    /// Appends every entry of `right` and takes over its `next` link.
    pub(crate) fn merge_with_right(&mut self, mut right: LeafNode<K, V>) {
        self.keys.append(&mut right.keys);
        self.values.append(&mut right.values);
        self.next = right.next;
    }
}
