use core::borrow::Borrow;
use core::ops::Bound;

use smallvec::SmallVec;

use super::arena::Arena;
use super::handle::Handle;
use super::node::{LeafNode, Node, SearchResult};
use crate::Order;

/// The B+ tree behind `BPlusTree`.
///
/// Every node lives in `nodes`; inner nodes own their children by handle.
/// `parent`, `prev`/`next`, `first_leaf` and `last_leaf` are navigation
/// links only and are rewritten by the split, merge and rotation routines.
#[derive(Clone)]
pub(crate) struct RawBPlusTree<K, V> {
    order: Order,
    nodes: Arena<Node<K, V>>,
    /// The root node, if the tree is non-empty.
    root: Option<Handle>,
    /// Total number of entries.
    len: usize,
    /// Leftmost leaf, where ascending traversal starts.
    first_leaf: Option<Handle>,
    /// Rightmost leaf.
    last_leaf: Option<Handle>,
}

/// One step of a root-to-leaf descent.
#[derive(Clone, Copy, Debug)]
pub(crate) struct PathElement {
    /// Inner node visited.
    pub(crate) node: Handle,
    /// Index of the child we descended into.
    pub(crate) child_index: usize,
}

/// Inner nodes visited on the way to a leaf, root first.
pub(crate) type Path = SmallVec<[PathElement; 16]>;

/// A position in the leaf chain; `None` is one past the last entry.
pub(crate) type Position = Option<(Handle, usize)>;

impl<K, V> RawBPlusTree<K, V> {
    pub(crate) const fn new(order: Order) -> Self {
        Self {
            order,
            nodes: Arena::new(),
            root: None,
            len: 0,
            first_leaf: None,
            last_leaf: None,
        }
    }

    pub(crate) const fn order(&self) -> Order {
        self.order
    }

    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    pub(crate) const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
        self.len = 0;
        self.first_leaf = None;
        self.last_leaf = None;
    }

    pub(crate) fn first_leaf(&self) -> Option<Handle> {
        self.first_leaf
    }

    pub(crate) fn node(&self, handle: Handle) -> &Node<K, V> {
        self.nodes.get(handle)
    }

    pub(crate) fn leaf(&self, handle: Handle) -> &LeafNode<K, V> {
        self.nodes.get(handle).as_leaf()
    }

    /// Number of levels, counted by following `parent` links up from the
    /// first leaf. An empty tree has height 0 and a lone leaf height 1.
    pub(crate) fn height(&self) -> usize {
        let mut height = 0;
        let mut current = self.first_leaf;
        while let Some(handle) = current {
            height += 1;
            current = self.nodes.get(handle).parent();
        }
        height
    }

    /// Moves `(leaf, index)` past the end of its leaf onto the next one.
    pub(crate) fn normalize(&self, leaf: Handle, index: usize) -> Position {
        let node = self.leaf(leaf);
        if index < node.key_count() {
            Some((leaf, index))
        } else {
            node.next().map(|next| (next, 0))
        }
    }

    /// Raw access used by the insert and remove routines.
    pub(super) fn nodes_mut(&mut self) -> &mut Arena<Node<K, V>> {
        &mut self.nodes
    }

    pub(super) fn root(&self) -> Option<Handle> {
        self.root
    }

    pub(super) fn set_root(&mut self, root: Option<Handle>) {
        self.root = root;
    }

    pub(super) fn set_len(&mut self, len: usize) {
        self.len = len;
    }

    pub(super) fn set_first_leaf(&mut self, leaf: Option<Handle>) {
        self.first_leaf = leaf;
    }

    pub(super) fn last_leaf(&self) -> Option<Handle> {
        self.last_leaf
    }

    pub(super) fn set_last_leaf(&mut self, leaf: Option<Handle>) {
        self.last_leaf = leaf;
    }

    /// Writes `parent` into the node at `child`.
    pub(super) fn adopt(&mut self, parent: Handle, child: Handle) {
        self.nodes.get_mut(child).set_parent(Some(parent));
    }

    /// Points every child of the inner node `parent` back at it.
    pub(super) fn adopt_children(&mut self, parent: Handle) {
        for i in 0..self.nodes.get(parent).as_inner().child_count() {
            let child = self.nodes.get(parent).as_inner().child(i);
            self.adopt(parent, child);
        }
    }
}

impl<K: Ord, V> RawBPlusTree<K, V> {
    /// Walks from the root to the leaf that would hold `key`, recording the path.
    pub(crate) fn descend<Q>(&self, key: &Q) -> Option<(Handle, Path)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut current = self.root?;
        let mut path = Path::new();

        loop {
            match self.nodes.get(current) {
                Node::Inner(inner) => {
                    let child_index = inner.search_child(key);
                    path.push(PathElement {
                        node: current,
                        child_index,
                    });
                    current = inner.child(child_index);
                }
                Node::Leaf(_) => return Some((current, path)),
            }
        }
    }

    /// Leaf that would hold `key`, without recording the path.
    fn find_leaf<Q>(&self, key: &Q) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut current = self.root?;
        while let Node::Inner(inner) = self.nodes.get(current) {
            current = inner.child(inner.search_child(key));
        }
        Some(current)
    }

    /// Searches for a key and returns the leaf handle and index if found.
    pub(crate) fn search<Q>(&self, key: &Q) -> Option<(Handle, usize)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let leaf_handle = self.find_leaf(key)?;
        match self.leaf(leaf_handle).search(key) {
            SearchResult::Found(idx) => Some((leaf_handle, idx)),
            SearchResult::NotFound(_) => None,
        }
    }

    pub(crate) fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let (leaf_handle, idx) = self.search(key)?;
        Some(self.leaf(leaf_handle).value(idx))
    }

    pub(crate) fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let (leaf_handle, idx) = self.search(key)?;
        Some(self.nodes.get_mut(leaf_handle).as_leaf_mut().value_mut(idx))
    }

    pub(crate) fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let (leaf_handle, idx) = self.search(key)?;
        let leaf = self.leaf(leaf_handle);
        Some((leaf.key(idx), leaf.value(idx)))
    }

    pub(crate) fn first_key_value(&self) -> Option<(&K, &V)> {
        let leaf = self.leaf(self.first_leaf?);
        if leaf.is_empty() {
            return None;
        }
        Some((leaf.key(0), leaf.value(0)))
    }

    pub(crate) fn last_key_value(&self) -> Option<(&K, &V)> {
        let leaf = self.leaf(self.last_leaf?);
        let last = leaf.key_count().checked_sub(1)?;
        Some((leaf.key(last), leaf.value(last)))
    }

    /// Smallest key in the subtree rooted at `handle`.
    pub(crate) fn subtree_min(&self, handle: Handle) -> &K {
        let mut current = handle;
        loop {
            match self.nodes.get(current) {
                Node::Inner(inner) => current = inner.child(0),
                Node::Leaf(leaf) => {
                    return leaf.first_key().expect("`RawBPlusTree::subtree_min()` - empty leaf below the root!");
                }
            }
        }
    }

    /// First position whose key satisfies the lower `bound`.
    pub(crate) fn lower_bound<Q>(&self, bound: Bound<&Q>) -> Position
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        match bound {
            Bound::Unbounded => self.first_leaf.and_then(|leaf| self.normalize(leaf, 0)),
            Bound::Included(key) => {
                let leaf = self.find_leaf(key)?;
                self.normalize(leaf, self.leaf(leaf).count_below(key))
            }
            Bound::Excluded(key) => {
                let leaf = self.find_leaf(key)?;
                self.normalize(leaf, self.leaf(leaf).count_at_most(key))
            }
        }
    }

    /// First position past every key that satisfies the upper `bound`.
    pub(crate) fn upper_bound<Q>(&self, bound: Bound<&Q>) -> Position
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        match bound {
            Bound::Unbounded => None,
            Bound::Included(key) => {
                let leaf = self.find_leaf(key)?;
                self.normalize(leaf, self.leaf(leaf).count_at_most(key))
            }
            Bound::Excluded(key) => {
                let leaf = self.find_leaf(key)?;
                self.normalize(leaf, self.leaf(leaf).count_below(key))
            }
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
#[allow(clippy::uninlined_format_args)]
pub(crate) mod tests {
    use super::*;
    use alloc::format;
    use alloc::string::String;
    use alloc::vec::Vec;
    use core::fmt::Debug;

    impl<K: Ord + Clone + Debug, V> RawBPlusTree<K, V> {
        /// Checks every structural invariant and panics with the full list of violations.
        pub(crate) fn validate_invariants(&self) {
            let Some(root) = self.root else {
                assert_eq!(self.len, 0, "Empty tree should have len 0");
                assert!(self.first_leaf.is_none(), "Empty tree should have no first_leaf");
                assert!(self.last_leaf.is_none(), "Empty tree should have no last_leaf");
                assert_eq!(self.nodes.len(), 0, "Empty tree should own no nodes");
                return;
            };

            let mut errors: Vec<String> = Vec::new();
            let mut leaves: Vec<Handle> = Vec::new();
            let mut leaf_depth: Option<usize> = None;

            if self.nodes.get(root).parent().is_some() {
                errors.push(format!("root {:?} has a parent", root));
            }
            let (_, count) = self.validate_node(root, 0, &mut leaf_depth, &mut leaves, &mut errors);

            if count != self.len {
                errors.push(format!("len mismatch: self.len={}, actual count={}", self.len, count));
            }
            let reachable: usize = self.levels().iter().map(Vec::len).sum();
            if self.nodes.len() != reachable {
                errors.push(format!("arena holds {} nodes but {} are reachable", self.nodes.len(), reachable));
            }
            if self.height() != leaf_depth.map_or(0, |d| d + 1) {
                errors.push(format!("height() = {} but leaves sit at depth {:?}", self.height(), leaf_depth));
            }

            self.validate_leaf_chain(&leaves, &mut errors);

            assert!(errors.is_empty(), "Tree invariant violations:\n{}", errors.join("\n"));
        }

        /// Returns (smallest key, entry count) of the subtree.
        fn validate_node(
            &self,
            handle: Handle,
            depth: usize,
            leaf_depth: &mut Option<usize>,
            leaves: &mut Vec<Handle>,
            errors: &mut Vec<String>,
        ) -> (Option<K>, usize) {
            let is_root = Some(handle) == self.root;
            match self.nodes.get(handle) {
                Node::Leaf(leaf) => {
                    match *leaf_depth {
                        None => *leaf_depth = Some(depth),
                        Some(expected) if expected != depth => errors.push(format!(
                            "Leaf depth mismatch: expected {}, got {} at {:?}",
                            expected, depth, handle
                        )),
                        Some(_) => {}
                    }

                    if leaf.keys().windows(2).any(|w| w[0] >= w[1]) {
                        errors.push(format!("Leaf keys not strictly ascending at {:?}: {:?}", handle, leaf.keys()));
                    }
                    if leaf.is_overfull(self.order) {
                        errors.push(format!("Leaf {:?} overfull with {} keys", handle, leaf.key_count()));
                    }
                    if !is_root && leaf.is_underfull(self.order) {
                        errors.push(format!("Leaf {:?} underfull with {} keys", handle, leaf.key_count()));
                    }

                    leaves.push(handle);
                    (leaf.first_key().cloned(), leaf.key_count())
                }
                Node::Inner(inner) => {
                    if inner.child_count() != inner.key_count() + 1 {
                        errors.push(format!(
                            "Inner {:?} has {} keys but {} children",
                            handle,
                            inner.key_count(),
                            inner.child_count()
                        ));
                    }
                    if inner.keys().windows(2).any(|w| w[0] >= w[1]) {
                        errors.push(format!("Inner keys not strictly ascending at {:?}: {:?}", handle, inner.keys()));
                    }
                    if inner.is_overfull(self.order) {
                        errors.push(format!("Inner {:?} overfull with {} children", handle, inner.child_count()));
                    }
                    if is_root && inner.child_count() < 2 {
                        errors.push(format!("Inner root {:?} has {} children", handle, inner.child_count()));
                    }
                    if !is_root && inner.is_underfull(self.order) {
                        errors.push(format!("Inner {:?} underfull with {} children", handle, inner.child_count()));
                    }

                    let mut total = 0;
                    let mut min_key = None;
                    for (i, &child) in inner.children().iter().enumerate() {
                        if self.nodes.get(child).parent() != Some(handle) {
                            errors.push(format!(
                                "Child {:?} of {:?} has parent {:?}",
                                child,
                                handle,
                                self.nodes.get(child).parent()
                            ));
                        }

                        let (child_min, count) = self.validate_node(child, depth + 1, leaf_depth, leaves, errors);
                        total += count;
                        if i == 0 {
                            min_key = child_min;
                        } else if child_min.as_ref() != Some(inner.key(i - 1)) {
                            errors.push(format!(
                                "Separator {:?} at {:?}[{}] is not the minimum {:?} of its right subtree",
                                inner.key(i - 1),
                                handle,
                                i - 1,
                                child_min
                            ));
                        }
                    }
                    (min_key, total)
                }
            }
        }

        fn validate_leaf_chain(&self, leaves: &[Handle], errors: &mut Vec<String>) {
            if self.first_leaf != leaves.first().copied() {
                errors.push(format!("first_leaf mismatch: expected {:?}, got {:?}", leaves.first(), self.first_leaf));
            }
            if self.last_leaf != leaves.last().copied() {
                errors.push(format!("last_leaf mismatch: expected {:?}, got {:?}", leaves.last(), self.last_leaf));
            }

            for (i, &handle) in leaves.iter().enumerate() {
                let leaf = self.leaf(handle);
                let expected_next = leaves.get(i + 1).copied();
                let expected_prev = i.checked_sub(1).map(|p| leaves[p]);
                if leaf.next() != expected_next {
                    errors.push(format!(
                        "Leaf chain next mismatch at {}: expected {:?}, got {:?}",
                        i,
                        expected_next,
                        leaf.next()
                    ));
                }
                if leaf.prev() != expected_prev {
                    errors.push(format!(
                        "Leaf chain prev mismatch at {}: expected {:?}, got {:?}",
                        i,
                        expected_prev,
                        leaf.prev()
                    ));
                }
            }

            // Chain order must be ascending across leaf boundaries, too.
            let mut previous: Option<&K> = None;
            let mut current = self.first_leaf;
            while let Some(handle) = current {
                for key in self.leaf(handle).keys() {
                    if previous.is_some_and(|p| p >= key) {
                        errors.push(format!("Leaf chain out of order at key {:?}", key));
                    }
                    previous = Some(key);
                }
                current = self.leaf(handle).next();
            }
        }

        /// Keys of every node, level by level; used to pin down exact shapes.
        pub(crate) fn levels(&self) -> Vec<Vec<Vec<K>>> {
            let mut levels = Vec::new();
            let mut frontier: Vec<Handle> = self.root.into_iter().collect();
            while !frontier.is_empty() {
                let mut next = Vec::new();
                let mut level = Vec::new();
                for handle in frontier {
                    match self.nodes.get(handle) {
                        Node::Inner(inner) => {
                            level.push(inner.keys().to_vec());
                            next.extend_from_slice(inner.children());
                        }
                        Node::Leaf(leaf) => level.push(leaf.keys().to_vec()),
                    }
                }
                levels.push(level);
                frontier = next;
            }
            levels
        }
    }

    #[test]
    fn empty_tree_lookups() {
        let tree: RawBPlusTree<i32, i32> = RawBPlusTree::new(Order::new(4).unwrap());
        assert!(tree.search(&1).is_none());
        assert!(tree.first_key_value().is_none());
        assert!(tree.last_key_value().is_none());
        assert_eq!(tree.height(), 0);
        assert_eq!(tree.lower_bound(Bound::Included(&1)), None);
        assert_eq!(tree.upper_bound::<i32>(Bound::Unbounded), None);
        tree.validate_invariants();
    }

    #[test]
    fn bounds_land_on_chain_positions() {
        let mut tree = RawBPlusTree::new(Order::new(3).unwrap());
        for key in (0..20).map(|k| k * 2) {
            tree.insert(key, ());
        }
        tree.validate_invariants();

        let key_at = |pos: Position| pos.map(|(leaf, idx)| *tree.leaf(leaf).key(idx));
        assert_eq!(key_at(tree.lower_bound(Bound::Included(&7))), Some(8));
        assert_eq!(key_at(tree.lower_bound(Bound::Included(&8))), Some(8));
        assert_eq!(key_at(tree.lower_bound(Bound::Excluded(&8))), Some(10));
        assert_eq!(key_at(tree.upper_bound(Bound::Included(&8))), Some(10));
        assert_eq!(key_at(tree.upper_bound(Bound::Excluded(&8))), Some(8));
        assert_eq!(key_at(tree.lower_bound(Bound::Included(&39))), None);
        assert_eq!(key_at(tree.lower_bound(Bound::Included(&-5))), Some(0));
    }

    #[test]
    fn height_follows_parent_links() {
        let mut tree = RawBPlusTree::new(Order::new(3).unwrap());
        tree.insert(1, 'a');
        assert_eq!(tree.height(), 1);
        tree.insert(2, 'b');
        tree.insert(3, 'c');
        assert_eq!(tree.height(), 2);
        for key in 4..=9 {
            tree.insert(key, 'x');
        }
        tree.validate_invariants();
        assert!(tree.height() >= 3);
    }
}
