use core::borrow::Borrow;

use tracing::{debug, trace};

use super::handle::Handle;
use super::node::SearchResult;
use super::raw_tree::{Path, PathElement, RawBPlusTree};

impl<K: Ord + Clone, V> RawBPlusTree<K, V> {
    /// Removes a key from the tree and returns the key-value pair.
    pub(crate) fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let (leaf_handle, mut path) = self.descend(key)?;
        let order = self.order();

        let leaf = self.nodes_mut().get_mut(leaf_handle).as_leaf_mut();
        let SearchResult::Found(idx) = leaf.search(key) else {
            return None;
        };
        let entry = leaf.remove(idx);
        let underfull = leaf.is_underfull(order);
        self.set_len(self.len() - 1);

        if self.is_empty() {
            self.clear();
            return Some(entry);
        }
        // A root leaf has no minimum occupancy and no separators above it.
        if path.is_empty() {
            return Some(entry);
        }

        let survivor = if underfull {
            self.rebalance_leaf(leaf_handle, &mut path)
        } else {
            leaf_handle
        };

        // The leaf lost its smallest key, so the separator naming it is stale.
        if idx == 0 {
            self.refresh_separator(survivor);
        }

        Some(entry)
    }

    /// Fixes an underfull leaf by borrowing from a sibling or merging with
    /// one. Returns the leaf that now holds the underfull leaf's entries.
    fn rebalance_leaf(&mut self, leaf_handle: Handle, path: &mut Path) -> Handle {
        let order = self.order();
        let PathElement {
            node: parent_handle,
            child_index,
        } = *path.last().expect("`RawBPlusTree::rebalance_leaf()` - leaf has no parent!");

        let parent = self.node(parent_handle).as_inner();
        let left = child_index.checked_sub(1).map(|i| parent.child(i));
        let right = (child_index + 1 < parent.child_count()).then(|| parent.child(child_index + 1));

        if let Some(left) = left
            && self.leaf(left).can_lend(order)
        {
            self.borrow_from_left_leaf(leaf_handle, left, parent_handle, child_index);
            return leaf_handle;
        }

        if let Some(right) = right
            && self.leaf(right).can_lend(order)
        {
            self.borrow_from_right_leaf(leaf_handle, right, parent_handle, child_index);
            return leaf_handle;
        }

        // Neither sibling can spare an entry; merge, preferring the left one.
        if let Some(left) = left {
            self.merge_leaves(left, leaf_handle, path, child_index - 1);
            left
        } else {
            let right = right.expect("`RawBPlusTree::rebalance_leaf()` - leaf has no siblings!");
            self.merge_leaves(leaf_handle, right, path, child_index);
            leaf_handle
        }
    }

    /// Moves the left sibling's last entry to the front of the leaf.
    fn borrow_from_left_leaf(&mut self, leaf_handle: Handle, left_handle: Handle, parent_handle: Handle, child_idx: usize) {
        let left = self.nodes_mut().get_mut(left_handle).as_leaf_mut();
        let (key, value) = left.pop().expect("`RawBPlusTree::borrow_from_left_leaf()` - lender is empty!");

        // The borrowed key is the new minimum of the leaf.
        self.nodes_mut().get_mut(parent_handle).as_inner_mut().set_key(child_idx - 1, key.clone());
        self.nodes_mut().get_mut(leaf_handle).as_leaf_mut().push_front(key, value);

        trace!(from = ?left_handle, to = ?leaf_handle, "redistributed leaf entry rightwards");
    }

    /// Moves the right sibling's first entry to the end of the leaf.
    fn borrow_from_right_leaf(
        &mut self,
        leaf_handle: Handle,
        right_handle: Handle,
        parent_handle: Handle,
        child_idx: usize,
    ) {
        let right = self.nodes_mut().get_mut(right_handle).as_leaf_mut();
        let (key, value) = right.pop_front().expect("`RawBPlusTree::borrow_from_right_leaf()` - lender is empty!");
        let right_min = right
            .first_key()
            .expect("`RawBPlusTree::borrow_from_right_leaf()` - lender emptied!")
            .clone();

        self.nodes_mut().get_mut(parent_handle).as_inner_mut().set_key(child_idx, right_min);
        self.nodes_mut().get_mut(leaf_handle).as_leaf_mut().push(key, value);

        trace!(from = ?right_handle, to = ?leaf_handle, "redistributed leaf entry leftwards");
    }

    /// Folds `right_handle` into `left_handle`, unlinks it from the chain and
    /// drops their separator from the parent.
    fn merge_leaves(&mut self, left_handle: Handle, right_handle: Handle, path: &mut Path, separator_idx: usize) {
        let right = self.nodes_mut().take(right_handle).into_leaf();

        let left = self.nodes_mut().get_mut(left_handle).as_leaf_mut();
        left.merge_with_right(right);
        let next = left.next();

        if let Some(next) = next {
            self.nodes_mut().get_mut(next).as_leaf_mut().set_prev(Some(left_handle));
        }
        if self.last_leaf() == Some(right_handle) {
            self.set_last_leaf(Some(left_handle));
        }

        debug!(left = ?left_handle, right = ?right_handle, "merged leaves");
        self.remove_from_parent_and_propagate(path, separator_idx);
    }

    /// Drops `keys[separator_idx]` and the child right of it from the parent
    /// at the top of `path`, then repairs the parent if it underflows.
    fn remove_from_parent_and_propagate(&mut self, path: &mut Path, separator_idx: usize) {
        let order = self.order();
        let parent_handle = path.pop().expect("`RawBPlusTree::remove_from_parent_and_propagate()` - no parent!").node;

        let parent = self.nodes_mut().get_mut(parent_handle).as_inner_mut();
        // The removed child was already taken out of the arena by the merge.
        let _ = parent.remove_child(separator_idx);

        if path.is_empty() {
            if let Some(only_child) = parent.take_only_child() {
                self.collapse_root(parent_handle, only_child);
            }
            return;
        }

        if parent.is_underfull(order) {
            self.rebalance_inner(parent_handle, path);
        }
    }

    /// Replaces a root left with a single child by that child.
    fn collapse_root(&mut self, root_handle: Handle, only_child: Handle) {
        self.nodes_mut().free(root_handle);
        self.nodes_mut().get_mut(only_child).set_parent(None);
        self.set_root(Some(only_child));

        debug!(root = ?only_child, height = self.height(), "root collapsed; tree shrank");
    }

    /// Fixes an underfull inner node by rotating through the parent or merging.
    fn rebalance_inner(&mut self, node_handle: Handle, path: &mut Path) {
        let order = self.order();
        let PathElement {
            node: parent_handle,
            child_index,
        } = *path.last().expect("`RawBPlusTree::rebalance_inner()` - node has no parent!");

        let parent = self.node(parent_handle).as_inner();
        let left = child_index.checked_sub(1).map(|i| parent.child(i));
        let right = (child_index + 1 < parent.child_count()).then(|| parent.child(child_index + 1));

        if let Some(left) = left
            && self.node(left).as_inner().can_lend(order)
        {
            self.borrow_from_left_inner(node_handle, left, parent_handle, child_index);
            return;
        }

        if let Some(right) = right
            && self.node(right).as_inner().can_lend(order)
        {
            self.borrow_from_right_inner(node_handle, right, parent_handle, child_index);
            return;
        }

        if let Some(left) = left {
            self.merge_inners(left, node_handle, path, child_index - 1);
        } else {
            let right = right.expect("`RawBPlusTree::rebalance_inner()` - node has no siblings!");
            self.merge_inners(node_handle, right, path, child_index);
        }
    }

    /// Rotates the left sibling's last child through the parent separator.
    fn borrow_from_left_inner(&mut self, node_handle: Handle, left_handle: Handle, parent_handle: Handle, child_idx: usize) {
        let parent_sep = self.node(parent_handle).as_inner().key(child_idx - 1).clone();

        let left = self.nodes_mut().get_mut(left_handle).as_inner_mut();
        let (left_key, left_child) = left.pop_child().expect("`RawBPlusTree::borrow_from_left_inner()` - lender is empty!");

        self.nodes_mut().get_mut(node_handle).as_inner_mut().push_child_front(left_child, parent_sep);
        self.nodes_mut().get_mut(parent_handle).as_inner_mut().set_key(child_idx - 1, left_key);
        self.adopt(node_handle, left_child);

        trace!(from = ?left_handle, to = ?node_handle, "rotated child rightwards");
    }

    /// Rotates the right sibling's first child through the parent separator.
    fn borrow_from_right_inner(
        &mut self,
        node_handle: Handle,
        right_handle: Handle,
        parent_handle: Handle,
        child_idx: usize,
    ) {
        let parent_sep = self.node(parent_handle).as_inner().key(child_idx).clone();

        let right = self.nodes_mut().get_mut(right_handle).as_inner_mut();
        let (right_child, right_key) =
            right.pop_child_front().expect("`RawBPlusTree::borrow_from_right_inner()` - lender is empty!");

        self.nodes_mut().get_mut(node_handle).as_inner_mut().push_child(parent_sep, right_child);
        self.nodes_mut().get_mut(parent_handle).as_inner_mut().set_key(child_idx, right_key);
        self.adopt(node_handle, right_child);

        trace!(from = ?right_handle, to = ?node_handle, "rotated child leftwards");
    }

    /// Folds `right_handle` into `left_handle`, pulling their parent separator down between them.
    fn merge_inners(&mut self, left_handle: Handle, right_handle: Handle, path: &mut Path, separator_idx: usize) {
        let parent_handle = path.last().expect("`RawBPlusTree::merge_inners()` - no parent!").node;
        let separator = self.node(parent_handle).as_inner().key(separator_idx).clone();

        let right = self.nodes_mut().take(right_handle).into_inner();
        self.nodes_mut().get_mut(left_handle).as_inner_mut().merge_with_right(separator, right);
        self.adopt_children(left_handle);

        debug!(left = ?left_handle, right = ?right_handle, "merged inner nodes");
        self.remove_from_parent_and_propagate(path, separator_idx);
    }

    /// Rewrites the separator whose right subtree starts at `start`, found by
    /// climbing `parent` links to the first ancestor where the subtree is not
    /// the leftmost child.
    fn refresh_separator(&mut self, start: Handle) {
        let mut child = start;
        while let Some(parent_handle) = self.node(child).parent() {
            let position = self
                .node(parent_handle)
                .as_inner()
                .position_of(child)
                .expect("`RawBPlusTree::refresh_separator()` - child missing from its parent!");

            if position > 0 {
                let min = self.subtree_min(start).clone();
                self.nodes_mut().get_mut(parent_handle).as_inner_mut().set_key(position - 1, min);
                return;
            }
            child = parent_handle;
        }
    }
}
