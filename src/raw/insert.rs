use tracing::{debug, trace};

use super::handle::Handle;
use super::node::{InnerNode, LeafNode, Node, SearchResult};
use super::raw_tree::{Path, RawBPlusTree};

impl<K: Ord + Clone, V> RawBPlusTree<K, V> {
    /// Inserts a key-value pair, splitting nodes on the way back up as needed.
    /// Returns the old value if the key was already present.
    pub(crate) fn insert(&mut self, key: K, value: V) -> Option<V> {
        let Some((leaf_handle, mut path)) = self.descend(&key) else {
            let mut leaf = LeafNode::new();
            leaf.push(key, value);
            let leaf_handle = self.nodes_mut().alloc(Node::Leaf(leaf));
            self.set_root(Some(leaf_handle));
            self.set_first_leaf(Some(leaf_handle));
            self.set_last_leaf(Some(leaf_handle));
            self.set_len(1);
            trace!(root = ?leaf_handle, "created root leaf");
            return None;
        };

        let order = self.order();
        let leaf = self.nodes_mut().get_mut(leaf_handle).as_leaf_mut();
        match leaf.search(&key) {
            // Existing key: overwrite in place, the shape does not change.
            SearchResult::Found(idx) => Some(core::mem::replace(leaf.value_mut(idx), value)),
            SearchResult::NotFound(idx) => {
                leaf.insert(idx, key, value);
                let overfull = leaf.is_overfull(order);
                self.set_len(self.len() + 1);

                if overfull {
                    self.split_leaf_and_propagate(leaf_handle, &mut path);
                }
                None
            }
        }
    }

    /// Splits an overfull leaf, splices the new right half into the leaf
    /// chain and hands a copy of its first key to the parent.
    fn split_leaf_and_propagate(&mut self, leaf_handle: Handle, path: &mut Path) {
        let order = self.order();
        let leaf = self.nodes_mut().get_mut(leaf_handle).as_leaf_mut();
        let mut right_leaf = leaf.split(order);
        let separator = right_leaf.key(0).clone();

        let old_next = leaf.next();
        right_leaf.set_prev(Some(leaf_handle));
        right_leaf.set_next(old_next);

        let right_handle = self.nodes_mut().alloc(Node::Leaf(right_leaf));
        self.nodes_mut().get_mut(leaf_handle).as_leaf_mut().set_next(Some(right_handle));

        if let Some(old_next) = old_next {
            self.nodes_mut().get_mut(old_next).as_leaf_mut().set_prev(Some(right_handle));
        }
        if self.last_leaf() == Some(leaf_handle) {
            self.set_last_leaf(Some(right_handle));
        }

        trace!(left = ?leaf_handle, right = ?right_handle, "split leaf");
        self.propagate_split(path, separator, right_handle);
    }

    /// Inserts `(separator, new_child)` into each ancestor in turn, splitting
    /// overfull inner nodes, and grows a new root if the old one split.
    fn propagate_split(&mut self, path: &mut Path, mut separator: K, mut new_child: Handle) {
        let order = self.order();

        while let Some(elem) = path.pop() {
            self.adopt(elem.node, new_child);
            let parent = self.nodes_mut().get_mut(elem.node).as_inner_mut();
            parent.insert_child(elem.child_index, separator, new_child);

            if !parent.is_overfull(order) {
                return;
            }

            // The median moves up; it is not kept in either half.
            let (median, right_inner) = parent.split(order);
            let right_handle = self.nodes_mut().alloc(Node::Inner(right_inner));
            self.adopt_children(right_handle);

            debug!(left = ?elem.node, right = ?right_handle, "split inner node");
            separator = median;
            new_child = right_handle;
        }

        let old_root = self.root().expect("`RawBPlusTree::propagate_split()` - split without a root!");
        let mut new_root = InnerNode::with_first_child(old_root);
        new_root.push_child(separator, new_child);

        let root_handle = self.nodes_mut().alloc(Node::Inner(new_root));
        self.adopt_children(root_handle);
        self.set_root(Some(root_handle));

        debug!(root = ?root_handle, height = self.height(), "root split; tree grew");
    }
}
