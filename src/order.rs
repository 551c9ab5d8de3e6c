use crate::OrderError;

/// The branching factor `m` of a [`BPlusTree`](crate::BPlusTree).
///
/// An inner node owns at most `m` children and a leaf holds at most `m - 1`
/// entries. Every node except the root stays at least half full:
/// leaves keep `⌈m/2⌉ - 1` entries and inner nodes keep `⌈m/2⌉` children.
///
/// # Examples
///
/// ```
/// use bptree_index::Order;
///
/// let order = Order::new(4).unwrap();
/// assert_eq!(order.max_keys(), 3);
/// assert_eq!(order.min_leaf_keys(), 1);
/// assert_eq!(order.min_children(), 2);
///
/// assert!(Order::new(2).is_err());
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Order(usize);

impl Order {
    /// The smallest order for which a split yields two valid nodes.
    pub const MIN: usize = 3;

    /// The order used by [`BPlusTree::new`](crate::BPlusTree::new).
    pub const DEFAULT: Self = Self(32);

    /// Validates `m` as a branching factor.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::TooSmall`] when `m < Order::MIN`.
    pub const fn new(m: usize) -> Result<Self, OrderError> {
        if m < Self::MIN {
            return Err(OrderError::TooSmall { order: m });
        }
        Ok(Self(m))
    }

    /// Returns `m`.
    #[must_use]
    pub const fn get(self) -> usize {
        self.0
    }

    /// Maximum number of children of an inner node (`m`).
    #[must_use]
    pub const fn max_children(self) -> usize {
        self.0
    }

    /// Minimum number of children of a non-root inner node (`⌈m/2⌉`).
    #[must_use]
    pub const fn min_children(self) -> usize {
        self.0.div_ceil(2)
    }

    /// Maximum number of keys in any node (`m - 1`).
    #[must_use]
    pub const fn max_keys(self) -> usize {
        self.0 - 1
    }

    /// Minimum number of entries in a non-root leaf (`⌈m/2⌉ - 1`).
    #[must_use]
    pub const fn min_leaf_keys(self) -> usize {
        self.min_children() - 1
    }

    /// Minimum number of separator keys in a non-root inner node.
    #[must_use]
    pub const fn min_inner_keys(self) -> usize {
        self.min_children() - 1
    }

    /// Number of entries the left half keeps when an overfull leaf splits (`⌊m/2⌋`).
    pub(crate) const fn leaf_split_point(self) -> usize {
        self.0 / 2
    }
}

impl Default for Order {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<usize> for Order {
    type Error = OrderError;

    fn try_from(m: usize) -> Result<Self, Self::Error> {
        Self::new(m)
    }
}

impl From<Order> for usize {
    fn from(order: Order) -> Self {
        order.get()
    }
}
