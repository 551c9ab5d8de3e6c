//! An in-memory ordered index built on a B+ tree.
//!
//! [`BPlusTree`] maps unique, totally ordered keys to values. Entries live only
//! in leaves, and the leaves are chained in key order, so range scans descend
//! once and then walk sideways:
//!
//! - [`search`](BPlusTree::search) - Point lookup in O(log n)
//! - [`insert`](BPlusTree::insert) - Insert or overwrite, splitting full nodes on the way back up
//! - [`delete`](BPlusTree::delete) - Remove a key, borrowing from or merging with siblings on underflow
//! - [`range_scan`](BPlusTree::range_scan) - Every entry with `low <= key <= high`, in ascending order
//! - [`ascending_values`](BPlusTree::ascending_values) - Every value, in ascending key order
//!
//! # Example
//!
//! ```
//! use bptree_index::BPlusTree;
//!
//! let mut index = BPlusTree::with_order(4)?;
//! for key in [10, 20, 5, 6, 12, 30, 7, 17] {
//!     index.insert(key, key);
//! }
//!
//! let values: Vec<_> = index.ascending_values().copied().collect();
//! assert_eq!(values, [5, 6, 7, 10, 12, 17, 20, 30]);
//!
//! index.delete(&20);
//! assert_eq!(index.range_scan(&5, &30).count(), 7);
//! # Ok::<(), bptree_index::OrderError>(())
//! ```
//!
//! # Features
//!
//! - **`no_std` compatible** - Only requires `alloc`, no standard library dependency
//! - **Configurable order** - The branching factor is fixed per tree and validated by [`Order`]
//! - **Safe** - Nodes live in an arena and refer to each other by index; no `unsafe` code
//!
//! # Implementation
//!
//! Each inner key is the smallest key of the subtree to its right. A search
//! for `k` descends into the child after the last separator `<= k`. Every node
//! except the root holds at least `ceil(m / 2)` children (inner) or
//! `ceil(m / 2) - 1` entries (leaf). Structural changes are traced through the
//! [`tracing`](https://docs.rs/tracing) facade at `debug` and `trace` level.

#![no_std]
// These forbid rules and lint groups are meant to be very restrictive.
#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
// Enable coverage attributes for nightly builds.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

extern crate alloc;

mod error;
mod order;
mod raw;

pub mod bplus_tree;

pub use bplus_tree::BPlusTree;
pub use error::OrderError;
pub use order::Order;
