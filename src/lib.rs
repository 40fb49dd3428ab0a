//! An order-statistic red-black tree map for Rust.
//!
//! This crate provides [`OSRBTreeMap`], an ordered map with unique keys backed by a
//! red-black tree whose nodes also record their subtree sizes. Besides lookup, insertion
//! and removal it answers two positional questions in O(log n):
//!
//! - [`select`](OSRBTreeMap::select) / [`get_by_rank`](OSRBTreeMap::get_by_rank) - the entry
//!   at a given zero-based position in key order
//! - [`rank_of`](OSRBTreeMap::rank_of) - the position of a key
//!
//! Positions are navigated with [`Cursor`](osrbtree_map::Cursor) and
//! [`CursorMut`](osrbtree_map::CursorMut), which step in both directions and can sit
//! past-the-end.
//!
//! # Example
//!
//! ```
//! use osrb_tree::{Error, OSRBTreeMap, Rank};
//!
//! let mut scores = OSRBTreeMap::new();
//! scores.insert("Alice", 100);
//! scores.insert("Bob", 85);
//! scores.insert("Carol", 92);
//!
//! // Inserting an existing key keeps the stored value.
//! let (_, inserted) = scores.insert("Bob", 0);
//! assert!(!inserted);
//! assert_eq!(scores.at("Bob"), Ok(&85));
//! assert_eq!(scores.at("Dave"), Err(Error::KeyNotFound));
//!
//! // Order-statistic operations (O(log n))
//! let (name, score) = scores.get_by_rank(1).unwrap();
//! assert_eq!((*name, *score), ("Bob", 85));
//! assert_eq!(scores.rank_of("Carol"), Some(2));
//! assert_eq!(scores[Rank(0)], 100);
//!
//! // Walk backward from past-the-end.
//! let mut cursor = scores.end();
//! cursor.move_prev().unwrap();
//! assert_eq!(cursor.key(), Some(&"Carol"));
//! ```
//!
//! # Features
//!
//! - **`no_std` compatible** - Only requires `alloc`, no standard library dependency
//! - **Stable positions** - Cursors and handles keep pointing at the same entry while other
//!   entries are inserted or removed
//! - **O(log n) rank operations** - Subtree sizes are maintained through every rotation
//!
//! # Implementation
//!
//! Nodes live in an arena and refer to each other by index. Removing an entry with two
//! children exchanges the positions of the entry's node and its in-order successor's node
//! instead of moving keys and values between them, so nothing observed through a cursor is
//! relocated.

#![no_std]
// These forbid rules and lint groups are meant to be very restrictive.
// NOTE: Mutable iteration reads links through raw pointers while values are lent out.
// #![forbid(unsafe_code)]
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
mod order_statistic;
mod raw;

pub mod osrbtree_map;

pub use error::Error;
pub use order_statistic::Rank;
pub use osrbtree_map::OSRBTreeMap;
