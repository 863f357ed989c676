//! # critbit-rs
//!
//! A crit-bit (binary PATRICIA) trie: an ordered set of arbitrary byte
//! strings where every internal node branches on the single bit at which its
//! two subtrees first differ.
//!
//! Node storage is pluggable through [`NodeAllocator`]:
//! - [`Arena`]: bulk region, removed nodes are abandoned until reset
//! - [`Heap`]: per-node release on removal
//!
//! ## Example
//!
//! ```rust
//! use critbit_rs::{CritBitTree, Error};
//!
//! let mut tree = CritBitTree::new();
//! tree.insert(b"hello").unwrap();
//! tree.insert(b"help").unwrap();
//! tree.insert(b"world").unwrap();
//!
//! assert!(tree.contains(b"hello"));
//! assert_eq!(tree.insert(b"hello"), Err(Error::DuplicateKey));
//!
//! let hel: Vec<&[u8]> = tree.all_prefixed(b"hel").collect();
//! assert_eq!(hel, [&b"hello"[..], &b"help"[..]]);
//!
//! tree.remove(b"help").unwrap();
//! assert!(!tree.contains(b"help"));
//! ```
//!
//! ## Keys and zero bytes
//!
//! The walk reads bytes past the end of a key as `0x00`. Keys that differ only
//! by trailing zero bytes (`b"a"` and `b"a\0"`) therefore cannot coexist; the
//! second insert fails with [`Error::AmbiguousKey`].

#![deny(unsafe_code)]

pub mod arena;
mod error;
mod heap;
mod iter;
mod node;
mod shared;
mod tree;

pub use arena::{AllocStats, Arena, ArenaConfig, NodeAllocator};
pub use error::{Error, Result};
pub use heap::Heap;
pub use iter::PrefixIter;
pub use node::{Internal, NodeRef};
pub use shared::SharedTree;
pub use tree::CritBitTree;


#[cfg(test)]
mod proptests;
