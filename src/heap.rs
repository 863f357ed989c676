//! Individually freeable node pools.

use std::mem;

use crate::arena::{check_index, reserve_failed, AllocStats, NodeAllocator, LEAF_HEADER};
use crate::error::Result;
use crate::node::{Internal, NodeRef};

/// Slot-pool allocator with per-node release.
///
/// Released leaves drop their key bytes immediately; released slots go on a
/// free list and are handed out again before the pools grow.
#[derive(Debug, Clone, Default)]
pub struct Heap {
    leaves: Vec<Box<[u8]>>,
    free_leaves: Vec<usize>,
    nodes: Vec<Internal>,
    free_nodes: Vec<usize>,
    bytes: usize,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NodeAllocator for Heap {
    fn alloc_leaf(&mut self, key: &[u8]) -> Result<NodeRef> {
        let size = LEAF_HEADER + key.len();

        let mut bytes = Vec::new();
        bytes.try_reserve_exact(key.len()).map_err(|_| reserve_failed(size))?;
        bytes.extend_from_slice(key);
        let bytes = bytes.into_boxed_slice();

        let idx = match self.free_leaves.pop() {
            Some(idx) => {
                self.leaves[idx] = bytes;
                idx
            }
            None => {
                let idx = self.leaves.len();
                check_index(idx, size)?;
                self.leaves.try_reserve(1).map_err(|_| reserve_failed(size))?;
                self.leaves.push(bytes);
                idx
            }
        };
        self.bytes += size;
        Ok(NodeRef::leaf(idx))
    }

    fn alloc_internal(&mut self, node: Internal) -> Result<NodeRef> {
        let size = mem::size_of::<Internal>();
        let idx = match self.free_nodes.pop() {
            Some(idx) => {
                self.nodes[idx] = node;
                idx
            }
            None => {
                let idx = self.nodes.len();
                check_index(idx, size)?;
                self.nodes.try_reserve(1).map_err(|_| reserve_failed(size))?;
                self.nodes.push(node);
                idx
            }
        };
        self.bytes += size;
        Ok(NodeRef::internal(idx))
    }

    #[inline]
    fn leaf(&self, r: NodeRef) -> &[u8] {
        debug_assert!(r.is_leaf());
        &self.leaves[r.index()]
    }

    #[inline]
    fn internal(&self, r: NodeRef) -> &Internal {
        debug_assert!(r.is_internal());
        &self.nodes[r.index()]
    }

    #[inline]
    fn internal_mut(&mut self, r: NodeRef) -> &mut Internal {
        debug_assert!(r.is_internal());
        &mut self.nodes[r.index()]
    }

    fn release(&mut self, r: NodeRef) -> bool {
        let idx = r.index();
        if r.is_leaf() {
            let bytes = mem::take(&mut self.leaves[idx]);
            self.bytes -= LEAF_HEADER + bytes.len();
            self.free_leaves.push(idx);
        } else {
            self.bytes -= mem::size_of::<Internal>();
            self.free_nodes.push(idx);
        }
        true
    }

    fn reset(&mut self) {
        self.leaves.clear();
        self.free_leaves.clear();
        self.nodes.clear();
        self.free_nodes.clear();
        self.bytes = 0;
    }

    fn stats(&self) -> AllocStats {
        AllocStats {
            leaves: self.leaves.len() - self.free_leaves.len(),
            internals: self.nodes.len() - self.free_nodes.len(),
            bytes: self.bytes,
        }
    }
}
