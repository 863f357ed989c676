//! Node allocators.
//!
//! The tree never touches memory directly. It asks a [`NodeAllocator`] for
//! leaves and internal nodes and gets back [`NodeRef`] handles. Two backing
//! modes exist:
//! - [`Arena`]: bulk region with a byte budget, no per-node free, bulk reset
//! - [`Heap`](crate::Heap): slot pools where each node is released on removal

use std::mem;

use crate::error::{Error, Result};
use crate::node::{Internal, NodeRef};

/// Default byte budget: 64 GiB, the size of a typical reserved mmap region.
const DEFAULT_CAPACITY: usize = if usize::BITS > 36 {
    (1u64 << 36) as usize
} else {
    usize::MAX
};

/// Per-leaf header charged on top of the key bytes (the stored length).
pub(crate) const LEAF_HEADER: usize = mem::size_of::<usize>();

/// Source of node storage for a [`CritBitTree`](crate::CritBitTree).
///
/// Handles returned by one allocator are only meaningful to that allocator.
/// Passing a foreign or released handle to an accessor panics or returns
/// stale data; it never causes undefined behavior.
pub trait NodeAllocator {
    /// Store a copy of `key` as a new leaf.
    fn alloc_leaf(&mut self, key: &[u8]) -> Result<NodeRef>;

    fn alloc_internal(&mut self, node: Internal) -> Result<NodeRef>;

    /// Key bytes of a leaf.
    fn leaf(&self, r: NodeRef) -> &[u8];

    fn internal(&self, r: NodeRef) -> &Internal;

    fn internal_mut(&mut self, r: NodeRef) -> &mut Internal;

    /// Reclaim a node that is no longer linked anywhere.
    ///
    /// Returns `false` when this allocator has no per-node free; the node then
    /// stays allocated until [`reset`](NodeAllocator::reset).
    fn release(&mut self, r: NodeRef) -> bool {
        let _ = r;
        false
    }

    /// Drop every node ever handed out. All outstanding handles become invalid.
    fn reset(&mut self);

    fn stats(&self) -> AllocStats;
}

/// Allocator occupancy. Abandoned arena nodes are still counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocStats {
    /// Leaves currently held
    pub leaves: usize,
    /// Internal nodes currently held
    pub internals: usize,
    /// Bytes charged for the nodes above
    pub bytes: usize,
}

/// Configuration for an [`Arena`].
#[derive(Debug, Clone)]
pub struct ArenaConfig {
    /// Byte budget. Requests beyond it fail with `AllocationFailure`.
    pub capacity: usize,
    /// Every allocation is rounded up to a multiple of this. `1` disables
    /// rounding. Must be a power of two.
    pub alignment: usize,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            alignment: mem::size_of::<*const u8>(),
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct LeafSpan {
    offset: usize,
    len: usize,
}

/// Bulk region allocator.
///
/// Key bytes live back to back in one buffer, internal nodes in another.
/// Individual nodes cannot be freed; removed nodes stay allocated (and keep
/// counting against the budget) until [`Arena::reset`] or drop.
#[derive(Debug, Clone)]
pub struct Arena {
    keys: Vec<u8>,
    leaves: Vec<LeafSpan>,
    nodes: Vec<Internal>,
    used: usize,
    config: ArenaConfig,
}

impl Arena {
    /// Create an arena with the default configuration.
    pub fn new() -> Self {
        Self::from_valid_config(ArenaConfig::default())
    }

    /// Create an arena limited to `capacity` bytes, like attaching to a fixed
    /// region.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::from_valid_config(ArenaConfig {
            capacity,
            ..ArenaConfig::default()
        })
    }

    pub fn with_config(config: ArenaConfig) -> Result<Self> {
        if !config.alignment.is_power_of_two() {
            return Err(Error::InvalidAlignment(config.alignment));
        }
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: ArenaConfig) -> Self {
        Self {
            keys: Vec::new(),
            leaves: Vec::new(),
            nodes: Vec::new(),
            used: 0,
            config,
        }
    }

    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Bytes charged so far.
    pub fn used(&self) -> usize {
        self.used
    }

    /// Bytes left in the budget.
    pub fn available(&self) -> usize {
        self.config.capacity - self.used
    }

    #[inline]
    fn align_up(&self, size: usize) -> Option<usize> {
        let mask = self.config.alignment - 1;
        size.checked_add(mask).map(|s| s & !mask)
    }

    /// Charge `size` bytes against the budget, or fail without side effects.
    fn charge(&self, size: usize) -> Result<usize> {
        let fail = |available| Error::AllocationFailure {
            requested: size,
            available,
        };
        let charged = self.align_up(size).ok_or_else(|| fail(self.available()))?;
        if charged > self.available() {
            tracing::debug!(
                target: "critbit::arena",
                requested = charged,
                available = self.available(),
                "arena exhausted"
            );
            return Err(fail(self.available()));
        }
        Ok(charged)
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a refused `try_reserve` to the crate's allocation error.
pub(crate) fn reserve_failed(requested: usize) -> Error {
    Error::AllocationFailure {
        requested,
        available: 0,
    }
}

/// Fail when a pool has already handed out every index a [`NodeRef`] can hold.
pub(crate) fn check_index(idx: usize, requested: usize) -> Result<()> {
    if idx > NodeRef::MAX_INDEX {
        return Err(Error::AllocationFailure {
            requested,
            available: 0,
        });
    }
    Ok(())
}

impl NodeAllocator for Arena {
    fn alloc_leaf(&mut self, key: &[u8]) -> Result<NodeRef> {
        let size = LEAF_HEADER + key.len();
        let charged = self.charge(size)?;
        let idx = self.leaves.len();
        check_index(idx, size)?;

        self.keys
            .try_reserve(key.len())
            .map_err(|_| reserve_failed(size))?;
        self.leaves.try_reserve(1).map_err(|_| reserve_failed(size))?;

        let offset = self.keys.len();
        self.keys.extend_from_slice(key);
        self.leaves.push(LeafSpan {
            offset,
            len: key.len(),
        });
        self.used += charged;
        Ok(NodeRef::leaf(idx))
    }

    fn alloc_internal(&mut self, node: Internal) -> Result<NodeRef> {
        let size = mem::size_of::<Internal>();
        let charged = self.charge(size)?;
        let idx = self.nodes.len();
        check_index(idx, size)?;

        self.nodes.try_reserve(1).map_err(|_| reserve_failed(size))?;
        self.nodes.push(node);
        self.used += charged;
        Ok(NodeRef::internal(idx))
    }

    #[inline]
    fn leaf(&self, r: NodeRef) -> &[u8] {
        debug_assert!(r.is_leaf());
        let span = self.leaves[r.index()];
        &self.keys[span.offset..span.offset + span.len]
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

    fn reset(&mut self) {
        tracing::debug!(
            target: "critbit::arena",
            leaves = self.leaves.len(),
            internals = self.nodes.len(),
            bytes = self.used,
            "arena reset"
        );
        self.keys.clear();
        self.leaves.clear();
        self.nodes.clear();
        self.used = 0;
    }

    fn stats(&self) -> AllocStats {
        AllocStats {
            leaves: self.leaves.len(),
            internals: self.nodes.len(),
            bytes: self.used,
        }
    }
}
