//! Reader/writer wrapper for sharing one tree between threads.

use parking_lot::RwLock;

use crate::arena::{Arena, NodeAllocator};
use crate::error::Result;
use crate::tree::CritBitTree;

/// A [`CritBitTree`] behind a reader/writer lock.
///
/// Lookups and prefix scans take the read lock and may run concurrently.
/// `insert`, `remove` and `clear` take the write lock. The allocator is
/// owned by the tree, so it is serialized together with it.
pub struct SharedTree<A: NodeAllocator = Arena> {
    inner: RwLock<CritBitTree<A>>,
}

impl SharedTree<Arena> {
    pub fn new() -> Self {
        Self::from_tree(CritBitTree::new())
    }
}

impl<A: NodeAllocator> SharedTree<A> {
    pub fn from_tree(tree: CritBitTree<A>) -> Self {
        Self {
            inner: RwLock::new(tree),
        }
    }

    pub fn insert(&self, key: impl AsRef<[u8]>) -> Result<()> {
        self.inner.write().insert(key.as_ref())
    }

    pub fn remove(&self, key: impl AsRef<[u8]>) -> Result<()> {
        self.inner.write().remove(key.as_ref())
    }

    pub fn contains(&self, key: impl AsRef<[u8]>) -> bool {
        self.inner.read().contains(key.as_ref())
    }

    /// Owned copies of every key starting with `prefix`, collected under the
    /// read lock.
    pub fn prefixed(&self, prefix: impl AsRef<[u8]>) -> Vec<Vec<u8>> {
        let inner = self.inner.read();
        inner
            .all_prefixed(prefix.as_ref())
            .map(|k| k.to_vec())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn clear(&self) {
        self.inner.write().clear();
    }

    /// Run `f` with shared access to the tree, e.g. to iterate lazily.
    pub fn with_read<R>(&self, f: impl FnOnce(&CritBitTree<A>) -> R) -> R {
        f(&self.inner.read())
    }

    pub fn into_inner(self) -> CritBitTree<A> {
        self.inner.into_inner()
    }
}

impl Default for SharedTree<Arena> {
    fn default() -> Self {
        Self::new()
    }
}
