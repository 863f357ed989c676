//! The crit-bit tree.

use std::fmt;

use crate::arena::{Arena, NodeAllocator};
use crate::error::{Error, Result};
use crate::iter::PrefixIter;
use crate::node::{byte_at, direction, divergence, Divergence, Internal, NodeRef};

/// A reference slot that a splice can overwrite: the tree root or one child
/// slot of an internal node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Slot {
    Root,
    Child(NodeRef, usize),
}

/// Ordered set of byte strings stored as a crit-bit trie.
///
/// Leaves hold the full inserted key. Each internal node branches on one bit,
/// and the `(crit_byte, other_bits)` pairs strictly increase along every path.
///
/// There is no internal locking: reads may run in parallel, writes need
/// exclusive access (`&mut self`). See [`SharedTree`](crate::SharedTree) for a
/// ready-made reader/writer wrapper.
#[derive(Clone)]
pub struct CritBitTree<A: NodeAllocator = Arena> {
    root: Option<NodeRef>,
    alloc: A,
    len: usize,
}

impl CritBitTree<Arena> {
    /// Empty tree backed by a default [`Arena`].
    pub fn new() -> Self {
        Self::with_allocator(Arena::new())
    }
}

impl<A: NodeAllocator> CritBitTree<A> {
    pub fn with_allocator(alloc: A) -> Self {
        Self {
            root: None,
            alloc,
            len: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    pub fn into_allocator(self) -> A {
        self.alloc
    }

    #[cfg(test)]
    pub(crate) fn root(&self) -> Option<NodeRef> {
        self.root
    }

    /// Descend to the leaf that best matches `key`. The leaf is only a
    /// candidate: its bytes still have to be compared.
    #[inline]
    fn walk(&self, root: NodeRef, key: &[u8]) -> NodeRef {
        let mut p = root;
        while p.is_internal() {
            let node = self.alloc.internal(p);
            p = node.child[node.direction(key)];
        }
        p
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        match self.root {
            Some(root) => self.alloc.leaf(self.walk(root, key)) == key,
            None => false,
        }
    }

    fn set_slot(&mut self, slot: Slot, r: NodeRef) {
        match slot {
            Slot::Root => self.root = Some(r),
            Slot::Child(parent, dir) => self.alloc.internal_mut(parent).child[dir] = r,
        }
    }

    /// Insert `key`.
    ///
    /// Fails with [`Error::DuplicateKey`] if the key is present and with
    /// [`Error::AmbiguousKey`] if it equals a present key up to trailing zero
    /// bytes. On any error, including allocation failure, the tree is unchanged.
    pub fn insert(&mut self, key: &[u8]) -> Result<()> {
        let Some(root) = self.root else {
            self.root = Some(self.alloc.alloc_leaf(key)?);
            self.len = 1;
            return Ok(());
        };

        let best = self.walk(root, key);
        let split = match divergence(self.alloc.leaf(best), key) {
            Divergence::At(split) => split,
            Divergence::Equal => return Err(Error::DuplicateKey),
            Divergence::ZeroExtension => return Err(Error::AmbiguousKey),
        };

        // Second descent: stop above the first node that branches on a later
        // bit than the new split.
        let mut slot = Slot::Root;
        let mut p = root;
        while p.is_internal() {
            let node = self.alloc.internal(p);
            if node.sorts_after(split) {
                break;
            }
            let dir = node.direction(key);
            slot = Slot::Child(p, dir);
            p = node.child[dir];
        }

        let new_dir = direction(split.other_bits, byte_at(key, split.byte));
        let leaf = self.alloc.alloc_leaf(key)?;
        let mut child = [p; 2];
        child[new_dir] = leaf;
        let node = match self.alloc.alloc_internal(Internal {
            child,
            crit_byte: split.byte,
            other_bits: split.other_bits,
        }) {
            Ok(node) => node,
            Err(e) => {
                self.alloc.release(leaf);
                return Err(e);
            }
        };

        self.set_slot(slot, node);
        self.len += 1;
        tracing::trace!(
            target: "critbit::tree",
            crit_byte = split.byte,
            other_bits = split.other_bits,
            key_len = key.len(),
            "spliced internal node"
        );
        Ok(())
    }

    /// Remove `key`, or fail with [`Error::NotFound`] leaving the tree as is.
    pub fn remove(&mut self, key: &[u8]) -> Result<()> {
        let root = self.root.ok_or(Error::NotFound)?;

        // (slot holding the parent, parent, direction taken out of it)
        let mut parent: Option<(Slot, NodeRef, usize)> = None;
        let mut slot = Slot::Root;
        let mut p = root;
        while p.is_internal() {
            let dir = self.alloc.internal(p).direction(key);
            parent = Some((slot, p, dir));
            slot = Slot::Child(p, dir);
            p = self.alloc.internal(p).child[dir];
        }

        if self.alloc.leaf(p) != key {
            return Err(Error::NotFound);
        }

        let reclaimed = match parent {
            None => {
                self.root = None;
                self.alloc.release(p)
            }
            Some((parent_slot, q, dir)) => {
                let sibling = self.alloc.internal(q).child[1 - dir];
                self.set_slot(parent_slot, sibling);
                let leaf_freed = self.alloc.release(p);
                self.alloc.release(q) && leaf_freed
            }
        };
        self.len -= 1;
        tracing::trace!(
            target: "critbit::tree",
            key_len = key.len(),
            reclaimed,
            "removed leaf"
        );
        Ok(())
    }

    /// Iterate over every key starting with `prefix`. An empty prefix matches
    /// all keys.
    pub fn all_prefixed(&self, prefix: &[u8]) -> PrefixIter<'_, A> {
        let Some(root) = self.root else {
            return PrefixIter::empty(&self.alloc);
        };

        // `top` ends up at the child taken out of the last node that branches
        // inside the prefix; every key with the prefix lives below it.
        let mut top = root;
        let mut p = root;
        while p.is_internal() {
            let node = self.alloc.internal(p);
            p = node.child[node.direction(prefix)];
            if node.crit_byte < prefix.len() {
                top = p;
            }
        }

        let leaf = self.alloc.leaf(p);
        let padded_match = prefix
            .iter()
            .enumerate()
            .all(|(i, &b)| byte_at(leaf, i) == b);
        if !padded_match {
            return PrefixIter::empty(&self.alloc);
        }
        PrefixIter::new(&self.alloc, top, prefix)
    }

    /// Iterate over all keys in lexicographic order.
    pub fn iter(&self) -> PrefixIter<'_, A> {
        self.all_prefixed(&[])
    }

    /// Remove every key and reset the allocator, reclaiming all node memory.
    pub fn clear(&mut self) {
        self.root = None;
        self.len = 0;
        self.alloc.reset();
    }

    /// Write an indented dump of the node structure. Internal nodes deeper
    /// than `max_depth` are elided.
    pub fn write_structure<W: fmt::Write>(&self, out: &mut W, max_depth: usize) -> fmt::Result {
        let Some(root) = self.root else {
            return writeln!(out, "(empty)");
        };

        let mut stack = vec![(root, 0usize, "")];
        while let Some((r, depth, label)) = stack.pop() {
            write!(out, "{:indent$}{label}", "", indent = depth * 4)?;
            if r.is_leaf() {
                writeln!(out, "{:?}", String::from_utf8_lossy(self.alloc.leaf(r)))?;
                continue;
            }

            let node = self.alloc.internal(r);
            writeln!(
                out,
                "crit_byte: {}, other_bits: {:#04x}",
                node.crit_byte, node.other_bits
            )?;
            if depth >= max_depth {
                writeln!(out, "{:indent$}...", "", indent = (depth + 1) * 4)?;
                continue;
            }
            stack.push((node.child[1], depth + 1, "1: "));
            stack.push((node.child[0], depth + 1, "0: "));
        }
        Ok(())
    }
}

impl Default for CritBitTree<Arena> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: NodeAllocator> fmt::Debug for CritBitTree<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.iter().map(String::from_utf8_lossy))
            .finish()
    }
}

impl<'a, A: NodeAllocator> IntoIterator for &'a CritBitTree<A> {
    type Item = &'a [u8];
    type IntoIter = PrefixIter<'a, A>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
