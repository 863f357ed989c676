//! Prefix enumeration.

use std::iter::FusedIterator;

use smallvec::SmallVec;

use crate::arena::NodeAllocator;
use crate::node::NodeRef;

/// One level of the depth-first walk. Leaf frames ignore `visited`.
#[derive(Clone, Copy, Debug)]
struct Frame {
    node: NodeRef,
    visited: [bool; 2],
}

impl Frame {
    #[inline]
    fn new(node: NodeRef) -> Self {
        Self {
            node,
            visited: [false; 2],
        }
    }
}

/// Lazy iterator over the keys below one subtree, in lexicographic order.
///
/// Created by [`CritBitTree::all_prefixed`](crate::CritBitTree::all_prefixed)
/// and [`CritBitTree::iter`](crate::CritBitTree::iter). The stack grows with
/// the depth of the subtree; there is no fixed limit.
pub struct PrefixIter<'a, A: NodeAllocator> {
    alloc: &'a A,
    /// Keys shorter than the prefix can sit in the subtree when the prefix
    /// ends in zero bytes; those are skipped.
    prefix: Vec<u8>,
    stack: SmallVec<[Frame; 32]>,
}

impl<'a, A: NodeAllocator> PrefixIter<'a, A> {
    pub(crate) fn new(alloc: &'a A, top: NodeRef, prefix: &[u8]) -> Self {
        let mut stack = SmallVec::new();
        stack.push(Frame::new(top));
        Self {
            alloc,
            prefix: prefix.to_vec(),
            stack,
        }
    }

    pub(crate) fn empty(alloc: &'a A) -> Self {
        Self {
            alloc,
            prefix: Vec::new(),
            stack: SmallVec::new(),
        }
    }
}

impl<'a, A: NodeAllocator> Iterator for PrefixIter<'a, A> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let top = self.stack.last_mut()?;

            if top.node.is_leaf() {
                let node = top.node;
                self.stack.pop();
                let key = self.alloc.leaf(node);
                if key.starts_with(&self.prefix) {
                    return Some(key);
                }
                continue;
            }

            let Some(dir) = top.visited.iter().position(|v| !v) else {
                self.stack.pop();
                continue;
            };
            top.visited[dir] = true;
            let child = self.alloc.internal(top.node).child[dir];
            self.stack.push(Frame::new(child));
        }
    }
}

impl<'a, A: NodeAllocator> FusedIterator for PrefixIter<'a, A> {}
