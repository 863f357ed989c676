//! Node handles and the bit arithmetic shared by every tree operation.

// =============================================================================
// Handle type
// =============================================================================

/// Handle: 32-bit tagged index into an allocator's node pools.
///
/// - Bit 31 = 1: leaf (index into the leaf pool)
/// - Bit 31 = 0: internal node (index into the internal pool)
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct NodeRef(u32);

impl NodeRef {
    const LEAF_TAG: u32 = 1u32 << 31;
    const INDEX_MASK: u32 = Self::LEAF_TAG - 1;

    /// Largest index either pool can hand out.
    pub const MAX_INDEX: usize = Self::INDEX_MASK as usize;

    #[inline]
    pub fn leaf(idx: usize) -> Self {
        debug_assert!(idx <= Self::MAX_INDEX);
        Self(idx as u32 | Self::LEAF_TAG)
    }

    #[inline]
    pub fn internal(idx: usize) -> Self {
        debug_assert!(idx <= Self::MAX_INDEX);
        Self(idx as u32)
    }

    #[inline]
    pub fn is_leaf(self) -> bool {
        (self.0 & Self::LEAF_TAG) != 0
    }

    #[inline]
    pub fn is_internal(self) -> bool {
        !self.is_leaf()
    }

    /// Pool index with the tag stripped.
    #[inline]
    pub fn index(self) -> usize {
        (self.0 & Self::INDEX_MASK) as usize
    }
}

impl std::fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_leaf() {
            write!(f, "Leaf({})", self.index())
        } else {
            write!(f, "Internal({})", self.index())
        }
    }
}

// =============================================================================
// Internal node
// =============================================================================

/// Branch on a single bit: `other_bits` has every bit set except the one
/// tested at `key[crit_byte]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Internal {
    pub child: [NodeRef; 2],
    pub crit_byte: usize,
    pub other_bits: u8,
}

impl Internal {
    /// Child slot to follow for `key`. Bytes past the end of `key` read as 0.
    #[inline]
    pub fn direction(&self, key: &[u8]) -> usize {
        direction(self.other_bits, byte_at(key, self.crit_byte))
    }

    /// Whether this node tests a bit that comes after `split` on any path.
    #[inline]
    pub(crate) fn sorts_after(&self, split: CritBit) -> bool {
        self.crit_byte > split.byte
            || (self.crit_byte == split.byte && self.other_bits > split.other_bits)
    }
}

#[inline]
pub(crate) fn byte_at(key: &[u8], idx: usize) -> u8 {
    key.get(idx).copied().unwrap_or(0)
}

/// Branchless 0/1 selector: 1 iff the single clear bit of `other_bits` is set
/// in `byte`.
#[inline]
pub(crate) fn direction(other_bits: u8, byte: u8) -> usize {
    (1 + (other_bits | byte) as usize) >> 8
}

// =============================================================================
// Critical bit computation
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct CritBit {
    pub byte: usize,
    pub other_bits: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Divergence {
    At(CritBit),
    /// Same length, same bytes.
    Equal,
    /// One key is the other plus trailing `0x00` bytes.
    ZeroExtension,
}

/// Find the first bit where `a` and `b` differ, reading both zero-padded.
///
/// Within the differing byte the most significant differing bit is chosen so
/// that `(crit_byte, other_bits)` strictly increases along every path.
pub(crate) fn divergence(a: &[u8], b: &[u8]) -> Divergence {
    let common = a.len().min(b.len());
    let mismatch = a[..common].iter().zip(&b[..common]).position(|(x, y)| x != y);

    let (byte, diff) = match mismatch {
        Some(i) => (i, a[i] ^ b[i]),
        None => {
            let longer = if a.len() >= b.len() { a } else { b };
            match longer[common..].iter().position(|&c| c != 0) {
                Some(off) => (common + off, longer[common + off]),
                None if a.len() == b.len() => return Divergence::Equal,
                None => return Divergence::ZeroExtension,
            }
        }
    };

    let bit = 0x80u8 >> diff.leading_zeros();
    Divergence::At(CritBit {
        byte,
        other_bits: !bit,
    })
}
