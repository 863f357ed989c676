use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The backing allocator could not hand out `requested` bytes.
    #[error("allocation of {requested} bytes failed ({available} bytes available)")]
    AllocationFailure { requested: usize, available: usize },

    /// The key is already present in the tree.
    #[error("key is already present")]
    DuplicateKey,

    /// The key equals a present key followed only by `0x00` bytes (or the
    /// other way around). Both read identically under zero padding.
    #[error("key differs from a present key only by trailing zero bytes")]
    AmbiguousKey,

    /// The key is not present in the tree.
    #[error("key not found")]
    NotFound,

    #[error("arena alignment {0} is not a power of two")]
    InvalidAlignment(usize),
}
