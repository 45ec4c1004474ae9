use thiserror::Error;

/// Errors returned by [`crate::Pool`] when it cannot hand out memory.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolError {
    /// The requested byte count was zero, negative or did not fit in `isize`.
    #[error("invalid allocation size")]
    InvalidSize,

    /// The platform memory could not supply the region.
    #[error("out of memory: failed to obtain {size} bytes")]
    OutOfMemory {
        /// Bytes that were requested.
        size: usize,
    },
}

/// Result of the pool operations that can fail.
pub type Result<T> = std::result::Result<T, PoolError>;
