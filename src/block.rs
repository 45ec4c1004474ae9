use std::ptr::NonNull;

/// This is the record the pool keeps for every region it owns. The region
/// itself lives wherever the platform memory put it; the record only points
/// at it.
///
/// ```text
/// +---------------------+               +---------------------+
/// |        addr         | ------------> |       Content       |
/// +---------------------+               |         ...         |
/// |        size         |               |     size bytes      |
/// +---------------------+               |         ...         |
/// |    is_free (1b)     |               +---------------------+
/// +---------------------+
/// ```
///
/// `addr` and `size` are fixed when the block is created. Reusing a block for
/// a smaller request does not shrink it, so the difference is simply wasted
/// until the pool is torn down.
#[derive(Debug)]
pub struct Block {
    /// Start of the owned region.
    pub(crate) addr: NonNull<u8>,
    /// Size of the region in bytes, as originally requested.
    pub(crate) size: usize,
    /// Flag to tell whether the block is free or not.
    pub(crate) is_free: bool,
}

impl Block {
    /// New blocks are always handed out straight away, so they start used.
    pub(crate) fn new(addr: NonNull<u8>, size: usize) -> Self {
        Self {
            addr,
            size,
            is_free: false,
        }
    }

    /// Start of the owned region.
    #[inline]
    pub fn addr(&self) -> NonNull<u8> {
        self.addr
    }

    /// Size of the region in bytes.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Whether the block is waiting to be reused.
    #[inline]
    pub fn is_free(&self) -> bool {
        self.is_free
    }

    /// Tells whether this block can serve a request of `size` bytes.
    #[inline]
    pub(crate) fn fits(&self, size: usize) -> bool {
        self.is_free && self.size >= size
    }
}
