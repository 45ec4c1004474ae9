use std::{
    mem,
    ptr::NonNull,
    slice,
    sync::atomic::{AtomicU64, Ordering},
};

use log::{debug, trace, warn};

use crate::{
    block::Block,
    error::{PoolError, Result},
    freelist::find_free_block,
    kernel::{Kernel, PlatformMemory},
};

/// Typed reference to a [`Block`] inside a [`Pool`].
///
/// Besides the block's position it carries the id of the pool that issued it
/// and that pool's epoch, which moves forward on every [`Pool::release_all`].
/// A handle only ever matches blocks of its own pool created in its own epoch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Handle {
    pool: u64,
    index: usize,
    epoch: u64,
}

/// Source of pool ids. Only uniqueness matters.
static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(0);

/// A free-list memory pool.
///
/// Every region the pool owns is described by a [`Block`], kept in creation
/// order. Blocks are never split, merged or given back one at a time: a
/// released block just gets flagged as free and waits to be reused by
/// [`Pool::acquire`]. Memory goes back to the system only on
/// [`Pool::release_all`] or when the pool is dropped.
///
/// ```text
///   blocks (creation order)
///
/// +---------+    +---------+    +---------+    +---------+
/// | Block 0 | -> | Block 1 | -> | Block 2 | -> | Block 3 |  <- new blocks are appended here
/// +----|----+    +----|----+    +----|----+    +----|----+
///      |              |              |              |
///      v              v              v              v
///   region         region         region         region
/// ```
///
/// The pool is not thread-safe. Use one pool per thread or wrap it in a mutex.
pub struct Pool<M: PlatformMemory = Kernel> {
    /// Every block owned by the pool, in creation order.
    blocks: Vec<Block>,
    /// Where regions come from and go back to.
    memory: M,
    /// Unique per pool. See [`Handle`].
    id: u64,
    /// Number of teardowns so far.
    epoch: u64,
}

impl Pool<Kernel> {
    /// Creates an empty pool backed by the system heap.
    pub fn new() -> Self {
        Self::with_memory(Kernel::new())
    }
}

impl Default for Pool<Kernel> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: PlatformMemory> Pool<M> {
    /// Creates an empty pool that gets its regions from `memory`.
    pub fn with_memory(memory: M) -> Self {
        Self {
            blocks: Vec::new(),
            memory,
            id: NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed),
            epoch: 0,
        }
    }

    /// Allocates a brand new block of `amount` bytes, without looking at the
    /// free blocks the pool already has.
    ///
    /// # Errors
    ///
    /// [`PoolError::InvalidSize`] if `amount` is not positive and
    /// [`PoolError::OutOfMemory`] if the system has no memory to give. In both
    /// cases the pool is left untouched.
    pub fn allocate(&mut self, amount: isize) -> Result<Handle> {
        let size = validate(amount)?;

        self.allocate_block(size)
    }

    /// Hands out a block that can hold `amount` bytes, reusing the first free
    /// block big enough and allocating a new one otherwise.
    ///
    /// A reused block keeps its original size, which may be larger than
    /// `amount`.
    ///
    /// # Errors
    ///
    /// Same as [`Pool::allocate`].
    pub fn acquire(&mut self, amount: isize) -> Result<Handle> {
        let size = validate(amount)?;

        if let Some(index) = find_free_block(&self.blocks, size) {
            let block = &mut self.blocks[index];
            block.is_free = false;

            trace!(
                "reusing block {index} ({} bytes) for a {size} byte request",
                block.size
            );

            return Ok(self.handle(index));
        }

        self.allocate_block(size)
    }

    /// Allocates a new block big enough for `count` values of `T`.
    ///
    /// # Errors
    ///
    /// [`PoolError::InvalidSize`] if the byte count is zero or overflows, and
    /// [`PoolError::OutOfMemory`] as in [`Pool::allocate`].
    pub fn allocate_array<T>(&mut self, count: usize) -> Result<Handle> {
        self.allocate(array_size::<T>(count)?)
    }

    /// Like [`Pool::allocate_array`], but reuses a free block when one fits.
    ///
    /// # Errors
    ///
    /// Same as [`Pool::allocate_array`].
    pub fn acquire_array<T>(&mut self, count: usize) -> Result<Handle> {
        self.acquire(array_size::<T>(count)?)
    }

    /// Marks the block behind `handle` as free so it can be reused.
    ///
    /// Handles that don't belong to the pool anymore are ignored, and
    /// releasing a block twice leaves it free.
    pub fn release(&mut self, handle: Handle) {
        if let Some(block) = self.block_mut(handle) {
            block.is_free = true;
            debug!("released block {} ({} bytes)", handle.index, block.size);
        }
    }

    /// Marks the first block whose region starts at `addr` as free.
    ///
    /// Addresses the pool does not own are ignored.
    pub fn release_ptr(&mut self, addr: NonNull<u8>) {
        let found = self
            .blocks
            .iter_mut()
            .enumerate()
            .find(|(_, block)| block.addr == addr);

        match found {
            Some((index, block)) => {
                block.is_free = true;
                debug!("released block {index} at {addr:?} ({} bytes)", block.size);
            }
            None => trace!("release of unknown address {addr:?} ignored"),
        }
    }

    /// Gives every region back to the system and forgets every block.
    ///
    /// All handles issued so far become stale.
    pub fn release_all(&mut self) {
        let count = self.blocks.len();
        let bytes = self.owned_bytes();

        for block in self.blocks.drain(..) {
            // SAFETY: every block owns a region obtained from `self.memory`
            // with this exact size, and draining guarantees we return it once.
            unsafe { self.memory.return_memory(block.addr, block.size) }
        }

        self.epoch = self.epoch.wrapping_add(1);

        if count > 0 {
            debug!("pool torn down: {count} blocks, {bytes} bytes returned");
        }
    }

    /// Number of blocks, used or free, the pool owns.
    #[inline]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Tells whether the pool owns no blocks at all.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Total bytes held by the pool across all of its blocks.
    pub fn owned_bytes(&self) -> usize {
        self.blocks.iter().map(Block::size).sum()
    }

    /// Iterates over the blocks in creation order.
    pub fn iter(&self) -> slice::Iter<'_, Block> {
        self.blocks.iter()
    }

    /// Returns the block behind `handle`, if it is still owned by the pool.
    pub fn get(&self, handle: Handle) -> Option<&Block> {
        if !self.owns(handle) {
            return None;
        }

        self.blocks.get(handle.index)
    }

    /// Start of the region behind `handle`.
    pub fn as_ptr(&self, handle: Handle) -> Option<NonNull<u8>> {
        self.get(handle).map(Block::addr)
    }

    /// Contents of the region behind `handle`. The slice covers the whole
    /// block, which may be longer than the request that acquired it.
    pub fn bytes(&self, handle: Handle) -> Option<&[u8]> {
        let block = self.get(handle)?;

        // SAFETY: `PlatformMemory` guarantees the region is initialized and
        // valid for `size` bytes, and the pool owns it until teardown.
        Some(unsafe { slice::from_raw_parts(block.addr.as_ptr(), block.size) })
    }

    /// Mutable contents of the region behind `handle`.
    pub fn bytes_mut(&mut self, handle: Handle) -> Option<&mut [u8]> {
        let block = self.block_mut(handle)?;

        // SAFETY: see `bytes`. `&mut self` keeps any other view out.
        Some(unsafe { slice::from_raw_parts_mut(block.addr.as_ptr(), block.size) })
    }

    /// The backend regions are obtained from.
    pub fn memory(&self) -> &M {
        &self.memory
    }

    fn allocate_block(&mut self, size: usize) -> Result<Handle> {
        // Make room for the record first so a failure here can't leave a
        // region without an owner.
        self.blocks
            .try_reserve(1)
            .map_err(|_| PoolError::OutOfMemory { size })?;

        let Some(addr) = self.memory.request_memory(size) else {
            warn!("system could not provide {size} bytes");
            return Err(PoolError::OutOfMemory { size });
        };

        let index = self.blocks.len();
        self.blocks.push(Block::new(addr, size));

        debug!("allocated block {index} at {addr:?} ({size} bytes)");

        Ok(self.handle(index))
    }

    fn block_mut(&mut self, handle: Handle) -> Option<&mut Block> {
        if !self.owns(handle) {
            return None;
        }

        self.blocks.get_mut(handle.index)
    }

    /// Issued by this pool since its last teardown.
    #[inline]
    fn owns(&self, handle: Handle) -> bool {
        handle.pool == self.id && handle.epoch == self.epoch
    }

    #[inline]
    fn handle(&self, index: usize) -> Handle {
        Handle {
            pool: self.id,
            index,
            epoch: self.epoch,
        }
    }
}

impl<M: PlatformMemory> Drop for Pool<M> {
    fn drop(&mut self) {
        self.release_all();
    }
}

impl<'a, M: PlatformMemory> IntoIterator for &'a Pool<M> {
    type Item = &'a Block;
    type IntoIter = slice::Iter<'a, Block>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Only positive amounts make it to the system.
fn validate(amount: isize) -> Result<usize> {
    if amount <= 0 {
        return Err(PoolError::InvalidSize);
    }

    Ok(amount as usize)
}

fn array_size<T>(count: usize) -> Result<isize> {
    mem::size_of::<T>()
        .checked_mul(count)
        .and_then(|bytes| isize::try_from(bytes).ok())
        .ok_or(PoolError::InvalidSize)
}
