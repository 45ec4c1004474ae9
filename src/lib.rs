//! A free-list memory pool.
//!
//! The [`Pool`] hands out raw memory regions of any size and keeps a record,
//! a [`Block`], for each of them. Released blocks are not given back to the
//! system; they are flagged as free and handed out again by [`Pool::acquire`]
//! to the first later request they can hold. Everything is given back at once
//! with [`Pool::release_all`], or when the pool is dropped.
//!
//! ```text
//! +---------+    +---------+    +---------+
//! | used 10 | -> | free 20 | -> | used 30 |      acquire(15) -> Block 1
//! +---------+    +---------+    +---------+      acquire(25) -> new Block 3
//! ```
//!
//! Blocks are never split or merged, so a reused block keeps its original
//! size even when the new request is smaller.
//!
//! ```rust
//! use memalloc::Pool;
//!
//! let mut pool = Pool::new();
//!
//! let a = pool.allocate(64)?;
//! pool.bytes_mut(a).unwrap()[0] = 7;
//!
//! pool.release(a);
//! assert_eq!(pool.acquire(32)?, a);
//!
//! pool.release_all();
//! assert!(pool.is_empty());
//! # Ok::<(), memalloc::PoolError>(())
//! ```

mod block;
mod error;
mod freelist;
mod kernel;
mod pool;

pub use block::Block;
pub use error::{PoolError, Result};
pub use kernel::{Kernel, PlatformMemory};
pub use pool::{Handle, Pool};
