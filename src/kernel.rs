use std::ptr::NonNull;

/// This trait provides an abstraction over the system the pool gets its raw
/// memory from. The pool itself, our top level view of this, has nothing to do
/// with the concrete implementations / APIs offered by each kernel.
///
/// Implementations hand out regions of exactly the requested length and get
/// them back, one by one, when the owning [`crate::Pool`] is torn down.
///
/// # Safety
///
/// The pool exposes regions as byte slices, so every region returned by
/// `request_memory` must be valid for reads and writes of `len` bytes, be
/// zero-filled, and not overlap any other region still handed out.
pub unsafe trait PlatformMemory {
    /// Request a zero-filled memory region of size `len`. It returns a pointer
    /// to the given location or None if the underlying call fails.
    fn request_memory(&mut self, len: usize) -> Option<NonNull<u8>>;

    /// Returns the memory of size `len` starting from `addr` back to the system.
    ///
    /// # Safety
    ///
    /// `addr` must have been returned by [`PlatformMemory::request_memory`] on
    /// this same backend with the same `len`, and must not be returned twice.
    unsafe fn return_memory(&mut self, addr: NonNull<u8>, len: usize);
}

/// Default backend. It talks to the C heap on unix and to the process heap
/// on windows.
#[derive(Debug, Default, Clone, Copy)]
pub struct Kernel;

impl Kernel {
    /// Creates the system backend.
    pub const fn new() -> Self {
        Self
    }
}

#[cfg(unix)]
mod unix {
    use super::{Kernel, PlatformMemory};

    use libc::{c_void, calloc, free, size_t};

    use std::ptr::NonNull;

    unsafe impl PlatformMemory for Kernel {
        fn request_memory(&mut self, len: usize) -> Option<NonNull<u8>> {
            // calloc(1, len) gives us zeroed memory, so the pool can hand the
            // contents out as plain bytes.
            let addr = unsafe { calloc(1, len as size_t) };

            NonNull::new(addr.cast::<u8>())
        }

        unsafe fn return_memory(&mut self, addr: NonNull<u8>, _len: usize) {
            unsafe { free(addr.as_ptr() as *mut c_void) }
        }
    }
}

#[cfg(windows)]
mod windows {
    use super::{Kernel, PlatformMemory};

    use std::{os::raw::c_void, ptr::NonNull};

    use windows::Win32::System::Memory;

    unsafe impl PlatformMemory for Kernel {
        fn request_memory(&mut self, len: usize) -> Option<NonNull<u8>> {
            unsafe {
                let heap = Memory::GetProcessHeap().ok()?;
                let addr = Memory::HeapAlloc(heap, Memory::HEAP_ZERO_MEMORY, len);

                NonNull::new(addr.cast())
            }
        }

        unsafe fn return_memory(&mut self, addr: NonNull<u8>, _len: usize) {
            unsafe {
                if let Ok(heap) = Memory::GetProcessHeap() {
                    let _ = Memory::HeapFree(
                        heap,
                        Memory::HEAP_FLAGS(0),
                        Some(addr.as_ptr() as *const c_void),
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requested_memory_is_zeroed_and_writable() {
        let mut kernel = Kernel::new();

        let addr = kernel.request_memory(64).expect("system refused 64 bytes");

        unsafe {
            let bytes = std::slice::from_raw_parts_mut(addr.as_ptr(), 64);
            assert!(bytes.iter().all(|b| *b == 0));

            bytes[63] = 0xAB;
            assert_eq!(bytes[63], 0xAB);

            kernel.return_memory(addr, 64);
        }
    }

    #[test]
    fn distinct_requests_do_not_alias() {
        let mut kernel = Kernel::new();

        let first = kernel.request_memory(16).unwrap();
        let second = kernel.request_memory(16).unwrap();

        assert_ne!(first, second);

        unsafe {
            kernel.return_memory(first, 16);
            kernel.return_memory(second, 16);
        }
    }
}
