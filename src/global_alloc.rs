//! ABI-equivalent public entry points.
//!
//! A process-wide heap behind plain free functions, plus a
//! [`SbrkAllocator`] wrapper a downstream binary can register as its
//! `#[global_allocator]`. Every function here is total: failure is a
//! null pointer, never a panic or an `AllocError` — the internal error
//! taxonomy in [`crate::error`] never crosses this boundary.

use core::alloc::{GlobalAlloc, Layout};
use core::ptr::NonNull;
use std::sync::OnceLock;

use crate::break_source::SbrkBreakSource;
use crate::heap_manager::HeapManager;
use crate::locked::Locked;

static HEAP: OnceLock<Locked<HeapManager<SbrkBreakSource>>> = OnceLock::new();

fn with_heap<R>(f: impl FnOnce(&mut HeapManager<SbrkBreakSource>) -> R) -> R {
    let locked = HEAP.get_or_init(|| Locked::new(HeapManager::new(SbrkBreakSource)));
    f(locked.lock())
}

/// Allocate `size` usable bytes from the process heap. Null on OS
/// exhaustion.
pub fn allocate(size: usize) -> *mut u8 {
    with_heap(|heap| heap.allocate(size)).map_or(core::ptr::null_mut(), NonNull::as_ptr)
}

/// Return a block previously handed out by [`allocate`] (or the zeroed /
/// resize variants below). A null `ptr` is a no-op.
pub fn release(ptr: *mut u8) {
    with_heap(|heap| heap.release(NonNull::new(ptr)));
}

/// Allocate space for `count` elements of `element_size` bytes each,
/// zero-filled. Null on a zero argument or an overflowing product.
pub fn allocate_zeroed(count: usize, element_size: usize) -> *mut u8 {
    with_heap(|heap| heap.allocate_zeroed(count, element_size)).map_or(core::ptr::null_mut(), NonNull::as_ptr)
}

/// Grow or shrink a live allocation, copying into fresh space when
/// growing past what the current block can hold. A null `ptr` behaves
/// like [`allocate`]; `new_size == 0` behaves like [`release`] and
/// returns null.
pub fn resize(ptr: *mut u8, new_size: usize) -> *mut u8 {
    with_heap(|heap| heap.resize(NonNull::new(ptr), new_size)).map_or(core::ptr::null_mut(), NonNull::as_ptr)
}

/// Drop-in [`GlobalAlloc`] wired to the process-wide heap above.
///
/// Alignment requests beyond the allocator's fixed 8-byte quantum are not
/// honored — callers needing coarser alignment need a different
/// allocator (documented Non-goal).
pub struct SbrkAllocator;

unsafe impl GlobalAlloc for SbrkAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        allocate(layout.size())
    }

    unsafe fn dealloc(&self, ptr: *mut u8, _layout: Layout) {
        release(ptr);
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        allocate_zeroed(1, layout.size())
    }

    unsafe fn realloc(&self, ptr: *mut u8, _layout: Layout, new_size: usize) -> *mut u8 {
        resize(ptr, new_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // `HEAP` has no real synchronization (see `Locked`'s single-threaded
    // caveat) and `cargo test` runs test functions on separate threads by
    // default — this guards the tests below from racing each other on
    // the one shared static, same constraint the allocator itself
    // documents as the caller's job to uphold.
    static SERIAL: Mutex<()> = Mutex::new(());

    #[test]
    fn release_of_null_is_a_harmless_no_op() {
        let _guard = SERIAL.lock().unwrap();
        release(core::ptr::null_mut());
    }

    #[test]
    fn roundtrip_through_the_public_entry_points() {
        let _guard = SERIAL.lock().unwrap();
        let p = allocate(64);
        assert!(!p.is_null());
        unsafe { p.write_bytes(0x7E, 64) };
        let p = resize(p, 256);
        assert!(!p.is_null());
        unsafe { assert_eq!(*p, 0x7E) };
        release(p);
    }

    #[test]
    fn global_alloc_impl_roundtrips() {
        let _guard = SERIAL.lock().unwrap();
        let alloc = SbrkAllocator;
        let layout = Layout::from_size_align(128, 8).unwrap();
        unsafe {
            let p = alloc.alloc(layout);
            assert!(!p.is_null());
            p.write_bytes(0xCC, 128);
            let grown = alloc.realloc(p, layout, 512);
            assert!(!grown.is_null());
            assert_eq!(*grown, 0xCC);
            alloc.dealloc(grown, Layout::from_size_align(512, 8).unwrap());
        }
    }
}
