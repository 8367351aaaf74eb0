//! Interior mutability for the process-wide allocator singleton.
//!
//! A thin `UnsafeCell` wrapper that lets a `static` hold a mutable
//! allocator. Sound only because this crate treats the allocator as
//! single-threaded — see [`Locked::lock`] for the real-world caveat and
//! where a `Mutex` would go for a concurrent rework.

use core::cell::UnsafeCell;

pub struct Locked<A> {
    inner: UnsafeCell<A>,
}

// SAFETY: `Locked<A>` is only ever `Sync` under the single-threaded
// assumption spelled out in the design notes: every public entry point
// runs to completion before returning, and nothing here synchronizes
// concurrent callers. A concurrent rework needs an actual
// `Mutex`/`SpinLock` here instead of bare `UnsafeCell` + unconditional
// `Sync`.
unsafe impl<A> Sync for Locked<A> {}

impl<A> Locked<A> {
    pub const fn new(inner: A) -> Self {
        Self {
            inner: UnsafeCell::new(inner),
        }
    }

    /// Acquire mutable access to the wrapped value.
    ///
    /// # Safety-by-convention
    /// No actual exclusion happens here — see the `Sync` impl above.
    /// Every caller in this crate holds the resulting `&mut A` only for
    /// the duration of one allocator entry point and never across a
    /// reentrant call, which is sound under this crate's single-threaded
    /// model but would need a real lock for concurrent callers.
    pub fn lock(&self) -> &mut A {
        unsafe { &mut *self.inner.get() }
    }
}
