//! The operating-system collaborator.
//!
//! Moving the program break is treated as an opaque operation: the heap
//! manager never calls `sbrk` (or any other syscall) directly, only
//! through this trait. This is the seam a kernel-hosted build would swap
//! for a page-table-backed implementation.

/// Grows or shrinks the address space backing the heap.
pub trait BreakSource {
    /// Move the break by `delta` bytes (negative to retract). Returns the
    /// break address *before* the move, or `None` if the OS refused.
    /// `extend(0)` returns the current break without mutating anything.
    fn extend(&mut self, delta: isize) -> Option<usize>;

    /// The current break address, without moving it.
    fn query_break(&self) -> usize;
}

/// Hosted backend: moves the process break via the platform's `sbrk`.
#[cfg(unix)]
pub struct SbrkBreakSource;

#[cfg(unix)]
impl BreakSource for SbrkBreakSource {
    fn extend(&mut self, delta: isize) -> Option<usize> {
        // SAFETY: `sbrk` is a plain libc call; its only hazard is that it
        // is process-global and not reentrant-safe across threads, which
        // is exactly the concurrency constraint the design notes document
        // as the caller's responsibility (the heap manager's lock must
        // serialize all calls into this trait).
        let prev = unsafe { libc::sbrk(delta as libc::intptr_t) };
        if prev == usize::MAX as *mut libc::c_void {
            log::warn!("sbrk({delta}) failed");
            return None;
        }
        Some(prev as usize)
    }

    fn query_break(&self) -> usize {
        unsafe { libc::sbrk(0) as usize }
    }
}

/// An in-memory stand-in for a process break.
///
/// Backed by a fixed-capacity buffer reserved once up front, so the base
/// address never moves under a growing `Vec` reallocation — `extend`
/// only ever adjusts the *used* length within that reservation, and
/// fails (mimicking real OS exhaustion) once the reservation runs out.
/// Deterministic and safe to run alongside other tests, unlike the real
/// (process-global) `sbrk`.
pub mod testing {
    use super::BreakSource;

    pub struct FakeBreakSource {
        // Fixed capacity for the lifetime of this value: real backing
        // memory for every address the allocator hands out.
        reservation: Box<[u8]>,
        used: usize,
    }

    impl FakeBreakSource {
        /// Reserve `capacity` bytes of real backing memory up front.
        pub fn new(capacity: usize) -> Self {
            Self {
                reservation: vec![0u8; capacity].into_boxed_slice(),
                used: 0,
            }
        }

        fn base(&self) -> usize {
            self.reservation.as_ptr() as usize
        }
    }

    impl BreakSource for FakeBreakSource {
        fn extend(&mut self, delta: isize) -> Option<usize> {
            let prev_used = self.used;
            if delta >= 0 {
                let delta = delta as usize;
                if prev_used + delta > self.reservation.len() {
                    return None;
                }
                self.used += delta;
            } else {
                let shrink = (-delta) as usize;
                if shrink > prev_used {
                    return None;
                }
                self.used -= shrink;
            }
            Some(self.base() + prev_used)
        }

        fn query_break(&self) -> usize {
            self.base() + self.used
        }
    }
}
