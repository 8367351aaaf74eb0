//! Allocator tunables.
//!
//! These are design-level constants rather than runtime policy inputs —
//! they ship as `const`s for the default configuration. [`Tuning`]
//! exists only so tests can shrink `chunk` far below a real 4 MiB OS
//! extension and exercise the chunk-growth path without allocating
//! megabytes per test, since this heap's backing region grows
//! dynamically instead of being fixed at boot.

/// Inline per-block size header.
pub const HEADER_BYTES: usize = 8;

/// Alignment and size quantum for every block.
pub const ALIGN: usize = 8;

/// Default chunk granularity requested from the `BreakSource`.
pub const CHUNK: usize = 4 * 1024 * 1024;

/// Default threshold below which a tail free block is kept rather than
/// released back to the OS.
pub const MIN_RELEASE: usize = 3 * 1024 * 1024;

/// The true minimum residual a block must retain to be split rather than
/// handed over whole: a free node needs room for its size header plus
/// both its `prev` and `next` links (24 bytes on a 64-bit target). A
/// residual smaller than this could not stand as a valid free block, so
/// the heap manager takes the whole node instead of carving it.
///
/// This is deliberately distinct from `block_list::FIND_FIT_SLACK`, which
/// only decides whether a block is worth considering during the scan.
pub const MIN_SPLIT_SLACK: usize = 3 * size_of::<usize>();

/// Runtime-overridable tuning for a [`crate::heap_manager::HeapManager`].
/// The default matches the const table above.
#[derive(Debug, Clone, Copy)]
pub struct Tuning {
    pub chunk: usize,
    pub min_release: usize,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            chunk: CHUNK,
            min_release: MIN_RELEASE,
        }
    }
}

/// Round `value` up to the next multiple of `ALIGN`.
pub const fn align_up(value: usize) -> usize {
    (value + ALIGN - 1) & !(ALIGN - 1)
}
