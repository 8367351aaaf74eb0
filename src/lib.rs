//! A first-fit, split-and-coalesce dynamic memory allocator.
//!
//! An intrusive free list ([`block_list`]) tracks the gaps in a heap that
//! grows by requesting address space from an opaque [`break_source`] —
//! analogous to Unix `sbrk(2)` — a chunk at a time. [`heap_manager`]
//! drives the allocate/release/resize policy over that list; the process-
//! wide singleton and `GlobalAlloc` wrapper live in [`global_alloc`].
//!
//! Register it as the process allocator with:
//!
//! ```no_run
//! #[global_allocator]
//! static ALLOCATOR: sbrk_alloc::SbrkAllocator = sbrk_alloc::SbrkAllocator;
//! ```

pub mod block_list;
pub mod break_source;
pub mod config;
pub mod error;
pub mod global_alloc;
pub mod heap_manager;
pub mod locked;

pub use break_source::BreakSource;
pub use error::AllocError;
pub use global_alloc::SbrkAllocator;
pub use heap_manager::HeapManager;
