//! Internal error taxonomy.
//!
//! None of this crosses the public ABI: every entry point in
//! [`crate::global_alloc`] stays total, returning an address or null.
//! These variants exist for internal propagation and for `log` call
//! sites to format against.

pub use crate::block_list::BlockListError;

/// Everything that can go wrong inside the allocator core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AllocError {
    #[error("free list precondition violated: {0}")]
    List(#[from] BlockListError),
    #[error("the operating system refused to extend the program break")]
    OsExhausted,
}
