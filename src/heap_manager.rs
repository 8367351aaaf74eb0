//! The allocator core: chooses where to satisfy a request, splits
//! oversized free regions, coalesces on release, and decides when to
//! hand address space back to the OS.

use core::ptr::NonNull;

use crate::block_list::{self, BlockList, FitStatus, FreeBlockPtr};
use crate::break_source::BreakSource;
use crate::config::{HEADER_BYTES, MIN_SPLIT_SLACK, Tuning, align_up};
use crate::error::AllocError;

/// Holds the free list and the cached program break for one heap.
///
/// Generic over [`BreakSource`] so tests can swap in
/// [`crate::break_source::testing::FakeBreakSource`] without touching a
/// real process break.
pub struct HeapManager<B: BreakSource> {
    free_list: BlockList,
    break_source: B,
    program_break: usize,
    initial_break: usize,
    tuning: Tuning,
}

impl<B: BreakSource> HeapManager<B> {
    pub fn new(break_source: B) -> Self {
        Self::with_tuning(break_source, Tuning::default())
    }

    pub fn with_tuning(break_source: B, tuning: Tuning) -> Self {
        let initial_break = break_source.query_break();
        Self {
            free_list: BlockList::new(),
            break_source,
            program_break: initial_break,
            initial_break,
            tuning,
        }
    }

    pub fn program_break(&self) -> usize {
        self.program_break
    }

    pub fn initial_break(&self) -> usize {
        self.initial_break
    }

    /// Sum of `size` over every node currently on the free list.
    pub fn free_bytes(&self) -> usize {
        let mut total = 0;
        let mut cur = self.free_list.head();
        while let Some(node) = cur {
            total += node.size();
            cur = node.next();
        }
        total
    }

    fn assert_invariants(&self) {
        #[cfg(debug_assertions)]
        self.free_list.assert_invariants();
    }

    /// Satisfy a request for `user_size` usable bytes, returning the
    /// address of the payload (just past the inline header) or `None` if
    /// the OS refuses to grow the break any further.
    pub fn allocate(&mut self, user_size: usize) -> Option<NonNull<u8>> {
        let min_payload = 2 * size_of::<usize>();
        let user_size = user_size.max(min_payload);
        let need = align_up(user_size + HEADER_BYTES);

        let (victim, status) = self.free_list.find_first_fit(need);
        log::trace!("allocate: need={need} status={status:?}");

        let block_addr = match status {
            FitStatus::Exact => {
                let victim = victim.expect("Exact implies a node");
                self.free_list.remove(victim);
                victim.addr()
            }
            FitStatus::Larger => {
                let victim = victim.expect("Larger implies a node");
                self.split_or_take(victim, need)
            }
            FitStatus::Smaller | FitStatus::Empty => {
                let grown = match self.grow_heap(need) {
                    Ok(block) => block,
                    Err(e) => {
                        log::warn!("allocate: {e}");
                        return None;
                    }
                };
                match status {
                    FitStatus::Smaller => self.free_list.append(grown),
                    FitStatus::Empty => self.free_list.append(grown),
                    _ => unreachable!(),
                }
                self.split_or_take(grown, need)
            }
        };

        self.assert_invariants();
        NonNull::new((block_addr + HEADER_BYTES) as *mut u8)
    }

    /// Request `extend(k * chunk)` for the smallest `k` with
    /// `k * chunk >= need`, and install the resulting region as a single
    /// free block.
    fn grow_heap(&mut self, need: usize) -> Result<FreeBlockPtr, AllocError> {
        let k = need.div_ceil(self.tuning.chunk).max(1);
        let grow = k * self.tuning.chunk;
        let prev_break = self
            .break_source
            .extend(grow as isize)
            .ok_or(AllocError::OsExhausted)?;
        self.program_break += grow;
        log::debug!("grow_heap: extended by {grow} bytes, break now {}", self.program_break);
        Ok(unsafe { FreeBlockPtr::init(prev_break, grow) })
    }

    /// Carves the high `need` bytes off `victim` when the residual left
    /// behind would still be a valid free block, otherwise hands over the
    /// whole block. Returns the address of the allocated block's header.
    fn split_or_take(&mut self, victim: FreeBlockPtr, need: usize) -> usize {
        let total = victim.size();
        debug_assert!(total >= need);
        if total - need >= MIN_SPLIT_SLACK {
            let alloc_addr = victim.addr() + (total - need);
            victim.set_size(total - need);
            unsafe { block_list::write_alloc_header(alloc_addr, need) };
            log::trace!("split: residual={} alloc_addr={alloc_addr:#x}", total - need);
            alloc_addr
        } else {
            self.free_list.remove(victim);
            victim.addr()
        }
    }

    /// Return a previously allocated block to the free list. `address ==
    /// None` is a silent no-op.
    pub fn release(&mut self, address: Option<NonNull<u8>>) {
        let Some(address) = address else { return };
        let block_addr = address.as_ptr() as usize - HEADER_BYTES;
        let size = unsafe { block_list::read_alloc_header(block_addr) };
        let block = unsafe { FreeBlockPtr::init(block_addr, size) };
        log::trace!("release: block_addr={block_addr:#x} size={size}");

        if let Err(e) = self.insert_coalescing(block) {
            log::warn!("release: {e}");
        }
        self.maybe_release_to_os();
        self.assert_invariants();
    }

    /// Walk the free list in address order, left-coalescing, inserting,
    /// or right-coalescing as appropriate.
    fn insert_coalescing(&mut self, block: FreeBlockPtr) -> Result<(), AllocError> {
        let Some(head) = self.free_list.head() else {
            self.free_list.append(block);
            return Ok(());
        };

        let mut index = 0;
        let mut cur = Some(head);
        while let Some(node) = cur {
            if node.end_addr() == block.addr() {
                // Left-coalesce into `node`.
                node.set_size(node.size() + block.size());
                if let Some(next) = node.next() {
                    if node.end_addr() == next.addr() {
                        self.free_list.merge_adjacent(node, next);
                    }
                }
                return Ok(());
            }
            if block.addr() < node.end_addr() {
                self.free_list.insert_at(block, index)?;
                if let Some(next) = block.next() {
                    if block.end_addr() == next.addr() {
                        self.free_list.merge_adjacent(block, next);
                    }
                }
                if let Some(prev) = block.prev() {
                    if prev.end_addr() == block.addr() {
                        self.free_list.merge_adjacent(prev, block);
                    }
                }
                return Ok(());
            }
            index += 1;
            cur = node.next();
        }

        self.free_list.append(block);
        Ok(())
    }

    /// Retract the break if the tail free node is large enough and butts
    /// up against it.
    fn maybe_release_to_os(&mut self) {
        let mut cur = self.free_list.head();
        let mut tail = None;
        while let Some(node) = cur {
            tail = Some(node);
            cur = node.next();
        }
        let Some(tail) = tail else { return };

        if tail.size() >= self.tuning.min_release && tail.end_addr() == self.program_break {
            let size = tail.size();
            self.free_list.remove(tail);
            if self.break_source.extend(-(size as isize)).is_some() {
                self.program_break -= size;
                log::debug!("maybe_release_to_os: retracted {size} bytes, break now {}", self.program_break);
            } else {
                // The OS refused to shrink; put the block back rather
                // than leak it.
                log::warn!("maybe_release_to_os: extend(-{size}) failed, keeping block");
                self.free_list.append(tail);
            }
        }
    }

    /// Allocate space for `count` elements of `element_size` bytes each,
    /// zero-filled. `None` on an overflowing product or a zero argument.
    pub fn allocate_zeroed(&mut self, count: usize, element_size: usize) -> Option<NonNull<u8>> {
        if count == 0 || element_size == 0 {
            return None;
        }
        let total = count.checked_mul(element_size)?;
        let ptr = self.allocate(total)?;
        unsafe { ptr.as_ptr().write_bytes(0, total) };
        Some(ptr)
    }

    /// Grow or shrink a live allocation in place when possible, otherwise
    /// allocate fresh space and copy. `address == None` behaves like
    /// `allocate`; `new_size == 0` behaves like `release`.
    pub fn resize(&mut self, address: Option<NonNull<u8>>, new_size: usize) -> Option<NonNull<u8>> {
        let Some(address) = address else {
            return self.allocate(new_size);
        };
        if new_size == 0 {
            self.release(Some(address));
            return None;
        }

        let block_addr = address.as_ptr() as usize - HEADER_BYTES;
        let usable = unsafe { block_list::read_alloc_header(block_addr) } - HEADER_BYTES;
        if new_size <= usable {
            return Some(address);
        }

        let new_ptr = self.allocate(new_size)?;
        unsafe {
            core::ptr::copy_nonoverlapping(address.as_ptr(), new_ptr.as_ptr(), usable);
        }
        self.release(Some(address));
        Some(new_ptr)
    }
}
