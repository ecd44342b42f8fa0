//! Recycling slot allocator
//!
//! Freed slots form a FIFO singly-linked list threaded through the records
//! themselves (`next_free`), so reclaim costs no extra allocation and slot
//! handles stay stable. `acquire` prefers recycled slots and only advances
//! the high-water mark into fresh space when the list is empty. FIFO order
//! keeps recently-active slots out of circulation for a while, which makes
//! session traces easier to follow.
//!
//! All bookkeeping (`free_head`, `free_tail`, the high-water mark, the
//! growth flag) lives under a single mutex, so acquire, release, and
//! growth triggering are linearizable with respect to each other.

use super::slot::SlotRef;
use super::storage::SlotStore;
use crate::error::Result;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Default)]
struct AllocState {
    /// Oldest freed slot, the next one to be reused
    free_head: Option<SlotRef>,
    /// Most recently freed slot
    free_tail: Option<SlotRef>,
    /// Farthest slot ever handed out from fresh space
    high_water: Option<SlotRef>,
    /// A growth task is in flight
    growing: bool,
    /// Slots currently on the free list
    free_len: usize,
    /// Slots currently held by live sessions
    live: usize,
}

/// Hands out and reclaims slots against a shared [`SlotStore`]
pub struct SlotAllocator {
    store: Arc<SlotStore>,
    state: Mutex<AllocState>,
}

impl SlotAllocator {
    pub fn new(store: Arc<SlotStore>) -> Self {
        Self {
            store,
            state: Mutex::new(AllocState::default()),
        }
    }

    /// Hand out the next slot: recycled first, fresh space otherwise
    pub fn acquire(&self) -> Result<SlotRef> {
        let mut state = self.state.lock();
        let slot = match state.free_head {
            Some(head) => {
                if state.free_tail == Some(head) {
                    // single-element list, now empty
                    state.free_head = None;
                    state.free_tail = None;
                } else {
                    state.free_head = self.store.read(head)?.next_free;
                }
                state.free_len -= 1;
                debug!(slot = %head, "Reusing freed slot");
                head
            }
            None => self.advance_high_water(&mut state),
        };
        state.live += 1;
        Ok(slot)
    }

    /// Append `slot` to the tail of the free list
    ///
    /// The caller must have flipped the record inactive first; a slot is
    /// never both live and on the list.
    pub fn release(&self, slot: SlotRef) -> Result<()> {
        let mut state = self.state.lock();
        self.store.update(slot, |record| record.next_free = None)?;
        match state.free_tail {
            None => state.free_head = Some(slot),
            Some(tail) => {
                self.store.update(tail, |record| record.next_free = Some(slot))?;
            }
        }
        state.free_tail = Some(slot);
        state.free_len += 1;
        state.live -= 1;
        debug!(slot = %slot, "Released slot");
        Ok(())
    }

    /// Advance into fresh space, creating the next segment on rollover if
    /// background growth has not caught up
    fn advance_high_water(&self, state: &mut AllocState) -> SlotRef {
        let next = match state.high_water {
            None => SlotRef::new(0, 0),
            Some(mark) if mark.offset + 1 < self.store.segment_size() => {
                SlotRef::new(mark.segment, mark.offset + 1)
            }
            Some(mark) => {
                self.store.ensure_segment(mark.segment + 1);
                SlotRef::new(mark.segment + 1, 0)
            }
        };
        state.high_water = Some(next);
        next
    }

    /// Claim the growth flag if `just_allocated` shows pressure on the
    /// newest segment
    ///
    /// Returns `true` exactly when the caller is now responsible for
    /// growing and then calling [`finish_growth`](Self::finish_growth).
    /// Pressure on older, already-full segments never triggers.
    pub fn begin_growth(&self, just_allocated: SlotRef, resize_at: usize) -> bool {
        let mut state = self.state.lock();
        if state.growing {
            return false;
        }
        let newest = self.store.segment_count() - 1;
        if just_allocated.offset >= resize_at && just_allocated.segment == newest {
            state.growing = true;
            return true;
        }
        false
    }

    /// Clear the growth flag once a segment append completed
    pub fn finish_growth(&self) {
        self.state.lock().growing = false;
    }

    /// Point-in-time (live, free) slot counts
    pub(crate) fn occupancy(&self) -> (usize, usize) {
        let state = self.state.lock();
        (state.live, state.free_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allocator(segment_size: usize) -> SlotAllocator {
        SlotAllocator::new(Arc::new(SlotStore::new(segment_size)))
    }

    #[test]
    fn test_fresh_allocation_order() -> Result<()> {
        let alloc = allocator(3);

        assert_eq!(alloc.acquire()?, SlotRef::new(0, 0));
        assert_eq!(alloc.acquire()?, SlotRef::new(0, 1));
        assert_eq!(alloc.acquire()?, SlotRef::new(0, 2));
        Ok(())
    }

    #[test]
    fn test_rollover_creates_segment() -> Result<()> {
        let store = Arc::new(SlotStore::new(2));
        let alloc = SlotAllocator::new(Arc::clone(&store));

        alloc.acquire()?;
        alloc.acquire()?;
        assert_eq!(store.segment_count(), 1);

        // third slot must come from a segment that did not exist yet
        assert_eq!(alloc.acquire()?, SlotRef::new(1, 0));
        assert_eq!(store.segment_count(), 2);
        Ok(())
    }

    #[test]
    fn test_fifo_reuse() -> Result<()> {
        let alloc = allocator(8);

        let a = alloc.acquire()?;
        let b = alloc.acquire()?;
        let _c = alloc.acquire()?;

        alloc.release(a)?;
        alloc.release(b)?;

        // oldest-freed first, then back to fresh space
        assert_eq!(alloc.acquire()?, a);
        assert_eq!(alloc.acquire()?, b);
        assert_eq!(alloc.acquire()?, SlotRef::new(0, 3));
        Ok(())
    }

    #[test]
    fn test_single_element_list_drains() -> Result<()> {
        let alloc = allocator(8);

        let a = alloc.acquire()?;
        alloc.release(a)?;

        assert_eq!(alloc.acquire()?, a);
        // list is empty again, next slot is fresh
        assert_eq!(alloc.acquire()?, SlotRef::new(0, 1));
        Ok(())
    }

    #[test]
    fn test_released_slot_clears_next_free() -> Result<()> {
        let store = Arc::new(SlotStore::new(8));
        let alloc = SlotAllocator::new(Arc::clone(&store));

        let a = alloc.acquire()?;
        let b = alloc.acquire()?;
        alloc.release(a)?;
        alloc.release(b)?;

        // tail's link must be the end of the list
        assert_eq!(store.read(b)?.next_free, None);
        // head links to the slot freed after it
        assert_eq!(store.read(a)?.next_free, Some(b));
        Ok(())
    }

    #[test]
    fn test_growth_flag_handshake() -> Result<()> {
        let alloc = allocator(4);
        let first = alloc.acquire()?; // (0, 0)

        // below threshold: no trigger
        assert!(!alloc.begin_growth(first, 3));

        alloc.acquire()?;
        alloc.acquire()?;
        let hot = alloc.acquire()?; // (0, 3)
        assert!(alloc.begin_growth(hot, 3));

        // already in flight
        assert!(!alloc.begin_growth(hot, 3));

        alloc.finish_growth();
        // newest segment is still 0, so the same slot can re-trigger
        assert!(alloc.begin_growth(hot, 3));
        Ok(())
    }

    #[test]
    fn test_old_segments_never_trigger_growth() -> Result<()> {
        let store = Arc::new(SlotStore::new(4));
        let alloc = SlotAllocator::new(Arc::clone(&store));

        let slot = alloc.acquire()?; // (0, 0) with threshold 0 would trigger
        store.append_segment();

        // pressure is only measured against the newest segment
        assert!(!alloc.begin_growth(slot, 0));
        Ok(())
    }

    #[test]
    fn test_occupancy_counters() -> Result<()> {
        let alloc = allocator(8);

        let a = alloc.acquire()?;
        let _b = alloc.acquire()?;
        assert_eq!(alloc.occupancy(), (2, 0));

        alloc.release(a)?;
        assert_eq!(alloc.occupancy(), (1, 1));

        alloc.acquire()?;
        assert_eq!(alloc.occupancy(), (2, 0));
        Ok(())
    }
}
