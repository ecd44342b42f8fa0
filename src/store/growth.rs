//! Threshold-driven segment growth
//!
//! Growth is fire-and-forget: session start never waits on it. Each
//! trigger appends exactly one fixed-size segment, and completion is
//! logged so a lagging or failed grower shows up in traces. Correctness
//! never depends on the task finishing in time; the allocator's rollover
//! creates a segment inline when consumption outruns growth.

use super::free_list::SlotAllocator;
use super::slot::SlotRef;
use super::storage::SlotStore;
use std::sync::Arc;
use tracing::{debug, info};

/// Watches allocation pressure on the newest segment and grows ahead of it
pub struct GrowthManager {
    store: Arc<SlotStore>,
    allocator: Arc<SlotAllocator>,
    /// Offset within the newest segment at which growth is triggered
    resize_at: usize,
}

impl GrowthManager {
    pub fn new(store: Arc<SlotStore>, allocator: Arc<SlotAllocator>, resize_at: usize) -> Self {
        Self {
            store,
            allocator,
            resize_at,
        }
    }

    /// Schedule a segment append when `just_allocated` shows pressure on
    /// the newest segment; no-op while a growth is already in flight
    pub fn maybe_grow(&self, just_allocated: SlotRef) {
        if !self.allocator.begin_growth(just_allocated, self.resize_at) {
            return;
        }
        debug!(slot = %just_allocated, "Segment pressure, scheduling growth");

        let store = Arc::clone(&self.store);
        let allocator = Arc::clone(&self.allocator);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    grow(&store, &allocator);
                });
            }
            // no runtime around, grow inline; an append is cheap
            Err(_) => grow(&store, &allocator),
        }
    }
}

fn grow(store: &SlotStore, allocator: &SlotAllocator) {
    store.append_segment();
    allocator.finish_growth();
    info!(segments = store.segment_count(), "Session store grew");
}
