//! Session slot store
//!
//! Segmented slot storage with a recycling allocator, behind a small facade.
//!
//! # Architecture
//!
//! ```text
//! SessionManager
//!   ├─→ SlotStore      → append-only segments of fixed-size record slots
//!   ├─→ SlotAllocator  → FIFO free list threaded through the records,
//!   │                    plus the high-water mark into fresh space
//!   └─→ GrowthManager  → appends a segment before the newest one fills
//! ```
//!
//! Freed slots are reused before any new segment is grown, and growth never
//! blocks the session-start path.

pub mod free_list;
pub mod growth;
pub mod manager;
pub mod slot;
pub mod storage;

pub use free_list::SlotAllocator;
pub use growth::GrowthManager;
pub use manager::{SessionManager, SessionStats};
pub use slot::{SessionRecord, SlotRef};
pub use storage::SlotStore;
