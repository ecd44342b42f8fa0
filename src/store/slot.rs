//! Slot references and session records

use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of one session record: which segment, and which offset within it
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SlotRef {
    /// Segment index (0 = oldest)
    pub segment: usize,
    /// Record offset within the segment
    pub offset: usize,
}

impl SlotRef {
    /// Create a new slot reference
    pub fn new(segment: usize, offset: usize) -> Self {
        Self { segment, offset }
    }
}

impl fmt::Display for SlotRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Slot(segment={}, offset={})", self.segment, self.offset)
    }
}

/// One session record, stored in a slot
///
/// `next_free` is only meaningful while the record sits on the free list;
/// an active record always carries `None` there.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionRecord {
    /// Whether this slot currently holds a live session
    pub active: bool,
    /// Next slot on the free list, threading the list through storage
    pub next_free: Option<SlotRef>,
    /// Opaque application identifier (e.g. a username), echoed in the token
    pub identifier: String,
}

impl SessionRecord {
    /// Record for a freshly started session
    pub fn activated(identifier: String) -> Self {
        Self {
            active: true,
            next_free: None,
            identifier,
        }
    }
}
