//! Segmented backing storage for session records
//!
//! Segments are appended, never removed or compacted, so a slot reference
//! stays valid for the lifetime of the store. The segment list sits behind
//! one `RwLock` and each record behind its own, so reads of distinct slots
//! never contend and an append is atomic for readers.

use super::slot::{SessionRecord, SlotRef};
use crate::error::{Error, Result};
use parking_lot::RwLock;
use tracing::debug;

/// One fixed-size, append-only block of record slots
struct Segment {
    records: Box<[RwLock<SessionRecord>]>,
}

impl Segment {
    fn new(size: usize) -> Self {
        let records = (0..size)
            .map(|_| RwLock::new(SessionRecord::default()))
            .collect();
        Self { records }
    }
}

/// Append-only list of fixed-size segments with per-record locks
pub struct SlotStore {
    segments: RwLock<Vec<Segment>>,
    segment_size: usize,
}

impl SlotStore {
    /// Create a store with one empty segment of `segment_size` slots
    pub fn new(segment_size: usize) -> Self {
        Self {
            segments: RwLock::new(vec![Segment::new(segment_size)]),
            segment_size,
        }
    }

    /// Slots per segment, fixed for the store's lifetime
    pub fn segment_size(&self) -> usize {
        self.segment_size
    }

    /// Number of segments currently allocated
    pub fn segment_count(&self) -> usize {
        self.segments.read().len()
    }

    /// Clone out the record at `slot`
    pub fn read(&self, slot: SlotRef) -> Result<SessionRecord> {
        let segments = self.segments.read();
        let segment = self.locate(&segments, slot)?;
        let record = segment.records[slot.offset].read().clone();
        Ok(record)
    }

    /// Replace the record at `slot`
    pub fn write(&self, slot: SlotRef, record: SessionRecord) -> Result<()> {
        let segments = self.segments.read();
        let segment = self.locate(&segments, slot)?;
        *segment.records[slot.offset].write() = record;
        Ok(())
    }

    /// Run `f` on the record at `slot` under its write lock
    ///
    /// Used where read-check-modify has to be atomic, e.g. flipping a
    /// session inactive exactly once.
    pub fn update<R>(&self, slot: SlotRef, f: impl FnOnce(&mut SessionRecord) -> R) -> Result<R> {
        let segments = self.segments.read();
        let segment = self.locate(&segments, slot)?;
        let mut record = segment.records[slot.offset].write();
        Ok(f(&mut record))
    }

    /// Append one empty segment
    ///
    /// The list write lock makes the append atomic: readers either see the
    /// old count or a fully initialized new segment, never anything partial.
    pub fn append_segment(&self) {
        let mut segments = self.segments.write();
        segments.push(Segment::new(self.segment_size));
        debug!(segments = segments.len(), "Appended segment");
    }

    /// Make sure segment `index` exists, appending as needed
    ///
    /// Backstop for the high-water rollover when background growth has not
    /// finished yet; a no-op when capacity is already there.
    pub fn ensure_segment(&self, index: usize) {
        let mut segments = self.segments.write();
        while segments.len() <= index {
            segments.push(Segment::new(self.segment_size));
            debug!(segments = segments.len(), "Appended segment inline");
        }
    }

    fn locate<'a>(&self, segments: &'a [Segment], slot: SlotRef) -> Result<&'a Segment> {
        if slot.offset >= self.segment_size {
            return Err(Error::OutOfRange {
                segment: slot.segment,
                offset: slot.offset,
            });
        }
        segments.get(slot.segment).ok_or(Error::OutOfRange {
            segment: slot.segment,
            offset: slot.offset,
        })
    }
}
