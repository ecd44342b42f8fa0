//! Session manager facade
//!
//! Composes the slot store, recycling allocator, and growth manager behind
//! the three operations callers see: `start`, `verify`, `end`. One manager
//! instance is shared by all request handlers; there is no ambient global.

use super::free_list::SlotAllocator;
use super::growth::GrowthManager;
use super::slot::{SessionRecord, SlotRef};
use super::storage::SlotStore;
use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::token;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Token-addressed session store
///
/// Cheap to share behind an `Arc`; all interior state carries its own
/// locking. Sessions never expire on their own, only [`end`](Self::end)
/// reclaims a slot.
pub struct SessionManager {
    store: Arc<SlotStore>,
    allocator: Arc<SlotAllocator>,
    growth: GrowthManager,
}

impl SessionManager {
    /// Create a manager from a validated configuration
    pub fn new(config: SessionConfig) -> Result<Self> {
        config.validate()?;

        let store = Arc::new(SlotStore::new(config.segment_size));
        let allocator = Arc::new(SlotAllocator::new(Arc::clone(&store)));
        let growth = GrowthManager::new(
            Arc::clone(&store),
            Arc::clone(&allocator),
            config.resize_at(),
        );

        info!(
            segment_size = config.segment_size,
            resize_at = config.resize_at(),
            "Session store ready"
        );

        Ok(Self {
            store,
            allocator,
            growth,
        })
    }

    /// Start a session for `identifier`, returning the client-held token
    ///
    /// The identifier is copied verbatim into the token; it must not
    /// contain the token delimiter (see [`crate::token`]).
    pub fn start(&self, identifier: &str) -> Result<String> {
        let slot = self.allocator.acquire()?;
        self.store
            .write(slot, SessionRecord::activated(identifier.to_string()))?;
        self.growth.maybe_grow(slot);

        debug!(slot = %slot, "Started session");
        Ok(token::encode(slot, identifier))
    }

    /// Check that `token` names a live session
    pub fn verify(&self, token: &str) -> Result<()> {
        self.lookup(token).map(|_| ())
    }

    /// End the session named by `token` and recycle its slot
    ///
    /// Fails with [`Error::InvalidSession`] wrapping the underlying check
    /// failure; nothing is mutated in that case, so ending the same token
    /// twice releases the slot exactly once.
    pub fn end(&self, token: &str) -> Result<()> {
        let slot = self
            .lookup(token)
            .map_err(|e| Error::InvalidSession(Box::new(e)))?;

        // Flip under the record lock, then release. A concurrent end of the
        // same token loses the race here and sees the record inactive.
        let flipped = self.store.update(slot, |record| {
            let was_active = record.active;
            record.active = false;
            was_active
        })?;
        if !flipped {
            return Err(Error::InvalidSession(Box::new(Error::Inactive)));
        }

        self.allocator.release(slot)?;
        debug!(slot = %slot, "Ended session");
        Ok(())
    }

    /// Decode and validate a token: range, then identity, then active
    fn lookup(&self, token: &str) -> Result<SlotRef> {
        let (slot, identifier) = token::decode(token)?;

        // bounds against the segment count known right now; concurrent
        // growth only ever widens them
        if slot.segment >= self.store.segment_count() || slot.offset >= self.store.segment_size() {
            return Err(Error::OutOfRange {
                segment: slot.segment,
                offset: slot.offset,
            });
        }

        let record = self.store.read(slot)?;
        if record.identifier != identifier {
            return Err(Error::IdentityMismatch);
        }
        if !record.active {
            return Err(Error::Inactive);
        }
        Ok(slot)
    }

    /// Number of segments currently allocated
    pub fn segment_count(&self) -> usize {
        self.store.segment_count()
    }

    /// Point-in-time occupancy counters
    pub fn stats(&self) -> SessionStats {
        let (active_sessions, free_slots) = self.allocator.occupancy();
        SessionStats {
            segments: self.store.segment_count(),
            segment_size: self.store.segment_size(),
            active_sessions,
            free_slots,
        }
    }
}

/// Statistics for the session store
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SessionStats {
    pub segments: usize,
    pub segment_size: usize,
    pub active_sessions: usize,
    pub free_slots: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(segment_size: usize) -> SessionManager {
        SessionManager::new(SessionConfig {
            segment_size,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_start_verify_end() -> Result<()> {
        let manager = manager(10);

        let token = manager.start("alice")?;
        manager.verify(&token)?;
        manager.end(&token)?;

        assert!(matches!(manager.verify(&token), Err(Error::Inactive)));
        Ok(())
    }

    #[test]
    fn test_first_token_addresses_slot_zero() -> Result<()> {
        let manager = manager(10);

        let token = manager.start("alice")?;
        let (slot, identifier) = token::decode(&token)?;
        assert_eq!(slot, SlotRef::new(0, 0));
        assert_eq!(identifier, "alice");
        Ok(())
    }

    #[test]
    fn test_validation_order_is_range_identity_active() -> Result<()> {
        let manager = manager(10);
        let token = manager.start("alice")?;
        manager.end(&token)?;

        // record is inactive, but a wrong identifier must surface first
        assert!(matches!(
            manager.verify("0|0|mallory"),
            Err(Error::IdentityMismatch)
        ));
        // matching identifier on the ended record reports Inactive
        assert!(matches!(manager.verify(&token), Err(Error::Inactive)));
        // out-of-range wins over everything
        assert!(matches!(
            manager.verify("7|0|alice"),
            Err(Error::OutOfRange { segment: 7, offset: 0 })
        ));
        Ok(())
    }

    #[test]
    fn test_end_requires_valid_session() {
        let manager = manager(10);

        let err = manager.end("not a token").unwrap_err();
        assert!(matches!(err, Error::InvalidSession(_)));

        let err = manager.end("3|3|ghost").unwrap_err();
        match err {
            Error::InvalidSession(inner) => {
                assert!(matches!(*inner, Error::OutOfRange { .. }))
            }
            other => panic!("expected InvalidSession, got {:?}", other),
        }
    }

    #[test]
    fn test_stats_track_lifecycle() -> Result<()> {
        let manager = manager(10);

        let token = manager.start("alice")?;
        manager.start("bob")?;

        let stats = manager.stats();
        assert_eq!(stats.active_sessions, 2);
        assert_eq!(stats.free_slots, 0);
        assert_eq!(stats.segment_size, 10);

        manager.end(&token)?;
        let stats = manager.stats();
        assert_eq!(stats.active_sessions, 1);
        assert_eq!(stats.free_slots, 1);
        Ok(())
    }

    #[test]
    fn test_rejects_invalid_config() {
        let result = SessionManager::new(SessionConfig {
            segment_size: 0,
            ..Default::default()
        });
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
