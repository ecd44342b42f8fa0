//! Session store configuration

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Default slots per segment
pub const DEFAULT_SEGMENT_SIZE: usize = 1000;

/// Default fraction of the newest segment that triggers growth
pub const DEFAULT_RESIZE_THRESHOLD: f64 = 0.75;

/// Tuning knobs for a [`SessionManager`](crate::SessionManager)
///
/// Loadable from a TOML file:
///
/// ```toml
/// segment_size = 1000
/// resize_threshold = 0.75
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Capacity of each growth unit, in slots
    pub segment_size: usize,
    /// Fraction of `segment_size` at which a new segment is appended.
    /// Must be low enough that growth finishes before the segment fills.
    pub resize_threshold: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            segment_size: DEFAULT_SEGMENT_SIZE,
            resize_threshold: DEFAULT_RESIZE_THRESHOLD,
        }
    }
}

impl SessionConfig {
    /// Load and validate a config from a TOML file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;
        let config: Self =
            toml::from_str(&raw).map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the allocator cannot run on
    pub fn validate(&self) -> Result<()> {
        if self.segment_size == 0 {
            return Err(Error::Config("segment_size must be at least 1".to_string()));
        }
        if !(self.resize_threshold > 0.0 && self.resize_threshold <= 1.0) {
            return Err(Error::Config(format!(
                "resize_threshold must be in (0, 1], got {}",
                self.resize_threshold
            )));
        }
        Ok(())
    }

    /// Offset within the newest segment at which growth is triggered
    pub(crate) fn resize_at(&self) -> usize {
        (self.segment_size as f64 * self.resize_threshold) as usize
    }
}
