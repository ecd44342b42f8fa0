// seshdb - in-process session store with token-addressed slots

#![warn(rust_2018_idioms)]

pub mod config;
pub mod http;
pub mod store;
pub mod token;

// Re-exports for convenience
pub use config::SessionConfig;
pub use store::{SessionManager, SessionRecord, SessionStats, SlotRef};

/// seshdb error types
pub mod error {
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum Error {
        #[error("Malformed token: {0}")]
        MalformedToken(String),

        #[error("Slot out of range: segment {segment}, offset {offset}")]
        OutOfRange { segment: usize, offset: usize },

        #[error("Identifiers don't match")]
        IdentityMismatch,

        #[error("Session is not active")]
        Inactive,

        #[error("Trying to end invalid session: {0}")]
        InvalidSession(Box<Error>),

        #[error("Invalid config: {0}")]
        Config(String),
    }

    pub type Result<T> = std::result::Result<T, Error>;
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
