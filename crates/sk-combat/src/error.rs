//! Error types for the combat tracker.
//!
//! The combat operations themselves never fail: invalid input falls back to
//! defaults and unmet preconditions are no-ops. Errors only come from
//! configuration loading and from the shared-room storage layer.

use thiserror::Error;

/// Result type for tracker operations that can fail.
pub type TrackerResult<T> = Result<T, TrackerError>;

/// Errors raised by configuration and synchronisation.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// The tracker configuration could not be parsed.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// A room code was empty, too long, or contained invalid characters.
    #[error("invalid room code: {0:?}")]
    InvalidRoomCode(String),

    /// The auth provider had no token to hand out.
    #[error("no credentials available")]
    MissingCredentials,

    /// A write carried a version that is not newer than the stored one.
    #[error("stale write: version {attempted} is not newer than stored version {stored}")]
    StaleWrite {
        /// Version the writer tried to store.
        attempted: u64,
        /// Version already held by the storage.
        stored: u64,
    },

    /// The storage backend failed (network, disk, lock poisoning, ...).
    #[error("storage backend error: {0}")]
    Backend(String),

    /// Room state could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
