//! Persistence and sharing of combat state.
//!
//! The engine itself is synchronous and in-memory. A [`SessionStore`] is
//! where a [`SyncedTracker`] saves after each change and loads from when
//! polling. [`LocalStore`] keeps everything in process; [`RoomStore`] shares
//! a room through a [`RoomBackend`].
//!
//! Every saved snapshot carries a version that goes up by one per change.
//! Backends refuse writes that are not newer than what they hold, so two
//! participants racing on the same version cannot silently overwrite each
//! other: the loser gets [`TrackerError::StaleWrite`] and re-fetches.

pub mod memory;
pub mod room;
pub mod tracker;

pub use memory::MemoryRoomBackend;
pub use room::{AuthProvider, AuthToken, RoomBackend, RoomCode, RoomStatePatch, RoomStore, StaticToken};
pub use tracker::{PollOutcome, SyncedTracker, spawn_poller};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{TrackerError, TrackerResult};
use crate::session::SharedState;

/// Shared state plus the version it was saved at.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    /// Monotonic change counter.
    pub version: u64,
    /// The combat state.
    #[serde(flatten)]
    pub state: SharedState,
}

/// Somewhere a session's shared state is saved to and loaded from.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the latest snapshot, or `None` if nothing has been saved yet.
    async fn load(&self) -> TrackerResult<Option<SessionSnapshot>>;

    /// Save a snapshot.
    async fn save(&self, snapshot: &SessionSnapshot) -> TrackerResult<()>;
}

/// Store for a purely local session: nothing is loaded, saves succeed.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStore;

#[async_trait]
impl SessionStore for LocalStore {
    async fn load(&self) -> TrackerResult<Option<SessionSnapshot>> {
        Ok(None)
    }

    async fn save(&self, _snapshot: &SessionSnapshot) -> TrackerResult<()> {
        Ok(())
    }
}

/// Refuse a write whose version is not newer than the stored one.
pub fn ensure_newer(stored: u64, attempted: u64) -> TrackerResult<()> {
    if attempted <= stored {
        return Err(TrackerError::StaleWrite { attempted, stored });
    }
    Ok(())
}
