//! In-process room backend, shared by cloning.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{TrackerError, TrackerResult};

use super::room::{AuthToken, RoomBackend, RoomCode, RoomStatePatch};
use super::{SessionSnapshot, ensure_newer};

/// Room storage held in memory. Clones share the same rooms.
///
/// Can be switched offline to make every call fail, which is how tests
/// exercise lost connectivity.
#[derive(Debug, Clone, Default)]
pub struct MemoryRoomBackend {
    rooms: Arc<Mutex<HashMap<RoomCode, SessionSnapshot>>>,
    offline: Arc<AtomicBool>,
}

impl MemoryRoomBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail (`true`) or succeed again (`false`).
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// The stored snapshot of a room, bypassing the offline switch.
    pub fn snapshot(&self, room: &RoomCode) -> Option<SessionSnapshot> {
        self.rooms.lock().ok()?.get(room).cloned()
    }

    fn check_online(&self) -> TrackerResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(TrackerError::Backend("backend offline".to_string()));
        }
        Ok(())
    }

    fn lock(
        &self,
    ) -> TrackerResult<std::sync::MutexGuard<'_, HashMap<RoomCode, SessionSnapshot>>> {
        self.rooms
            .lock()
            .map_err(|_| TrackerError::Backend("room lock poisoned".to_string()))
    }
}

#[async_trait]
impl RoomBackend for MemoryRoomBackend {
    async fn fetch_room_state(
        &self,
        _token: &AuthToken,
        room: &RoomCode,
    ) -> TrackerResult<Option<SessionSnapshot>> {
        self.check_online()?;
        Ok(self.lock()?.get(room).cloned())
    }

    async fn update_room_state(
        &self,
        _token: &AuthToken,
        room: &RoomCode,
        patch: RoomStatePatch,
    ) -> TrackerResult<()> {
        self.check_online()?;
        let mut rooms = self.lock()?;
        let stored_version = rooms.get(room).map_or(0, |s| s.version);
        ensure_newer(stored_version, patch.version)?;
        patch.apply_to(rooms.entry(room.clone()).or_default());
        Ok(())
    }
}
