//! Room storage kept as one JSON file per room in a shared directory.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use sk_combat::sync::ensure_newer;
use sk_combat::{AuthToken, RoomBackend, RoomCode, RoomStatePatch, SessionSnapshot, TrackerError, TrackerResult};

/// Stores each room as `<dir>/<CODE>.json`.
///
/// The read-check-write in `update_room_state` is not locked across
/// processes, so two writers landing in the same instant can still race.
#[derive(Debug, Clone)]
pub struct FileRoomBackend {
    dir: PathBuf,
}

impl FileRoomBackend {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    fn room_path(&self, room: &RoomCode) -> PathBuf {
        self.dir.join(format!("{room}.json"))
    }

    async fn read(&self, room: &RoomCode) -> TrackerResult<Option<SessionSnapshot>> {
        match fs::read_to_string(self.room_path(room)).await {
            Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(TrackerError::Backend(e.to_string())),
        }
    }
}

#[async_trait]
impl RoomBackend for FileRoomBackend {
    async fn fetch_room_state(
        &self,
        _token: &AuthToken,
        room: &RoomCode,
    ) -> TrackerResult<Option<SessionSnapshot>> {
        self.read(room).await
    }

    async fn update_room_state(
        &self,
        _token: &AuthToken,
        room: &RoomCode,
        patch: RoomStatePatch,
    ) -> TrackerResult<()> {
        let mut stored = self.read(room).await?.unwrap_or_default();
        ensure_newer(stored.version, patch.version)?;
        patch.apply_to(&mut stored);

        let json = serde_json::to_string_pretty(&stored)?;
        let path = self.room_path(room);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .await
            .map_err(|e| TrackerError::Backend(e.to_string()))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| TrackerError::Backend(e.to_string()))?;
        debug!(%room, version = stored.version, path = %path.display(), "room file written");
        Ok(())
    }
}
