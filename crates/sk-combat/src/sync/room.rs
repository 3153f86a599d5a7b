//! Shared rooms: room codes, credentials, and the storage backend contract.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::combatant::Combatant;
use crate::error::{TrackerError, TrackerResult};

use super::{SessionSnapshot, SessionStore};

const MAX_ROOM_CODE_LEN: usize = 16;

/// Identifier of a shared room: 1-16 ASCII letters or digits, upper-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    /// Validate and normalise a room code.
    pub fn parse(code: &str) -> TrackerResult<Self> {
        let trimmed = code.trim();
        let valid = !trimmed.is_empty()
            && trimmed.len() <= MAX_ROOM_CODE_LEN
            && trimmed.chars().all(|c| c.is_ascii_alphanumeric());
        if !valid {
            return Err(TrackerError::InvalidRoomCode(code.to_string()));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    /// The normalised code.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RoomCode {
    type Error = TrackerError;

    fn try_from(value: String) -> TrackerResult<Self> {
        Self::parse(&value)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque bearer credential, passed through to the backend untouched.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    /// Wrap a raw token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for backends to put on the wire.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(***)")
    }
}

/// Hands out the current bearer token on demand.
pub trait AuthProvider: Send + Sync {
    /// The current token, or `None` if signed out.
    fn bearer_token(&self) -> Option<AuthToken>;
}

/// An auth provider with one fixed token.
#[derive(Debug, Clone)]
pub struct StaticToken(pub AuthToken);

impl AuthProvider for StaticToken {
    fn bearer_token(&self) -> Option<AuthToken> {
        Some(self.0.clone())
    }
}

/// A partial update to a room's stored state.
///
/// The version is mandatory and must be newer than the stored one.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomStatePatch {
    /// Version of the state after this patch.
    pub version: u64,
    /// Replacement roster.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub combatants: Option<Vec<Combatant>>,
    /// Replacement turn index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_turn_index: Option<usize>,
    /// Replacement started flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started: Option<bool>,
    /// Replacement round.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round: Option<u32>,
}

impl RoomStatePatch {
    /// A patch replacing every field with the snapshot's.
    pub fn full(snapshot: &SessionSnapshot) -> Self {
        Self {
            version: snapshot.version,
            combatants: Some(snapshot.state.combatants.clone()),
            current_turn_index: Some(snapshot.state.current_turn_index),
            started: Some(snapshot.state.started),
            round: Some(snapshot.state.round),
        }
    }

    /// Merge this patch into a stored snapshot. Does not check the version.
    pub fn apply_to(self, snapshot: &mut SessionSnapshot) {
        snapshot.version = self.version;
        if let Some(combatants) = self.combatants {
            snapshot.state.combatants = combatants;
        }
        if let Some(index) = self.current_turn_index {
            snapshot.state.current_turn_index = index;
        }
        if let Some(started) = self.started {
            snapshot.state.started = started;
        }
        if let Some(round) = self.round {
            snapshot.state.round = round;
        }
    }
}

/// Hosted storage holding the state of each room.
#[async_trait]
pub trait RoomBackend: Send + Sync {
    /// Fetch a room's state, or `None` if the room has none yet.
    async fn fetch_room_state(
        &self,
        token: &AuthToken,
        room: &RoomCode,
    ) -> TrackerResult<Option<SessionSnapshot>>;

    /// Apply a patch to a room's state.
    ///
    /// Must fail with [`TrackerError::StaleWrite`] if the patch version is
    /// not newer than the stored one.
    async fn update_room_state(
        &self,
        token: &AuthToken,
        room: &RoomCode,
        patch: RoomStatePatch,
    ) -> TrackerResult<()>;
}

/// A [`SessionStore`] for one room of a [`RoomBackend`].
#[derive(Debug, Clone)]
pub struct RoomStore<B, A> {
    backend: B,
    auth: A,
    room: RoomCode,
}

impl<B: RoomBackend, A: AuthProvider> RoomStore<B, A> {
    /// Bind a backend and credentials to a room.
    pub fn new(backend: B, auth: A, room: RoomCode) -> Self {
        Self {
            backend,
            auth,
            room,
        }
    }

    /// The room this store reads and writes.
    pub fn room(&self) -> &RoomCode {
        &self.room
    }

    fn token(&self) -> TrackerResult<AuthToken> {
        self.auth
            .bearer_token()
            .ok_or(TrackerError::MissingCredentials)
    }
}

#[async_trait]
impl<B: RoomBackend, A: AuthProvider> SessionStore for RoomStore<B, A> {
    async fn load(&self) -> TrackerResult<Option<SessionSnapshot>> {
        let token = self.token()?;
        self.backend.fetch_room_state(&token, &self.room).await
    }

    async fn save(&self, snapshot: &SessionSnapshot) -> TrackerResult<()> {
        let token = self.token()?;
        debug!(room = %self.room, version = snapshot.version, "saving room state");
        self.backend
            .update_room_state(&token, &self.room, RoomStatePatch::full(snapshot))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combatant::NewCombatant;
    use crate::sync::MemoryRoomBackend;

    struct SignedOut;

    impl AuthProvider for SignedOut {
        fn bearer_token(&self) -> Option<AuthToken> {
            None
        }
    }

    #[test]
    fn room_code_normalises() {
        let code = RoomCode::parse(" ab12c ").unwrap();
        assert_eq!(code.as_str(), "AB12C");
        assert_eq!(code.to_string(), "AB12C");
    }

    #[test]
    fn room_code_rejects_bad_input() {
        assert!(RoomCode::parse("").is_err());
        assert!(RoomCode::parse("has space").is_err());
        assert!(RoomCode::parse("dash-ed").is_err());
        assert!(RoomCode::parse(&"A".repeat(17)).is_err());
        assert!(RoomCode::parse(&"A".repeat(16)).is_ok());
    }

    #[test]
    fn room_code_serde_validates() {
        let code: RoomCode = serde_json::from_str(r#""xyz""#).unwrap();
        assert_eq!(code.as_str(), "XYZ");
        assert!(serde_json::from_str::<RoomCode>(r#""x y""#).is_err());
    }

    #[test]
    fn token_debug_is_redacted() {
        let token = AuthToken::new("secret-value");
        assert_eq!(format!("{token:?}"), "AuthToken(***)");
        assert_eq!(token.expose(), "secret-value");
    }

    #[test]
    fn patch_merges_only_present_fields() {
        let mut snapshot = SessionSnapshot::default();
        snapshot.state.round = 4;
        RoomStatePatch {
            version: 2,
            started: Some(true),
            ..RoomStatePatch::default()
        }
        .apply_to(&mut snapshot);
        assert_eq!(snapshot.version, 2);
        assert!(snapshot.state.started);
        assert_eq!(snapshot.state.round, 4);
    }

    #[test]
    fn patch_skips_absent_fields_on_the_wire() {
        let patch = RoomStatePatch {
            version: 7,
            round: Some(2),
            ..RoomStatePatch::default()
        };
        let json = serde_json::to_string(&patch).unwrap();
        assert_eq!(json, r#"{"version":7,"round":2}"#);
    }

    #[tokio::test]
    async fn room_store_round_trip() {
        let backend = MemoryRoomBackend::new();
        let room = RoomCode::parse("TAVERN").unwrap();
        let store = RoomStore::new(
            backend.clone(),
            StaticToken(AuthToken::new("t")),
            room.clone(),
        );
        assert!(store.load().await.unwrap().is_none());

        let mut snapshot = SessionSnapshot {
            version: 1,
            ..SessionSnapshot::default()
        };
        snapshot
            .state
            .combatants
            .push(Combatant::new(NewCombatant::named("Bob")));
        store.save(&snapshot).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded, snapshot);
        assert!(matches!(
            store.save(&snapshot).await,
            Err(TrackerError::StaleWrite { .. })
        ));
    }

    #[tokio::test]
    async fn missing_credentials() {
        let store = RoomStore::new(
            MemoryRoomBackend::new(),
            SignedOut,
            RoomCode::parse("X").unwrap(),
        );
        assert!(matches!(
            store.load().await,
            Err(TrackerError::MissingCredentials)
        ));
    }
}
