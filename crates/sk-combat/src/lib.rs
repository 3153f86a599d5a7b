//! Combat tracker engine for Skirmish.
//!
//! Keeps an initiative-ordered roster of combatants, advances turns and
//! rounds, applies damage and healing, and runs the death-save countdown for
//! anyone knocked to zero health. The same engine backs a purely local
//! session and a shared room session that is synchronised through a
//! pluggable [`SessionStore`].

pub mod combatant;
pub mod config;
pub mod error;
pub mod session;
pub mod sync;
pub mod turn_order;

pub use combatant::{
    CharacterRecord, Combatant, CombatantId, CombatantStatus, DEATH_SAVES, NewCombatant,
    roll_initiative,
};
pub use config::TrackerConfig;
pub use error::{TrackerError, TrackerResult};
pub use session::{
    CombatEvent, CombatLog, CombatPhase, CombatSession, CombatSummary, CombatantPatch, EventKind,
    SharedState, TurnOutcome,
};
pub use sync::{
    AuthProvider, AuthToken, LocalStore, MemoryRoomBackend, PollOutcome, RoomBackend, RoomCode,
    RoomStatePatch, RoomStore, SessionSnapshot, SessionStore, StaticToken, SyncedTracker,
    spawn_poller,
};
