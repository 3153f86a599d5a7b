//! A combat session bound to a store, with optimistic saves and polling.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, warn};

use crate::error::TrackerError;
use crate::session::CombatSession;

use super::{SessionSnapshot, SessionStore};

/// What a poll did to the local state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Remote and local already agreed.
    Unchanged,
    /// The remote state replaced the local one.
    Updated,
    /// Local changes the store had not seen were sent again.
    Resent,
    /// Unsaved local changes lost to a newer remote state, which replaced them.
    Conflict,
    /// The store could not be reached. Local state is untouched.
    Failed,
}

/// A [`CombatSession`] whose changes are saved to a [`SessionStore`].
///
/// Changes apply locally first and are never rolled back if the save
/// fails. Polling reconciles with the store by version: a remote at least
/// as new as the local state wins, and a remote that is behind gets the
/// local state pushed again. Local changes that never reached the store
/// and are then overtaken by a remote state are dropped with a warning.
pub struct SyncedTracker<S> {
    session: CombatSession,
    store: S,
    version: u64,
    unsent: bool,
}

impl<S: SessionStore> SyncedTracker<S> {
    /// Bind a session to a store without contacting it.
    pub fn new(session: CombatSession, store: S) -> Self {
        Self {
            session,
            store,
            version: 0,
            unsent: false,
        }
    }

    /// Bind a session to a store and pull whatever the store already holds.
    pub async fn connect(session: CombatSession, store: S) -> Self {
        let mut tracker = Self::new(session, store);
        tracker.poll().await;
        tracker
    }

    /// The local session.
    pub fn session(&self) -> &CombatSession {
        &self.session
    }

    /// The store this tracker saves to.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Version of the local shared state.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Whether the last save of the local shared state failed.
    pub fn has_unsent_changes(&self) -> bool {
        self.unsent
    }

    /// The local shared state at its current version.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            version: self.version,
            state: self.session.shared_state().clone(),
        }
    }

    /// Apply an operation to the session and save if the shared state changed.
    ///
    /// Presentation-only changes (the report flag, the log) are not saved.
    /// A failed save is logged and the local change kept.
    pub async fn mutate<R>(&mut self, op: impl FnOnce(&mut CombatSession) -> R) -> R {
        let before = self.session.shared_state().clone();
        let result = op(&mut self.session);
        if *self.session.shared_state() != before {
            self.version += 1;
            self.push().await;
        }
        result
    }

    /// Reconcile with the store once.
    pub async fn poll(&mut self) -> PollOutcome {
        match self.store.load().await {
            Ok(Some(remote)) if remote.version >= self.version => {
                if self.unsent && remote.state != *self.session.shared_state() {
                    warn!(
                        local = self.version,
                        remote = remote.version,
                        "unsaved local changes overtaken by the room, taking the stored state"
                    );
                    self.unsent = false;
                    self.adopt(remote);
                    return PollOutcome::Conflict;
                }
                self.unsent = false;
                self.adopt(remote)
            }
            Ok(Some(remote)) => {
                debug!(
                    local = self.version,
                    remote = remote.version,
                    "store is behind, resending"
                );
                self.push().await;
                PollOutcome::Resent
            }
            Ok(None) if self.version > 0 => {
                self.push().await;
                PollOutcome::Resent
            }
            Ok(None) => PollOutcome::Unchanged,
            Err(e) => {
                warn!(error = %e, "failed to fetch shared state");
                PollOutcome::Failed
            }
        }
    }

    async fn push(&mut self) {
        let snapshot = self.snapshot();
        match self.store.save(&snapshot).await {
            Ok(()) => {
                self.unsent = false;
                debug!(version = snapshot.version, "shared state saved");
            }
            Err(TrackerError::StaleWrite { attempted, stored }) => {
                self.unsent = false;
                warn!(attempted, stored, "write rejected as stale, taking the stored state");
                match self.store.load().await {
                    Ok(Some(remote)) => {
                        self.adopt(remote);
                    }
                    Ok(None) => {}
                    Err(e) => warn!(error = %e, "failed to re-fetch shared state"),
                }
            }
            Err(e) => {
                self.unsent = true;
                warn!(error = %e, version = snapshot.version, "failed to save shared state");
            }
        }
    }

    fn adopt(&mut self, remote: SessionSnapshot) -> PollOutcome {
        let changed =
            remote.version != self.version || remote.state != *self.session.shared_state();
        self.version = remote.version;
        if changed {
            debug!(version = remote.version, "adopted shared state");
            self.session.replace_shared_state(remote.state);
            PollOutcome::Updated
        } else {
            PollOutcome::Unchanged
        }
    }
}

/// Poll a shared tracker on a fixed interval until the handle is aborted.
///
/// Failed polls are logged and polling carries on.
pub fn spawn_poller<S>(tracker: Arc<Mutex<SyncedTracker<S>>>, interval: Duration) -> JoinHandle<()>
where
    S: SessionStore + 'static,
{
    tokio::spawn(async move {
        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let outcome = tracker.lock().await.poll().await;
            if outcome != PollOutcome::Unchanged {
                debug!(?outcome, "room poll");
            }
        }
    })
}
