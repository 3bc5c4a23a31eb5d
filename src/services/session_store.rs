use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::{debug, info};
use uuid::Uuid;

use crate::debuts::FilterSelection;

/// Everything the dashboard remembers for one user session
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionState {
    pub authenticated: bool,
    pub username: Option<String>,
    pub selection: FilterSelection,
    pub run_clicked: bool,
}

impl SessionState {
    pub fn authenticated(username: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            username: Some(username.into()),
            ..Default::default()
        }
    }

    /// Defaults for everything except identity and authentication
    pub fn cleared(self) -> Self {
        Self {
            authenticated: self.authenticated,
            username: self.username,
            ..Default::default()
        }
    }
}

/// Sessions untouched for this long are dropped
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

struct Entry {
    state: SessionState,
    last_seen: Instant,
}

/// In-memory per-session state, keyed by session id.
///
/// Every access refreshes a session's idle clock; sessions idle for longer
/// than the timeout behave as if they were never created.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<Uuid, Entry>>>,
    idle_timeout: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_idle_timeout(DEFAULT_IDLE_TIMEOUT)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            idle_timeout,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, Entry>> {
        // A panicked writer leaves plain data behind; keep serving it
        self.sessions.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Live entry for `id` with its idle clock reset; expired entries are removed
    fn live<'a>(
        &self,
        sessions: &'a mut HashMap<Uuid, Entry>,
        id: &Uuid,
    ) -> Option<&'a mut Entry> {
        let expired = sessions
            .get(id)
            .is_some_and(|entry| entry.last_seen.elapsed() > self.idle_timeout);
        if expired {
            sessions.remove(id);
            debug!("Session {} expired", id);
            return None;
        }
        let entry = sessions.get_mut(id)?;
        entry.last_seen = Instant::now();
        Some(entry)
    }

    pub fn create(&self, state: SessionState) -> Uuid {
        let id = Uuid::new_v4();
        let mut sessions = self.lock();
        self.prune(&mut sessions);
        sessions.insert(
            id,
            Entry {
                state,
                last_seen: Instant::now(),
            },
        );
        debug!("Created session {}", id);
        id
    }

    pub fn get(&self, id: &Uuid) -> Option<SessionState> {
        let mut sessions = self.lock();
        self.live(&mut sessions, id).map(|entry| entry.state.clone())
    }

    /// Replace the state of an existing session. Unknown ids are ignored.
    pub fn set(&self, id: &Uuid, state: SessionState) -> bool {
        self.update(id, |_| (state, ())).is_some()
    }

    /// Read-modify-write one session under the store lock, so overlapping
    /// requests on the same session cannot lose each other's changes.
    pub fn update<R>(
        &self,
        id: &Uuid,
        f: impl FnOnce(SessionState) -> (SessionState, R),
    ) -> Option<R> {
        let mut sessions = self.lock();
        let entry = self.live(&mut sessions, id)?;
        let (next, result) = f(std::mem::take(&mut entry.state));
        entry.state = next;
        Some(result)
    }

    /// Reset a session to defaults, keeping only identity/auth state
    pub fn clear(&self, id: &Uuid) -> Option<SessionState> {
        self.update(id, |state| {
            let cleared = state.cleared();
            (cleared.clone(), cleared)
        })
    }

    pub fn remove(&self, id: &Uuid) -> Option<SessionState> {
        self.lock().remove(id).map(|entry| entry.state)
    }

    /// Drop every expired session, returning how many went
    pub fn prune_expired(&self) -> usize {
        let mut sessions = self.lock();
        self.prune(&mut sessions)
    }

    fn prune(&self, sessions: &mut HashMap<Uuid, Entry>) -> usize {
        let before = sessions.len();
        sessions.retain(|_, entry| entry.last_seen.elapsed() <= self.idle_timeout);
        let removed = before - sessions.len();
        if removed > 0 {
            info!("Expired {} idle sessions", removed);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
