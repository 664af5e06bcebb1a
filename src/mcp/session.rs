//! Per-session protocol state.
//!
//! A session only remembers whether the client has sent `initialize`. The
//! store is owned by the server instance and handed to it at construction,
//! so tests can build as many independent servers as they like.
//!
//! Sessions are never removed unless an idle timeout is configured, in which
//! case [`SessionStore::evict_idle`] drops the ones nobody has touched for
//! that long. Under [`EvictionPolicy::Never`] the store grows with every
//! distinct client-supplied identifier; calls without one do not persist.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use indexmap::IndexSet;

/// Prefix of every generated session identifier.
pub const SESSION_ID_PREFIX: &str = "session-";

/// Generates a fresh opaque session identifier.
#[must_use]
pub fn new_session_id() -> String {
    format!("{SESSION_ID_PREFIX}{}", uuid::Uuid::new_v4())
}

/// When sessions are dropped from the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EvictionPolicy {
    /// Keep sessions for the lifetime of the server.
    #[default]
    Never,
    /// Drop sessions that have been idle for longer than the given duration.
    Idle(Duration),
}

/// Protocol state for one client.
#[derive(Debug, Clone)]
pub struct Session {
    /// Whether `initialize` has been received.
    pub initialized: bool,
    /// Tools advertised to this session.
    pub tools: IndexSet<String>,
    /// When the session was created.
    pub created_at: Instant,
    /// Last time a message referenced the session.
    pub last_seen: Instant,
}

impl Session {
    fn new(now: Instant) -> Self {
        Self {
            initialized: false,
            tools: IndexSet::new(),
            created_at: now,
            last_seen: now,
        }
    }
}

/// Thread-safe map of session identifier to [`Session`].
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Session>>,
    policy: EvictionPolicy,
}

impl SessionStore {
    /// Creates an empty store with the given eviction policy.
    #[must_use]
    pub fn new(policy: EvictionPolicy) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            policy,
        }
    }

    /// Returns the eviction policy.
    #[must_use]
    pub const fn policy(&self) -> EvictionPolicy {
        self.policy
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Session>> {
        // Entries are plain values, so a poisoned map is still consistent
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Creates a new, uninitialised session and returns its identifier.
    #[must_use]
    pub fn open(&self) -> String {
        let id = new_session_id();
        self.lock().insert(id.clone(), Session::new(Instant::now()));
        tracing::debug!(session_id = %id, "Opened session");
        id
    }

    /// Refreshes `id`'s last-seen time, creating the session if it is unknown.
    pub fn touch(&self, id: &str) {
        let now = Instant::now();
        self.lock()
            .entry(id.to_string())
            .and_modify(|s| s.last_seen = now)
            .or_insert_with(|| {
                tracing::debug!(session_id = %id, "Created session on first message");
                Session::new(now)
            });
    }

    /// Marks `id` as initialised, creating it if needed.
    pub fn mark_initialized(&self, id: &str) {
        let now = Instant::now();
        let mut sessions = self.lock();
        let session = sessions
            .entry(id.to_string())
            .or_insert_with(|| Session::new(now));
        session.initialized = true;
        session.last_seen = now;
    }

    /// Records that `tools` were advertised to `id`.
    pub fn register_tools<'a>(&self, id: &str, tools: impl IntoIterator<Item = &'a str>) {
        if let Some(session) = self.lock().get_mut(id) {
            session.tools.extend(tools.into_iter().map(str::to_string));
        }
    }

    /// Drops `id` from the store, returning whether it existed.
    pub fn remove(&self, id: &str) -> bool {
        self.lock().remove(id).is_some()
    }

    /// Returns a snapshot of the session.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Session> {
        self.lock().get(id).cloned()
    }

    /// Returns `true` if the session exists and has been initialised.
    #[must_use]
    pub fn is_initialized(&self, id: &str) -> bool {
        self.lock().get(id).is_some_and(|s| s.initialized)
    }

    /// Number of live sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if there are no sessions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drops sessions idle for longer than the policy allows.
    ///
    /// Returns how many were removed. Does nothing under
    /// [`EvictionPolicy::Never`].
    pub fn evict_idle(&self, now: Instant) -> usize {
        let EvictionPolicy::Idle(max_idle) = self.policy else {
            return 0;
        };

        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|id, s| {
            let keep = now.saturating_duration_since(s.last_seen) <= max_idle;
            if !keep {
                tracing::debug!(
                    session_id = %id,
                    age_secs = now.saturating_duration_since(s.created_at).as_secs(),
                    initialized = s.initialized,
                    "Evicting idle session"
                );
            }
            keep
        });
        let removed = before - sessions.len();

        if removed > 0 {
            tracing::info!(removed, remaining = sessions.len(), "Evicted idle sessions");
        }
        removed
    }
}
