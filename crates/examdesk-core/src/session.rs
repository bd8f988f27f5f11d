//! Session context: the bearer token and cached user.
//!
//! State lives behind a [`SessionStore`] injected at startup, never in
//! globals. Keys are `token` and `user` (the user as serialized JSON).

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::model::User;

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";

/// Persistent string key-value storage for session state.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// Store that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key);
    }
}

/// Shared handle to the current session.
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn SessionStore>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

impl Session {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Session backed by a fresh in-memory store.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemorySessionStore::new()))
    }

    /// True iff a non-empty token is stored.
    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    pub fn token(&self) -> Option<String> {
        self.store.get(TOKEN_KEY).filter(|t| !t.is_empty())
    }

    /// Cached user. A corrupt entry reads as absent.
    pub fn user(&self) -> Option<User> {
        let raw = self.store.get(USER_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!("ignoring unreadable cached user: {e}");
                None
            }
        }
    }

    pub fn set_user(&self, user: &User) {
        match serde_json::to_string(user) {
            Ok(raw) => self.store.set(USER_KEY, &raw),
            Err(e) => tracing::warn!("failed to cache user: {e}"),
        }
    }

    /// Persist a freshly issued token and its user.
    pub fn establish(&self, token: &str, user: &User) {
        self.store.set(TOKEN_KEY, token);
        self.set_user(user);
    }

    /// Forget token and user. Purely local; the server is not contacted.
    pub fn clear(&self) {
        self.store.remove(TOKEN_KEY);
        self.store.remove(USER_KEY);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    pub(crate) fn sample_user(is_admin: bool) -> User {
        User {
            id: 1,
            username: "alice".into(),
            email: "alice@example.com".into(),
            is_admin,
            is_active: true,
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn empty_token_is_not_authenticated() {
        let store = Arc::new(MemorySessionStore::new());
        let session = Session::new(store.clone());
        assert!(!session.is_authenticated());
        store.set(TOKEN_KEY, "");
        assert!(!session.is_authenticated());
        store.set(TOKEN_KEY, "abc");
        assert!(session.is_authenticated());
    }

    #[test]
    fn establish_and_clear() {
        let session = Session::in_memory();
        session.establish("tok", &sample_user(false));
        assert_eq!(session.token().as_deref(), Some("tok"));
        assert_eq!(session.user().unwrap().username, "alice");

        session.clear();
        assert!(!session.is_authenticated());
        assert!(session.user().is_none());
    }

    #[test]
    fn corrupt_user_reads_as_none() {
        let store = Arc::new(MemorySessionStore::new());
        store.set(USER_KEY, "{not json");
        let session = Session::new(store);
        assert!(session.user().is_none());
    }

    #[test]
    fn clones_share_state() {
        let session = Session::in_memory();
        let other = session.clone();
        session.establish("tok", &sample_user(true));
        assert!(other.is_authenticated());
        other.clear();
        assert!(!session.is_authenticated());
    }
}
