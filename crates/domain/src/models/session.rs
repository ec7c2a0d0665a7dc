//! Session context: bearer token plus the cached user profile.
//!
//! The session is loaded from and saved to a [`KeyValueStore`] explicitly and
//! then passed by reference to everything that talks to the remote API.

use std::collections::HashMap;
use std::sync::Mutex;

use thiserror::Error;

use super::user::{Role, UserProfile};

const TOKEN_KEY: &str = "token";
const CURRENT_USER_KEY: &str = "currentUser";

/// Errors from a key-value store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store is corrupt: {0}")]
    Corrupt(String),

    #[error("Store lock poisoned")]
    Poisoned,
}

/// Errors while loading or saving a session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Cached user profile is unreadable: {0}")]
    Profile(#[from] serde_json::Error),
}

/// Minimal string key-value storage with get/set/remove semantics.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// In-memory store, useful for tests and one-shot sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

/// The authenticated (or anonymous) session of the current operator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    token: Option<String>,
    user: Option<UserProfile>,
}

impl Session {
    /// An anonymous session.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(token: impl Into<String>, user: UserProfile) -> Self {
        Self {
            token: Some(token.into()),
            user: Some(user),
        }
    }

    /// Reads the session from the store. Missing keys yield an anonymous session.
    pub fn load(store: &dyn KeyValueStore) -> Result<Self, SessionError> {
        let token = store.get(TOKEN_KEY)?;
        let user = match store.get(CURRENT_USER_KEY)? {
            Some(raw) => Some(serde_json::from_str(&raw)?),
            None => None,
        };
        Ok(Self { token, user })
    }

    /// Writes the session to the store, removing keys that are unset.
    pub fn save(&self, store: &dyn KeyValueStore) -> Result<(), SessionError> {
        match &self.token {
            Some(token) => store.set(TOKEN_KEY, token)?,
            None => store.remove(TOKEN_KEY)?,
        }
        match &self.user {
            Some(user) => store.set(CURRENT_USER_KEY, &serde_json::to_string(user)?)?,
            None => store.remove(CURRENT_USER_KEY)?,
        }
        Ok(())
    }

    /// Removes the session from the store and resets this value.
    pub fn clear(&mut self, store: &dyn KeyValueStore) -> Result<(), SessionError> {
        store.remove(TOKEN_KEY)?;
        store.remove(CURRENT_USER_KEY)?;
        self.token = None;
        self.user = None;
        Ok(())
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    pub fn role(&self) -> Option<&Role> {
        self.user.as_ref().and_then(UserProfile::role)
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.role().is_some_and(Role::is_admin)
    }
}
