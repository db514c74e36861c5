use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::models::{Role, User};

/// A logged-in user as remembered by the session store
#[derive(Debug, Clone, Serialize)]
pub struct AuthenticatedUser {
    /// The account the session belongs to
    pub user: User,

    /// The basket assigned at login
    pub bid: i32,

    /// When the session stops being valid
    #[serde(skip)]
    pub expires_at: DateTime<Utc>,
}

impl AuthenticatedUser {
    pub fn is_deluxe(&self) -> bool {
        self.user.get_role() == Role::Deluxe
    }
}

/// In-memory map from issued token to the session it opened
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, AuthenticatedUser>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, AuthenticatedUser>> {
        // The map stays consistent even if a holder panicked
        self.sessions.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Remembers a session under its token
    pub fn put(&self, token: String, user: AuthenticatedUser) {
        self.lock().insert(token, user);
    }

    /// Looks a token up, dropping it if its session has expired
    pub fn get(&self, token: &str) -> Option<AuthenticatedUser> {
        self.get_at(token, Utc::now())
    }

    pub fn get_at(&self, token: &str, now: DateTime<Utc>) -> Option<AuthenticatedUser> {
        let mut sessions = self.lock();
        match sessions.get(token) {
            Some(session) if session.expires_at > now => Some(session.clone()),
            Some(_) => {
                sessions.remove(token);
                None
            }
            None => None,
        }
    }

    /// Forgets a session, returning it if it existed
    pub fn remove(&self, token: &str) -> Option<AuthenticatedUser> {
        self.lock().remove(token)
    }

    /// Drops every expired session and returns how many were removed
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Utc::now())
    }

    pub fn purge_expired_at(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|_, session| session.expires_at > now);
        before - sessions.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
