//! Explicit session state keyed by opaque tokens.
//!
//! # Responsibility
//! - Hold per-visitor state that request handlers pass around explicitly.
//!
//! # Invariants
//! - Tokens are random UUIDs and never reused.
//! - A session lives from `create` until `clear` or until the store drops.
//!   There is no expiry.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Opaque session handle handed to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionToken(Uuid);

impl SessionToken {
    pub fn parse(value: &str) -> Option<Self> {
        Uuid::parse_str(value.trim()).ok().map(Self)
    }
}

impl Display for SessionToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// State carried by one session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    /// Display name shown after sign-in (the submitted email).
    pub name: Option<String>,
}

/// Thread-safe in-process session registry.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<SessionToken, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts an empty session and returns its token.
    pub fn create(&self) -> SessionToken {
        let token = SessionToken(Uuid::new_v4());
        self.sessions.lock().insert(token, Session::default());
        token
    }

    /// Returns a snapshot of the session, or `None` for unknown tokens.
    pub fn read(&self, token: SessionToken) -> Option<Session> {
        self.sessions.lock().get(&token).cloned()
    }

    /// Records the signed-in display name. Returns `false` for unknown tokens.
    pub fn sign_in(&self, token: SessionToken, name: impl Into<String>) -> bool {
        match self.sessions.lock().get_mut(&token) {
            Some(session) => {
                session.name = Some(name.into());
                true
            }
            None => false,
        }
    }

    /// Drops the session entirely. Returns whether it existed.
    pub fn clear(&self, token: SessionToken) -> bool {
        self.sessions.lock().remove(&token).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
