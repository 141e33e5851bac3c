//! Server-side login sessions.
//!
//! A session binds one random token to one username. Only the SHA-256
//! hash of each token is kept, so a dump of the store cannot be replayed
//! as cookies. Sessions live until logout or process exit: there is no
//! expiry, refresh, or cross-device invalidation.
//!
//! State machine per browser: Anonymous → (register | login) →
//! Authenticated → (logout) → Anonymous.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::crypto::{generate_token, hash_token};

#[derive(Debug, Clone)]
struct SessionEntry {
    username: String,
    started_at: DateTime<Utc>,
}

/// All live sessions, keyed by token hash.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<[u8; 32], SessionEntry>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a fresh token to `username` and return the raw token.
    pub fn start(&mut self, username: &str) -> String {
        let token = generate_token();
        self.sessions.insert(
            hash_token(&token),
            SessionEntry {
                username: username.to_string(),
                started_at: Utc::now(),
            },
        );
        tracing::debug!(username, "Session started");
        token
    }

    /// The username bound to `token`, if any.
    pub fn current(&self, token: &str) -> Option<&str> {
        self.sessions
            .get(&hash_token(token))
            .map(|entry| entry.username.as_str())
    }

    /// Clear the binding. Returns `false` if the token was not live.
    pub fn end(&mut self, token: &str) -> bool {
        match self.sessions.remove(&hash_token(token)) {
            Some(entry) => {
                let minutes = (Utc::now() - entry.started_at).num_minutes();
                tracing::debug!(username = %entry.username, minutes, "Session ended");
                true
            }
            None => false,
        }
    }
}
