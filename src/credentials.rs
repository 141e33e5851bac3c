//! Credential store: registration and password login over the `users` table.
//!
//! Outcomes a caller must branch on are enums, not errors. `Err` is
//! reserved for infrastructure failures (SQLite, corrupt stored hash).

use rusqlite::Connection;

use crate::crypto::PasswordHasher;
use crate::db::{self, DatabaseError};
use crate::models::{normalize_username, User};

/// Result of a registration attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterOutcome {
    Registered(User),
    AlreadyExists,
}

/// Result of a login attempt.
///
/// `UnknownUser` and `WrongPassword` are kept apart for logging; the web
/// layer shows both with the same message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Authenticated(User),
    UnknownUser,
    WrongPassword,
}

impl LoginOutcome {
    pub fn user(self) -> Option<User> {
        match self {
            Self::Authenticated(user) => Some(user),
            Self::UnknownUser | Self::WrongPassword => None,
        }
    }
}

/// Create an account. The username is lowercased before the lookup and
/// the insert.
pub fn register(
    conn: &Connection,
    hasher: &PasswordHasher,
    username: &str,
    password: &str,
) -> Result<RegisterOutcome, DatabaseError> {
    let username = normalize_username(username);

    if db::user_exists(conn, &username)? {
        tracing::info!(username, "Registration rejected: username taken");
        return Ok(RegisterOutcome::AlreadyExists);
    }

    let password_hash = hasher.hash(password);
    // The primary key still catches a concurrent registration that
    // slipped past the existence check.
    if !db::insert_user(conn, &username, &password_hash)? {
        tracing::info!(username, "Registration lost race for username");
        return Ok(RegisterOutcome::AlreadyExists);
    }

    let stored = db::find_user(conn, &username)?.ok_or_else(|| DatabaseError::NotFound {
        entity_type: "User".into(),
        id: username.clone(),
    })?;
    tracing::info!(username, "User registered");
    Ok(RegisterOutcome::Registered(stored.user))
}

/// Check a username/password pair.
pub fn authenticate(
    conn: &Connection,
    hasher: &PasswordHasher,
    username: &str,
    password: &str,
) -> Result<LoginOutcome, DatabaseError> {
    let username = normalize_username(username);

    let Some(stored) = db::find_user(conn, &username)? else {
        hasher.verify_dummy(password);
        tracing::info!(username, "Login failed: unknown user");
        return Ok(LoginOutcome::UnknownUser);
    };

    let matches = hasher
        .verify(password, &stored.password_hash)
        .map_err(|_| DatabaseError::CorruptHash(username.clone()))?;
    if !matches {
        tracing::info!(username, "Login failed: wrong password");
        return Ok(LoginOutcome::WrongPassword);
    }

    Ok(LoginOutcome::Authenticated(stored.user))
}
