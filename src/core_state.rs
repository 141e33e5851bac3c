//! Application context shared by every request handler.
//!
//! `CoreState` is built once at startup from a `Config` and wrapped in
//! `Arc`. It owns the database location, the session store, the cookie
//! signer and the password hasher. Uses `RwLock` for the session store
//! so page renders (reads) only contend with login/logout (writes).

use std::path::PathBuf;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::Config;
use crate::crypto::{generate_token, CookieSigner, CryptoError, PasswordHasher};
use crate::db;
use crate::session::SessionStore;

pub struct CoreState {
    db_path: PathBuf,
    sessions: RwLock<SessionStore>,
    signer: CookieSigner,
    hasher: PasswordHasher,
}

impl CoreState {
    /// Create the state, the database directory, and the schema.
    pub fn new(config: &Config) -> Result<Self, CoreError> {
        std::fs::create_dir_all(&config.database_dir)?;
        let db_path = config.database_path();

        let secret = match &config.secret_key {
            Some(secret) => secret.clone(),
            None => {
                tracing::warn!("SECRET_KEY not set, using a random per-process signing key");
                generate_token()
            }
        };
        let signer = CookieSigner::new(secret.as_bytes())?;

        // Run migrations up front so schema errors surface at startup.
        db::open_database(&db_path)?;
        tracing::info!(path = %db_path.display(), "Database ready");

        Ok(Self {
            db_path,
            sessions: RwLock::new(SessionStore::new()),
            signer,
            hasher: PasswordHasher::new(config.pbkdf2_iterations),
        })
    }

    // ── Database ────────────────────────────────────────────

    /// Open a database connection for one request.
    pub fn open_db(&self) -> Result<rusqlite::Connection, CoreError> {
        db::open_database(&self.db_path).map_err(CoreError::Database)
    }

    // ── Sessions ────────────────────────────────────────────

    pub fn read_sessions(&self) -> Result<RwLockReadGuard<'_, SessionStore>, CoreError> {
        self.sessions.read().map_err(|_| CoreError::LockPoisoned)
    }

    pub fn write_sessions(&self) -> Result<RwLockWriteGuard<'_, SessionStore>, CoreError> {
        self.sessions.write().map_err(|_| CoreError::LockPoisoned)
    }

    /// Username bound to a session token.
    pub fn session_user(&self, token: &str) -> Result<Option<String>, CoreError> {
        Ok(self.read_sessions()?.current(token).map(str::to_string))
    }

    pub fn start_session(&self, username: &str) -> Result<String, CoreError> {
        Ok(self.write_sessions()?.start(username))
    }

    pub fn end_session(&self, token: &str) -> Result<bool, CoreError> {
        Ok(self.write_sessions()?.end(token))
    }

    // ── Crypto ──────────────────────────────────────────────

    pub fn signer(&self) -> &CookieSigner {
        &self.signer
    }

    pub fn hasher(&self) -> &PasswordHasher {
        &self.hasher
    }
}

// ═══════════════════════════════════════════════════════════
// Error types
// ═══════════════════════════════════════════════════════════

/// Errors from CoreState operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Internal lock error")]
    LockPoisoned,
    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),
}
