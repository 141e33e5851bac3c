use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::User;

/// A user row including the stored password hash.
#[derive(Debug, Clone)]
pub struct StoredUser {
    pub user: User,
    pub password_hash: String,
}

/// Insert a user. Returns `false` when the username is already taken.
pub fn insert_user(
    conn: &Connection,
    username: &str,
    password_hash: &str,
) -> Result<bool, DatabaseError> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO users (username, password_hash) VALUES (?1, ?2)",
        params![username, password_hash],
    )?;
    Ok(inserted == 1)
}

pub fn find_user(conn: &Connection, username: &str) -> Result<Option<StoredUser>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT username, password_hash, created_at FROM users WHERE username = ?1",
            params![username],
            |row| {
                Ok(StoredUser {
                    user: User {
                        username: row.get(0)?,
                        created_at: row.get(2)?,
                    },
                    password_hash: row.get(1)?,
                })
            },
        )
        .optional()?;
    Ok(row)
}

pub fn user_exists(conn: &Connection, username: &str) -> Result<bool, DatabaseError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM users WHERE username = ?1",
        params![username],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn count_users(conn: &Connection) -> Result<u32, DatabaseError> {
    let count: u32 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
    Ok(count)
}
