use chrono::NaiveDateTime;
use serde::Serialize;

/// A staff account. The password hash never leaves the credential store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub username: String,
    pub created_at: NaiveDateTime,
}

/// Username form used for storage and lookup.
pub fn normalize_username(raw: &str) -> String {
    raw.trim().to_lowercase()
}
