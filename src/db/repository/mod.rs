//! Repository layer: table-scoped database operations.
//!
//! Free functions over a borrowed `rusqlite::Connection`; callers own
//! the connection and any transaction around it.

mod patient;
mod user;

pub use patient::*;
pub use user::*;
