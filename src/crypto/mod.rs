pub mod keys;
pub mod tokens;

pub use keys::*;
pub use tokens::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Stored password hash is malformed")]
    MalformedHash,

    #[error("Signing key rejected: {0}")]
    InvalidKey(String),
}
