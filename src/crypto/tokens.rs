//! Random session tokens and HMAC-signed cookie values.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use super::CryptoError;

type HmacSha256 = Hmac<Sha256>;

/// SHA-256 of a session token, the form kept in the session store.
pub fn hash_token(token: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().into()
}

/// Generate a random token (URL-safe base64, 32 bytes of entropy).
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::random();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Signs cookie values as `<value>.<mac>` and checks them on the way back.
///
/// `value` must not contain `.`; every value this crate signs is
/// URL-safe base64, which never does.
#[derive(Clone)]
pub struct CookieSigner {
    keyed: HmacSha256,
}

impl CookieSigner {
    pub fn new(secret: &[u8]) -> Result<Self, CryptoError> {
        if secret.is_empty() {
            return Err(CryptoError::InvalidKey("secret must not be empty".into()));
        }
        let keyed = <HmacSha256 as Mac>::new_from_slice(secret)
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        Ok(Self { keyed })
    }

    fn mac(&self) -> HmacSha256 {
        self.keyed.clone()
    }

    pub fn sign(&self, value: &str) -> String {
        let mut mac = self.mac();
        mac.update(value.as_bytes());
        let tag = mac.finalize().into_bytes();
        format!("{value}.{}", URL_SAFE_NO_PAD.encode(tag))
    }

    /// Return the original value if the signature matches.
    pub fn verify<'a>(&self, signed: &'a str) -> Option<&'a str> {
        let (value, tag) = signed.rsplit_once('.')?;
        let tag = URL_SAFE_NO_PAD.decode(tag).ok()?;
        let mut mac = self.mac();
        mac.update(value.as_bytes());
        mac.verify_slice(&tag).ok()?;
        Some(value)
    }
}

impl std::fmt::Debug for CookieSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieSigner").finish_non_exhaustive()
    }
}
