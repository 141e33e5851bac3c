use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use super::CryptoError;

pub const PBKDF2_ITERATIONS: u32 = 600_000;
pub const KEY_LENGTH: usize = 32;
pub const SALT_LENGTH: usize = 32;

/// Scheme tag at the front of every stored hash.
const SCHEME: &str = "pbkdf2-sha256";

/// Password-derived key, zeroed on drop
#[derive(Zeroize)]
#[zeroize(drop)]
struct DerivedKey {
    key_bytes: [u8; KEY_LENGTH],
}

impl DerivedKey {
    /// Derive from password + salt using PBKDF2-SHA256
    fn derive(password: &str, salt: &[u8], iterations: u32) -> Self {
        let mut key_bytes = [0u8; KEY_LENGTH];
        pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut key_bytes);
        Self { key_bytes }
    }
}

/// Salted one-way password hashing.
///
/// Stored form: `pbkdf2-sha256$<iterations>$<salt>$<key>` with standard
/// unpadded base64. Verification reads the iteration count from the
/// stored string, so changing the configured cost never locks out
/// existing accounts.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    iterations: u32,
    /// Hash of a random secret at the configured cost, verified against
    /// when there is no stored hash so both paths cost one derivation.
    dummy_hash: String,
}

impl PasswordHasher {
    pub fn new(iterations: u32) -> Self {
        let mut hasher = Self {
            iterations,
            dummy_hash: String::new(),
        };
        let secret = STANDARD_NO_PAD.encode(generate_salt());
        hasher.dummy_hash = hasher.hash(&secret);
        hasher
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Hash a password with a fresh random salt.
    pub fn hash(&self, password: &str) -> String {
        let salt = generate_salt();
        let key = DerivedKey::derive(password, &salt, self.iterations);
        format!(
            "{SCHEME}${}${}${}",
            self.iterations,
            STANDARD_NO_PAD.encode(salt),
            STANDARD_NO_PAD.encode(&key.key_bytes),
        )
    }

    /// Check a password against a stored hash in constant time.
    pub fn verify(&self, password: &str, stored: &str) -> Result<bool, CryptoError> {
        let parsed = ParsedHash::parse(stored)?;
        let key = DerivedKey::derive(password, &parsed.salt, parsed.iterations);
        Ok(key.key_bytes[..].ct_eq(&parsed.key[..]).into())
    }

    /// Spend one verification's worth of work for a login whose account
    /// does not exist. The result is always discarded.
    pub fn verify_dummy(&self, password: &str) {
        let _ = self.verify(password, &self.dummy_hash);
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(PBKDF2_ITERATIONS)
    }
}

struct ParsedHash {
    iterations: u32,
    salt: Vec<u8>,
    key: Vec<u8>,
}

impl ParsedHash {
    fn parse(stored: &str) -> Result<Self, CryptoError> {
        let mut parts = stored.split('$');
        let (Some(scheme), Some(iterations), Some(salt), Some(key), None) = (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) else {
            return Err(CryptoError::MalformedHash);
        };
        if scheme != SCHEME {
            return Err(CryptoError::MalformedHash);
        }
        let iterations = iterations
            .parse::<u32>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or(CryptoError::MalformedHash)?;
        let salt = STANDARD_NO_PAD
            .decode(salt)
            .map_err(|_| CryptoError::MalformedHash)?;
        let key = STANDARD_NO_PAD
            .decode(key)
            .map_err(|_| CryptoError::MalformedHash)?;
        if key.len() != KEY_LENGTH {
            return Err(CryptoError::MalformedHash);
        }
        Ok(Self { iterations, salt, key })
    }
}

/// Generate a cryptographically random salt
pub fn generate_salt() -> [u8; SALT_LENGTH] {
    use rand::RngCore;
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> PasswordHasher {
        PasswordHasher::new(1_000)
    }

    #[test]
    fn hash_verifies_with_same_password() {
        let hasher = fast();
        let stored = hasher.hash("correct horse");
        assert!(hasher.verify("correct horse", &stored).unwrap());
    }

    #[test]
    fn wrong_password_does_not_verify() {
        let hasher = fast();
        let stored = hasher.hash("correct horse");
        assert!(!hasher.verify("battery staple", &stored).unwrap());
    }

    #[test]
    fn same_password_gets_different_salts() {
        let hasher = fast();
        assert_ne!(hasher.hash("password"), hasher.hash("password"));
    }

    #[test]
    fn stored_hash_records_iterations() {
        let stored = fast().hash("password");
        assert!(stored.starts_with("pbkdf2-sha256$1000$"));
        assert_eq!(stored.split('$').count(), 4);
    }

    #[test]
    fn verify_uses_stored_iteration_count() {
        let stored = PasswordHasher::new(1_500).hash("password");
        assert!(fast().verify("password", &stored).unwrap());
    }

    #[test]
    fn malformed_hashes_are_rejected() {
        let hasher = fast();
        for stored in [
            "",
            "plaintext",
            "md5$1000$c2FsdA$a2V5",
            "pbkdf2-sha256$zero$c2FsdA$a2V5",
            "pbkdf2-sha256$0$c2FsdA$a2V5",
            "pbkdf2-sha256$1000$!!!$a2V5",
            "pbkdf2-sha256$1000$c2FsdA$a2V5",
            "pbkdf2-sha256$1000$c2FsdA$a2V5$extra",
        ] {
            assert!(
                matches!(hasher.verify("x", stored), Err(CryptoError::MalformedHash)),
                "accepted {stored:?}"
            );
        }
    }

    #[test]
    fn generate_salt_is_random() {
        let s1 = generate_salt();
        let s2 = generate_salt();
        assert_ne!(s1, s2);
    }

    #[test]
    fn dummy_hash_uses_configured_cost() {
        let hasher = PasswordHasher::new(1_234);
        let parsed = ParsedHash::parse(&hasher.dummy_hash).unwrap();
        assert_eq!(parsed.iterations, 1_234);
        assert!(!hasher.verify("", &hasher.dummy_hash).unwrap());
    }

    #[test]
    fn default_cost_is_production_strength() {
        assert_eq!(PasswordHasher::default().iterations(), PBKDF2_ITERATIONS);
    }
}
