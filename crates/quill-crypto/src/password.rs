use sha2::Sha512;

/// Default PBKDF2 iteration count.
pub const DEFAULT_ROUNDS: u32 = 250_000;

/// Length of the derived key in bytes (hex output is twice as long).
pub const DERIVED_KEY_LEN: usize = 64;

/// Salted PBKDF2-HMAC-SHA512 password hasher.
///
/// The salt is used as the hex string that is stored next to the hash, so a
/// hash can always be recomputed from the stored record alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PasswordHasher {
    rounds: u32,
}

impl PasswordHasher {
    /// Create a hasher with a custom iteration count.
    ///
    /// Low counts are only meant for tests.
    pub fn with_rounds(rounds: u32) -> Result<Self, CryptoError> {
        if rounds == 0 {
            return Err(CryptoError::InvalidRounds(rounds));
        }
        Ok(Self { rounds })
    }

    /// Iteration count used by this hasher.
    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    /// Derive the hex-encoded key for `password` under `salt`.
    pub fn hash(&self, password: &str, salt: &str) -> String {
        let mut key = [0u8; DERIVED_KEY_LEN];
        pbkdf2::pbkdf2_hmac::<Sha512>(password.as_bytes(), salt.as_bytes(), self.rounds, &mut key);
        hex::encode(key)
    }

    /// Recompute the hash of `password` and compare it with `expected_hash`.
    pub fn verify(&self, password: &str, salt: &str, expected_hash: &str) -> bool {
        let computed = self.hash(password, salt);
        constant_time_eq(computed.as_bytes(), expected_hash.as_bytes())
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            rounds: DEFAULT_ROUNDS,
        }
    }
}

/// Compare two byte strings without short-circuiting on the first mismatch.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

/// Errors from hasher configuration.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid PBKDF2 round count: {0}")]
    InvalidRounds(u32),
}
