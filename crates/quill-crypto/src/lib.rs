//! Cryptographic helpers for Quill.
//!
//! Provides salted PBKDF2-HMAC-SHA512 password hashing, CSPRNG salt
//! generation, and opaque session token generation.
//!
//! All crypto operations wrap established libraries — no custom cryptography.

pub mod password;
pub mod random;

pub use password::{constant_time_eq, CryptoError, PasswordHasher};
pub use random::{generate_salt, generate_token, SALT_BYTES};
