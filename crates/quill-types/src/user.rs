use std::collections::HashMap;

use crate::error::TypeError;

/// Hash field holding the hex password hash.
pub const FIELD_PASSWORD: &str = "password";
/// Hash field holding the hex salt.
pub const FIELD_SALT: &str = "salt";

/// A registered account as stored in `user_<username>`.
#[derive(Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub username: String,
    /// Hex-encoded derived key.
    pub password_hash: String,
    /// Hex-encoded random salt.
    pub salt: String,
}

impl UserRecord {
    pub fn new(
        username: impl Into<String>,
        password_hash: impl Into<String>,
        salt: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password_hash: password_hash.into(),
            salt: salt.into(),
        }
    }

    /// Decode a record from the fields of its store hash.
    pub fn from_fields(
        username: impl Into<String>,
        fields: &HashMap<String, String>,
    ) -> Result<Self, TypeError> {
        let password_hash = fields
            .get(FIELD_PASSWORD)
            .ok_or(TypeError::MissingField(FIELD_PASSWORD))?;
        let salt = fields.get(FIELD_SALT).ok_or(TypeError::MissingField(FIELD_SALT))?;
        Ok(Self::new(username, password_hash.clone(), salt.clone()))
    }

    /// Hash fields in the order they are written.
    pub fn to_fields(&self) -> Vec<(String, String)> {
        vec![
            (FIELD_PASSWORD.to_string(), self.password_hash.clone()),
            (FIELD_SALT.to_string(), self.salt.clone()),
        ]
    }
}

// Keep secrets out of logs.
impl std::fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRecord")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}
