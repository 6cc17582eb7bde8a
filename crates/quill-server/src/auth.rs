use std::sync::Arc;

use quill_crypto::{generate_salt, PasswordHasher};
use quill_db::Database;
use quill_types::{PostRecord, UserRecord};

use crate::error::{ApiError, ApiResult};

/// Password and token checks against the user database.
///
/// Hashing is CPU-bound, so every derivation runs on the blocking pool.
#[derive(Clone, Debug)]
pub struct Authenticator {
    db: Arc<Database>,
    hasher: PasswordHasher,
}

impl Authenticator {
    pub fn new(db: Arc<Database>, hasher: PasswordHasher) -> Self {
        Self { db, hasher }
    }

    pub fn hasher(&self) -> PasswordHasher {
        self.hasher
    }

    /// Check `password` against the stored hash of `username`.
    pub async fn authenticate(&self, username: &str, password: &str) -> ApiResult<()> {
        let user = self.db.get_user(username).await?;
        let hasher = self.hasher;
        let password = password.to_string();
        let matches = tokio::task::spawn_blocking(move || {
            hasher.verify(&password, &user.salt, &user.password_hash)
        })
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

        if !matches {
            tracing::warn!(username, "wrong password");
            return Err(ApiError::WrongPassword);
        }
        Ok(())
    }

    /// Fresh salt and hash for `password`.
    pub async fn new_credentials(&self, username: &str, password: &str) -> ApiResult<UserRecord> {
        let hasher = self.hasher;
        let password = password.to_string();
        let (hash, salt) = tokio::task::spawn_blocking(move || {
            let salt = generate_salt();
            (hasher.hash(&password, &salt), salt)
        })
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
        Ok(UserRecord::new(username, hash, salt))
    }

    /// Username behind a session token.
    pub async fn resolve_author(&self, token: &str) -> ApiResult<String> {
        Ok(self.db.resolve_token(token).await?)
    }
}

/// Only the author of a post may change it.
pub fn check_author(post: &PostRecord, username: &str) -> ApiResult<()> {
    if !post.is_authored_by(username) {
        tracing::warn!(post_id = %post.id, username, "rejected change by non-author");
        return Err(ApiError::Forbidden(
            "The blog posts state can only be changed by its author.".into(),
        ));
    }
    Ok(())
}
