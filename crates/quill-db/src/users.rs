use quill_store::Batch;
use quill_types::user::{FIELD_PASSWORD, FIELD_SALT};
use quill_types::UserRecord;

use crate::database::Database;
use crate::error::{DbError, DbResult};
use crate::keys;

impl Database {
    /// Register a new user.
    ///
    /// Uniqueness is checked against the `users` set before the write, in a
    /// separate round-trip; concurrent registrations of one name can race.
    pub async fn create_user(&self, user: &UserRecord) -> DbResult<()> {
        if self.user_exists(&user.username).await? {
            return Err(DbError::UserAlreadyExists(user.username.clone()));
        }

        let batch = Batch::new()
            .set_add(keys::USERS, user.username.as_str())
            .hash_set(keys::user(&user.username), user.to_fields());
        self.store.execute_atomic(batch).await?;

        tracing::info!(username = %user.username, "user created");
        Ok(())
    }

    /// Returns `true` if `username` is registered.
    pub async fn user_exists(&self, username: &str) -> DbResult<bool> {
        Ok(self.store.set_is_member(keys::USERS, username).await?)
    }

    /// Load a user record.
    pub async fn get_user(&self, username: &str) -> DbResult<UserRecord> {
        let key = keys::user(username);
        let fields = self.store.hash_get_all(&key).await?;
        if fields.is_empty() {
            return Err(DbError::UserNotFound(username.to_string()));
        }
        UserRecord::from_fields(username, &fields).map_err(|e| DbError::corrupt(key, e))
    }

    /// Replace the password hash and salt of an existing user.
    pub async fn set_user_password(&self, user: &UserRecord) -> DbResult<()> {
        if !self.user_exists(&user.username).await? {
            return Err(DbError::UserNotFound(user.username.clone()));
        }
        self.store
            .hash_set_fields(&keys::user(&user.username), &user.to_fields())
            .await?;
        tracing::info!(username = %user.username, "password changed");
        Ok(())
    }

    /// Remove a user together with every post and token they own.
    pub async fn remove_user(&self, username: &str) -> DbResult<()> {
        if !self.user_exists(username).await? {
            return Err(DbError::UserNotFound(username.to_string()));
        }

        let posts = self.get_user_posts(username).await?;
        for id in &posts {
            self.remove_post(username, *id).await?;
        }
        self.remove_all_tokens(username).await?;

        let batch = Batch::new()
            .hash_delete(keys::user(username), [FIELD_PASSWORD, FIELD_SALT])
            .set_remove(keys::USERS, username);
        self.store.execute_atomic(batch).await?;

        tracing::info!(username, posts = posts.len(), "user removed");
        Ok(())
    }

    /// Every registered username, sorted.
    pub async fn get_all_users(&self) -> DbResult<Vec<String>> {
        let mut users = self.store.set_members(keys::USERS).await?;
        users.sort();
        Ok(users)
    }

    /// A uniformly chosen username, or `None` when nobody is registered.
    pub async fn random_user(&self) -> DbResult<Option<String>> {
        Ok(self.store.set_random_member(keys::USERS).await?)
    }
}
