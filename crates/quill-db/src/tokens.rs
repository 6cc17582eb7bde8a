use quill_store::Batch;

use crate::database::Database;
use crate::error::{DbError, DbResult};
use crate::keys;

impl Database {
    /// Issue a new session token for `username`.
    ///
    /// The token key and its entry in the owner's token set are written in
    /// one batch, the key expiring after the configured TTL.
    pub async fn generate_token(&self, username: &str) -> DbResult<String> {
        let token = quill_crypto::generate_token();
        let batch = Batch::new()
            .set_with_ttl(keys::token(&token), username, self.token_ttl)
            .set_add(keys::user_tokens(username), token.as_str());
        self.store.execute_atomic(batch).await?;
        Ok(token)
    }

    /// Username a live token belongs to.
    pub async fn resolve_token(&self, token: &str) -> DbResult<String> {
        self.store
            .get_string(&keys::token(token))
            .await?
            .ok_or(DbError::TokenNotFound)
    }

    /// Tokens currently listed for `username`, including expired ones that
    /// have not been cleaned yet.
    pub async fn get_user_tokens(&self, username: &str) -> DbResult<Vec<String>> {
        Ok(self.store.set_members(&keys::user_tokens(username)).await?)
    }

    /// Drop expired tokens from the owner's token set.
    ///
    /// Returns how many entries were removed.
    pub async fn clean_expired_tokens(&self, username: &str) -> DbResult<usize> {
        let set_key = keys::user_tokens(username);
        let mut removed = 0;
        for token in self.store.set_members(&set_key).await? {
            if self.store.get_string(&keys::token(&token)).await?.is_none() {
                self.store.set_remove(&set_key, &token).await?;
                removed += 1;
            }
        }
        if removed > 0 {
            tracing::debug!(username, removed, "cleaned expired tokens");
        }
        Ok(removed)
    }

    /// Invalidate every token of `username` and clear the token set.
    ///
    /// Returns how many tokens were listed.
    pub async fn remove_all_tokens(&self, username: &str) -> DbResult<usize> {
        let set_key = keys::user_tokens(username);
        let tokens = self.store.set_members(&set_key).await?;
        let mut batch = Batch::new();
        for token in &tokens {
            batch = batch.delete(keys::token(token));
        }
        batch = batch.delete(set_key);
        self.store.execute_atomic(batch).await?;

        tracing::debug!(username, count = tokens.len(), "removed all tokens");
        Ok(tokens.len())
    }
}
