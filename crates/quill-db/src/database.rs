use std::sync::Arc;
use std::time::Duration;

use quill_store::KeyValueStore;

use crate::error::DbResult;
use crate::keys;

/// Lifetime of a session token.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(86_400);

/// Domain operations on users, tokens and posts.
///
/// The store handle is injected, so tests run against
/// [`InMemoryKvStore`](quill_store::InMemoryKvStore) and production against
/// Redis without any global state. User, token and post operations live in
/// their own modules as further `impl Database` blocks.
pub struct Database {
    pub(crate) store: Arc<dyn KeyValueStore>,
    pub(crate) token_ttl: Duration,
}

impl Database {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            token_ttl: DEFAULT_TOKEN_TTL,
        }
    }

    /// Override the session token lifetime.
    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    pub fn token_ttl(&self) -> Duration {
        self.token_ttl
    }

    /// The underlying store handle.
    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Seed the post id counter. Safe to call on every startup.
    pub async fn init(&self) -> DbResult<()> {
        let seeded = self
            .store
            .set_if_not_exists(keys::LAST_POST_ID, keys::LAST_POST_ID_SEED)
            .await?;
        if seeded {
            tracing::info!("initialized {} counter", keys::LAST_POST_ID);
        }
        Ok(())
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("token_ttl", &self.token_ttl)
            .finish_non_exhaustive()
    }
}
