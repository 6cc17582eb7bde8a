use std::sync::Arc;

use quill_crypto::PasswordHasher;
use quill_db::Database;
use quill_store::{InMemoryKvStore, KeyValueStore, RedisKvStore};

use crate::auth::Authenticator;
use crate::config::ServerConfig;
use crate::error::ServerResult;

/// Shared handler state. Cloning is cheap.
#[derive(Clone, Debug)]
pub struct AppState {
    pub db: Arc<Database>,
    pub auth: Authenticator,
}

impl AppState {
    /// Wrap an already-initialized store.
    pub fn new(store: Arc<dyn KeyValueStore>, config: &ServerConfig) -> ServerResult<Self> {
        let db = Arc::new(Database::new(store).with_token_ttl(config.token_ttl()));
        let hasher = PasswordHasher::with_rounds(config.hash_rounds)?;
        let auth = Authenticator::new(db.clone(), hasher);
        Ok(Self { db, auth })
    }

    /// Connect to Redis and seed the post counter.
    pub async fn connect(config: &ServerConfig) -> ServerResult<Self> {
        let store = RedisKvStore::connect(config.redis_url()).await?;
        let state = Self::new(Arc::new(store), config)?;
        state.db.init().await?;
        Ok(state)
    }

    /// State backed by a fresh in-process store.
    pub async fn in_memory(config: &ServerConfig) -> ServerResult<Self> {
        let state = Self::new(Arc::new(InMemoryKvStore::new()), config)?;
        state.db.init().await?;
        Ok(state)
    }
}
