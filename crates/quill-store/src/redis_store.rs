use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;

use crate::command::{Batch, Command};
use crate::error::{StoreError, StoreResult};
use crate::traits::KeyValueStore;

/// Redis-backed store.
///
/// Wraps a [`ConnectionManager`]: a single multiplexed connection that
/// reconnects on failure and is cheap to clone, so one instance is shared by
/// every request handler.
#[derive(Clone)]
pub struct RedisKvStore {
    conn: ConnectionManager,
    url: String,
}

impl RedisKvStore {
    /// Connect to `url` (`redis://[:password@]host[:port][/db]`).
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let client =
            redis::Client::open(url).map_err(|e| StoreError::InvalidUrl(e.to_string()))?;
        let conn = client.get_connection_manager().await?;
        tracing::info!(url = %redact(url), "connected to redis");
        Ok(Self {
            conn,
            url: url.to_string(),
        })
    }

    fn conn(&self) -> ConnectionManager {
        self.conn.clone()
    }
}

impl std::fmt::Debug for RedisKvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisKvStore")
            .field("url", &redact(&self.url))
            .finish()
    }
}

/// Hide the password part of a connection URL.
pub fn redact(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    match rest.rsplit_once('@') {
        Some((_, host)) => format!("{scheme}://***@{host}"),
        None => url.to_string(),
    }
}

fn ttl_secs(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

fn queue(pipe: &mut redis::Pipeline, command: &Command) {
    match command {
        Command::Set { key, value, ttl } => {
            let cmd = pipe.cmd("SET").arg(key).arg(value);
            if let Some(ttl) = ttl {
                cmd.arg("EX").arg(ttl_secs(*ttl));
            }
        }
        Command::Expire { key, ttl } => {
            pipe.cmd("EXPIRE").arg(key).arg(ttl_secs(*ttl));
        }
        Command::Delete { key } => {
            pipe.cmd("DEL").arg(key);
        }
        Command::HashSet { key, fields } => {
            let cmd = pipe.cmd("HSET").arg(key);
            for (field, value) in fields {
                cmd.arg(field).arg(value);
            }
        }
        Command::HashDelete { key, fields } => {
            pipe.cmd("HDEL").arg(key).arg(fields);
        }
        Command::SetAdd { key, member } => {
            pipe.cmd("SADD").arg(key).arg(member);
        }
        Command::SetRemove { key, member } => {
            pipe.cmd("SREM").arg(key).arg(member);
        }
    }
    pipe.ignore();
}

#[async_trait]
impl KeyValueStore for RedisKvStore {
    async fn get_string(&self, key: &str) -> StoreResult<Option<String>> {
        let value: Option<String> = redis::cmd("GET").arg(key).query_async(&mut self.conn()).await?;
        Ok(value)
    }

    async fn set_string(&self, key: &str, value: &str) -> StoreResult<()> {
        let _: () = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .query_async(&mut self.conn())
            .await?;
        Ok(())
    }

    async fn set_if_not_exists(&self, key: &str, value: &str) -> StoreResult<bool> {
        let written: bool = redis::cmd("SETNX")
            .arg(key)
            .arg(value)
            .query_async(&mut self.conn())
            .await?;
        Ok(written)
    }

    async fn increment(&self, key: &str) -> StoreResult<i64> {
        let value: i64 = redis::cmd("INCR").arg(key).query_async(&mut self.conn()).await?;
        Ok(value)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> StoreResult<bool> {
        let applied: bool = redis::cmd("EXPIRE")
            .arg(key)
            .arg(ttl_secs(ttl))
            .query_async(&mut self.conn())
            .await?;
        Ok(applied)
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        let removed: u64 = redis::cmd("DEL").arg(key).query_async(&mut self.conn()).await?;
        Ok(removed > 0)
    }

    async fn hash_set_fields(&self, key: &str, fields: &[(String, String)]) -> StoreResult<()> {
        if fields.is_empty() {
            return Ok(());
        }
        let mut cmd = redis::cmd("HSET");
        cmd.arg(key);
        for (field, value) in fields {
            cmd.arg(field).arg(value);
        }
        let _: u64 = cmd.query_async(&mut self.conn()).await?;
        Ok(())
    }

    async fn hash_get_all(&self, key: &str) -> StoreResult<HashMap<String, String>> {
        let all: HashMap<String, String> =
            redis::cmd("HGETALL").arg(key).query_async(&mut self.conn()).await?;
        Ok(all)
    }

    async fn hash_delete_fields(&self, key: &str, fields: &[&str]) -> StoreResult<u64> {
        if fields.is_empty() {
            return Ok(0);
        }
        let removed: u64 = redis::cmd("HDEL")
            .arg(key)
            .arg(fields)
            .query_async(&mut self.conn())
            .await?;
        Ok(removed)
    }

    async fn set_add(&self, key: &str, member: &str) -> StoreResult<bool> {
        let added: u64 = redis::cmd("SADD")
            .arg(key)
            .arg(member)
            .query_async(&mut self.conn())
            .await?;
        Ok(added > 0)
    }

    async fn set_remove(&self, key: &str, member: &str) -> StoreResult<bool> {
        let removed: u64 = redis::cmd("SREM")
            .arg(key)
            .arg(member)
            .query_async(&mut self.conn())
            .await?;
        Ok(removed > 0)
    }

    async fn set_members(&self, key: &str) -> StoreResult<Vec<String>> {
        let members: Vec<String> =
            redis::cmd("SMEMBERS").arg(key).query_async(&mut self.conn()).await?;
        Ok(members)
    }

    async fn set_random_member(&self, key: &str) -> StoreResult<Option<String>> {
        let member: Option<String> =
            redis::cmd("SRANDMEMBER").arg(key).query_async(&mut self.conn()).await?;
        Ok(member)
    }

    async fn set_is_member(&self, key: &str, member: &str) -> StoreResult<bool> {
        let present: bool = redis::cmd("SISMEMBER")
            .arg(key)
            .arg(member)
            .query_async(&mut self.conn())
            .await?;
        Ok(present)
    }

    async fn server_time(&self) -> StoreResult<i64> {
        let (secs, _micros): (i64, i64) =
            redis::cmd("TIME").query_async(&mut self.conn()).await?;
        Ok(secs)
    }

    async fn execute_atomic(&self, batch: Batch) -> StoreResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let mut pipe = redis::pipe();
        pipe.atomic();
        for command in batch.commands() {
            queue(&mut pipe, command);
        }
        tracing::trace!(commands = batch.len(), "executing MULTI/EXEC batch");
        let _: () = pipe.query_async(&mut self.conn()).await?;
        Ok(())
    }
}
