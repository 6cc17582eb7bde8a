use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::command::Batch;
use crate::error::StoreResult;

/// Client for a key-value service with string, hash and set values.
///
/// All implementations must satisfy these invariants:
/// - Expired keys are indistinguishable from missing keys.
/// - Reading a missing hash or set yields an empty collection, not an error.
/// - Removing the last hash field or set member removes the key.
/// - [`execute_atomic`](Self::execute_atomic) makes every command of a batch
///   visible together, or none of them.
/// - Implementations are shared across concurrent request handlers, so they
///   must be `Send + Sync` and need no external locking.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// `GET key`. Returns `Ok(None)` if the key does not exist.
    async fn get_string(&self, key: &str) -> StoreResult<Option<String>>;

    /// `SET key value`, clearing any expiry.
    async fn set_string(&self, key: &str, value: &str) -> StoreResult<()>;

    /// `SETNX key value`. Returns `true` if the value was written.
    async fn set_if_not_exists(&self, key: &str, value: &str) -> StoreResult<bool>;

    /// `INCR key`. A missing key counts as 0.
    async fn increment(&self, key: &str) -> StoreResult<i64>;

    /// `EXPIRE key ttl`. Returns `false` if the key does not exist.
    async fn expire(&self, key: &str, ttl: Duration) -> StoreResult<bool>;

    /// `DEL key`. Returns `true` if the key existed.
    async fn delete(&self, key: &str) -> StoreResult<bool>;

    /// `HSET key field value ...`.
    async fn hash_set_fields(&self, key: &str, fields: &[(String, String)]) -> StoreResult<()>;

    /// `HGETALL key`. Empty when the key does not exist.
    async fn hash_get_all(&self, key: &str) -> StoreResult<HashMap<String, String>>;

    /// `HDEL key field ...`. Returns the number of fields removed.
    async fn hash_delete_fields(&self, key: &str, fields: &[&str]) -> StoreResult<u64>;

    /// `SADD key member`. Returns `true` if the member was not already present.
    async fn set_add(&self, key: &str, member: &str) -> StoreResult<bool>;

    /// `SREM key member`. Returns `true` if the member was present.
    async fn set_remove(&self, key: &str, member: &str) -> StoreResult<bool>;

    /// `SMEMBERS key`, in no particular order.
    async fn set_members(&self, key: &str) -> StoreResult<Vec<String>>;

    /// `SRANDMEMBER key`. Returns `Ok(None)` for an empty or missing set.
    async fn set_random_member(&self, key: &str) -> StoreResult<Option<String>>;

    /// `SISMEMBER key member`.
    async fn set_is_member(&self, key: &str, member: &str) -> StoreResult<bool>;

    /// `TIME`: the store server's clock, seconds since the Unix epoch.
    async fn server_time(&self) -> StoreResult<i64>;

    /// Commit every command of `batch` as one unit (`MULTI` ... `EXEC`).
    async fn execute_atomic(&self, batch: Batch) -> StoreResult<()>;
}
