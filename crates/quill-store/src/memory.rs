use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use async_trait::async_trait;
use rand::seq::IteratorRandom;

use crate::command::{Batch, Command};
use crate::error::{StoreError, StoreResult};
use crate::traits::KeyValueStore;

#[derive(Clone, Debug)]
enum Value {
    Str(String),
    Hash(HashMap<String, String>),
    Set(HashSet<String>),
}

#[derive(Clone, Debug)]
struct Entry {
    value: Value,
    /// Unix second at which the key disappears.
    expires_at: Option<i64>,
}

impl Entry {
    fn new(value: Value) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    fn is_live(&self, now: i64) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

type Keyspace = HashMap<String, Entry>;

/// In-memory, `HashMap`-based key-value store.
///
/// Intended for tests and single-process deployments. Values live behind a
/// `RwLock`; batches are applied to a scratch copy of the touched keys and
/// only written back when every command succeeded.
///
/// Expiry and `TIME` follow the wall clock for stores built with
/// [`new`](Self::new). Stores built with [`with_clock`](Self::with_clock) keep
/// a frozen clock instead, so TTL behaviour is deterministic in tests. Either
/// kind can be pushed forward with [`advance_clock`](Self::advance_clock).
pub struct InMemoryKvStore {
    keys: RwLock<Keyspace>,
    /// `None` reads the wall clock.
    frozen_at: Option<i64>,
    offset: AtomicI64,
}

impl InMemoryKvStore {
    /// Create an empty store on the wall clock.
    pub fn new() -> Self {
        Self {
            keys: RwLock::new(HashMap::new()),
            frozen_at: None,
            offset: AtomicI64::new(0),
        }
    }

    /// Create an empty store whose clock stands still at `unix_secs`.
    pub fn with_clock(unix_secs: i64) -> Self {
        Self {
            keys: RwLock::new(HashMap::new()),
            frozen_at: Some(unix_secs),
            offset: AtomicI64::new(0),
        }
    }

    /// Move the clock forward.
    pub fn advance_clock(&self, by: Duration) {
        self.offset.fetch_add(secs(by), Ordering::SeqCst);
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        let now = self.now();
        self.inspect().values().filter(|e| e.is_live(now)).count()
    }

    /// Returns `true` if no live key exists.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorted names of all live keys.
    pub fn keys(&self) -> Vec<String> {
        let now = self.now();
        let mut keys: Vec<String> = self
            .inspect()
            .iter()
            .filter(|(_, e)| e.is_live(now))
            .map(|(k, _)| k.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Remaining time to live of `key`, if it exists and has an expiry.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let now = self.now();
        let keys = self.inspect();
        let entry = keys.get(key).filter(|e| e.is_live(now))?;
        entry
            .expires_at
            .map(|at| Duration::from_secs((at - now).max(0) as u64))
    }

    fn now(&self) -> i64 {
        let base = self
            .frozen_at
            .unwrap_or_else(|| chrono::Utc::now().timestamp());
        base.saturating_add(self.offset.load(Ordering::SeqCst))
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Keyspace>> {
        self.keys
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Keyspace>> {
        self.keys
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }

    // Diagnostics never fail; a poisoned map is still readable.
    fn inspect(&self) -> RwLockReadGuard<'_, Keyspace> {
        self.keys.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for InMemoryKvStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryKvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryKvStore")
            .field("key_count", &self.len())
            .field("clock", &self.now())
            .finish()
    }
}

fn secs(d: Duration) -> i64 {
    i64::try_from(d.as_secs()).unwrap_or(i64::MAX)
}

fn wrong_type(key: &str) -> StoreError {
    StoreError::WrongType {
        key: key.to_string(),
    }
}

fn live<'a>(keys: &'a Keyspace, key: &str, now: i64) -> Option<&'a Entry> {
    keys.get(key).filter(|e| e.is_live(now))
}

/// Drop `key` if it has expired, so writers see it as missing.
fn purge(keys: &mut Keyspace, key: &str, now: i64) {
    if keys.get(key).is_some_and(|e| !e.is_live(now)) {
        keys.remove(key);
    }
}

fn hash_mut<'a>(
    keys: &'a mut Keyspace,
    key: &str,
    now: i64,
) -> StoreResult<&'a mut HashMap<String, String>> {
    purge(keys, key, now);
    let entry = keys
        .entry(key.to_string())
        .or_insert_with(|| Entry::new(Value::Hash(HashMap::new())));
    match &mut entry.value {
        Value::Hash(map) => Ok(map),
        _ => Err(wrong_type(key)),
    }
}

fn set_mut<'a>(
    keys: &'a mut Keyspace,
    key: &str,
    now: i64,
) -> StoreResult<&'a mut HashSet<String>> {
    purge(keys, key, now);
    let entry = keys
        .entry(key.to_string())
        .or_insert_with(|| Entry::new(Value::Set(HashSet::new())));
    match &mut entry.value {
        Value::Set(set) => Ok(set),
        _ => Err(wrong_type(key)),
    }
}

fn remove_if_empty(keys: &mut Keyspace, key: &str) {
    let empty = match keys.get(key).map(|e| &e.value) {
        Some(Value::Hash(map)) => map.is_empty(),
        Some(Value::Set(set)) => set.is_empty(),
        _ => false,
    };
    if empty {
        keys.remove(key);
    }
}

fn set_in(keys: &mut Keyspace, key: &str, value: &str, ttl: Option<Duration>, now: i64) {
    let mut entry = Entry::new(Value::Str(value.to_string()));
    entry.expires_at = ttl.map(|t| now.saturating_add(secs(t)));
    keys.insert(key.to_string(), entry);
}

fn expire_in(keys: &mut Keyspace, key: &str, ttl: Duration, now: i64) -> bool {
    purge(keys, key, now);
    match keys.get_mut(key) {
        Some(entry) => {
            entry.expires_at = Some(now.saturating_add(secs(ttl)));
            true
        }
        None => false,
    }
}

fn delete_in(keys: &mut Keyspace, key: &str, now: i64) -> bool {
    purge(keys, key, now);
    keys.remove(key).is_some()
}

fn hash_set_in(
    keys: &mut Keyspace,
    key: &str,
    fields: &[(String, String)],
    now: i64,
) -> StoreResult<()> {
    let map = hash_mut(keys, key, now)?;
    for (field, value) in fields {
        map.insert(field.clone(), value.clone());
    }
    remove_if_empty(keys, key);
    Ok(())
}

fn hash_delete_in<S: AsRef<str>>(
    keys: &mut Keyspace,
    key: &str,
    fields: &[S],
    now: i64,
) -> StoreResult<u64> {
    purge(keys, key, now);
    if !keys.contains_key(key) {
        return Ok(0);
    }
    let map = hash_mut(keys, key, now)?;
    let mut removed = 0;
    for field in fields {
        let field: &str = field.as_ref();
        if map.remove(field).is_some() {
            removed += 1;
        }
    }
    remove_if_empty(keys, key);
    Ok(removed)
}

fn set_add_in(keys: &mut Keyspace, key: &str, member: &str, now: i64) -> StoreResult<bool> {
    Ok(set_mut(keys, key, now)?.insert(member.to_string()))
}

fn set_remove_in(keys: &mut Keyspace, key: &str, member: &str, now: i64) -> StoreResult<bool> {
    purge(keys, key, now);
    if !keys.contains_key(key) {
        return Ok(false);
    }
    let removed = set_mut(keys, key, now)?.remove(member);
    remove_if_empty(keys, key);
    Ok(removed)
}

fn apply(keys: &mut Keyspace, command: &Command, now: i64) -> StoreResult<()> {
    match command {
        Command::Set { key, value, ttl } => set_in(keys, key, value, *ttl, now),
        Command::Expire { key, ttl } => {
            expire_in(keys, key, *ttl, now);
        }
        Command::Delete { key } => {
            delete_in(keys, key, now);
        }
        Command::HashSet { key, fields } => hash_set_in(keys, key, fields, now)?,
        Command::HashDelete { key, fields } => {
            hash_delete_in(keys, key, fields, now)?;
        }
        Command::SetAdd { key, member } => {
            set_add_in(keys, key, member, now)?;
        }
        Command::SetRemove { key, member } => {
            set_remove_in(keys, key, member, now)?;
        }
    }
    Ok(())
}

#[async_trait]
impl KeyValueStore for InMemoryKvStore {
    async fn get_string(&self, key: &str) -> StoreResult<Option<String>> {
        let keys = self.read()?;
        match live(&keys, key, self.now()).map(|e| &e.value) {
            None => Ok(None),
            Some(Value::Str(s)) => Ok(Some(s.clone())),
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn set_string(&self, key: &str, value: &str) -> StoreResult<()> {
        let now = self.now();
        set_in(&mut *self.write()?, key, value, None, now);
        Ok(())
    }

    async fn set_if_not_exists(&self, key: &str, value: &str) -> StoreResult<bool> {
        let now = self.now();
        let mut keys = self.write()?;
        purge(&mut keys, key, now);
        if keys.contains_key(key) {
            return Ok(false);
        }
        set_in(&mut keys, key, value, None, now);
        Ok(true)
    }

    async fn increment(&self, key: &str) -> StoreResult<i64> {
        let now = self.now();
        let mut keys = self.write()?;
        purge(&mut keys, key, now);
        let entry = keys
            .entry(key.to_string())
            .or_insert_with(|| Entry::new(Value::Str("0".into())));
        let Value::Str(raw) = &mut entry.value else {
            return Err(wrong_type(key));
        };
        let next = raw
            .parse::<i64>()
            .ok()
            .and_then(|n| n.checked_add(1))
            .ok_or_else(|| StoreError::NotAnInteger {
                key: key.to_string(),
            })?;
        *raw = next.to_string();
        Ok(next)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> StoreResult<bool> {
        let now = self.now();
        Ok(expire_in(&mut *self.write()?, key, ttl, now))
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        let now = self.now();
        Ok(delete_in(&mut *self.write()?, key, now))
    }

    async fn hash_set_fields(&self, key: &str, fields: &[(String, String)]) -> StoreResult<()> {
        let now = self.now();
        hash_set_in(&mut *self.write()?, key, fields, now)
    }

    async fn hash_get_all(&self, key: &str) -> StoreResult<HashMap<String, String>> {
        let keys = self.read()?;
        match live(&keys, key, self.now()).map(|e| &e.value) {
            None => Ok(HashMap::new()),
            Some(Value::Hash(map)) => Ok(map.clone()),
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn hash_delete_fields(&self, key: &str, fields: &[&str]) -> StoreResult<u64> {
        let now = self.now();
        hash_delete_in(&mut *self.write()?, key, fields, now)
    }

    async fn set_add(&self, key: &str, member: &str) -> StoreResult<bool> {
        let now = self.now();
        set_add_in(&mut *self.write()?, key, member, now)
    }

    async fn set_remove(&self, key: &str, member: &str) -> StoreResult<bool> {
        let now = self.now();
        set_remove_in(&mut *self.write()?, key, member, now)
    }

    async fn set_members(&self, key: &str) -> StoreResult<Vec<String>> {
        let keys = self.read()?;
        match live(&keys, key, self.now()).map(|e| &e.value) {
            None => Ok(Vec::new()),
            Some(Value::Set(set)) => Ok(set.iter().cloned().collect()),
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn set_random_member(&self, key: &str) -> StoreResult<Option<String>> {
        let keys = self.read()?;
        match live(&keys, key, self.now()).map(|e| &e.value) {
            None => Ok(None),
            Some(Value::Set(set)) => Ok(set.iter().choose(&mut rand::thread_rng()).cloned()),
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn set_is_member(&self, key: &str, member: &str) -> StoreResult<bool> {
        let keys = self.read()?;
        match live(&keys, key, self.now()).map(|e| &e.value) {
            None => Ok(false),
            Some(Value::Set(set)) => Ok(set.contains(member)),
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn server_time(&self) -> StoreResult<i64> {
        Ok(self.now())
    }

    async fn execute_atomic(&self, batch: Batch) -> StoreResult<()> {
        let now = self.now();
        let mut keys = self.write()?;

        let touched: HashSet<String> = batch
            .commands()
            .iter()
            .map(|c| c.key().to_string())
            .collect();
        let mut scratch: Keyspace = touched
            .iter()
            .filter_map(|k| live(&keys, k, now).map(|e| (k.clone(), e.clone())))
            .collect();

        for command in batch.commands() {
            apply(&mut scratch, command, now)?;
        }

        for key in touched {
            match scratch.remove(&key) {
                Some(entry) => {
                    keys.insert(key, entry);
                }
                None => {
                    keys.remove(&key);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: Duration = Duration::from_secs(86_400);

    fn fields(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    // -----------------------------------------------------------------------
    // Strings and counters
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn get_missing_string() {
        let store = InMemoryKvStore::new();
        assert_eq!(store.get_string("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn set_and_get_string() {
        let store = InMemoryKvStore::new();
        store.set_string("k", "v").await.unwrap();
        assert_eq!(store.get_string("k").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn set_if_not_exists_only_writes_once() {
        let store = InMemoryKvStore::new();
        assert!(store.set_if_not_exists("LAST_POST_ID", "-1").await.unwrap());
        assert!(!store.set_if_not_exists("LAST_POST_ID", "5").await.unwrap());
        assert_eq!(
            store.get_string("LAST_POST_ID").await.unwrap().as_deref(),
            Some("-1")
        );
    }

    #[tokio::test]
    async fn increment_from_minus_one() {
        let store = InMemoryKvStore::new();
        store.set_if_not_exists("LAST_POST_ID", "-1").await.unwrap();
        assert_eq!(store.increment("LAST_POST_ID").await.unwrap(), 0);
        assert_eq!(store.increment("LAST_POST_ID").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn increment_missing_key_starts_at_one() {
        let store = InMemoryKvStore::new();
        assert_eq!(store.increment("counter").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn increment_non_integer_fails() {
        let store = InMemoryKvStore::new();
        store.set_string("k", "abc").await.unwrap();
        assert!(matches!(
            store.increment("k").await,
            Err(StoreError::NotAnInteger { .. })
        ));
    }

    // -----------------------------------------------------------------------
    // Expiry
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn expired_string_disappears() {
        let store = InMemoryKvStore::with_clock(1_000);
        store.set_string("token_x", "alice").await.unwrap();
        assert!(store.expire("token_x", DAY).await.unwrap());
        assert_eq!(store.ttl("token_x"), Some(DAY));

        store.advance_clock(DAY - Duration::from_secs(1));
        assert!(store.get_string("token_x").await.unwrap().is_some());

        store.advance_clock(Duration::from_secs(1));
        assert_eq!(store.get_string("token_x").await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn expire_missing_key_returns_false() {
        let store = InMemoryKvStore::new();
        assert!(!store.expire("nope", DAY).await.unwrap());
    }

    #[tokio::test]
    async fn set_clears_previous_ttl() {
        let store = InMemoryKvStore::new();
        store.set_string("k", "a").await.unwrap();
        store.expire("k", DAY).await.unwrap();
        store.set_string("k", "b").await.unwrap();
        assert_eq!(store.ttl("k"), None);
    }

    // -----------------------------------------------------------------------
    // Hashes
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn hash_roundtrip() {
        let store = InMemoryKvStore::new();
        store
            .hash_set_fields("user_alice", &fields(&[("password", "h"), ("salt", "s")]))
            .await
            .unwrap();
        let all = store.hash_get_all("user_alice").await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all["password"], "h");
    }

    #[tokio::test]
    async fn hash_get_all_missing_is_empty() {
        let store = InMemoryKvStore::new();
        assert!(store.hash_get_all("user_ghost").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn deleting_all_fields_removes_key() {
        let store = InMemoryKvStore::new();
        store
            .hash_set_fields("user_alice", &fields(&[("password", "h"), ("salt", "s")]))
            .await
            .unwrap();
        let removed = store
            .hash_delete_fields("user_alice", &["password", "salt", "other"])
            .await
            .unwrap();
        assert_eq!(removed, 2);
        assert!(store.keys().is_empty());
    }

    #[tokio::test]
    async fn wrong_type_is_reported() {
        let store = InMemoryKvStore::new();
        store.set_string("k", "v").await.unwrap();
        assert!(matches!(
            store.hash_get_all("k").await,
            Err(StoreError::WrongType { .. })
        ));
        assert!(matches!(
            store.set_add("k", "m").await,
            Err(StoreError::WrongType { .. })
        ));
    }

    // -----------------------------------------------------------------------
    // Sets
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn set_add_remove_members() {
        let store = InMemoryKvStore::new();
        assert!(store.set_add("users", "alice").await.unwrap());
        assert!(!store.set_add("users", "alice").await.unwrap());
        assert!(store.set_add("users", "bob").await.unwrap());

        let mut members = store.set_members("users").await.unwrap();
        members.sort();
        assert_eq!(members, ["alice", "bob"]);
        assert!(store.set_is_member("users", "bob").await.unwrap());

        assert!(store.set_remove("users", "bob").await.unwrap());
        assert!(!store.set_remove("users", "bob").await.unwrap());
        assert!(!store.set_is_member("users", "bob").await.unwrap());
    }

    #[tokio::test]
    async fn random_member_of_empty_set() {
        let store = InMemoryKvStore::new();
        assert_eq!(store.set_random_member("posts").await.unwrap(), None);
    }

    #[tokio::test]
    async fn random_member_is_a_member() {
        let store = InMemoryKvStore::new();
        for id in ["0", "1", "2"] {
            store.set_add("posts", id).await.unwrap();
        }
        let picked = store.set_random_member("posts").await.unwrap().unwrap();
        assert!(["0", "1", "2"].contains(&picked.as_str()));
    }

    #[tokio::test]
    async fn removing_last_member_removes_key() {
        let store = InMemoryKvStore::new();
        store.set_add("posts", "0").await.unwrap();
        store.set_remove("posts", "0").await.unwrap();
        assert!(store.is_empty());
    }

    // -----------------------------------------------------------------------
    // Atomic batches
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn batch_applies_all_commands() {
        let store = InMemoryKvStore::new();
        let batch = Batch::new()
            .set_with_ttl("token_t", "alice", DAY)
            .set_add("user_tokens_alice", "t")
            .hash_set("post_0", fields(&[("title", "Hello World")]))
            .set_add("posts", "0");
        store.execute_atomic(batch).await.unwrap();

        assert_eq!(
            store.keys(),
            ["post_0", "posts", "token_t", "user_tokens_alice"]
        );
        assert_eq!(store.ttl("token_t"), Some(DAY));
    }

    #[tokio::test]
    async fn failed_batch_leaves_no_trace() {
        let store = InMemoryKvStore::new();
        store.set_string("conflict", "string").await.unwrap();

        let batch = Batch::new()
            .set_add("users", "alice")
            .hash_set("user_alice", fields(&[("password", "h")]))
            .set_add("conflict", "boom");
        assert!(store.execute_atomic(batch).await.is_err());

        assert!(!store.set_is_member("users", "alice").await.unwrap());
        assert!(store.hash_get_all("user_alice").await.unwrap().is_empty());
        assert_eq!(store.keys(), ["conflict"]);
    }

    #[tokio::test]
    async fn batch_touching_same_key_twice() {
        let store = InMemoryKvStore::new();
        let batch = Batch::new()
            .set_add("user_posts_alice", "0")
            .set_add("user_posts_alice", "1")
            .set_remove("user_posts_alice", "0");
        store.execute_atomic(batch).await.unwrap();
        assert_eq!(store.set_members("user_posts_alice").await.unwrap(), ["1"]);
    }

    #[tokio::test]
    async fn batch_delete_and_hash_delete() {
        let store = InMemoryKvStore::new();
        store
            .hash_set_fields("post_0", &fields(&[("title", "t")]))
            .await
            .unwrap();
        store.set_add("posts", "0").await.unwrap();

        let batch = Batch::new()
            .set_remove("posts", "0")
            .delete("post_0")
            .hash_delete("user_ghost", ["password"]);
        store.execute_atomic(batch).await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn server_time_follows_clock() {
        let store = InMemoryKvStore::with_clock(1_700_000_000);
        assert_eq!(store.server_time().await.unwrap(), 1_700_000_000);
        store.advance_clock(Duration::from_secs(5));
        assert_eq!(store.server_time().await.unwrap(), 1_700_000_005);
    }

    #[tokio::test]
    async fn default_store_follows_wall_clock() {
        let store = InMemoryKvStore::new();
        let t0 = store.server_time().await.unwrap();
        assert!((t0 - chrono::Utc::now().timestamp()).abs() <= 1);

        tokio::time::sleep(Duration::from_millis(1_100)).await;
        let t1 = store.server_time().await.unwrap();
        assert!(t1 > t0, "t0={t0} t1={t1}");

        store.advance_clock(Duration::from_secs(60));
        assert!(store.server_time().await.unwrap() >= t1 + 60);
    }

    #[tokio::test]
    async fn default_store_expires_in_real_time() {
        let store = InMemoryKvStore::new();
        store
            .execute_atomic(Batch::new().set_with_ttl("token_x", "alice", Duration::from_secs(2)))
            .await
            .unwrap();
        assert_eq!(store.get_string("token_x").await.unwrap().as_deref(), Some("alice"));

        tokio::time::sleep(Duration::from_millis(3_100)).await;
        assert_eq!(store.get_string("token_x").await.unwrap(), None);
    }

    #[tokio::test]
    async fn shared_across_tasks() {
        let store = std::sync::Arc::new(InMemoryKvStore::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.increment("LAST_POST_ID").await.unwrap()
            }));
        }
        let mut ids = Vec::new();
        for h in handles {
            ids.push(h.await.unwrap());
        }
        ids.sort();
        assert_eq!(ids, (1..=8).collect::<Vec<i64>>());
    }
}
