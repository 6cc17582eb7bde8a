//! Key-value store access for Quill.
//!
//! Quill keeps all of its state in a flat key-value service offering string,
//! hash and set values, key expiry, and atomic multi-command batches. This
//! crate defines that contract and provides two backends.
//!
//! # Storage Backends
//!
//! All backends implement the [`KeyValueStore`] trait:
//!
//! - [`InMemoryKvStore`] -- `HashMap`-based store for tests and `--memory` mode
//! - [`RedisKvStore`] -- Redis over a multiplexed, auto-reconnecting connection
//!
//! # Design Rules
//!
//! 1. Reads of an expired key behave exactly like reads of a missing key.
//! 2. A [`Batch`] commits as one unit relative to other clients.
//! 3. Emptying a hash or a set removes the key, as Redis does.
//! 4. Every backend failure is propagated as [`StoreError`]; nothing retries.

pub mod command;
pub mod error;
pub mod memory;
pub mod redis_store;
pub mod traits;

pub use command::{Batch, Command};
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryKvStore;
pub use redis_store::RedisKvStore;
pub use traits::KeyValueStore;
