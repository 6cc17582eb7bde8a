/// Errors from key-value store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A command was applied to a key holding a different kind of value.
    #[error("WRONGTYPE operation against key '{key}' holding the wrong kind of value")]
    WrongType { key: String },

    /// `INCR` on a value that is not a 64-bit integer.
    #[error("value at '{key}' is not an integer or out of range")]
    NotAnInteger { key: String },

    /// The connection URL could not be used.
    #[error("invalid store URL: {0}")]
    InvalidUrl(String),

    /// Connection or protocol failure reported by Redis.
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// An in-process lock was poisoned by a panicking writer.
    #[error("store lock poisoned: {0}")]
    LockPoisoned(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
