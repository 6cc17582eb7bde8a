use quill_store::StoreError;
use quill_types::{PostId, TypeError};
use thiserror::Error;

/// Errors from repository operations.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("user already exists: {0}")]
    UserAlreadyExists(String),

    #[error("token not found or expired")]
    TokenNotFound,

    #[error("post not found: {0}")]
    PostNotFound(PostId),

    /// A stored record could not be decoded.
    #[error("corrupt record at '{key}': {source}")]
    Corrupt {
        key: String,
        #[source]
        source: TypeError,
    },

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl DbError {
    pub(crate) fn corrupt(key: impl Into<String>, source: TypeError) -> Self {
        Self::Corrupt {
            key: key.into(),
            source,
        }
    }

    /// Returns `true` for the "missing entity" variants.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::UserNotFound(_) | Self::TokenNotFound | Self::PostNotFound(_)
        )
    }
}

/// Result alias for repository operations.
pub type DbResult<T> = Result<T, DbError>;
