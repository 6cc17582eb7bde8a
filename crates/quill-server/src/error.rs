use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use quill_db::DbError;
use quill_types::TypeError;
use serde_json::json;
use thiserror::Error;

/// Errors from building or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(#[from] quill_store::StoreError),

    #[error("database error: {0}")]
    Db(#[from] DbError),

    #[error("crypto error: {0}")]
    Crypto(#[from] quill_crypto::CryptoError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

/// A request failure, rendered as `{"success": false, "message": ...}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Arguments not properly url encoded.")]
    MalformedBody,

    #[error("Missing '{0}' argument.")]
    MissingParameter(String),

    #[error("{reason}")]
    Validation { field: &'static str, reason: String },

    #[error("Invalid password.")]
    WrongPassword,

    #[error("Invalid authentication 'token'.")]
    InvalidToken,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Invalid 'username' (already exists).")]
    UsernameTaken(String),

    #[error("{0}")]
    Store(String),

    #[error("{0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

pub(crate) const POST_NOT_FOUND: &str = "Didn't find the blog post.";

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MalformedBody
            | Self::MissingParameter(_)
            | Self::Validation { .. }
            | Self::WrongPassword => StatusCode::BAD_REQUEST,
            Self::InvalidToken | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden(_) | Self::UsernameTaken(_) => StatusCode::FORBIDDEN,
            Self::Store(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "success": false,
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::UserNotFound(_) => Self::NotFound("User not found.".into()),
            DbError::UserAlreadyExists(name) => Self::UsernameTaken(name),
            DbError::TokenNotFound => Self::InvalidToken,
            DbError::PostNotFound(_) => Self::NotFound(POST_NOT_FOUND.into()),
            DbError::Store(err) => {
                tracing::error!(error = %err, "store command failed");
                Self::Store("Store unavailable.".into())
            }
            err @ DbError::Corrupt { .. } => {
                tracing::error!(error = %err, "corrupt record");
                Self::Internal("Internal error.".into())
            }
        }
    }
}

impl From<TypeError> for ApiError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::FieldLength { field, .. } => Self::Validation {
                field,
                reason: format!("{err}."),
            },
            TypeError::InvalidPostId(_) => Self::NotFound(POST_NOT_FOUND.into()),
            other => Self::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_types::{FieldLimit, PostId};

    #[test]
    fn status_mapping() {
        assert_eq!(ApiError::MissingParameter("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::WrongPassword.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::InvalidToken.status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::Forbidden("no".into()).status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::UsernameTaken("a".into()).status(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError::Internal("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn db_errors_map_to_api_errors() {
        assert!(matches!(
            ApiError::from(DbError::UserAlreadyExists("alice".into())),
            ApiError::UsernameTaken(_)
        ));
        assert!(matches!(ApiError::from(DbError::TokenNotFound), ApiError::InvalidToken));
        assert!(matches!(
            ApiError::from(DbError::PostNotFound(PostId::new(1))),
            ApiError::NotFound(_)
        ));
        let store = quill_store::StoreError::WrongType { key: "k".into() };
        let mapped = ApiError::from(DbError::Store(store));
        assert!(matches!(mapped, ApiError::Store(_)));
        assert_eq!(mapped.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn validation_message() {
        let err = ApiError::from(FieldLimit::USERNAME.check("ab").unwrap_err());
        assert_eq!(err.to_string(), "'username' needs to be between 3 and 20 characters.");
        assert!(matches!(err, ApiError::Validation { field: "username", .. }));
    }

    #[test]
    fn missing_parameter_message() {
        assert_eq!(
            ApiError::MissingParameter("token".into()).to_string(),
            "Missing 'token' argument."
        );
    }
}
