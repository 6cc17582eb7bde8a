use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("'{field}' needs to be between {min} and {max} characters")]
    FieldLength {
        field: &'static str,
        min: usize,
        max: usize,
    },

    #[error("invalid post id: {0}")]
    InvalidPostId(String),

    #[error("record is missing field '{0}'")]
    MissingField(&'static str),

    #[error("field '{field}' has invalid value: {value}")]
    InvalidField { field: &'static str, value: String },
}
