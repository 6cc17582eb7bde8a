//! HTTP server for Quill.
//!
//! Exposes user registration, login and blog post endpoints over axum.
//! Requests carry url-encoded forms; every response is a JSON object with a
//! `success` flag, and failures add a `message`.

pub mod auth;
pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod state;
pub mod validation;

pub use auth::{check_author, Authenticator};
pub use config::ServerConfig;
pub use error::{ApiError, ApiResult, ServerError, ServerResult};
pub use server::QuillServer;
pub use state::AppState;
