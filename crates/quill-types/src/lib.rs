//! Domain types for Quill, a small blogging API backed by a key-value store.
//!
//! Every other Quill crate depends on `quill-types`. The records here are the
//! decoded forms of the hash records the repository keeps in the store.
//!
//! # Key Types
//!
//! - [`UserRecord`] — a registered account (password hash and salt)
//! - [`PostRecord`] — a blog post with its author and last update time
//! - [`PostId`] — monotonically increasing post identifier
//! - [`FieldLimit`] — inclusive character-count bounds for request fields

pub mod error;
pub mod limits;
pub mod post;
pub mod user;

pub use error::TypeError;
pub use limits::FieldLimit;
pub use post::{PostId, PostRecord};
pub use user::UserRecord;
