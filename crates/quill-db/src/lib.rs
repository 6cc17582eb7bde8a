//! The Quill repository.
//!
//! [`Database`] maps the three Quill entities onto a flat key-value store:
//!
//! ```text
//! LAST_POST_ID            → integer counter, starts at -1
//! users                   → set of usernames
//! user_<name>             → hash { password, salt }
//! token_<token>           → username, expires after 24h
//! user_tokens_<name>      → set of tokens issued to <name>
//! posts                   → set of post ids
//! post_<id>               → hash { title, body, author, last_updated }
//! user_posts_<name>       → set of post ids written by <name>
//! ```
//!
//! Every mutation that touches more than one key goes through a single
//! atomic batch, so readers never observe a post that is in `posts` but has
//! no hash, or a user hash without its `users` entry.
//!
//! # Known limitations
//!
//! - `create_user` checks membership and then writes in a second round-trip.
//!   Two concurrent registrations of the same name can both succeed.
//! - `remove_user` removes posts one batch at a time. A failure part way
//!   through leaves the already removed posts removed.
//! - `update_post` checks `posts` and then writes the hash in a second
//!   round-trip. A `remove_post` landing in between leaves a `post_<id>` hash
//!   without an author that is not listed in `posts`; reading it reports
//!   [`DbError::Corrupt`].
//! - Token sets are cleaned lazily and may hold expired tokens in between.

pub mod database;
pub mod error;
pub mod keys;
mod posts;
mod tokens;
mod users;

pub use database::{Database, DEFAULT_TOKEN_TTL};
pub use error::{DbError, DbResult};
