//! Key naming for the persisted layout.
//!
//! These names are shared with existing deployments and must not change.

use quill_types::PostId;

/// Counter holding the id of the most recent post.
pub const LAST_POST_ID: &str = "LAST_POST_ID";
/// Value `LAST_POST_ID` is seeded with, so the first post gets id 0.
pub const LAST_POST_ID_SEED: &str = "-1";
/// Set of every username.
pub const USERS: &str = "users";
/// Set of every post id.
pub const POSTS: &str = "posts";

pub fn user(username: &str) -> String {
    format!("user_{username}")
}

pub fn token(token: &str) -> String {
    format!("token_{token}")
}

pub fn user_tokens(username: &str) -> String {
    format!("user_tokens_{username}")
}

pub fn post(id: PostId) -> String {
    format!("post_{id}")
}

pub fn user_posts(username: &str) -> String {
    format!("user_posts_{username}")
}

/// Usernames whose `user_<name>` key would land on another user's token or
/// post set.
pub fn is_reserved_username(username: &str) -> bool {
    username.starts_with("tokens_") || username.starts_with("posts_")
}
