//! Request field checks.
//!
//! Everything here is pure: no store access, no hashing. Handlers run these
//! before resolving tokens or touching the database.

use std::collections::HashMap;

use quill_db::keys;
use quill_types::{FieldLimit, PostId};

use crate::error::{ApiError, ApiResult, POST_NOT_FOUND};

/// Pull the named fields out of a decoded form, failing on the first absent one.
pub fn required_params<'a, const N: usize>(
    form: &'a HashMap<String, String>,
    names: [&'static str; N],
) -> ApiResult<[&'a str; N]> {
    let mut values = [""; N];
    for (slot, name) in values.iter_mut().zip(names) {
        *slot = form
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| ApiError::MissingParameter(name.to_string()))?;
    }
    Ok(values)
}

pub fn validate_username(username: &str) -> ApiResult<()> {
    FieldLimit::USERNAME.check(username)?;
    // `user_<name>` would alias another user's token or post set.
    if keys::is_reserved_username(username) {
        return Err(ApiError::Validation {
            field: FieldLimit::USERNAME.field,
            reason: "'username' uses a reserved prefix.".into(),
        });
    }
    Ok(())
}

pub fn validate_password(password: &str) -> ApiResult<()> {
    Ok(FieldLimit::PASSWORD.check(password)?)
}

pub fn validate_new_password(password: &str) -> ApiResult<()> {
    Ok(FieldLimit::PASSWORD.renamed("newPassword").check(password)?)
}

pub fn validate_title(title: &str) -> ApiResult<()> {
    Ok(FieldLimit::TITLE.check(title)?)
}

pub fn validate_body(body: &str) -> ApiResult<()> {
    Ok(FieldLimit::BODY.check(body)?)
}

/// Parse a post id. Anything but the canonical decimal form cannot name
/// an existing post, so it is reported as not found.
pub fn parse_post_id(raw: &str) -> ApiResult<PostId> {
    raw.parse()
        .map_err(|_| ApiError::NotFound(POST_NOT_FOUND.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn form(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn required_params_in_order() {
        let f = form(&[("password", "secret1"), ("username", "alice")]);
        let [username, password] = required_params(&f, ["username", "password"]).unwrap();
        assert_eq!(username, "alice");
        assert_eq!(password, "secret1");
    }

    #[test]
    fn first_missing_param_is_reported() {
        let f = form(&[("token", "t")]);
        let err = required_params(&f, ["token", "title", "body"]).unwrap_err();
        assert_eq!(err.to_string(), "Missing 'title' argument.");
    }

    #[test]
    fn empty_value_counts_as_present() {
        let f = form(&[("username", "")]);
        assert!(required_params(&f, ["username"]).is_ok());
        assert!(validate_username("").is_err());
    }

    #[test]
    fn username_rules() {
        assert!(validate_username("bob").is_ok());
        assert!(validate_username("bo").is_err());
        assert!(validate_username(&"x".repeat(21)).is_err());
        assert!(validate_username("tokens_bob").is_err());
        assert!(validate_username("posts_bob").is_err());
    }

    #[test]
    fn new_password_reports_its_own_name() {
        let err = validate_new_password("short").unwrap_err();
        assert!(matches!(err, ApiError::Validation { field: "newPassword", .. }));
        assert_eq!(
            err.to_string(),
            "'newPassword' needs to be between 6 and 20 characters."
        );
    }

    #[test]
    fn title_and_body_boundaries() {
        assert!(validate_title("Hello").is_ok());
        assert!(validate_title("Hell").is_err());
        assert!(validate_title(&"t".repeat(100)).is_ok());
        assert!(validate_title(&"t".repeat(101)).is_err());
        assert!(validate_body("0123456789").is_ok());
        assert!(validate_body("012345678").is_err());
        assert!(validate_body(&"b".repeat(10_000)).is_ok());
        assert!(validate_body(&"b".repeat(10_001)).is_err());
    }

    #[test]
    fn post_ids() {
        assert_eq!(parse_post_id("0").unwrap(), PostId::new(0));
        assert_eq!(parse_post_id("42").unwrap(), PostId::new(42));
        for bad in ["", "abc", "-1", "1.5", "00", "+0", " 0", "0 ", "042"] {
            assert!(matches!(parse_post_id(bad), Err(ApiError::NotFound(_))), "{bad}");
        }
    }

    proptest! {
        #[test]
        fn password_length_decides(len in 0usize..40) {
            let password = "p".repeat(len);
            prop_assert_eq!(validate_password(&password).is_ok(), (6..=20).contains(&len));
        }

        #[test]
        fn numeric_ids_parse(id in any::<u64>()) {
            prop_assert_eq!(parse_post_id(&id.to_string()).unwrap(), PostId::new(id));
        }
    }
}
