use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

pub const FIELD_TITLE: &str = "title";
pub const FIELD_BODY: &str = "body";
pub const FIELD_AUTHOR: &str = "author";
pub const FIELD_LAST_UPDATED: &str = "last_updated";

/// Identifier of a blog post.
///
/// Ids come from an atomic counter that starts at -1, so the first post is
/// id 0 and later posts are strictly increasing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(u64);

impl PostId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PostId {
    type Err = TypeError;

    /// Only the canonical decimal form is accepted, the one `Display` writes
    /// and the store keys use: `"0"`, `"17"`, but not `"017"`, `"+17"` or `" 17"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TypeError::InvalidPostId(s.to_string());
        let canonical = !s.is_empty()
            && s.bytes().all(|b| b.is_ascii_digit())
            && (s == "0" || !s.starts_with('0'));
        if !canonical {
            return Err(invalid());
        }
        s.parse::<u64>().map(Self).map_err(|_| invalid())
    }
}

impl TryFrom<i64> for PostId {
    type Error = TypeError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u64::try_from(value)
            .map(Self)
            .map_err(|_| TypeError::InvalidPostId(value.to_string()))
    }
}

/// A blog post as stored in `post_<id>`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRecord {
    #[serde(skip)]
    pub id: PostId,
    pub title: String,
    pub body: String,
    pub author: String,
    /// Store server time of the last write, seconds since the Unix epoch.
    pub last_updated: i64,
}

impl PostRecord {
    /// Decode a post from the fields of its store hash.
    pub fn from_fields(id: PostId, fields: &HashMap<String, String>) -> Result<Self, TypeError> {
        let get = |name: &'static str| {
            fields
                .get(name)
                .cloned()
                .ok_or(TypeError::MissingField(name))
        };
        let raw_time = get(FIELD_LAST_UPDATED)?;
        let last_updated = raw_time.parse::<i64>().map_err(|_| TypeError::InvalidField {
            field: FIELD_LAST_UPDATED,
            value: raw_time.clone(),
        })?;

        Ok(Self {
            id,
            title: get(FIELD_TITLE)?,
            body: get(FIELD_BODY)?,
            author: get(FIELD_AUTHOR)?,
            last_updated,
        })
    }

    /// Hash fields in the order they are written.
    pub fn to_fields(&self) -> Vec<(String, String)> {
        vec![
            (FIELD_TITLE.to_string(), self.title.clone()),
            (FIELD_BODY.to_string(), self.body.clone()),
            (FIELD_AUTHOR.to_string(), self.author.clone()),
            (FIELD_LAST_UPDATED.to_string(), self.last_updated.to_string()),
        ]
    }

    /// Returns `true` if `username` wrote this post.
    pub fn is_authored_by(&self, username: &str) -> bool {
        self.author == username
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PostRecord {
        PostRecord {
            id: PostId::new(3),
            title: "Hello World".into(),
            body: "This is a test body.".into(),
            author: "alice".into(),
            last_updated: 1_700_000_000,
        }
    }

    #[test]
    fn post_id_parses_and_displays() {
        let id: PostId = "42".parse().unwrap();
        assert_eq!(id, PostId::new(42));
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn post_id_only_canonical_form() {
        assert_eq!("0".parse::<PostId>().unwrap(), PostId::new(0));
        assert_eq!("10".parse::<PostId>().unwrap(), PostId::new(10));
        for alias in ["00", "007", "+0", "+7", " 0", "0 ", "\t1", ""] {
            assert!(alias.parse::<PostId>().is_err(), "{alias:?} should be rejected");
        }
    }

    #[test]
    fn post_id_rejects_garbage() {
        assert!("abc".parse::<PostId>().is_err());
        assert!("-1".parse::<PostId>().is_err());
        assert!("99999999999999999999".parse::<PostId>().is_err());
        assert!(PostId::try_from(-1i64).is_err());
        assert_eq!(PostId::try_from(0i64).unwrap(), PostId::new(0));
    }

    #[test]
    fn fields_roundtrip() {
        let post = sample();
        let fields: HashMap<String, String> = post.to_fields().into_iter().collect();
        let decoded = PostRecord::from_fields(post.id, &fields).unwrap();
        assert_eq!(decoded, post);
    }

    #[test]
    fn bad_timestamp_is_rejected() {
        let mut fields: HashMap<String, String> = sample().to_fields().into_iter().collect();
        fields.insert(FIELD_LAST_UPDATED.into(), "yesterday".into());
        let err = PostRecord::from_fields(PostId::new(3), &fields).unwrap_err();
        assert!(matches!(err, TypeError::InvalidField { field: "last_updated", .. }));
    }

    #[test]
    fn json_shape_omits_id() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["title"], "Hello World");
        assert_eq!(json["author"], "alice");
        assert_eq!(json["last_updated"], 1_700_000_000);
        assert!(json.get("id").is_none());
    }

    #[test]
    fn authorship() {
        let post = sample();
        assert!(post.is_authored_by("alice"));
        assert!(!post.is_authored_by("Alice"));
        assert!(!post.is_authored_by("bob"));
    }
}
