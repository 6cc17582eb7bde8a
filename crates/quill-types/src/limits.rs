//! Inclusive length bounds for request fields.
//!
//! Lengths are counted in characters (Unicode scalar values), not bytes, so a
//! username of three accented letters is as valid as `"bob"`.

use crate::error::TypeError;

/// Inclusive character-count bounds for a named field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldLimit {
    pub field: &'static str,
    pub min: usize,
    pub max: usize,
}

impl FieldLimit {
    pub const USERNAME: Self = Self::new("username", 3, 20);
    pub const PASSWORD: Self = Self::new("password", 6, 20);
    pub const TITLE: Self = Self::new("title", 5, 100);
    pub const BODY: Self = Self::new("body", 10, 10_000);

    pub const fn new(field: &'static str, min: usize, max: usize) -> Self {
        Self { field, min, max }
    }

    /// Same bounds reported under a different field name.
    pub const fn renamed(self, field: &'static str) -> Self {
        Self { field, ..self }
    }

    /// Check `value` against the bounds.
    pub fn check(&self, value: &str) -> Result<(), TypeError> {
        let len = value.chars().count();
        if len < self.min || len > self.max {
            return Err(TypeError::FieldLength {
                field: self.field,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}
