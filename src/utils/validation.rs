//! Input validation primitives.
//!
//! Provides ergonomic helpers for common validation patterns:
//! - Validating non-empty strings and collections
//! - Validating task slugs
//!
//! These replace verbose ok_or_else + Error::validation_invalid_argument chains.

use crate::error::{Error, Result};
use regex::Regex;
use std::sync::LazyLock;

/// Require a string to be non-empty after trimming.
///
/// Returns a reference to the trimmed string on success.
pub fn require_non_empty<'a>(value: &'a str, field: &str, message: &str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(Error::validation_invalid_argument(field, message, None, None))
    } else {
        Ok(trimmed)
    }
}

/// Require a collection to be non-empty.
pub fn require_non_empty_vec<'a, T>(vec: &'a [T], field: &str, message: &str) -> Result<&'a [T]> {
    if vec.is_empty() {
        Err(Error::validation_invalid_argument(field, message, None, None))
    } else {
        Ok(vec)
    }
}

static SLUG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9:._-]*$").unwrap());

/// Require a task slug: trimmed, starting with a letter or digit, and made of
/// letters, digits, `:`, `.`, `_` or `-`.
pub fn require_slug<'a>(value: &'a str, field: &str) -> Result<&'a str> {
    let slug = require_non_empty(value, field, "Task slug cannot be empty")?;
    if !SLUG_PATTERN.is_match(slug) {
        return Err(Error::validation_invalid_argument(
            field,
            "Task slug may only contain letters, digits, ':', '.', '_' and '-'",
            Some(slug.to_string()),
            None,
        ));
    }
    Ok(slug)
}
