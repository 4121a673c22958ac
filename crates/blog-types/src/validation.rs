//! Field limits and text validation for blog records.
//!
//! Lengths are counted in characters, not bytes, so a 100-character
//! category name in any script is accepted.

use chrono::{DateTime, Datelike, Utc};
use thiserror::Error;

/// Maximum length of a category or tag name.
pub const MAX_NAME_LEN: usize = 100;
/// Maximum length of a post title.
pub const MAX_TITLE_LEN: usize = 70;
/// Maximum length of a post excerpt.
pub const MAX_EXCERPT_LEN: usize = 200;
/// Maximum length of an author username.
pub const MAX_USERNAME_LEN: usize = 150;

/// Reasons a write is refused before it reaches storage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required text field is empty or whitespace only.
    #[error("{field} must not be empty")]
    Empty {
        /// The offending field.
        field: &'static str,
    },

    /// A bounded text field exceeds its limit.
    #[error("{field} is {actual} characters long, the limit is {max}")]
    TooLong {
        /// The offending field.
        field: &'static str,
        /// The limit in characters.
        max: usize,
        /// The submitted length in characters.
        actual: usize,
    },

    /// The referenced category does not exist.
    #[error("category {0} does not exist")]
    MissingCategory(i64),

    /// The referenced author does not exist.
    #[error("author {0} does not exist")]
    MissingAuthor(i64),

    /// A referenced tag does not exist.
    #[error("tag {0} does not exist")]
    MissingTag(i64),

    /// A supplied timestamp falls outside years 0000 through 9999.
    #[error("timestamp {0} is outside the years 0000 to 9999")]
    TimestampOutOfRange(DateTime<Utc>),
}

fn check_len(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    let actual = value.chars().count();
    if actual > max {
        return Err(ValidationError::TooLong { field, max, actual });
    }
    Ok(())
}

fn required_trimmed<'a>(
    field: &'static str,
    value: &'a str,
    max: usize,
) -> Result<&'a str, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    check_len(field, trimmed, max)?;
    Ok(trimmed)
}

/// Validates a category or tag name and returns it trimmed.
pub fn validate_name<'a>(field: &'static str, name: &'a str) -> Result<&'a str, ValidationError> {
    required_trimmed(field, name, MAX_NAME_LEN)
}

/// Validates a post title and returns it trimmed.
pub fn validate_title(title: &str) -> Result<&str, ValidationError> {
    required_trimmed("title", title, MAX_TITLE_LEN)
}

/// Validates an author username and returns it trimmed.
pub fn validate_username(username: &str) -> Result<&str, ValidationError> {
    required_trimmed("username", username, MAX_USERNAME_LEN)
}

/// Validates a post body. The body is unbounded but must not be blank.
pub fn validate_body(body: &str) -> Result<(), ValidationError> {
    if body.trim().is_empty() {
        return Err(ValidationError::Empty { field: "body" });
    }
    Ok(())
}

/// Validates an optional excerpt, returning the value to store.
///
/// A missing excerpt becomes the empty string.
pub fn validate_excerpt(excerpt: Option<&str>) -> Result<String, ValidationError> {
    let excerpt = excerpt.unwrap_or_default();
    check_len("excerpt", excerpt, MAX_EXCERPT_LEN)?;
    Ok(excerpt.to_string())
}

/// Validates a caller-supplied creation time.
///
/// Stored timestamps are four-digit-year RFC 3339 text, so only years
/// 0000 through 9999 can be written and read back in order.
pub fn validate_created_time(at: DateTime<Utc>) -> Result<DateTime<Utc>, ValidationError> {
    if !(0..=9999).contains(&at.year()) {
        return Err(ValidationError::TimestampOutOfRange(at));
    }
    Ok(at)
}
