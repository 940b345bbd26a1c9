//! Field-level rules shared by all request payloads
//!
//! Inputs are trimmed and blank strings count as absent before any rule runs.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use super::ValidationError;

/// Maximum length for names, emails and addresses
pub const MAX_TEXT_LEN: usize = 255;

/// Maximum length for group and skill descriptions
pub const MAX_DESCRIPTION_LEN: usize = 1000;

/// Maximum length for phone numbers
pub const MAX_PHONE_LEN: usize = 20;

/// local@domain.tld, no whitespace, exactly one `@`
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("invalid email regex")
});

/// Trim and drop blank values.
pub fn normalize(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_owned())
        }
    })
}

fn check_len(field: &'static str, value: String, max: usize) -> Result<String, ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(value)
}

/// Required, non-blank text of at most `max` characters.
pub fn required_text(
    field: &'static str,
    value: Option<String>,
    max: usize,
) -> Result<String, ValidationError> {
    let value = normalize(value).ok_or(ValidationError::Required { field })?;
    check_len(field, value, max)
}

/// Optional text of at most `max` characters. Blank becomes `None`.
pub fn optional_text(
    field: &'static str,
    value: Option<String>,
    max: usize,
) -> Result<Option<String>, ValidationError> {
    normalize(value)
        .map(|v| check_len(field, v, max))
        .transpose()
}

/// Required email address.
pub fn email(value: Option<String>) -> Result<String, ValidationError> {
    let value = required_text("email", value, MAX_TEXT_LEN)?;
    if !EMAIL_RE.is_match(&value) {
        return Err(ValidationError::InvalidFormat {
            field: "email",
            reason: "must be a valid email address",
        });
    }
    Ok(value)
}

/// Required `YYYY-MM-DD` date strictly before `today`.
pub fn date_before(
    field: &'static str,
    value: Option<String>,
    today: NaiveDate,
) -> Result<NaiveDate, ValidationError> {
    let raw = normalize(value).ok_or(ValidationError::Required { field })?;
    let date = NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|_| {
        ValidationError::InvalidFormat {
            field,
            reason: "must be a valid date (YYYY-MM-DD)",
        }
    })?;
    if date >= today {
        return Err(ValidationError::NotBefore { field, limit: today });
    }
    Ok(date)
}
