//! Validation error types

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// A single field-level validation failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Field is missing or blank
    Required { field: &'static str },

    /// Field exceeds maximum length
    TooLong { field: &'static str, max: usize },

    /// String doesn't match required format (e.g., email)
    InvalidFormat { field: &'static str, reason: &'static str },

    /// Invalid enum variant
    InvalidVariant { field: &'static str, value: String },

    /// Date is not strictly before the given day
    NotBefore { field: &'static str, limit: chrono::NaiveDate },

    /// Referenced row does not exist
    UnknownReference { field: &'static str, id: i64 },

    /// Value collides with an existing row
    Taken { field: &'static str },

    /// Payload could not be decoded at all
    Malformed { field: &'static str, detail: String },
}

impl ValidationError {
    /// Name of the field this error is reported under.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Required { field }
            | Self::TooLong { field, .. }
            | Self::InvalidFormat { field, .. }
            | Self::InvalidVariant { field, .. }
            | Self::NotBefore { field, .. }
            | Self::UnknownReference { field, .. }
            | Self::Taken { field }
            | Self::Malformed { field, .. } => *field,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required { field } => write!(f, "{} is required", field),
            Self::TooLong { field, max } => {
                write!(f, "{} exceeds maximum length of {} characters", field, max)
            }
            Self::InvalidFormat { field, reason } => write!(f, "{}: {}", field, reason),
            Self::InvalidVariant { field, value } => {
                write!(f, "invalid {} value: '{}'", field, value)
            }
            Self::NotBefore { field, limit } => {
                write!(f, "{} must be a date before {}", field, limit)
            }
            Self::UnknownReference { field, id } => {
                write!(f, "{} references unknown id {}", field, id)
            }
            Self::Taken { field } => write!(f, "{} has already been taken", field),
            Self::Malformed { detail, .. } => f.write_str(detail),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Field-keyed collection of validation failures.
///
/// Keys are field names, or `field.index` for elements of a list field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error under its own field name.
    pub fn push(&mut self, error: ValidationError) {
        self.push_at(error.field().to_owned(), &error);
    }

    /// Record an error under an explicit key.
    pub fn push_at(&mut self, key: impl Into<String>, error: &ValidationError) {
        self.0.entry(key.into()).or_default().push(error.to_string());
    }

    /// Unwrap a field result, recording the error on failure.
    pub fn check<T>(&mut self, result: Result<T, ValidationError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.push(e);
                None
            }
        }
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        for (key, messages) in other.0 {
            self.0.entry(key).or_default().extend(messages);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.0.get(key).map(Vec::as_slice)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        let mut errors = Self::new();
        errors.push(error);
        errors
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (key, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{}: {}", key, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}
