//! Data-layer error type

use crate::db::migrations::{
    GROUP_SKILL_GROUP_FK, GROUP_SKILL_SKILL_FK, PROMOTERS_EMAIL_UNIQUE,
    PROMOTER_GROUP_PROMOTER_FK, PROMOTER_SKILL_PAIR_UNIQUE, PROMOTER_SKILL_SKILL_FK,
};
use crate::models::{ValidationError, ValidationErrors};

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(sqlx::Error),

    #[error("{resource} {id} not found")]
    NotFound { resource: &'static str, id: String },

    /// Write rejected by a reference check or a constraint
    #[error("invalid input: {0}")]
    Invalid(ValidationErrors),
}

impl DbError {
    pub fn not_found(resource: &'static str, id: i64) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }
}

/// Request field blamed for a violation of the named constraint.
fn constraint_field(constraint: &str) -> Option<&'static str> {
    match constraint {
        PROMOTERS_EMAIL_UNIQUE => Some("email"),
        PROMOTER_SKILL_PAIR_UNIQUE | PROMOTER_SKILL_SKILL_FK => Some("skill_id"),
        GROUP_SKILL_SKILL_FK => Some("skill_ids"),
        GROUP_SKILL_GROUP_FK => Some("promoter_group_ids"),
        PROMOTER_GROUP_PROMOTER_FK => Some("promoter_ids"),
        _ => None,
    }
}

impl From<sqlx::Error> for DbError {
    fn from(e: sqlx::Error) -> Self {
        let classified = match &e {
            sqlx::Error::Database(db) => db
                .constraint()
                .and_then(constraint_field)
                .and_then(|field| {
                    if db.is_unique_violation() {
                        Some(ValidationError::Taken { field })
                    } else if db.is_foreign_key_violation() {
                        Some(ValidationError::InvalidFormat {
                            field,
                            reason: "references a row that does not exist",
                        })
                    } else {
                        None
                    }
                }),
            _ => None,
        };

        match classified {
            Some(error) => Self::Invalid(error.into()),
            None => Self::Sqlx(e),
        }
    }
}

impl From<ValidationErrors> for DbError {
    fn from(e: ValidationErrors) -> Self {
        Self::Invalid(e)
    }
}
