//! Repository implementations for database access
//!
//! Each repository follows these patterns:
//! - Expanded reads load relations with one JOIN each (no N+1)
//! - Uniqueness is left to constraints, violations are classified
//! - Entity write + relationship sync share one transaction

pub mod error;
pub mod links;
pub mod promoter_groups;
pub mod promoters;
pub mod skills;

use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool};

pub use error::DbError;
pub use links::{LinkTable, SyncPlan};
pub use promoter_groups::{PromoterGroup, PromoterGroupRepo, PromoterGroupView};
pub use promoters::{Promoter, PromoterRepo, PromoterView};
pub use skills::{Skill, SkillRepo, SkillView};

/// A table row addressable by its numeric id
pub trait Resource: for<'r> FromRow<'r, PgRow> + Send + Unpin {
    /// Name used in not-found messages
    const NAME: &'static str;
    /// Backing table
    const TABLE: &'static str;
}

/// Fetch one row by id, without relations.
pub async fn find<T: Resource>(pool: &PgPool, id: i64) -> Result<T, DbError> {
    let sql = format!("SELECT * FROM {} WHERE id = $1", T::TABLE);
    sqlx::query_as::<_, T>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DbError::not_found(T::NAME, id))
}
