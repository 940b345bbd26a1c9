//! Promoter repository
//!
//! - create/update: single statement, email uniqueness from the constraint
//! - delete: join rows go with the promoter through ON DELETE CASCADE
//! - attach_skill: additive, a repeated pair is rejected

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgConnection, PgPool};

use super::links::{self, PROMOTER_GROUPS, PROMOTER_SKILLS};
use super::{DbError, PromoterGroup, Resource, Skill};
use crate::models::{Gender, NewPromoter};

/// Promoter record from database
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Promoter {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub birthday_date: NaiveDate,
    #[sqlx(try_from = "String")]
    pub gender: Gender,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub availabilities: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource for Promoter {
    const NAME: &'static str = "promoter";
    const TABLE: &'static str = "promoters";
}

/// Promoter with its groups and skills
#[derive(Debug, Clone, Serialize)]
pub struct PromoterView {
    #[serde(flatten)]
    pub promoter: Promoter,
    pub promoter_groups: Vec<PromoterGroup>,
    pub skills: Vec<Skill>,
}

/// Attach groups and skills to each promoter, two queries total.
async fn expand(
    conn: &mut PgConnection,
    promoters: Vec<Promoter>,
) -> Result<Vec<PromoterView>, DbError> {
    let ids: Vec<i64> = promoters.iter().map(|p| p.id).collect();
    let mut groups: HashMap<i64, Vec<PromoterGroup>> =
        links::load_related(&mut *conn, PROMOTER_GROUPS, &ids).await?;
    let mut skills: HashMap<i64, Vec<Skill>> =
        links::load_related(&mut *conn, PROMOTER_SKILLS, &ids).await?;

    Ok(promoters
        .into_iter()
        .map(|promoter| PromoterView {
            promoter_groups: groups.remove(&promoter.id).unwrap_or_default(),
            skills: skills.remove(&promoter.id).unwrap_or_default(),
            promoter,
        })
        .collect())
}

async fn expand_one(
    conn: &mut PgConnection,
    promoter: Promoter,
) -> Result<PromoterView, DbError> {
    let id = promoter.id;
    expand(conn, vec![promoter])
        .await?
        .pop()
        .ok_or_else(|| DbError::not_found(Promoter::NAME, id))
}

/// Promoter repository
pub struct PromoterRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> PromoterRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All promoters with groups and skills, ordered by id.
    pub async fn list(&self) -> Result<Vec<PromoterView>, DbError> {
        let mut conn = self.pool.acquire().await?;
        let promoters: Vec<Promoter> = sqlx::query_as("SELECT * FROM promoters ORDER BY id")
            .fetch_all(&mut *conn)
            .await?;
        expand(&mut conn, promoters).await
    }

    /// One promoter with groups and skills.
    pub async fn get(&self, id: i64) -> Result<PromoterView, DbError> {
        let mut conn = self.pool.acquire().await?;
        let promoter: Promoter = sqlx::query_as("SELECT * FROM promoters WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| DbError::not_found(Promoter::NAME, id))?;
        expand_one(&mut conn, promoter).await
    }

    /// Insert a promoter. A taken email surfaces as `DbError::Invalid`.
    pub async fn create(&self, input: NewPromoter) -> Result<PromoterView, DbError> {
        let mut conn = self.pool.acquire().await?;
        let promoter: Promoter = sqlx::query_as(
            r#"
            INSERT INTO promoters
                (first_name, last_name, birthday_date, gender, email, phone, address, availabilities)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(input.birthday_date)
        .bind(input.gender.as_str())
        .bind(&input.email)
        .bind(input.phone.as_deref())
        .bind(input.address.as_deref())
        .bind(&input.availabilities)
        .fetch_one(&mut *conn)
        .await?;

        tracing::debug!(promoter_id = promoter.id, "Created promoter");
        expand_one(&mut conn, promoter).await
    }

    /// Replace every field of a promoter.
    ///
    /// The email constraint only compares against other rows, so keeping
    /// one's own address is never a conflict.
    pub async fn update(&self, id: i64, input: NewPromoter) -> Result<PromoterView, DbError> {
        let mut conn = self.pool.acquire().await?;
        let promoter: Promoter = sqlx::query_as(
            r#"
            UPDATE promoters SET
                first_name = $2,
                last_name = $3,
                birthday_date = $4,
                gender = $5,
                email = $6,
                phone = $7,
                address = $8,
                availabilities = $9,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(input.birthday_date)
        .bind(input.gender.as_str())
        .bind(&input.email)
        .bind(input.phone.as_deref())
        .bind(input.address.as_deref())
        .bind(&input.availabilities)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found(Promoter::NAME, id))?;

        tracing::debug!(promoter_id = id, "Updated promoter");
        expand_one(&mut conn, promoter).await
    }

    /// Delete a promoter and, in the same statement, its group and skill links.
    pub async fn delete(&self, id: i64) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM promoters WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(Promoter::NAME, id));
        }
        tracing::debug!(promoter_id = id, "Deleted promoter");
        Ok(())
    }

    /// Add one skill to a promoter without touching other links.
    ///
    /// Unknown skill is `NotFound`; a pair that already exists is
    /// `Invalid` under `skill_id`.
    pub async fn attach_skill(
        &self,
        promoter_id: i64,
        skill_id: i64,
    ) -> Result<PromoterView, DbError> {
        let mut tx = self.pool.begin().await?;

        // FOR SHARE keeps the promoter from being deleted under the insert
        let promoter: Promoter =
            sqlx::query_as("SELECT * FROM promoters WHERE id = $1 FOR SHARE")
                .bind(promoter_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| DbError::not_found(Promoter::NAME, promoter_id))?;

        let skill_exists: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM skills WHERE id = $1)")
                .bind(skill_id)
                .fetch_one(&mut *tx)
                .await?;
        if !skill_exists.0 {
            return Err(DbError::not_found(Skill::NAME, skill_id));
        }

        links::attach(&mut tx, PROMOTER_SKILLS, promoter_id, skill_id).await?;
        let view = expand_one(&mut tx, promoter).await?;
        tx.commit().await?;

        tracing::debug!(promoter_id, skill_id, "Attached skill to promoter");
        Ok(view)
    }
}
