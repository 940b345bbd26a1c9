//! Skill repository

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgConnection, PgPool};

use super::links::{self, SKILL_GROUPS, SKILL_PROMOTERS};
use super::{DbError, Promoter, PromoterGroup, Resource};
use crate::models::SkillDraft;

/// Skill record from database
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Skill {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource for Skill {
    const NAME: &'static str = "skill";
    const TABLE: &'static str = "skills";
}

/// Skill with the promoters and groups holding it
#[derive(Debug, Clone, Serialize)]
pub struct SkillView {
    #[serde(flatten)]
    pub skill: Skill,
    pub promoters: Vec<Promoter>,
    pub promoter_groups: Vec<PromoterGroup>,
}

async fn expand(
    conn: &mut PgConnection,
    skills: Vec<Skill>,
) -> Result<Vec<SkillView>, DbError> {
    let ids: Vec<i64> = skills.iter().map(|s| s.id).collect();
    let mut promoters: HashMap<i64, Vec<Promoter>> =
        links::load_related(&mut *conn, SKILL_PROMOTERS, &ids).await?;
    let mut groups: HashMap<i64, Vec<PromoterGroup>> =
        links::load_related(&mut *conn, SKILL_GROUPS, &ids).await?;

    Ok(skills
        .into_iter()
        .map(|skill| SkillView {
            promoters: promoters.remove(&skill.id).unwrap_or_default(),
            promoter_groups: groups.remove(&skill.id).unwrap_or_default(),
            skill,
        })
        .collect())
}

async fn expand_one(conn: &mut PgConnection, skill: Skill) -> Result<SkillView, DbError> {
    let id = skill.id;
    expand(conn, vec![skill])
        .await?
        .pop()
        .ok_or_else(|| DbError::not_found(Skill::NAME, id))
}

/// Skill repository
pub struct SkillRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> SkillRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<SkillView>, DbError> {
        let mut conn = self.pool.acquire().await?;
        let skills: Vec<Skill> = sqlx::query_as("SELECT * FROM skills ORDER BY id")
            .fetch_all(&mut *conn)
            .await?;
        expand(&mut conn, skills).await
    }

    pub async fn get(&self, id: i64) -> Result<SkillView, DbError> {
        let mut conn = self.pool.acquire().await?;
        let skill: Skill = sqlx::query_as("SELECT * FROM skills WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| DbError::not_found(Skill::NAME, id))?;
        expand_one(&mut conn, skill).await
    }

    /// Create a skill and link the listed promoter groups (atomic).
    pub async fn create(&self, draft: SkillDraft) -> Result<SkillView, DbError> {
        if let Some(errors) = draft.settled_errors() {
            return Err(errors.clone().into());
        }
        let mut tx = self.pool.begin().await?;

        let references =
            links::unknown_references(&mut tx, &[(SKILL_GROUPS, draft.promoter_group_ids.as_ref())])
                .await?;
        let input = draft.finish(references)?;

        let skill: Skill = sqlx::query_as(
            r#"
            INSERT INTO skills (name, description)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(&input.details.name)
        .bind(input.details.description.as_deref())
        .fetch_one(&mut *tx)
        .await?;

        links::sync_if_present(&mut tx, SKILL_GROUPS, skill.id, input.promoter_group_ids.as_ref())
            .await?;

        let view = expand_one(&mut tx, skill).await?;
        tx.commit().await?;

        tracing::debug!(skill_id = view.skill.id, "Created skill");
        Ok(view)
    }

    /// Replace name and description; sync groups only if the list was sent.
    pub async fn update(&self, id: i64, draft: SkillDraft) -> Result<SkillView, DbError> {
        if let Some(errors) = draft.settled_errors() {
            return Err(errors.clone().into());
        }
        let mut tx = self.pool.begin().await?;

        let references =
            links::unknown_references(&mut tx, &[(SKILL_GROUPS, draft.promoter_group_ids.as_ref())])
                .await?;
        let input = draft.finish(references)?;

        let skill: Skill = sqlx::query_as(
            r#"
            UPDATE skills
            SET name = $2, description = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.details.name)
        .bind(input.details.description.as_deref())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found(Skill::NAME, id))?;

        links::sync_if_present(&mut tx, SKILL_GROUPS, id, input.promoter_group_ids.as_ref())
            .await?;

        let view = expand_one(&mut tx, skill).await?;
        tx.commit().await?;

        tracing::debug!(skill_id = id, "Updated skill");
        Ok(view)
    }

    /// Delete a skill; its promoter and group links cascade.
    pub async fn delete(&self, id: i64) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM skills WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(Skill::NAME, id));
        }
        tracing::debug!(skill_id = id, "Deleted skill");
        Ok(())
    }
}
