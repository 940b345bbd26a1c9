//! Promoter group repository
//!
//! Writes run in one transaction: reference check, group row, then a sync
//! of each id list the payload carried. Field and reference errors are
//! reported together.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgConnection, PgPool};

use super::links::{self, GROUP_PROMOTERS, GROUP_SKILLS};
use super::{DbError, Promoter, Resource, Skill};
use crate::models::PromoterGroupDraft;

/// Promoter group record from database
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct PromoterGroup {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource for PromoterGroup {
    const NAME: &'static str = "promoter group";
    const TABLE: &'static str = "promoter_groups";
}

/// Promoter group with its promoters and skills
#[derive(Debug, Clone, Serialize)]
pub struct PromoterGroupView {
    #[serde(flatten)]
    pub group: PromoterGroup,
    pub promoters: Vec<Promoter>,
    pub skills: Vec<Skill>,
}

async fn expand(
    conn: &mut PgConnection,
    groups: Vec<PromoterGroup>,
) -> Result<Vec<PromoterGroupView>, DbError> {
    let ids: Vec<i64> = groups.iter().map(|g| g.id).collect();
    let mut promoters: HashMap<i64, Vec<Promoter>> =
        links::load_related(&mut *conn, GROUP_PROMOTERS, &ids).await?;
    let mut skills: HashMap<i64, Vec<Skill>> =
        links::load_related(&mut *conn, GROUP_SKILLS, &ids).await?;

    Ok(groups
        .into_iter()
        .map(|group| PromoterGroupView {
            promoters: promoters.remove(&group.id).unwrap_or_default(),
            skills: skills.remove(&group.id).unwrap_or_default(),
            group,
        })
        .collect())
}

async fn expand_one(
    conn: &mut PgConnection,
    group: PromoterGroup,
) -> Result<PromoterGroupView, DbError> {
    let id = group.id;
    expand(conn, vec![group])
        .await?
        .pop()
        .ok_or_else(|| DbError::not_found(PromoterGroup::NAME, id))
}

/// Promoter group repository
pub struct PromoterGroupRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> PromoterGroupRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<PromoterGroupView>, DbError> {
        let mut conn = self.pool.acquire().await?;
        let groups: Vec<PromoterGroup> =
            sqlx::query_as("SELECT * FROM promoter_groups ORDER BY id")
                .fetch_all(&mut *conn)
                .await?;
        expand(&mut conn, groups).await
    }

    pub async fn get(&self, id: i64) -> Result<PromoterGroupView, DbError> {
        let mut conn = self.pool.acquire().await?;
        let group: PromoterGroup = sqlx::query_as("SELECT * FROM promoter_groups WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| DbError::not_found(PromoterGroup::NAME, id))?;
        expand_one(&mut conn, group).await
    }

    /// Create a group and link the listed skills and promoters (atomic).
    pub async fn create(&self, draft: PromoterGroupDraft) -> Result<PromoterGroupView, DbError> {
        if let Some(errors) = draft.settled_errors() {
            return Err(errors.clone().into());
        }
        let mut tx = self.pool.begin().await?;

        let references = links::unknown_references(
            &mut tx,
            &[
                (GROUP_SKILLS, draft.skill_ids.as_ref()),
                (GROUP_PROMOTERS, draft.promoter_ids.as_ref()),
            ],
        )
        .await?;
        let input = draft.finish(references)?;

        let group: PromoterGroup = sqlx::query_as(
            r#"
            INSERT INTO promoter_groups (name, description)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(&input.details.name)
        .bind(input.details.description.as_deref())
        .fetch_one(&mut *tx)
        .await?;

        links::sync_if_present(&mut tx, GROUP_SKILLS, group.id, input.skill_ids.as_ref()).await?;
        links::sync_if_present(&mut tx, GROUP_PROMOTERS, group.id, input.promoter_ids.as_ref())
            .await?;

        let view = expand_one(&mut tx, group).await?;
        tx.commit().await?;

        tracing::debug!(promoter_group_id = view.group.id, "Created promoter group");
        Ok(view)
    }

    /// Replace name and description, then sync whichever id lists were sent.
    ///
    /// An omitted list leaves its links alone; an empty one clears them.
    pub async fn update(
        &self,
        id: i64,
        draft: PromoterGroupDraft,
    ) -> Result<PromoterGroupView, DbError> {
        if let Some(errors) = draft.settled_errors() {
            return Err(errors.clone().into());
        }
        let mut tx = self.pool.begin().await?;

        let references = links::unknown_references(
            &mut tx,
            &[
                (GROUP_SKILLS, draft.skill_ids.as_ref()),
                (GROUP_PROMOTERS, draft.promoter_ids.as_ref()),
            ],
        )
        .await?;
        let input = draft.finish(references)?;

        // Row lock taken here serializes concurrent syncs of this group
        let group: PromoterGroup = sqlx::query_as(
            r#"
            UPDATE promoter_groups
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
        .ok_or_else(|| DbError::not_found(PromoterGroup::NAME, id))?;

        links::sync_if_present(&mut tx, GROUP_SKILLS, id, input.skill_ids.as_ref()).await?;
        links::sync_if_present(&mut tx, GROUP_PROMOTERS, id, input.promoter_ids.as_ref()).await?;

        let view = expand_one(&mut tx, group).await?;
        tx.commit().await?;

        tracing::debug!(promoter_group_id = id, "Updated promoter group");
        Ok(view)
    }

    /// Delete a group; its promoter and skill links cascade.
    pub async fn delete(&self, id: i64) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM promoter_groups WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(PromoterGroup::NAME, id));
        }
        tracing::debug!(promoter_group_id = id, "Deleted promoter group");
        Ok(())
    }
}
