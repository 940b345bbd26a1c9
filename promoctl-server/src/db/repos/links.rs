//! Association (join table) maintenance
//!
//! Two write contracts live here and are deliberately separate:
//! - [`sync`] replaces an owner's whole related-id set and is idempotent
//! - [`attach`] adds one link and fails if the pair already exists
//!
//! Reads for eager loading go through [`load_related`], one JOIN per
//! relation regardless of how many owners are requested.

use std::collections::{HashMap, HashSet};

use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgConnection, Row};

use super::DbError;
use crate::models::{IdList, ValidationError, ValidationErrors};

/// One direction of a many-to-many join table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkTable {
    /// Join table name
    pub table: &'static str,
    /// Column holding the owner's id
    pub owner: &'static str,
    /// Column holding the related row's id
    pub related: &'static str,
    /// Table the related column points at
    pub related_table: &'static str,
}

pub const PROMOTER_GROUPS: LinkTable = LinkTable {
    table: "promoter_promoter_group",
    owner: "promoter_id",
    related: "promoter_group_id",
    related_table: "promoter_groups",
};

pub const PROMOTER_SKILLS: LinkTable = LinkTable {
    table: "promoter_skill",
    owner: "promoter_id",
    related: "skill_id",
    related_table: "skills",
};

pub const GROUP_PROMOTERS: LinkTable = LinkTable {
    table: "promoter_promoter_group",
    owner: "promoter_group_id",
    related: "promoter_id",
    related_table: "promoters",
};

pub const GROUP_SKILLS: LinkTable = LinkTable {
    table: "promoter_group_skill",
    owner: "promoter_group_id",
    related: "skill_id",
    related_table: "skills",
};

pub const SKILL_PROMOTERS: LinkTable = LinkTable {
    table: "promoter_skill",
    owner: "skill_id",
    related: "promoter_id",
    related_table: "promoters",
};

pub const SKILL_GROUPS: LinkTable = LinkTable {
    table: "promoter_group_skill",
    owner: "skill_id",
    related: "promoter_group_id",
    related_table: "promoter_groups",
};

/// Difference between the current and the requested related-id sets
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    /// Requested but not linked yet
    pub attach: Vec<i64>,
    /// Linked but no longer requested
    pub detach: Vec<i64>,
    /// Linked and still requested; left untouched
    pub kept: usize,
}

impl SyncPlan {
    pub fn new(current: &[i64], requested: &[i64]) -> Self {
        let current_set: HashSet<i64> = current.iter().copied().collect();
        let requested_set: HashSet<i64> = requested.iter().copied().collect();

        let mut attach = Vec::new();
        for id in requested {
            if !current_set.contains(id) && !attach.contains(id) {
                attach.push(*id);
            }
        }
        let detach = current
            .iter()
            .copied()
            .filter(|id| !requested_set.contains(id))
            .collect();
        let kept = current_set.intersection(&requested_set).count();

        Self { attach, detach, kept }
    }

    pub fn is_noop(&self) -> bool {
        self.attach.is_empty() && self.detach.is_empty()
    }
}

/// Record an error for each requested id with no matching row.
///
/// Errors are keyed `field.index` against the ids as sent.
pub async fn check_references(
    conn: &mut PgConnection,
    link: LinkTable,
    ids: &IdList,
    errors: &mut ValidationErrors,
) -> Result<(), DbError> {
    let unique = ids.unique();
    if unique.is_empty() {
        return Ok(());
    }

    let sql = format!("SELECT id FROM {} WHERE id = ANY($1)", link.related_table);
    let found: HashSet<i64> = sqlx::query_scalar::<_, i64>(&sql)
        .bind(&unique)
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .collect();

    for (index, id) in ids.requested().iter().enumerate() {
        if !found.contains(id) {
            errors.push_at(
                format!("{}.{}", ids.field, index),
                &ValidationError::UnknownReference {
                    field: ids.field,
                    id: *id,
                },
            );
        }
    }
    Ok(())
}

/// Look up every present id list and collect all unknown references.
pub async fn unknown_references(
    conn: &mut PgConnection,
    lists: &[(LinkTable, Option<&IdList>)],
) -> Result<ValidationErrors, DbError> {
    let mut errors = ValidationErrors::new();
    for (link, ids) in lists {
        if let Some(ids) = ids {
            check_references(&mut *conn, *link, ids, &mut errors).await?;
        }
    }
    Ok(errors)
}

/// Related ids currently linked to `owner_id`.
pub async fn current_ids(
    conn: &mut PgConnection,
    link: LinkTable,
    owner_id: i64,
) -> Result<Vec<i64>, DbError> {
    let sql = format!(
        "SELECT {related} FROM {table} WHERE {owner} = $1 ORDER BY {related}",
        related = link.related,
        table = link.table,
        owner = link.owner,
    );
    let ids = sqlx::query_scalar::<_, i64>(&sql)
        .bind(owner_id)
        .fetch_all(&mut *conn)
        .await?;
    Ok(ids)
}

/// Make the owner's links exactly `requested`.
///
/// Must run inside the caller's transaction. Callers lock the owner row
/// first (the UPDATE or INSERT of the owner does this), so concurrent syncs
/// of the same owner are serialized by the database.
pub async fn sync(
    conn: &mut PgConnection,
    link: LinkTable,
    owner_id: i64,
    requested: &[i64],
) -> Result<SyncPlan, DbError> {
    let current = current_ids(&mut *conn, link, owner_id).await?;
    let plan = SyncPlan::new(&current, requested);
    if plan.is_noop() {
        return Ok(plan);
    }

    if !plan.detach.is_empty() {
        let sql = format!(
            "DELETE FROM {table} WHERE {owner} = $1 AND {related} = ANY($2)",
            table = link.table,
            owner = link.owner,
            related = link.related,
        );
        sqlx::query(&sql)
            .bind(owner_id)
            .bind(&plan.detach)
            .execute(&mut *conn)
            .await?;
    }

    if !plan.attach.is_empty() {
        let sql = format!(
            "INSERT INTO {table} ({owner}, {related}) \
             SELECT $1, UNNEST($2::BIGINT[]) \
             ON CONFLICT DO NOTHING",
            table = link.table,
            owner = link.owner,
            related = link.related,
        );
        sqlx::query(&sql)
            .bind(owner_id)
            .bind(&plan.attach)
            .execute(&mut *conn)
            .await?;
    }

    tracing::debug!(
        table = link.table,
        owner_id,
        attached = plan.attach.len(),
        detached = plan.detach.len(),
        kept = plan.kept,
        "Synced links"
    );
    Ok(plan)
}

/// Sync only when the payload carried the list.
pub async fn sync_if_present(
    conn: &mut PgConnection,
    link: LinkTable,
    owner_id: i64,
    ids: Option<&IdList>,
) -> Result<Option<SyncPlan>, DbError> {
    match ids {
        Some(ids) => Ok(Some(sync(conn, link, owner_id, &ids.unique()).await?)),
        None => Ok(None),
    }
}

/// Add one link. An existing pair is a uniqueness violation.
pub async fn attach(
    conn: &mut PgConnection,
    link: LinkTable,
    owner_id: i64,
    related_id: i64,
) -> Result<(), DbError> {
    let sql = format!(
        "INSERT INTO {table} ({owner}, {related}) VALUES ($1, $2)",
        table = link.table,
        owner = link.owner,
        related = link.related,
    );
    sqlx::query(&sql)
        .bind(owner_id)
        .bind(related_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// A related row tagged with the owner it was loaded for
struct Linked<T> {
    owner_id: i64,
    item: T,
}

impl<'r, T> FromRow<'r, PgRow> for Linked<T>
where
    T: FromRow<'r, PgRow>,
{
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            owner_id: row.try_get("owner_id")?,
            item: T::from_row(row)?,
        })
    }
}

/// Load related rows for many owners in one query, grouped by owner id.
///
/// Owners with no links are absent from the map. Rows are ordered by id.
pub async fn load_related<T>(
    conn: &mut PgConnection,
    link: LinkTable,
    owner_ids: &[i64],
) -> Result<HashMap<i64, Vec<T>>, DbError>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let mut grouped: HashMap<i64, Vec<T>> = HashMap::new();
    if owner_ids.is_empty() {
        return Ok(grouped);
    }

    let sql = format!(
        "SELECT l.{owner} AS owner_id, r.* \
         FROM {table} l \
         JOIN {related_table} r ON r.id = l.{related} \
         WHERE l.{owner} = ANY($1) \
         ORDER BY r.id",
        owner = link.owner,
        table = link.table,
        related_table = link.related_table,
        related = link.related,
    );
    let rows = sqlx::query_as::<_, Linked<T>>(&sql)
        .bind(owner_ids)
        .fetch_all(&mut *conn)
        .await?;

    for row in rows {
        grouped.entry(row.owner_id).or_default().push(row.item);
    }
    Ok(grouped)
}
