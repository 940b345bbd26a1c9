//! Schema creation
//!
//! Every statement is idempotent, so running this on each startup is safe.
//! Constraint names are referenced by [`crate::db::repos::DbError`] when
//! classifying violations.

use sqlx::PgPool;

/// Unique email per promoter
pub const PROMOTERS_EMAIL_UNIQUE: &str = "promoters_email_unique";
/// One row per (promoter, skill)
pub const PROMOTER_SKILL_PAIR_UNIQUE: &str = "promoter_skill_pair_unique";
/// promoter_skill.skill_id -> skills.id
pub const PROMOTER_SKILL_SKILL_FK: &str = "promoter_skill_skill_fk";
/// promoter_group_skill.skill_id -> skills.id
pub const GROUP_SKILL_SKILL_FK: &str = "promoter_group_skill_skill_fk";
/// promoter_group_skill.promoter_group_id -> promoter_groups.id
pub const GROUP_SKILL_GROUP_FK: &str = "promoter_group_skill_group_fk";
/// promoter_promoter_group.promoter_id -> promoters.id
pub const PROMOTER_GROUP_PROMOTER_FK: &str = "promoter_promoter_group_promoter_fk";

const STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS promoters (
        id BIGSERIAL PRIMARY KEY,
        first_name VARCHAR(255) NOT NULL,
        last_name VARCHAR(255) NOT NULL,
        birthday_date DATE NOT NULL,
        gender TEXT NOT NULL CHECK (gender IN ('male', 'female', 'other')),
        email VARCHAR(255) NOT NULL,
        phone VARCHAR(20),
        address VARCHAR(255),
        availabilities TEXT[] NOT NULL DEFAULT '{}',
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        CONSTRAINT promoters_email_unique UNIQUE (email)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS promoter_groups (
        id BIGSERIAL PRIMARY KEY,
        name VARCHAR(255) NOT NULL,
        description VARCHAR(1000),
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS skills (
        id BIGSERIAL PRIMARY KEY,
        name VARCHAR(255) NOT NULL,
        description VARCHAR(1000),
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS promoter_promoter_group (
        id BIGSERIAL PRIMARY KEY,
        promoter_id BIGINT NOT NULL,
        promoter_group_id BIGINT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        CONSTRAINT promoter_promoter_group_promoter_fk FOREIGN KEY (promoter_id)
            REFERENCES promoters(id) ON DELETE CASCADE,
        CONSTRAINT promoter_promoter_group_group_fk FOREIGN KEY (promoter_group_id)
            REFERENCES promoter_groups(id) ON DELETE CASCADE,
        CONSTRAINT promoter_promoter_group_pair_unique UNIQUE (promoter_id, promoter_group_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS promoter_skill (
        id BIGSERIAL PRIMARY KEY,
        promoter_id BIGINT NOT NULL,
        skill_id BIGINT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        CONSTRAINT promoter_skill_promoter_fk FOREIGN KEY (promoter_id)
            REFERENCES promoters(id) ON DELETE CASCADE,
        CONSTRAINT promoter_skill_skill_fk FOREIGN KEY (skill_id)
            REFERENCES skills(id) ON DELETE CASCADE,
        CONSTRAINT promoter_skill_pair_unique UNIQUE (promoter_id, skill_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS promoter_group_skill (
        id BIGSERIAL PRIMARY KEY,
        promoter_group_id BIGINT NOT NULL,
        skill_id BIGINT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        CONSTRAINT promoter_group_skill_group_fk FOREIGN KEY (promoter_group_id)
            REFERENCES promoter_groups(id) ON DELETE CASCADE,
        CONSTRAINT promoter_group_skill_skill_fk FOREIGN KEY (skill_id)
            REFERENCES skills(id) ON DELETE CASCADE,
        CONSTRAINT promoter_group_skill_pair_unique UNIQUE (promoter_group_id, skill_id)
    )
    "#,
    // Reverse-direction lookups; the unique constraints cover the forward ones
    "CREATE INDEX IF NOT EXISTS promoter_promoter_group_group_idx ON promoter_promoter_group (promoter_group_id)",
    "CREATE INDEX IF NOT EXISTS promoter_skill_skill_idx ON promoter_skill (skill_id)",
    "CREATE INDEX IF NOT EXISTS promoter_group_skill_skill_idx ON promoter_group_skill (skill_id)",
];

/// Create all tables, constraints and indexes.
pub async fn run(pool: &PgPool) -> Result<(), sqlx::Error> {
    tracing::info!("Running migrations...");

    for statement in STATEMENTS {
        sqlx::query(statement).execute(pool).await?;
    }

    tracing::info!(statements = STATEMENTS.len(), "Migrations complete");
    Ok(())
}
