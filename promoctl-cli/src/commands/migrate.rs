//! Schema setup without starting the server

use anyhow::{Context, Result};
use clap::Parser;

use promoctl_server::db::migrations;

use super::DatabaseArgs;

/// Arguments for the migrate command
#[derive(Parser, Debug)]
pub struct MigrateArgs {
    #[command(flatten)]
    pub database: DatabaseArgs,
}

/// Create any missing tables, constraints and indexes
pub async fn run_migrate(args: MigrateArgs) -> Result<()> {
    let pool = args.database.connect().await?;
    migrations::run(&pool)
        .await
        .context("Failed to run migrations")?;
    pool.close().await;
    Ok(())
}
