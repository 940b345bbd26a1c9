//! Subcommand implementations

pub mod migrate;
pub mod serve;

pub use migrate::run_migrate;
pub use serve::run_serve;

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use promoctl_server::db::{PgPool, PoolSettings};

/// Database connection options shared by subcommands
#[derive(Args, Debug, Clone)]
pub struct DatabaseArgs {
    /// Database URL
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Maximum pooled connections
    #[arg(long, default_value_t = 5)]
    pub max_connections: u32,

    /// Seconds a request waits for a free connection
    #[arg(long, default_value_t = 5)]
    pub acquire_timeout_secs: u64,
}

impl DatabaseArgs {
    pub fn pool_settings(&self) -> PoolSettings {
        PoolSettings {
            max_connections: self.max_connections,
            acquire_timeout: Duration::from_secs(self.acquire_timeout_secs),
        }
    }

    /// Open the pool, failing with a hint when no URL was given.
    pub async fn connect(&self) -> Result<PgPool> {
        let database_url = self
            .database_url
            .as_deref()
            .context("DATABASE_URL not set. Set via --database-url, DATABASE_URL env, or .env")?;

        self.pool_settings()
            .connect(database_url)
            .await
            .context("Failed to create database pool")
    }
}
