//! Database layer - connection pool, schema and repositories
//!
//! # Design Principles
//!
//! - Connection pool - no Arc<Mutex<Connection>>
//! - Expanded reads use one JOIN query per relation - no N+1 queries
//! - Rely on DB constraints, classify conflicts - no check-then-insert
//! - Transactions for multi-step operations

pub mod migrations;
pub mod pool;
pub mod repos;

pub use pool::{create_pool, PoolSettings};
pub use sqlx::PgPool;
pub use repos::*;
