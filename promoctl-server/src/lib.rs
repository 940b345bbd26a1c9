//! promoctl-server: HTTP API for promoters, promoter groups and skills
//!
//! Three entity stores joined pairwise by many-to-many link tables.
//! Handlers validate input, then delegate to repositories that keep the
//! link tables consistent inside database transactions.

pub mod db;
pub mod http;
pub mod models;

pub use db::create_pool;
pub use http::{build_router, run_server, ServerConfig};
