//! Storage layer for tapi.
//!
//! Provides database access via SQLx with SQLite.

mod models;
mod repository;

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::config::DatabaseConfig;

pub use repository::TodoRepository;

/// Build the shared connection pool.
///
/// The pool is lazy: no connection is opened until the first query, so an
/// unreachable database does not prevent startup. Acquiring a connection
/// waits at most `pool_timeout_secs`, and idle connections are pinged
/// before reuse.
pub fn connect_pool(config: &DatabaseConfig) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(&config.url)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections())
        .min_connections(0)
        .acquire_timeout(Duration::from_secs(config.pool_timeout_secs))
        .test_before_acquire(true)
        .connect_lazy_with(options);

    Ok(pool)
}
