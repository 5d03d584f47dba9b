//! Database module
//!
//! This module provides all database functionality including:
//! - Schema and migrations
//! - Model definitions and row mapping
//! - The scoped stores for notes, tags and versions
//! - The user directory

pub mod models;
pub mod notes;
pub mod repository;
pub mod schema;
pub mod tags;
pub mod users;
pub mod versions;

#[cfg(test)]
pub(crate) mod test_support;

pub use models::*;
pub use notes::NoteStore;
pub use repository::{Repository, UserScope};
pub use schema::initialize_database;
pub use tags::TagStore;
pub use users::{hash_password, UserDirectory};
pub use versions::VersionStore;

use crate::config::StoreSettings;
use crate::error::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Build connection options shared by migration and application connections.
fn connect_options(
    db_path: &Path,
    busy_timeout: Duration,
) -> std::result::Result<SqliteConnectOptions, sqlx::Error> {
    SqliteConnectOptions::from_str(&format!("sqlite://{}?mode=rwc", db_path.display())).map(
        |opts| {
            opts.create_if_missing(true)
                .busy_timeout(busy_timeout)
                .journal_mode(SqliteJournalMode::Wal)
                .foreign_keys(true)
        },
    )
}

/// Create and initialize a database connection pool.
///
/// Migrations run on a dedicated single-connection pool that is closed
/// before the application pool is created, so every pooled connection
/// sees the final schema.
pub async fn create_pool(settings: &StoreSettings) -> Result<SqlitePool> {
    settings.validate()?;

    let db_path = settings.database_path.as_path();
    let busy_timeout = Duration::from_secs(settings.busy_timeout_secs);

    tracing::info!("Creating database connection pool at: {:?}", db_path);

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let migration_pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(connect_options(db_path, busy_timeout)?)
        .await?;

    initialize_database(&migration_pool).await?;
    migration_pool.close().await;

    let pool = SqlitePoolOptions::new()
        .max_connections(settings.max_connections)
        .connect_with(connect_options(db_path, busy_timeout)?)
        .await?;

    tracing::info!("Database pool created successfully");

    Ok(pool)
}

/// Create an ephemeral in-memory database with the schema applied.
///
/// Every connection to `sqlite::memory:` is its own database, so the pool
/// holds exactly one connection and never recycles it.
pub async fn create_memory_pool() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    initialize_database(&pool).await?;

    Ok(pool)
}
