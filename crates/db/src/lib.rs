use std::time::Duration;

use sqlx::sqlite::SqlitePoolOptions;

use reloom_core::config::DatabaseConfig;

pub mod fixtures;
pub mod memory;
pub mod migrations;
pub mod sql;
pub mod store;

pub use fixtures::seed_demo_items;
pub use memory::InMemoryItemStore;
pub use sql::SqlItemStore;
pub use store::{ItemPatch, ItemStore, StoreError};

pub type DbPool = sqlx::SqlitePool;

/// Opens a pool for the configured database.
pub async fn connect(database: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    connect_with_settings(&database.url, database.max_connections, database.timeout_secs).await
}

/// Lower-level variant used by tests that point at `sqlite::memory:`.
pub async fn connect_with_settings(
    database_url: &str,
    max_connections: u32,
    timeout_secs: u64,
) -> Result<DbPool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .acquire_timeout(Duration::from_secs(timeout_secs.max(1)))
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                // WAL keeps readers (dashboard polls) unblocked by pipeline
                // writes; the busy timeout covers the rest.
                sqlx::query("PRAGMA journal_mode = WAL").execute(&mut *conn).await?;
                sqlx::query("PRAGMA synchronous = NORMAL").execute(&mut *conn).await?;
                sqlx::query("PRAGMA foreign_keys = ON").execute(&mut *conn).await?;
                sqlx::query("PRAGMA busy_timeout = 5000").execute(&mut *conn).await?;
                Ok(())
            })
        })
        .connect(database_url)
        .await
}
