//! Database pool construction and embedded migrations.
//!
//! The store is a single SQLite file; every service holds a clone of the
//! pool and checks connections out per unit of work. Multi-statement writes
//! run on one `sqlx::Transaction`, whose drop guard rolls back any
//! uncommitted work on every exit path.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

pub use sqlx::SqlitePool;

use crate::config::AppConfig;
use crate::error::ServiceResult;

/// Embedded schema migrations, applied by [`migrate`].
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

/// Opens the pooled connection to the configured database file, creating the
/// file when it does not exist yet. Foreign keys are enforced per
/// connection.
pub async fn connect(cfg: &AppConfig) -> ServiceResult<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(&cfg.database_path)
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(cfg.max_connections)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Opens an in-memory database with a single connection and the schema
/// applied. In-memory SQLite databases are per-connection, so the pool is
/// capped at one; this is the backend used by tests and local experiments.
pub async fn connect_in_memory() -> ServiceResult<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .in_memory(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    migrate(&pool).await?;
    Ok(pool)
}

/// Brings the schema up to date.
pub async fn migrate(pool: &SqlitePool) -> ServiceResult<()> {
    MIGRATOR
        .run(pool)
        .await
        .map_err(|e| crate::error::ServiceError::from(sqlx::Error::from(e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_database_has_schema() {
        let pool = connect_in_memory().await.expect("pool");
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pasien")
            .fetch_one(&pool)
            .await
            .expect("pasien table exists");
        assert_eq!(n, 0);
    }

    #[tokio::test]
    async fn migrate_is_idempotent() {
        let pool = connect_in_memory().await.expect("pool");
        migrate(&pool).await.expect("second run is a no-op");
    }

    #[tokio::test]
    async fn connect_creates_the_database_file() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let cfg = AppConfig {
            database_path: dir.path().join("klinik.db"),
            ..AppConfig::default()
        };

        let pool = connect(&cfg).await.expect("pool");
        migrate(&pool).await.expect("migrations");
        pool.close().await;

        assert!(cfg.database_path.is_file());
    }
}
