mod models;

pub use models::*;

use anyhow::{Context, Result};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

use crate::config::DatabaseConfig;

pub type DbPool = SqlitePool;

/// Split a migration file into statements. Comment lines are dropped first
/// so a `;` inside a comment never ends a statement.
fn migration_statements(sql: &str) -> Vec<String> {
    let cleaned: String = sql
        .lines()
        .filter(|line| !line.trim().starts_with("--"))
        .collect::<Vec<_>>()
        .join("\n");

    cleaned
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Execute a SQL migration file
async fn execute_sql(pool: &SqlitePool, sql: &str) -> Result<()> {
    for statement in migration_statements(sql) {
        sqlx::query(&statement).execute(pool).await?;
    }
    Ok(())
}

pub async fn init(data_dir: &Path, config: &DatabaseConfig) -> Result<DbPool> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

    let db_path = data_dir.join(&config.filename);
    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    info!("Initializing database at {}", db_path.display());

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&db_url)
        .await
        .with_context(|| format!("Failed to open database at {}", db_path.display()))?;

    // Enable WAL mode for better concurrency
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&pool)
        .await?;

    configure(&pool).await?;

    info!("Database initialized successfully");
    Ok(pool)
}

/// Open a private in-memory database with the full schema applied.
///
/// A single connection is used because every SQLite `:memory:` connection
/// gets its own database.
pub async fn init_in_memory() -> Result<DbPool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;

    configure(&pool).await?;
    Ok(pool)
}

async fn configure(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(pool)
        .await?;

    run_migrations(pool).await
}

async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    info!("Running database migrations...");

    // Migration 001: Initial schema
    execute_sql(pool, include_str!("../../migrations/001_initial.sql"))
        .await
        .context("Failed to apply migration 001_initial")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semicolon_in_comment_does_not_split() {
        let sql = "-- first table; keeps notes\nCREATE TABLE a (id TEXT);\n\n-- second; third\nCREATE TABLE b (id TEXT);\n";
        let statements = migration_statements(sql);
        assert_eq!(
            statements,
            vec!["CREATE TABLE a (id TEXT)", "CREATE TABLE b (id TEXT)"]
        );
    }

    #[test]
    fn test_initial_migration_statements() {
        let statements = migration_statements(include_str!("../../migrations/001_initial.sql"));
        assert!(!statements.is_empty());
        for statement in &statements {
            assert!(statement.starts_with("CREATE"), "{}", statement);
        }
    }

    #[tokio::test]
    async fn test_init_creates_schema_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("data");
        let config = DatabaseConfig::default();

        let pool = init(&data_dir, &config).await.unwrap();
        assert!(data_dir.join(&config.filename).exists());

        for table in [
            "users",
            "sessions",
            "stationery_items",
            "retrieval_orders",
            "missing_reports",
        ] {
            let count: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
            )
            .bind(table)
            .fetch_one(&pool)
            .await
            .unwrap();
            assert_eq!(count, 1, "{}", table);
        }

        // Column defaults come through for requests
        let status: String = sqlx::query_scalar(
            "SELECT dflt_value FROM pragma_table_info('retrieval_orders') WHERE name = 'status'",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert!(status.contains("pending"));
        pool.close().await;

        // Migrations are idempotent across restarts
        let pool = init(&data_dir, &config).await.unwrap();
        pool.close().await;
    }
}
