//! Database layer for the control panel.
//!
//! This module provides SQLite persistence for:
//! - Schedules and their ordered tasks (the schedule store)
//! - Backup records
//!
//! The module is organized into submodules:
//! - `records` - All record types (entities)
//! - `schedules` - Schedule and task operations
//! - `backups` - Backup record operations

mod backups;
mod records;
mod schedules;

pub use records::*;

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, error, info};

pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Expose pool for integration test queries
    #[allow(dead_code)]
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn new(database_path: &str) -> Result<Self> {
        info!("Database path: {}", database_path);

        if let Some(parent) = Path::new(database_path).parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = tokio::fs::create_dir_all(parent).await {
                    error!("Failed to create parent directory {:?}: {}", parent, e);
                    return Err(e.into());
                }
            }
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", database_path))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = match SqlitePoolOptions::new().connect_with(options).await {
            Ok(pool) => pool,
            Err(e) => {
                error!("Failed to connect to database {}: {}", database_path, e);
                return Err(e.into());
            }
        };

        let database = Self { pool };
        database.initialize_tables().await?;

        info!("Database initialized at {}", database_path);
        Ok(database)
    }

    /// Single-connection in-memory database; the connection never expires so
    /// the data lives as long as the pool.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let database = Self { pool };
        database.initialize_tables().await?;
        Ok(database)
    }

    async fn initialize_tables(&self) -> Result<()> {
        let schedules_table_sql = r#"
            CREATE TABLE IF NOT EXISTS schedules (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                cron TEXT NOT NULL,
                is_active BOOLEAN NOT NULL DEFAULT 1,
                last_run DATETIME,
                next_run DATETIME,
                created_at DATETIME NOT NULL
            )
        "#;

        if let Err(e) = sqlx::query(schedules_table_sql).execute(&self.pool).await {
            error!("Failed to create schedules table: {}", e);
            return Err(e.into());
        }

        let tasks_table_sql = r#"
            CREATE TABLE IF NOT EXISTS schedule_tasks (
                id TEXT PRIMARY KEY,
                schedule_id TEXT NOT NULL REFERENCES schedules(id) ON DELETE CASCADE,
                action TEXT NOT NULL,
                payload TEXT NOT NULL DEFAULT '',
                delay_seconds INTEGER NOT NULL DEFAULT 0,
                sequence INTEGER NOT NULL
            )
        "#;

        if let Err(e) = sqlx::query(tasks_table_sql).execute(&self.pool).await {
            error!("Failed to create schedule_tasks table: {}", e);
            return Err(e.into());
        }

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_tasks_schedule_sequence ON schedule_tasks(schedule_id, sequence)",
        )
        .execute(&self.pool)
        .await?;

        let backups_table_sql = r#"
            CREATE TABLE IF NOT EXISTS backups (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                path TEXT NOT NULL,
                size_bytes INTEGER NOT NULL,
                created_at DATETIME NOT NULL
            )
        "#;

        if let Err(e) = sqlx::query(backups_table_sql).execute(&self.pool).await {
            error!("Failed to create backups table: {}", e);
            return Err(e.into());
        }

        debug!("Database tables initialized");
        Ok(())
    }
}
