//! Backup record database operations.

use anyhow::Result;
use sqlx::Row;
use tracing::debug;

use super::records::BackupRecord;
use super::Database;

impl Database {
    pub async fn store_backup(&self, backup: &BackupRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO backups (id, name, path, size_bytes, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&backup.id)
        .bind(&backup.name)
        .bind(&backup.path)
        .bind(backup.size_bytes)
        .bind(backup.created_at)
        .execute(&self.pool)
        .await?;

        debug!("Stored backup record {} ({})", backup.id, backup.name);
        Ok(())
    }

    /// Newest first
    pub async fn list_backups(&self) -> Result<Vec<BackupRecord>> {
        let rows = sqlx::query(
            "SELECT id, name, path, size_bytes, created_at FROM backups ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut backups = Vec::with_capacity(rows.len());
        for row in rows {
            backups.push(BackupRecord {
                id: row.try_get("id")?,
                name: row.try_get("name")?,
                path: row.try_get("path")?,
                size_bytes: row.try_get("size_bytes")?,
                created_at: row.try_get("created_at")?,
            });
        }
        Ok(backups)
    }

    pub async fn get_backup(&self, backup_id: &str) -> Result<Option<BackupRecord>> {
        let row = sqlx::query(
            "SELECT id, name, path, size_bytes, created_at FROM backups WHERE id = ?",
        )
        .bind(backup_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(BackupRecord {
                id: row.try_get("id")?,
                name: row.try_get("name")?,
                path: row.try_get("path")?,
                size_bytes: row.try_get("size_bytes")?,
                created_at: row.try_get("created_at")?,
            })),
            None => Ok(None),
        }
    }

    pub async fn delete_backup_record(&self, backup_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM backups WHERE id = ?")
            .bind(backup_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
