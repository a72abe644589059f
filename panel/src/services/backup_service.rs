// File: panel/src/services/backup_service.rs
use anyhow::Result;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::File;
use tokio::process::Command as AsyncCommand;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{BackupConfig, ServerConfig};
use crate::database::{BackupRecord, Database};
use crate::errors::BackupError;

/// Writes compressed archives of the managed server directory and keeps
/// their records. One backup at a time.
pub struct BackupService {
    database: Arc<Database>,
    server_root: PathBuf,
    directory: PathBuf,
    exclude: Vec<String>,
    in_progress: Mutex<()>,
}

impl BackupService {
    pub fn new(database: Arc<Database>, server: &ServerConfig, backups: &BackupConfig) -> Self {
        Self {
            database,
            server_root: server.root.clone(),
            directory: backups.directory.clone(),
            exclude: backups.exclude.clone(),
            in_progress: Mutex::new(()),
        }
    }

    pub fn is_running(&self) -> bool {
        self.in_progress.try_lock().is_err()
    }

    pub async fn create_backup(&self) -> Result<BackupRecord> {
        let _running = self
            .in_progress
            .try_lock()
            .map_err(|_| BackupError::AlreadyRunning)?;

        if !tokio::fs::try_exists(&self.server_root).await.unwrap_or(false) {
            let root = self.server_root.display().to_string();
            return Err(BackupError::ServerRootMissing(root).into());
        }

        tokio::fs::create_dir_all(&self.directory).await?;

        let created_at = Utc::now();
        let name = format!("Backup-{}.tar.gz", created_at.format("%Y-%m-%d_%H-%M-%S"));
        let path = self.directory.join(&name);

        info!(
            "Creating backup {} from {}",
            name,
            self.server_root.display()
        );

        let args = tar_args(&path, &self.server_root, &self.exclude);
        debug!("Backup command: tar {}", args.join(" "));

        let output = AsyncCommand::new("tar")
            .args(&args)
            .output()
            .await
            .map_err(|e| BackupError::ArchiveFailed(format!("failed to run tar: {}", e)))?;

        if !output.status.success() {
            let exit_code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr);

            // exit code 1: some files changed while being read, the archive is complete
            if exit_code == 1 && tokio::fs::try_exists(&path).await.unwrap_or(false) {
                warn!("Backup {} finished with warnings: {}", name, stderr.trim());
            } else {
                if let Err(e) = tokio::fs::remove_file(&path).await {
                    debug!("No partial archive to clean up for {}: {}", name, e);
                }
                return Err(BackupError::ArchiveFailed(format!(
                    "tar exited with code {}: {}",
                    exit_code,
                    stderr.trim()
                ))
                .into());
            }
        }

        let size_bytes = tokio::fs::metadata(&path).await?.len() as i64;
        let record = BackupRecord {
            id: Uuid::new_v4().to_string(),
            name,
            path: path.to_string_lossy().into_owned(),
            size_bytes,
            created_at,
        };
        self.database.store_backup(&record).await?;

        info!("✓ Backup created: {} ({} bytes)", record.name, record.size_bytes);
        Ok(record)
    }

    pub async fn list_backups(&self) -> Result<Vec<BackupRecord>> {
        self.database.list_backups().await
    }

    /// Opens a stored archive for reading. Records pointing outside the backup
    /// directory, or whose file is gone, count as missing.
    pub async fn open_backup(&self, backup_id: &str) -> Result<(BackupRecord, File)> {
        let not_found = || BackupError::NotFound(backup_id.to_string());
        let record = self
            .database
            .get_backup(backup_id)
            .await?
            .ok_or_else(not_found)?;

        if !Path::new(&record.path).starts_with(&self.directory) {
            warn!("Backup {} points outside {}", record.id, self.directory.display());
            return Err(not_found().into());
        }

        let file = File::open(&record.path).await.map_err(|e| {
            warn!("Backup file {} cannot be opened: {}", record.path, e);
            not_found()
        })?;
        Ok((record, file))
    }

    /// Removes the archive and its record. A file that cannot be removed is
    /// logged and the record is deleted anyway.
    pub async fn delete_backup(&self, backup_id: &str) -> Result<BackupRecord> {
        let record = self
            .database
            .get_backup(backup_id)
            .await?
            .ok_or_else(|| BackupError::NotFound(backup_id.to_string()))?;

        if let Err(e) = tokio::fs::remove_file(&record.path).await {
            warn!("Failed to remove backup file {}: {}", record.path, e);
        }

        self.database.delete_backup_record(backup_id).await?;
        info!("Deleted backup {} ({})", record.name, record.id);
        Ok(record)
    }
}

fn tar_args(archive: &Path, root: &Path, exclude: &[String]) -> Vec<String> {
    let mut args = vec!["-czf".to_string(), archive.to_string_lossy().into_owned()];
    args.extend(exclude.iter().map(|pattern| format!("--exclude={}", pattern)));
    args.push("-C".to_string());
    args.push(root.to_string_lossy().into_owned());
    args.push(".".to_string());
    args
}
