//! Integration tests for the backup service

mod common;

use common::fixtures::*;
use std::process::Command;
use std::sync::Arc;

use panel::config::{BackupConfig, ServerConfig};
use panel::errors::BackupError;
use panel::BackupService;

async fn service_for(config: &TestConfig) -> (BackupService, Arc<panel::Database>) {
    let db = test_database().await;
    let server = ServerConfig {
        root: config.server_root.clone(),
        ..Default::default()
    };
    let backups = BackupConfig {
        directory: config.backup_dir.clone(),
        ..Default::default()
    };
    (BackupService::new(db.clone(), &server, &backups), db)
}

#[tokio::test]
async fn test_create_backup_archives_server_root() {
    let config = TestConfigBuilder::new().build();
    std::fs::write(config.server_root.join("server.properties"), "motd=hello").unwrap();
    std::fs::create_dir_all(config.server_root.join("world")).unwrap();
    std::fs::write(config.server_root.join("world/level.dat"), "level").unwrap();
    std::fs::create_dir_all(config.server_root.join("cache")).unwrap();
    std::fs::write(config.server_root.join("cache/blob"), "cached").unwrap();
    std::fs::write(config.server_root.join("latest.log"), "log").unwrap();

    let (service, db) = service_for(&config).await;
    let record = service.create_backup().await.unwrap();

    assert!(record.name.starts_with("Backup-"));
    assert!(record.name.ends_with(".tar.gz"));
    assert!(record.size_bytes > 0);
    assert!(std::path::Path::new(&record.path).exists());
    assert!(!service.is_running());

    let listing = Command::new("tar").arg("-tzf").arg(&record.path).output().unwrap();
    let entries = String::from_utf8_lossy(&listing.stdout);
    assert!(entries.contains("server.properties"));
    assert!(entries.contains("world/level.dat"));
    assert!(!entries.contains("cache"));
    assert!(!entries.contains("latest.log"));

    let stored = db.get_backup(&record.id).await.unwrap().unwrap();
    assert_eq!(stored.name, record.name);
    assert_eq!(stored.path, record.path);
    assert_eq!(stored.size_bytes, record.size_bytes);
}

#[tokio::test]
async fn test_missing_server_root_is_an_error() {
    let config = TestConfigBuilder::new().build();
    std::fs::remove_dir_all(&config.server_root).unwrap();

    let (service, db) = service_for(&config).await;
    let err = service.create_backup().await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<BackupError>(),
        Some(BackupError::ServerRootMissing(_))
    ));
    assert!(db.list_backups().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_concurrent_backup_is_rejected() {
    let config = TestConfigBuilder::new().build();
    std::fs::write(config.server_root.join("server.properties"), "motd=hello").unwrap();

    let (service, _db) = service_for(&config).await;
    let (first, second) = tokio::join!(service.create_backup(), service.create_backup());

    assert!(first.is_ok());
    let err = second.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<BackupError>(),
        Some(BackupError::AlreadyRunning)
    ));
}

#[tokio::test]
async fn test_delete_backup_removes_file_and_record() {
    let config = TestConfigBuilder::new().build();
    std::fs::write(config.server_root.join("server.properties"), "motd=hello").unwrap();

    let (service, _db) = service_for(&config).await;
    let record = service.create_backup().await.unwrap();

    let deleted = service.delete_backup(&record.id).await.unwrap();
    assert_eq!(deleted.id, record.id);
    assert!(!std::path::Path::new(&record.path).exists());
    assert!(service.list_backups().await.unwrap().is_empty());

    let err = service.delete_backup(&record.id).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<BackupError>(),
        Some(BackupError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_record_survives_missing_archive_file() {
    let config = TestConfigBuilder::new().build();
    std::fs::write(config.server_root.join("server.properties"), "motd=hello").unwrap();

    let (service, _db) = service_for(&config).await;
    let record = service.create_backup().await.unwrap();
    std::fs::remove_file(&record.path).unwrap();

    // removal failure is logged, the record still goes
    service.delete_backup(&record.id).await.unwrap();
    assert!(service.list_backups().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_open_backup_reads_the_archive() {
    let config = TestConfigBuilder::new().build();
    std::fs::write(config.server_root.join("server.properties"), "motd=hello").unwrap();

    let (service, db) = service_for(&config).await;
    let record = service.create_backup().await.unwrap();

    let (opened, file) = service.open_backup(&record.id).await.unwrap();
    assert_eq!(opened.id, record.id);
    assert_eq!(file.metadata().await.unwrap().len() as i64, record.size_bytes);

    // a record whose file was removed behind the panel's back
    std::fs::remove_file(&record.path).unwrap();
    let err = service.open_backup(&record.id).await.unwrap_err();
    assert!(matches!(err.downcast_ref::<BackupError>(), Some(BackupError::NotFound(_))));

    // a record pointing outside the backup directory
    let mut foreign = record.clone();
    foreign.id = "foreign".to_string();
    foreign.path = config.server_root.join("server.properties").display().to_string();
    db.store_backup(&foreign).await.unwrap();
    let err = service.open_backup("foreign").await.unwrap_err();
    assert!(matches!(err.downcast_ref::<BackupError>(), Some(BackupError::NotFound(_))));
}
