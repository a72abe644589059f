//! Integration tests for the scheduler loop against an in-memory store

mod common;

use chrono_tz::Tz;
use common::fixtures::*;
use std::sync::Arc;
use std::time::Duration;

use panel::config::{BackupConfig, ServerConfig};
use panel::process::ProcessSupervisor;
use panel::{BackupService, Database, TaskExecutor, TaskScheduler};

fn scheduler_for(
    database: Arc<Database>,
    supervisor: Arc<ProcessSupervisor>,
    server: &EchoServer,
) -> TaskScheduler {
    let server_config = ServerConfig {
        root: server.root().to_path_buf(),
        ..Default::default()
    };
    let backup_config = BackupConfig {
        directory: server.root().join("backups"),
        ..Default::default()
    };
    let backups = Arc::new(BackupService::new(database.clone(), &server_config, &backup_config));
    let executor = TaskExecutor::new(supervisor, backups);
    TaskScheduler::new(database, executor, Tz::UTC, Duration::from_secs(60))
}

#[tokio::test]
async fn test_due_schedule_fires_and_records_run_times() {
    let db = test_database().await;
    let server = EchoServer::new();
    let scheduler = scheduler_for(db.clone(), server.supervisor(), &server);

    let schedule = db
        .create_schedule("restart warning", crons::EVERY_FIVE_MINUTES)
        .await
        .unwrap();
    db.add_task(&schedule.id, actions::COMMAND, "say restarting soon", 0)
        .await
        .unwrap();

    let report = scheduler.tick(utc(instants::BOUNDARY)).await.unwrap();
    assert_eq!(report.evaluated, 1);
    assert_eq!(report.fired, vec![schedule.id.clone()]);
    assert_eq!(report.errors, 0);

    for run in report.runs {
        let execution = run.await.unwrap();
        assert_eq!(execution.attempted, 1);
        assert_eq!(execution.failed, 0);
    }

    let stored = db.get_schedule(&schedule.id).await.unwrap().unwrap();
    assert_eq!(stored.last_run, Some(utc(instants::BOUNDARY)));
    assert_eq!(stored.next_run, Some(utc(instants::NEXT_FIRE)));
}

#[tokio::test]
async fn test_same_interval_is_not_fired_twice() {
    let db = test_database().await;
    let server = EchoServer::new();
    let scheduler = scheduler_for(db.clone(), server.supervisor(), &server);

    let schedule = db
        .create_schedule("five minutes", crons::EVERY_FIVE_MINUTES)
        .await
        .unwrap();

    let first = scheduler.tick(utc(instants::BOUNDARY)).await.unwrap();
    assert_eq!(first.fired.len(), 1);

    let second = scheduler.tick(utc(instants::BOUNDARY_PLUS_30S)).await.unwrap();
    assert!(second.fired.is_empty());

    let stored = db.get_schedule(&schedule.id).await.unwrap().unwrap();
    assert_eq!(stored.last_run, Some(utc(instants::BOUNDARY)));
}

#[tokio::test]
async fn test_two_due_schedules_update_their_own_rows() {
    let db = test_database().await;
    let server = EchoServer::new();
    let scheduler = scheduler_for(db.clone(), server.supervisor(), &server);

    let every_five = db
        .create_schedule("every five", crons::EVERY_FIVE_MINUTES)
        .await
        .unwrap();
    let daily = db.create_schedule("daily noon", "5 12 * * *").await.unwrap();

    let report = scheduler.tick(utc(instants::BOUNDARY)).await.unwrap();
    assert_eq!(report.fired.len(), 2);

    let every_five = db.get_schedule(&every_five.id).await.unwrap().unwrap();
    let daily = db.get_schedule(&daily.id).await.unwrap().unwrap();

    assert_eq!(every_five.last_run, Some(utc(instants::BOUNDARY)));
    assert_eq!(every_five.next_run, Some(utc(instants::NEXT_FIRE)));
    assert_eq!(daily.last_run, Some(utc(instants::BOUNDARY)));
    assert_eq!(daily.next_run, Some(utc("2024-03-11T12:05:00Z")));
}

#[tokio::test]
async fn test_malformed_schedule_does_not_stop_the_tick() {
    let db = test_database().await;
    let server = EchoServer::new();
    let scheduler = scheduler_for(db.clone(), server.supervisor(), &server);

    let broken = db.create_schedule("broken", crons::MALFORMED).await.unwrap();
    let healthy = db
        .create_schedule("healthy", crons::EVERY_FIVE_MINUTES)
        .await
        .unwrap();

    let report = scheduler.tick(utc(instants::BOUNDARY)).await.unwrap();
    assert_eq!(report.evaluated, 2);
    assert_eq!(report.errors, 1);
    assert_eq!(report.fired, vec![healthy.id.clone()]);

    let broken = db.get_schedule(&broken.id).await.unwrap().unwrap();
    assert_eq!(broken.last_run, None);
}

#[tokio::test]
async fn test_inactive_schedules_are_skipped() {
    let db = test_database().await;
    let server = EchoServer::new();
    let scheduler = scheduler_for(db.clone(), server.supervisor(), &server);

    let schedule = db
        .create_schedule("paused", crons::EVERY_FIVE_MINUTES)
        .await
        .unwrap();
    assert!(db.set_schedule_active(&schedule.id, false).await.unwrap());

    let report = scheduler.tick(utc(instants::BOUNDARY)).await.unwrap();
    assert_eq!(report.evaluated, 0);
    assert!(report.fired.is_empty());
}

#[tokio::test]
async fn test_reboot_schedule_runs_once_at_start() {
    let db = test_database().await;
    let server = EchoServer::new();
    let supervisor = server.supervisor();
    let scheduler = scheduler_for(db.clone(), supervisor.clone(), &server);

    let schedule = db.create_schedule("boot", crons::REBOOT).await.unwrap();
    db.add_task(&schedule.id, actions::POWER, "start", 0)
        .await
        .unwrap();

    let started_at = utc("2024-03-10T12:00:00Z");
    let runs = scheduler.run_reboot_schedules(started_at).await.unwrap();
    assert_eq!(runs.len(), 1);
    for run in runs {
        run.await.unwrap();
    }
    assert!(supervisor.is_running());

    let stored = db.get_schedule(&schedule.id).await.unwrap().unwrap();
    assert_eq!(stored.last_run, Some(started_at));
    assert_eq!(stored.next_run, None);

    // polling never fires it
    let report = scheduler.tick(utc(instants::BOUNDARY)).await.unwrap();
    assert!(report.fired.is_empty());
    assert_eq!(report.errors, 0);

    supervisor.kill();
}

#[tokio::test]
async fn test_fired_schedule_reaches_the_managed_process() {
    let db = test_database().await;
    let server = EchoServer::new();
    let supervisor = server.supervisor();
    let scheduler = scheduler_for(db.clone(), supervisor.clone(), &server);

    supervisor.start().await;

    let schedule = db
        .create_schedule("announce", crons::EVERY_FIVE_MINUTES)
        .await
        .unwrap();
    db.add_task(&schedule.id, actions::COMMAND, "say scheduled", 0)
        .await
        .unwrap();

    let report = scheduler.tick(utc(instants::BOUNDARY)).await.unwrap();
    for run in report.runs {
        run.await.unwrap();
    }

    assert!(wait_for_log(&supervisor, "> say scheduled").await);
    supervisor.kill();
}

#[tokio::test]
async fn test_task_delay_does_not_hold_back_other_schedules() {
    let db = test_database().await;
    let server = EchoServer::new();
    let supervisor = server.supervisor();
    let scheduler = scheduler_for(db.clone(), supervisor.clone(), &server);

    supervisor.start().await;

    let delayed = db
        .create_schedule("delayed", crons::EVERY_FIVE_MINUTES)
        .await
        .unwrap();
    db.add_task(&delayed.id, actions::COMMAND, "say after delay", 3)
        .await
        .unwrap();
    let immediate = db
        .create_schedule("immediate", crons::EVERY_FIVE_MINUTES)
        .await
        .unwrap();
    db.add_task(&immediate.id, actions::COMMAND, "say right away", 0)
        .await
        .unwrap();

    let started = std::time::Instant::now();
    let report = scheduler.tick(utc(instants::BOUNDARY)).await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(report.fired.len(), 2);

    assert!(wait_for_log(&supervisor, "> say right away").await);
    assert!(!joined_logs(&supervisor).contains("> say after delay"));

    for run in report.runs {
        assert_eq!(run.await.unwrap().failed, 0);
    }
    assert!(wait_for_log(&supervisor, "> say after delay").await);

    let logs = joined_logs(&supervisor);
    let immediate_at = logs.find("> say right away").unwrap();
    let delayed_at = logs.find("> say after delay").unwrap();
    assert!(immediate_at < delayed_at);

    supervisor.kill();
}
