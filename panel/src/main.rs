// File: panel/src/main.rs
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use panel::constants::process::SHUTDOWN_GRACE;
use panel::process::LaunchSpec;
use panel::web::{start_web_server, AppState};
use panel::{
    BackupService, ConfigManager, Database, SupervisorRegistry, TaskExecutor, TaskScheduler,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging with reduced verbosity
    let env_filter = EnvFilter::from_default_env()
        .add_directive("panel=info".parse()?)
        .add_directive("tower_http=warn".parse()?)
        .add_directive("hyper=warn".parse()?)
        .add_directive("sqlx=warn".parse()?);

    fmt().with_env_filter(env_filter).init();

    info!("Starting server control panel");

    // Load configuration
    let config_manager = ConfigManager::from_env().await?;
    let config = config_manager.get_current_config();
    let timezone = config_manager.timezone();

    // Initialize database
    let database = Arc::new(Database::new(&config.database_path).await?);
    info!("Database initialized");

    // One supervisor per deployment instance
    let supervisor = SupervisorRegistry::global().get_or_create(
        &config.server.instance,
        LaunchSpec::from(&config.server),
        config.server.log_capacity,
    );
    info!(
        "Process supervisor ready for instance '{}' ({})",
        config.server.instance,
        config.server.root.display()
    );

    let backup_service = Arc::new(BackupService::new(
        database.clone(),
        &config.server,
        &config.backups,
    ));

    // Start task scheduler
    let executor = TaskExecutor::new(supervisor.clone(), backup_service.clone());
    let scheduler = Arc::new(TaskScheduler::new(
        database.clone(),
        executor,
        timezone,
        Duration::from_secs(config.scheduler.poll_interval_seconds),
    ));
    let _scheduler_handle = scheduler.start();
    info!("Task scheduler started");

    // Start web server
    let state = AppState::new(config.clone(), database, supervisor.clone(), backup_service);
    info!("Starting web server on {}:{}", config.host, config.port);

    if let Err(e) = start_web_server(state).await {
        error!("Web server failed: {}", e);
        supervisor.kill();
        return Err(e);
    }

    if supervisor.is_running() {
        info!("Stopping managed process before exit");
        supervisor.stop();
        let deadline = tokio::time::Instant::now() + SHUTDOWN_GRACE;
        while supervisor.is_running() && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(250)).await;
        }
        if supervisor.is_running() {
            warn!("Managed process did not stop within {:?}, killing", SHUTDOWN_GRACE);
            supervisor.kill();
        }
    }

    Ok(())
}
