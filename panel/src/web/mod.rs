// File: panel/src/web/mod.rs
pub mod handlers;
pub mod middleware;
pub mod server;

pub use server::{create_router, start_web_server};

use std::sync::Arc;

use crate::config::Config;
use crate::database::Database;
use crate::process::ProcessSupervisor;
use crate::services::BackupService;

// Application state shared across all handlers
pub struct AppState {
    pub config: Arc<Config>,
    pub database: Arc<Database>,
    pub supervisor: Arc<ProcessSupervisor>,
    pub backup_service: Arc<BackupService>,
    pub api_key: String,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        database: Arc<Database>,
        supervisor: Arc<ProcessSupervisor>,
        backup_service: Arc<BackupService>,
    ) -> Self {
        let api_key = config.api_key.clone();
        Self {
            config,
            database,
            supervisor,
            backup_service,
            api_key,
        }
    }
}
