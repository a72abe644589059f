pub mod config;
pub mod constants;
pub mod database;
pub mod errors;
pub mod process;
pub mod scheduler;
pub mod services;
pub mod web;

// Re-export commonly used types
pub use config::{Config, ConfigManager};
pub use database::Database;
pub use errors::PanelError;
pub use process::{
    ControlAction, ControlOrigin, ProcessStatus, ProcessSupervisor, SupervisorRegistry,
};
pub use scheduler::{TaskExecutor, TaskScheduler};
pub use services::BackupService;
