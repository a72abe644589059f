//! Custom error types for the control panel
//!
//! Provides structured error handling with context for the failure scenarios
//! the core contains at its boundaries: configuration, schedule evaluation,
//! task dispatch and backups.

use std::fmt;

/// Main error type for the control panel
#[derive(Debug)]
pub enum PanelError {
    /// Configuration-related errors
    Config(ConfigError),

    /// Cron expression evaluation errors
    Schedule(ScheduleError),

    /// Scheduled task dispatch errors
    Task(TaskError),

    /// Backup creation and management errors
    Backup(BackupError),

    /// Other errors with context
    Other(String),
}

/// Configuration error variants
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to load configuration file
    LoadFailed { path: String, reason: String },

    /// Invalid configuration value
    InvalidValue { field: String, reason: String },

    /// Configuration parsing error
    ParseError { reason: String },
}

/// Schedule expression error variants
#[derive(Debug, Clone, PartialEq)]
pub enum ScheduleError {
    /// Expression could not be parsed
    InvalidExpression { expression: String, reason: String },

    /// Expression parsed but never fires around the reference instant
    NoOccurrence { expression: String },
}

/// Task dispatch error variants
#[derive(Debug, Clone, PartialEq)]
pub enum TaskError {
    /// Action kind is not one of command, power, backup
    UnknownAction(String),

    /// Power payload is not one of start, stop, kill
    UnknownPowerAction(String),

    /// Backup collaborator reported a failure
    Backup(String),
}

/// Backup error variants
#[derive(Debug)]
pub enum BackupError {
    /// The managed server directory does not exist
    ServerRootMissing(String),

    /// Another backup is being written
    AlreadyRunning,

    /// The archiver failed
    ArchiveFailed(String),

    /// No backup record with this id
    NotFound(String),
}

impl fmt::Display for PanelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PanelError::Config(e) => write!(f, "Configuration error: {}", e),
            PanelError::Schedule(e) => write!(f, "Schedule error: {}", e),
            PanelError::Task(e) => write!(f, "Task error: {}", e),
            PanelError::Backup(e) => write!(f, "Backup error: {}", e),
            PanelError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::LoadFailed { path, reason } => {
                write!(f, "Failed to load config from '{}': {}", path, reason)
            }
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "Invalid value for '{}': {}", field, reason)
            }
            ConfigError::ParseError { reason } => {
                write!(f, "Failed to parse config: {}", reason)
            }
        }
    }
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleError::InvalidExpression { expression, reason } => {
                write!(f, "Invalid cron expression '{}': {}", expression, reason)
            }
            ScheduleError::NoOccurrence { expression } => {
                write!(f, "Cron expression '{}' has no occurrence", expression)
            }
        }
    }
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskError::UnknownAction(action) => write!(f, "Unknown task action '{}'", action),
            TaskError::UnknownPowerAction(payload) => {
                write!(f, "Unknown power action '{}' (expected start, stop or kill)", payload)
            }
            TaskError::Backup(reason) => write!(f, "Backup task failed: {}", reason),
        }
    }
}

impl fmt::Display for BackupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackupError::ServerRootMissing(path) => {
                write!(f, "Server directory not found: {}", path)
            }
            BackupError::AlreadyRunning => write!(f, "A backup is already in progress"),
            BackupError::ArchiveFailed(reason) => write!(f, "Archive creation failed: {}", reason),
            BackupError::NotFound(id) => write!(f, "Backup '{}' not found", id),
        }
    }
}

impl std::error::Error for PanelError {}
impl std::error::Error for ConfigError {}
impl std::error::Error for ScheduleError {}
impl std::error::Error for TaskError {}
impl std::error::Error for BackupError {}

impl From<anyhow::Error> for PanelError {
    fn from(err: anyhow::Error) -> Self {
        PanelError::Other(err.to_string())
    }
}

impl From<ConfigError> for PanelError {
    fn from(err: ConfigError) -> Self {
        PanelError::Config(err)
    }
}

impl From<ScheduleError> for PanelError {
    fn from(err: ScheduleError) -> Self {
        PanelError::Schedule(err)
    }
}

impl From<TaskError> for PanelError {
    fn from(err: TaskError) -> Self {
        PanelError::Task(err)
    }
}

impl From<BackupError> for PanelError {
    fn from(err: BackupError) -> Self {
        PanelError::Backup(err)
    }
}
