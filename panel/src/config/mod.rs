pub mod manager;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
pub use manager::ConfigManager;

use crate::constants::{backups, defaults, process, scheduler};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Bearer token required by every HTTP route
    pub api_key: String,
    #[serde(default = "default_database_path")]
    pub database_path: String,
    /// IANA zone cron expressions are evaluated in
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub backups: BackupConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Working directory of the managed process
    #[serde(default = "default_server_root")]
    pub root: PathBuf,
    #[serde(default = "default_program")]
    pub program: String,
    #[serde(default = "default_args")]
    pub args: Vec<String>,
    #[serde(default = "default_startup_scripts")]
    pub startup_scripts: Vec<String>,
    #[serde(default = "default_log_capacity")]
    pub log_capacity: usize,
    #[serde(default = "default_instance")]
    pub instance: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupConfig {
    #[serde(default = "default_backup_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_backup_excludes")]
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            root: default_server_root(),
            program: default_program(),
            args: default_args(),
            startup_scripts: default_startup_scripts(),
            log_capacity: default_log_capacity(),
            instance: default_instance(),
        }
    }
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            directory: default_backup_directory(),
            exclude: default_backup_excludes(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: default_poll_interval(),
        }
    }
}

fn default_host() -> String {
    defaults::HOST.to_string()
}

fn default_port() -> u16 {
    defaults::PORT
}

fn default_database_path() -> String {
    defaults::DATABASE_PATH.to_string()
}

fn default_timezone() -> String {
    defaults::TIMEZONE.to_string()
}

fn default_server_root() -> PathBuf {
    PathBuf::from(defaults::SERVER_ROOT)
}

fn default_program() -> String {
    process::DEFAULT_PROGRAM.to_string()
}

fn default_args() -> Vec<String> {
    process::DEFAULT_ARGS.iter().map(|a| a.to_string()).collect()
}

fn default_startup_scripts() -> Vec<String> {
    process::STARTUP_SCRIPTS.iter().map(|s| s.to_string()).collect()
}

fn default_log_capacity() -> usize {
    process::LOG_CAPACITY
}

fn default_instance() -> String {
    defaults::INSTANCE.to_string()
}

fn default_backup_directory() -> PathBuf {
    PathBuf::from(backups::DEFAULT_DIRECTORY)
}

fn default_backup_excludes() -> Vec<String> {
    backups::DEFAULT_EXCLUDES.iter().map(|e| e.to_string()).collect()
}

fn default_poll_interval() -> u64 {
    scheduler::POLL_INTERVAL.as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_fills_defaults() {
        let config: Config = toml::from_str(r#"api_key = "secret""#).unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.timezone, "UTC");
        assert_eq!(config.server.program, "java");
        assert_eq!(
            config.server.args,
            vec!["-Xms4G", "-Xmx4G", "-jar", "server.jar", "--nogui"]
        );
        assert_eq!(config.server.log_capacity, 100);
        assert_eq!(config.scheduler.poll_interval_seconds, 60);
        assert!(config.backups.exclude.iter().any(|e| e == "*.lock"));
    }

    #[test]
    fn test_server_section_overrides() {
        let config: Config = toml::from_str(
            r#"
            api_key = "secret"
            timezone = "Europe/Istanbul"

            [server]
            root = "/srv/game"
            program = "/usr/bin/java"
            log_capacity = 250
            "#,
        )
        .unwrap();

        assert_eq!(config.server.root, PathBuf::from("/srv/game"));
        assert_eq!(config.server.program, "/usr/bin/java");
        assert_eq!(config.server.log_capacity, 250);
        // untouched keys keep their defaults
        assert_eq!(config.server.startup_scripts, vec!["start.bat", "start.sh"]);
    }
}
