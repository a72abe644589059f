//! Test configuration builder for creating test configs programmatically

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use super::test_data::TEST_API_KEY;

/// Builder for creating test configurations
pub struct TestConfigBuilder {
    temp_dir: TempDir,
    api_key: String,
    timezone: String,
    program: String,
    log_capacity: usize,
    poll_interval_seconds: u64,
    extra: String,
}

impl TestConfigBuilder {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        Self {
            temp_dir,
            api_key: TEST_API_KEY.to_string(),
            timezone: "UTC".to_string(),
            program: "java".to_string(),
            log_capacity: 100,
            poll_interval_seconds: 60,
            extra: String::new(),
        }
    }

    pub fn api_key(mut self, key: &str) -> Self {
        self.api_key = key.to_string();
        self
    }

    pub fn timezone(mut self, timezone: &str) -> Self {
        self.timezone = timezone.to_string();
        self
    }

    pub fn program(mut self, program: &str) -> Self {
        self.program = program.to_string();
        self
    }

    pub fn log_capacity(mut self, capacity: usize) -> Self {
        self.log_capacity = capacity;
        self
    }

    pub fn poll_interval(mut self, seconds: u64) -> Self {
        self.poll_interval_seconds = seconds;
        self
    }

    /// Raw TOML appended after the generated sections; start it with a table header
    pub fn extra(mut self, toml: &str) -> Self {
        self.extra = toml.to_string();
        self
    }

    /// Write `config/main.toml` and create the server and backup directories
    pub fn build(self) -> TestConfig {
        let root = self.temp_dir.path();
        let config_dir = root.join("config");
        let server_root = root.join("server");
        let backup_dir = root.join("backups");
        fs::create_dir_all(&config_dir).expect("Failed to create config dir");
        fs::create_dir_all(&server_root).expect("Failed to create server dir");

        let main_toml = format!(
            r#"
api_key = "{}"
timezone = "{}"
database_path = "{}"

[server]
root = "{}"
program = "{}"
log_capacity = {}

[backups]
directory = "{}"

[scheduler]
poll_interval_seconds = {}
{}
"#,
            self.api_key,
            self.timezone,
            root.join("panel.db").display(),
            server_root.display(),
            self.program,
            self.log_capacity,
            backup_dir.display(),
            self.poll_interval_seconds,
            self.extra
        );
        fs::write(config_dir.join("main.toml"), main_toml).expect("Failed to write main.toml");

        TestConfig {
            _temp_dir: self.temp_dir,
            config_dir,
            server_root,
            backup_dir,
        }
    }
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Config files on disk; removed when dropped
pub struct TestConfig {
    _temp_dir: TempDir,
    pub config_dir: PathBuf,
    pub server_root: PathBuf,
    pub backup_dir: PathBuf,
}

impl TestConfig {
    pub fn config_dir_string(&self) -> String {
        self.config_dir.to_string_lossy().into_owned()
    }

    pub fn server_root(&self) -> &Path {
        &self.server_root
    }
}
