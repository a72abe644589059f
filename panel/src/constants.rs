//! Central repository for timing constants, defaults and limits
//!
//! Organized by category so the scheduler heuristics and the managed process
//! defaults have a single source of truth.

use std::time::Duration;

/// Scheduler timing constants
pub mod scheduler {
    use super::Duration;

    /// Period of the scheduler polling loop
    pub const POLL_INTERVAL: Duration = Duration::from_secs(60);

    /// A schedule is due when its previous fire instant is younger than this.
    /// Wider than the poll period so a fire landing just before a tick is not missed.
    pub const DUE_WINDOW_SECONDS: i64 = 65;

    /// A recorded last run this close to the previous fire instant counts as
    /// the same logical interval.
    pub const DEDUP_TOLERANCE_SECONDS: i64 = 10;

    /// Sentinel expression for schedules that fire once when the scheduler starts
    pub const REBOOT_SENTINEL: &str = "@reboot";
}

/// Managed process defaults
pub mod process {
    /// Number of output chunks kept in the log ring buffer
    pub const LOG_CAPACITY: usize = 100;

    /// Line written to the child's stdin to request a cooperative shutdown
    pub const STOP_COMMAND: &str = "stop";

    /// Size of the read buffer used by the stdout/stderr pumps
    pub const READ_CHUNK_BYTES: usize = 8192;

    pub const DEFAULT_PROGRAM: &str = "java";

    pub const DEFAULT_ARGS: [&str; 5] = ["-Xms4G", "-Xmx4G", "-jar", "server.jar", "--nogui"];

    /// How long shutdown waits for the child to honour `stop` before killing it
    pub const SHUTDOWN_GRACE: std::time::Duration = std::time::Duration::from_secs(30);

    /// Files inspected in the working directory for memory-size overrides
    pub const STARTUP_SCRIPTS: [&str; 2] = ["start.bat", "start.sh"];
}

/// Backup defaults
pub mod backups {
    pub const DEFAULT_DIRECTORY: &str = "backups";

    pub const DEFAULT_EXCLUDES: [&str; 10] = [
        "backups",
        "node_modules",
        ".next",
        ".git",
        "*.log",
        "*.lock",
        "cache",
        "libraries",
        "versions",
        "web",
    ];
}

/// Default configuration values
pub mod defaults {
    pub const HOST: &str = "0.0.0.0";

    pub const PORT: u16 = 3000;

    pub const DATABASE_PATH: &str = "data/panel.db";

    pub const TIMEZONE: &str = "UTC";

    pub const SERVER_ROOT: &str = "server";

    /// Registry key for the managed process of this deployment
    pub const INSTANCE: &str = "default";

    pub const CONFIG_DIR: &str = "config";

    pub const CONFIG_DIR_ENV: &str = "PANEL_CONFIG_DIR";
}
