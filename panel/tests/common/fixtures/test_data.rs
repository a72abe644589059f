//! Common test data and constants

use chrono::{DateTime, Utc};

pub const TEST_API_KEY: &str = "test-api-key";

/// Parse an RFC 3339 instant
pub fn utc(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .expect("valid RFC 3339 timestamp")
        .with_timezone(&Utc)
}

/// Common cron expressions
pub mod crons {
    pub const EVERY_FIVE_MINUTES: &str = "*/5 * * * *";
    pub const DAILY_3AM: &str = "0 3 * * *";
    pub const REBOOT: &str = "@reboot";
    pub const MALFORMED: &str = "every tuesday";
}

/// Reference instants
pub mod instants {
    /// On a five minute boundary
    pub const BOUNDARY: &str = "2024-03-10T12:05:00Z";
    pub const BOUNDARY_PLUS_30S: &str = "2024-03-10T12:05:30Z";
    pub const NEXT_FIRE: &str = "2024-03-10T12:10:00Z";
}

/// Task action kinds
pub mod actions {
    pub const COMMAND: &str = "command";
    pub const POWER: &str = "power";
    pub const BACKUP: &str = "backup";
}
