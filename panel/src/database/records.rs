//! Database record types (entities).
//!
//! This module contains all the record structs used by the database layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted cron-driven trigger with its ordered tasks
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Schedule {
    pub id: String,
    pub name: String,
    /// 5-field cron expression or `@reboot`
    pub cron: String,
    pub is_active: bool,
    pub last_run: Option<DateTime<Utc>>,
    pub next_run: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// Ordered by `sequence`, ties by insertion order
    pub tasks: Vec<ScheduleTask>,
}

/// One action inside a schedule
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduleTask {
    pub id: String,
    pub schedule_id: String,
    /// `command`, `power` or `backup`; kept raw so unknown kinds still reach the executor
    pub action: String,
    pub payload: String,
    pub delay_seconds: i64,
    pub sequence: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BackupRecord {
    pub id: String,
    pub name: String,
    pub path: String,
    pub size_bytes: i64,
    pub created_at: DateTime<Utc>,
}
