//! Cron-driven task scheduling
//!
//! - `cron` - due-calculator: previous/next fire instants for a crontab expression
//! - `engine` - the polling loop deciding which schedules are due each tick
//! - `executor` - runs one schedule's tasks in sequence order
//!
//! Schedules live in the database and are edited through the HTTP surface;
//! the loop re-reads them on every tick, so edits take effect on the next poll.
//!
//! ```toml
//! timezone = "Europe/Berlin"   # cron expressions are evaluated in this zone
//!
//! [scheduler]
//! poll_interval_seconds = 60
//! ```

pub mod cron;
pub mod engine;
pub mod executor;

pub use self::cron::{CronExpression, FireWindow};
pub use engine::{evaluate_due, DueDecision, TaskScheduler, TickReport};
pub use executor::{ExecutionReport, TaskAction, TaskExecutor};
