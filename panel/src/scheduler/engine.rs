use anyhow::Result;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use chrono_tz::Tz;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, instrument, warn};

use super::cron::{CronExpression, FireWindow};
use super::executor::{ExecutionReport, TaskExecutor};
use crate::constants::scheduler::{DEDUP_TOLERANCE_SECONDS, DUE_WINDOW_SECONDS};
use crate::database::{Database, Schedule};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueDecision {
    Due(FireWindow),
    /// Previous fire is in the future or older than the due window
    NotDue,
    /// `last_run` already covers this fire
    AlreadyHandled,
}

/// Best-effort once: a fire is due while it is younger than the due window,
/// unless `last_run` sits within the dedup tolerance of it.
pub fn evaluate_due(
    window: FireWindow,
    last_run: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> DueDecision {
    let age = now - window.prev;
    if age < ChronoDuration::zero() || age >= ChronoDuration::seconds(DUE_WINDOW_SECONDS) {
        return DueDecision::NotDue;
    }

    if let Some(last_run) = last_run {
        let skew_ms = (last_run - window.prev).num_milliseconds().abs();
        if skew_ms < DEDUP_TOLERANCE_SECONDS * 1000 {
            return DueDecision::AlreadyHandled;
        }
    }

    DueDecision::Due(window)
}

/// Outcome of one polling pass
#[derive(Debug, Default)]
pub struct TickReport {
    pub evaluated: usize,
    /// Ids of the schedules fired this tick
    pub fired: Vec<String>,
    /// Schedules skipped because of an error
    pub errors: usize,
    /// Executor runs started this tick, one task per schedule
    pub runs: Vec<JoinHandle<ExecutionReport>>,
}

/// The polling driver and the only writer of `last_run`/`next_run`.
pub struct TaskScheduler {
    database: Arc<Database>,
    executor: TaskExecutor,
    timezone: Tz,
    poll_interval: Duration,
}

impl TaskScheduler {
    pub fn new(
        database: Arc<Database>,
        executor: TaskExecutor,
        timezone: Tz,
        poll_interval: Duration,
    ) -> Self {
        Self {
            database,
            executor,
            timezone,
            poll_interval,
        }
    }

    /// Fire `@reboot` schedules, then poll every `poll_interval` forever.
    /// The first poll happens one period after start.
    pub fn start(self: Arc<Self>) -> JoinHandle<()> {
        info!(
            "Starting task scheduler (poll every {}s, timezone {})",
            self.poll_interval.as_secs(),
            self.timezone
        );

        tokio::spawn(async move {
            match self.run_reboot_schedules(Utc::now()).await {
                Ok(runs) if !runs.is_empty() => info!("Started {} @reboot schedules", runs.len()),
                Ok(_) => {}
                Err(e) => error!("Failed to run @reboot schedules: {}", e),
            }

            let mut interval =
                tokio::time::interval_at(Instant::now() + self.poll_interval, self.poll_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                match self.tick(Utc::now()).await {
                    Ok(report) => debug!(
                        "Scheduler tick: {} evaluated, {} fired, {} errors",
                        report.evaluated,
                        report.fired.len(),
                        report.errors
                    ),
                    Err(e) => error!("Scheduler tick failed: {}", e),
                }
            }
        })
    }

    /// Evaluate every active schedule against `now`. Only a failure to load
    /// the schedules is returned; per-schedule failures are logged and counted.
    #[instrument(skip(self))]
    pub async fn tick(&self, now: DateTime<Utc>) -> Result<TickReport> {
        let schedules = self.database.list_active_schedules().await?;
        let mut report = TickReport::default();

        for schedule in schedules {
            report.evaluated += 1;
            match self.evaluate(schedule, now).await {
                Ok(Some((id, run))) => {
                    report.fired.push(id);
                    report.runs.push(run);
                }
                Ok(None) => {}
                Err(e) => {
                    report.errors += 1;
                    error!("✗ {}", e);
                }
            }
        }

        Ok(report)
    }

    async fn evaluate(
        &self,
        schedule: Schedule,
        now: DateTime<Utc>,
    ) -> Result<Option<(String, JoinHandle<ExecutionReport>)>> {
        let expression = CronExpression::parse(&schedule.cron).map_err(|e| {
            anyhow::anyhow!("Skipping schedule '{}' ({}): {}", schedule.name, schedule.id, e)
        })?;

        let window = match expression.fire_window(now, self.timezone)? {
            Some(window) => window,
            None => return Ok(None),
        };

        let window = match evaluate_due(window, schedule.last_run, now) {
            DueDecision::Due(window) => window,
            DueDecision::AlreadyHandled => {
                debug!("Schedule '{}' already ran for {}", schedule.name, window.prev);
                return Ok(None);
            }
            DueDecision::NotDue => return Ok(None),
        };

        info!(
            "Schedule '{}' ({}) is due (fire at {}, next {})",
            schedule.name, schedule.id, window.prev, window.next
        );

        let id = schedule.id.clone();
        let run = self.spawn_run(schedule);

        if let Err(e) = self
            .database
            .update_run_times(&id, window.prev, Some(window.next))
            .await
        {
            warn!("Failed to record run times for schedule {}: {}", id, e);
        }

        Ok(Some((id, run)))
    }

    /// Run every active `@reboot` schedule once, recording `started_at` as its last run
    pub async fn run_reboot_schedules(
        &self,
        started_at: DateTime<Utc>,
    ) -> Result<Vec<JoinHandle<ExecutionReport>>> {
        let schedules = self.database.list_active_schedules().await?;
        let mut runs = Vec::new();

        for schedule in schedules {
            match CronExpression::parse(&schedule.cron) {
                Ok(expression) if expression.is_reboot() => {}
                _ => continue,
            }

            info!("Running @reboot schedule '{}' ({})", schedule.name, schedule.id);
            let id = schedule.id.clone();
            runs.push(self.spawn_run(schedule));

            if let Err(e) = self.database.update_run_times(&id, started_at, None).await {
                warn!("Failed to record run time for @reboot schedule {}: {}", id, e);
            }
        }

        Ok(runs)
    }

    fn spawn_run(&self, schedule: Schedule) -> JoinHandle<ExecutionReport> {
        let executor = self.executor.clone();
        tokio::spawn(async move { executor.run(&schedule).await })
    }
}
