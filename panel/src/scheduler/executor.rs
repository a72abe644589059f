//! Sequential execution of one schedule's tasks.

use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::database::{Schedule, ScheduleTask};
use crate::errors::TaskError;
use crate::process::{ControlAction, ControlOrigin, ProcessSupervisor};
use crate::services::BackupService;

/// Decoded task action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskAction {
    Command(String),
    Power(ControlAction),
    Backup,
}

impl TaskAction {
    pub fn from_task(task: &ScheduleTask) -> Result<Self, TaskError> {
        match task.action.as_str() {
            "command" => Ok(TaskAction::Command(task.payload.clone())),
            "power" => match task.payload.trim() {
                "start" => Ok(TaskAction::Power(ControlAction::Start)),
                "stop" => Ok(TaskAction::Power(ControlAction::Stop)),
                "kill" => Ok(TaskAction::Power(ControlAction::Kill)),
                other => Err(TaskError::UnknownPowerAction(other.to_string())),
            },
            "backup" => Ok(TaskAction::Backup),
            other => Err(TaskError::UnknownAction(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionReport {
    pub schedule_id: String,
    pub attempted: usize,
    pub failed: usize,
}

/// Runs a schedule's tasks one at a time in `sequence` order. A failing task
/// is logged and the run moves on; there is no rollback and no retry.
#[derive(Clone)]
pub struct TaskExecutor {
    supervisor: Arc<ProcessSupervisor>,
    backups: Arc<BackupService>,
}

impl TaskExecutor {
    pub fn new(supervisor: Arc<ProcessSupervisor>, backups: Arc<BackupService>) -> Self {
        Self {
            supervisor,
            backups,
        }
    }

    pub async fn run(&self, schedule: &Schedule) -> ExecutionReport {
        let mut report = ExecutionReport {
            schedule_id: schedule.id.clone(),
            ..Default::default()
        };

        let mut tasks: Vec<&ScheduleTask> = schedule.tasks.iter().collect();
        // stable: equal sequences keep store order
        tasks.sort_by_key(|task| task.sequence);

        info!(
            "Executing schedule '{}' ({}) with {} tasks",
            schedule.name,
            schedule.id,
            tasks.len()
        );

        for task in tasks {
            if task.delay_seconds > 0 {
                tokio::time::sleep(Duration::from_secs(task.delay_seconds as u64)).await;
            }

            report.attempted += 1;
            if let Err(e) = self.dispatch(task).await {
                report.failed += 1;
                error!(
                    "✗ Task {} (sequence {}) of schedule '{}' failed: {}",
                    task.id, task.sequence, schedule.name, e
                );
            }
        }

        if report.failed > 0 {
            warn!(
                "Schedule '{}' finished with {}/{} failed tasks",
                schedule.name, report.failed, report.attempted
            );
        } else {
            info!("✓ Schedule '{}' finished ({} tasks)", schedule.name, report.attempted);
        }
        report
    }

    async fn dispatch(&self, task: &ScheduleTask) -> Result<(), TaskError> {
        match TaskAction::from_task(task)? {
            TaskAction::Command(text) => {
                self.supervisor
                    .apply(ControlAction::Command(text), ControlOrigin::Scheduler)
                    .await;
            }
            TaskAction::Power(action) => {
                self.supervisor.apply(action, ControlOrigin::Scheduler).await;
            }
            TaskAction::Backup => {
                self.backups
                    .create_backup()
                    .await
                    .map_err(|e| TaskError::Backup(e.to_string()))?;
            }
        }
        Ok(())
    }
}
