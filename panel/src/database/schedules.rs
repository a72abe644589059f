//! Schedule and schedule task database operations.
//!
//! `list_active_schedules` and `update_run_times` are the schedule store used
//! by the scheduler loop; everything else backs user edits.

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::{debug, info};
use uuid::Uuid;

use super::records::{Schedule, ScheduleTask};
use super::Database;

const SCHEDULE_COLUMNS: &str = "id, name, cron, is_active, last_run, next_run, created_at";

fn schedule_from_row(row: &SqliteRow) -> Result<Schedule> {
    Ok(Schedule {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        cron: row.try_get("cron")?,
        is_active: row.try_get("is_active")?,
        last_run: row.try_get("last_run")?,
        next_run: row.try_get("next_run")?,
        created_at: row.try_get("created_at")?,
        tasks: Vec::new(),
    })
}

fn task_from_row(row: &SqliteRow) -> Result<ScheduleTask> {
    Ok(ScheduleTask {
        id: row.try_get("id")?,
        schedule_id: row.try_get("schedule_id")?,
        action: row.try_get("action")?,
        payload: row.try_get("payload")?,
        delay_seconds: row.try_get("delay_seconds")?,
        sequence: row.try_get("sequence")?,
    })
}

impl Database {
    /// Active schedules with their tasks in execution order
    pub async fn list_active_schedules(&self) -> Result<Vec<Schedule>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM schedules WHERE is_active = 1 ORDER BY created_at",
            SCHEDULE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut schedules = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut schedule = schedule_from_row(row)?;
            schedule.tasks = self.get_tasks(&schedule.id).await?;
            schedules.push(schedule);
        }

        debug!("Loaded {} active schedules", schedules.len());
        Ok(schedules)
    }

    /// Record a firing. Touches only the given row.
    pub async fn update_run_times(
        &self,
        schedule_id: &str,
        last_run: DateTime<Utc>,
        next_run: Option<DateTime<Utc>>,
    ) -> Result<()> {
        sqlx::query("UPDATE schedules SET last_run = ?, next_run = ? WHERE id = ?")
            .bind(last_run)
            .bind(next_run)
            .bind(schedule_id)
            .execute(&self.pool)
            .await?;

        debug!(
            "Updated run times for schedule {}: last_run={}, next_run={:?}",
            schedule_id, last_run, next_run
        );
        Ok(())
    }

    pub async fn create_schedule(&self, name: &str, cron: &str) -> Result<Schedule> {
        let schedule = Schedule {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            cron: cron.trim().to_string(),
            is_active: true,
            last_run: None,
            next_run: None,
            created_at: Utc::now(),
            tasks: Vec::new(),
        };

        sqlx::query(
            r#"
            INSERT INTO schedules (id, name, cron, is_active, last_run, next_run, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&schedule.id)
        .bind(&schedule.name)
        .bind(&schedule.cron)
        .bind(schedule.is_active)
        .bind(schedule.last_run)
        .bind(schedule.next_run)
        .bind(schedule.created_at)
        .execute(&self.pool)
        .await?;

        info!(
            "Created schedule '{}' ({}) with cron '{}'",
            schedule.name, schedule.id, schedule.cron
        );
        Ok(schedule)
    }

    /// All schedules, newest first, with their tasks
    pub async fn list_schedules(&self) -> Result<Vec<Schedule>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM schedules ORDER BY created_at DESC",
            SCHEDULE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut schedules = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut schedule = schedule_from_row(row)?;
            schedule.tasks = self.get_tasks(&schedule.id).await?;
            schedules.push(schedule);
        }
        Ok(schedules)
    }

    pub async fn get_schedule(&self, schedule_id: &str) -> Result<Option<Schedule>> {
        let row = sqlx::query(&format!("SELECT {} FROM schedules WHERE id = ?", SCHEDULE_COLUMNS))
            .bind(schedule_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let mut schedule = schedule_from_row(&row)?;
                schedule.tasks = self.get_tasks(&schedule.id).await?;
                Ok(Some(schedule))
            }
            None => Ok(None),
        }
    }

    /// Returns false when no schedule has this id
    pub async fn set_schedule_active(&self, schedule_id: &str, is_active: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE schedules SET is_active = ? WHERE id = ?")
            .bind(is_active)
            .bind(schedule_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Returns false when no schedule has this id
    pub async fn update_schedule(
        &self,
        schedule_id: &str,
        name: Option<&str>,
        cron: Option<&str>,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE schedules SET name = COALESCE(?, name), cron = COALESCE(?, cron) WHERE id = ?",
        )
        .bind(name)
        .bind(cron.map(str::trim))
        .bind(schedule_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes the schedule and its tasks. Returns false when nothing was deleted.
    pub async fn delete_schedule(&self, schedule_id: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM schedule_tasks WHERE schedule_id = ?")
            .bind(schedule_id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM schedules WHERE id = ?")
            .bind(schedule_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!("Deleted schedule {}", schedule_id);
        }
        Ok(deleted)
    }

    /// Append a task; its sequence is the current epoch milliseconds.
    /// Returns None when the schedule does not exist.
    pub async fn add_task(
        &self,
        schedule_id: &str,
        action: &str,
        payload: &str,
        delay_seconds: i64,
    ) -> Result<Option<ScheduleTask>> {
        let sequence = Utc::now().timestamp_millis();
        self.add_task_with_sequence(schedule_id, action, payload, delay_seconds, sequence)
            .await
    }

    pub async fn add_task_with_sequence(
        &self,
        schedule_id: &str,
        action: &str,
        payload: &str,
        delay_seconds: i64,
        sequence: i64,
    ) -> Result<Option<ScheduleTask>> {
        let exists = sqlx::query("SELECT 1 FROM schedules WHERE id = ?")
            .bind(schedule_id)
            .fetch_optional(&self.pool)
            .await?
            .is_some();
        if !exists {
            return Ok(None);
        }

        let task = ScheduleTask {
            id: Uuid::new_v4().to_string(),
            schedule_id: schedule_id.to_string(),
            action: action.to_string(),
            payload: payload.to_string(),
            delay_seconds: delay_seconds.max(0),
            sequence,
        };

        sqlx::query(
            r#"
            INSERT INTO schedule_tasks (id, schedule_id, action, payload, delay_seconds, sequence)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&task.id)
        .bind(&task.schedule_id)
        .bind(&task.action)
        .bind(&task.payload)
        .bind(task.delay_seconds)
        .bind(task.sequence)
        .execute(&self.pool)
        .await?;

        debug!("Added {} task {} to schedule {}", task.action, task.id, schedule_id);
        Ok(Some(task))
    }

    pub async fn delete_task(&self, task_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM schedule_tasks WHERE id = ?")
            .bind(task_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_tasks(&self, schedule_id: &str) -> Result<Vec<ScheduleTask>> {
        let rows = sqlx::query(
            r#"
            SELECT id, schedule_id, action, payload, delay_seconds, sequence
            FROM schedule_tasks
            WHERE schedule_id = ?
            ORDER BY sequence ASC, rowid ASC
            "#,
        )
        .bind(schedule_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(task_from_row).collect()
    }
}
