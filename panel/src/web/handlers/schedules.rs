// Schedule and task editing endpoints
//
// Handlers never touch last_run/next_run; the scheduler loop owns them.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info};

use super::common::{api_error, internal_error, ApiError, ApiResponse, ApiResult};
use crate::database::{Schedule, ScheduleTask};
use crate::scheduler::{CronExpression, TaskAction};
use crate::web::middleware::ApiKeyAuth;
use crate::web::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateScheduleRequest {
    pub name: String,
    pub cron: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateScheduleRequest {
    pub name: Option<String>,
    pub cron: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub action: String,
    #[serde(default)]
    pub payload: String,
    #[serde(default)]
    pub delay_seconds: i64,
}

fn validate_cron(cron: &str) -> Result<(), ApiError> {
    CronExpression::parse(cron)
        .map(|_| ())
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))
}

fn schedule_not_found(id: &str) -> ApiError {
    api_error(StatusCode::NOT_FOUND, format!("Schedule '{}' not found", id))
}

pub async fn list_schedules(
    _auth: ApiKeyAuth,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Vec<Schedule>> {
    match state.database.list_schedules().await {
        Ok(schedules) => Ok(Json(ApiResponse::success(schedules))),
        Err(e) => {
            error!("Failed to list schedules: {}", e);
            Err(internal_error(e))
        }
    }
}

pub async fn create_schedule(
    _auth: ApiKeyAuth,
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateScheduleRequest>,
) -> ApiResult<Schedule> {
    if request.name.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Schedule name is required"));
    }
    validate_cron(&request.cron)?;

    let schedule = state
        .database
        .create_schedule(request.name.trim(), &request.cron)
        .await
        .map_err(internal_error)?;

    Ok(Json(ApiResponse::success(schedule)))
}

pub async fn update_schedule(
    _auth: ApiKeyAuth,
    Path(schedule_id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<UpdateScheduleRequest>,
) -> ApiResult<Schedule> {
    if let Some(cron) = &request.cron {
        validate_cron(cron)?;
    }

    let found = state
        .database
        .update_schedule(&schedule_id, request.name.as_deref(), request.cron.as_deref())
        .await
        .map_err(internal_error)?;
    if !found {
        return Err(schedule_not_found(&schedule_id));
    }

    if let Some(is_active) = request.is_active {
        state
            .database
            .set_schedule_active(&schedule_id, is_active)
            .await
            .map_err(internal_error)?;
        info!("Schedule {} active={}", schedule_id, is_active);
    }

    match state.database.get_schedule(&schedule_id).await {
        Ok(Some(schedule)) => Ok(Json(ApiResponse::success(schedule))),
        Ok(None) => Err(schedule_not_found(&schedule_id)),
        Err(e) => Err(internal_error(e)),
    }
}

pub async fn delete_schedule(
    _auth: ApiKeyAuth,
    Path(schedule_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Value> {
    match state.database.delete_schedule(&schedule_id).await {
        Ok(true) => Ok(Json(ApiResponse::success(json!({ "deleted": schedule_id })))),
        Ok(false) => Err(schedule_not_found(&schedule_id)),
        Err(e) => {
            error!("Failed to delete schedule {}: {}", schedule_id, e);
            Err(internal_error(e))
        }
    }
}

pub async fn add_task(
    _auth: ApiKeyAuth,
    Path(schedule_id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateTaskRequest>,
) -> ApiResult<ScheduleTask> {
    let candidate = ScheduleTask {
        id: String::new(),
        schedule_id: schedule_id.clone(),
        action: request.action.clone(),
        payload: request.payload.clone(),
        delay_seconds: request.delay_seconds,
        sequence: 0,
    };
    TaskAction::from_task(&candidate)
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;

    match state
        .database
        .add_task(
            &schedule_id,
            &request.action,
            &request.payload,
            request.delay_seconds,
        )
        .await
    {
        Ok(Some(task)) => Ok(Json(ApiResponse::success(task))),
        Ok(None) => Err(schedule_not_found(&schedule_id)),
        Err(e) => Err(internal_error(e)),
    }
}

pub async fn delete_task(
    _auth: ApiKeyAuth,
    Path(task_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Value> {
    match state.database.delete_task(&task_id).await {
        Ok(true) => Ok(Json(ApiResponse::success(json!({ "deleted": task_id })))),
        Ok(false) => Err(api_error(
            StatusCode::NOT_FOUND,
            format!("Task '{}' not found", task_id),
        )),
        Err(e) => Err(internal_error(e)),
    }
}
