// Backup endpoints

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tokio_util::io::ReaderStream;
use tracing::{error, info};

use super::common::{api_error, internal_error, ApiError, ApiResponse, ApiResult};
use crate::database::BackupRecord;
use crate::errors::BackupError;
use crate::web::middleware::ApiKeyAuth;
use crate::web::AppState;

fn backup_error(err: anyhow::Error) -> ApiError {
    let status = match err.downcast_ref::<BackupError>() {
        Some(BackupError::AlreadyRunning) => StatusCode::CONFLICT,
        Some(BackupError::NotFound(_)) => StatusCode::NOT_FOUND,
        Some(BackupError::ServerRootMissing(_)) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    api_error(status, err.to_string())
}

pub async fn list_backups(
    _auth: ApiKeyAuth,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Vec<BackupRecord>> {
    state
        .backup_service
        .list_backups()
        .await
        .map(|backups| Json(ApiResponse::success(backups)))
        .map_err(backup_error)
}

/// Runs the backup to completion before responding
pub async fn create_backup(
    _auth: ApiKeyAuth,
    State(state): State<Arc<AppState>>,
) -> ApiResult<BackupRecord> {
    info!("Backup requested");
    match state.backup_service.create_backup().await {
        Ok(record) => Ok(Json(ApiResponse::success(record))),
        Err(e) => {
            error!("Backup failed: {}", e);
            Err(backup_error(e))
        }
    }
}

pub async fn delete_backup(
    _auth: ApiKeyAuth,
    Path(backup_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<BackupRecord> {
    state
        .backup_service
        .delete_backup(&backup_id)
        .await
        .map(|record| Json(ApiResponse::success(record)))
        .map_err(backup_error)
}

/// Streams the archive as an attachment
pub async fn download_backup(
    _auth: ApiKeyAuth,
    Path(backup_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let (record, file) = state
        .backup_service
        .open_backup(&backup_id)
        .await
        .map_err(backup_error)?;

    let length = file.metadata().await.map_err(internal_error)?.len();
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", record.name))
        .map_err(internal_error)?;

    info!("Downloading backup {} ({} bytes)", record.name, length);
    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/gzip")),
            (header::CONTENT_DISPOSITION, disposition),
            (header::CONTENT_LENGTH, HeaderValue::from(length)),
        ],
        Body::from_stream(ReaderStream::new(file)),
    )
        .into_response())
}
