// Managed process status and control endpoints

use axum::{extract::State, http::StatusCode, response::Json};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use super::common::{api_error, ApiResponse, ApiResult};
use crate::process::{ControlAction, ControlOrigin, ProcessStatus};
use crate::web::middleware::ApiKeyAuth;
use crate::web::AppState;

#[derive(Debug, Deserialize)]
pub struct ServerControlRequest {
    pub action: String,
    #[serde(default)]
    pub command: Option<String>,
}

/// Running flag plus the log buffer snapshot
pub async fn get_server_status(
    _auth: ApiKeyAuth,
    State(state): State<Arc<AppState>>,
) -> ApiResult<ProcessStatus> {
    Ok(Json(ApiResponse::success(state.supervisor.status())))
}

/// Start, stop, kill or send a console command
pub async fn control_server(
    _auth: ApiKeyAuth,
    State(state): State<Arc<AppState>>,
    Json(request): Json<ServerControlRequest>,
) -> ApiResult<Value> {
    let action = match request.action.as_str() {
        "start" => ControlAction::Start,
        "stop" => ControlAction::Stop,
        "kill" => ControlAction::Kill,
        "command" => {
            let text = request.command.unwrap_or_default();
            if text.trim().is_empty() {
                return Ok(Json(
                    ApiResponse::success(json!({ "action": "command" }))
                        .with_message("Empty command ignored"),
                ));
            }
            ControlAction::Command(text)
        }
        other => {
            return Err(api_error(
                StatusCode::BAD_REQUEST,
                format!("Invalid action '{}'", other),
            ))
        }
    };

    let name = action.name();
    info!("Server control requested: {}", name);
    state.supervisor.apply(action, ControlOrigin::Interactive).await;

    Ok(Json(ApiResponse::success(json!({
        "action": name,
        "running": state.supervisor.is_running(),
    }))))
}
