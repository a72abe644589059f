// File: panel/src/web/server.rs
use anyhow::Result;
use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::web::{handlers, AppState};

pub async fn start_web_server(state: AppState) -> Result<()> {
    let addr = format!("{}:{}", state.config.host, state.config.port);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server running on http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // === MANAGED PROCESS ===
        .route(
            "/api/server",
            get(handlers::get_server_status).post(handlers::control_server),
        )
        // === SCHEDULES ===
        .route(
            "/api/schedules",
            get(handlers::list_schedules).post(handlers::create_schedule),
        )
        .route(
            "/api/schedules/{schedule_id}",
            patch(handlers::update_schedule).delete(handlers::delete_schedule),
        )
        .route(
            "/api/schedules/{schedule_id}/tasks",
            post(handlers::add_task),
        )
        .route(
            "/api/schedules/tasks/{task_id}",
            delete(handlers::delete_task),
        )
        // === BACKUPS ===
        .route(
            "/api/backups",
            get(handlers::list_backups).post(handlers::create_backup),
        )
        .route("/api/backups/{backup_id}", delete(handlers::delete_backup))
        .route(
            "/api/backups/{backup_id}/download",
            get(handlers::download_backup),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
