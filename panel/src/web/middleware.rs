//! Middleware for the panel HTTP surface
//!
//! Every route requires the configured API key as a bearer token.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use std::sync::Arc;
use tracing::debug;

use super::AppState;

/// Extractor that validates the API key from the Authorization header.
///
/// # Example
/// ```ignore
/// async fn my_handler(
///     _auth: ApiKeyAuth,
///     State(state): State<Arc<AppState>>,
/// ) -> ApiResult<ProcessStatus> {
///     // API key is already validated
/// }
/// ```
pub struct ApiKeyAuth;

impl FromRequestParts<Arc<AppState>> for ApiKeyAuth {
    type Rejection = StatusCode;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.strip_prefix("Bearer "));

        match auth_header {
            Some(token) if token == state.api_key => Ok(ApiKeyAuth),
            _ => {
                debug!("Rejected request to {} without a valid API key", parts.uri.path());
                Err(StatusCode::UNAUTHORIZED)
            }
        }
    }
}
