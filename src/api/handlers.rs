//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use tracing::{error, info, warn};

use crate::state::AppState;
use super::responses::{ApiResponse, HealthResponse, StartTimerRequest, StatusResponse};

/// Handle POST /timer/start - Start or resume the timer
pub async fn start_handler(
    State(state): State<Arc<AppState>>,
    body: Option<Json<StartTimerRequest>>,
) -> Result<Json<ApiResponse>, StatusCode> {
    let request = body.map(|Json(r)| r).unwrap_or_default();

    // Measure the offset before seeding so a resumed run folds in the
    // server-side elapsed interval correctly.
    if let Err(e) = state.sync_server_offset().await {
        warn!("Starting timer without a server offset: {}", e);
    }

    match state.start_timer(request.elapsed_hours, request.started_at) {
        Ok(timer) => {
            info!("Start endpoint called - timer running at {}", timer.time);
            Ok(Json(ApiResponse::running(
                "Timer started".to_string(),
                timer,
            )))
        }
        Err(e) => {
            error!("Failed to start timer: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /timer/stop - Stop the timer and return the final value
pub async fn stop_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, StatusCode> {
    match state.stop_timer() {
        Ok(timer) => {
            info!(
                "Stop endpoint called - timer stopped at {} ({:.4}h)",
                timer.time, timer.elapsed_hours
            );
            Ok(Json(ApiResponse::stopped("Timer stopped".to_string(), timer)))
        }
        Err(e) => {
            warn!("Stop requested but {}", e);
            match state.get_status() {
                Ok(timer) => Ok(Json(ApiResponse::error(e, timer))),
                Err(e) => {
                    error!("Failed to get timer status: {}", e);
                    Err(StatusCode::INTERNAL_SERVER_ERROR)
                }
            }
        }
    }
}

/// Handle GET /status - Return current timer and server status
pub async fn status_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatusResponse>, StatusCode> {
    let timer = match state.get_status() {
        Ok(t) => t,
        Err(e) => {
            error!("Failed to get timer status: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        timer,
        server_offset: state.coordinator.cached_offset(),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
