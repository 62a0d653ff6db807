//! API request and response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::TimerStatus;

/// Request body for starting (or resuming) the timer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StartTimerRequest {
    /// Hours already accrued on previous runs, fractional
    #[serde(default)]
    pub elapsed_hours: f64,
    /// When the run started remotely; omit to start now
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
}

/// API response structure for timer change endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub timer: TimerStatus,
}

impl ApiResponse {
    /// Create a new API response
    pub fn new(status: String, message: String, timer: TimerStatus) -> Self {
        Self {
            status,
            message,
            timestamp: Utc::now(),
            timer,
        }
    }

    /// Create a running response
    pub fn running(message: String, timer: TimerStatus) -> Self {
        Self::new("running".to_string(), message, timer)
    }

    /// Create a stopped response
    pub fn stopped(message: String, timer: TimerStatus) -> Self {
        Self::new("stopped".to_string(), message, timer)
    }

    /// Create an error response
    pub fn error(message: String, timer: TimerStatus) -> Self {
        Self::new("error".to_string(), message, timer)
    }
}

/// Status response with timer and server information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub timer: TimerStatus,
    /// Measured server clock offset in seconds, if synced
    pub server_offset: Option<f64>,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
