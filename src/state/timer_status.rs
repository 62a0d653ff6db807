//! Timer status snapshot published to API clients

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot of the hosted timer, safe to serialize to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerStatus {
    pub running: bool,
    /// Display form, `HH:MM:SS`
    pub time: String,
    /// Persistence form, fractional hours
    pub elapsed_hours: f64,
    pub started_at: Option<DateTime<Utc>>,
}

impl TimerStatus {
    /// Create a stopped, zeroed status
    pub fn new() -> Self {
        Self {
            running: false,
            time: "00:00:00".to_string(),
            elapsed_hours: 0.0,
            started_at: None,
        }
    }

    /// Create a running status
    pub fn running(time: String, elapsed_hours: f64, started_at: DateTime<Utc>) -> Self {
        Self {
            running: true,
            time,
            elapsed_hours,
            started_at: Some(started_at),
        }
    }

    /// Create a stopped status carrying the final elapsed value
    pub fn stopped(time: String, elapsed_hours: f64) -> Self {
        Self {
            running: false,
            time,
            elapsed_hours,
            started_at: None,
        }
    }

    /// Check if the timer is running
    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl Default for TimerStatus {
    fn default() -> Self {
        Self::new()
    }
}
