//! Main application state management

use std::{
    sync::{Arc, Mutex},
    time::Instant,
};

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, watch};
use tracing::{info, warn};

use crate::services::{ServerClock, TimerCoordinator};

use super::{TimeAccumulator, TimerStatus};

/// Main application state: the hosted timer, the coordinator that owns the
/// server clock, and the channels that fan out timer changes
pub struct AppState {
    /// Shared server-clock coordinator
    pub coordinator: TimerCoordinator,
    /// The hosted work timer
    pub timer: Arc<Mutex<TimeAccumulator>>,
    /// Start timestamp of the current run, if one is in progress
    pub started_at: Arc<Mutex<Option<DateTime<Utc>>>>,
    /// Refresh period for the background tick task
    pub tick_seconds: u64,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Arc<Mutex<Option<String>>>,
    pub last_action_time: Arc<Mutex<Option<DateTime<Utc>>>>,
    /// Start/stop notifications for the tick task
    pub timer_event_tx: broadcast::Sender<TimerStatus>,
    /// Channel for per-tick status updates
    pub status_tx: watch::Sender<TimerStatus>,
    /// Keep the receiver alive to prevent channel closure
    pub _status_rx: watch::Receiver<TimerStatus>,
}

impl AppState {
    /// Create a new AppState hosting one timer backed by the given clock
    pub fn new(port: u16, host: String, tick_seconds: u64, clock: Arc<dyn ServerClock>) -> Self {
        let (timer_event_tx, _) = broadcast::channel(100);
        let (status_tx, status_rx) = watch::channel(TimerStatus::new());

        let coordinator = TimerCoordinator::new(clock);
        let timer = Arc::new(Mutex::new(coordinator.create_timer()));

        Self {
            coordinator,
            timer,
            started_at: Arc::new(Mutex::new(None)),
            tick_seconds,
            start_time: Instant::now(),
            port,
            host,
            last_action: Arc::new(Mutex::new(None)),
            last_action_time: Arc::new(Mutex::new(None)),
            timer_event_tx,
            status_tx,
            _status_rx: status_rx,
        }
    }

    /// Measure (or reuse) the shared server offset and apply it to the
    /// hosted timer, so subsequent refreshes run on the server clock
    pub async fn sync_server_offset(&self) -> Result<f64, String> {
        let offset = self.coordinator.get_server_offset().await?;

        let mut timer = self
            .timer
            .lock()
            .map_err(|e| format!("Failed to lock timer: {}", e))?;
        timer.set_server_offset(offset);

        Ok(offset)
    }

    /// Start (or resume) the timer.
    ///
    /// `elapsed_hours` is time already accrued on previous runs. When
    /// `started_at` is supplied the run began remotely at that instant and
    /// the already-elapsed interval is folded in through the cached offset;
    /// otherwise the run starts at the current server time.
    pub fn start_timer(
        &self,
        elapsed_hours: f64,
        started_at: Option<DateTime<Utc>>,
    ) -> Result<TimerStatus, String> {
        let mut timer = self
            .timer
            .lock()
            .map_err(|e| format!("Failed to lock timer: {}", e))?;

        let started = match started_at {
            Some(start) => {
                timer.set_timer(elapsed_hours, Some(start), None);
                start
            }
            None => {
                let now = timer.get_current_time();
                timer.set_timer(elapsed_hours, Some(now), Some(now));
                now
            }
        };

        let status = TimerStatus::running(timer.time().to_string(), timer.float_value(), started);
        drop(timer);

        {
            let mut running = self
                .started_at
                .lock()
                .map_err(|e| format!("Failed to lock run state: {}", e))?;
            *running = Some(started);
        }

        info!("Timer started at {} with {:.4}h accrued", started, elapsed_hours);
        self.record_action("start");
        self.notify(&status);

        Ok(status)
    }

    /// Stop the timer, returning the final status whose `elapsed_hours` is
    /// the value to persist
    pub fn stop_timer(&self) -> Result<TimerStatus, String> {
        let started = {
            let mut running = self
                .started_at
                .lock()
                .map_err(|e| format!("Failed to lock run state: {}", e))?;
            running.take()
        };

        let Some(started) = started else {
            return Err("No timer is running".to_string());
        };

        let mut timer = self
            .timer
            .lock()
            .map_err(|e| format!("Failed to lock timer: {}", e))?;

        // One last recomputation so the persisted value is current.
        timer.update_timer(started);
        let status = TimerStatus::stopped(timer.time().to_string(), timer.float_value());
        drop(timer);

        info!("Timer stopped at {} ({:.4}h)", status.time, status.elapsed_hours);
        self.record_action("stop");
        self.notify(&status);

        Ok(status)
    }

    /// Per-tick refresh: recompute the running timer and publish a snapshot.
    /// A stopped timer is returned as-is.
    pub fn refresh(&self) -> Result<TimerStatus, String> {
        let started = {
            let running = self
                .started_at
                .lock()
                .map_err(|e| format!("Failed to lock run state: {}", e))?;
            *running
        };

        let mut timer = self
            .timer
            .lock()
            .map_err(|e| format!("Failed to lock timer: {}", e))?;

        let status = match started {
            Some(started) => {
                timer.update_timer(started);
                TimerStatus::running(timer.time().to_string(), timer.float_value(), started)
            }
            None => TimerStatus::stopped(timer.time().to_string(), timer.float_value()),
        };
        drop(timer);

        if let Err(e) = self.status_tx.send(status.clone()) {
            warn!("Failed to publish timer status: {}", e);
        }

        Ok(status)
    }

    /// Get the current timer status without mutating it
    pub fn get_status(&self) -> Result<TimerStatus, String> {
        let started = {
            let running = self
                .started_at
                .lock()
                .map_err(|e| format!("Failed to lock run state: {}", e))?;
            *running
        };

        let timer = self
            .timer
            .lock()
            .map_err(|e| format!("Failed to lock timer: {}", e))?;

        Ok(match started {
            Some(started) => {
                TimerStatus::running(timer.time().to_string(), timer.float_value(), started)
            }
            None => TimerStatus::stopped(timer.time().to_string(), timer.float_value()),
        })
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }

    fn record_action(&self, action: &str) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
    }

    fn notify(&self, status: &TimerStatus) {
        if let Err(e) = self.timer_event_tx.send(status.clone()) {
            warn!("Failed to send timer event: {}", e);
        }
        if let Err(e) = self.status_tx.send(status.clone()) {
            warn!("Failed to publish timer status: {}", e);
        }
    }
}
