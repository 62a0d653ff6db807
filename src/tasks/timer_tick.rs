//! Timer tick background task

use std::{sync::Arc, time::Duration};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::state::AppState;

/// Background task that refreshes the running timer on a fixed period.
///
/// The task idles until a start event arrives, then ticks every
/// `tick_seconds` recomputing the elapsed time, until a stop event. Each
/// refresh is a full recomputation from the run's start timestamp, so a
/// delayed or missed tick never accumulates drift.
pub async fn timer_tick_task(state: Arc<AppState>) {
    info!("Starting timer tick task");

    let mut event_rx = state.timer_event_tx.subscribe();

    loop {
        // Wait for a timer start notification
        match event_rx.recv().await {
            Ok(status) if status.is_running() => {
                debug!("Tick task received start event, ticking every {}s", state.tick_seconds);

                // Make sure the offset is measured before the first tick;
                // a failure is non-fatal, refreshes then run unshifted.
                if let Err(e) = state.sync_server_offset().await {
                    warn!("Could not sync server offset: {}", e);
                }

                let mut interval =
                    tokio::time::interval(Duration::from_secs(state.tick_seconds.max(1)));
                let mut stopped = false;

                loop {
                    tokio::select! {
                        // Periodic refresh of the running timer
                        _ = interval.tick() => {
                            match state.refresh() {
                                Ok(status) => {
                                    debug!("Timer refreshed: {}", status.time);
                                }
                                Err(e) => {
                                    error!("Failed to refresh timer: {}", e);
                                }
                            }
                        }

                        // Start/stop event - stop ticking when the run ends
                        Ok(next) = event_rx.recv() => {
                            if !next.is_running() {
                                info!("Tick task received stop event");
                                stopped = true;
                                break;
                            }
                        }
                    }
                }

                if stopped {
                    debug!("Timer stopped, waiting for the next start event");
                }
            }
            Ok(_) => {
                // Stop event while idle, nothing to do
            }
            Err(e) => {
                error!("Error receiving timer event: {}", e);
                // Wait a bit before retrying
                sleep(Duration::from_secs(1)).await;
            }
        }
    }
}
