//! Punchclock - A state-managed HTTP service for server-synchronized work timers
//!
//! This library hosts a work timer whose elapsed time is decomposed into
//! hours/minutes/seconds and kept aligned with an authoritative upstream
//! server clock through a once-per-process offset measurement.

pub mod config;
pub mod state;
pub mod api;
pub mod services;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use state::{AppState, TimeAccumulator, TimerStatus};
pub use services::{ServerClock, TimerCoordinator};
pub use api::create_router;
pub use utils::signals::shutdown_signal;
