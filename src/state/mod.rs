//! State management module
//!
//! This module contains the elapsed-time accumulator and the application
//! state that hosts it.

pub mod accumulator;
pub mod app_state;
pub mod timer_status;

// Re-export main types
pub use accumulator::TimeAccumulator;
pub use app_state::AppState;
pub use timer_status::TimerStatus;
