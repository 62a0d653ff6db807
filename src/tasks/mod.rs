//! Background tasks module
//!
//! This module contains background tasks that run alongside the HTTP server.

pub mod timer_tick;

// Re-export main functions
pub use timer_tick::timer_tick_task;
