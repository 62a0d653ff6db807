//! Timer services module
//!
//! This module contains the server clock abstraction and the coordinator
//! that shares one offset measurement across the process.

pub mod coordinator;
pub mod server_clock;

// Re-export main types
pub use coordinator::TimerCoordinator;
pub use server_clock::{parse_server_time, HttpServerClock, ServerClock, SystemServerClock};
