//! IO modules - HTTP boundaries
//!
//! This module contains the wire-facing servers:
//! - `lot_server` - per-lot command and status routes
//! - `coordinator_server` - aggregated summary route

pub mod coordinator_server;
pub mod lot_server;

// Re-export commonly used types
pub use coordinator_server::{serve_coordinator, start_coordinator_server};
pub use lot_server::{serve_lot, start_lot_server};
