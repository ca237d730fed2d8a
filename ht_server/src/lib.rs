//! WebSocket front end for a single Hold'em table.
//!
//! The binary in `main.rs` wires these modules together; they live in a
//! library so integration tests can drive the router directly.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
