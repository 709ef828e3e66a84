//! Stratonea Runtime - Composition root
//!
//! This crate wires the resilience layer together for a host application:
//! 1. Load configuration (copy, logging)
//! 2. Initialise logging
//! 3. Construct the one canonical connectivity monitor
//! 4. Drive the presentation controller from the monitor's live stream
//! 5. Relay host inputs (loading, cached data, data-saving requests)
//! 6. Hand out configured fault boundary options

pub mod config;
pub mod logging;
pub mod shell;

pub use config::*;
pub use logging::*;
pub use shell::*;
