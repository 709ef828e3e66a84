//! Stratonea Test Harness - Chaos testing and end-to-end validation
//!
//! This crate provides:
//! - Flapping-network event generation
//! - A connectivity simulator with a status oracle
//! - End-to-end scenarios across monitor, controller, boundary and shell

pub mod chaos;
pub mod simulator;
pub mod integration;

pub use chaos::*;
pub use simulator::*;
pub use integration::*;
