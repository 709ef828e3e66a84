//! Stratonea Net - Connectivity monitor
//!
//! This crate provides:
//! - The connectivity source capability (read current signals, attach/detach listeners)
//! - A host-driven source for platform bridges and tests
//! - The connectivity monitor broadcasting one live status to many observers
//!
//! There is no polling anywhere in this crate. Every status change originates
//! from an environment notification.

pub mod source;
pub mod monitor;

pub use source::*;
pub use monitor::*;
