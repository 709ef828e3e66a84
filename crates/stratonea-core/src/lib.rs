//! Stratonea Core - Fundamental types for the resilience layer
//!
//! This crate defines the value types shared by every other crate:
//! - Identifiers (ObserverId, ListenerId, EpisodeId)
//! - Connection quality classes and the effective-type mapping
//! - The connectivity status value object
//! - Core error types

pub mod id;
pub mod class;
pub mod status;
pub mod error;

pub use id::*;
pub use class::*;
pub use status::*;
pub use error::*;
