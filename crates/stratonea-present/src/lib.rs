//! Stratonea Present - Adaptive presentation controller
//!
//! Maps `(loading requested, reachable, cached data, quality class)` to
//! exactly one presentation mode plus an orthogonal slow-connection advisory,
//! and relays the user's "enable data saving" request to the host.
//!
//! Everything here is synchronous derivation. Nothing in this crate can fail.

pub mod mode;
pub mod controller;
pub mod indicator;

pub use mode::*;
pub use controller::*;
pub use indicator::*;
