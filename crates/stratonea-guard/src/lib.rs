//! Stratonea Guard - Fault-containment boundary
//!
//! A boundary wraps the builder of one subtree of rendered content. Faults
//! raised while building or updating that subtree (returned errors and
//! panics alike) are intercepted and held as a fault record; the rest of the
//! application keeps running. The user can reveal technical details and ask
//! to try again, which rebuilds the subtree from scratch.
//!
//! This is a last-resort mechanism. Code that can anticipate its own failures
//! should handle them before they reach a boundary.

pub mod fault;
pub mod scope;
pub mod fallback;
pub mod boundary;

pub use fault::*;
pub use scope::*;
pub use fallback::*;
pub use boundary::*;
