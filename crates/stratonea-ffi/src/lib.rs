#![allow(clippy::missing_safety_doc)]
//! Stratonea FFI - Foreign Function Interface
//!
//! C-compatible bindings for mobile host bridges (Android/iOS).
//! The host owns the platform's network callbacks and forwards them into a
//! monitor handle; observers registered here are called back synchronously
//! on the thread that forwarded the change.

pub mod error;
pub mod monitor;
pub mod types;

use std::ffi::c_char;

pub use error::*;
pub use monitor::*;
pub use types::*;

/// Library version
#[no_mangle]
pub extern "C" fn stratonea_version() -> *const c_char {
    static VERSION: &[u8] = b"0.2.0\0";
    VERSION.as_ptr() as *const c_char
}
