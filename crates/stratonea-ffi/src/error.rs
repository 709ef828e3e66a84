//! FFI Error handling

use std::ffi::{c_char, c_int, CString};

use stratonea_core::StratoneaError;

/// Error codes for FFI functions
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StratoneaErrorCode {
    /// Success
    Ok = 0,
    /// Invalid argument
    InvalidArgument = -1,
    /// Null handle
    NullHandle = -2,
    /// Subscription not found
    SubscriptionNotFound = -3,
    /// Internal error
    InternalError = -99,
}

impl From<StratoneaErrorCode> for c_int {
    fn from(code: StratoneaErrorCode) -> Self {
        code as c_int
    }
}

impl From<&StratoneaError> for StratoneaErrorCode {
    fn from(err: &StratoneaError) -> Self {
        match err {
            StratoneaError::InvalidInput(_) => StratoneaErrorCode::InvalidArgument,
            StratoneaError::UnknownObserver(_) => StratoneaErrorCode::SubscriptionNotFound,
            _ => StratoneaErrorCode::InternalError,
        }
    }
}

thread_local! {
    static LAST_ERROR: std::cell::RefCell<Option<CString>> =
        const { std::cell::RefCell::new(None) };
}

/// Set the last error message
pub fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Record an error and return its code
pub fn fail(err: StratoneaError) -> c_int {
    tracing::debug!(error = %err, "ffi call failed");
    set_last_error(&err.to_string());
    StratoneaErrorCode::from(&err).into()
}

/// Get the last error message
/// Returns NULL if no error
#[no_mangle]
pub extern "C" fn stratonea_get_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match e.borrow().as_ref() {
        Some(s) => s.as_ptr(),
        None => std::ptr::null(),
    })
}

/// Clear the last error
#[no_mangle]
pub extern "C" fn stratonea_clear_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;
    use stratonea_core::ObserverId;

    #[test]
    fn test_fail_sets_message_and_code() {
        stratonea_clear_error();
        assert!(stratonea_get_last_error().is_null());

        let code = fail(StratoneaError::UnknownObserver(ObserverId::new(9)));
        assert_eq!(code, StratoneaErrorCode::SubscriptionNotFound as c_int);

        let msg = unsafe { CStr::from_ptr(stratonea_get_last_error()) };
        assert!(msg.to_str().unwrap().contains("Unknown observer"));

        stratonea_clear_error();
        assert!(stratonea_get_last_error().is_null());
    }
}
