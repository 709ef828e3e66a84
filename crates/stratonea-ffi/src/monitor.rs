#![allow(clippy::missing_safety_doc)]
//! FFI Monitor functions

use std::ffi::{c_char, c_int, c_void, CStr};
use std::ptr;
use std::sync::Arc;

use stratonea_core::{ConnectivityStatus, ObserverId, StratoneaError};
use stratonea_net::{ConnectivityMonitor, ConnectivitySource, ManualSource, Subscription};
use stratonea_present::derive;
use tokio::sync::watch;

use crate::error::*;
use crate::types::*;

struct FfiSubscription {
    subscription: Subscription,
    receiver: watch::Receiver<ConnectivityStatus>,
    callback: StratoneaStatusCallback,
    user_data: *mut c_void,
}

/// Opaque handle to a connectivity monitor and its host-driven source
pub struct StratoneaMonitorHandle {
    pub(crate) source: Arc<ManualSource>,
    pub(crate) monitor: ConnectivityMonitor,
    subscriptions: Vec<FfiSubscription>,
}

// Monitor handles are Send but not Sync (must be accessed from one thread at a time)
unsafe impl Send for StratoneaMonitorHandle {}

impl StratoneaMonitorHandle {
    fn new(online: bool) -> Self {
        let source = Arc::new(ManualSource::new(online));
        let monitor = ConnectivityMonitor::new(Arc::clone(&source) as Arc<dyn ConnectivitySource>);
        StratoneaMonitorHandle {
            source,
            monitor,
            subscriptions: Vec::new(),
        }
    }

    /// Collect callbacks owed to observers whose status changed
    fn pending(&mut self) -> Vec<(StratoneaStatusCallback, *mut c_void, StratoneaStatus)> {
        self.subscriptions
            .iter_mut()
            .filter(|sub| sub.receiver.has_changed().unwrap_or(false))
            .map(|sub| {
                let status = *sub.receiver.borrow_and_update();
                (sub.callback, sub.user_data, status.into())
            })
            .collect()
    }
}

unsafe fn dispatch(handle: *mut StratoneaMonitorHandle) {
    let pending = (*handle).pending();
    for (callback, user_data, status) in pending {
        callback(user_data, status);
    }
}

/// Create a monitor.
/// Returns a handle that must be freed with stratonea_monitor_free
#[no_mangle]
pub extern "C" fn stratonea_monitor_new(online: bool) -> *mut StratoneaMonitorHandle {
    Box::into_raw(Box::new(StratoneaMonitorHandle::new(online)))
}

/// Free a monitor handle, releasing all of its subscriptions
#[no_mangle]
pub unsafe extern "C" fn stratonea_monitor_free(handle: *mut StratoneaMonitorHandle) {
    if !handle.is_null() {
        drop(Box::from_raw(handle));
    }
}

/// Current connectivity status
#[no_mangle]
pub unsafe extern "C" fn stratonea_monitor_status(
    handle: *const StratoneaMonitorHandle,
) -> StratoneaStatus {
    if handle.is_null() {
        set_last_error("Null monitor handle");
        return ConnectivityStatus::offline().into();
    }

    (*handle).monitor.status().into()
}

/// Number of live subscriptions
#[no_mangle]
pub unsafe extern "C" fn stratonea_monitor_observer_count(
    handle: *const StratoneaMonitorHandle,
) -> usize {
    if handle.is_null() {
        return 0;
    }

    (*handle).monitor.observer_count()
}

/// Number of environment listeners currently attached
#[no_mangle]
pub unsafe extern "C" fn stratonea_monitor_listener_count(
    handle: *const StratoneaMonitorHandle,
) -> usize {
    if handle.is_null() {
        return 0;
    }

    (*handle).source.listener_count()
}

/// Forward the platform's online/offline notification
#[no_mangle]
pub unsafe extern "C" fn stratonea_source_set_online(
    handle: *mut StratoneaMonitorHandle,
    online: bool,
) -> c_int {
    if handle.is_null() {
        set_last_error("Null monitor handle");
        return StratoneaErrorCode::NullHandle.into();
    }

    (*handle).source.set_online(online);
    dispatch(handle);
    StratoneaErrorCode::Ok.into()
}

/// Forward the platform's connection-type change.
///
/// `effective_type` is a NUL-terminated string such as `"3g"`, or NULL when
/// the platform reports nothing.
#[no_mangle]
pub unsafe extern "C" fn stratonea_source_set_effective_type(
    handle: *mut StratoneaMonitorHandle,
    effective_type: *const c_char,
) -> c_int {
    if handle.is_null() {
        set_last_error("Null monitor handle");
        return StratoneaErrorCode::NullHandle.into();
    }

    let effective_type = if effective_type.is_null() {
        None
    } else {
        match CStr::from_ptr(effective_type).to_str() {
            Ok(s) => Some(s),
            Err(_) => {
                return fail(StratoneaError::InvalidInput(
                    "effective type is not valid UTF-8".into(),
                ))
            }
        }
    };

    (*handle).source.set_effective_type(effective_type);
    dispatch(handle);
    StratoneaErrorCode::Ok.into()
}

/// Subscribe to connectivity changes.
///
/// The callback is invoked once with the initial status before this returns,
/// then on every change. Returns the subscription id, or 0 on error.
#[no_mangle]
pub unsafe extern "C" fn stratonea_subscribe(
    handle: *mut StratoneaMonitorHandle,
    callback: StratoneaStatusCallback,
    user_data: *mut c_void,
) -> u64 {
    if handle.is_null() {
        set_last_error("Null monitor handle");
        return 0;
    }

    let subscription = (*handle).monitor.subscribe();
    let id = subscription.id();
    let initial = subscription.initial();
    let receiver = subscription.receiver();

    (*handle).subscriptions.push(FfiSubscription {
        subscription,
        receiver,
        callback,
        user_data,
    });

    callback(user_data, initial.into());
    id.0
}

/// Cancel a subscription
#[no_mangle]
pub unsafe extern "C" fn stratonea_unsubscribe(
    handle: *mut StratoneaMonitorHandle,
    subscription_id: u64,
) -> c_int {
    if handle.is_null() {
        set_last_error("Null monitor handle");
        return StratoneaErrorCode::NullHandle.into();
    }

    let subscriptions = &mut (*handle).subscriptions;
    let Some(pos) = subscriptions
        .iter()
        .position(|sub| sub.subscription.id().0 == subscription_id)
    else {
        return fail(StratoneaError::UnknownObserver(ObserverId::new(
            subscription_id,
        )));
    };

    let mut removed = subscriptions.remove(pos);
    removed.subscription.unsubscribe();
    StratoneaErrorCode::Ok.into()
}

/// Derive the presentation for a set of inputs
#[no_mangle]
pub extern "C" fn stratonea_derive_presentation(
    inputs: StratoneaPresentationInputs,
) -> StratoneaPresentation {
    derive(inputs.into()).into()
}
