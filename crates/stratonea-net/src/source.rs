//! Connectivity source capability
//!
//! A source is the only thing that touches the platform. It can report the
//! current signals and deliver change notifications on three channels. Any
//! channel may be unsupported; the monitor degrades instead of failing.

use std::sync::Arc;

use parking_lot::Mutex;
use stratonea_core::{ConnectivityStatus, ListenerId, QualityClass};

/// Notification channel offered by the environment
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SignalChannel {
    /// The device became reachable
    Online,
    /// The device became unreachable
    Offline,
    /// The connection-information facility reported a change
    ConnectionChange,
}

impl SignalChannel {
    pub fn all() -> &'static [SignalChannel] {
        &[
            SignalChannel::Online,
            SignalChannel::Offline,
            SignalChannel::ConnectionChange,
        ]
    }

    /// Is this a reachability transition (as opposed to a quality change)?
    pub fn is_reachability(self) -> bool {
        !matches!(self, SignalChannel::ConnectionChange)
    }
}

/// Raw signals as read from the environment
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignalReading {
    /// Current online flag
    pub online: bool,
    /// Effective connection type; `None` when the facility is absent
    pub effective_type: Option<String>,
}

impl SignalReading {
    pub fn new(online: bool, effective_type: Option<&str>) -> Self {
        SignalReading {
            online,
            effective_type: effective_type.map(str::to_owned),
        }
    }

    pub fn quality(&self) -> QualityClass {
        QualityClass::from_effective_type(self.effective_type.as_deref())
    }

    pub fn status(&self) -> ConnectivityStatus {
        ConnectivityStatus::new(self.online, self.quality())
    }
}

/// Listener invoked by a source when a channel fires
pub type SignalListener = Arc<dyn Fn(SignalChannel) + Send + Sync>;

/// Capability interface over the platform's connectivity facilities.
///
/// Implementations must not invoke listeners from inside `attach` or
/// `detach`, and must not hold internal locks while a listener runs.
pub trait ConnectivitySource: Send + Sync {
    /// Read the current signals
    fn read(&self) -> SignalReading;

    /// Register a listener on a channel.
    ///
    /// Returns `None` when the environment cannot notify on that channel.
    fn attach(&self, channel: SignalChannel, listener: SignalListener) -> Option<ListenerId>;

    /// Release a listener. Unknown ids are ignored.
    fn detach(&self, id: ListenerId);
}

struct Registration {
    id: ListenerId,
    channel: SignalChannel,
    listener: SignalListener,
}

struct ManualState {
    online: bool,
    effective_type: Option<String>,
    change_events: bool,
    next_listener: u64,
    registrations: Vec<Registration>,
}

/// Host-driven connectivity source.
///
/// Platform bridges (a browser shim, an Android `ConnectivityManager`
/// callback, an iOS path monitor) push what they observe into this source;
/// tests drive it directly.
pub struct ManualSource {
    state: Mutex<ManualState>,
}

impl ManualSource {
    /// Create a source with the given reachability and no quality facility
    pub fn new(online: bool) -> Self {
        ManualSource {
            state: Mutex::new(ManualState {
                online,
                effective_type: None,
                change_events: true,
                next_listener: 1,
                registrations: Vec::new(),
            }),
        }
    }

    /// Set the initial effective connection type
    pub fn with_effective_type(self, effective_type: Option<&str>) -> Self {
        self.state.lock().effective_type = effective_type.map(str::to_owned);
        self
    }

    /// Model an environment whose connection facility cannot notify changes
    pub fn without_change_events(self) -> Self {
        self.state.lock().change_events = false;
        self
    }

    /// Report a reachability transition.
    ///
    /// Fires `Online`/`Offline` only when the flag actually changes.
    pub fn set_online(&self, online: bool) {
        let changed = {
            let mut state = self.state.lock();
            let changed = state.online != online;
            state.online = online;
            changed
        };

        if changed {
            let channel = if online {
                SignalChannel::Online
            } else {
                SignalChannel::Offline
            };
            self.emit(channel);
        }
    }

    /// Report a new effective connection type.
    ///
    /// The value is always stored; `ConnectionChange` fires only when change
    /// notification is supported and the value differs.
    pub fn set_effective_type(&self, effective_type: Option<&str>) {
        let notify = {
            let mut state = self.state.lock();
            let next = effective_type.map(str::to_owned);
            let changed = state.effective_type != next;
            state.effective_type = next;
            changed && state.change_events
        };

        if notify {
            self.emit(SignalChannel::ConnectionChange);
        }
    }

    /// Fire a channel unconditionally (replayed or duplicated platform events)
    pub fn emit(&self, channel: SignalChannel) {
        let listeners: Vec<SignalListener> = self
            .state
            .lock()
            .registrations
            .iter()
            .filter(|r| r.channel == channel)
            .map(|r| Arc::clone(&r.listener))
            .collect();

        for listener in listeners {
            listener(channel);
        }
    }

    /// Number of live listener registrations
    pub fn listener_count(&self) -> usize {
        self.state.lock().registrations.len()
    }

    /// Number of live registrations on one channel
    pub fn listener_count_on(&self, channel: SignalChannel) -> usize {
        self.state
            .lock()
            .registrations
            .iter()
            .filter(|r| r.channel == channel)
            .count()
    }
}

impl Default for ManualSource {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ConnectivitySource for ManualSource {
    fn read(&self) -> SignalReading {
        let state = self.state.lock();
        SignalReading {
            online: state.online,
            effective_type: state.effective_type.clone(),
        }
    }

    fn attach(&self, channel: SignalChannel, listener: SignalListener) -> Option<ListenerId> {
        let mut state = self.state.lock();
        if channel == SignalChannel::ConnectionChange && !state.change_events {
            return None;
        }

        let id = ListenerId::new(state.next_listener);
        state.next_listener += 1;
        state.registrations.push(Registration {
            id,
            channel,
            listener,
        });
        Some(id)
    }

    fn detach(&self, id: ListenerId) {
        self.state.lock().registrations.retain(|r| r.id != id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_listener(counter: &Arc<AtomicUsize>) -> SignalListener {
        let counter = Arc::clone(counter);
        Arc::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_reading_maps_quality() {
        let source = ManualSource::new(false).with_effective_type(Some("2g"));
        let status = source.read().status();
        assert!(!status.reachable);
        assert_eq!(status.quality, QualityClass::Slow);
    }

    #[test]
    fn test_set_online_fires_only_on_transition() {
        let source = ManualSource::new(true);
        let hits = Arc::new(AtomicUsize::new(0));
        source.attach(SignalChannel::Offline, counting_listener(&hits));

        source.set_online(true);
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        source.set_online(false);
        source.set_online(false);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_change_channel_unsupported() {
        let source = ManualSource::new(true).without_change_events();
        let hits = Arc::new(AtomicUsize::new(0));
        assert!(source
            .attach(SignalChannel::ConnectionChange, counting_listener(&hits))
            .is_none());

        source.set_effective_type(Some("3g"));
        assert_eq!(source.read().effective_type.as_deref(), Some("3g"));
        assert_eq!(source.listener_count(), 0);
    }

    #[test]
    fn test_detach_releases_listener() {
        let source = ManualSource::default();
        let hits = Arc::new(AtomicUsize::new(0));
        let id = source
            .attach(SignalChannel::ConnectionChange, counting_listener(&hits))
            .unwrap();
        assert_eq!(source.listener_count_on(SignalChannel::ConnectionChange), 1);

        source.detach(id);
        source.detach(id);
        source.set_effective_type(Some("4g"));
        assert_eq!(source.listener_count(), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_listener_may_read_source() {
        let source = Arc::new(ManualSource::new(true));
        let seen = Arc::new(Mutex::new(None));

        let reader = Arc::clone(&source);
        let sink = Arc::clone(&seen);
        source.attach(
            SignalChannel::Offline,
            Arc::new(move |_| {
                *sink.lock() = Some(reader.read().online);
            }),
        );

        source.set_online(false);
        assert_eq!(*seen.lock(), Some(false));
    }
}
