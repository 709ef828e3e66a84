//! Connectivity monitor - one live status, many observers
//!
//! Environment listeners are attached when the first observer subscribes and
//! released when the last one leaves. A later subscriber re-attaches and takes
//! a fresh reading. Construct one monitor per application and hand out clones.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use stratonea_core::{ConnectivityStatus, ListenerId, ObserverId, QualityClass};
use tokio::sync::watch;

use crate::source::{ConnectivitySource, SignalChannel, SignalListener};

#[derive(Default)]
struct Registry {
    observers: BTreeSet<ObserverId>,
    last_observer: ObserverId,
    listeners: Vec<ListenerId>,
}

struct MonitorInner {
    source: Arc<dyn ConnectivitySource>,
    sender: watch::Sender<ConnectivityStatus>,
    registry: Mutex<Registry>,
    /// Listeners are live; signals arriving while false are ignored
    attached: AtomicBool,
    /// The source accepted a `ConnectionChange` listener
    change_events: AtomicBool,
}

impl MonitorInner {
    fn on_signal(&self, channel: SignalChannel) {
        if !self.attached.load(Ordering::Acquire) {
            return;
        }

        let degraded = !self.change_events.load(Ordering::Acquire);
        let source = &self.source;

        self.sender.send_if_modified(|status| {
            let next = match channel {
                SignalChannel::Online | SignalChannel::Offline => {
                    let reachable = channel == SignalChannel::Online;
                    // Without change notification, quality is only refreshed
                    // on reachability transitions.
                    let quality = if degraded {
                        source.read().quality()
                    } else {
                        status.quality
                    };
                    ConnectivityStatus::new(reachable, quality)
                }
                SignalChannel::ConnectionChange => status.with_quality(source.read().quality()),
            };

            if next == *status {
                return false;
            }
            tracing::debug!(from = %status, to = %next, ?channel, "connectivity changed");
            *status = next;
            true
        });
    }

    fn attach(self: &Arc<Self>, registry: &mut Registry) {
        let fresh = self.source.read().status();
        self.sender.send_if_modified(|status| {
            let changed = *status != fresh;
            *status = fresh;
            changed
        });

        let weak: Weak<MonitorInner> = Arc::downgrade(self);
        let listener: SignalListener = Arc::new(move |channel| {
            if let Some(inner) = weak.upgrade() {
                inner.on_signal(channel);
            }
        });

        let mut change_events = false;
        for &channel in SignalChannel::all() {
            match self.source.attach(channel, Arc::clone(&listener)) {
                Some(id) => {
                    change_events |= channel == SignalChannel::ConnectionChange;
                    registry.listeners.push(id);
                }
                None => {
                    tracing::debug!(?channel, "environment cannot notify on channel, degrading");
                }
            }
        }

        self.change_events.store(change_events, Ordering::Release);
        self.attached.store(true, Ordering::Release);
        tracing::trace!(listeners = registry.listeners.len(), status = %fresh, "monitor attached");
    }

    fn detach(&self, registry: &mut Registry) {
        self.attached.store(false, Ordering::Release);
        for id in registry.listeners.drain(..) {
            self.source.detach(id);
        }
        tracing::debug!("monitor detached from environment");
    }

    fn release(&self, id: ObserverId) {
        let mut registry = self.registry.lock();
        if !registry.observers.remove(&id) {
            return;
        }
        tracing::trace!(observer = %id, remaining = registry.observers.len(), "observer left");

        if registry.observers.is_empty() {
            self.detach(&mut registry);
        }
    }
}

impl Drop for MonitorInner {
    fn drop(&mut self) {
        let registry = self.registry.get_mut();
        if !registry.listeners.is_empty() {
            self.attached.store(false, Ordering::Release);
            for id in registry.listeners.drain(..) {
                self.source.detach(id);
            }
        }
    }
}

/// Connectivity monitor
///
/// Cloning is cheap and yields a handle to the same monitor.
#[derive(Clone)]
pub struct ConnectivityMonitor {
    inner: Arc<MonitorInner>,
}

impl ConnectivityMonitor {
    /// Create a monitor, taking an initial reading from the source.
    ///
    /// No listeners are attached until the first subscription.
    pub fn new(source: Arc<dyn ConnectivitySource>) -> Self {
        let initial = source.read().status();
        let (sender, _) = watch::channel(initial);
        tracing::debug!(status = %initial, "connectivity monitor created");

        ConnectivityMonitor {
            inner: Arc::new(MonitorInner {
                source,
                sender,
                registry: Mutex::new(Registry::default()),
                attached: AtomicBool::new(false),
                change_events: AtomicBool::new(false),
            }),
        }
    }

    /// Latest known status
    pub fn status(&self) -> ConnectivityStatus {
        *self.inner.sender.borrow()
    }

    /// Register an observer.
    ///
    /// The returned subscription carries the status at subscription time and
    /// receives every later change until it is unsubscribed or dropped.
    pub fn subscribe(&self) -> Subscription {
        let mut registry = self.inner.registry.lock();
        if registry.observers.is_empty() {
            self.inner.attach(&mut registry);
        }

        let id = registry.last_observer.next();
        registry.last_observer = id;
        registry.observers.insert(id);

        let mut receiver = self.inner.sender.subscribe();
        let initial = *receiver.borrow_and_update();
        tracing::trace!(observer = %id, status = %initial, "observer joined");

        Subscription {
            id,
            initial,
            receiver,
            monitor: Arc::downgrade(&self.inner),
            active: true,
            frozen: None,
        }
    }

    /// Number of live observers
    pub fn observer_count(&self) -> usize {
        self.inner.registry.lock().observers.len()
    }

    /// Are environment listeners currently registered?
    pub fn is_attached(&self) -> bool {
        self.inner.attached.load(Ordering::Acquire)
    }

    /// Does the environment deliver quality changes, or only reachability?
    ///
    /// Meaningful only while attached.
    pub fn supports_change_events(&self) -> bool {
        self.inner.change_events.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for ConnectivityMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectivityMonitor")
            .field("status", &self.status())
            .field("observers", &self.observer_count())
            .field("attached", &self.is_attached())
            .finish()
    }
}

/// A live observer registration
pub struct Subscription {
    id: ObserverId,
    initial: ConnectivityStatus,
    receiver: watch::Receiver<ConnectivityStatus>,
    monitor: Weak<MonitorInner>,
    active: bool,
    /// Last status seen before unsubscribing
    frozen: Option<ConnectivityStatus>,
}

impl Subscription {
    pub fn id(&self) -> ObserverId {
        self.id
    }

    /// Status at the moment of subscription
    pub fn initial(&self) -> ConnectivityStatus {
        self.initial
    }

    /// Latest status, without waiting.
    ///
    /// Stops following the monitor once unsubscribed.
    pub fn current(&self) -> ConnectivityStatus {
        self.frozen.unwrap_or_else(|| *self.receiver.borrow())
    }

    pub fn reachable(&self) -> bool {
        self.current().reachable
    }

    pub fn quality(&self) -> QualityClass {
        self.current().quality
    }

    /// Wait for the next change.
    ///
    /// Returns `None` once unsubscribed or when the monitor is gone.
    pub async fn changed(&mut self) -> Option<ConnectivityStatus> {
        if !self.active {
            return None;
        }
        self.receiver.changed().await.ok()?;
        if !self.active {
            return None;
        }
        Some(*self.receiver.borrow_and_update())
    }

    /// A raw receiver for hosts composing their own streams
    pub fn receiver(&self) -> watch::Receiver<ConnectivityStatus> {
        self.receiver.clone()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Leave the monitor. Safe to call more than once.
    pub fn unsubscribe(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        self.frozen = Some(*self.receiver.borrow());
        if let Some(inner) = self.monitor.upgrade() {
            inner.release(self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("current", &self.current())
            .field("active", &self.active)
            .finish()
    }
}
