//! Connectivity simulator
//!
//! Drives a host source through network events and tracks what the monitor
//! ought to report, so runs can be checked step by step.

use std::sync::Arc;

use stratonea_core::{ConnectivityStatus, QualityClass};
use stratonea_net::{
    ConnectivityMonitor, ConnectivitySource, ManualSource, SignalChannel, Subscription,
};

use crate::chaos::{ChaosConfig, ChaosNetwork, NetworkEvent};

/// Simulated environment plus one monitor over it
pub struct NetworkSimulator {
    source: Arc<ManualSource>,
    monitor: ConnectivityMonitor,
    online: bool,
    effective_type: Option<&'static str>,
    change_events: bool,
    /// Quality the monitor last read while attached
    observed_quality: QualityClass,
    events_applied: u64,
}

impl NetworkSimulator {
    /// Create an environment that notifies connection changes
    pub fn new(online: bool, effective_type: Option<&'static str>) -> Self {
        Self::build(online, effective_type, true)
    }

    /// Create an environment without connection-change notification
    pub fn degraded(online: bool, effective_type: Option<&'static str>) -> Self {
        Self::build(online, effective_type, false)
    }

    fn build(online: bool, effective_type: Option<&'static str>, change_events: bool) -> Self {
        let mut source = ManualSource::new(online).with_effective_type(effective_type);
        if !change_events {
            source = source.without_change_events();
        }
        let source = Arc::new(source);
        let monitor = ConnectivityMonitor::new(Arc::clone(&source) as Arc<dyn ConnectivitySource>);

        NetworkSimulator {
            source,
            monitor,
            online,
            effective_type,
            change_events,
            observed_quality: QualityClass::from_effective_type(effective_type),
            events_applied: 0,
        }
    }

    pub fn source(&self) -> &Arc<ManualSource> {
        &self.source
    }

    pub fn monitor(&self) -> &ConnectivityMonitor {
        &self.monitor
    }

    /// Subscribe through the simulator so a fresh attach is accounted for
    pub fn subscribe(&mut self) -> Subscription {
        if self.monitor.observer_count() == 0 {
            self.observed_quality = self.current_quality();
        }
        self.monitor.subscribe()
    }

    /// Push one event into the environment
    pub fn apply(&mut self, event: NetworkEvent) {
        self.events_applied += 1;
        let attached = self.monitor.is_attached();

        match event {
            NetworkEvent::GoOnline | NetworkEvent::GoOffline => {
                let online = event == NetworkEvent::GoOnline;
                let transition = online != self.online;
                self.online = online;
                self.source.set_online(online);
                if attached && transition && !self.change_events {
                    self.observed_quality = self.current_quality();
                }
            }
            NetworkEvent::EffectiveType(effective_type) => {
                self.effective_type = effective_type;
                self.source.set_effective_type(effective_type);
                if attached && self.change_events {
                    self.observed_quality = self.current_quality();
                }
            }
            NetworkEvent::Replay(channel) => {
                self.source.emit(channel);
                if attached && !self.change_events && channel.is_reachability() {
                    self.observed_quality = self.current_quality();
                }
            }
        }
    }

    /// Run `steps` chaos steps, checking the oracle after each event
    pub fn run_chaos(&mut self, config: ChaosConfig, seed: u64, steps: usize) -> SimulationReport {
        let mut chaos = ChaosNetwork::with_seed(config, self.online, seed);
        let mut report = SimulationReport::default();

        for _ in 0..steps {
            let Some(event) = chaos.step() else {
                continue;
            };
            self.apply(event);
            report.events += 1;
            if self.monitor.is_attached() && self.monitor.status() != self.expected() {
                report.mismatches += 1;
            }
        }

        report.final_status = self.monitor.status();
        report
    }

    /// What an attached monitor should report right now
    pub fn expected(&self) -> ConnectivityStatus {
        ConnectivityStatus::new(self.online, self.observed_quality)
    }

    pub fn events_applied(&self) -> u64 {
        self.events_applied
    }

    fn current_quality(&self) -> QualityClass {
        QualityClass::from_effective_type(self.effective_type)
    }
}

/// Outcome of a chaos run
#[derive(Clone, Debug, Default)]
pub struct SimulationReport {
    pub events: u64,
    pub mismatches: u64,
    pub final_status: ConnectivityStatus,
}

impl SimulationReport {
    pub fn is_consistent(&self) -> bool {
        self.mismatches == 0
    }
}

/// Replay a reachability channel matching the given state
pub fn replay_for(online: bool) -> NetworkEvent {
    NetworkEvent::Replay(if online {
        SignalChannel::Online
    } else {
        SignalChannel::Offline
    })
}
