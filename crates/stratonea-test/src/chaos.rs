//! Chaos generation for connectivity testing
//!
//! Produces hostile environment event streams:
//! - Rapid online/offline flapping
//! - Effective-type churn, including unknown and absent values
//! - Replayed notifications that carry no state change

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use stratonea_net::SignalChannel;

/// Effective-type values a platform may report
pub const EFFECTIVE_TYPES: &[Option<&str>] = &[
    Some("slow-2g"),
    Some("2g"),
    Some("3g"),
    Some("4g"),
    Some("5g"),
    None,
];

/// One thing the environment does
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NetworkEvent {
    GoOnline,
    GoOffline,
    EffectiveType(Option<&'static str>),
    /// Re-deliver the notification for the current state
    Replay(SignalChannel),
}

/// Environment chaos configuration
#[derive(Clone, Debug)]
pub struct ChaosConfig {
    /// Chance per step of dropping offline while online
    pub drop_prob: f64,
    /// Chance per step of recovering while offline
    pub recover_prob: f64,
    /// Chance per step of an effective-type change
    pub type_change_prob: f64,
    /// Chance per step of a replayed notification
    pub replay_prob: f64,
}

impl Default for ChaosConfig {
    fn default() -> Self {
        ChaosConfig {
            drop_prob: 0.05,
            recover_prob: 0.3,
            type_change_prob: 0.1,
            replay_prob: 0.02,
        }
    }
}

impl ChaosConfig {
    /// Mostly stable connection
    pub fn stable() -> Self {
        ChaosConfig {
            drop_prob: 0.01,
            recover_prob: 0.5,
            type_change_prob: 0.02,
            replay_prob: 0.0,
        }
    }

    /// Constant flapping and churn
    pub fn hostile() -> Self {
        ChaosConfig {
            drop_prob: 0.4,
            recover_prob: 0.4,
            type_change_prob: 0.4,
            replay_prob: 0.2,
        }
    }
}

/// Chaos statistics
#[derive(Clone, Debug, Default)]
pub struct ChaosStats {
    pub steps: u64,
    pub drops: u64,
    pub recoveries: u64,
    pub type_changes: u64,
    pub replays: u64,
    pub quiet: u64,
}

/// Seeded event generator
pub struct ChaosNetwork {
    config: ChaosConfig,
    rng: StdRng,
    online: bool,
    stats: ChaosStats,
}

impl ChaosNetwork {
    /// Create with a random seed
    pub fn new(config: ChaosConfig, online: bool) -> Self {
        Self::with_rng(config, online, StdRng::from_entropy())
    }

    /// Create with a fixed seed for reproducible runs
    pub fn with_seed(config: ChaosConfig, online: bool, seed: u64) -> Self {
        Self::with_rng(config, online, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: ChaosConfig, online: bool, rng: StdRng) -> Self {
        ChaosNetwork {
            config,
            rng,
            online,
            stats: ChaosStats::default(),
        }
    }

    /// Next event, or `None` for a quiet step
    pub fn step(&mut self) -> Option<NetworkEvent> {
        self.stats.steps += 1;

        let flip = if self.online {
            self.config.drop_prob
        } else {
            self.config.recover_prob
        };
        if self.rng.gen_bool(flip) {
            self.online = !self.online;
            return Some(if self.online {
                self.stats.recoveries += 1;
                NetworkEvent::GoOnline
            } else {
                self.stats.drops += 1;
                NetworkEvent::GoOffline
            });
        }

        if self.rng.gen_bool(self.config.type_change_prob) {
            self.stats.type_changes += 1;
            let pick = EFFECTIVE_TYPES[self.rng.gen_range(0..EFFECTIVE_TYPES.len())];
            return Some(NetworkEvent::EffectiveType(pick));
        }

        if self.rng.gen_bool(self.config.replay_prob) {
            self.stats.replays += 1;
            let channel = match self.rng.gen_range(0..2) {
                0 => SignalChannel::ConnectionChange,
                _ if self.online => SignalChannel::Online,
                _ => SignalChannel::Offline,
            };
            return Some(NetworkEvent::Replay(channel));
        }

        self.stats.quiet += 1;
        None
    }

    /// Generate `steps` steps, keeping only the events
    pub fn script(&mut self, steps: usize) -> Vec<NetworkEvent> {
        (0..steps).filter_map(|_| self.step()).collect()
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    pub fn stats(&self) -> &ChaosStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_seeded_scripts_repeat() {
        let a = ChaosNetwork::with_seed(ChaosConfig::hostile(), true, 7).script(200);
        let b = ChaosNetwork::with_seed(ChaosConfig::hostile(), true, 7).script(200);
        assert_eq!(a, b);
        assert!(!a.is_empty());
    }

    proptest! {
        #[test]
        fn prop_reachability_events_alternate(seed in any::<u64>(), online in any::<bool>()) {
            let mut chaos = ChaosNetwork::with_seed(ChaosConfig::hostile(), online, seed);
            let mut state = online;
            for event in chaos.script(300) {
                match event {
                    NetworkEvent::GoOnline => {
                        prop_assert!(!state);
                        state = true;
                    }
                    NetworkEvent::GoOffline => {
                        prop_assert!(state);
                        state = false;
                    }
                    NetworkEvent::Replay(SignalChannel::Online) => prop_assert!(state),
                    NetworkEvent::Replay(SignalChannel::Offline) => prop_assert!(!state),
                    _ => {}
                }
            }
            prop_assert_eq!(state, chaos.is_online());
        }
    }

    #[test]
    fn test_stable_is_mostly_quiet() {
        let mut chaos = ChaosNetwork::with_seed(ChaosConfig::stable(), true, 3);
        chaos.script(1000);
        let stats = chaos.stats();
        assert_eq!(stats.steps, 1000);
        assert!(stats.quiet > 900);
        assert_eq!(stats.replays, 0);
    }
}
