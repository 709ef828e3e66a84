//! End-to-end Integration Test Suite
//!
//! Tests that exercise the whole resilience layer together:
//! - Screens mounting and unmounting against one shared monitor
//! - Presentation staying in step with connectivity under churn
//! - Faulting screens contained by their own boundary
//! - Listener hygiene after arbitrary mount/unmount sequences

use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use stratonea_guard::{FaultBoundary, RenderFault};
use stratonea_net::Subscription;
use stratonea_present::{
    derive, DataSavingHandler, IndicatorCopy, IndicatorView, Presentation, PresentationController,
    PresentationMode,
};

use crate::chaos::{ChaosConfig, ChaosNetwork};
use crate::simulator::NetworkSimulator;

// ============================================================================
// SIMULATED SCREEN
// ============================================================================

/// A mounted screen: one observer, one controller, one boundary.
///
/// Fragile screens fail to render whenever there is nothing to show offline.
pub struct SimulatedScreen {
    subscription: Subscription,
    controller: PresentationController,
    boundary: FaultBoundary<IndicatorView>,
    shown: Rc<Cell<Presentation>>,
    fragile: bool,
}

impl SimulatedScreen {
    fn mount(
        sim: &mut NetworkSimulator,
        name: String,
        fragile: bool,
        has_cached_data: bool,
    ) -> Self {
        let subscription = sim.subscribe();
        let handler: DataSavingHandler = Arc::new(|| {});
        let mut controller = PresentationController::new(subscription.initial(), handler);
        controller.set_cached_data(has_cached_data);

        let shown = Rc::new(Cell::new(controller.presentation()));
        let builder_view = Rc::clone(&shown);
        let copy = IndicatorCopy::default();
        let boundary = FaultBoundary::mount(name, move |scope| {
            scope.component("ConnectivityIndicator", |_| {
                let presentation = builder_view.get();
                if fragile && presentation.mode == PresentationMode::OfflineNoData {
                    return Err(RenderFault::new("nothing to render offline"));
                }
                Ok(IndicatorView::render(presentation, &copy))
            })
        });

        SimulatedScreen {
            subscription,
            controller,
            boundary,
            shown,
            fragile,
        }
    }

    /// Pull the latest status and re-render
    fn refresh(&mut self, copy: &IndicatorCopy) {
        let Some(next) = self.controller.apply_status(self.subscription.current()) else {
            return;
        };
        self.shown.set(next);

        let fragile = self.fragile;
        self.boundary.update(|view, scope| {
            scope.component("ConnectivityIndicator", |_| {
                if fragile && next.mode == PresentationMode::OfflineNoData {
                    return Err(RenderFault::new("nothing to render offline"));
                }
                *view = IndicatorView::render(next, copy);
                Ok(())
            })
        });
    }

    /// Press "Try Again" if faulted and there is something to show
    fn recover(&mut self) -> bool {
        let nothing_to_show = self.shown.get().mode == PresentationMode::OfflineNoData;
        if self.boundary.is_healthy() || nothing_to_show {
            return false;
        }
        self.boundary.try_again()
    }

    pub fn presentation(&self) -> Presentation {
        self.controller.presentation()
    }

    pub fn is_healthy(&self) -> bool {
        self.boundary.is_healthy()
    }
}

// ============================================================================
// INTEGRATION HARNESS
// ============================================================================

/// Integration test configuration
#[derive(Clone, Debug)]
pub struct IntegrationTestConfig {
    pub steps: usize,
    pub max_screens: usize,
    /// Chance per step of mounting a screen
    pub mount_prob: f64,
    /// Chance per step of unmounting a screen
    pub unmount_prob: f64,
    /// Share of screens that fault offline without data
    pub fragile_prob: f64,
    pub change_events: bool,
    pub chaos: ChaosConfig,
    pub seed: u64,
}

impl IntegrationTestConfig {
    pub fn minimal() -> Self {
        IntegrationTestConfig {
            steps: 100,
            max_screens: 2,
            mount_prob: 0.2,
            unmount_prob: 0.05,
            fragile_prob: 0.0,
            change_events: true,
            chaos: ChaosConfig::stable(),
            seed: 1,
        }
    }

    pub fn standard() -> Self {
        IntegrationTestConfig {
            steps: 1_000,
            max_screens: 8,
            mount_prob: 0.2,
            unmount_prob: 0.15,
            fragile_prob: 0.3,
            change_events: true,
            chaos: ChaosConfig::default(),
            seed: 2,
        }
    }

    pub fn stress() -> Self {
        IntegrationTestConfig {
            steps: 5_000,
            max_screens: 16,
            mount_prob: 0.4,
            unmount_prob: 0.4,
            fragile_prob: 0.5,
            change_events: true,
            chaos: ChaosConfig::hostile(),
            seed: 3,
        }
    }

    pub fn degraded(mut self) -> Self {
        self.change_events = false;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Integration test result
#[derive(Clone, Debug, Default)]
pub struct IntegrationTestResult {
    pub passed: bool,
    pub steps: usize,
    pub events: u64,
    pub mounts: u64,
    pub unmounts: u64,
    pub faults: u64,
    pub recoveries: u64,
    pub violations: Vec<String>,
}

/// Drives screens and the network together
pub struct IntegrationTestHarness {
    config: IntegrationTestConfig,
    sim: NetworkSimulator,
    chaos: ChaosNetwork,
    rng: StdRng,
    screens: Vec<SimulatedScreen>,
    copy: IndicatorCopy,
    next_screen: u64,
}

impl IntegrationTestHarness {
    pub fn new(config: IntegrationTestConfig) -> Self {
        let sim = if config.change_events {
            NetworkSimulator::new(true, Some("4g"))
        } else {
            NetworkSimulator::degraded(true, Some("4g"))
        };
        let chaos = ChaosNetwork::with_seed(config.chaos.clone(), true, config.seed);
        let rng = StdRng::seed_from_u64(config.seed.wrapping_add(0x5eed));

        IntegrationTestHarness {
            config,
            sim,
            chaos,
            rng,
            screens: Vec::new(),
            copy: IndicatorCopy::default(),
            next_screen: 0,
        }
    }

    pub fn run(&mut self) -> IntegrationTestResult {
        let mut result = IntegrationTestResult {
            steps: self.config.steps,
            ..Default::default()
        };

        for step in 0..self.config.steps {
            self.churn(&mut result);

            if let Some(event) = self.chaos.step() {
                self.sim.apply(event);
                result.events += 1;
            }

            for screen in &mut self.screens {
                let was_healthy = screen.is_healthy();
                screen.refresh(&self.copy);
                if was_healthy && !screen.is_healthy() {
                    result.faults += 1;
                }
                if screen.recover() {
                    result.recoveries += 1;
                }
            }

            self.check_invariants(step, &mut result.violations);
        }

        result.unmounts += self.screens.len() as u64;
        self.screens.clear();
        self.check_released(&mut result.violations);

        result.passed = result.violations.is_empty();
        result
    }

    fn churn(&mut self, result: &mut IntegrationTestResult) {
        let room = self.screens.len() < self.config.max_screens;
        if room && self.rng.gen_bool(self.config.mount_prob) {
            self.next_screen += 1;
            let fragile = self.rng.gen_bool(self.config.fragile_prob);
            let cached = self.rng.gen_bool(0.5);
            let name = format!("screen-{}", self.next_screen);
            let screen = SimulatedScreen::mount(&mut self.sim, name, fragile, cached);
            if !screen.is_healthy() {
                result.faults += 1;
            }
            self.screens.push(screen);
            result.mounts += 1;
        }

        if !self.screens.is_empty() && self.rng.gen_bool(self.config.unmount_prob) {
            let index = self.rng.gen_range(0..self.screens.len());
            self.screens.swap_remove(index);
            result.unmounts += 1;
        }
    }

    fn check_invariants(&self, step: usize, violations: &mut Vec<String>) {
        let monitor = self.sim.monitor();
        let status = monitor.status();

        if monitor.observer_count() != self.screens.len() {
            violations.push(format!(
                "step {}: {} observers for {} screens",
                step,
                monitor.observer_count(),
                self.screens.len()
            ));
        }
        if monitor.is_attached() != !self.screens.is_empty() {
            violations.push(format!(
                "step {}: attached={} with {} screens",
                step,
                monitor.is_attached(),
                self.screens.len()
            ));
        }
        if monitor.is_attached() && status != self.sim.expected() {
            violations.push(format!(
                "step {}: monitor {} expected {}",
                step,
                status,
                self.sim.expected()
            ));
        }

        for (i, screen) in self.screens.iter().enumerate() {
            let inputs = screen.controller.inputs();
            if inputs.reachable != status.reachable || inputs.quality != status.quality {
                violations.push(format!(
                    "step {}: screen {} stale ({} vs {})",
                    step,
                    i,
                    screen.presentation(),
                    status
                ));
            }
            if screen.presentation() != derive(inputs) {
                violations.push(format!("step {}: screen {} not derived from inputs", step, i));
            }
            if !screen.fragile && !screen.is_healthy() {
                violations.push(format!("step {}: robust screen {} faulted", step, i));
            }
        }
    }

    fn check_released(&self, violations: &mut Vec<String>) {
        let monitor = self.sim.monitor();
        if monitor.observer_count() != 0 || monitor.is_attached() {
            violations.push("monitor still attached after all screens unmounted".into());
        }
        let listeners = self.sim.source().listener_count();
        if listeners != 0 {
            violations.push(format!("{} environment listeners leaked", listeners));
        }
    }
}

// ============================================================================
// TEST FUNCTIONS
// ============================================================================

/// Few screens, calm network
pub fn test_basic_lifecycle() -> IntegrationTestResult {
    IntegrationTestHarness::new(IntegrationTestConfig::minimal()).run()
}

/// Screens churning under a flapping network
pub fn test_lifecycle_with_chaos() -> IntegrationTestResult {
    IntegrationTestHarness::new(IntegrationTestConfig::standard()).run()
}

/// Heavy churn, hostile network, many fragile screens
pub fn test_lifecycle_under_stress() -> IntegrationTestResult {
    IntegrationTestHarness::new(IntegrationTestConfig::stress()).run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratonea_core::{ConnectivityStatus, QualityClass};
    use stratonea_net::ManualSource;
    use stratonea_runtime::{RuntimeConfig, Shell};

    #[test]
    fn test_basic_lifecycle_passes() {
        let result = test_basic_lifecycle();
        assert!(result.passed, "{:?}", result.violations);
        assert!(result.mounts > 0);
    }

    #[test]
    fn test_lifecycle_with_chaos_passes() {
        let result = test_lifecycle_with_chaos();
        assert!(result.passed, "{:?}", result.violations);
        assert!(result.events > 0);
    }

    #[test]
    fn test_lifecycle_under_stress_passes() {
        let result = test_lifecycle_under_stress();
        assert!(result.passed, "{:?}", result.violations);
        assert!(result.mounts > 100);
        assert!(result.faults > 0);
    }

    #[test]
    fn test_degraded_environment_passes() {
        for seed in 0..4 {
            let config = IntegrationTestConfig::standard().degraded().with_seed(seed);
            let result = IntegrationTestHarness::new(config).run();
            assert!(result.passed, "seed {}: {:?}", seed, result.violations);
        }
    }

    #[test]
    fn test_thousand_mount_cycles_leave_no_listeners() {
        let mut sim = NetworkSimulator::new(true, Some("3g"));
        for _ in 0..1_000 {
            let first = sim.subscribe();
            let second = sim.subscribe();
            drop(first);
            assert!(sim.monitor().is_attached());
            drop(second);
        }
        assert_eq!(sim.source().listener_count(), 0);
        assert_eq!(sim.monitor().observer_count(), 0);
    }

    #[test]
    fn test_fragile_screen_faults_and_recovers() {
        let mut sim = NetworkSimulator::new(true, Some("4g"));
        let copy = IndicatorCopy::default();
        let mut fragile = SimulatedScreen::mount(&mut sim, "fragile".into(), true, false);
        let mut robust = SimulatedScreen::mount(&mut sim, "robust".into(), false, false);

        sim.apply(crate::NetworkEvent::GoOffline);
        fragile.refresh(&copy);
        robust.refresh(&copy);
        assert!(!fragile.is_healthy());
        assert!(robust.is_healthy());
        assert_eq!(
            robust
                .boundary
                .subtree()
                .and_then(|v| v.offline_banner.clone())
                .as_deref(),
            Some("Cannot load new data while offline")
        );
        assert!(!fragile.recover());

        sim.apply(crate::NetworkEvent::GoOnline);
        fragile.refresh(&copy);
        assert!(fragile.recover());
        assert!(fragile.boundary.subtree().unwrap().is_empty());
        assert_eq!(fragile.boundary.episodes(), 1);
    }

    #[tokio::test]
    async fn test_shell_over_simulated_flapping() {
        let source = Arc::new(ManualSource::new(true).with_effective_type(Some("4g")));
        let (shell, handle) =
            Shell::new(RuntimeConfig::default(), source.clone(), Arc::new(|| {}));
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let task = tokio::spawn(shell.run(move |p: Presentation, _: &IndicatorView| {
            let _ = tx.send(p);
        }));

        assert_eq!(rx.recv().await.unwrap().mode, PresentationMode::Ready);
        for _ in 0..10 {
            source.set_online(false);
            assert_eq!(rx.recv().await.unwrap().mode, PresentationMode::OfflineNoData);
            source.set_online(true);
            assert_eq!(rx.recv().await.unwrap().mode, PresentationMode::Ready);
        }
        source.set_effective_type(Some("slow-2g"));
        assert!(rx.recv().await.unwrap().slow_advisory);
        assert_eq!(
            handle.status(),
            ConnectivityStatus::new(true, QualityClass::VerySlow)
        );

        handle.shutdown();
        let report = task.await.unwrap();
        assert_eq!(report.stats.renders, 22);
        assert_eq!(source.listener_count(), 0);
    }
}
