//! Shell - the composition root's event loop
//!
//! The shell owns the single connectivity monitor and the presentation
//! controller. Host inputs arrive over a channel and connectivity changes
//! arrive over the monitor's subscription; both are applied on the loop, so
//! the controller never needs a lock.

use std::sync::Arc;

use stratonea_core::ConnectivityStatus;
use stratonea_guard::{BoundaryOptions, FaultReporter};
use stratonea_net::{ConnectivityMonitor, ConnectivitySource};
use stratonea_present::{DataSavingHandler, IndicatorView, Presentation, PresentationController};
use tokio::sync::mpsc;

use crate::RuntimeConfig;

/// Receives every presentation the shell derives
pub trait PresentationSink: Send {
    fn render(&mut self, presentation: Presentation, view: &IndicatorView);
}

impl<F> PresentationSink for F
where
    F: FnMut(Presentation, &IndicatorView) + Send,
{
    fn render(&mut self, presentation: Presentation, view: &IndicatorView) {
        self(presentation, view)
    }
}

/// Host inputs relayed to the loop
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ShellInput {
    Loading(bool),
    CachedData(bool),
    RequestDataSaving,
    Shutdown,
}

/// Why the loop stopped
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// `ShellHandle::shutdown` was called
    Shutdown,
    /// Every handle was dropped
    HandlesDropped,
    /// The connectivity subscription ended
    MonitorClosed,
}

/// Loop statistics returned from `Shell::run`
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShellStats {
    pub renders: u64,
    pub status_updates: u64,
    pub host_inputs: u64,
    pub data_saving_requests: u64,
}

/// Summary of a finished run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShellReport {
    pub reason: StopReason,
    pub stats: ShellStats,
    pub last_presentation: Presentation,
}

/// Host-side handle; cheap to clone
#[derive(Clone)]
pub struct ShellHandle {
    inputs: mpsc::UnboundedSender<ShellInput>,
    monitor: ConnectivityMonitor,
    config: Arc<RuntimeConfig>,
    reporter: Option<Arc<dyn FaultReporter>>,
}

impl ShellHandle {
    /// The application's one connectivity monitor
    pub fn monitor(&self) -> &ConnectivityMonitor {
        &self.monitor
    }

    pub fn status(&self) -> ConnectivityStatus {
        self.monitor.status()
    }

    pub fn set_loading(&self, loading_requested: bool) -> bool {
        self.send(ShellInput::Loading(loading_requested))
    }

    pub fn set_cached_data(&self, has_cached_data: bool) -> bool {
        self.send(ShellInput::CachedData(has_cached_data))
    }

    /// Relay the user's "enable data saving" action
    pub fn request_data_saving(&self) -> bool {
        self.send(ShellInput::RequestDataSaving)
    }

    pub fn shutdown(&self) -> bool {
        self.send(ShellInput::Shutdown)
    }

    /// Options for a fault boundary using the configured copy and reporter
    pub fn boundary_options(&self, name: impl Into<String>) -> BoundaryOptions {
        let options = BoundaryOptions::named(name).with_copy(self.config.fallback.clone());
        match &self.reporter {
            Some(reporter) => options.with_reporter(Arc::clone(reporter)),
            None => options,
        }
    }

    /// `false` once the loop has stopped
    fn send(&self, input: ShellInput) -> bool {
        self.inputs.send(input).is_ok()
    }
}

impl std::fmt::Debug for ShellHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShellHandle")
            .field("monitor", &self.monitor)
            .field("running", &!self.inputs.is_closed())
            .finish()
    }
}

/// Presentation event loop
pub struct Shell {
    config: Arc<RuntimeConfig>,
    monitor: ConnectivityMonitor,
    controller: PresentationController,
    inputs: mpsc::UnboundedReceiver<ShellInput>,
    stats: ShellStats,
}

impl Shell {
    /// Build the shell and its first handle
    pub fn new(
        config: RuntimeConfig,
        source: Arc<dyn ConnectivitySource>,
        on_data_saving: DataSavingHandler,
    ) -> (Shell, ShellHandle) {
        Self::with_reporter(config, source, on_data_saving, None)
    }

    pub fn with_reporter(
        config: RuntimeConfig,
        source: Arc<dyn ConnectivitySource>,
        on_data_saving: DataSavingHandler,
        reporter: Option<Arc<dyn FaultReporter>>,
    ) -> (Shell, ShellHandle) {
        let config = Arc::new(config);
        let monitor = ConnectivityMonitor::new(source);
        let controller = PresentationController::new(monitor.status(), on_data_saving);
        let (tx, rx) = mpsc::unbounded_channel();

        let handle = ShellHandle {
            inputs: tx,
            monitor: monitor.clone(),
            config: Arc::clone(&config),
            reporter,
        };
        let shell = Shell {
            config,
            monitor,
            controller,
            inputs: rx,
            stats: ShellStats::default(),
        };
        (shell, handle)
    }

    /// Run until shutdown, pushing each changed presentation to `sink`.
    ///
    /// The current presentation is rendered once on entry.
    pub async fn run<S: PresentationSink>(mut self, mut sink: S) -> ShellReport {
        let mut subscription = self.monitor.subscribe();
        tracing::info!(
            status = %subscription.initial(),
            change_events = self.monitor.supports_change_events(),
            "shell started"
        );

        self.controller.apply_status(subscription.initial());
        let initial = self.controller.presentation();
        self.render(&mut sink, initial);

        let reason = loop {
            tokio::select! {
                status = subscription.changed() => match status {
                    Some(status) => {
                        self.stats.status_updates += 1;
                        if let Some(next) = self.controller.apply_status(status) {
                            self.render(&mut sink, next);
                        }
                    }
                    None => break StopReason::MonitorClosed,
                },
                input = self.inputs.recv() => match input {
                    Some(ShellInput::Shutdown) => break StopReason::Shutdown,
                    Some(input) => self.apply_input(&mut sink, input),
                    None => break StopReason::HandlesDropped,
                },
            }
        };

        subscription.unsubscribe();
        tracing::info!(?reason, renders = self.stats.renders, "shell stopped");

        ShellReport {
            reason,
            stats: self.stats,
            last_presentation: self.controller.presentation(),
        }
    }

    fn apply_input<S: PresentationSink>(&mut self, sink: &mut S, input: ShellInput) {
        self.stats.host_inputs += 1;
        let changed = match input {
            ShellInput::Loading(loading) => self.controller.set_loading(loading),
            ShellInput::CachedData(cached) => self.controller.set_cached_data(cached),
            ShellInput::RequestDataSaving => {
                self.controller.request_data_saving();
                self.stats.data_saving_requests += 1;
                None
            }
            ShellInput::Shutdown => None,
        };
        if let Some(next) = changed {
            self.render(sink, next);
        }
    }

    fn render<S: PresentationSink>(&mut self, sink: &mut S, presentation: Presentation) {
        let view = IndicatorView::render(presentation, &self.config.indicator);
        self.stats.renders += 1;
        sink.render(presentation, &view);
    }
}

impl std::fmt::Debug for Shell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shell")
            .field("monitor", &self.monitor)
            .field("controller", &self.controller)
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use stratonea_net::ManualSource;
    use stratonea_present::PresentationMode;
    use tokio::sync::mpsc::UnboundedReceiver;
    use tokio::time::timeout;

    type Rendered = (Presentation, IndicatorView);

    fn start(
        source: Arc<ManualSource>,
    ) -> (
        ShellHandle,
        UnboundedReceiver<Rendered>,
        tokio::task::JoinHandle<ShellReport>,
        Arc<AtomicUsize>,
    ) {
        let clicks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&clicks);
        let handler: DataSavingHandler = Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let (shell, handle) = Shell::new(RuntimeConfig::default(), source, handler);
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(shell.run(move |p: Presentation, v: &IndicatorView| {
            let _ = tx.send((p, v.clone()));
        }));
        (handle, rx, task, clicks)
    }

    async fn next(rx: &mut UnboundedReceiver<Rendered>) -> Rendered {
        timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("render timed out")
            .expect("sink closed")
    }

    #[tokio::test]
    async fn test_initial_render_and_offline_transition() {
        let source = Arc::new(ManualSource::new(true));
        let (handle, mut rx, task, _) = start(Arc::clone(&source));

        let (first, view) = next(&mut rx).await;
        assert_eq!(first.mode, PresentationMode::Ready);
        assert!(view.is_empty());

        source.set_online(false);
        let (offline, view) = next(&mut rx).await;
        assert_eq!(offline.mode, PresentationMode::OfflineNoData);
        assert!(view.offline_banner.is_some());

        handle.shutdown();
        let report = task.await.unwrap();
        assert_eq!(report.reason, StopReason::Shutdown);
        assert_eq!(report.stats.renders, 2);
        assert_eq!(source.listener_count(), 0);
    }

    #[tokio::test]
    async fn test_host_inputs_drive_modes() {
        let source = Arc::new(ManualSource::new(false));
        let (handle, mut rx, task, _) = start(Arc::clone(&source));
        assert_eq!(next(&mut rx).await.0.mode, PresentationMode::OfflineNoData);

        handle.set_cached_data(true);
        assert_eq!(next(&mut rx).await.0.mode, PresentationMode::OfflineWithCache);

        handle.set_loading(true);
        let (loading, view) = next(&mut rx).await;
        assert_eq!(loading.mode, PresentationMode::LoadingFromCache);
        assert!(view.spinner.is_some());
        assert_eq!(view.offline_banner.as_deref(), Some("Working offline with saved data"));

        source.set_online(true);
        assert_eq!(next(&mut rx).await.0.mode, PresentationMode::LoadingOnline);

        drop(handle);
        let report = task.await.unwrap();
        assert_eq!(report.reason, StopReason::HandlesDropped);
        assert_eq!(report.stats.host_inputs, 2);
        assert_eq!(report.last_presentation.mode, PresentationMode::LoadingOnline);
    }

    #[tokio::test]
    async fn test_slow_advisory_and_data_saving() {
        let source = Arc::new(ManualSource::new(true).with_effective_type(Some("4g")));
        let (handle, mut rx, task, clicks) = start(Arc::clone(&source));
        assert!(!next(&mut rx).await.0.slow_advisory);

        source.set_effective_type(Some("2g"));
        let (slow, view) = next(&mut rx).await;
        assert!(slow.slow_advisory);
        assert!(view.slow_notice.is_some());

        handle.request_data_saving();
        handle.shutdown();
        let report = task.await.unwrap();
        assert_eq!(clicks.load(Ordering::SeqCst), 1);
        assert_eq!(report.stats.data_saving_requests, 1);
        assert_eq!(report.stats.status_updates, 1);
    }

    #[tokio::test]
    async fn test_handle_reports_stopped_loop() {
        let source = Arc::new(ManualSource::new(true));
        let (handle, _rx, task, _) = start(source);
        handle.shutdown();
        task.await.unwrap();
        assert!(!handle.set_loading(true));
    }

    #[test]
    fn test_boundary_options_use_configured_copy() {
        let mut config = RuntimeConfig::default();
        config.fallback.retry_label = "Retry".into();
        let (_shell, handle) = Shell::new(
            config,
            Arc::new(ManualSource::new(true)),
            Arc::new(|| {}),
        );
        let options = handle.boundary_options("feed");
        assert_eq!(options.name, "feed");
        assert_eq!(options.copy.retry_label, "Retry");
        assert!(options.reporter.is_none());
    }
}
