//! Fault boundary state holder
//!
//! States: HEALTHY (holds the built subtree) and FAULTED (holds one fault
//! record). Trying again always discards the faulted state and builds a new
//! subtree; a stale subtree is never reused. There is no automatic retry and
//! no retry limit.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use stratonea_core::EpisodeId;

use crate::fault::panic_message;
use crate::{
    FallbackCopy, FallbackView, FaultOrigin, FaultRecord, FaultReporter, RenderFault, RenderScope,
};

/// Builder for the wrapped subtree
pub type SubtreeBuilder<T> = Box<dyn FnMut(&mut RenderScope) -> Result<T, RenderFault>>;

/// Boundary configuration
#[derive(Clone, Default)]
pub struct BoundaryOptions {
    /// Name used in traces and logs
    pub name: String,
    /// Text for the fallback view
    pub copy: FallbackCopy,
    /// Optional error-reporting sink
    pub reporter: Option<Arc<dyn FaultReporter>>,
}

impl BoundaryOptions {
    pub fn named(name: impl Into<String>) -> Self {
        BoundaryOptions {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_copy(mut self, copy: FallbackCopy) -> Self {
        self.copy = copy;
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn FaultReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }
}

enum BoundaryState<T> {
    Healthy(T),
    Faulted(FaultRecord),
}

/// Typed view of the boundary's current state
#[derive(Debug)]
pub enum Outcome<'a, T> {
    Healthy(&'a T),
    Faulted(&'a FaultRecord),
}

/// Fault-containment boundary around one subtree
pub struct FaultBoundary<T> {
    options: BoundaryOptions,
    builder: SubtreeBuilder<T>,
    state: BoundaryState<T>,
    last_episode: EpisodeId,
}

impl<T> FaultBoundary<T> {
    /// Wrap a subtree and build it immediately
    pub fn mount(
        name: impl Into<String>,
        builder: impl FnMut(&mut RenderScope) -> Result<T, RenderFault> + 'static,
    ) -> Self {
        Self::mount_with(BoundaryOptions::named(name), builder)
    }

    pub fn mount_with(
        options: BoundaryOptions,
        builder: impl FnMut(&mut RenderScope) -> Result<T, RenderFault> + 'static,
    ) -> Self {
        let mut builder: SubtreeBuilder<T> = Box::new(builder);
        let mut last_episode = EpisodeId::ZERO;
        let state = build(&options, &mut builder, &mut last_episode);

        FaultBoundary {
            options,
            builder,
            state,
            last_episode,
        }
    }

    pub fn name(&self) -> &str {
        &self.options.name
    }

    pub fn outcome(&self) -> Outcome<'_, T> {
        match &self.state {
            BoundaryState::Healthy(subtree) => Outcome::Healthy(subtree),
            BoundaryState::Faulted(record) => Outcome::Faulted(record),
        }
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self.state, BoundaryState::Healthy(_))
    }

    pub fn subtree(&self) -> Option<&T> {
        match &self.state {
            BoundaryState::Healthy(subtree) => Some(subtree),
            BoundaryState::Faulted(_) => None,
        }
    }

    pub fn fault(&self) -> Option<&FaultRecord> {
        match &self.state {
            BoundaryState::Faulted(record) => Some(record),
            BoundaryState::Healthy(_) => None,
        }
    }

    /// Number of fault episodes so far
    pub fn episodes(&self) -> u64 {
        self.last_episode.0
    }

    /// Update the healthy subtree under fault interception.
    ///
    /// Returns `None` without running `f` while faulted, or when `f` faults;
    /// in the latter case the subtree is dropped and the boundary is FAULTED.
    pub fn update<R>(
        &mut self,
        f: impl FnOnce(&mut T, &mut RenderScope) -> Result<R, RenderFault>,
    ) -> Option<R> {
        let BoundaryState::Healthy(subtree) = &mut self.state else {
            return None;
        };

        match intercept(&self.options.name, |scope| f(subtree, scope)) {
            Ok(value) => Some(value),
            Err(caught) => {
                self.state = BoundaryState::Faulted(contain(
                    &self.options,
                    &mut self.last_episode,
                    caught,
                ));
                None
            }
        }
    }

    /// The user's "try again": discard the fault and build a fresh subtree.
    ///
    /// Does nothing while healthy. Returns whether the boundary is healthy
    /// afterwards; a persisting fault opens a new episode.
    pub fn try_again(&mut self) -> bool {
        let BoundaryState::Faulted(record) = &self.state else {
            return true;
        };
        tracing::info!(
            boundary = %self.options.name,
            episode = %record.episode(),
            "retrying faulted subtree"
        );

        self.state = build(&self.options, &mut self.builder, &mut self.last_episode);
        self.is_healthy()
    }

    /// Show or hide technical details. Returns the new flag, `None` while healthy.
    pub fn toggle_details(&mut self) -> Option<bool> {
        match &mut self.state {
            BoundaryState::Faulted(record) => {
                record.details_expanded = !record.details_expanded;
                Some(record.details_expanded)
            }
            BoundaryState::Healthy(_) => None,
        }
    }

    /// Fallback view for the current fault, `None` while healthy
    pub fn fallback(&self) -> Option<FallbackView> {
        self.fault()
            .map(|record| FallbackView::render(record, &self.options.copy))
    }

    /// Render the fallback with a host-supplied renderer.
    ///
    /// The renderer is not intercepted: a fault while rendering the fallback
    /// propagates to whatever wraps this boundary.
    pub fn render_fallback_with<V>(
        &self,
        render: impl FnOnce(&FaultRecord, &FallbackCopy) -> V,
    ) -> Option<V> {
        self.fault().map(|record| render(record, &self.options.copy))
    }
}

impl<T> std::fmt::Debug for FaultBoundary<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FaultBoundary")
            .field("name", &self.options.name)
            .field("healthy", &self.is_healthy())
            .field("fault", &self.fault())
            .field("episodes", &self.episodes())
            .finish()
    }
}

fn build<T>(
    options: &BoundaryOptions,
    builder: &mut SubtreeBuilder<T>,
    last_episode: &mut EpisodeId,
) -> BoundaryState<T> {
    match intercept(&options.name, |scope| builder(scope)) {
        Ok(subtree) => BoundaryState::Healthy(subtree),
        Err(caught) => BoundaryState::Faulted(contain(options, last_episode, caught)),
    }
}

/// A fault taken out of an intercepted pass
struct CaughtFault {
    origin: FaultOrigin,
    description: String,
    trace: String,
}

/// Run one build or update pass, catching returned faults and panics
fn intercept<R>(
    boundary: &str,
    pass: impl FnOnce(&mut RenderScope) -> Result<R, RenderFault>,
) -> Result<R, CaughtFault> {
    let mut scope = RenderScope::new();
    let result = panic::catch_unwind(AssertUnwindSafe(|| pass(&mut scope)));

    let (origin, description, detail) = match result {
        Ok(Ok(value)) => return Ok(value),
        Ok(Err(fault)) => (
            FaultOrigin::Returned,
            fault.message().to_owned(),
            fault.detail().map(str::to_owned),
        ),
        Err(payload) => (FaultOrigin::Panicked, panic_message(payload.as_ref()), None),
    };

    Err(CaughtFault {
        origin,
        trace: scope.trace(boundary, origin, detail.as_deref()),
        description,
    })
}

/// Open a new fault episode. Runs outside interception.
fn contain(
    options: &BoundaryOptions,
    last_episode: &mut EpisodeId,
    caught: CaughtFault,
) -> FaultRecord {
    let CaughtFault {
        origin,
        description,
        trace,
    } = caught;

    *last_episode = last_episode.next();
    let record = FaultRecord::new(*last_episode, origin, description, trace);
    tracing::error!(
        boundary = %options.name,
        episode = %record.episode(),
        ?origin,
        "render fault contained: {}",
        record.description()
    );

    if let Some(reporter) = &options.reporter {
        reporter.report(&options.name, &record);
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// A subtree that fails while `failing` is set
    fn flaky(
        failing: Rc<Cell<bool>>,
        builds: Rc<Cell<u32>>,
    ) -> impl FnMut(&mut RenderScope) -> Result<String, RenderFault> {
        move |scope| {
            builds.set(builds.get() + 1);
            scope.component("Home", |scope| {
                scope.component("Gallery", |_| {
                    if failing.get() {
                        Err(RenderFault::new("gallery failed")
                            .with_detail("thumbnail index out of range"))
                    } else {
                        Ok(format!("gallery build {}", builds.get()))
                    }
                })
            })
        }
    }

    #[test]
    fn test_healthy_mount() {
        let boundary = FaultBoundary::mount("home", |_| Ok::<_, RenderFault>(42));
        assert!(boundary.is_healthy());
        assert!(matches!(boundary.outcome(), Outcome::Healthy(&42)));
        assert!(boundary.fallback().is_none());
        assert_eq!(boundary.episodes(), 0);
    }

    #[test]
    fn test_returned_fault_is_contained() {
        let failing = Rc::new(Cell::new(true));
        let builds = Rc::new(Cell::new(0));
        let boundary = FaultBoundary::mount("home", flaky(failing, builds));

        let Outcome::Faulted(record) = boundary.outcome() else {
            panic!("expected a fault");
        };
        assert_eq!(record.description(), "gallery failed");
        assert_eq!(record.origin(), FaultOrigin::Returned);
        assert!(record.diagnostic_trace().contains("    in Gallery\n    in Home"));
        assert!(record.diagnostic_trace().starts_with("thumbnail index out of range"));

        let view = boundary.fallback().unwrap();
        assert_eq!(view.title, "Something went wrong");
        assert!(view.details.is_none());
        assert!(!view.message.contains("Gallery"));
    }

    #[test]
    fn test_recovered_child_absent_from_trace() {
        let boundary: FaultBoundary<()> = FaultBoundary::mount("home", |scope| {
            scope
                .component("OptionalBanner", |_| Err(RenderFault::new("no banner")))
                .or_else(|_| Ok::<_, RenderFault>(()))?;
            scope.component("Feed", |_| Err(RenderFault::new("feed unavailable")))
        });

        let trace = boundary.fault().unwrap().diagnostic_trace();
        assert_eq!(trace, "    in Feed\n    in FaultBoundary(home)");
        assert!(!trace.contains("OptionalBanner"));
    }

    #[test]
    fn test_update_trace_after_recovered_child() {
        let mut boundary = FaultBoundary::mount("feed", |_| Ok::<_, RenderFault>(0u32));
        boundary.update(|count, scope| {
            let extra = scope
                .component("Promo", |_| Err(RenderFault::new("promo expired")))
                .unwrap_or(0);
            scope.component("FeedItem", |_| {
                *count += extra;
                Err::<(), _>(RenderFault::new("item decode failed"))
            })
        });

        let trace = boundary.fault().unwrap().diagnostic_trace();
        assert!(trace.contains("in FeedItem"));
        assert!(!trace.contains("Promo"));
    }

    #[test]
    fn test_panic_is_contained() {
        let boundary: FaultBoundary<()> = FaultBoundary::mount("profile", |scope| {
            scope.component("Avatar", |_| -> Result<(), RenderFault> {
                panic!("avatar url missing")
            })
        });

        let record = boundary.fault().unwrap();
        assert_eq!(record.origin(), FaultOrigin::Panicked);
        assert_eq!(record.description(), "avatar url missing");
        assert!(record.diagnostic_trace().contains("in Avatar"));
        assert!(record.diagnostic_trace().ends_with("in FaultBoundary(profile)"));
    }

    #[test]
    fn test_details_only_on_request() {
        let boundary_builds = Rc::new(Cell::new(0));
        let mut boundary =
            FaultBoundary::mount("home", flaky(Rc::new(Cell::new(true)), boundary_builds));
        let before = boundary.fault().unwrap().clone();

        assert_eq!(boundary.toggle_details(), Some(true));
        let view = boundary.fallback().unwrap();
        assert!(view.details.unwrap().contains("in Gallery"));

        assert_eq!(boundary.toggle_details(), Some(false));
        assert!(boundary.fallback().unwrap().details.is_none());

        for _ in 0..5 {
            boundary.toggle_details();
        }
        let after = boundary.fault().unwrap();
        assert!(after.details_expanded());
        assert_eq!(after.description(), before.description());
        assert_eq!(after.diagnostic_trace(), before.diagnostic_trace());
        assert_eq!(after.episode(), before.episode());
        assert!(!boundary.is_healthy());
    }

    #[test]
    fn test_try_again_rebuilds_fresh() {
        let failing = Rc::new(Cell::new(true));
        let builds = Rc::new(Cell::new(0));
        let mut boundary =
            FaultBoundary::mount("home", flaky(Rc::clone(&failing), Rc::clone(&builds)));
        assert_eq!(builds.get(), 1);

        failing.set(false);
        assert!(boundary.try_again());
        assert_eq!(builds.get(), 2);
        assert_eq!(boundary.subtree().map(String::as_str), Some("gallery build 2"));
        assert!(boundary.fault().is_none());
    }

    #[test]
    fn test_persistent_fault_opens_new_episode() {
        let builds = Rc::new(Cell::new(0));
        let mut boundary =
            FaultBoundary::mount("home", flaky(Rc::new(Cell::new(true)), Rc::clone(&builds)));
        boundary.toggle_details();
        let first = boundary.fault().unwrap().episode();

        assert!(!boundary.try_again());
        let second = boundary.fault().unwrap();
        assert!(second.episode() > first);
        assert!(!second.details_expanded());
        assert_eq!(builds.get(), 2);
        assert_eq!(boundary.episodes(), 2);
    }

    #[test]
    fn test_try_again_while_healthy_is_noop() {
        let builds = Rc::new(Cell::new(0));
        let mut boundary =
            FaultBoundary::mount("home", flaky(Rc::new(Cell::new(false)), Rc::clone(&builds)));
        assert!(boundary.try_again());
        assert_eq!(builds.get(), 1);
        assert_eq!(boundary.toggle_details(), None);
    }

    #[test]
    fn test_update_fault_drops_subtree() {
        let mut boundary = FaultBoundary::mount("feed", |_| Ok::<_, RenderFault>(vec![1, 2, 3]));

        let len = boundary.update(|items, _| {
            items.push(4);
            Ok(items.len())
        });
        assert_eq!(len, Some(4));

        let result = boundary.update(|items, scope| {
            scope.component("FeedItem", |_| {
                items.get(10).copied().ok_or_else(|| RenderFault::new("missing feed item"))
            })
        });
        assert_eq!(result, None);
        assert!(boundary.subtree().is_none());
        assert!(boundary.fault().unwrap().diagnostic_trace().contains("in FeedItem"));

        // Faulted boundaries do not run updates
        assert_eq!(boundary.update(|_, _| Ok(())), None);
    }

    #[test]
    fn test_reporter_receives_each_episode() {
        let reported = Arc::new(AtomicUsize::new(0));
        let sink = Arc::clone(&reported);
        let reporter: Arc<dyn FaultReporter> = Arc::new(move |name: &str, record: &FaultRecord| {
            assert_eq!(name, "home");
            assert!(!record.description().is_empty());
            sink.fetch_add(1, Ordering::SeqCst);
        });

        let options = BoundaryOptions::named("home").with_reporter(reporter);
        let mut boundary = FaultBoundary::mount_with(options, |_| -> Result<(), RenderFault> {
            Err("always".into())
        });
        boundary.toggle_details();
        boundary.try_again();
        boundary.try_again();
        assert_eq!(reported.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_nested_boundary_contains_inner_fault() {
        let outer = FaultBoundary::mount("page", |scope| {
            let sidebar = scope.component("Sidebar", |_| {
                Ok::<_, RenderFault>(FaultBoundary::mount("weather", |_| -> Result<u8, RenderFault> {
                    Err("weather widget failed".into())
                }))
            })?;
            Ok::<_, RenderFault>(("content", sidebar))
        });

        assert!(outer.is_healthy());
        let (_, sidebar) = outer.subtree().unwrap();
        assert!(!sidebar.is_healthy());
    }

    #[test]
    fn test_fault_outside_boundary_is_not_caught() {
        let result = panic::catch_unwind(|| {
            let _sibling = FaultBoundary::mount("sibling", |_| Ok::<_, RenderFault>(()));
            panic!("header exploded");
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_fault_in_fallback_rendering_propagates() {
        let boundary: FaultBoundary<()> = FaultBoundary::mount("home", |_| Err("first".into()));

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            boundary.render_fallback_with(|_, _| -> String { panic!("fallback renderer broke") })
        }));
        assert!(result.is_err());
        assert!(!boundary.is_healthy());
    }

    #[test]
    fn test_panicking_reporter_propagates() {
        let reporter: Arc<dyn FaultReporter> =
            Arc::new(|_: &str, _: &FaultRecord| panic!("telemetry sink down"));
        let options = BoundaryOptions::named("home").with_reporter(reporter);

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            FaultBoundary::mount_with(options, |_| -> Result<(), RenderFault> { Err("boom".into()) })
        }));
        assert!(result.is_err());
    }
}
