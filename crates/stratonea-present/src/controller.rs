//! Presentation controller
//!
//! Holds the current inputs, recomputes on every change, and relays the
//! data-saving request. The data-saving preference itself belongs to the host.

use std::sync::Arc;

use stratonea_core::ConnectivityStatus;

use crate::{derive, IndicatorCopy, IndicatorView, Presentation, PresentationInputs};

/// Host callback for the "enable data saving" action
pub type DataSavingHandler = Arc<dyn Fn() + Send + Sync>;

/// Adaptive presentation controller
pub struct PresentationController {
    inputs: PresentationInputs,
    last: Presentation,
    on_data_saving: DataSavingHandler,
    data_saving_requests: u64,
}

impl PresentationController {
    /// Create a controller for the given connectivity, nothing loading
    pub fn new(status: ConnectivityStatus, on_data_saving: DataSavingHandler) -> Self {
        let inputs = PresentationInputs::from_status(status);
        PresentationController {
            inputs,
            last: derive(inputs),
            on_data_saving,
            data_saving_requests: 0,
        }
    }

    pub fn inputs(&self) -> PresentationInputs {
        self.inputs
    }

    /// Current presentation, always freshly derived
    pub fn presentation(&self) -> Presentation {
        derive(self.inputs)
    }

    /// Render the current presentation with the given copy
    pub fn indicator(&self, copy: &IndicatorCopy) -> IndicatorView {
        IndicatorView::render(self.presentation(), copy)
    }

    /// Host reports whether a load is in flight.
    ///
    /// Returns the new presentation if it differs from the last one reported.
    pub fn set_loading(&mut self, loading_requested: bool) -> Option<Presentation> {
        self.inputs.loading_requested = loading_requested;
        self.recompute()
    }

    /// Host reports whether saved data is available
    pub fn set_cached_data(&mut self, has_cached_data: bool) -> Option<Presentation> {
        self.inputs.has_cached_data = has_cached_data;
        self.recompute()
    }

    /// Feed a status from the connectivity monitor
    pub fn apply_status(&mut self, status: ConnectivityStatus) -> Option<Presentation> {
        self.inputs = self.inputs.with_status(status);
        self.recompute()
    }

    /// The user asked to reduce data usage.
    ///
    /// Invokes the host callback exactly once per call.
    pub fn request_data_saving(&mut self) {
        self.data_saving_requests += 1;
        if !self.presentation().slow_advisory {
            tracing::debug!("data saving requested without slow-connection advisory");
        }
        (self.on_data_saving)();
    }

    /// How many times the action was relayed
    pub fn data_saving_requests(&self) -> u64 {
        self.data_saving_requests
    }

    fn recompute(&mut self) -> Option<Presentation> {
        let next = derive(self.inputs);
        if next == self.last {
            return None;
        }
        tracing::debug!(from = %self.last, to = %next, "presentation changed");
        self.last = next;
        Some(next)
    }
}

impl std::fmt::Debug for PresentationController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresentationController")
            .field("inputs", &self.inputs)
            .field("presentation", &self.last)
            .field("data_saving_requests", &self.data_saving_requests)
            .finish()
    }
}
