//! Render faults and fault records

use std::any::Any;

use stratonea_core::EpisodeId;
use thiserror::Error;

/// A fault raised while building or updating a subtree
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct RenderFault {
    message: String,
    detail: Option<String>,
}

impl RenderFault {
    pub fn new(message: impl Into<String>) -> Self {
        RenderFault {
            message: message.into(),
            detail: None,
        }
    }

    /// Attach technical detail shown only in the expanded trace
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }
}

impl From<&str> for RenderFault {
    fn from(message: &str) -> Self {
        RenderFault::new(message)
    }
}

impl From<String> for RenderFault {
    fn from(message: String) -> Self {
        RenderFault::new(message)
    }
}

/// How the fault reached the boundary
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FaultOrigin {
    /// The builder returned an error
    Returned,
    /// The builder panicked
    Panicked,
}

/// One fault episode, owned by the boundary until the user tries again
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FaultRecord {
    pub(crate) episode: EpisodeId,
    pub(crate) origin: FaultOrigin,
    pub(crate) description: String,
    pub(crate) trace: String,
    pub(crate) details_expanded: bool,
}

impl FaultRecord {
    pub(crate) fn new(
        episode: EpisodeId,
        origin: FaultOrigin,
        description: String,
        trace: String,
    ) -> Self {
        FaultRecord {
            episode,
            origin,
            description,
            trace,
            details_expanded: false,
        }
    }

    pub fn episode(&self) -> EpisodeId {
        self.episode
    }

    pub fn origin(&self) -> FaultOrigin {
        self.origin
    }

    /// Human-readable fault description
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Diagnostic trace for support escalation
    pub fn diagnostic_trace(&self) -> &str {
        &self.trace
    }

    pub fn details_expanded(&self) -> bool {
        self.details_expanded
    }
}

/// External error-reporting sink
///
/// Called once per fault episode, outside fault interception: a reporter
/// that panics takes the boundary down with it.
pub trait FaultReporter: Send + Sync {
    fn report(&self, boundary: &str, record: &FaultRecord);
}

impl<F> FaultReporter for F
where
    F: Fn(&str, &FaultRecord) + Send + Sync,
{
    fn report(&self, boundary: &str, record: &FaultRecord) {
        self(boundary, record)
    }
}

/// Extract a readable message from a panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(fault) = payload.downcast_ref::<RenderFault>() {
        fault.message().to_string()
    } else {
        "Unknown panic while rendering".to_string()
    }
}
