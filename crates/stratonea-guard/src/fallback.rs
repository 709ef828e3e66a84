//! Fallback view shown in place of a faulted subtree

use serde::{Deserialize, Serialize};

use crate::FaultRecord;

/// User-facing text for the fallback
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackCopy {
    pub title: String,
    pub message: String,
    pub retry_label: String,
    pub show_details_label: String,
    pub hide_details_label: String,
}

impl Default for FallbackCopy {
    fn default() -> Self {
        FallbackCopy {
            title: "Something went wrong".into(),
            message: "Sorry, we couldn't load this part of the app. Please try again. \
                      If the problem continues, contact support."
                .into(),
            retry_label: "Try Again".into(),
            show_details_label: "Show technical details".into(),
            hide_details_label: "Hide technical details".into(),
        }
    }
}

/// Plain recovery guidance, with technical details only on request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FallbackView {
    pub title: String,
    pub message: String,
    pub retry_label: String,
    pub details_toggle_label: String,
    pub details_expanded: bool,
    /// Description and trace; `None` until the user expands details
    pub details: Option<String>,
}

impl FallbackView {
    pub fn render(record: &FaultRecord, copy: &FallbackCopy) -> Self {
        let details_toggle_label = if record.details_expanded() {
            copy.hide_details_label.clone()
        } else {
            copy.show_details_label.clone()
        };

        let details = record
            .details_expanded()
            .then(|| format!("{}\n{}", record.description(), record.diagnostic_trace()));

        FallbackView {
            title: copy.title.clone(),
            message: copy.message.clone(),
            retry_label: copy.retry_label.clone(),
            details_toggle_label,
            details_expanded: record.details_expanded(),
            details,
        }
    }
}
