//! Indicator view model
//!
//! Turns a [`Presentation`] into the pieces a UI binding renders: a spinner
//! line, an offline banner, and the slow-connection notice with its action.
//! Copy is plain, short English by default and can be replaced by the host.

use serde::{Deserialize, Serialize};

use crate::{Presentation, PresentationMode};

/// User-facing text for the indicator
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorCopy {
    pub loading_online: String,
    pub loading_from_cache: String,
    pub offline_with_cache: String,
    pub offline_no_data: String,
    pub slow_notice: String,
    pub slow_action: String,
}

impl Default for IndicatorCopy {
    fn default() -> Self {
        IndicatorCopy {
            loading_online: "Loading...".into(),
            loading_from_cache: "Loading from saved data...".into(),
            offline_with_cache: "Working offline with saved data".into(),
            offline_no_data: "Cannot load new data while offline".into(),
            slow_notice: "Slow connection detected. Enable data saving mode?".into(),
            slow_action: "Enable Data Saving".into(),
        }
    }
}

/// Screen-reader announcement policy for a status line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LiveRegion {
    /// Announce when the reader is idle
    Polite,
}

/// Spinner with its status line
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Spinner {
    pub message: String,
    pub live_region: LiveRegion,
}

/// Slow-connection notice with its data-saving action
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlowNotice {
    pub message: String,
    pub action_label: String,
}

/// Everything the host renders for one presentation
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IndicatorView {
    pub spinner: Option<Spinner>,
    pub offline_banner: Option<String>,
    pub slow_notice: Option<SlowNotice>,
}

impl IndicatorView {
    pub fn render(presentation: Presentation, copy: &IndicatorCopy) -> Self {
        let spinner = |message: &str| Spinner {
            message: message.to_owned(),
            live_region: LiveRegion::Polite,
        };

        let banner = || {
            if presentation.cached_offline {
                copy.offline_with_cache.clone()
            } else {
                copy.offline_no_data.clone()
            }
        };

        // The offline banner does not depend on loading
        let (spinner, offline_banner) = match presentation.mode {
            PresentationMode::LoadingOnline => (Some(spinner(&copy.loading_online)), None),
            PresentationMode::LoadingFromCache => {
                (Some(spinner(&copy.loading_from_cache)), Some(banner()))
            }
            PresentationMode::OfflineWithCache | PresentationMode::OfflineNoData => {
                (None, Some(banner()))
            }
            PresentationMode::Ready => (None, None),
        };

        let slow_notice = presentation.slow_advisory.then(|| SlowNotice {
            message: copy.slow_notice.clone(),
            action_label: copy.slow_action.clone(),
        });

        IndicatorView {
            spinner,
            offline_banner,
            slow_notice,
        }
    }

    /// Nothing to draw
    pub fn is_empty(&self) -> bool {
        self.spinner.is_none() && self.offline_banner.is_none() && self.slow_notice.is_none()
    }
}
