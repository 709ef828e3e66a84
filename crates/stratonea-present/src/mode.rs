//! Presentation modes and their derivation
//!
//! The mapping is stateless and recomputed whenever any input changes:
//!
//! ```text
//! loading requested, reachable      -> LoadingOnline
//! loading requested, unreachable    -> LoadingFromCache
//! idle, unreachable, cached data    -> OfflineWithCache
//! idle, unreachable, no cached data -> OfflineNoData
//! idle, reachable                   -> Ready
//! ```
//!
//! The slow-connection advisory is an overlay, not a sixth mode: it is active
//! whenever the quality class is SLOW or VERY_SLOW, whatever the mode.
//! `cached_offline` is set while unreachable with saved data, so an offline
//! load can show the matching banner under its spinner.

use std::fmt;

use stratonea_core::{ConnectivityStatus, QualityClass};

/// The single UI state the host should render
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PresentationMode {
    /// Loading, with a network path available
    LoadingOnline = 0x00,
    /// Loading while offline; whatever is shown comes from saved data
    LoadingFromCache = 0x01,
    /// Offline, saved data is available
    OfflineWithCache = 0x02,
    /// Offline, nothing to show
    OfflineNoData = 0x03,
    /// Nothing pending, online
    Ready = 0x04,
}

impl PresentationMode {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0x00 => Some(PresentationMode::LoadingOnline),
            0x01 => Some(PresentationMode::LoadingFromCache),
            0x02 => Some(PresentationMode::OfflineWithCache),
            0x03 => Some(PresentationMode::OfflineNoData),
            0x04 => Some(PresentationMode::Ready),
            _ => None,
        }
    }

    #[inline]
    pub fn to_byte(self) -> u8 {
        self as u8
    }

    pub fn is_loading(self) -> bool {
        matches!(
            self,
            PresentationMode::LoadingOnline | PresentationMode::LoadingFromCache
        )
    }

    pub fn is_offline(self) -> bool {
        matches!(
            self,
            PresentationMode::LoadingFromCache
                | PresentationMode::OfflineWithCache
                | PresentationMode::OfflineNoData
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            PresentationMode::LoadingOnline => "loading_online",
            PresentationMode::LoadingFromCache => "loading_from_cache",
            PresentationMode::OfflineWithCache => "offline_with_cache",
            PresentationMode::OfflineNoData => "offline_no_data",
            PresentationMode::Ready => "ready",
        }
    }

    pub fn all() -> &'static [PresentationMode] {
        &[
            PresentationMode::LoadingOnline,
            PresentationMode::LoadingFromCache,
            PresentationMode::OfflineWithCache,
            PresentationMode::OfflineNoData,
            PresentationMode::Ready,
        ]
    }
}

impl fmt::Display for PresentationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The four inputs the presentation is derived from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PresentationInputs {
    /// Supplied by the host's data layer
    pub loading_requested: bool,
    /// From the connectivity monitor
    pub reachable: bool,
    /// Supplied by the host's cache layer
    pub has_cached_data: bool,
    /// From the connectivity monitor
    pub quality: QualityClass,
}

impl PresentationInputs {
    pub fn new(
        loading_requested: bool,
        reachable: bool,
        has_cached_data: bool,
        quality: QualityClass,
    ) -> Self {
        PresentationInputs {
            loading_requested,
            reachable,
            has_cached_data,
            quality,
        }
    }

    /// Idle inputs for a given connectivity status
    pub fn from_status(status: ConnectivityStatus) -> Self {
        PresentationInputs::new(false, status.reachable, false, status.quality)
    }

    pub fn with_status(mut self, status: ConnectivityStatus) -> Self {
        self.reachable = status.reachable;
        self.quality = status.quality;
        self
    }

    pub fn derive(&self) -> Presentation {
        derive(*self)
    }
}

/// Derived presentation: one mode plus the advisory overlay
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Presentation {
    pub mode: PresentationMode,
    pub slow_advisory: bool,
    /// Unreachable, and saved data is available
    pub cached_offline: bool,
}

impl fmt::Display for Presentation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.slow_advisory {
            write!(f, "{}+slow", self.mode)
        } else {
            write!(f, "{}", self.mode)
        }
    }
}

/// Derive the presentation for a set of inputs
pub fn derive(inputs: PresentationInputs) -> Presentation {
    let mode = if inputs.loading_requested {
        if inputs.reachable {
            PresentationMode::LoadingOnline
        } else {
            PresentationMode::LoadingFromCache
        }
    } else if !inputs.reachable {
        if inputs.has_cached_data {
            PresentationMode::OfflineWithCache
        } else {
            PresentationMode::OfflineNoData
        }
    } else {
        PresentationMode::Ready
    };

    Presentation {
        mode,
        slow_advisory: inputs.quality.is_slow(),
        cached_offline: !inputs.reachable && inputs.has_cached_data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn quality() -> impl Strategy<Value = QualityClass> {
        proptest::sample::select(QualityClass::all().to_vec())
    }

    #[test]
    fn test_offline_variants() {
        let with_cache = derive(PresentationInputs::new(false, false, true, QualityClass::Unknown));
        assert_eq!(with_cache.mode, PresentationMode::OfflineWithCache);

        let no_data = derive(PresentationInputs::new(false, false, false, QualityClass::Unknown));
        assert_eq!(no_data.mode, PresentationMode::OfflineNoData);
    }

    #[test]
    fn test_advisory_overlays_loading() {
        let p = derive(PresentationInputs::new(true, true, false, QualityClass::VerySlow));
        assert_eq!(p.mode, PresentationMode::LoadingOnline);
        assert!(p.slow_advisory);
        assert_eq!(p.to_string(), "loading_online+slow");
    }

    #[test]
    fn test_mode_flags() {
        assert!(PresentationMode::LoadingFromCache.is_loading());
        assert!(PresentationMode::LoadingFromCache.is_offline());
        assert!(!PresentationMode::Ready.is_offline());
        for mode in PresentationMode::all() {
            assert_eq!(PresentationMode::from_byte(mode.to_byte()), Some(*mode));
        }
    }

    proptest! {
        #[test]
        fn prop_loading_online(cached in any::<bool>(), q in quality()) {
            let p = derive(PresentationInputs::new(true, true, cached, q));
            prop_assert_eq!(p.mode, PresentationMode::LoadingOnline);
        }

        #[test]
        fn prop_loading_from_cache(cached in any::<bool>(), q in quality()) {
            let p = derive(PresentationInputs::new(true, false, cached, q));
            prop_assert_eq!(p.mode, PresentationMode::LoadingFromCache);
        }

        #[test]
        fn prop_ready_when_idle_online(cached in any::<bool>(), q in quality()) {
            let p = derive(PresentationInputs::new(false, true, cached, q));
            prop_assert_eq!(p.mode, PresentationMode::Ready);
        }

        #[test]
        fn prop_offline_follows_cache(cached in any::<bool>(), q in quality()) {
            let p = derive(PresentationInputs::new(false, false, cached, q));
            let expected = if cached {
                PresentationMode::OfflineWithCache
            } else {
                PresentationMode::OfflineNoData
            };
            prop_assert_eq!(p.mode, expected);
        }

        #[test]
        fn prop_cached_offline_only_when_unreachable(
            loading in any::<bool>(),
            reachable in any::<bool>(),
            cached in any::<bool>(),
            q in quality(),
        ) {
            let p = derive(PresentationInputs::new(loading, reachable, cached, q));
            prop_assert_eq!(p.cached_offline, !reachable && cached);
        }

        #[test]
        fn prop_quality_only_drives_advisory(
            loading in any::<bool>(),
            reachable in any::<bool>(),
            cached in any::<bool>(),
            q in quality(),
        ) {
            let p = derive(PresentationInputs::new(loading, reachable, cached, q));
            let baseline = derive(PresentationInputs::new(loading, reachable, cached, QualityClass::Unknown));
            prop_assert_eq!(p.mode, baseline.mode);
            prop_assert_eq!(
                p.slow_advisory,
                matches!(q, QualityClass::Slow | QualityClass::VerySlow)
            );
        }
    }
}
