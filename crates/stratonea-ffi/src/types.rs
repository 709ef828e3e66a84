//! FFI Types - C-compatible type definitions

use stratonea_core::{ConnectivityStatus, QualityClass};
use stratonea_present::{Presentation, PresentationInputs, PresentationMode};

/// Connection quality class
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StratoneaQuality {
    Fast = 0,
    Medium = 1,
    Slow = 2,
    VerySlow = 3,
    Unknown = 255,
}

impl From<QualityClass> for StratoneaQuality {
    fn from(quality: QualityClass) -> Self {
        match quality {
            QualityClass::Fast => Self::Fast,
            QualityClass::Medium => Self::Medium,
            QualityClass::Slow => Self::Slow,
            QualityClass::VerySlow => Self::VerySlow,
            QualityClass::Unknown => Self::Unknown,
        }
    }
}

/// Connectivity status
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StratoneaStatus {
    pub reachable: bool,
    pub quality: StratoneaQuality,
}

impl From<ConnectivityStatus> for StratoneaStatus {
    fn from(status: ConnectivityStatus) -> Self {
        Self {
            reachable: status.reachable,
            quality: status.quality.into(),
        }
    }
}

/// Presentation mode
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StratoneaMode {
    LoadingOnline = 0,
    LoadingFromCache = 1,
    OfflineWithCache = 2,
    OfflineNoData = 3,
    Ready = 4,
}

impl From<PresentationMode> for StratoneaMode {
    fn from(mode: PresentationMode) -> Self {
        match mode {
            PresentationMode::LoadingOnline => Self::LoadingOnline,
            PresentationMode::LoadingFromCache => Self::LoadingFromCache,
            PresentationMode::OfflineWithCache => Self::OfflineWithCache,
            PresentationMode::OfflineNoData => Self::OfflineNoData,
            PresentationMode::Ready => Self::Ready,
        }
    }
}

/// Inputs to presentation derivation.
///
/// `quality` is the wire byte of a quality class (0-3, or 255 for unknown);
/// any other value is treated as unknown.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct StratoneaPresentationInputs {
    pub loading_requested: bool,
    pub reachable: bool,
    pub has_cached_data: bool,
    pub quality: u8,
}

impl From<StratoneaPresentationInputs> for PresentationInputs {
    fn from(inputs: StratoneaPresentationInputs) -> Self {
        PresentationInputs::new(
            inputs.loading_requested,
            inputs.reachable,
            inputs.has_cached_data,
            QualityClass::from_byte(inputs.quality).unwrap_or_default(),
        )
    }
}

/// Derived presentation
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StratoneaPresentation {
    pub mode: StratoneaMode,
    pub slow_advisory: bool,
    pub cached_offline: bool,
}

impl From<Presentation> for StratoneaPresentation {
    fn from(p: Presentation) -> Self {
        Self {
            mode: p.mode.into(),
            slow_advisory: p.slow_advisory,
            cached_offline: p.cached_offline,
        }
    }
}

/// Callback function type for connectivity changes
pub type StratoneaStatusCallback =
    extern "C" fn(user_data: *mut std::ffi::c_void, status: StratoneaStatus);
