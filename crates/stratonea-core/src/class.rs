//! Connection quality classes
//!
//! The runtime environment advertises an "effective connection type" string
//! (`slow-2g`, `2g`, `3g`, `4g`). It is the platform's own heuristic, so the
//! class derived from it is advisory only:
//! - FAST: 4g
//! - MEDIUM: 3g
//! - SLOW: 2g
//! - VERY_SLOW: slow-2g
//! - UNKNOWN: anything else, or no signal at all

use std::fmt;

/// Coarse connection quality bucket
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum QualityClass {
    /// Advertised 4g-class link
    Fast = 0x00,
    /// Advertised 3g-class link
    Medium = 0x01,
    /// Advertised 2g-class link
    Slow = 0x02,
    /// Advertised slow-2g link
    VerySlow = 0x03,
    /// No usable signal from the environment
    #[default]
    Unknown = 0xFF,
}

impl QualityClass {
    /// Map an effective-type string from the environment.
    ///
    /// Matching is exact; unrecognised values are not an error.
    pub fn from_effective_type(effective_type: Option<&str>) -> Self {
        match effective_type {
            Some("slow-2g") => QualityClass::VerySlow,
            Some("2g") => QualityClass::Slow,
            Some("3g") => QualityClass::Medium,
            Some("4g") => QualityClass::Fast,
            _ => QualityClass::Unknown,
        }
    }

    /// Parse from a wire byte (FFI boundary)
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0x00 => Some(QualityClass::Fast),
            0x01 => Some(QualityClass::Medium),
            0x02 => Some(QualityClass::Slow),
            0x03 => Some(QualityClass::VerySlow),
            0xFF => Some(QualityClass::Unknown),
            _ => None,
        }
    }

    #[inline]
    pub fn to_byte(self) -> u8 {
        self as u8
    }

    /// Does this class warrant the slow-connection advisory?
    #[inline]
    pub fn is_slow(self) -> bool {
        matches!(self, QualityClass::Slow | QualityClass::VerySlow)
    }

    /// Stable lowercase name, used in logs and config
    pub fn as_str(self) -> &'static str {
        match self {
            QualityClass::Fast => "fast",
            QualityClass::Medium => "medium",
            QualityClass::Slow => "slow",
            QualityClass::VerySlow => "very_slow",
            QualityClass::Unknown => "unknown",
        }
    }

    pub fn all() -> &'static [QualityClass] {
        &[
            QualityClass::Fast,
            QualityClass::Medium,
            QualityClass::Slow,
            QualityClass::VerySlow,
            QualityClass::Unknown,
        ]
    }
}

impl fmt::Display for QualityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
