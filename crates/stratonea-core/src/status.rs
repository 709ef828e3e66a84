//! Connectivity status value object

use std::fmt;

use crate::QualityClass;

/// Snapshot of what the environment reports about the network.
///
/// Recomputed on every relevant environment event. `quality` is the
/// platform's own heuristic and can be stale or absent; never treat it as a
/// throughput guarantee.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConnectivityStatus {
    /// Whether the environment believes some network path exists
    pub reachable: bool,
    /// Advertised connection class
    pub quality: QualityClass,
}

impl ConnectivityStatus {
    pub fn new(reachable: bool, quality: QualityClass) -> Self {
        ConnectivityStatus { reachable, quality }
    }

    /// Online with no quality signal
    pub fn online() -> Self {
        ConnectivityStatus::new(true, QualityClass::Unknown)
    }

    /// Offline with no quality signal
    pub fn offline() -> Self {
        ConnectivityStatus::new(false, QualityClass::Unknown)
    }

    pub fn with_quality(mut self, quality: QualityClass) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_reachable(mut self, reachable: bool) -> Self {
        self.reachable = reachable;
        self
    }
}

impl Default for ConnectivityStatus {
    /// Best-known value when nothing has been read yet
    fn default() -> Self {
        ConnectivityStatus::online()
    }
}

impl fmt::Display for ConnectivityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reach = if self.reachable { "online" } else { "offline" };
        write!(f, "{}/{}", reach, self.quality)
    }
}
