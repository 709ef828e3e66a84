//! Identity types for the resilience layer
//!
//! All identifiers are plain 64-bit counters. They are only unique within the
//! component that hands them out.

use std::fmt;

/// Observer identity - one per live monitor subscription
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct ObserverId(pub u64);

impl ObserverId {
    pub const ZERO: ObserverId = ObserverId(0);

    #[inline]
    pub fn new(id: u64) -> Self {
        ObserverId(id)
    }

    /// The identifier following this one
    #[inline]
    pub fn next(self) -> Self {
        ObserverId(self.0.wrapping_add(1))
    }
}

impl fmt::Debug for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Observer({})", self.0)
    }
}

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Environment listener registration, issued by a connectivity source
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ListenerId(pub u64);

impl ListenerId {
    #[inline]
    pub fn new(id: u64) -> Self {
        ListenerId(id)
    }
}

impl fmt::Debug for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listener({})", self.0)
    }
}

/// Fault episode - increments every time a boundary enters the faulted state
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct EpisodeId(pub u64);

impl EpisodeId {
    pub const ZERO: EpisodeId = EpisodeId(0);

    #[inline]
    pub fn new(id: u64) -> Self {
        EpisodeId(id)
    }

    #[inline]
    pub fn next(self) -> Self {
        EpisodeId(self.0.wrapping_add(1))
    }
}

impl fmt::Debug for EpisodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Episode({})", self.0)
    }
}

impl fmt::Display for EpisodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
