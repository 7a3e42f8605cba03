//! # Venue
//!
//! Venue capabilities and per-venue routing failure records.

use crate::domain::value_objects::VenueId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a venue can do for the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VenueCapabilities {
    /// Venue answers quote requests.
    #[serde(default = "default_true")]
    pub supports_quote: bool,
    /// Venue builds transactions against its own quotes.
    #[serde(default = "default_true")]
    pub supports_direct_execution: bool,
}

fn default_true() -> bool {
    true
}

impl VenueCapabilities {
    /// Quote and execute.
    #[must_use]
    pub const fn full() -> Self {
        Self {
            supports_quote: true,
            supports_direct_execution: true,
        }
    }

    /// Quote only; transactions must be built elsewhere.
    #[must_use]
    pub const fn quote_only() -> Self {
        Self {
            supports_quote: true,
            supports_direct_execution: false,
        }
    }

    /// Returns true if the venue can both quote and build.
    #[inline]
    #[must_use]
    pub const fn is_routable(&self) -> bool {
        self.supports_quote && self.supports_direct_execution
    }
}

impl Default for VenueCapabilities {
    fn default() -> Self {
        Self::full()
    }
}

/// Why a venue did not produce a usable quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VenueFailureKind {
    /// Reachable but no route or insufficient depth.
    NoLiquidity,
    /// Timed out, errored, or returned malformed data.
    Unavailable,
    /// Skipped because the venue is cooling down after recent failures.
    SkippedCoolingDown,
    /// Skipped because the venue lacks quote or execution capability.
    NotQuotable,
}

impl fmt::Display for VenueFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NoLiquidity => "no liquidity",
            Self::Unavailable => "unavailable",
            Self::SkippedCoolingDown => "cooling down",
            Self::NotQuotable => "not quotable",
        };
        f.write_str(s)
    }
}

/// A single venue's failure during quote aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VenueFailure {
    /// Venue that failed.
    pub venue_id: VenueId,
    /// Failure classification.
    pub kind: VenueFailureKind,
    /// Human-readable detail.
    pub reason: String,
}

impl VenueFailure {
    /// Creates a failure record.
    #[must_use]
    pub fn new(venue_id: VenueId, kind: VenueFailureKind, reason: impl Into<String>) -> Self {
        Self {
            venue_id,
            kind,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for VenueFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.venue_id, self.kind, self.reason)
    }
}
