//! # Venue Liveness
//!
//! Health classification attached to every venue observation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Observed health of a venue.
///
/// - `Unknown`: never contacted
/// - `Live`: last quote succeeded
/// - `Degraded`: reachable but returned no liquidity
/// - `Dead`: timed out, errored or returned malformed data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VenueLiveness {
    /// No observation recorded yet.
    #[default]
    Unknown,
    /// Responding with usable quotes.
    Live,
    /// Reachable but unable to fill.
    Degraded,
    /// Unreachable or misbehaving.
    Dead,
}

impl VenueLiveness {
    /// Returns true if the venue should be considered for routing right now
    /// without consulting the cool-down policy.
    #[inline]
    #[must_use]
    pub const fn is_routable(self) -> bool {
        !matches!(self, Self::Dead)
    }
}

impl fmt::Display for VenueLiveness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unknown => "UNKNOWN",
            Self::Live => "LIVE",
            Self::Degraded => "DEGRADED",
            Self::Dead => "DEAD",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_unknown() {
        assert_eq!(VenueLiveness::default(), VenueLiveness::Unknown);
    }

    #[test]
    fn only_dead_is_unroutable() {
        assert!(VenueLiveness::Unknown.is_routable());
        assert!(VenueLiveness::Degraded.is_routable());
        assert!(!VenueLiveness::Dead.is_routable());
    }

    #[test]
    fn display_matches_serde() {
        let json = serde_json::to_string(&VenueLiveness::Degraded).unwrap_or_default();
        assert_eq!(json, format!("\"{}\"", VenueLiveness::Degraded));
    }
}
