//! # Venue Liveness
//!
//! Append-only record of venue health observations and the cool-down policy
//! derived from it.
//!
//! Observations are written by the quote aggregator only. A venue whose
//! latest observation is `Dead` is skipped until its cool-down elapses. The
//! cool-down doubles with each consecutive `Dead` observation, capped at a
//! maximum.
//!
//! ```text
//! consecutive Dead:  1     2     3     4      5 ...
//! cool-down:         base  2b    4b    8b     min(16b, cap)
//! ```

use crate::domain::value_objects::{Clock, Timestamp, VenueId, VenueLiveness};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

/// One health observation for one venue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LivenessObservation {
    /// Observed venue.
    pub venue_id: VenueId,
    /// Classification.
    pub liveness: VenueLiveness,
    /// Observation time.
    pub observed_at: Timestamp,
    /// Why, for non-`Live` observations.
    pub reason: Option<String>,
}

impl LivenessObservation {
    /// Creates an observation.
    #[must_use]
    pub fn new(
        venue_id: VenueId,
        liveness: VenueLiveness,
        observed_at: Timestamp,
        reason: Option<String>,
    ) -> Self {
        Self {
            venue_id,
            liveness,
            observed_at,
            reason,
        }
    }
}

/// Storage for liveness observations.
///
/// Implementations must only append; recorded observations never change.
pub trait VenueLivenessStore: Send + Sync + fmt::Debug {
    /// Appends an observation.
    fn record(&self, observation: LivenessObservation);

    /// Observations for a venue, oldest first.
    fn history(&self, venue_id: &VenueId) -> Vec<LivenessObservation>;

    /// Most recent observation for a venue.
    fn latest(&self, venue_id: &VenueId) -> Option<LivenessObservation> {
        self.history(venue_id).pop()
    }
}

/// In-process [`VenueLivenessStore`].
///
/// Keeps the most recent `max_history` observations per venue.
#[derive(Debug)]
pub struct InMemoryLivenessStore {
    observations: RwLock<HashMap<VenueId, Vec<LivenessObservation>>>,
    max_history: usize,
}

impl InMemoryLivenessStore {
    /// Default per-venue history length.
    pub const DEFAULT_MAX_HISTORY: usize = 64;

    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_history(Self::DEFAULT_MAX_HISTORY)
    }

    /// Creates an empty store with a custom history bound (minimum 1).
    #[must_use]
    pub fn with_max_history(max_history: usize) -> Self {
        Self {
            observations: RwLock::new(HashMap::new()),
            max_history: max_history.max(1),
        }
    }
}

impl Default for InMemoryLivenessStore {
    fn default() -> Self {
        Self::new()
    }
}

impl VenueLivenessStore for InMemoryLivenessStore {
    fn record(&self, observation: LivenessObservation) {
        let mut observations = self
            .observations
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let history = observations
            .entry(observation.venue_id.clone())
            .or_default();
        history.push(observation);
        if history.len() > self.max_history {
            let excess = history.len() - self.max_history;
            history.drain(..excess);
        }
    }

    fn history(&self, venue_id: &VenueId) -> Vec<LivenessObservation> {
        self.observations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(venue_id)
            .cloned()
            .unwrap_or_default()
    }

    fn latest(&self, venue_id: &VenueId) -> Option<LivenessObservation> {
        self.observations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(venue_id)
            .and_then(|h| h.last().cloned())
    }
}

/// Exponential cool-down for venues observed `Dead`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CooldownPolicy {
    /// Cool-down after the first `Dead` observation, in milliseconds.
    pub base_ms: u64,
    /// Upper bound, in milliseconds.
    pub max_ms: u64,
}

impl CooldownPolicy {
    /// Creates a policy.
    #[must_use]
    pub const fn new(base_ms: u64, max_ms: u64) -> Self {
        Self { base_ms, max_ms }
    }

    /// Cool-down after `consecutive_dead` consecutive `Dead` observations.
    ///
    /// Zero observations means no cool-down.
    #[must_use]
    pub fn cooldown_for(&self, consecutive_dead: u32) -> Duration {
        if consecutive_dead == 0 {
            return Duration::ZERO;
        }
        let exponent = (consecutive_dead - 1).min(32);
        let ms = self
            .base_ms
            .saturating_mul(2u64.saturating_pow(exponent))
            .min(self.max_ms);
        Duration::from_millis(ms)
    }

    /// When a venue becomes eligible again, given its history.
    ///
    /// Returns `None` if the latest observation is not `Dead`.
    #[must_use]
    pub fn retry_after(&self, history: &[LivenessObservation]) -> Option<Timestamp> {
        let latest = history.last()?;
        if latest.liveness != VenueLiveness::Dead {
            return None;
        }
        let cooldown = self.cooldown_for(consecutive_dead(history));
        Some(latest.observed_at.add_duration(cooldown))
    }

    /// Returns true if the venue should be skipped at `now`.
    #[must_use]
    pub fn is_cooling_down(&self, history: &[LivenessObservation], now: Timestamp) -> bool {
        self.retry_after(history)
            .is_some_and(|until| now.is_before(&until))
    }
}

impl Default for CooldownPolicy {
    fn default() -> Self {
        Self::new(60_000, 600_000)
    }
}

/// Number of trailing `Dead` observations.
#[must_use]
pub fn consecutive_dead(history: &[LivenessObservation]) -> u32 {
    let count = history
        .iter()
        .rev()
        .take_while(|o| o.liveness == VenueLiveness::Dead)
        .count();
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// Current liveness view of one venue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VenueLivenessSummary {
    /// Venue.
    pub venue_id: VenueId,
    /// Latest classification, `Unknown` if never observed.
    pub liveness: VenueLiveness,
    /// When the latest observation was made.
    pub last_observed_at: Option<Timestamp>,
    /// Reason attached to the latest observation.
    pub last_reason: Option<String>,
    /// End of the current cool-down, if any.
    pub retry_after: Option<Timestamp>,
}

/// Builds a summary for one venue at `clock.now()`.
#[must_use]
pub fn summarize(
    venue_id: &VenueId,
    store: &dyn VenueLivenessStore,
    policy: &CooldownPolicy,
    clock: &dyn Clock,
) -> VenueLivenessSummary {
    let history = store.history(venue_id);
    let latest = history.last();
    let retry_after = policy
        .retry_after(&history)
        .filter(|until| clock.now().is_before(until));

    VenueLivenessSummary {
        venue_id: venue_id.clone(),
        liveness: latest.map_or(VenueLiveness::Unknown, |o| o.liveness),
        last_observed_at: latest.map(|o| o.observed_at),
        last_reason: latest.and_then(|o| o.reason.clone()),
        retry_after,
    }
}
