//! # Confirmation Polling
//!
//! Polls a transaction's status with exponential backoff until it is final
//! or the total confirmation budget runs out.
//!
//! A poll that errors is treated as `Pending`: the status is unknown, not
//! failed. Only an explicit `Failed` status fails the transaction, and only
//! the budget running out produces [`ConfirmationOutcome::TimedOut`].
//!
//! # Example
//!
//! ```
//! use swap_engine::application::services::confirmation::{
//!     ConfirmationOutcome, ConfirmationPolicy, await_confirmation,
//! };
//! use swap_engine::domain::entities::TxStatus;
//!
//! # async fn example() {
//! let policy = ConfirmationPolicy::default();
//! let outcome = await_confirmation(&policy, || async { TxStatus::Confirmed }).await;
//! assert!(matches!(outcome, ConfirmationOutcome::Confirmed { polls: 1 }));
//! # }
//! ```

use crate::domain::entities::TxStatus;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, sleep, timeout_at};

/// Default total confirmation budget.
pub const DEFAULT_CONFIRMATION_TIMEOUT_MS: u64 = 45_000;

/// Backoff schedule for confirmation polling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfirmationPolicy {
    /// Total time to wait for a final status, in milliseconds.
    pub total_timeout_ms: u64,
    /// Delay after the first pending poll, in milliseconds.
    pub initial_delay_ms: u64,
    /// Maximum delay between polls, in milliseconds.
    pub max_delay_ms: u64,
    /// Multiplier for exponential backoff.
    pub backoff_multiplier: f64,
    /// Jitter factor (0.0-1.0).
    pub jitter_factor: f64,
}

impl Default for ConfirmationPolicy {
    fn default() -> Self {
        Self {
            total_timeout_ms: DEFAULT_CONFIRMATION_TIMEOUT_MS,
            initial_delay_ms: 500,
            max_delay_ms: 5_000,
            backoff_multiplier: 2.0,
            jitter_factor: 0.0,
        }
    }
}

impl ConfirmationPolicy {
    /// Creates a policy with the given total budget and default backoff.
    #[must_use]
    pub fn with_total_timeout(total_timeout_ms: u64) -> Self {
        Self {
            total_timeout_ms,
            ..Self::default()
        }
    }

    /// Returns the total budget.
    #[inline]
    #[must_use]
    pub fn total_timeout(&self) -> Duration {
        Duration::from_millis(self.total_timeout_ms)
    }

    /// Delay after the `attempt`-th pending poll (0-indexed):
    /// `min(initial * multiplier ^ attempt, max)`.
    #[must_use]
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let base = self.initial_delay_ms as f64 * self.backoff_multiplier.powi(exponent);
        let capped = base.min(self.max_delay_ms as f64).max(0.0);
        Duration::from_millis(capped as u64)
    }

    /// [`calculate_delay`](Self::calculate_delay) with downward jitter.
    #[must_use]
    pub fn calculate_delay_with_jitter(&self, attempt: u32) -> Duration {
        let base = self.calculate_delay(attempt);
        let factor = self.jitter_factor.clamp(0.0, 1.0);
        if factor <= 0.0 {
            return base;
        }
        let jitter: f64 = rand::rng().random();
        let millis = base.as_millis() as f64 * (1.0 - factor * jitter);
        Duration::from_millis(millis.max(1.0) as u64)
    }
}

/// Result of waiting for confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationOutcome {
    /// Final and successful.
    Confirmed {
        /// Number of polls made.
        polls: u32,
    },
    /// Final and failed.
    Failed {
        /// Number of polls made.
        polls: u32,
    },
    /// Budget exhausted without a final status.
    TimedOut {
        /// Number of polls made.
        polls: u32,
    },
}

impl ConfirmationOutcome {
    /// Number of polls made.
    #[must_use]
    pub const fn polls(&self) -> u32 {
        match self {
            Self::Confirmed { polls } | Self::Failed { polls } | Self::TimedOut { polls } => *polls,
        }
    }
}

/// Polls `status` until it is final or the policy's budget is spent.
///
/// `status` should map its own errors to [`TxStatus::Pending`].
pub async fn await_confirmation<F, Fut>(
    policy: &ConfirmationPolicy,
    mut status: F,
) -> ConfirmationOutcome
where
    F: FnMut() -> Fut,
    Fut: Future<Output = TxStatus>,
{
    let deadline = Instant::now() + policy.total_timeout();
    let mut polls = 0u32;

    loop {
        polls = polls.saturating_add(1);
        match timeout_at(deadline, status()).await {
            Ok(TxStatus::Confirmed) => return ConfirmationOutcome::Confirmed { polls },
            Ok(TxStatus::Failed) => return ConfirmationOutcome::Failed { polls },
            Ok(TxStatus::Pending) => {}
            Err(_) => return ConfirmationOutcome::TimedOut { polls },
        }

        let now = Instant::now();
        if now >= deadline {
            return ConfirmationOutcome::TimedOut { polls };
        }
        let delay = policy
            .calculate_delay_with_jitter(polls - 1)
            .min(deadline - now);
        tracing::trace!(polls, delay_ms = delay.as_millis() as u64, "transaction pending");
        sleep(delay).await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn delay_grows_and_caps() {
        let policy = ConfirmationPolicy::default();
        assert_eq!(policy.calculate_delay(0), Duration::from_millis(500));
        assert_eq!(policy.calculate_delay(1), Duration::from_millis(1000));
        assert_eq!(policy.calculate_delay(3), Duration::from_millis(4000));
        assert_eq!(policy.calculate_delay(10), Duration::from_millis(5000));
    }

    #[test]
    fn jitter_never_exceeds_base() {
        let policy = ConfirmationPolicy {
            jitter_factor: 0.5,
            ..ConfirmationPolicy::default()
        };
        for attempt in 0..5 {
            assert!(
                policy.calculate_delay_with_jitter(attempt) <= policy.calculate_delay(attempt)
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn confirms_after_pending_polls() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let outcome = await_confirmation(&ConfirmationPolicy::default(), move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 3 { TxStatus::Pending } else { TxStatus::Confirmed }
            }
        })
        .await;

        assert_eq!(outcome, ConfirmationOutcome::Confirmed { polls: 4 });
    }

    #[tokio::test(start_paused = true)]
    async fn failed_status_is_final() {
        let outcome =
            await_confirmation(&ConfirmationPolicy::default(), || async { TxStatus::Failed }).await;
        assert_eq!(outcome, ConfirmationOutcome::Failed { polls: 1 });
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_when_always_pending() {
        let policy = ConfirmationPolicy::with_total_timeout(30_000);
        let start = Instant::now();
        let outcome = await_confirmation(&policy, || async { TxStatus::Pending }).await;

        assert!(matches!(outcome, ConfirmationOutcome::TimedOut { .. }));
        assert!(outcome.polls() > 1);
        assert!(start.elapsed() >= Duration::from_secs(30));
        assert!(start.elapsed() < Duration::from_secs(31));
    }

    #[tokio::test(start_paused = true)]
    async fn hung_poll_is_bounded_by_budget() {
        let policy = ConfirmationPolicy::with_total_timeout(5_000);
        let outcome = await_confirmation(&policy, || async {
            sleep(Duration::from_secs(3600)).await;
            TxStatus::Confirmed
        })
        .await;
        assert_eq!(outcome, ConfirmationOutcome::TimedOut { polls: 1 });
    }
}
