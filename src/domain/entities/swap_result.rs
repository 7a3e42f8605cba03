//! # Swap Result
//!
//! Terminal record of a swap attempt, returned to the caller.

use super::balance::BalanceReading;
use super::venue::VenueFailure;
use crate::domain::value_objects::{Amount, AssetId, SwapId, SwapState, Timestamp, TxId, VenueId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Final outcome of a swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SwapOutcome {
    /// Confirmed on chain.
    Success,
    /// The swap did not happen.
    Failed,
    /// Broadcast but unconfirmed within the timeout.
    PartialUnknown,
}

impl SwapOutcome {
    /// Maps a terminal swap state to an outcome.
    #[must_use]
    pub const fn from_state(state: SwapState) -> Option<Self> {
        match state {
            SwapState::Succeeded => Some(Self::Success),
            SwapState::Failed => Some(Self::Failed),
            SwapState::PartialUnknown => Some(Self::PartialUnknown),
            _ => None,
        }
    }
}

impl fmt::Display for SwapOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
            Self::PartialUnknown => "PARTIAL_UNKNOWN",
        };
        f.write_str(s)
    }
}

/// Classification of a swap or staking failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
    /// Malformed request; no venue was contacted.
    InvalidRequest,
    /// Every venue failed or was skipped.
    NoRouteAvailable,
    /// Quote expired and the single re-quote also failed.
    QuoteExpired,
    /// User rejected or cancelled before broadcast.
    UserCancelled,
    /// Network refused the transaction.
    NetworkRejected,
    /// Transport could not reach the network.
    TransportFailure,
    /// Signer failed for a reason other than user rejection.
    SigningFailed,
    /// Chosen venue failed while building.
    VenueUnavailable,
    /// Transaction was included but failed.
    TransactionFailed,
    /// Broadcast but unconfirmed within the timeout.
    ConfirmationTimeout,
    /// Every balance read path failed.
    ReadFailure,
    /// Balance too low for the requested operation.
    InsufficientBalance,
    /// Unstake exceeds staked principal.
    InsufficientStake,
    /// Unexpected internal error.
    Internal,
}

/// Structured failure attached to a [`SwapResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureDetail {
    /// Failure class.
    pub kind: FailureKind,
    /// Human-readable message.
    pub message: String,
    /// Per-venue failures, populated for `NoRouteAvailable`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub venue_failures: Vec<VenueFailure>,
    /// Manual fallback venues suggested to the user.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub manual_venues: Vec<String>,
}

/// Terminal record of one swap request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapResult {
    /// Request identifier.
    pub swap_id: SwapId,
    /// Outcome.
    pub outcome: SwapOutcome,
    /// Venue whose quote was executed, if one was chosen.
    pub venue_id: Option<VenueId>,
    /// Input asset.
    pub input_asset: AssetId,
    /// Output asset.
    pub output_asset: AssetId,
    /// Quoted output estimate.
    pub quoted_output: Option<Amount>,
    /// Minimum output after slippage.
    pub min_output: Option<Amount>,
    /// Output credited, known only on success.
    pub output_amount: Option<Amount>,
    /// Transaction id once broadcast.
    pub tx_id: Option<TxId>,
    /// Failure detail for non-success outcomes.
    pub failure: Option<FailureDetail>,
    /// Every state entered, in order, starting with `Quoting`.
    pub transitions: Vec<SwapState>,
    /// Number of quote rounds (1, or 2 after a re-quote).
    pub quote_attempts: u32,
    /// Post-trade balances for the input and output asset.
    pub balances: Vec<BalanceReading>,
    /// When the swap reached its terminal state.
    pub completed_at: Timestamp,
}

impl SwapResult {
    /// Returns true for a confirmed swap.
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcome == SwapOutcome::Success
    }

    /// Returns the final state.
    #[must_use]
    pub fn final_state(&self) -> Option<SwapState> {
        self.transitions.last().copied()
    }

    /// Returns the failure kind, if any.
    #[must_use]
    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.failure.as_ref().map(|f| f.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_from_terminal_states_only() {
        assert_eq!(
            SwapOutcome::from_state(SwapState::Succeeded),
            Some(SwapOutcome::Success)
        );
        assert_eq!(
            SwapOutcome::from_state(SwapState::PartialUnknown),
            Some(SwapOutcome::PartialUnknown)
        );
        assert_eq!(SwapOutcome::from_state(SwapState::Confirming), None);
    }

    #[test]
    fn failure_kind_serializes_screaming_snake() {
        let json = serde_json::to_string(&FailureKind::NoRouteAvailable).unwrap_or_default();
        assert_eq!(json, "\"NO_ROUTE_AVAILABLE\"");
    }
}
