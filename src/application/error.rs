//! # Application Errors
//!
//! The typed failure taxonomy shared by the swap orchestrator, the staking
//! ledger and balance reconciliation.
//!
//! Every failure that reaches a caller is one of these variants; callers map
//! them to user-facing messages with [`ApplicationError::user_message`] and to
//! structured records with [`FailureDetail::from`].

use crate::domain::entities::{FailureDetail, FailureKind, VenueFailure};
use crate::domain::errors::DomainError;
use crate::domain::value_objects::{AssetId, TxId, VenueId, WalletAddress};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// One read path's failure while reading a balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadPathFailure {
    /// Read path name.
    pub path: String,
    /// Failure detail.
    pub reason: String,
}

impl fmt::Display for ReadPathFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.reason)
    }
}

fn join<T: fmt::Display>(items: &[T]) -> String {
    if items.is_empty() {
        return "none".to_string();
    }
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Application layer error.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Malformed request, rejected before any venue or read path was contacted.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// No venue produced a usable quote.
    #[error("no route available: {}", join(.failures))]
    NoRouteAvailable {
        /// Why each venue failed or was skipped.
        failures: Vec<VenueFailure>,
        /// Venues the user can try by hand.
        manual_venues: Vec<String>,
    },

    /// Quote expired, and the single re-quote did not help.
    #[error("quote from {venue_id} expired")]
    QuoteExpired {
        /// Venue whose quote expired.
        venue_id: VenueId,
    },

    /// User rejected signing or cancelled before broadcast.
    #[error("cancelled by user")]
    UserCancelled,

    /// Signer failed for a reason other than user rejection.
    #[error("signing failed: {0}")]
    SigningFailed(String),

    /// Network refused the transaction; the message is verbatim.
    #[error("network rejected transaction: {0}")]
    NetworkRejected(String),

    /// Transport could not reach the network; the message is verbatim.
    #[error("transport failure: {0}")]
    TransportFailure(String),

    /// Chosen venue failed while building the transaction.
    #[error("venue {venue_id} unavailable: {reason}")]
    VenueUnavailable {
        /// Venue that failed.
        venue_id: VenueId,
        /// Failure detail.
        reason: String,
    },

    /// Transaction was included but failed on chain.
    #[error("transaction {tx_id} failed on chain")]
    TransactionFailed {
        /// Failed transaction.
        tx_id: TxId,
    },

    /// Broadcast transaction was not confirmed in time.
    #[error("transaction {tx_id} not confirmed within timeout")]
    ConfirmationTimeout {
        /// Unconfirmed transaction.
        tx_id: TxId,
    },

    /// Every balance read path failed.
    #[error("balance of {asset} for {owner} unavailable: {}", join(.failures))]
    ReadFailure {
        /// Owner that was read.
        owner: WalletAddress,
        /// Asset that was read.
        asset: AssetId,
        /// Per-path failures.
        failures: Vec<ReadPathFailure>,
    },

    /// Available balance is below the requested amount.
    #[error("insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance {
        /// Requested amount.
        requested: String,
        /// Available amount.
        available: String,
    },

    /// Unstake exceeds the staked principal.
    #[error("insufficient stake: requested {requested}, staked {staked}")]
    InsufficientStake {
        /// Requested amount.
        requested: String,
        /// Currently staked principal.
        staked: String,
    },

    /// Domain error.
    #[error("domain error: {0}")]
    DomainError(DomainError),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for ApplicationError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InsufficientStake { requested, staked } => {
                Self::InsufficientStake { requested, staked }
            }
            e if e.is_validation_error() => Self::InvalidRequest(e.to_string()),
            e => Self::DomainError(e),
        }
    }
}

impl ApplicationError {
    /// Creates an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Creates a venue unavailable error.
    #[must_use]
    pub fn venue_unavailable(venue_id: VenueId, reason: impl Into<String>) -> Self {
        Self::VenueUnavailable {
            venue_id,
            reason: reason.into(),
        }
    }

    /// Returns the failure class.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::InvalidRequest(_) => FailureKind::InvalidRequest,
            Self::NoRouteAvailable { .. } => FailureKind::NoRouteAvailable,
            Self::QuoteExpired { .. } => FailureKind::QuoteExpired,
            Self::UserCancelled => FailureKind::UserCancelled,
            Self::SigningFailed(_) => FailureKind::SigningFailed,
            Self::NetworkRejected(_) => FailureKind::NetworkRejected,
            Self::TransportFailure(_) => FailureKind::TransportFailure,
            Self::VenueUnavailable { .. } => FailureKind::VenueUnavailable,
            Self::TransactionFailed { .. } => FailureKind::TransactionFailed,
            Self::ConfirmationTimeout { .. } => FailureKind::ConfirmationTimeout,
            Self::ReadFailure { .. } => FailureKind::ReadFailure,
            Self::InsufficientBalance { .. } => FailureKind::InsufficientBalance,
            Self::InsufficientStake { .. } => FailureKind::InsufficientStake,
            Self::DomainError(_) | Self::Internal(_) => FailureKind::Internal,
        }
    }

    /// Returns true if the user chose to stop the operation.
    ///
    /// Cancellation is shown distinctly from technical failures.
    #[inline]
    #[must_use]
    pub const fn is_user_cancellation(&self) -> bool {
        matches!(self, Self::UserCancelled)
    }

    /// Short message suitable for showing to an end user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidRequest(msg) => format!("Check your swap details: {msg}"),
            Self::NoRouteAvailable { manual_venues, .. } if !manual_venues.is_empty() => format!(
                "No venue could quote this swap right now. You can try {} directly.",
                manual_venues.join(", ")
            ),
            Self::NoRouteAvailable { .. } => {
                "No venue could quote this swap right now.".to_string()
            }
            Self::QuoteExpired { .. } => {
                "The price moved before we could build the swap. Please try again.".to_string()
            }
            Self::UserCancelled => "Swap cancelled.".to_string(),
            Self::NetworkRejected(msg) => format!("The network rejected the transaction: {msg}"),
            Self::TransportFailure(msg) => format!("Could not reach the network: {msg}"),
            Self::ConfirmationTimeout { tx_id } => format!(
                "Transaction {tx_id} was sent but not confirmed yet. Check your balances before retrying."
            ),
            Self::InsufficientBalance { .. } | Self::InsufficientStake { .. } => self.to_string(),
            other => format!("Something went wrong: {other}"),
        }
    }
}

impl From<&ApplicationError> for FailureDetail {
    fn from(err: &ApplicationError) -> Self {
        let (venue_failures, manual_venues) = match err {
            ApplicationError::NoRouteAvailable {
                failures,
                manual_venues,
            } => (failures.clone(), manual_venues.clone()),
            _ => (Vec::new(), Vec::new()),
        };
        Self {
            kind: err.kind(),
            message: err.to_string(),
            venue_failures,
            manual_venues,
        }
    }
}

/// Result type for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::VenueFailureKind;
    use crate::domain::value_objects::SwapState;

    #[test]
    fn no_route_lists_every_venue_reason() {
        let err = ApplicationError::NoRouteAvailable {
            failures: vec![
                VenueFailure::new(VenueId::new("a"), VenueFailureKind::NoLiquidity, "no route"),
                VenueFailure::new(VenueId::new("b"), VenueFailureKind::Unavailable, "timeout"),
            ],
            manual_venues: vec!["https://swap.example".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("a: no liquidity (no route)"));
        assert!(msg.contains("b: unavailable (timeout)"));
        assert!(err.user_message().contains("https://swap.example"));

        let detail = FailureDetail::from(&err);
        assert_eq!(detail.kind, FailureKind::NoRouteAvailable);
        assert_eq!(detail.venue_failures.len(), 2);
    }

    #[test]
    fn cancellation_is_distinct() {
        assert!(ApplicationError::UserCancelled.is_user_cancellation());
        assert!(
            !ApplicationError::TransportFailure("x".into()).is_user_cancellation()
        );
        assert_eq!(
            ApplicationError::UserCancelled.user_message(),
            "Swap cancelled."
        );
    }

    #[test]
    fn domain_validation_maps_to_invalid_request() {
        let err: ApplicationError = DomainError::InvalidAmount("negative".to_string()).into();
        assert_eq!(err.kind(), FailureKind::InvalidRequest);

        let err: ApplicationError = DomainError::Overflow.into();
        assert_eq!(err.kind(), FailureKind::Internal);
    }

    #[test]
    fn domain_errors_map_by_category() {
        let invalid = [
            DomainError::InvalidAsset("x".to_string()),
            DomainError::InvalidQuote("x".to_string()),
            DomainError::ValidationError("x".to_string()),
        ];
        for domain in invalid {
            let err: ApplicationError = domain.into();
            assert_eq!(err.kind(), FailureKind::InvalidRequest, "{err}");
        }
        for domain in [DomainError::Underflow, DomainError::DivisionByZero] {
            let err: ApplicationError = domain.into();
            assert_eq!(err.kind(), FailureKind::Internal, "{err}");
        }

        let transition = DomainError::InvalidStateTransition {
            from: SwapState::Succeeded,
            to: SwapState::Quoting,
        };
        let err: ApplicationError = transition.into();
        assert!(matches!(err, ApplicationError::DomainError(_)));
    }

    #[test]
    fn domain_stake_error_maps_to_insufficient_stake() {
        let err: ApplicationError = DomainError::InsufficientStake {
            requested: "2".to_string(),
            staked: "1".to_string(),
        }
        .into();
        assert_eq!(err.kind(), FailureKind::InsufficientStake);
    }

    #[test]
    fn read_failure_message_names_paths() {
        let err = ApplicationError::ReadFailure {
            owner: WalletAddress::new("owner-1"),
            asset: AssetId::new("mint-x"),
            failures: vec![ReadPathFailure {
                path: "rpc".to_string(),
                reason: "connection refused".to_string(),
            }],
        };
        assert!(err.to_string().contains("rpc: connection refused"));
    }
}
