//! # Swap State
//!
//! Swap lifecycle state machine.
//!
//! # State Machine
//!
//! ```text
//! Quoting → Building → AwaitingSignature → Broadcasting → Confirming → Succeeded
//!    ↑          │             │                  │             ├──────→ PartialUnknown
//!    └──────────┘ (re-quote)  │                  │             │
//!    ↓          ↓             ↓                  ↓             ↓
//!    └──────────┴─────────────┴──────────────────┴─────────────┴──────→ Failed
//! ```
//!
//! # Examples
//!
//! ```
//! use swap_engine::domain::value_objects::swap_state::SwapState;
//!
//! assert!(SwapState::Building.can_transition_to(SwapState::Quoting));
//! assert!(!SwapState::Quoting.can_transition_to(SwapState::Broadcasting));
//! assert!(SwapState::PartialUnknown.is_terminal());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Swap lifecycle state.
///
/// # Terminal States
///
/// - [`Succeeded`](SwapState::Succeeded) - transaction confirmed
/// - [`Failed`](SwapState::Failed) - the swap did not happen
/// - [`PartialUnknown`](SwapState::PartialUnknown) - broadcast but not
///   confirmed within the timeout; funds may or may not have moved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum SwapState {
    /// Collecting a quote from venues.
    #[default]
    Quoting = 0,

    /// Asking the chosen venue for an unsigned transaction.
    Building = 1,

    /// Waiting for the signer.
    AwaitingSignature = 2,

    /// Submitting the signed transaction.
    Broadcasting = 3,

    /// Polling for on-chain confirmation.
    Confirming = 4,

    /// Confirmed on chain (terminal).
    Succeeded = 5,

    /// Did not happen (terminal).
    Failed = 6,

    /// Outcome unknown after broadcast (terminal).
    PartialUnknown = 7,
}

impl SwapState {
    /// Returns true if this is a terminal state.
    #[inline]
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::PartialUnknown)
    }

    /// Returns true if this state can transition to the target state.
    ///
    /// - Quoting → Building, Failed
    /// - Building → AwaitingSignature, Quoting, Failed
    /// - AwaitingSignature → Broadcasting, Failed
    /// - Broadcasting → Confirming, Failed
    /// - Confirming → Succeeded, Failed, PartialUnknown
    #[must_use]
    pub const fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Quoting, Self::Building)
                | (Self::Quoting, Self::Failed)
                | (Self::Building, Self::AwaitingSignature)
                | (Self::Building, Self::Quoting)
                | (Self::Building, Self::Failed)
                | (Self::AwaitingSignature, Self::Broadcasting)
                | (Self::AwaitingSignature, Self::Failed)
                | (Self::Broadcasting, Self::Confirming)
                | (Self::Broadcasting, Self::Failed)
                | (Self::Confirming, Self::Succeeded)
                | (Self::Confirming, Self::Failed)
                | (Self::Confirming, Self::PartialUnknown)
        )
    }

    /// Returns the valid next states from this state.
    #[must_use]
    pub fn valid_transitions(&self) -> Vec<Self> {
        match self {
            Self::Quoting => vec![Self::Building, Self::Failed],
            Self::Building => vec![Self::AwaitingSignature, Self::Quoting, Self::Failed],
            Self::AwaitingSignature => vec![Self::Broadcasting, Self::Failed],
            Self::Broadcasting => vec![Self::Confirming, Self::Failed],
            Self::Confirming => vec![Self::Succeeded, Self::Failed, Self::PartialUnknown],
            Self::Succeeded | Self::Failed | Self::PartialUnknown => vec![],
        }
    }

    /// Returns true if a user cancellation is honored in this state.
    ///
    /// Once broadcast has started the transaction cannot be recalled.
    #[inline]
    #[must_use]
    pub const fn accepts_cancellation(&self) -> bool {
        matches!(self, Self::AwaitingSignature)
    }

    /// Returns true if the transaction may have reached the network.
    #[inline]
    #[must_use]
    pub const fn is_post_broadcast(&self) -> bool {
        matches!(
            self,
            Self::Confirming | Self::Succeeded | Self::PartialUnknown
        )
    }

    /// Returns the numeric value of this state.
    #[inline]
    #[must_use]
    pub const fn as_u8(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for SwapState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Quoting => "QUOTING",
            Self::Building => "BUILDING",
            Self::AwaitingSignature => "AWAITING_SIGNATURE",
            Self::Broadcasting => "BROADCASTING",
            Self::Confirming => "CONFIRMING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
            Self::PartialUnknown => "PARTIAL_UNKNOWN",
        };
        f.write_str(s)
    }
}
