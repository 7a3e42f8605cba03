//! # Transactions
//!
//! Opaque transaction payloads passed between venues, the signer and the
//! transport, plus the on-chain status reported back.

use crate::domain::value_objects::{Timestamp, VenueId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A transaction ready for signing.
///
/// The payload is whatever the builder produced (usually base64); the
/// engine never inspects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedTransaction {
    payload: String,
    built_by: Option<VenueId>,
    last_valid_at: Option<Timestamp>,
}

impl UnsignedTransaction {
    /// Wraps a builder payload.
    #[must_use]
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            built_by: None,
            last_valid_at: None,
        }
    }

    /// Records which venue built the transaction.
    #[must_use]
    pub fn with_builder(mut self, venue_id: VenueId) -> Self {
        self.built_by = Some(venue_id);
        self
    }

    /// Records the last moment the network will accept the transaction.
    #[must_use]
    pub fn with_last_valid_at(mut self, at: Timestamp) -> Self {
        self.last_valid_at = Some(at);
        self
    }

    /// Returns the opaque payload.
    #[inline]
    #[must_use]
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Returns the building venue, if any.
    #[inline]
    #[must_use]
    pub fn built_by(&self) -> Option<&VenueId> {
        self.built_by.as_ref()
    }

    /// Returns the validity deadline, if known.
    #[inline]
    #[must_use]
    pub fn last_valid_at(&self) -> Option<Timestamp> {
        self.last_valid_at
    }
}

/// A signed transaction ready for broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    payload: String,
}

impl SignedTransaction {
    /// Wraps a signer payload.
    #[must_use]
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    /// Returns the opaque payload.
    #[inline]
    #[must_use]
    pub fn payload(&self) -> &str {
        &self.payload
    }
}

/// On-chain status of a broadcast transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxStatus {
    /// Not yet final.
    Pending,
    /// Included and successful.
    Confirmed,
    /// Included and reverted, or dropped.
    Failed,
}

impl TxStatus {
    /// Returns true for `Confirmed` and `Failed`.
    #[inline]
    #[must_use]
    pub const fn is_final(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Failed => "FAILED",
        };
        f.write_str(s)
    }
}
