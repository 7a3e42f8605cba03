//! # Venue Errors
//!
//! Errors raised by venue adapters and the shared HTTP client.
//!
//! The quote aggregator only needs two classes: [`VenueError::is_no_liquidity`]
//! failures mark a venue `Degraded`, every other failure marks it `Dead`.

use crate::domain::value_objects::VenueId;
use thiserror::Error;

/// Venue adapter error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VenueError {
    /// Could not connect.
    #[error("connection error: {message}")]
    Connection {
        /// Detail.
        message: String,
    },

    /// Request timed out.
    #[error("timeout: {message}")]
    Timeout {
        /// Detail.
        message: String,
        /// Timeout that elapsed, if known.
        duration_ms: Option<u64>,
    },

    /// Venue answered with something we could not interpret.
    #[error("protocol error: {message}")]
    ProtocolError {
        /// Detail.
        message: String,
    },

    /// Venue answered with a non-success HTTP status.
    #[error("rejected with status {status}: {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Response body or reason.
        message: String,
    },

    /// Reachable but no route or insufficient depth.
    #[error("no liquidity: {message}")]
    NoLiquidity {
        /// Detail.
        message: String,
    },

    /// Quote is no longer valid.
    #[error("quote expired: {message}")]
    QuoteExpired {
        /// Detail.
        message: String,
    },

    /// Request cannot be served by this venue.
    #[error("invalid request: {message}")]
    InvalidRequest {
        /// Detail.
        message: String,
    },

    /// Venue disabled or otherwise unavailable.
    #[error("venue {venue_id} unavailable: {message}")]
    VenueUnavailable {
        /// Venue.
        venue_id: VenueId,
        /// Detail.
        message: String,
    },

    /// Internal adapter error.
    #[error("internal error: {message}")]
    InternalError {
        /// Detail.
        message: String,
    },
}

impl VenueError {
    /// Creates a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a timeout error.
    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
            duration_ms: None,
        }
    }

    /// Creates a timeout error with the elapsed budget.
    #[must_use]
    pub fn timeout_with_duration(message: impl Into<String>, duration_ms: u64) -> Self {
        Self::Timeout {
            message: message.into(),
            duration_ms: Some(duration_ms),
        }
    }

    /// Creates a protocol error.
    #[must_use]
    pub fn protocol_error(message: impl Into<String>) -> Self {
        Self::ProtocolError {
            message: message.into(),
        }
    }

    /// Creates a non-success status error.
    #[must_use]
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }

    /// Creates a no-liquidity error.
    #[must_use]
    pub fn no_liquidity(message: impl Into<String>) -> Self {
        Self::NoLiquidity {
            message: message.into(),
        }
    }

    /// Creates a quote expired error.
    #[must_use]
    pub fn quote_expired(message: impl Into<String>) -> Self {
        Self::QuoteExpired {
            message: message.into(),
        }
    }

    /// Creates an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Creates a venue unavailable error.
    #[must_use]
    pub fn venue_unavailable(venue_id: VenueId, message: impl Into<String>) -> Self {
        Self::VenueUnavailable {
            venue_id,
            message: message.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }

    /// Returns true if the venue was reachable but could not fill.
    #[inline]
    #[must_use]
    pub const fn is_no_liquidity(&self) -> bool {
        matches!(self, Self::NoLiquidity { .. })
    }

    /// Returns true if the quote is stale.
    #[inline]
    #[must_use]
    pub const fn is_quote_expired(&self) -> bool {
        matches!(self, Self::QuoteExpired { .. })
    }

    /// Returns true for timeouts.
    #[inline]
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns true for transient transport problems worth polling again.
    #[inline]
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::Timeout { .. })
    }
}

/// Result type for venue operations.
pub type VenueResult<T> = Result<T, VenueError>;
