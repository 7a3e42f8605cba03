//! # Domain Errors
//!
//! Errors raised by value objects and entities: rejected amounts and assets,
//! illegal swap state transitions, over-committed stake positions and
//! decimal overflow. Each variant carries a stable numeric code.
//!
//! # Error Code Ranges
//!
//! - **1000-1999**: Validation errors
//! - **2000-2999**: State errors
//! - **3000-3999**: Ledger errors
//! - **4000-4999**: Arithmetic errors
//!
//! # Examples
//!
//! ```
//! use swap_engine::domain::errors::DomainError;
//!
//! let error = DomainError::InvalidAmount("amount must be positive".to_string());
//! assert_eq!(error.code(), 1001);
//! ```

use crate::domain::value_objects::swap_state::SwapState;
use thiserror::Error;

/// Domain-level error with numeric error codes.
///
/// # Error Code Ranges
///
/// | Range | Category |
/// |-------|----------|
/// | 1000-1999 | Validation errors |
/// | 2000-2999 | State errors |
/// | 3000-3999 | Ledger errors |
/// | 4000-4999 | Arithmetic errors |
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    // ========================================================================
    // Validation Errors (1000-1999)
    // ========================================================================
    /// Invalid amount value.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Invalid asset definition.
    #[error("invalid asset: {0}")]
    InvalidAsset(String),

    /// Slippage tolerance out of range.
    #[error("invalid slippage: {0}")]
    InvalidSlippage(String),

    /// Invalid rate value.
    #[error("invalid rate: {0}")]
    InvalidRate(String),

    /// Invalid quote contents.
    #[error("invalid quote: {0}")]
    InvalidQuote(String),

    /// Generic validation error.
    #[error("validation error: {0}")]
    ValidationError(String),

    // ========================================================================
    // State Errors (2000-2999)
    // ========================================================================
    /// Invalid state transition attempted.
    #[error("invalid state transition from {from} to {to}")]
    InvalidStateTransition {
        /// The current state.
        from: SwapState,
        /// The attempted target state.
        to: SwapState,
    },

    // ========================================================================
    // Ledger Errors (3000-3999)
    // ========================================================================
    /// Unstake request exceeds the staked principal.
    #[error("insufficient stake: requested {requested}, staked {staked}")]
    InsufficientStake {
        /// Requested amount.
        requested: String,
        /// Currently staked principal.
        staked: String,
    },

    // ========================================================================
    // Arithmetic Errors (4000-4999)
    // ========================================================================
    /// Arithmetic overflow.
    #[error("arithmetic overflow")]
    Overflow,

    /// Arithmetic underflow.
    #[error("arithmetic underflow")]
    Underflow,

    /// Division by zero.
    #[error("division by zero")]
    DivisionByZero,
}

impl DomainError {
    /// Returns the numeric error code.
    ///
    /// # Examples
    ///
    /// ```
    /// use swap_engine::domain::errors::DomainError;
    ///
    /// assert_eq!(DomainError::InvalidAmount("test".to_string()).code(), 1001);
    /// assert_eq!(DomainError::Overflow.code(), 4001);
    /// ```
    #[must_use]
    pub const fn code(&self) -> u16 {
        match self {
            Self::InvalidAmount(_) => 1001,
            Self::InvalidAsset(_) => 1002,
            Self::InvalidSlippage(_) => 1003,
            Self::InvalidRate(_) => 1004,
            Self::InvalidQuote(_) => 1005,
            Self::ValidationError(_) => 1099,

            Self::InvalidStateTransition { .. } => 2001,

            Self::InsufficientStake { .. } => 3001,

            Self::Overflow => 4001,
            Self::Underflow => 4002,
            Self::DivisionByZero => 4003,
        }
    }

    /// Returns the error category name.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self.code() {
            1000..=1999 => "validation",
            2000..=2999 => "state",
            3000..=3999 => "ledger",
            4000..=4999 => "arithmetic",
            _ => "unknown",
        }
    }

    /// Returns true if this is a validation error.
    #[inline]
    #[must_use]
    pub const fn is_validation_error(&self) -> bool {
        matches!(self.code(), 1000..=1999)
    }

    /// Returns true if this is an arithmetic error.
    #[inline]
    #[must_use]
    pub const fn is_arithmetic_error(&self) -> bool {
        matches!(self.code(), 4000..=4999)
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
