//! # Slippage Tolerance
//!
//! Maximum acceptable slippage expressed in basis points.
//!
//! # Examples
//!
//! ```
//! use swap_engine::domain::value_objects::slippage::SlippageBps;
//! use swap_engine::domain::value_objects::amount::Amount;
//! use rust_decimal::Decimal;
//!
//! let slippage = SlippageBps::new(50).unwrap();
//! let estimate: Amount = "100".parse().unwrap();
//! assert_eq!(slippage.min_output(estimate).unwrap().get(), Decimal::new(995, 1));
//! ```

use super::amount::Amount;
use crate::domain::errors::{DomainError, DomainResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Basis points in 100%.
pub const BPS_DENOMINATOR: u16 = 10_000;

/// Slippage tolerance in basis points (0 to 10 000).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct SlippageBps(u16);

impl SlippageBps {
    /// 0.5%, a common wallet default.
    pub const DEFAULT: Self = Self(50);

    /// Creates a validated slippage tolerance.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidSlippage` above 10 000 bps.
    pub fn new(bps: u16) -> DomainResult<Self> {
        if bps > BPS_DENOMINATOR {
            return Err(DomainError::InvalidSlippage(format!(
                "{bps} bps exceeds {BPS_DENOMINATOR}"
            )));
        }
        Ok(Self(bps))
    }

    /// Returns the raw basis points.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u16 {
        self.0
    }

    /// Returns the tolerance as a fraction (50 bps = 0.005).
    #[must_use]
    pub fn as_fraction(self) -> Decimal {
        Decimal::from(self.0) / Decimal::from(BPS_DENOMINATOR)
    }

    /// Returns the tolerance as a percentage (50 bps = 0.5).
    #[must_use]
    pub fn as_percent(self) -> Decimal {
        Decimal::from(self.0) / Decimal::from(100u16)
    }

    /// Minimum acceptable output for an estimated output amount.
    ///
    /// # Errors
    ///
    /// Propagates arithmetic overflow.
    pub fn min_output(self, estimated: Amount) -> DomainResult<Amount> {
        estimated.checked_mul(Decimal::ONE - self.as_fraction())
    }
}

impl Default for SlippageBps {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for SlippageBps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}bps", self.0)
    }
}

impl TryFrom<u16> for SlippageBps {
    type Error = DomainError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SlippageBps> for u16 {
    fn from(value: SlippageBps) -> Self {
        value.0
    }
}
