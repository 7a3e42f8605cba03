//! # Reward Rate
//!
//! Annual percentage yield used by the staking ledger.
//!
//! The rate is a plain fraction: `0.07` means 7% per year. Accrual is
//! simple (non-compounding) over a 365-day year.

use super::amount::Amount;
use crate::domain::errors::{DomainError, DomainResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Seconds in a 365-day year.
pub const SECONDS_PER_YEAR: u64 = 31_536_000;

/// Non-negative annual yield as a fraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Apy(Decimal);

impl Apy {
    /// Creates a validated yield.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidRate` if negative.
    pub fn new(rate: Decimal) -> DomainResult<Self> {
        if rate.is_sign_negative() && !rate.is_zero() {
            return Err(DomainError::InvalidRate(format!(
                "apy cannot be negative: {rate}"
            )));
        }
        Ok(Self(rate.abs()))
    }

    /// Returns the yield fraction.
    #[inline]
    #[must_use]
    pub const fn get(self) -> Decimal {
        self.0
    }

    /// Reward earned by `principal` over `elapsed_millis`.
    ///
    /// Computes `principal * apy * elapsed / SECONDS_PER_YEAR`, multiplying
    /// before dividing so that the result is monotone in elapsed time.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Overflow` if the intermediate product overflows.
    pub fn accrue(self, principal: Amount, elapsed_millis: i64) -> DomainResult<Amount> {
        if elapsed_millis <= 0 || principal.is_zero() || self.0.is_zero() {
            return Ok(Amount::ZERO);
        }

        let numerator = principal
            .get()
            .checked_mul(self.0)
            .and_then(|v| v.checked_mul(Decimal::from(elapsed_millis)))
            .ok_or(DomainError::Overflow)?;
        let denominator = Decimal::from(SECONDS_PER_YEAR) * Decimal::from(1_000u32);

        let reward = numerator
            .checked_div(denominator)
            .ok_or(DomainError::DivisionByZero)?;
        Amount::new(reward)
    }
}

impl fmt::Display for Apy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0 * Decimal::ONE_HUNDRED)
    }
}

impl TryFrom<Decimal> for Apy {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Apy> for Decimal {
    fn from(value: Apy) -> Self {
        value.0
    }
}
