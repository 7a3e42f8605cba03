//! # Amount Value Object
//!
//! Non-negative decimal token amount with checked arithmetic.
//!
//! Amounts are expressed in display units (e.g. `1.5` of an asset with
//! 9 decimals). Conversion to and from integer base units lives on
//! [`Asset`](super::asset::Asset).
//!
//! # Examples
//!
//! ```
//! use rust_decimal::Decimal;
//! use swap_engine::domain::value_objects::amount::Amount;
//!
//! let a = Amount::new(Decimal::new(15, 1)).unwrap();
//! let b = Amount::new(Decimal::new(5, 1)).unwrap();
//!
//! assert_eq!(a.checked_add(b).unwrap().to_string(), "2.0");
//! assert!(b.checked_sub(a).is_err());
//! ```

use crate::domain::errors::{DomainError, DomainResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A validated, non-negative token amount.
///
/// # Invariants
///
/// - Amount is always >= 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    /// Zero amount constant.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Creates an amount from a decimal value.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidAmount` if the value is negative.
    #[must_use = "this returns a Result that should be handled"]
    pub fn new(value: Decimal) -> DomainResult<Self> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(DomainError::InvalidAmount(format!(
                "amount cannot be negative: {value}"
            )));
        }
        Ok(Self(value.abs()))
    }

    /// Returns the inner Decimal value.
    #[inline]
    #[must_use]
    pub const fn get(self) -> Decimal {
        self.0
    }

    /// Returns true if the amount is zero.
    #[inline]
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount is strictly positive.
    #[inline]
    #[must_use]
    pub fn is_positive(self) -> bool {
        !self.0.is_zero()
    }

    /// Adds another amount.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Overflow` if the result does not fit a decimal.
    pub fn checked_add(self, rhs: Self) -> DomainResult<Self> {
        self.0
            .checked_add(rhs.0)
            .map(Self)
            .ok_or(DomainError::Overflow)
    }

    /// Subtracts another amount.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Underflow` if the result would be negative.
    pub fn checked_sub(self, rhs: Self) -> DomainResult<Self> {
        if rhs.0 > self.0 {
            return Err(DomainError::Underflow);
        }
        self.0
            .checked_sub(rhs.0)
            .map(Self)
            .ok_or(DomainError::Underflow)
    }

    /// Multiplies by a non-negative factor.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Overflow` on overflow and
    /// `DomainError::InvalidAmount` if the factor is negative.
    pub fn checked_mul(self, factor: Decimal) -> DomainResult<Self> {
        let product = self.0.checked_mul(factor).ok_or(DomainError::Overflow)?;
        Self::new(product)
    }

    /// Returns the smaller of two amounts.
    #[inline]
    #[must_use]
    pub fn min(self, other: Self) -> Self {
        if self <= other { self } else { other }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    #[inline]
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl FromStr for Amount {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s.trim())
            .map_err(|e| DomainError::InvalidAmount(format!("'{s}': {e}")))?;
        Self::new(value)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn rejects_negative() {
        assert!(Amount::new(Decimal::new(-1, 0)).is_err());
        assert!(Amount::new(Decimal::ZERO).unwrap().is_zero());
    }

    #[test]
    fn parses_from_str() {
        let amount: Amount = "34.2".parse().unwrap();
        assert_eq!(amount.get(), Decimal::new(342, 1));
        assert!("abc".parse::<Amount>().is_err());
        assert!("-3".parse::<Amount>().is_err());
    }

    #[test]
    fn checked_sub_underflows() {
        let small: Amount = "1".parse().unwrap();
        let large: Amount = "2".parse().unwrap();
        assert_eq!(small.checked_sub(large), Err(DomainError::Underflow));
        assert_eq!(large.checked_sub(small).unwrap(), small);
    }

    #[test]
    fn checked_mul_rejects_negative_factor() {
        let amount: Amount = "10".parse().unwrap();
        assert!(amount.checked_mul(Decimal::new(-1, 0)).is_err());
        assert_eq!(
            amount.checked_mul(Decimal::new(5, 1)).unwrap().get(),
            Decimal::new(50, 1)
        );
    }

    #[test]
    fn serde_uses_decimal_representation() {
        let amount: Amount = "1.25".parse().unwrap();
        let json = serde_json::to_string(&amount).unwrap();
        let back: Amount = serde_json::from_str(&json).unwrap();
        assert_eq!(back, amount);
    }

    #[test]
    fn min_picks_smaller() {
        let a: Amount = "1".parse().unwrap();
        let b: Amount = "2".parse().unwrap();
        assert_eq!(a.min(b), a);
        assert_eq!(b.min(a), a);
    }
}
