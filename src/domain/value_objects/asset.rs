//! # Asset Value Object
//!
//! Asset descriptors loaded from static configuration, plus conversion
//! between display amounts and integer base units.
//!
//! # Examples
//!
//! ```
//! use swap_engine::domain::value_objects::asset::Asset;
//! use swap_engine::domain::value_objects::amount::Amount;
//!
//! let usdc = Asset::new("usdc-mint", "USDC", 6).unwrap();
//! let amount: Amount = "1.5".parse().unwrap();
//!
//! assert_eq!(usdc.to_base_units(amount).unwrap(), 1_500_000);
//! assert_eq!(usdc.from_base_units(1_500_000).unwrap(), amount);
//! ```

use super::amount::Amount;
use super::ids::AssetId;
use crate::domain::errors::{DomainError, DomainResult};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Largest supported decimal precision.
///
/// `10^18` is the largest power of ten that fits the scaling arithmetic.
pub const MAX_DECIMALS: u8 = 18;

/// A tradable asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Asset {
    id: AssetId,
    symbol: String,
    decimals: u8,
}

impl Asset {
    /// Creates a new asset descriptor.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidAsset` if the id or symbol is empty or
    /// the precision exceeds [`MAX_DECIMALS`].
    pub fn new(
        id: impl Into<AssetId>,
        symbol: impl Into<String>,
        decimals: u8,
    ) -> DomainResult<Self> {
        let id = id.into();
        let symbol = symbol.into();

        if id.as_str().trim().is_empty() {
            return Err(DomainError::InvalidAsset(
                "asset id cannot be empty".to_string(),
            ));
        }
        if symbol.trim().is_empty() {
            return Err(DomainError::InvalidAsset(format!(
                "asset {id} has an empty symbol"
            )));
        }
        if decimals > MAX_DECIMALS {
            return Err(DomainError::InvalidAsset(format!(
                "asset {symbol} has {decimals} decimals, maximum is {MAX_DECIMALS}"
            )));
        }

        Ok(Self {
            id,
            symbol,
            decimals,
        })
    }

    /// Returns the asset identifier.
    #[inline]
    #[must_use]
    pub fn id(&self) -> &AssetId {
        &self.id
    }

    /// Returns the ticker symbol.
    #[inline]
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Returns the decimal precision.
    #[inline]
    #[must_use]
    pub const fn decimals(&self) -> u8 {
        self.decimals
    }

    fn scale_factor(&self) -> Decimal {
        Decimal::from(10u64.pow(u32::from(self.decimals)))
    }

    /// Converts a display amount into integer base units.
    ///
    /// Digits beyond the asset's precision are truncated.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Overflow` if the scaled value does not fit.
    pub fn to_base_units(&self, amount: Amount) -> DomainResult<u128> {
        amount
            .get()
            .checked_mul(self.scale_factor())
            .ok_or(DomainError::Overflow)?
            .trunc()
            .to_u128()
            .ok_or(DomainError::Overflow)
    }

    /// Converts integer base units into a display amount.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Overflow` if the value exceeds decimal range.
    pub fn from_base_units(&self, units: u128) -> DomainResult<Amount> {
        let units = i128::try_from(units).map_err(|_| DomainError::Overflow)?;
        let value = Decimal::try_from_i128_with_scale(units, u32::from(self.decimals))
            .map_err(|_| DomainError::Overflow)?;
        Amount::new(value.normalize())
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.symbol)
    }
}

/// Lookup table of configured assets keyed by id.
#[derive(Debug, Clone, Default)]
pub struct AssetCatalog {
    assets: HashMap<AssetId, Asset>,
}

impl AssetCatalog {
    /// Creates a catalog from a list of assets. Later duplicates win.
    #[must_use]
    pub fn new(assets: impl IntoIterator<Item = Asset>) -> Self {
        Self {
            assets: assets.into_iter().map(|a| (a.id.clone(), a)).collect(),
        }
    }

    /// Looks up an asset by id.
    #[must_use]
    pub fn get(&self, id: &AssetId) -> Option<&Asset> {
        self.assets.get(id)
    }

    /// Looks up an asset by ticker symbol (case-insensitive).
    #[must_use]
    pub fn by_symbol(&self, symbol: &str) -> Option<&Asset> {
        self.assets
            .values()
            .find(|a| a.symbol.eq_ignore_ascii_case(symbol))
    }

    /// Number of configured assets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Returns true if no assets are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}
