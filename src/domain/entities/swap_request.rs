//! # Swap Request
//!
//! What a user asked to swap.
//!
//! The input amount is kept as a raw decimal so that malformed requests
//! (zero, negative or finer than the asset's precision) can be represented
//! and rejected with a typed error before any venue is contacted.

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::{Amount, Asset, SlippageBps, SwapId, WalletAddress};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A request to exchange one asset for another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapRequest {
    /// Request identifier.
    pub id: SwapId,
    /// Asset to sell.
    pub input_asset: Asset,
    /// Amount of the input asset in display units.
    pub input_amount: Decimal,
    /// Asset to buy.
    pub output_asset: Asset,
    /// Maximum acceptable slippage.
    pub max_slippage: SlippageBps,
    /// Wallet that signs and owns the funds.
    pub requester: WalletAddress,
}

impl SwapRequest {
    /// Creates a request with a fresh identifier.
    #[must_use]
    pub fn new(
        requester: WalletAddress,
        input_asset: Asset,
        input_amount: Decimal,
        output_asset: Asset,
        max_slippage: SlippageBps,
    ) -> Self {
        Self {
            id: SwapId::new_v4(),
            input_asset,
            input_amount,
            output_asset,
            max_slippage,
            requester,
        }
    }

    /// Validates the request and returns the input as an [`Amount`].
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidAmount` for a zero or negative input, or
    /// one finer than the input asset's precision (it would reach a venue
    /// truncated), and `DomainError::ValidationError` when both sides are the
    /// same asset or the requester is blank.
    pub fn validated_input(&self) -> DomainResult<Amount> {
        if self.input_amount <= Decimal::ZERO {
            return Err(DomainError::InvalidAmount(format!(
                "input amount must be positive, got {}",
                self.input_amount
            )));
        }
        if self.input_amount.normalize().scale() > u32::from(self.input_asset.decimals()) {
            return Err(DomainError::InvalidAmount(format!(
                "input amount {} has more than {} decimals of {}",
                self.input_amount,
                self.input_asset.decimals(),
                self.input_asset
            )));
        }
        if self.input_asset.id() == self.output_asset.id() {
            return Err(DomainError::ValidationError(format!(
                "cannot swap {} for itself",
                self.input_asset
            )));
        }
        if self.requester.as_str().trim().is_empty() {
            return Err(DomainError::ValidationError(
                "requester address is empty".to_string(),
            ));
        }
        Amount::new(self.input_amount)
    }
}
