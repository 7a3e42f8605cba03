//! # Quote
//!
//! A venue's price for a swap, with an opaque payload needed to build the
//! transaction.
//!
//! # Examples
//!
//! ```
//! use swap_engine::domain::entities::quote::QuoteBuilder;
//! use swap_engine::domain::value_objects::{Asset, Timestamp, VenueId};
//!
//! let now = Timestamp::from_millis(1_700_000_000_000).unwrap();
//! let quote = QuoteBuilder::new(
//!     VenueId::new("venue-a"),
//!     Asset::new("mint-x", "X", 6).unwrap(),
//!     "10".parse().unwrap(),
//!     Asset::new("mint-y", "Y", 6).unwrap(),
//!     "34.2".parse().unwrap(),
//!     now.add_secs(30),
//! )
//! .build()
//! .unwrap();
//!
//! assert!(!quote.is_expired_at(now));
//! assert!(quote.is_expired_at(now.add_secs(30)));
//! ```

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::{Amount, Asset, QuoteId, SlippageBps, Timestamp, VenueId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Venue-specific data needed to build the transaction.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VenuePayload(serde_json::Value);

impl VenuePayload {
    /// Wraps a JSON payload.
    #[must_use]
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// Returns the JSON payload.
    #[inline]
    #[must_use]
    pub fn as_json(&self) -> &serde_json::Value {
        &self.0
    }

    /// Returns true if no payload was provided.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_null()
    }
}

/// A priced offer from one venue.
///
/// # Invariants
///
/// - `estimated_output` is strictly positive
/// - `min_output <= estimated_output`
/// - `input_asset != output_asset`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    id: QuoteId,
    venue_id: VenueId,
    input_asset: Asset,
    input_amount: Amount,
    output_asset: Asset,
    estimated_output: Amount,
    min_output: Amount,
    price_impact_pct: Decimal,
    slippage: SlippageBps,
    payload: VenuePayload,
    created_at: Timestamp,
    expires_at: Timestamp,
}

impl Quote {
    /// Returns the quote identifier.
    #[inline]
    #[must_use]
    pub fn id(&self) -> QuoteId {
        self.id
    }

    /// Returns the quoting venue.
    #[inline]
    #[must_use]
    pub fn venue_id(&self) -> &VenueId {
        &self.venue_id
    }

    /// Returns the input asset.
    #[inline]
    #[must_use]
    pub fn input_asset(&self) -> &Asset {
        &self.input_asset
    }

    /// Returns the input amount.
    #[inline]
    #[must_use]
    pub fn input_amount(&self) -> Amount {
        self.input_amount
    }

    /// Returns the output asset.
    #[inline]
    #[must_use]
    pub fn output_asset(&self) -> &Asset {
        &self.output_asset
    }

    /// Returns the venue's estimated output.
    #[inline]
    #[must_use]
    pub fn estimated_output(&self) -> Amount {
        self.estimated_output
    }

    /// Returns the minimum output after slippage.
    #[inline]
    #[must_use]
    pub fn min_output(&self) -> Amount {
        self.min_output
    }

    /// Returns the venue's price impact estimate in percent.
    #[inline]
    #[must_use]
    pub fn price_impact_pct(&self) -> Decimal {
        self.price_impact_pct
    }

    /// Returns the slippage tolerance the quote was priced with.
    #[inline]
    #[must_use]
    pub fn slippage(&self) -> SlippageBps {
        self.slippage
    }

    /// Returns the opaque build payload.
    #[inline]
    #[must_use]
    pub fn payload(&self) -> &VenuePayload {
        &self.payload
    }

    /// Returns when the engine received the quote.
    #[inline]
    #[must_use]
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Returns the expiry time.
    #[inline]
    #[must_use]
    pub fn expires_at(&self) -> Timestamp {
        self.expires_at
    }

    /// Returns true if the quote is no longer valid at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        !now.is_before(&self.expires_at)
    }

    /// Remaining validity at `now`, zero once expired.
    #[must_use]
    pub fn time_to_expiry(&self, now: Timestamp) -> Duration {
        self.expires_at.duration_since(&now)
    }

    /// Returns true if the venue's price impact exceeds the slippage tolerance.
    #[must_use]
    pub fn exceeds_slippage(&self) -> bool {
        self.price_impact_pct > self.slippage.as_percent()
    }
}

/// Builder for [`Quote`].
#[derive(Debug, Clone)]
pub struct QuoteBuilder {
    venue_id: VenueId,
    input_asset: Asset,
    input_amount: Amount,
    output_asset: Asset,
    estimated_output: Amount,
    expires_at: Timestamp,
    created_at: Option<Timestamp>,
    price_impact_pct: Decimal,
    slippage: SlippageBps,
    payload: VenuePayload,
}

impl QuoteBuilder {
    /// Starts a quote with the required fields.
    #[must_use]
    pub fn new(
        venue_id: VenueId,
        input_asset: Asset,
        input_amount: Amount,
        output_asset: Asset,
        estimated_output: Amount,
        expires_at: Timestamp,
    ) -> Self {
        Self {
            venue_id,
            input_asset,
            input_amount,
            output_asset,
            estimated_output,
            expires_at,
            created_at: None,
            price_impact_pct: Decimal::ZERO,
            slippage: SlippageBps::default(),
            payload: VenuePayload::default(),
        }
    }

    /// Sets the price impact estimate in percent.
    #[must_use]
    pub fn price_impact_pct(mut self, pct: Decimal) -> Self {
        self.price_impact_pct = pct;
        self
    }

    /// Sets the slippage tolerance used to derive the minimum output.
    #[must_use]
    pub fn slippage(mut self, slippage: SlippageBps) -> Self {
        self.slippage = slippage;
        self
    }

    /// Sets the opaque build payload.
    #[must_use]
    pub fn payload(mut self, payload: VenuePayload) -> Self {
        self.payload = payload;
        self
    }

    /// Sets the receive time; defaults to the wall clock.
    #[must_use]
    pub fn created_at(mut self, at: Timestamp) -> Self {
        self.created_at = Some(at);
        self
    }

    /// Validates and builds the quote.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidQuote` for a zero output, a zero input,
    /// identical assets or a negative price impact.
    pub fn build(self) -> DomainResult<Quote> {
        if self.estimated_output.is_zero() {
            return Err(DomainError::InvalidQuote(format!(
                "venue {} quoted zero output",
                self.venue_id
            )));
        }
        if self.input_amount.is_zero() {
            return Err(DomainError::InvalidQuote(
                "input amount is zero".to_string(),
            ));
        }
        if self.input_asset.id() == self.output_asset.id() {
            return Err(DomainError::InvalidQuote(format!(
                "input and output asset are both {}",
                self.input_asset
            )));
        }
        if self.price_impact_pct.is_sign_negative() && !self.price_impact_pct.is_zero() {
            return Err(DomainError::InvalidQuote(format!(
                "negative price impact {}",
                self.price_impact_pct
            )));
        }

        let min_output = self.slippage.min_output(self.estimated_output)?;

        Ok(Quote {
            id: QuoteId::new_v4(),
            venue_id: self.venue_id,
            input_asset: self.input_asset,
            input_amount: self.input_amount,
            output_asset: self.output_asset,
            estimated_output: self.estimated_output,
            min_output,
            price_impact_pct: self.price_impact_pct,
            slippage: self.slippage,
            payload: self.payload,
            created_at: self.created_at.unwrap_or_else(Timestamp::now),
            expires_at: self.expires_at,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn now() -> Timestamp {
        Timestamp::from_millis(1_700_000_000_000).unwrap()
    }

    fn builder(output: &str) -> QuoteBuilder {
        QuoteBuilder::new(
            VenueId::new("venue-a"),
            Asset::new("mint-x", "X", 6).unwrap(),
            "10".parse().unwrap(),
            Asset::new("mint-y", "Y", 6).unwrap(),
            output.parse().unwrap(),
            now().add_secs(30),
        )
        .created_at(now())
    }

    #[test]
    fn zero_output_rejected() {
        let err = builder("0").build().unwrap_err();
        assert!(matches!(err, DomainError::InvalidQuote(_)));
    }

    #[test]
    fn same_asset_rejected() {
        let asset = Asset::new("mint-x", "X", 6).unwrap();
        let result = QuoteBuilder::new(
            VenueId::new("venue-a"),
            asset.clone(),
            "1".parse().unwrap(),
            asset,
            "1".parse().unwrap(),
            now(),
        )
        .build();
        assert!(result.is_err());
    }

    #[test]
    fn min_output_follows_slippage() {
        let quote = builder("100")
            .slippage(SlippageBps::new(100).unwrap())
            .build()
            .unwrap();
        assert_eq!(quote.min_output().get(), Decimal::new(99, 0));
        assert!(quote.min_output() <= quote.estimated_output());
    }

    #[test]
    fn expiry_boundary_is_exclusive() {
        let quote = builder("34.2").build().unwrap();
        assert!(!quote.is_expired_at(now().add_secs(29)));
        assert!(quote.is_expired_at(now().add_secs(30)));
        assert_eq!(quote.time_to_expiry(now()), Duration::from_secs(30));
        assert_eq!(quote.time_to_expiry(now().add_secs(60)), Duration::ZERO);
    }

    #[test]
    fn price_impact_beyond_tolerance() {
        let quote = builder("34.2")
            .slippage(SlippageBps::new(50).unwrap())
            .price_impact_pct(Decimal::new(12, 1))
            .build()
            .unwrap();
        assert!(quote.exceeds_slippage());
    }
}
