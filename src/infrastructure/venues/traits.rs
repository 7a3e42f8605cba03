//! # Venue Adapter Trait
//!
//! The uniform contract every liquidity venue implements.
//!
//! Adapters never decide routing: they report outcomes upward and the quote
//! aggregator classifies them into liveness observations.

use super::error::VenueResult;
use crate::domain::entities::{Quote, SwapRequest, TxStatus, UnsignedTransaction};
use crate::domain::value_objects::{TxId, VenueId};
use async_trait::async_trait;
use std::fmt;

/// A liquidity venue (aggregator API, direct pool, market maker).
#[async_trait]
pub trait VenueAdapter: Send + Sync + fmt::Debug {
    /// Stable venue identifier.
    fn venue_id(&self) -> &VenueId;

    /// Per-call timeout budget in milliseconds.
    fn timeout_ms(&self) -> u64;

    /// Prices a swap.
    ///
    /// # Errors
    ///
    /// `VenueError::NoLiquidity` when the venue is reachable but cannot fill;
    /// any other error means the venue is unavailable.
    async fn quote(&self, request: &SwapRequest) -> VenueResult<Quote>;

    /// Builds an unsigned transaction for a previously returned quote.
    ///
    /// # Errors
    ///
    /// `VenueError::QuoteExpired` if the venue considers the quote stale.
    async fn build_transaction(
        &self,
        quote: &Quote,
        request: &SwapRequest,
    ) -> VenueResult<UnsignedTransaction>;

    /// Reports the on-chain status of a transaction built by this venue.
    ///
    /// # Errors
    ///
    /// Any error means the status is unknown for now.
    async fn verify(&self, tx_id: &TxId) -> VenueResult<TxStatus>;

    /// Returns false if the adapter knows it cannot serve requests.
    async fn is_available(&self) -> bool {
        true
    }
}
