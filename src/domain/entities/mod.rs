//! # Domain Entities
//!
//! ## Swap
//!
//! - [`SwapRequest`]: What the user asked for
//! - [`Quote`]: A venue's priced offer
//! - [`UnsignedTransaction`], [`SignedTransaction`], [`TxStatus`]: Settlement artifacts
//! - [`SwapResult`]: Terminal record returned to the caller
//!
//! ## Venues
//!
//! - [`VenueCapabilities`], [`VenueFailure`]: Routing metadata
//!
//! ## Ledger
//!
//! - [`BalanceSnapshot`]: Point-in-time balance
//! - [`StakePosition`]: Staking principal and reward state

pub mod balance;
pub mod quote;
pub mod stake_position;
pub mod swap_request;
pub mod swap_result;
pub mod transaction;
pub mod venue;

pub use balance::{BalanceReading, BalanceSnapshot, BalanceView};
pub use quote::{Quote, QuoteBuilder, VenuePayload};
pub use stake_position::StakePosition;
pub use swap_request::SwapRequest;
pub use swap_result::{FailureDetail, FailureKind, SwapOutcome, SwapResult};
pub use transaction::{SignedTransaction, TxStatus, UnsignedTransaction};
pub use venue::{VenueCapabilities, VenueFailure, VenueFailureKind};
