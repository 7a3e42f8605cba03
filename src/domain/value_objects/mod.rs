//! # Value Objects
//!
//! Immutable types with validation and domain semantics.
//!
//! ## Identity Types
//!
//! - [`SwapId`], [`QuoteId`]: UUID-based identifiers
//! - [`VenueId`], [`WalletAddress`], [`AssetId`], [`TxId`]: String-based identifiers
//!
//! ## Numeric Types
//!
//! - [`Amount`]: Non-negative decimal token amount
//! - [`SlippageBps`]: Slippage tolerance in basis points
//! - [`Apy`]: Annual reward rate
//!
//! ## Assets and Time
//!
//! - [`Asset`], [`AssetCatalog`]: Configured assets and base-unit conversion
//! - [`Timestamp`], [`Clock`]: Points in time and injectable time source
//!
//! ## State Types
//!
//! - [`SwapState`]: Swap lifecycle state machine
//! - [`VenueLiveness`]: Venue health classification

pub mod amount;
pub mod asset;
pub mod ids;
pub mod liveness;
pub mod rate;
pub mod slippage;
pub mod swap_state;
pub mod timestamp;

pub use amount::Amount;
pub use asset::{Asset, AssetCatalog};
pub use ids::{AssetId, QuoteId, SwapId, TxId, VenueId, WalletAddress};
pub use liveness::VenueLiveness;
pub use rate::{Apy, SECONDS_PER_YEAR};
pub use slippage::SlippageBps;
pub use swap_state::SwapState;
pub use timestamp::{Clock, ManualClock, SystemClock, Timestamp};
