//! # Swap Engine
//!
//! Multi-venue swap routing and settlement with a staking ledger.
//!
//! ## Architecture
//!
//! This crate follows Domain-Driven Design with a layered architecture:
//!
//! - **Domain Layer** (`domain`): assets, amounts, quotes, swap state machine, stake positions
//! - **Application Layer** (`application`): quote aggregation, settlement, reconciliation,
//!   the swap orchestrator and the staking ledger
//! - **Infrastructure Layer** (`infrastructure`): HTTP venue adapters, balance read paths,
//!   in-memory repositories
//!
//! ## Example
//!
//! ```rust,ignore
//! use swap_engine::application::SwapOrchestrator;
//! use swap_engine::application::CancelSignal;
//!
//! let result = orchestrator.execute(request, CancelSignal::never()).await;
//! if result.is_success() {
//!     println!("received {:?}", result.output_amount);
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
