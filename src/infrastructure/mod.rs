//! # Infrastructure Layer
//!
//! External adapters and implementations of application ports.
//!
//! ## Venues
//!
//! HTTP venue adapters and the venue registry.
//!
//! ## Balances
//!
//! RPC and indexer balance read paths.
//!
//! ## Persistence
//!
//! In-memory staking position repository.

pub mod balances;
pub mod persistence;
pub mod venues;
