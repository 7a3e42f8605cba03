//! # Domain Layer
//!
//! Core swap and staking concepts, free of I/O.
//!
//! This layer contains:
//! - **Entities**: Quotes, swap requests and results, transactions, balances, stake positions
//! - **Value Objects**: Amounts, assets, identifiers, timestamps and state machines
//! - **Errors**: Domain-specific error types
pub mod entities;
pub mod errors;
pub mod value_objects;
