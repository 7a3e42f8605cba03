//! # Application Layer
//!
//! Use case orchestration and application services.
//!
//! This layer coordinates domain objects with the venue adapters, the
//! signer, the transport and the balance read paths.
//!
//! ## Use Cases
//!
//! - [`SwapOrchestrator`]: quote, build, sign, broadcast, confirm, reconcile
//! - [`StakingLedger`]: stake, unstake and claim over the same settlement path
//!
//! ## Services
//!
//! - `QuoteAggregator`: first usable quote in venue priority order
//! - `BalanceReconciliationService`: balances with read path fallback

pub mod error;
pub mod services;
pub mod use_cases;

#[cfg(test)]
pub(crate) mod mocks;

pub use error::{ApplicationError, ApplicationResult, ReadPathFailure};
pub use services::{
    AggregatorConfig, BalanceReadPath, BalanceReconciliationService, CancelHandle, CancelSignal,
    ConfirmationPolicy, CooldownPolicy, InMemoryLivenessStore, OwnerLocks, QuoteAggregator,
    ReconciliationConfig, Settlement, TransactionSigner, TransactionTransport, VenueLivenessStore,
};
pub use use_cases::{
    PositionView, StakePositionRepository, StakingConfig, StakingLedger, SwapOrchestrator,
    TransferBuilder, TransferInstruction, TransferKind,
};
