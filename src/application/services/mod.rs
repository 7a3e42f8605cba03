//! # Application Services
//!
//! Services the use cases are assembled from:
//! - [`QuoteAggregator`]: priority-ordered venue routing
//! - [`VenueLivenessStore`]: append-only venue health record
//! - [`Settlement`]: sign, broadcast and confirm
//! - [`BalanceReconciliationService`]: authoritative balance reads
//! - [`OwnerLocks`]: per-owner serialization

pub mod balance_reconciliation;
pub mod confirmation;
pub mod owner_lock;
pub mod quote_aggregator;
pub mod settlement;
pub mod venue_liveness;

pub use balance_reconciliation::{
    BalanceReadPath, BalanceReconciliationService, RateLimitPolicy, ReadPathError,
    ReconciliationConfig,
};
pub use confirmation::{ConfirmationOutcome, ConfirmationPolicy, await_confirmation};
pub use owner_lock::OwnerLocks;
pub use quote_aggregator::{AggregatorConfig, QuoteAggregator, RoutedQuote};
pub use settlement::{
    CancelHandle, CancelSignal, Settlement, SignError, TransactionSigner, TransactionTransport,
    TransportError,
};
pub use venue_liveness::{
    CooldownPolicy, InMemoryLivenessStore, LivenessObservation, VenueLivenessStore,
    VenueLivenessSummary,
};
