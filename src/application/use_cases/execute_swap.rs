//! # Execute Swap Use Case
//!
//! Drives one swap from quote to reconciled balances.
//!
//! ```text
//! Quoting ─► Building ─► AwaitingSignature ─► Broadcasting ─► Confirming
//!    ▲          │                                                │
//!    └─(expired, once)                         Succeeded / Failed / PartialUnknown
//! ```
//!
//! Every path ends in a terminal state and a [`SwapResult`]; errors never
//! escape [`SwapOrchestrator::execute`]. Balances of both assets are
//! reconciled exactly once before the result is returned, whatever the
//! outcome.

use crate::application::error::{ApplicationError, ApplicationResult};
use crate::application::services::balance_reconciliation::BalanceReconciliationService;
use crate::application::services::confirmation::ConfirmationOutcome;
use crate::application::services::owner_lock::OwnerLocks;
use crate::application::services::quote_aggregator::{QuoteAggregator, RoutedQuote};
use crate::application::services::settlement::{CancelSignal, Settlement};
use crate::domain::entities::{
    FailureDetail, Quote, SwapOutcome, SwapRequest, SwapResult, UnsignedTransaction,
};
use crate::domain::errors::DomainError;
use crate::domain::value_objects::{Asset, Clock, SwapState, TxId, VenueId};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, instrument, warn};

/// Progress of one swap through the state machine.
#[derive(Debug)]
struct SwapAttempt {
    state: SwapState,
    transitions: Vec<SwapState>,
    quote_attempts: u32,
    venue_id: Option<VenueId>,
    quote: Option<Quote>,
    tx_id: Option<TxId>,
}

impl SwapAttempt {
    fn new() -> Self {
        Self {
            state: SwapState::Quoting,
            transitions: vec![SwapState::Quoting],
            quote_attempts: 0,
            venue_id: None,
            quote: None,
            tx_id: None,
        }
    }

    fn advance(&mut self, to: SwapState) -> ApplicationResult<()> {
        if !self.state.can_transition_to(to) {
            return Err(DomainError::InvalidStateTransition {
                from: self.state,
                to,
            }
            .into());
        }
        self.state = to;
        self.transitions.push(to);
        Ok(())
    }

    fn finish(&mut self, terminal: SwapState) {
        if self.state.is_terminal() {
            return;
        }
        if self.advance(terminal).is_err() {
            warn!(from = %self.state, to = %terminal, "terminal state not reachable, failing");
            self.state = SwapState::Failed;
            self.transitions.push(SwapState::Failed);
        }
    }
}

enum BuildOutcome {
    Built(UnsignedTransaction),
    Expired,
}

/// Swap orchestrator.
///
/// Holds the requester's owner lock for the whole swap so swaps and staking
/// operations for one owner never interleave.
#[derive(Debug)]
pub struct SwapOrchestrator {
    aggregator: Arc<QuoteAggregator>,
    settlement: Arc<Settlement>,
    reconciliation: Arc<BalanceReconciliationService>,
    owner_locks: Arc<OwnerLocks>,
    clock: Arc<dyn Clock>,
}

impl SwapOrchestrator {
    /// Creates an orchestrator.
    #[must_use]
    pub fn new(
        aggregator: Arc<QuoteAggregator>,
        settlement: Arc<Settlement>,
        reconciliation: Arc<BalanceReconciliationService>,
        owner_locks: Arc<OwnerLocks>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            aggregator,
            settlement,
            reconciliation,
            owner_locks,
            clock,
        }
    }

    /// Executes a swap.
    ///
    /// `cancel` is honored while waiting for the signature only.
    #[instrument(
        skip(self, request, cancel),
        fields(swap_id = %request.id, owner = %request.requester)
    )]
    pub async fn execute(&self, request: SwapRequest, mut cancel: CancelSignal) -> SwapResult {
        let _guard = self.owner_locks.acquire(&request.requester).await;

        let mut attempt = SwapAttempt::new();
        let result = self.run(&request, &mut attempt, &mut cancel).await;

        let terminal = match &result {
            Ok(_) => SwapState::Succeeded,
            Err(ApplicationError::ConfirmationTimeout { .. }) => SwapState::PartialUnknown,
            Err(_) => SwapState::Failed,
        };
        attempt.finish(terminal);

        match &result {
            Ok(tx_id) => info!(%tx_id, quote_attempts = attempt.quote_attempts, "swap succeeded"),
            Err(e) if e.is_user_cancellation() => info!("swap cancelled by user"),
            Err(e) => warn!(state = %attempt.state, error = %e, "swap did not succeed"),
        }

        let balances = self
            .reconciliation
            .reconcile(&request.requester, &distinct_assets(&request))
            .await;

        let outcome = SwapOutcome::from_state(attempt.state).unwrap_or(SwapOutcome::Failed);
        let failure = result.as_ref().err().map(FailureDetail::from);
        let quote = attempt.quote.as_ref();

        SwapResult {
            swap_id: request.id,
            outcome,
            venue_id: attempt.venue_id.clone(),
            input_asset: request.input_asset.id().clone(),
            output_asset: request.output_asset.id().clone(),
            quoted_output: quote.map(Quote::estimated_output),
            min_output: quote.map(Quote::min_output),
            output_amount: match outcome {
                SwapOutcome::Success => quote.map(Quote::estimated_output),
                _ => None,
            },
            tx_id: attempt.tx_id.clone(),
            failure,
            transitions: attempt.transitions,
            quote_attempts: attempt.quote_attempts,
            balances,
            completed_at: self.clock.now(),
        }
    }

    async fn run(
        &self,
        request: &SwapRequest,
        attempt: &mut SwapAttempt,
        cancel: &mut CancelSignal,
    ) -> ApplicationResult<TxId> {
        request.validated_input()?;

        let mut routed = self.quote(request, attempt).await?;
        let mut requoted = false;

        let unsigned = loop {
            attempt.advance(SwapState::Building)?;
            match self.build(&routed, request).await? {
                BuildOutcome::Built(tx) => break tx,
                BuildOutcome::Expired if requoted => {
                    return Err(ApplicationError::QuoteExpired {
                        venue_id: routed.quote.venue_id().clone(),
                    });
                }
                BuildOutcome::Expired => {
                    info!(venue = %routed.quote.venue_id(), "quote expired, re-quoting once");
                    requoted = true;
                    attempt.advance(SwapState::Quoting)?;
                    routed = self.quote(request, attempt).await?;
                }
            }
        };

        attempt.advance(SwapState::AwaitingSignature)?;
        let signed = self.settlement.sign(&unsigned, cancel).await?;

        attempt.advance(SwapState::Broadcasting)?;
        let tx_id = self.settlement.broadcast(&signed).await?;
        attempt.tx_id = Some(tx_id.clone());

        attempt.advance(SwapState::Confirming)?;
        match self.settlement.confirm(&tx_id, Some(&routed.adapter)).await {
            ConfirmationOutcome::Confirmed { .. } => Ok(tx_id),
            ConfirmationOutcome::Failed { .. } => {
                Err(ApplicationError::TransactionFailed { tx_id })
            }
            ConfirmationOutcome::TimedOut { .. } => {
                Err(ApplicationError::ConfirmationTimeout { tx_id })
            }
        }
    }

    async fn quote(
        &self,
        request: &SwapRequest,
        attempt: &mut SwapAttempt,
    ) -> ApplicationResult<RoutedQuote> {
        attempt.quote_attempts = attempt.quote_attempts.saturating_add(1);
        let routed = self.aggregator.find_quote(request).await?;
        attempt.venue_id = Some(routed.quote.venue_id().clone());
        attempt.quote = Some(routed.quote.clone());
        Ok(routed)
    }

    async fn build(
        &self,
        routed: &RoutedQuote,
        request: &SwapRequest,
    ) -> ApplicationResult<BuildOutcome> {
        let venue_id = routed.quote.venue_id();
        if routed.quote.is_expired_at(self.clock.now()) {
            return Ok(BuildOutcome::Expired);
        }

        let budget = match routed.adapter.timeout_ms() {
            0 => self.aggregator.config().quote_timeout,
            ms => Duration::from_millis(ms),
        };
        let build = routed.adapter.build_transaction(&routed.quote, request);
        let built = timeout(budget, build).await;

        let reason = match built {
            Ok(Ok(tx)) => return Ok(BuildOutcome::Built(tx)),
            Ok(Err(e)) if e.is_quote_expired() => return Ok(BuildOutcome::Expired),
            Ok(Err(e)) => e.to_string(),
            Err(_) => format!("build timed out after {}ms", budget.as_millis()),
        };

        self.aggregator.report_failure(venue_id, reason.clone());
        let venue_id = venue_id.clone();
        Err(ApplicationError::venue_unavailable(venue_id, reason))
    }
}

fn distinct_assets(request: &SwapRequest) -> Vec<&Asset> {
    if request.input_asset.id() == request.output_asset.id() {
        vec![&request.input_asset]
    } else {
        vec![&request.input_asset, &request.output_asset]
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::application::mocks::{
        MockReadPath, MockSigner, MockTransport, MockVenue, asset_x, asset_y, quote_for,
        swap_request, t0,
    };
    use crate::application::services::balance_reconciliation::ReconciliationConfig;
    use crate::application::services::confirmation::ConfirmationPolicy;
    use crate::application::services::quote_aggregator::AggregatorConfig;
    use crate::application::services::venue_liveness::InMemoryLivenessStore;
    use crate::domain::value_objects::ManualClock;
    use crate::infrastructure::venues::error::VenueError;
    use crate::infrastructure::venues::registry::VenueRegistry;

    async fn orchestrator(venue: Arc<MockVenue>, clock: Arc<ManualClock>) -> SwapOrchestrator {
        let registry = Arc::new(VenueRegistry::new());
        registry.register(venue).await;
        let aggregator = QuoteAggregator::new(
            registry,
            Arc::new(InMemoryLivenessStore::new()),
            clock.clone(),
            AggregatorConfig::default(),
        );
        let settlement = Settlement::new(
            MockSigner::approving(),
            MockTransport::new(),
            ConfirmationPolicy::default(),
        );
        let reconciliation = BalanceReconciliationService::new(
            vec![MockReadPath::returning("rpc", "1")],
            clock.clone(),
            ReconciliationConfig::default(),
        );
        SwapOrchestrator::new(
            Arc::new(aggregator),
            Arc::new(settlement),
            Arc::new(reconciliation),
            Arc::new(OwnerLocks::new()),
            clock,
        )
    }

    #[tokio::test]
    async fn expired_quote_is_never_built() {
        let clock = Arc::new(ManualClock::new(t0()));
        let venue = MockVenue::quoting("venue-a", "34.2");
        let orchestrator = orchestrator(venue.clone(), clock.clone()).await;
        let routed = RoutedQuote {
            quote: quote_for("venue-a", asset_x(), asset_y(), "34.2", t0().add_secs(30)),
            adapter: venue.clone(),
            skipped: Vec::new(),
        };

        let outcome = orchestrator
            .build(&routed, &swap_request("1.5"))
            .await
            .unwrap();
        assert!(matches!(outcome, BuildOutcome::Built(_)));

        clock.advance(Duration::from_secs(30));
        let outcome = orchestrator
            .build(&routed, &swap_request("1.5"))
            .await
            .unwrap();
        assert!(matches!(outcome, BuildOutcome::Expired));
        assert_eq!(venue.build_calls(), 1);
    }

    #[tokio::test]
    async fn build_error_is_venue_unavailable() {
        let clock = Arc::new(ManualClock::new(t0()));
        let venue = MockVenue::quoting("venue-a", "34.2");
        let orchestrator = orchestrator(venue.clone(), clock).await;
        venue.queue_build(Err(VenueError::timeout("builder stalled")));
        let routed = RoutedQuote {
            quote: quote_for("venue-a", asset_x(), asset_y(), "34.2", t0().add_secs(30)),
            adapter: venue,
            skipped: Vec::new(),
        };

        let err = orchestrator
            .build(&routed, &swap_request("1.5"))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ApplicationError::VenueUnavailable { .. }));
    }

    #[test]
    fn attempt_records_transitions() {
        let mut attempt = SwapAttempt::new();
        attempt.advance(SwapState::Building).unwrap();
        attempt.advance(SwapState::Quoting).unwrap();
        attempt.advance(SwapState::Building).unwrap();
        assert_eq!(
            attempt.transitions,
            vec![
                SwapState::Quoting,
                SwapState::Building,
                SwapState::Quoting,
                SwapState::Building
            ]
        );
    }

    #[test]
    fn attempt_rejects_skipping_states() {
        let mut attempt = SwapAttempt::new();
        let err = attempt.advance(SwapState::Broadcasting).unwrap_err();
        assert!(matches!(err, ApplicationError::DomainError(_)));
        assert_eq!(attempt.state, SwapState::Quoting);
    }

    #[test]
    fn finish_falls_back_to_failed() {
        let mut attempt = SwapAttempt::new();
        attempt.finish(SwapState::PartialUnknown);
        assert_eq!(attempt.state, SwapState::Failed);

        attempt.finish(SwapState::Succeeded);
        assert_eq!(attempt.transitions.last(), Some(&SwapState::Failed));
    }
}
