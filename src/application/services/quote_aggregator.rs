//! # Quote Aggregator
//!
//! Finds one usable quote for a swap request by walking venues in priority
//! order and returning the first success.
//!
//! For each venue the aggregator:
//!
//! 1. skips it if it cannot both quote and build, or is cooling down
//! 2. asks for a quote under a per-venue timeout
//! 3. checks the quote matches the request (venue, asset pair, input
//!    amount, slippage) and has not expired
//! 4. records a liveness observation: `Live` on success, `Degraded` on
//!    no-liquidity, `Dead` on timeout, error or malformed quote
//!
//! When every venue fails the caller gets `NoRouteAvailable` with one
//! reason per venue plus the configured manual fallback venues. Nothing is
//! fabricated: there is no synthetic quote path.

use crate::application::error::{ApplicationError, ApplicationResult};
use crate::application::services::venue_liveness::{
    CooldownPolicy, LivenessObservation, VenueLivenessStore, VenueLivenessSummary, summarize,
};
use crate::domain::entities::{Quote, SwapRequest, VenueFailure, VenueFailureKind};
use crate::domain::value_objects::{Clock, VenueId, VenueLiveness};
use crate::infrastructure::venues::error::VenueError;
use crate::infrastructure::venues::registry::VenueRegistry;
use crate::infrastructure::venues::traits::VenueAdapter;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

/// Default per-venue quote timeout.
pub const DEFAULT_QUOTE_TIMEOUT: Duration = Duration::from_secs(6);

/// Aggregator settings.
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Upper bound for a single venue's quote call.
    pub quote_timeout: Duration,
    /// Cool-down applied to `Dead` venues.
    pub cooldown: CooldownPolicy,
    /// Venues (names or URLs) suggested to the user when routing fails.
    pub manual_venues: Vec<String>,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            quote_timeout: DEFAULT_QUOTE_TIMEOUT,
            cooldown: CooldownPolicy::default(),
            manual_venues: Vec::new(),
        }
    }
}

/// A quote together with the adapter that issued it.
#[derive(Debug, Clone)]
pub struct RoutedQuote {
    /// The accepted quote.
    pub quote: Quote,
    /// Adapter that must build the transaction.
    pub adapter: Arc<dyn VenueAdapter>,
    /// Venues tried before this one, with reasons.
    pub skipped: Vec<VenueFailure>,
}

/// Quote aggregation service.
#[derive(Debug)]
pub struct QuoteAggregator {
    registry: Arc<VenueRegistry>,
    liveness: Arc<dyn VenueLivenessStore>,
    clock: Arc<dyn Clock>,
    config: AggregatorConfig,
}

impl QuoteAggregator {
    /// Creates an aggregator.
    #[must_use]
    pub fn new(
        registry: Arc<VenueRegistry>,
        liveness: Arc<dyn VenueLivenessStore>,
        clock: Arc<dyn Clock>,
        config: AggregatorConfig,
    ) -> Self {
        Self {
            registry,
            liveness,
            clock,
            config,
        }
    }

    /// Returns the configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Finds the first usable quote in priority order.
    ///
    /// # Errors
    ///
    /// - `InvalidRequest` if the request is malformed (no venue is contacted)
    /// - `NoRouteAvailable` if every venue failed or was skipped
    #[instrument(skip(self, request), fields(swap_id = %request.id))]
    pub async fn find_quote(&self, request: &SwapRequest) -> ApplicationResult<RoutedQuote> {
        request.validated_input()?;

        let venues = self.registry.by_priority().await;
        let mut failures = Vec::with_capacity(venues.len());

        for venue in venues {
            let venue_id = venue.venue_id().clone();

            if !venue.settings.capabilities().is_routable() {
                failures.push(VenueFailure::new(
                    venue_id,
                    VenueFailureKind::NotQuotable,
                    "venue cannot both quote and build",
                ));
                continue;
            }

            let history = self.liveness.history(&venue_id);
            let now = self.clock.now();
            if self.config.cooldown.is_cooling_down(&history, now) {
                let until = self
                    .config
                    .cooldown
                    .retry_after(&history)
                    .map(|t| t.to_string())
                    .unwrap_or_default();
                debug!(venue = %venue_id, until = %until, "skipping venue in cool-down");
                failures.push(VenueFailure::new(
                    venue_id,
                    VenueFailureKind::SkippedCoolingDown,
                    format!("cooling down until {until}"),
                ));
                continue;
            }

            match self.quote_one(&venue.adapter, request).await {
                Ok(quote) => {
                    self.observe(&venue_id, VenueLiveness::Live, None);
                    info!(
                        venue = %venue_id,
                        estimated_output = %quote.estimated_output(),
                        skipped = failures.len(),
                        "quote accepted"
                    );
                    return Ok(RoutedQuote {
                        quote,
                        adapter: venue.adapter,
                        skipped: failures,
                    });
                }
                Err(failure) => {
                    let liveness = match failure.kind {
                        VenueFailureKind::NoLiquidity => VenueLiveness::Degraded,
                        _ => VenueLiveness::Dead,
                    };
                    warn!(
                        venue = %venue_id,
                        %liveness,
                        reason = %failure.reason,
                        "venue quote failed"
                    );
                    self.observe(&venue_id, liveness, Some(failure.reason.clone()));
                    failures.push(failure);
                }
            }
        }

        Err(ApplicationError::NoRouteAvailable {
            failures,
            manual_venues: self.config.manual_venues.clone(),
        })
    }

    async fn quote_one(
        &self,
        adapter: &Arc<dyn VenueAdapter>,
        request: &SwapRequest,
    ) -> Result<Quote, VenueFailure> {
        let venue_id = adapter.venue_id().clone();
        let budget = match adapter.timeout_ms() {
            0 => self.config.quote_timeout,
            ms => Duration::from_millis(ms).min(self.config.quote_timeout),
        };

        let quote = match timeout(budget, adapter.quote(request)).await {
            Ok(Ok(quote)) => quote,
            Ok(Err(e)) => return Err(classify(venue_id, &e)),
            Err(_) => {
                return Err(VenueFailure::new(
                    venue_id,
                    VenueFailureKind::Unavailable,
                    format!("quote timed out after {}ms", budget.as_millis()),
                ));
            }
        };

        self.check_quote(&venue_id, &quote, request)?;
        Ok(quote)
    }

    fn check_quote(
        &self,
        venue_id: &VenueId,
        quote: &Quote,
        request: &SwapRequest,
    ) -> Result<(), VenueFailure> {
        let malformed = |reason: String| {
            VenueFailure::new(venue_id.clone(), VenueFailureKind::Unavailable, reason)
        };

        if quote.venue_id() != venue_id {
            let reason = format!("quote attributed to {} instead", quote.venue_id());
            return Err(malformed(reason));
        }
        if quote.input_asset().id() != request.input_asset.id()
            || quote.output_asset().id() != request.output_asset.id()
        {
            return Err(malformed("quote is for a different asset pair".to_string()));
        }
        let requested = request.input_amount;
        if quote.input_amount().get() != requested {
            return Err(malformed(format!(
                "quote priced {} input instead of {requested}",
                quote.input_amount()
            )));
        }
        if quote.slippage() != request.max_slippage {
            return Err(malformed(format!(
                "quote uses slippage {} instead of {}",
                quote.slippage(),
                request.max_slippage
            )));
        }
        if quote.is_expired_at(self.clock.now()) {
            return Err(malformed("quote already expired on arrival".to_string()));
        }
        if quote.exceeds_slippage() {
            return Err(VenueFailure::new(
                venue_id.clone(),
                VenueFailureKind::NoLiquidity,
                format!(
                    "price impact {}% exceeds tolerance {}",
                    quote.price_impact_pct(),
                    quote.slippage()
                ),
            ));
        }
        Ok(())
    }

    /// Records that the chosen venue failed after quoting.
    pub fn report_failure(&self, venue_id: &VenueId, reason: impl Into<String>) {
        self.observe(venue_id, VenueLiveness::Dead, Some(reason.into()));
    }

    fn observe(&self, venue_id: &VenueId, liveness: VenueLiveness, reason: Option<String>) {
        self.liveness.record(LivenessObservation::new(
            venue_id.clone(),
            liveness,
            self.clock.now(),
            reason,
        ));
    }

    /// Current liveness of every registered venue, in id order.
    pub async fn liveness_summary(&self) -> Vec<VenueLivenessSummary> {
        self.registry
            .venue_ids()
            .await
            .iter()
            .map(|id| {
                summarize(
                    id,
                    self.liveness.as_ref(),
                    &self.config.cooldown,
                    self.clock.as_ref(),
                )
            })
            .collect()
    }
}

fn classify(venue_id: VenueId, error: &VenueError) -> VenueFailure {
    let kind = if error.is_no_liquidity() {
        VenueFailureKind::NoLiquidity
    } else {
        VenueFailureKind::Unavailable
    };
    VenueFailure::new(venue_id, kind, error.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::application::mocks::{MockVenue, asset_x, asset_y, quote_for, swap_request, t0};
    use crate::application::services::venue_liveness::InMemoryLivenessStore;
    use crate::domain::value_objects::{ManualClock, SlippageBps};
    use crate::infrastructure::venues::registry::VenueSettings;
    use rust_decimal::Decimal;

    struct Harness {
        aggregator: QuoteAggregator,
        liveness: Arc<InMemoryLivenessStore>,
        clock: Arc<ManualClock>,
    }

    async fn harness(venues: Vec<(Arc<MockVenue>, u32)>) -> Harness {
        let registry = Arc::new(VenueRegistry::new());
        for (venue, priority) in venues {
            registry
                .register_with_settings(venue, VenueSettings::new().with_priority(priority))
                .await;
        }
        let liveness = Arc::new(InMemoryLivenessStore::new());
        let clock = Arc::new(ManualClock::new(t0()));
        let aggregator = QuoteAggregator::new(
            registry,
            liveness.clone(),
            clock.clone(),
            AggregatorConfig {
                manual_venues: vec!["https://manual.example".to_string()],
                ..AggregatorConfig::default()
            },
        );
        Harness {
            aggregator,
            liveness,
            clock,
        }
    }

    #[tokio::test]
    async fn first_success_in_priority_order() {
        let a = MockVenue::quoting("venue-a", "34.2");
        let b = MockVenue::quoting("venue-b", "40");
        let h = harness(vec![(b.clone(), 20), (a.clone(), 10)]).await;

        let routed = h.aggregator.find_quote(&swap_request("10")).await.unwrap();
        assert_eq!(routed.quote.venue_id().as_str(), "venue-a");
        assert_eq!(b.quote_calls(), 0);
        assert_eq!(
            h.liveness.latest(&VenueId::new("venue-a")).unwrap().liveness,
            VenueLiveness::Live
        );
    }

    #[tokio::test]
    async fn falls_through_failures_and_records_liveness() {
        let a = MockVenue::failing("venue-a", VenueError::no_liquidity("no route"));
        let b = MockVenue::failing("venue-b", VenueError::connection("refused"));
        let c = MockVenue::quoting("venue-c", "34.2");
        let h = harness(vec![(a, 1), (b, 2), (c, 3)]).await;

        let routed = h.aggregator.find_quote(&swap_request("10")).await.unwrap();
        assert_eq!(routed.quote.venue_id().as_str(), "venue-c");
        assert_eq!(routed.skipped.len(), 2);
        assert_eq!(
            h.liveness.latest(&VenueId::new("venue-a")).unwrap().liveness,
            VenueLiveness::Degraded
        );
        assert_eq!(
            h.liveness.latest(&VenueId::new("venue-b")).unwrap().liveness,
            VenueLiveness::Dead
        );
    }

    #[tokio::test]
    async fn invalid_request_contacts_no_venue() {
        let a = MockVenue::quoting("venue-a", "34.2");
        let h = harness(vec![(a.clone(), 1)]).await;

        let err = h
            .aggregator
            .find_quote(&swap_request("0"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::InvalidRequest(_)));
        assert_eq!(a.quote_calls(), 0);
        assert!(h.liveness.history(&VenueId::new("venue-a")).is_empty());
    }

    #[tokio::test]
    async fn input_below_one_base_unit_contacts_no_venue() {
        let a = MockVenue::quoting("venue-a", "34.2");
        let h = harness(vec![(a.clone(), 1)]).await;

        for amount in ["0.0000001", "1.5000001"] {
            let err = h
                .aggregator
                .find_quote(&swap_request(amount))
                .await
                .unwrap_err();
            assert!(
                matches!(err, ApplicationError::InvalidRequest(_)),
                "{amount}"
            );
        }
        assert_eq!(a.quote_calls(), 0);
        assert!(h.liveness.history(&VenueId::new("venue-a")).is_empty());
    }

    #[tokio::test]
    async fn no_route_carries_one_reason_per_venue() {
        let a = MockVenue::failing("venue-a", VenueError::no_liquidity("no route"));
        let b = MockVenue::failing("venue-b", VenueError::protocol_error("bad json"));
        let h = harness(vec![(a, 1), (b, 2)]).await;

        let err = h
            .aggregator
            .find_quote(&swap_request("10"))
            .await
            .unwrap_err();
        match err {
            ApplicationError::NoRouteAvailable {
                failures,
                manual_venues,
            } => {
                assert_eq!(failures.len(), 2);
                assert_eq!(failures[0].kind, VenueFailureKind::NoLiquidity);
                assert_eq!(failures[1].kind, VenueFailureKind::Unavailable);
                assert_eq!(manual_venues, vec!["https://manual.example".to_string()]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_registry_is_no_route() {
        let h = harness(vec![]).await;
        let err = h
            .aggregator
            .find_quote(&swap_request("10"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::NoRouteAvailable { ref failures, .. } if failures.is_empty()
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_venue_times_out_and_is_dead() {
        let slow = MockVenue::quoting("venue-a", "34.2").with_delay(Duration::from_secs(30));
        let fast = MockVenue::quoting("venue-b", "33");
        let h = harness(vec![(slow, 1), (fast, 2)]).await;

        let routed = h.aggregator.find_quote(&swap_request("10")).await.unwrap();
        assert_eq!(routed.quote.venue_id().as_str(), "venue-b");
        assert!(routed.skipped[0].reason.contains("timed out"));
        assert_eq!(
            h.liveness.latest(&VenueId::new("venue-a")).unwrap().liveness,
            VenueLiveness::Dead
        );
    }

    #[tokio::test]
    async fn dead_venue_is_skipped_during_cooldown() {
        let a = MockVenue::failing("venue-a", VenueError::connection("refused"));
        let b = MockVenue::quoting("venue-b", "33");
        let h = harness(vec![(a.clone(), 1), (b, 2)]).await;

        h.aggregator.find_quote(&swap_request("10")).await.unwrap();
        assert_eq!(a.quote_calls(), 1);

        let routed = h.aggregator.find_quote(&swap_request("10")).await.unwrap();
        assert_eq!(a.quote_calls(), 1);
        assert_eq!(routed.skipped[0].kind, VenueFailureKind::SkippedCoolingDown);

        h.clock.advance(Duration::from_secs(61));
        h.aggregator.find_quote(&swap_request("10")).await.unwrap();
        assert_eq!(a.quote_calls(), 2);
    }

    #[tokio::test]
    async fn malformed_quote_marks_venue_dead() {
        let wrong_pair = quote_for("venue-a", asset_y(), asset_x(), "34.2", t0().add_secs(30));
        let a = MockVenue::returning("venue-a", wrong_pair);
        let b = MockVenue::quoting("venue-b", "33");
        let h = harness(vec![(a, 1), (b, 2)]).await;

        let routed = h.aggregator.find_quote(&swap_request("10")).await.unwrap();
        assert_eq!(routed.quote.venue_id().as_str(), "venue-b");
        assert_eq!(routed.skipped[0].kind, VenueFailureKind::Unavailable);
        assert_eq!(
            h.liveness.latest(&VenueId::new("venue-a")).unwrap().liveness,
            VenueLiveness::Dead
        );
    }

    #[tokio::test]
    async fn quote_for_another_amount_marks_venue_dead() {
        let other_amount = quote_for("venue-a", asset_x(), asset_y(), "34.2", t0().add_secs(30));
        let a = MockVenue::returning("venue-a", other_amount);
        let b = MockVenue::quoting("venue-b", "33");
        let h = harness(vec![(a, 1), (b, 2)]).await;

        let routed = h.aggregator.find_quote(&swap_request("10")).await.unwrap();
        assert_eq!(routed.quote.venue_id().as_str(), "venue-b");
        assert_eq!(routed.skipped[0].kind, VenueFailureKind::Unavailable);
        assert!(routed.skipped[0].reason.contains("input"));
        assert_eq!(
            h.liveness.latest(&VenueId::new("venue-a")).unwrap().liveness,
            VenueLiveness::Dead
        );
    }

    #[tokio::test]
    async fn quote_with_looser_slippage_marks_venue_dead() {
        let loose = quote_for("venue-a", asset_x(), asset_y(), "34.2", t0().add_secs(30));
        let loose = crate::domain::entities::QuoteBuilder::new(
            loose.venue_id().clone(),
            loose.input_asset().clone(),
            loose.input_amount(),
            loose.output_asset().clone(),
            loose.estimated_output(),
            loose.expires_at(),
        )
        .slippage(SlippageBps::new(500).unwrap())
        .build()
        .unwrap();
        let a = MockVenue::returning("venue-a", loose);
        let h = harness(vec![(a, 1)]).await;

        let err = h
            .aggregator
            .find_quote(&swap_request("1.5"))
            .await
            .unwrap_err();
        match err {
            ApplicationError::NoRouteAvailable { failures, .. } => {
                assert_eq!(failures[0].kind, VenueFailureKind::Unavailable);
                assert!(failures[0].reason.contains("slippage"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn quote_only_venue_is_not_routed() {
        let registry = Arc::new(VenueRegistry::new());
        let a = MockVenue::quoting("venue-a", "34.2");
        registry
            .register_with_settings(
                a.clone(),
                VenueSettings::new().with_capabilities(
                    crate::domain::entities::VenueCapabilities::quote_only(),
                ),
            )
            .await;
        let aggregator = QuoteAggregator::new(
            registry,
            Arc::new(InMemoryLivenessStore::new()),
            Arc::new(ManualClock::new(t0())),
            AggregatorConfig::default(),
        );

        let err = aggregator
            .find_quote(&swap_request("10"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::NoRouteAvailable { .. }));
        assert_eq!(a.quote_calls(), 0);
    }

    #[tokio::test]
    async fn excessive_price_impact_counts_as_no_liquidity() {
        let impact = quote_for("venue-a", asset_x(), asset_y(), "34.2", t0().add_secs(30));
        let impact = crate::domain::entities::QuoteBuilder::new(
            impact.venue_id().clone(),
            impact.input_asset().clone(),
            impact.input_amount(),
            impact.output_asset().clone(),
            impact.estimated_output(),
            impact.expires_at(),
        )
        .price_impact_pct(Decimal::new(5, 0))
        .build()
        .unwrap();
        let a = MockVenue::returning("venue-a", impact);
        let h = harness(vec![(a, 1)]).await;

        let err = h
            .aggregator
            .find_quote(&swap_request("1.5"))
            .await
            .unwrap_err();
        assert_eq!(
            err.kind(),
            crate::domain::entities::FailureKind::NoRouteAvailable
        );
        assert_eq!(
            h.liveness.latest(&VenueId::new("venue-a")).unwrap().liveness,
            VenueLiveness::Degraded
        );
    }

    #[tokio::test]
    async fn liveness_summary_covers_registered_venues() {
        let a = MockVenue::failing("venue-a", VenueError::connection("refused"));
        let b = MockVenue::quoting("venue-b", "33");
        let h = harness(vec![(a, 1), (b, 2)]).await;
        h.aggregator.find_quote(&swap_request("10")).await.unwrap();

        let summary = h.aggregator.liveness_summary().await;
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].liveness, VenueLiveness::Dead);
        assert!(summary[0].retry_after.is_some());
        assert_eq!(summary[1].liveness, VenueLiveness::Live);
    }
}
