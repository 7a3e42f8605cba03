//! # Balance Reconciliation
//!
//! Authoritative balance reads through an ordered list of read paths.
//!
//! Each read tries the paths in order and returns the first success as a
//! whole snapshot. When every path fails the caller gets `ReadFailure` with
//! one reason per path; no default or cached value is substituted.
//!
//! Passive reads per (owner, asset) are rate limited. Inside the window the
//! outcome of the last attempt is returned as-is, including a failure.
//! Forced reads (explicit refresh, post-trade reconciliation, pre-stake
//! checks) always go to the read paths. Remembered outcomes are evicted once
//! they are older than both the window and the snapshot TTL.

use crate::application::error::{ApplicationError, ApplicationResult, ReadPathFailure};
use crate::domain::entities::{BalanceReading, BalanceSnapshot, BalanceView};
use crate::domain::value_objects::{Amount, Asset, AssetId, Clock, Timestamp, WalletAddress};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, instrument, warn};

/// Minimum rate-limit window.
pub const MIN_RATE_LIMIT_WINDOW: Duration = Duration::from_secs(5);

/// Read path failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadPathError {
    /// The path could not be reached or returned an error.
    #[error("unavailable: {0}")]
    Unavailable(String),
    /// The path answered with something that is not a balance.
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// One way of reading an on-chain balance.
#[async_trait]
pub trait BalanceReadPath: Send + Sync + fmt::Debug {
    /// Name recorded as the snapshot source.
    fn name(&self) -> &str;

    /// Reads the full balance of `asset` held by `owner`.
    ///
    /// # Errors
    ///
    /// Any [`ReadPathError`]; the next path is tried.
    async fn read_balance(
        &self,
        owner: &WalletAddress,
        asset: &Asset,
    ) -> Result<Amount, ReadPathError>;
}

/// Reconciliation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationConfig {
    /// Minimum time between passive reads of one (owner, asset).
    pub rate_limit_window: Duration,
    /// Age after which a snapshot is flagged stale.
    pub snapshot_ttl: Duration,
    /// Upper bound for one read path call.
    pub read_timeout: Duration,
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            rate_limit_window: MIN_RATE_LIMIT_WINDOW,
            snapshot_ttl: Duration::from_secs(30),
            read_timeout: Duration::from_secs(10),
        }
    }
}

/// Decides whether a read may hit the read paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    window: Duration,
}

impl RateLimitPolicy {
    /// Creates a policy; windows below the minimum are raised to it.
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window: window.max(MIN_RATE_LIMIT_WINDOW),
        }
    }

    /// Returns the effective window.
    #[inline]
    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Returns true if a read should be performed now.
    #[must_use]
    pub fn should_read(
        &self,
        last_attempt: Option<Timestamp>,
        now: Timestamp,
        forced: bool,
    ) -> bool {
        if forced {
            return true;
        }
        match last_attempt {
            None => true,
            Some(last) => now.duration_since(&last) >= self.window,
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    attempted_at: Timestamp,
    outcome: Result<BalanceSnapshot, Vec<ReadPathFailure>>,
}

/// Balance reconciliation service.
#[derive(Debug)]
pub struct BalanceReconciliationService {
    read_paths: Vec<Arc<dyn BalanceReadPath>>,
    clock: Arc<dyn Clock>,
    config: ReconciliationConfig,
    rate_limit: RateLimitPolicy,
    cache: Mutex<HashMap<(WalletAddress, AssetId), CacheEntry>>,
}

impl BalanceReconciliationService {
    /// Creates a service over read paths tried in the given order.
    #[must_use]
    pub fn new(
        read_paths: Vec<Arc<dyn BalanceReadPath>>,
        clock: Arc<dyn Clock>,
        config: ReconciliationConfig,
    ) -> Self {
        Self {
            read_paths,
            clock,
            rate_limit: RateLimitPolicy::new(config.rate_limit_window),
            config,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ReconciliationConfig {
        &self.config
    }

    /// Passive, rate-limited read.
    ///
    /// # Errors
    ///
    /// `ReadFailure` if every read path failed on the latest attempt.
    pub async fn get_balance(
        &self,
        owner: &WalletAddress,
        asset: &Asset,
    ) -> ApplicationResult<BalanceSnapshot> {
        self.read(owner, asset, false).await
    }

    /// Forced read for an explicit user action.
    ///
    /// # Errors
    ///
    /// `ReadFailure` if every read path failed.
    pub async fn refresh(
        &self,
        owner: &WalletAddress,
        asset: &Asset,
    ) -> ApplicationResult<BalanceSnapshot> {
        self.read(owner, asset, true).await
    }

    /// Passive read with a staleness flag for display.
    ///
    /// # Errors
    ///
    /// `ReadFailure` as for [`get_balance`](Self::get_balance).
    pub async fn view(
        &self,
        owner: &WalletAddress,
        asset: &Asset,
    ) -> ApplicationResult<BalanceView> {
        let snapshot = self.get_balance(owner, asset).await?;
        let is_stale = snapshot.is_stale_at(self.clock.now(), self.config.snapshot_ttl);
        Ok(BalanceView { snapshot, is_stale })
    }

    /// Forced read of every asset, once each, after a state-changing
    /// operation. Failures become [`BalanceReading::Unknown`].
    #[instrument(skip_all, fields(owner = %owner, assets = assets.len()))]
    pub async fn reconcile(&self, owner: &WalletAddress, assets: &[&Asset]) -> Vec<BalanceReading> {
        let mut readings = Vec::with_capacity(assets.len());
        for asset in assets {
            match self.read(owner, asset, true).await {
                Ok(snapshot) => readings.push(BalanceReading::Known(snapshot)),
                Err(e) => readings.push(BalanceReading::Unknown {
                    owner: owner.clone(),
                    asset: asset.id().clone(),
                    reason: e.to_string(),
                }),
            }
        }
        readings
    }

    async fn read(
        &self,
        owner: &WalletAddress,
        asset: &Asset,
        forced: bool,
    ) -> ApplicationResult<BalanceSnapshot> {
        let key = (owner.clone(), asset.id().clone());
        let now = self.clock.now();

        let cached = self.cache_get(&key);
        if !self
            .rate_limit
            .should_read(cached.as_ref().map(|c| c.attempted_at), now, forced)
            && let Some(entry) = cached
        {
            debug!(owner = %owner, asset = %asset.id(), "balance read rate limited");
            return entry
                .outcome
                .map_err(|failures| read_failure(owner, asset, failures));
        }

        let outcome = self.read_through(owner, asset).await;
        self.cache_put(
            key,
            CacheEntry {
                attempted_at: now,
                outcome: outcome.clone(),
            },
            self.clock.now(),
        );
        outcome.map_err(|failures| read_failure(owner, asset, failures))
    }

    async fn read_through(
        &self,
        owner: &WalletAddress,
        asset: &Asset,
    ) -> Result<BalanceSnapshot, Vec<ReadPathFailure>> {
        let mut failures = Vec::new();

        for path in &self.read_paths {
            let read = path.read_balance(owner, asset);
            let result = match timeout(self.config.read_timeout, read).await {
                Ok(result) => result,
                Err(_) => Err(ReadPathError::Unavailable(format!(
                    "timed out after {}ms",
                    self.config.read_timeout.as_millis()
                ))),
            };

            match result {
                Ok(amount) => {
                    debug!(
                        owner = %owner,
                        asset = %asset.id(),
                        path = path.name(),
                        %amount,
                        "balance read"
                    );
                    return Ok(BalanceSnapshot {
                        owner: owner.clone(),
                        asset: asset.id().clone(),
                        amount,
                        as_of: self.clock.now(),
                        source: path.name().to_string(),
                    });
                }
                Err(e) => {
                    warn!(
                        owner = %owner,
                        asset = %asset.id(),
                        path = path.name(),
                        error = %e,
                        "read path failed"
                    );
                    failures.push(ReadPathFailure {
                        path: path.name().to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        Err(failures)
    }

    fn cache_get(&self, key: &(WalletAddress, AssetId)) -> Option<CacheEntry> {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn cache_put(&self, key: (WalletAddress, AssetId), entry: CacheEntry, now: Timestamp) {
        let retention = self.rate_limit.window().max(self.config.snapshot_ttl);
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        cache.retain(|_, kept| now.duration_since(&kept.attempted_at) < retention);
        cache.insert(key, entry);
    }

    /// Number of (owner, asset) outcomes currently remembered.
    #[must_use]
    pub fn cached_entries(&self) -> usize {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

fn read_failure(
    owner: &WalletAddress,
    asset: &Asset,
    failures: Vec<ReadPathFailure>,
) -> ApplicationError {
    ApplicationError::ReadFailure {
        owner: owner.clone(),
        asset: asset.id().clone(),
        failures,
    }
}
