//! # Configuration
//!
//! Application configuration loading and management.
//!
//! # Configuration Sources
//!
//! Configuration is loaded in the following order (later sources override earlier):
//! 1. Default values
//! 2. Configuration file (if exists)
//! 3. Environment variables (prefixed with `SWAP_ENGINE_`)
//!
//! # Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `SWAP_ENGINE_CONFIG_FILE` | Path of the TOML file | `config.toml` |
//! | `SWAP_ENGINE_LOG_LEVEL` | Log level | `info` |
//! | `SWAP_ENGINE_LOG_FORMAT` | Log format (json/pretty) | `json` |
//! | `SWAP_ENGINE_QUOTE_TIMEOUT_MS` | Per-venue quote timeout | `6000` |
//! | `SWAP_ENGINE_CONFIRMATION_TIMEOUT_MS` | Confirmation budget | `45000` |
//! | `SWAP_ENGINE_RPC_URL` | JSON-RPC balance endpoint | unset |
//! | `SWAP_ENGINE_INDEXER_URL` | Indexer balance endpoint | unset |
//! | `SWAP_ENGINE_STAKING_APY` | Staking yield fraction | `0.07` |
//!
//! # Examples
//!
//! ```
//! use swap_engine::config::AppConfig;
//!
//! let config = AppConfig::parse(
//!     r#"
//!     [log]
//!     format = "pretty"
//!
//!     [[assets]]
//!     id = "So11111111111111111111111111111111111111112"
//!     symbol = "SOL"
//!     decimals = 9
//!     "#,
//! )
//! .unwrap();
//! assert_eq!(config.assets.len(), 1);
//! ```

use crate::application::services::balance_reconciliation::{
    MIN_RATE_LIMIT_WINDOW, ReconciliationConfig,
};
use crate::application::services::confirmation::ConfirmationPolicy;
use crate::application::services::quote_aggregator::AggregatorConfig;
use crate::application::services::venue_liveness::CooldownPolicy;
use crate::application::use_cases::staking::StakingConfig;
use crate::domain::entities::VenueCapabilities;
use crate::domain::value_objects::{Apy, Asset, AssetCatalog, AssetId, Clock, WalletAddress};
use crate::infrastructure::venues::http_venue::{HttpVenueAdapter, HttpVenueConfig};
use crate::infrastructure::venues::registry::{VenueRegistry, VenueSettings};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ops::RangeInclusive;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Allowed per-venue quote timeout.
pub const QUOTE_TIMEOUT_RANGE_MS: RangeInclusive<u64> = 5_000..=8_000;

/// Allowed confirmation budget.
pub const CONFIRMATION_TIMEOUT_RANGE_MS: RangeInclusive<u64> = 30_000..=60_000;

const ENV_PREFIX: &str = "SWAP_ENGINE_";

// ============================================================================
// Configuration Errors
// ============================================================================

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse configuration.
    #[error("failed to parse config: {0}")]
    Parse(String),

    /// Invalid configuration value.
    #[error("invalid config value for {field}: {message}")]
    InvalidValue {
        /// Field name.
        field: String,
        /// Error message.
        message: String,
    },
}

impl ConfigError {
    fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

// ============================================================================
// Logging Configuration
// ============================================================================

/// Log format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format (structured logging).
    #[default]
    Json,
    /// Pretty format (human-readable).
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include target (module path) in logs.
    #[serde(default = "default_true")]
    pub include_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::Json,
            include_target: true,
        }
    }
}

// ============================================================================
// Routing Configuration
// ============================================================================

/// Quote aggregation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatorSection {
    /// Per-venue quote timeout in milliseconds.
    #[serde(default = "default_quote_timeout_ms")]
    pub quote_timeout_ms: u64,

    /// Cool-down applied to unavailable venues.
    #[serde(default)]
    pub cooldown: CooldownPolicy,

    /// Venues suggested to the user when no route is found.
    #[serde(default)]
    pub manual_venues: Vec<String>,
}

impl Default for AggregatorSection {
    fn default() -> Self {
        Self {
            quote_timeout_ms: default_quote_timeout_ms(),
            cooldown: CooldownPolicy::default(),
            manual_venues: Vec::new(),
        }
    }
}

impl AggregatorSection {
    /// Converts into the aggregator's settings.
    #[must_use]
    pub fn aggregator_config(&self) -> AggregatorConfig {
        AggregatorConfig {
            quote_timeout: Duration::from_millis(self.quote_timeout_ms),
            cooldown: self.cooldown,
            manual_venues: self.manual_venues.clone(),
        }
    }
}

/// One HTTP venue endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueEndpointConfig {
    /// Venue identifier.
    pub id: String,

    /// Base URL of the venue API.
    pub base_url: String,

    /// Quote endpoint path.
    #[serde(default = "default_quote_path")]
    pub quote_path: String,

    /// Build endpoint path.
    #[serde(default = "default_build_path")]
    pub build_path: String,

    /// Status endpoint path.
    #[serde(default = "default_status_path")]
    pub status_path: String,

    /// Routing priority; lower is tried first.
    #[serde(default = "default_priority")]
    pub priority: u32,

    /// Whether the venue is routed to.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Capability flags.
    #[serde(default = "VenueCapabilities::full")]
    pub capabilities: VenueCapabilities,

    /// Per-call timeout in milliseconds.
    #[serde(default = "default_venue_timeout_ms")]
    pub timeout_ms: u64,

    /// Validity for quotes that carry no expiry, in seconds.
    #[serde(default = "default_quote_validity_secs")]
    pub quote_validity_secs: u64,

    /// Optional API key.
    #[serde(default)]
    pub api_key: Option<String>,
}

impl VenueEndpointConfig {
    /// Adapter configuration for this endpoint.
    #[must_use]
    pub fn http_config(&self) -> HttpVenueConfig {
        let config = HttpVenueConfig::new(self.id.clone(), self.base_url.clone())
            .with_quote_path(self.quote_path.clone())
            .with_build_path(self.build_path.clone())
            .with_status_path(self.status_path.clone())
            .with_timeout_ms(self.timeout_ms)
            .with_quote_validity_secs(self.quote_validity_secs);
        match &self.api_key {
            Some(key) => config.with_api_key(key.clone()),
            None => config,
        }
    }

    /// Registry settings for this endpoint.
    #[must_use]
    pub fn settings(&self) -> VenueSettings {
        VenueSettings::new()
            .with_enabled(self.enabled)
            .with_priority(self.priority)
            .with_capabilities(self.capabilities)
    }
}

// ============================================================================
// Balance and Staking Configuration
// ============================================================================

/// Balance reconciliation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationSection {
    /// Minimum seconds between passive reads of one balance.
    #[serde(default = "default_rate_limit_window_secs")]
    pub rate_limit_window_secs: u64,

    /// Seconds after which a snapshot is displayed as stale.
    #[serde(default = "default_snapshot_ttl_secs")]
    pub snapshot_ttl_secs: u64,

    /// Timeout for one read path call in milliseconds.
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,

    /// JSON-RPC endpoint, tried first.
    #[serde(default)]
    pub rpc_url: Option<String>,

    /// Indexer endpoint, tried second.
    #[serde(default)]
    pub indexer_url: Option<String>,
}

impl Default for ReconciliationSection {
    fn default() -> Self {
        Self {
            rate_limit_window_secs: default_rate_limit_window_secs(),
            snapshot_ttl_secs: default_snapshot_ttl_secs(),
            read_timeout_ms: default_read_timeout_ms(),
            rpc_url: None,
            indexer_url: None,
        }
    }
}

impl ReconciliationSection {
    /// Converts into the reconciliation service settings.
    #[must_use]
    pub fn reconciliation_config(&self) -> ReconciliationConfig {
        ReconciliationConfig {
            rate_limit_window: Duration::from_secs(self.rate_limit_window_secs),
            snapshot_ttl: Duration::from_secs(self.snapshot_ttl_secs),
            read_timeout: Duration::from_millis(self.read_timeout_ms),
        }
    }
}

/// Staking ledger settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StakingSection {
    /// Annual yield as a fraction (0.07 is 7%).
    #[serde(default = "default_apy")]
    pub apy: Decimal,

    /// Account that receives staked funds.
    #[serde(default = "default_stake_account")]
    pub stake_account: String,

    /// Id of the staked asset; must appear in `assets`.
    #[serde(default)]
    pub asset: Option<String>,
}

impl Default for StakingSection {
    fn default() -> Self {
        Self {
            apy: default_apy(),
            stake_account: default_stake_account(),
            asset: None,
        }
    }
}

/// One entry of the static asset table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetEntry {
    /// On-chain identifier (mint or contract address).
    pub id: String,
    /// Display symbol.
    pub symbol: String,
    /// Decimal precision.
    pub decimals: u8,
}

// ============================================================================
// Application Configuration
// ============================================================================

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Logging configuration.
    #[serde(default)]
    pub log: LogConfig,

    /// Quote aggregation configuration.
    #[serde(default)]
    pub aggregator: AggregatorSection,

    /// HTTP venues.
    #[serde(default)]
    pub venues: Vec<VenueEndpointConfig>,

    /// Confirmation polling.
    #[serde(default)]
    pub confirmation: ConfirmationPolicy,

    /// Balance reconciliation.
    #[serde(default)]
    pub reconciliation: ReconciliationSection,

    /// Staking ledger.
    #[serde(default)]
    pub staking: StakingSection,

    /// Static asset table.
    #[serde(default)]
    pub assets: Vec<AssetEntry>,
}

impl AppConfig {
    /// Loads configuration from the config file, if any, and environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let config_path = std::env::var(format!("{ENV_PREFIX}CONFIG_FILE"))
            .unwrap_or_else(|_| "config.toml".to_string());

        if Path::new(&config_path).exists() {
            config = Self::from_file(&config_path)?;
        }

        config.apply_overrides(|key| std::env::var(key).ok());

        Ok(config)
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parses TOML text.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` on malformed input.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Applies `SWAP_ENGINE_*` overrides read through `lookup`.
    ///
    /// Unparseable numeric values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(level) = var("LOG_LEVEL") {
            self.log.level = level;
        }
        if let Some(format) = var("LOG_FORMAT") {
            self.log.format = match format.to_lowercase().as_str() {
                "pretty" => LogFormat::Pretty,
                _ => LogFormat::Json,
            };
        }

        if let Some(ms) = var("QUOTE_TIMEOUT_MS")
            && let Ok(ms) = ms.parse()
        {
            self.aggregator.quote_timeout_ms = ms;
        }
        if let Some(ms) = var("CONFIRMATION_TIMEOUT_MS")
            && let Ok(ms) = ms.parse()
        {
            self.confirmation.total_timeout_ms = ms;
        }

        if let Some(url) = var("RPC_URL") {
            self.reconciliation.rpc_url = Some(url);
        }
        if let Some(url) = var("INDEXER_URL") {
            self.reconciliation.indexer_url = Some(url);
        }

        if let Some(apy) = var("STAKING_APY")
            && let Ok(apy) = apy.parse()
        {
            self.staking.apy = apy;
        }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns the first violated bound.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log.level.to_lowercase().as_str()) {
            return Err(ConfigError::invalid(
                "log.level",
                format!(
                    "invalid log level '{}', must be one of: {:?}",
                    self.log.level, valid_levels
                ),
            ));
        }

        if !QUOTE_TIMEOUT_RANGE_MS.contains(&self.aggregator.quote_timeout_ms) {
            return Err(ConfigError::invalid(
                "aggregator.quote_timeout_ms",
                format!(
                    "{} outside {:?}",
                    self.aggregator.quote_timeout_ms, QUOTE_TIMEOUT_RANGE_MS
                ),
            ));
        }
        let cooldown = &self.aggregator.cooldown;
        if cooldown.base_ms == 0 || cooldown.base_ms > cooldown.max_ms {
            return Err(ConfigError::invalid(
                "aggregator.cooldown",
                format!(
                    "base {} must be positive and not above max {}",
                    cooldown.base_ms, cooldown.max_ms
                ),
            ));
        }

        if !CONFIRMATION_TIMEOUT_RANGE_MS.contains(&self.confirmation.total_timeout_ms) {
            return Err(ConfigError::invalid(
                "confirmation.total_timeout_ms",
                format!(
                    "{} outside {:?}",
                    self.confirmation.total_timeout_ms, CONFIRMATION_TIMEOUT_RANGE_MS
                ),
            ));
        }
        if self.confirmation.backoff_multiplier < 1.0 {
            return Err(ConfigError::invalid(
                "confirmation.backoff_multiplier",
                "must be at least 1.0",
            ));
        }

        if Duration::from_secs(self.reconciliation.rate_limit_window_secs) < MIN_RATE_LIMIT_WINDOW
        {
            return Err(ConfigError::invalid(
                "reconciliation.rate_limit_window_secs",
                format!("must be at least {}", MIN_RATE_LIMIT_WINDOW.as_secs()),
            ));
        }

        Apy::new(self.staking.apy)
            .map_err(|e| ConfigError::invalid("staking.apy", e.to_string()))?;

        let catalog = self.asset_catalog()?;
        if let Some(id) = &self.staking.asset
            && catalog.get(&AssetId::new(id.clone())).is_none()
        {
            return Err(ConfigError::invalid(
                "staking.asset",
                format!("{id} is not in the asset table"),
            ));
        }

        let mut seen = HashSet::new();
        for venue in &self.venues {
            if !seen.insert(venue.id.as_str()) {
                return Err(ConfigError::invalid(
                    "venues.id",
                    format!("duplicate venue {}", venue.id),
                ));
            }
            if venue.base_url.trim().is_empty() {
                return Err(ConfigError::invalid(
                    format!("venues.{}.base_url", venue.id),
                    "must not be empty",
                ));
            }
            if venue.timeout_ms == 0 {
                return Err(ConfigError::invalid(
                    format!("venues.{}.timeout_ms", venue.id),
                    "must be positive",
                ));
            }
        }

        Ok(())
    }

    /// Builds the asset table.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for an invalid or duplicated asset.
    pub fn asset_catalog(&self) -> Result<AssetCatalog, ConfigError> {
        let mut seen = HashSet::new();
        let mut assets = Vec::with_capacity(self.assets.len());
        for entry in &self.assets {
            if !seen.insert(entry.id.as_str()) {
                return Err(ConfigError::invalid(
                    "assets.id",
                    format!("duplicate asset {}", entry.id),
                ));
            }
            let asset = Asset::new(entry.id.clone(), entry.symbol.clone(), entry.decimals)
                .map_err(|e| ConfigError::invalid(format!("assets.{}", entry.id), e.to_string()))?;
            assets.push(asset);
        }
        Ok(AssetCatalog::new(assets))
    }

    /// Staking ledger settings, if a staked asset is configured.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for a negative APY or an unknown
    /// asset.
    pub fn staking_config(&self) -> Result<Option<StakingConfig>, ConfigError> {
        let Some(id) = &self.staking.asset else {
            return Ok(None);
        };
        let asset = self
            .asset_catalog()?
            .get(&AssetId::new(id.clone()))
            .cloned()
            .ok_or_else(|| {
                ConfigError::invalid("staking.asset", format!("{id} is not in the asset table"))
            })?;
        let apy = Apy::new(self.staking.apy)
            .map_err(|e| ConfigError::invalid("staking.apy", e.to_string()))?;
        Ok(Some(StakingConfig {
            apy,
            stake_account: WalletAddress::new(self.staking.stake_account.clone()),
            asset,
        }))
    }

    /// Builds the venue registry from the configured endpoints.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if an adapter cannot be created.
    pub async fn venue_registry(
        &self,
        clock: Arc<dyn Clock>,
    ) -> Result<VenueRegistry, ConfigError> {
        let registry = VenueRegistry::new();
        for venue in &self.venues {
            let adapter = HttpVenueAdapter::new(venue.http_config(), Arc::clone(&clock))
                .map_err(|e| ConfigError::invalid(format!("venues.{}", venue.id), e.to_string()))?;
            registry
                .register_with_settings(Arc::new(adapter), venue.settings())
                .await;
        }
        Ok(registry)
    }
}

// ============================================================================
// Default Value Functions
// ============================================================================

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_quote_timeout_ms() -> u64 {
    6_000
}

fn default_quote_path() -> String {
    "/quote".to_string()
}

fn default_build_path() -> String {
    "/swap".to_string()
}

fn default_status_path() -> String {
    "/status".to_string()
}

fn default_priority() -> u32 {
    100
}

fn default_venue_timeout_ms() -> u64 {
    6_000
}

fn default_quote_validity_secs() -> u64 {
    30
}

fn default_rate_limit_window_secs() -> u64 {
    5
}

fn default_snapshot_ttl_secs() -> u64 {
    30
}

fn default_read_timeout_ms() -> u64 {
    10_000
}

fn default_apy() -> Decimal {
    Decimal::new(7, 2)
}

fn default_stake_account() -> String {
    "stake-vault".to_string()
}
