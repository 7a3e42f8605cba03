//! # HTTP Venue Adapter
//!
//! Generic adapter for venues exposing the quote / build / status HTTP
//! contract.
//!
//! # Wire Contract
//!
//! - `GET {base}{quote_path}?inputAsset=..&outputAsset=..&amount=..&slippageBps=..`
//!   where `amount` is in input base units. Answers
//!   `{"outAmount": "<base units>", "priceImpactPct": "0.1", "expiresInSecs": 30, "payload": {..}}`.
//!   404 and 422 mean the venue has no route.
//! - `POST {base}{build_path}` with `{"payload", "userPublicKey", "slippageBps"}`.
//!   Answers `{"transaction": "<encoded>", "lastValidAtSecs": 1700000000}`.
//!   410 means the quote went stale.
//! - `GET {base}{status_path}/{tx_id}` answers `{"status": "pending" | "confirmed" | "failed"}`.
//!
//! # Examples
//!
//! ```
//! use swap_engine::infrastructure::venues::http_venue::HttpVenueConfig;
//!
//! let config = HttpVenueConfig::new("jup", "https://quote-api.example.com")
//!     .with_timeout_ms(6000)
//!     .with_quote_validity_secs(20);
//! assert_eq!(config.quote_url(), "https://quote-api.example.com/quote");
//! ```

use crate::domain::entities::{
    Quote, QuoteBuilder, SwapRequest, TxStatus, UnsignedTransaction, VenuePayload,
};
use crate::domain::value_objects::{Clock, Timestamp, TxId, VenueId};
use crate::infrastructure::venues::error::{VenueError, VenueResult};
use crate::infrastructure::venues::http_client::HttpClient;
use crate::infrastructure::venues::traits::VenueAdapter;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Default timeout in milliseconds.
const DEFAULT_TIMEOUT_MS: u64 = 6000;

/// Default quote validity in seconds when the venue does not say.
const DEFAULT_QUOTE_VALIDITY_SECS: u64 = 30;

/// Configuration for an [`HttpVenueAdapter`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpVenueConfig {
    venue_id: VenueId,
    base_url: String,
    quote_path: String,
    build_path: String,
    status_path: String,
    timeout_ms: u64,
    quote_validity_secs: u64,
    api_key: Option<String>,
}

impl HttpVenueConfig {
    /// Creates a configuration with the default paths `/quote`, `/swap`
    /// and `/status`.
    #[must_use]
    pub fn new(venue_id: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            venue_id: VenueId::new(venue_id),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            quote_path: "/quote".to_string(),
            build_path: "/swap".to_string(),
            status_path: "/status".to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            quote_validity_secs: DEFAULT_QUOTE_VALIDITY_SECS,
            api_key: None,
        }
    }

    /// Sets the quote endpoint path.
    #[must_use]
    pub fn with_quote_path(mut self, path: impl Into<String>) -> Self {
        self.quote_path = path.into();
        self
    }

    /// Sets the build endpoint path.
    #[must_use]
    pub fn with_build_path(mut self, path: impl Into<String>) -> Self {
        self.build_path = path.into();
        self
    }

    /// Sets the status endpoint path.
    #[must_use]
    pub fn with_status_path(mut self, path: impl Into<String>) -> Self {
        self.status_path = path.into();
        self
    }

    /// Sets the per-call timeout in milliseconds.
    #[must_use]
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Sets the validity applied to quotes without an explicit expiry.
    #[must_use]
    pub fn with_quote_validity_secs(mut self, secs: u64) -> Self {
        self.quote_validity_secs = secs;
        self
    }

    /// Sets the API key sent as `x-api-key`.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Returns the venue ID.
    #[inline]
    #[must_use]
    pub fn venue_id(&self) -> &VenueId {
        &self.venue_id
    }

    /// Returns the timeout in milliseconds.
    #[inline]
    #[must_use]
    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    /// Returns the default quote validity in seconds.
    #[inline]
    #[must_use]
    pub fn quote_validity_secs(&self) -> u64 {
        self.quote_validity_secs
    }

    /// Full quote URL.
    #[must_use]
    pub fn quote_url(&self) -> String {
        format!("{}{}", self.base_url, self.quote_path)
    }

    /// Full build URL.
    #[must_use]
    pub fn build_url(&self) -> String {
        format!("{}{}", self.base_url, self.build_path)
    }

    /// Full status URL for a transaction.
    #[must_use]
    pub fn status_url(&self, tx_id: &TxId) -> String {
        format!("{}{}/{}", self.base_url, self.status_path, tx_id)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteResponse {
    out_amount: String,
    #[serde(default)]
    price_impact_pct: Option<String>,
    #[serde(default)]
    expires_in_secs: Option<u64>,
    #[serde(default)]
    payload: serde_json::Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BuildRequest<'a> {
    payload: &'a serde_json::Value,
    user_public_key: &'a str,
    slippage_bps: u16,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BuildResponse {
    transaction: String,
    #[serde(default)]
    last_valid_at_secs: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum WireStatus {
    Pending,
    Confirmed,
    Failed,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: WireStatus,
}

impl From<WireStatus> for TxStatus {
    fn from(status: WireStatus) -> Self {
        match status {
            WireStatus::Pending => Self::Pending,
            WireStatus::Confirmed => Self::Confirmed,
            WireStatus::Failed => Self::Failed,
        }
    }
}

/// Venue adapter speaking the generic HTTP contract.
pub struct HttpVenueAdapter {
    config: HttpVenueConfig,
    http_client: HttpClient,
    clock: Arc<dyn Clock>,
}

impl HttpVenueAdapter {
    /// Creates an adapter.
    ///
    /// # Errors
    ///
    /// Returns `VenueError::InternalError` if the API key is not a valid
    /// header value or the HTTP client cannot be built.
    pub fn new(config: HttpVenueConfig, clock: Arc<dyn Clock>) -> VenueResult<Self> {
        let mut headers = HeaderMap::new();
        if let Some(key) = &config.api_key {
            let value = HeaderValue::from_str(key)
                .map_err(|_| VenueError::internal_error("invalid API key format"))?;
            headers.insert("x-api-key", value);
        }
        let http_client = HttpClient::with_headers(config.timeout_ms, headers)?;
        Ok(Self {
            config,
            http_client,
            clock,
        })
    }

    /// Returns the configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &HttpVenueConfig {
        &self.config
    }

    fn parse_quote(&self, request: &SwapRequest, response: QuoteResponse) -> VenueResult<Quote> {
        let input_amount = request
            .validated_input()
            .map_err(|e| VenueError::invalid_request(e.to_string()))?;

        let units: u128 = response.out_amount.trim().parse().map_err(|_| {
            VenueError::protocol_error(format!("malformed outAmount {:?}", response.out_amount))
        })?;
        if units == 0 {
            return Err(VenueError::protocol_error("venue quoted zero output"));
        }
        let estimated_output = request
            .output_asset
            .from_base_units(units)
            .map_err(|e| VenueError::protocol_error(e.to_string()))?;

        let price_impact_pct = match response.price_impact_pct.as_deref() {
            Some(raw) => raw.trim().parse::<Decimal>().map_err(|_| {
                VenueError::protocol_error(format!("malformed priceImpactPct {raw:?}"))
            })?,
            None => Decimal::ZERO,
        };

        if response.payload.is_null() {
            return Err(VenueError::protocol_error("quote carries no payload"));
        }

        let now = self.clock.now();
        let validity = response
            .expires_in_secs
            .unwrap_or(self.config.quote_validity_secs);
        let expires_at = now.add_secs(i64::try_from(validity).unwrap_or(i64::MAX));

        QuoteBuilder::new(
            self.config.venue_id.clone(),
            request.input_asset.clone(),
            input_amount,
            request.output_asset.clone(),
            estimated_output,
            expires_at,
        )
        .price_impact_pct(price_impact_pct)
        .slippage(request.max_slippage)
        .payload(VenuePayload::new(response.payload))
        .created_at(now)
        .build()
        .map_err(|e| VenueError::protocol_error(e.to_string()))
    }
}

impl fmt::Debug for HttpVenueAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpVenueAdapter")
            .field("venue_id", &self.config.venue_id)
            .field("base_url", &self.config.base_url)
            .field("timeout_ms", &self.config.timeout_ms)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl VenueAdapter for HttpVenueAdapter {
    fn venue_id(&self) -> &VenueId {
        &self.config.venue_id
    }

    fn timeout_ms(&self) -> u64 {
        self.config.timeout_ms
    }

    async fn quote(&self, request: &SwapRequest) -> VenueResult<Quote> {
        let input = request
            .validated_input()
            .map_err(|e| VenueError::invalid_request(e.to_string()))?;
        let amount = request
            .input_asset
            .to_base_units(input)
            .map_err(|e| VenueError::invalid_request(e.to_string()))?
            .to_string();
        let slippage = u16::from(request.max_slippage).to_string();

        let params = [
            ("inputAsset", request.input_asset.id().as_str()),
            ("outputAsset", request.output_asset.id().as_str()),
            ("amount", amount.as_str()),
            ("slippageBps", slippage.as_str()),
        ];

        debug!(venue = %self.config.venue_id, %amount, "requesting quote");
        let response: QuoteResponse = self
            .http_client
            .get_with_params(&self.config.quote_url(), &params)
            .await
            .map_err(|e| match e {
                VenueError::Rejected {
                    status: 404 | 422,
                    message,
                } => {
                    VenueError::no_liquidity(message)
                }
                other => other,
            })?;

        self.parse_quote(request, response)
    }

    async fn build_transaction(
        &self,
        quote: &Quote,
        request: &SwapRequest,
    ) -> VenueResult<UnsignedTransaction> {
        let body = BuildRequest {
            payload: quote.payload().as_json(),
            user_public_key: request.requester.as_str(),
            slippage_bps: u16::from(quote.slippage()),
        };

        let response: BuildResponse = self
            .http_client
            .post(&self.config.build_url(), &body)
            .await
            .map_err(|e| match e {
                VenueError::Rejected {
                    status: 410,
                    message,
                } => VenueError::quote_expired(message),
                other => other,
            })?;

        if response.transaction.trim().is_empty() {
            return Err(VenueError::protocol_error(
                "venue built an empty transaction",
            ));
        }

        let mut tx = UnsignedTransaction::new(response.transaction)
            .with_builder(self.config.venue_id.clone());
        if let Some(secs) = response.last_valid_at_secs
            && let Some(at) = secs.checked_mul(1000).and_then(Timestamp::from_millis)
        {
            tx = tx.with_last_valid_at(at);
        }
        Ok(tx)
    }

    async fn verify(&self, tx_id: &TxId) -> VenueResult<TxStatus> {
        let response: StatusResponse = self
            .http_client
            .get(&self.config.status_url(tx_id))
            .await?;
        Ok(response.status.into())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn config_builds_urls() {
        let config = HttpVenueConfig::new("venue-a", "http://localhost:8080/")
            .with_quote_path("/v6/quote")
            .with_build_path("/v6/swap")
            .with_status_path("/v6/tx");

        assert_eq!(config.quote_url(), "http://localhost:8080/v6/quote");
        assert_eq!(config.build_url(), "http://localhost:8080/v6/swap");
        assert_eq!(
            config.status_url(&TxId::new("abc")),
            "http://localhost:8080/v6/tx/abc"
        );
    }

    #[test]
    fn config_defaults() {
        let config = HttpVenueConfig::new("venue-a", "http://localhost");
        assert_eq!(config.timeout_ms(), DEFAULT_TIMEOUT_MS);
        assert_eq!(config.quote_validity_secs(), DEFAULT_QUOTE_VALIDITY_SECS);
        assert_eq!(config.venue_id().as_str(), "venue-a");
    }

    #[test]
    fn wire_status_maps() {
        let parsed: StatusResponse = serde_json::from_str(r#"{"status":"confirmed"}"#).unwrap();
        assert_eq!(TxStatus::from(parsed.status), TxStatus::Confirmed);
        let dropped = serde_json::from_str::<StatusResponse>(r#"{"status":"dropped"}"#);
        assert!(dropped.is_err());
    }
}
