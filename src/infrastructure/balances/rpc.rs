//! # RPC Balance Read Path
//!
//! Reads token balances from a node over JSON-RPC 2.0.
//!
//! Request: `{"jsonrpc":"2.0","id":1,"method":"getTokenBalance","params":[owner, asset]}`.
//! Response: `{"jsonrpc":"2.0","id":1,"result":{"amount":"1500000","decimals":6}}`
//! with `amount` in base units. A `result` whose decimals disagree with the
//! configured asset is rejected.

use super::read_error;
use crate::application::services::balance_reconciliation::{BalanceReadPath, ReadPathError};
use crate::domain::value_objects::{Amount, Asset, WalletAddress};
use crate::infrastructure::venues::error::VenueResult;
use crate::infrastructure::venues::http_client::HttpClient;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

const METHOD: &str = "getTokenBalance";

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'static str,
    params: [&'a str; 2],
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<TokenBalance>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct TokenBalance {
    amount: String,
    decimals: u8,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

/// JSON-RPC balance read path.
#[derive(Debug)]
pub struct RpcBalanceReadPath {
    name: String,
    url: String,
    http_client: HttpClient,
    next_id: AtomicU64,
}

impl RpcBalanceReadPath {
    /// Creates a read path against `url`.
    ///
    /// # Errors
    ///
    /// Returns `VenueError::InternalError` if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>, timeout_ms: u64) -> VenueResult<Self> {
        Ok(Self {
            name: "rpc".to_string(),
            url: url.into(),
            http_client: HttpClient::new(timeout_ms)?,
            next_id: AtomicU64::new(1),
        })
    }

    /// Overrides the name recorded as snapshot source.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

#[async_trait]
impl BalanceReadPath for RpcBalanceReadPath {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read_balance(
        &self,
        owner: &WalletAddress,
        asset: &Asset,
    ) -> Result<Amount, ReadPathError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method: METHOD,
            params: [owner.as_str(), asset.id().as_str()],
        };

        let response: RpcResponse = self
            .http_client
            .post(&self.url, &request)
            .await
            .map_err(read_error)?;

        if let Some(err) = response.error {
            return Err(ReadPathError::Unavailable(format!(
                "rpc error {}: {}",
                err.code, err.message
            )));
        }
        let balance = response
            .result
            .ok_or_else(|| ReadPathError::Malformed("missing result".to_string()))?;

        if balance.decimals != asset.decimals() {
            return Err(ReadPathError::Malformed(format!(
                "{} has {} decimals, node reported {}",
                asset,
                asset.decimals(),
                balance.decimals
            )));
        }

        let units: u128 = balance.amount.trim().parse().map_err(|_| {
            ReadPathError::Malformed(format!("amount {:?} is not an integer", balance.amount))
        })?;
        asset
            .from_base_units(units)
            .map_err(|e| ReadPathError::Malformed(e.to_string()))
    }
}
