//! # Indexer Balance Read Path
//!
//! Reads token balances from a REST indexer:
//! `GET {base}/balances/{owner}/{asset}` answering
//! `{"owner": "..", "asset": "..", "balance": "1.5"}` in display units.
//! Owner and asset ids are percent-encoded as path segments.

use super::read_error;
use crate::application::services::balance_reconciliation::{BalanceReadPath, ReadPathError};
use crate::domain::value_objects::{Amount, Asset, WalletAddress};
use crate::infrastructure::venues::error::{VenueError, VenueResult};
use crate::infrastructure::venues::http_client::HttpClient;
use async_trait::async_trait;
use reqwest::Url;
use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct IndexerBalance {
    asset: String,
    balance: String,
}

/// REST indexer balance read path.
#[derive(Debug)]
pub struct IndexerBalanceReadPath {
    name: String,
    base_url: Url,
    http_client: HttpClient,
}

impl IndexerBalanceReadPath {
    /// Creates a read path against `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `VenueError::InternalError` if `base_url` is not an absolute
    /// URL or the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout_ms: u64) -> VenueResult<Self> {
        let base_url = base_url.into();
        let parsed = Url::parse(&base_url).map_err(|e| {
            VenueError::internal_error(format!("invalid indexer url {base_url:?}: {e}"))
        })?;
        if parsed.cannot_be_a_base() {
            return Err(VenueError::internal_error(format!(
                "indexer url {base_url:?} cannot carry a path"
            )));
        }
        Ok(Self {
            name: "indexer".to_string(),
            base_url: parsed,
            http_client: HttpClient::new(timeout_ms)?,
        })
    }

    /// Overrides the name recorded as snapshot source.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    fn balance_url(&self, owner: &WalletAddress, asset: &Asset) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["balances", owner.as_str(), asset.id().as_str()]);
        }
        url
    }
}

#[async_trait]
impl BalanceReadPath for IndexerBalanceReadPath {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read_balance(
        &self,
        owner: &WalletAddress,
        asset: &Asset,
    ) -> Result<Amount, ReadPathError> {
        let body: IndexerBalance = self
            .http_client
            .get(self.balance_url(owner, asset).as_str())
            .await
            .map_err(read_error)?;

        if body.asset != asset.id().as_str() {
            return Err(ReadPathError::Malformed(format!(
                "asked for {}, indexer answered {}",
                asset.id(),
                body.asset
            )));
        }

        let value: Decimal = body.balance.trim().parse().map_err(|_| {
            ReadPathError::Malformed(format!("balance {:?} is not a decimal", body.balance))
        })?;
        Amount::new(value).map_err(|e| ReadPathError::Malformed(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn path_segments_are_encoded() {
        let indexer = IndexerBalanceReadPath::new("https://indexer.example/v1/", 1000).unwrap();
        let asset = Asset::new("mint/x?y", "X", 6).unwrap();
        let url = indexer.balance_url(&WalletAddress::new("owner 1#a"), &asset);

        assert_eq!(
            url.as_str(),
            "https://indexer.example/v1/balances/owner%201%23a/mint%2Fx%3Fy"
        );
    }

    #[test]
    fn base_without_trailing_slash_keeps_its_path() {
        let indexer = IndexerBalanceReadPath::new("https://indexer.example/v1", 1000).unwrap();
        let asset = Asset::new("mint-x", "X", 6).unwrap();
        let url = indexer.balance_url(&WalletAddress::new("owner-1"), &asset);

        assert_eq!(
            url.as_str(),
            "https://indexer.example/v1/balances/owner-1/mint-x"
        );
    }

    #[test]
    fn rejects_unusable_base() {
        assert!(IndexerBalanceReadPath::new("not a url", 1000).is_err());
        let mailto = IndexerBalanceReadPath::new("mailto:ops@example.com", 1000);
        assert!(mailto.is_err());
    }
}
