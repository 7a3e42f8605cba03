//! # HTTP Client
//!
//! Thin JSON wrapper over `reqwest` shared by venue adapters and balance
//! read paths.
//!
//! Transport failures map onto [`VenueError`]: timeouts to `Timeout`,
//! connect failures to `Connection`, non-2xx responses to `Rejected` and
//! undecodable bodies to `ProtocolError`.

use super::error::{VenueError, VenueResult};
use reqwest::header::HeaderMap;
use reqwest::{Client, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// JSON HTTP client with a fixed per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    timeout_ms: u64,
}

impl HttpClient {
    /// Creates a client with the given timeout.
    ///
    /// # Errors
    ///
    /// Returns `VenueError::InternalError` if the client cannot be built.
    pub fn new(timeout_ms: u64) -> VenueResult<Self> {
        Self::with_headers(timeout_ms, HeaderMap::new())
    }

    /// Creates a client that sends `headers` on every request.
    ///
    /// # Errors
    ///
    /// Returns `VenueError::InternalError` if the client cannot be built.
    pub fn with_headers(timeout_ms: u64, headers: HeaderMap) -> VenueResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .default_headers(headers)
            .build()
            .map_err(|e| VenueError::internal_error(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, timeout_ms })
    }

    /// Returns the per-request timeout in milliseconds.
    #[inline]
    #[must_use]
    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    /// GETs `url` and decodes the JSON body.
    ///
    /// # Errors
    ///
    /// See the module documentation for the error mapping.
    pub async fn get<T: DeserializeOwned>(&self, url: &str) -> VenueResult<T> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        self.decode(response).await
    }

    /// GETs `url` with query parameters and decodes the JSON body.
    ///
    /// # Errors
    ///
    /// See the module documentation for the error mapping.
    pub async fn get_with_params<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> VenueResult<T> {
        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        self.decode(response).await
    }

    /// POSTs a JSON body and decodes the JSON response.
    ///
    /// # Errors
    ///
    /// See the module documentation for the error mapping.
    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> VenueResult<T> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        self.decode(response).await
    }

    fn map_send_error(&self, err: reqwest::Error) -> VenueError {
        if err.is_timeout() {
            VenueError::timeout_with_duration(err.to_string(), self.timeout_ms)
        } else {
            VenueError::connection(err.to_string())
        }
    }

    async fn decode<T: DeserializeOwned>(&self, response: Response) -> VenueResult<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VenueError::rejected(status.as_u16(), body));
        }

        response.json::<T>().await.map_err(|e| {
            if e.is_timeout() {
                VenueError::timeout_with_duration(e.to_string(), self.timeout_ms)
            } else {
                VenueError::protocol_error(format!("invalid response body: {e}"))
            }
        })
    }
}
