//! HTTP client for the location backend.
//!
//! Wraps `reqwest` with base-URL handling and typed response decoding for the
//! three endpoints the browser uses: the type catalog, location search and
//! single-location lookup. Non-2xx statuses surface as [`ApiError::Http`].

use std::time::Duration;

use poimap_core::{AppConfig, Location, LocationType};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::query::LocationQuery;
use crate::types::TypeCatalog;

const TYPES_PATH: &str = "types/";
const LOCATIONS_PATH: &str = "locations/";

/// Client for the location backend's REST API.
///
/// Use [`LocationApiClient::from_config`] in applications or
/// [`LocationApiClient::with_base_url`] to point at a mock server in tests.
#[derive(Debug, Clone)]
pub struct LocationApiClient {
    client: Client,
    base_url: Url,
}

impl LocationApiClient {
    /// Creates a client from loaded application configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Http`] if the underlying `reqwest::Client` cannot be
    /// constructed, or [`ApiError::InvalidBaseUrl`] if the configured base URL
    /// does not parse.
    pub fn from_config(config: &AppConfig) -> Result<Self, ApiError> {
        Self::with_base_url(
            &config.api_base_url,
            config.request_timeout_secs,
            &config.user_agent,
        )
    }

    /// Creates a client with an explicit base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Http`] if the underlying `reqwest::Client` cannot be
    /// constructed, or [`ApiError::InvalidBaseUrl`] if `base_url` is not a
    /// valid absolute URL.
    pub fn with_base_url(
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        // Exactly one trailing slash, so relative joins append to the path
        // instead of replacing its last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| ApiError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl {
                url: normalised,
                reason: "URL cannot be used as a base".to_string(),
            });
        }

        Ok(Self { client, base_url })
    }

    /// Fetches the full type catalog.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Http`] on network failure or non-2xx status.
    /// - [`ApiError::Deserialize`] if the body is not a catalog or one of its
    ///   keyed entries is not a type record.
    pub async fn fetch_types(&self) -> Result<Vec<LocationType>, ApiError> {
        let url = self.endpoint(TYPES_PATH)?;
        let context = url.to_string();
        let catalog: TypeCatalog = self.get_json(url).await?;
        catalog
            .into_types()
            .map_err(|e| ApiError::Deserialize { context, source: e })
    }

    /// Runs a location search.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Http`] on network failure or non-2xx status.
    /// - [`ApiError::Deserialize`] if the body is not a list of locations.
    pub async fn search_locations(&self, query: &LocationQuery) -> Result<Vec<Location>, ApiError> {
        let url = self.search_url(query)?;
        self.get_json(url).await
    }

    /// Fetches one location by id.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Http`] on network failure or non-2xx status (including 404).
    /// - [`ApiError::Deserialize`] if the body is not a location.
    pub async fn fetch_location(&self, id: i64) -> Result<Location, ApiError> {
        let url = self.endpoint(&format!("{LOCATIONS_PATH}{id}/"))?;
        self.get_json(url).await
    }

    /// Base URL the client resolves endpoints against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::InvalidBaseUrl {
                url: format!("{}{path}", self.base_url),
                reason: e.to_string(),
            })
    }

    /// Builds the search URL, leaving off the `?` entirely when there are no
    /// query pairs.
    fn search_url(&self, query: &LocationQuery) -> Result<Url, ApiError> {
        let mut url = self.endpoint(LOCATIONS_PATH)?;
        let pairs = query.pairs();
        if !pairs.is_empty() {
            let mut serializer = url.query_pairs_mut();
            for (k, v) in &pairs {
                serializer.append_pair(k, v);
            }
        }
        Ok(url)
    }

    /// Sends a GET request, asserts a 2xx status, and decodes the JSON body.
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        tracing::debug!(url = %url, "GET");
        let response = self.client.get(url.clone()).send().await?;
        let response = response.error_for_status()?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Deserialize {
            context: url.to_string(),
            source: e,
        })
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
