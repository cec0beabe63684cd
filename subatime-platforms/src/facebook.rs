//! Facebook Graph API client and strategy.

use async_trait::async_trait;
use subatime_core::{PlatformKind, SampleSource};
use subatime_fetch::{AcquisitionStrategy, FetchError};
use tracing::instrument;

use crate::graph::{self, GRAPH_API_BASE};

// ============================================================================
// API Client
// ============================================================================

/// Facebook Graph API client (pages expose `fan_count`).
#[derive(Debug, Clone)]
pub struct FacebookApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl FacebookApiClient {
    /// Creates a client pointed at the production Graph API.
    pub fn new() -> Self {
        Self::with_base_url(GRAPH_API_BASE)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built, which indicates a broken
    /// TLS configuration and is unrecoverable.
    pub fn with_base_url(base_url: &str) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetches the fan count for a Facebook page.
    #[instrument(skip(self, access_token))]
    pub async fn fetch_fan_count(
        &self,
        access_token: &str,
        page_id: &str,
    ) -> Result<u64, FetchError> {
        if access_token.is_empty() {
            return Err(FetchError::Auth(
                "Facebook access token is missing".to_string(),
            ));
        }
        if page_id.is_empty() {
            return Err(FetchError::ConfigIncomplete(
                "Facebook page id is missing".to_string(),
            ));
        }

        graph::fetch_count_field(&self.http, &self.base_url, page_id, "fan_count", access_token)
            .await
    }
}

impl Default for FacebookApiClient {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Strategy
// ============================================================================

/// API-backed acquisition strategy for Facebook.
pub struct FacebookApiStrategy {
    client: FacebookApiClient,
    access_token: String,
    page_id: String,
}

impl FacebookApiStrategy {
    /// Creates the strategy from validated configuration fields.
    pub fn new(access_token: impl Into<String>, page_id: impl Into<String>) -> Self {
        Self {
            client: FacebookApiClient::new(),
            access_token: access_token.into(),
            page_id: page_id.into(),
        }
    }
}

#[async_trait]
impl AcquisitionStrategy for FacebookApiStrategy {
    fn platform(&self) -> PlatformKind {
        PlatformKind::Facebook
    }

    fn source(&self) -> SampleSource {
        SampleSource::Api
    }

    async fn fetch(&self) -> Result<u64, FetchError> {
        self.client
            .fetch_fan_count(&self.access_token, &self.page_id)
            .await
    }
}
