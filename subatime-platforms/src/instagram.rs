//! Instagram Graph API client and strategy.

use async_trait::async_trait;
use subatime_core::{PlatformKind, SampleSource};
use subatime_fetch::{AcquisitionStrategy, FetchError};
use tracing::instrument;

use crate::graph::{self, GRAPH_API_BASE};

// ============================================================================
// API Client
// ============================================================================

/// Instagram Graph API client (business accounts expose `followers_count`).
#[derive(Debug, Clone)]
pub struct InstagramApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl InstagramApiClient {
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

    /// Fetches the follower count for an Instagram business user.
    #[instrument(skip(self, access_token))]
    pub async fn fetch_follower_count(
        &self,
        access_token: &str,
        user_id: &str,
    ) -> Result<u64, FetchError> {
        if access_token.is_empty() {
            return Err(FetchError::Auth(
                "Instagram access token is missing".to_string(),
            ));
        }
        if user_id.is_empty() {
            return Err(FetchError::ConfigIncomplete(
                "Instagram user id is missing".to_string(),
            ));
        }

        graph::fetch_count_field(
            &self.http,
            &self.base_url,
            user_id,
            "followers_count",
            access_token,
        )
        .await
    }
}

impl Default for InstagramApiClient {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Strategy
// ============================================================================

/// API-backed acquisition strategy for Instagram.
pub struct InstagramApiStrategy {
    client: InstagramApiClient,
    access_token: String,
    user_id: String,
}

impl InstagramApiStrategy {
    /// Creates the strategy from validated configuration fields.
    pub fn new(access_token: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            client: InstagramApiClient::new(),
            access_token: access_token.into(),
            user_id: user_id.into(),
        }
    }
}

#[async_trait]
impl AcquisitionStrategy for InstagramApiStrategy {
    fn platform(&self) -> PlatformKind {
        PlatformKind::Instagram
    }

    fn source(&self) -> SampleSource {
        SampleSource::Api
    }

    async fn fetch(&self) -> Result<u64, FetchError> {
        self.client
            .fetch_follower_count(&self.access_token, &self.user_id)
            .await
    }
}
