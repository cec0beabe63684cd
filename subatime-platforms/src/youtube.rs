//! YouTube Data API client and strategy.

use async_trait::async_trait;
use serde::Deserialize;
use subatime_core::{PlatformKind, SampleSource};
use subatime_fetch::{AcquisitionStrategy, FetchError};
use tracing::{debug, instrument};
use url::Url;

// ============================================================================
// Constants
// ============================================================================

/// Google APIs base URL.
const YOUTUBE_API_BASE: &str = "https://www.googleapis.com";

/// Channel statistics endpoint.
const CHANNELS_ENDPOINT: &str = "/youtube/v3/channels";

// ============================================================================
// API Response Types
// ============================================================================

/// Response from the channel list endpoint.
#[derive(Debug, Deserialize)]
struct ChannelListResponse {
    #[serde(default)]
    items: Vec<ChannelItem>,
}

#[derive(Debug, Deserialize)]
struct ChannelItem {
    statistics: ChannelStatistics,
}

/// The API returns counts as decimal strings.
#[derive(Debug, Deserialize)]
struct ChannelStatistics {
    #[serde(rename = "subscriberCount", default)]
    subscriber_count: String,
}

/// Error envelope returned by Google APIs.
#[derive(Debug, Deserialize)]
struct GoogleErrorEnvelope {
    error: GoogleError,
}

#[derive(Debug, Deserialize)]
struct GoogleError {
    #[serde(default)]
    message: String,
}

// ============================================================================
// API Client
// ============================================================================

/// YouTube Data API v3 client.
#[derive(Debug, Clone)]
pub struct YoutubeApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl YoutubeApiClient {
    /// Creates a client pointed at the production Google API.
    pub fn new() -> Self {
        Self::with_base_url(YOUTUBE_API_BASE)
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

    /// Fetches the subscriber count for the channel named by `channel_url`.
    ///
    /// The channel id is the last path segment of the configured URL.
    #[instrument(skip(self, api_key))]
    pub async fn fetch_subscriber_count(
        &self,
        api_key: &str,
        channel_url: &str,
    ) -> Result<u64, FetchError> {
        if api_key.is_empty() {
            return Err(FetchError::Auth("YouTube API key is missing".to_string()));
        }
        if channel_url.is_empty() {
            return Err(FetchError::ConfigIncomplete(
                "YouTube channel URL is missing".to_string(),
            ));
        }

        let channel_id = channel_id_from_url(channel_url)?;
        debug!(%channel_id, "Fetching subscriber count");

        let request_url = format!(
            "{}{}?part=statistics&id={}&key={}",
            self.base_url, CHANNELS_ENDPOINT, channel_id, api_key
        );

        let response = self.http.get(&request_url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<GoogleErrorEnvelope>(&body)
                .map(|envelope| envelope.error.message)
                .unwrap_or_else(|_| format!("HTTP {status}"));

            return Err(match status.as_u16() {
                401 | 403 => FetchError::Auth(message),
                404 => FetchError::NotFound(message),
                _ => FetchError::Upstream(message),
            });
        }

        let channels: ChannelListResponse = serde_json::from_str(&body)?;
        let item = channels
            .items
            .first()
            .ok_or_else(|| FetchError::NotFound("YouTube channel not found".to_string()))?;

        item.statistics.subscriber_count.parse().map_err(|_| {
            FetchError::Upstream(format!(
                "unparseable subscriber count '{}'",
                item.statistics.subscriber_count
            ))
        })
    }
}

impl Default for YoutubeApiClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Extracts the channel id (last path segment) from a channel URL.
fn channel_id_from_url(channel_url: &str) -> Result<String, FetchError> {
    let parsed = Url::parse(channel_url)
        .map_err(|e| FetchError::ConfigIncomplete(format!("invalid YouTube channel URL: {e}")))?;

    parsed
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(ToString::to_string)
        .ok_or_else(|| FetchError::ConfigIncomplete("invalid YouTube channel URL".to_string()))
}

// ============================================================================
// Strategy
// ============================================================================

/// API-backed acquisition strategy for YouTube.
pub struct YoutubeApiStrategy {
    client: YoutubeApiClient,
    api_key: String,
    channel_url: String,
}

impl YoutubeApiStrategy {
    /// Creates the strategy from validated configuration fields.
    pub fn new(api_key: impl Into<String>, channel_url: impl Into<String>) -> Self {
        Self {
            client: YoutubeApiClient::new(),
            api_key: api_key.into(),
            channel_url: channel_url.into(),
        }
    }
}

#[async_trait]
impl AcquisitionStrategy for YoutubeApiStrategy {
    fn platform(&self) -> PlatformKind {
        PlatformKind::Youtube
    }

    fn source(&self) -> SampleSource {
        SampleSource::Api
    }

    async fn fetch(&self) -> Result<u64, FetchError> {
        self.client
            .fetch_subscriber_count(&self.api_key, &self.channel_url)
            .await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_id_from_url() {
        assert_eq!(
            channel_id_from_url("https://www.youtube.com/channel/UCabc123").unwrap(),
            "UCabc123"
        );
        // Trailing slash still resolves to the last non-empty segment.
        assert_eq!(
            channel_id_from_url("https://www.youtube.com/channel/UCabc123/").unwrap(),
            "UCabc123"
        );
        assert!(channel_id_from_url("not a url").is_err());
        assert!(channel_id_from_url("https://www.youtube.com").is_err());
    }
}
