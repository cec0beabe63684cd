//! Acquisition strategy trait.
//!
//! A strategy represents one method of obtaining a platform's follower
//! count. It is selected once when a polling job starts (API or scrape,
//! from the platform's configuration) and then invoked on every tick.

use async_trait::async_trait;
use subatime_core::{PlatformKind, SampleSource};

use crate::error::FetchError;

// ============================================================================
// Acquisition Strategy Trait
// ============================================================================

/// A strategy for fetching one platform's follower count.
///
/// Implementations are built once at job-start time by the platform
/// registry, so per-tick work is a single `fetch` call with no dispatch
/// on configuration.
///
/// ## Implementing a Strategy
///
/// ```ignore
/// struct YoutubeApiStrategy { client: YoutubeApiClient, /* creds */ }
///
/// #[async_trait]
/// impl AcquisitionStrategy for YoutubeApiStrategy {
///     fn platform(&self) -> PlatformKind {
///         PlatformKind::Youtube
///     }
///
///     fn source(&self) -> SampleSource {
///         SampleSource::Api
///     }
///
///     async fn fetch(&self) -> Result<u64, FetchError> {
///         self.client.fetch_subscriber_count(&self.api_key, &self.channel_url).await
///     }
/// }
/// ```
#[async_trait]
pub trait AcquisitionStrategy: Send + Sync {
    /// The platform this strategy fetches for.
    fn platform(&self) -> PlatformKind;

    /// The source recorded on samples produced by this strategy.
    fn source(&self) -> SampleSource;

    /// Identifier for logging (e.g. `youtube.api`, `tiktok.scrape`).
    fn id(&self) -> String {
        let method = match self.source() {
            SampleSource::Api => "api",
            SampleSource::Scrape => "scrape",
        };
        format!("{}.{}", self.platform().key(), method)
    }

    /// Performs one fetch attempt and returns the absolute follower count.
    async fn fetch(&self) -> Result<u64, FetchError>;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedStrategy;

    #[async_trait]
    impl AcquisitionStrategy for FixedStrategy {
        fn platform(&self) -> PlatformKind {
            PlatformKind::TikTok
        }

        fn source(&self) -> SampleSource {
            SampleSource::Scrape
        }

        async fn fetch(&self) -> Result<u64, FetchError> {
            Ok(123)
        }
    }

    #[tokio::test]
    async fn test_strategy_id() {
        let strategy = FixedStrategy;
        assert_eq!(strategy.id(), "tiktok.scrape");
        assert_eq!(strategy.fetch().await.unwrap(), 123);
    }
}
