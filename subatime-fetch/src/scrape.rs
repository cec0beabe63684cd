//! Browser-backed acquisition strategy.

use std::time::Duration;

use async_trait::async_trait;
use subatime_core::{PlatformKind, SampleSource};

use crate::browser::BrowserSession;
use crate::error::FetchError;
use crate::strategy::AcquisitionStrategy;

/// Default wait for a locator to appear on a reloaded page.
const DEFAULT_LOCATOR_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// Scrape Strategy
// ============================================================================

/// Reads a platform's follower count from a page element through the
/// shared [`BrowserSession`].
///
/// The same implementation serves every platform; the URL and locator come
/// from the platform's configuration at job-start time.
pub struct ScrapeStrategy {
    session: BrowserSession,
    platform: PlatformKind,
    url: String,
    locator: String,
    timeout: Duration,
}

impl ScrapeStrategy {
    /// Creates a scrape strategy for a platform.
    pub fn new(
        session: BrowserSession,
        platform: PlatformKind,
        url: impl Into<String>,
        locator: impl Into<String>,
    ) -> Self {
        Self {
            session,
            platform,
            url: url.into(),
            locator: locator.into(),
            timeout: DEFAULT_LOCATOR_TIMEOUT,
        }
    }

    /// Overrides the locator wait timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl AcquisitionStrategy for ScrapeStrategy {
    fn platform(&self) -> PlatformKind {
        self.platform
    }

    fn source(&self) -> SampleSource {
        SampleSource::Scrape
    }

    async fn fetch(&self) -> Result<u64, FetchError> {
        self.session
            .read_locator(self.platform, &self.url, &self.locator, self.timeout)
            .await
    }
}
