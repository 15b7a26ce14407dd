//! One-page-at-a-time fetching for an adapter run.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::ScraperError;
use crate::query::{BaseQuery, PageDescriptor};
use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::session::{HttpSession, ScraperSettings};

/// A fetched page: the exact URL requested and its body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPage {
    pub url: String,
    pub body: String,
}

/// Issues GETs for one adapter run over a single [`HttpSession`].
///
/// Retries are layered on top through [`RetryPolicy`] rather than living in
/// the session. Every request races the run's cancellation token; a cancelled
/// request is dropped mid-flight and reported as [`ScraperError::Cancelled`].
pub struct PageFetcher {
    session: HttpSession,
    retry: RetryPolicy,
    inter_request_delay: Duration,
}

impl PageFetcher {
    #[must_use]
    pub fn new(session: HttpSession, retry: RetryPolicy) -> Self {
        Self {
            session,
            retry,
            inter_request_delay: Duration::ZERO,
        }
    }

    /// Builds a fetcher with a fresh session, retry policy, and request delay
    /// taken from `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the HTTP client cannot be built.
    pub fn from_settings(settings: &ScraperSettings) -> Result<Self, ScraperError> {
        let session = HttpSession::new(settings)?;
        let retry = RetryPolicy::new(
            settings.max_retries,
            Duration::from_millis(settings.backoff_base_ms),
        );
        Ok(Self::new(session, retry)
            .with_inter_request_delay(Duration::from_millis(settings.inter_request_delay_ms)))
    }

    #[must_use]
    pub fn with_inter_request_delay(mut self, delay: Duration) -> Self {
        self.inter_request_delay = delay;
        self
    }

    /// Fetches one page of `query` at `descriptor`.
    ///
    /// # Errors
    ///
    /// Propagates URL-building errors and any error from [`Self::get`].
    pub async fn fetch(
        &self,
        query: &BaseQuery,
        descriptor: &PageDescriptor,
        cancel: &CancellationToken,
    ) -> Result<RawPage, ScraperError> {
        let url = query.url_for(descriptor)?;
        let body = self.get(&url, cancel).await?;
        Ok(RawPage { url, body })
    }

    /// GETs `url` under the retry policy.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::Cancelled`] if `cancel` fires before or during the request.
    /// - Otherwise the last error from [`HttpSession::get_text`].
    pub async fn get(&self, url: &str, cancel: &CancellationToken) -> Result<String, ScraperError> {
        if cancel.is_cancelled() {
            return Err(ScraperError::Cancelled);
        }

        let request = retry_with_backoff(self.retry, cancel, || self.session.get_text(url));
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tracing::warn!(url, "request cancelled in flight");
                Err(ScraperError::Cancelled)
            }
            result = request => result,
        }
    }

    /// Sleeps for the configured politeness delay, unless cancelled first.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Cancelled`] if `cancel` fires during the wait.
    pub(crate) async fn pause(&self, cancel: &CancellationToken) -> Result<(), ScraperError> {
        if self.inter_request_delay.is_zero() {
            return Ok(());
        }
        tokio::select! {
            () = cancel.cancelled() => Err(ScraperError::Cancelled),
            () = tokio::time::sleep(self.inter_request_delay) => Ok(()),
        }
    }
}
