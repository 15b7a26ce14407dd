//! Cookie-carrying HTTP session shared by discovery and page fetches of one run.

use std::time::Duration;

use reqwest::Client;

use crate::error::ScraperError;

/// HTTP settings every adapter run is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScraperSettings {
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Extra attempts per page after the first failure; `0` disables retry.
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    pub inter_request_delay_ms: u64,
    /// Hard stop for one base query's page loop.
    pub max_pages: u32,
}

impl ScraperSettings {
    #[must_use]
    pub fn from_app_config(config: &winecat_core::AppConfig) -> Self {
        Self {
            timeout_secs: config.scraper_request_timeout_secs,
            user_agent: config.scraper_user_agent.clone(),
            max_retries: config.scraper_max_retries,
            backoff_base_ms: config.scraper_retry_backoff_base_ms,
            inter_request_delay_ms: config.scraper_inter_request_delay_ms,
            max_pages: config.scraper_max_pages,
        }
    }
}

impl Default for ScraperSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: "winecat/0.1 (catalog-harvester)".to_owned(),
            max_retries: 0,
            backoff_base_ms: 500,
            inter_request_delay_ms: 0,
            max_pages: 500,
        }
    }
}

/// A `reqwest` client with its own cookie jar.
///
/// One session belongs to one adapter run. Session-token sites bind their
/// pagination key to the cookies set during discovery, so a session must not
/// be shared between concurrent runs against the same site.
pub struct HttpSession {
    client: Client,
}

impl HttpSession {
    /// Creates a session with the configured timeout and `User-Agent`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(settings: &ScraperSettings) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(settings.user_agent.as_str())
            .build()?;
        Ok(Self { client })
    }

    /// Issues one GET and returns the body text.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::RateLimited`] on HTTP 429.
    /// - [`ScraperError::UnexpectedStatus`] on any other non-2xx status.
    /// - [`ScraperError::Http`] on network, timeout, or body-decoding failure.
    pub async fn get_text(&self, url: &str) -> Result<String, ScraperError> {
        let response = self
            .client
            .get(url)
            .header(
                reqwest::header::ACCEPT,
                "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8",
            )
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .send()
            .await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(ScraperError::RateLimited {
                url: url.to_owned(),
                retry_after_secs,
            });
        }

        if !status.is_success() {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }

        Ok(response.text().await?)
    }
}
