use std::path::PathBuf;

/// Process configuration for the harvester, read from `WINECAT_*` env vars.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub log_level: String,
    /// Optional YAML file with per-site overrides.
    pub sites_path: Option<PathBuf>,
    pub scraper_request_timeout_secs: u64,
    pub scraper_user_agent: String,
    /// Extra attempts per page after the first failure; `0` disables retry.
    pub scraper_max_retries: u32,
    /// Base delay for exponential backoff: `base * 2^(attempt - 1)`.
    pub scraper_retry_backoff_base_ms: u64,
    pub scraper_inter_request_delay_ms: u64,
    /// Hard stop for a single base query's page loop.
    pub scraper_max_pages: u32,
    pub scraper_max_concurrent_sites: usize,
}
