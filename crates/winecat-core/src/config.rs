use crate::app_config::AppConfig;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a `HashMap`
/// lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let log_level = or_default("WINECAT_LOG_LEVEL", "info");
    let sites_path = lookup("WINECAT_SITES_PATH")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from);

    let scraper_request_timeout_secs: u64 = parse_as(
        "WINECAT_SCRAPER_REQUEST_TIMEOUT_SECS",
        &or_default("WINECAT_SCRAPER_REQUEST_TIMEOUT_SECS", "30"),
    )?;
    let scraper_user_agent = or_default(
        "WINECAT_SCRAPER_USER_AGENT",
        "winecat/0.1 (catalog-harvester)",
    );
    let scraper_max_retries: u32 = parse_as(
        "WINECAT_SCRAPER_MAX_RETRIES",
        &or_default("WINECAT_SCRAPER_MAX_RETRIES", "0"),
    )?;
    let scraper_retry_backoff_base_ms: u64 = parse_as(
        "WINECAT_SCRAPER_RETRY_BACKOFF_BASE_MS",
        &or_default("WINECAT_SCRAPER_RETRY_BACKOFF_BASE_MS", "500"),
    )?;
    let scraper_inter_request_delay_ms: u64 = parse_as(
        "WINECAT_SCRAPER_INTER_REQUEST_DELAY_MS",
        &or_default("WINECAT_SCRAPER_INTER_REQUEST_DELAY_MS", "0"),
    )?;
    let scraper_max_pages: u32 = parse_as(
        "WINECAT_SCRAPER_MAX_PAGES",
        &or_default("WINECAT_SCRAPER_MAX_PAGES", "500"),
    )?;
    let scraper_max_concurrent_sites: usize = parse_as(
        "WINECAT_SCRAPER_MAX_CONCURRENT_SITES",
        &or_default("WINECAT_SCRAPER_MAX_CONCURRENT_SITES", "4"),
    )?;

    if scraper_request_timeout_secs == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "WINECAT_SCRAPER_REQUEST_TIMEOUT_SECS".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    if scraper_max_pages == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "WINECAT_SCRAPER_MAX_PAGES".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    Ok(AppConfig {
        log_level,
        sites_path,
        scraper_request_timeout_secs,
        scraper_user_agent,
        scraper_max_retries,
        scraper_retry_backoff_base_ms,
        scraper_inter_request_delay_ms,
        scraper_max_pages,
        scraper_max_concurrent_sites: scraper_max_concurrent_sites.max(1),
    })
}

/// Parse a raw env value, mapping failures to [`ConfigError::InvalidEnvVar`].
fn parse_as<T>(var: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
