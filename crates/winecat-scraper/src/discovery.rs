//! Pagination discovery: turning a site root into base queries.
//!
//! Two protocols need the network:
//!
//! - **Session token.** A warm-up listing page carries pagination anchors
//!   whose `href` embeds a per-session cache key (`scan/MM=<hex>`). The key
//!   is only valid with the cookies set by that same warm-up response.
//! - **Declared total.** The first listing page states the item total; with
//!   a known page size the page count is `ceil(total / page_size)`.
//!
//! Sites without either use a static page-number template.

use std::sync::LazyLock;

use regex::Regex;
use tokio_util::sync::CancellationToken;
use winecat_core::SiteId;

use crate::error::ScraperError;
use crate::fetch::PageFetcher;
use crate::query::{join_root, BaseQuery};

static HREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)href\s*=\s*["']([^"']+)["']"#).expect("valid href regex")
});

/// How a session-token site exposes its pagination key.
#[derive(Debug, Clone)]
pub struct SessionTokenProtocol {
    /// Path of the warm-up listing page, relative to the site root.
    pub warmup_path: String,
    /// Substring identifying pagination anchors, e.g. `/scan/MM`.
    pub link_marker: String,
    /// Pattern whose whole match is the token, e.g. `scan/MM=\w*`.
    pub token: Regex,
}

/// Warm up a session and build the offset-window base query from its token.
///
/// When the warm-up page has no pagination anchors the site is unpaginated
/// and the warm-up URL itself becomes a passthrough query.
///
/// # Errors
///
/// - [`ScraperError::Discovery`] if the warm-up request fails or an anchor
///   matches the marker but carries no token.
/// - [`ScraperError::Cancelled`] if the run is cancelled.
pub async fn discover_session_token(
    site: SiteId,
    fetcher: &PageFetcher,
    root: &str,
    protocol: &SessionTokenProtocol,
    cancel: &CancellationToken,
) -> Result<BaseQuery, ScraperError> {
    let warmup_url = join_root(root, &protocol.warmup_path);
    let body = fetcher
        .get(&warmup_url, cancel)
        .await
        .map_err(|e| e.into_discovery(site))?;

    let Some(link) = pagination_links(&body, &protocol.link_marker).next() else {
        tracing::info!(%site, %warmup_url, "no pagination links; treating warm-up page as the only page");
        return Ok(BaseQuery::passthrough(warmup_url));
    };

    let token = protocol
        .token
        .find(link)
        .map(|m| m.as_str())
        .ok_or_else(|| ScraperError::Discovery {
            site,
            reason: format!("pagination link \"{link}\" carries no session token"),
        })?;

    let base = join_root(root, token);
    tracing::info!(%site, %base, "discovered session pagination base");
    Ok(BaseQuery::offset_window(base))
}

/// `href` values containing `marker`, in document order.
fn pagination_links<'a>(body: &'a str, marker: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    HREF.captures_iter(body)
        .filter_map(|cap| cap.get(1).map(|m| m.as_str()))
        .filter(move |href| href.contains(marker))
}

/// Fetch the first page of `query` and read the declared item total with
/// `total_pattern`, returning `query` bounded to `ceil(total / page_size)`
/// pages. The fetched page is kept on the query so the page loop does not
/// request it twice.
///
/// # Errors
///
/// - [`ScraperError::Discovery`] if the request fails, the total is absent,
///   or it does not parse.
/// - [`ScraperError::Cancelled`] if the run is cancelled.
pub async fn discover_page_count(
    site: SiteId,
    fetcher: &PageFetcher,
    query: BaseQuery,
    page_size: u32,
    total_pattern: &Regex,
    cancel: &CancellationToken,
) -> Result<BaseQuery, ScraperError> {
    let first = query.first_page(page_size);
    let page = fetcher
        .fetch(&query, &first, cancel)
        .await
        .map_err(|e| e.into_discovery(site))?;

    let total = parse_declared_total(&page.body, total_pattern).ok_or_else(|| {
        ScraperError::Discovery {
            site,
            reason: format!("no item total found on {}", page.url),
        }
    })?;
    let pages = page_count(total, page_size);

    tracing::info!(%site, url = %page.url, total, page_size, pages, "discovered bounded page count");
    Ok(query.with_page_count(pages).with_prefetched(page))
}

/// First capture of `pattern` as an integer, thousands separators removed.
#[must_use]
pub fn parse_declared_total(body: &str, pattern: &Regex) -> Option<u32> {
    let raw = pattern.captures(body)?.get(1)?.as_str();
    let digits: String = raw.chars().filter(|c| *c != ',').collect();
    digits.trim().parse().ok()
}

/// `ceil(total / page_size)`; a zero page size is treated as one item per page.
#[must_use]
pub fn page_count(total: u32, page_size: u32) -> u32 {
    total.div_ceil(page_size.max(1))
}
