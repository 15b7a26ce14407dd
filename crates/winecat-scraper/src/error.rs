use rust_decimal::Decimal;
use thiserror::Error;
use winecat_core::{ItemError, SiteId};

/// Run-level failures. Any of these ends the adapter run; rows aggregated
/// before the failure are still returned alongside it.
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited by {url} (retry after {retry_after_secs}s)")]
    RateLimited { url: String, retry_after_secs: u64 },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("discovery failed for {site}: {reason}")]
    Discovery { site: SiteId, reason: String },

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("pagination limit reached for {site}: exceeded {max_pages} pages")]
    PaginationLimit { site: SiteId, max_pages: u32 },

    #[error("run cancelled")]
    Cancelled,
}

impl ScraperError {
    /// Wraps a warm-up failure as a discovery failure for `site`.
    ///
    /// Cancellation passes through unchanged so callers can still tell a
    /// cancelled run from a broken site.
    pub(crate) fn into_discovery(self, site: SiteId) -> Self {
        match self {
            ScraperError::Cancelled | ScraperError::Discovery { .. } => self,
            other => ScraperError::Discovery {
                site,
                reason: other.to_string(),
            },
        }
    }
}

/// Why a single fragment was dropped. Never escapes the page loop; counted
/// per page instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("no resolvable name")]
    MissingName,

    #[error("no price found")]
    MissingPrice,

    #[error("unparseable price \"{0}\"")]
    InvalidPrice(String),

    #[error("base price {base_price} is below price {price}")]
    BaseBelowPrice { price: Decimal, base_price: Decimal },
}

impl From<ItemError> for Rejection {
    fn from(err: ItemError) -> Self {
        match err {
            ItemError::EmptyName => Rejection::MissingName,
            ItemError::BaseBelowPrice { price, base_price } => {
                Rejection::BaseBelowPrice { price, base_price }
            }
        }
    }
}
