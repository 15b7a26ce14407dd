//! The fetch → split → extract loop shared by every adapter.

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use winecat_core::{CatalogItem, SiteId};

use crate::adapter::{CatalogAdapter, SiteConfig};
use crate::error::ScraperError;
use crate::extract::Provenance;
use crate::fetch::PageFetcher;
use crate::pagination::{Decision, PageSignature, StopReason, TerminationPolicy};
use crate::query::{BaseQuery, PageDescriptor};

/// Rows produced by one fetched page, plus what was thrown away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageBatch {
    /// The exact URL requested.
    pub query: String,
    pub items: Vec<CatalogItem>,
    pub fragments: usize,
    /// Fragments dropped because a required field failed to extract.
    pub rejected: usize,
}

/// Splits `body` and extracts every fragment, stamping each row with
/// `query` and `as_of`.
///
/// Pure: the same body, query, and timestamp always give the same batch.
#[must_use]
pub fn process_page(
    config: &SiteConfig,
    body: &str,
    query: &str,
    as_of: DateTime<Utc>,
) -> PageBatch {
    let fragments = config.splitter.split(body);
    let provenance = Provenance {
        source: &config.root,
        query,
        as_of,
    };

    let mut items = Vec::with_capacity(fragments.len());
    let mut rejected = 0usize;
    for fragment in &fragments {
        match config.extractor.extract(fragment, provenance) {
            Ok(item) => items.push(item),
            Err(reason) => {
                rejected += 1;
                tracing::trace!(query, %reason, "fragment rejected");
            }
        }
    }

    if rejected > 0 {
        tracing::warn!(
            query,
            fragments = fragments.len(),
            rejected,
            "dropped fragments with unresolvable fields"
        );
    }

    PageBatch {
        query: query.to_owned(),
        items,
        fragments: fragments.len(),
        rejected,
    }
}

/// Result of a full adapter run.
///
/// `items` holds every row aggregated before the run ended, in fetch order.
/// `error` is `Some` when the run ended early; the rows are still valid.
#[derive(Debug)]
pub struct ScrapeOutcome {
    pub site: SiteId,
    pub items: Vec<CatalogItem>,
    pub pages: u32,
    pub rejected: usize,
    pub error: Option<ScraperError>,
}

impl ScrapeOutcome {
    #[must_use]
    pub fn new(site: SiteId) -> Self {
        Self {
            site,
            items: Vec::new(),
            pages: 0,
            rejected: 0,
            error: None,
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    /// All-or-nothing view of the run.
    ///
    /// # Errors
    ///
    /// Returns the run's error, discarding partial rows.
    pub fn into_result(self) -> Result<Vec<CatalogItem>, ScraperError> {
        match self.error {
            None => Ok(self.items),
            Some(err) => Err(err),
        }
    }

    fn absorb(&mut self, batch: PageBatch) {
        self.pages = self.pages.saturating_add(1);
        self.rejected = self.rejected.saturating_add(batch.rejected);
        self.items.extend(batch.items);
    }
}

/// Runs discovery and then pages through every base query in order.
///
/// Failures and cancellation end the run but keep the rows already
/// collected; see [`ScrapeOutcome`].
pub async fn scrape_all<A>(adapter: &A, cancel: &CancellationToken) -> ScrapeOutcome
where
    A: CatalogAdapter + ?Sized,
{
    let site = adapter.site();
    let mut outcome = ScrapeOutcome::new(site);

    if let Err(err) = run(adapter, cancel, &mut outcome).await {
        if matches!(err, ScraperError::Cancelled) {
            tracing::warn!(
                %site,
                rows = outcome.items.len(),
                "run cancelled; returning rows collected so far"
            );
        } else {
            tracing::warn!(
                %site,
                rows = outcome.items.len(),
                error = %err,
                "run failed; returning rows collected so far"
            );
        }
        outcome.error = Some(err);
    }

    tracing::info!(
        %site,
        rows = outcome.items.len(),
        pages = outcome.pages,
        rejected = outcome.rejected,
        complete = outcome.is_complete(),
        "scrape finished"
    );
    outcome
}

async fn run<A>(
    adapter: &A,
    cancel: &CancellationToken,
    outcome: &mut ScrapeOutcome,
) -> Result<(), ScraperError>
where
    A: CatalogAdapter + ?Sized,
{
    // Fresh session per run: session tokens are tied to this cookie jar.
    let fetcher = PageFetcher::from_settings(adapter.settings())?;
    let queries = adapter.discover_all(&fetcher, cancel).await?;

    for query in &queries {
        scrape_query(adapter, &fetcher, query, cancel, outcome).await?;
    }
    Ok(())
}

/// Pages through one base query, appending rows to `outcome` as each page
/// completes.
///
/// # Errors
///
/// Propagates fetch errors, pagination-limit errors, and cancellation.
pub async fn scrape_query<A>(
    adapter: &A,
    fetcher: &PageFetcher,
    query: &BaseQuery,
    cancel: &CancellationToken,
    outcome: &mut ScrapeOutcome,
) -> Result<(), ScraperError>
where
    A: CatalogAdapter + ?Sized,
{
    let config = adapter.config();
    let mut policy = TerminationPolicy::new(adapter.site(), query, adapter.settings().max_pages);
    if !policy.should_start() {
        tracing::info!(site = %adapter.site(), base = %query.base, "query declares no pages");
        return Ok(());
    }

    let mut descriptor = query.first_page(config.page_size);
    let mut first = true;
    loop {
        if !first {
            fetcher.pause(cancel).await?;
        }
        first = false;

        let batch = fetch_page(config, fetcher, query, &descriptor, cancel).await?;
        tracing::debug!(
            site = %adapter.site(),
            query = %batch.query,
            fragments = batch.fragments,
            items = batch.items.len(),
            rejected = batch.rejected,
            "page processed"
        );

        let decision = policy.after_page(
            &descriptor,
            batch.fragments,
            PageSignature::of(&batch.items),
        );
        // A repeated listing is the previous page served again; its rows are duplicates.
        if !matches!(decision, Ok(Decision::Stop(StopReason::RepeatedPage))) {
            outcome.absorb(batch);
        }

        match decision? {
            Decision::Continue(next) => descriptor = next,
            Decision::Stop(reason) => {
                tracing::debug!(site = %adapter.site(), base = %query.base, ?reason, "pagination stopped");
                return Ok(());
            }
        }
    }
}

/// Fetches and processes a single page, reusing the page discovery already
/// fetched when `descriptor` points at it.
///
/// # Errors
///
/// Propagates any error from [`PageFetcher::fetch`].
pub async fn fetch_page(
    config: &SiteConfig,
    fetcher: &PageFetcher,
    query: &BaseQuery,
    descriptor: &PageDescriptor,
    cancel: &CancellationToken,
) -> Result<PageBatch, ScraperError> {
    let url = query.url_for(descriptor)?;
    if let Some(page) = query.prefetched_for(&url) {
        tracing::debug!(url = %page.url, "reusing page fetched during discovery");
        return Ok(process_page(config, &page.body, &page.url, Utc::now()));
    }
    let page = fetcher.fetch(query, descriptor, cancel).await?;
    let as_of = Utc::now();
    Ok(process_page(config, &page.body, &page.url, as_of))
}

/// Discovers the first base query with a fresh session and processes the
/// page at `descriptor`.
///
/// # Errors
///
/// Propagates discovery and fetch errors.
pub async fn scrape_one_page<A>(
    adapter: &A,
    descriptor: &PageDescriptor,
    cancel: &CancellationToken,
) -> Result<PageBatch, ScraperError>
where
    A: CatalogAdapter + ?Sized,
{
    let fetcher = PageFetcher::from_settings(adapter.settings())?;
    let queries = adapter.discover_all(&fetcher, cancel).await?;
    let query = queries.first().ok_or_else(|| ScraperError::Discovery {
        site: adapter.site(),
        reason: "no base query discovered".to_owned(),
    })?;
    fetch_page(adapter.config(), &fetcher, query, descriptor, cancel).await
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
