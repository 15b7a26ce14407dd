//! When to stop paging through a base query.
//!
//! ```text
//! DISCOVER → FETCH → (EMPTY? → STOP : ACCUMULATE → ADVANCE → FETCH)
//! ```
//!
//! Two modes:
//!
//! - **Probe** (no page count known): stop after the first page that splits
//!   into no fragments, when advancing would request the same page again, or
//!   when the site answers with the same listing as the previous page. A
//!   page whose fragments are all rejected still counts as a live page.
//! - **Bounded** (page count from discovery): fetch exactly that many pages,
//!   ignoring emptiness, because some sites serve unrelated listings past
//!   the real end.
//!
//! Either way the run fails with [`ScraperError::PaginationLimit`] rather
//! than exceed `max_pages` for one query.

use rust_decimal::Decimal;
use winecat_core::{CatalogItem, SiteId};

use crate::error::ScraperError;
use crate::query::{BaseQuery, PageDescriptor};

/// Why a page loop ended normally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    EmptyPage,
    RepeatedDescriptor,
    /// The site served the previous page's listing again, e.g. by clamping
    /// an out-of-range page number to its last page.
    RepeatedPage,
    BoundReached,
}

/// What a page listed, independent of the URL and time it was fetched at.
///
/// An empty signature never matches, so pages without accepted rows are
/// never treated as repeats.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSignature(Vec<(String, Decimal, Decimal)>);

impl PageSignature {
    #[must_use]
    pub fn of(items: &[CatalogItem]) -> Self {
        Self(
            items
                .iter()
                .map(|item| (item.name().to_owned(), item.price(), item.base_price()))
                .collect(),
        )
    }

    fn repeats(&self, previous: Option<&PageSignature>) -> bool {
        !self.0.is_empty() && previous == Some(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Continue(PageDescriptor),
    Stop(StopReason),
}

#[derive(Debug, Clone)]
pub struct TerminationPolicy {
    site: SiteId,
    bound: Option<u32>,
    max_pages: u32,
    pages_seen: u32,
    previous: Option<PageSignature>,
}

impl TerminationPolicy {
    #[must_use]
    pub fn new(site: SiteId, query: &BaseQuery, max_pages: u32) -> Self {
        Self {
            site,
            bound: query.page_count,
            max_pages,
            pages_seen: 0,
            previous: None,
        }
    }

    /// `false` only for a bounded query whose page count is zero.
    #[must_use]
    pub fn should_start(&self) -> bool {
        self.bound != Some(0)
    }

    /// Records the page just processed at `current` and decides what comes next.
    ///
    /// `fragments` is the number of item fragments the page split into,
    /// before extraction; zero is the exhaustion signal in probe mode.
    /// `signature` describes the page's accepted rows. On
    /// [`StopReason::RepeatedPage`] the page duplicates the one before it and
    /// its rows should be discarded.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::PaginationLimit`] when continuing would exceed
    /// `max_pages`.
    pub fn after_page(
        &mut self,
        current: &PageDescriptor,
        fragments: usize,
        signature: PageSignature,
    ) -> Result<Decision, ScraperError> {
        self.pages_seen = self.pages_seen.saturating_add(1);

        if let Some(bound) = self.bound {
            if self.pages_seen >= bound {
                return Ok(Decision::Stop(StopReason::BoundReached));
            }
        } else {
            if fragments == 0 {
                return Ok(Decision::Stop(StopReason::EmptyPage));
            }
            if current.advance() == *current {
                return Ok(Decision::Stop(StopReason::RepeatedDescriptor));
            }
            if signature.repeats(self.previous.as_ref()) {
                return Ok(Decision::Stop(StopReason::RepeatedPage));
            }
            self.previous = Some(signature);
        }

        if self.pages_seen >= self.max_pages {
            return Err(ScraperError::PaginationLimit {
                site: self.site,
                max_pages: self.max_pages,
            });
        }

        Ok(Decision::Continue(current.advance()))
    }
}
