//! Base queries and page descriptors, and the URLs built from them.
//!
//! A [`BaseQuery`] is what discovery produces: the site- or category-scoped
//! request prefix. A [`PageDescriptor`] is the pagination position within it.
//! The concrete request URL is always `BaseQuery::url_for(descriptor)`.
//!
//! ## Shapes
//!
//! Offset window (session-token sites), appended to the base:
//! ```text
//! https://www.allendalewine.com/scan/MM=ab74b6:0:100:100
//! ```
//!
//! Page number, substituted into a template:
//! ```text
//! https://www.garyswine.com/wines/?page={page}&l={per_page}
//! ```
//!
//! Passthrough, when the base already is the full link:
//! ```text
//! https://www.allendalewine.com/search
//! ```

use crate::error::ScraperError;
use crate::fetch::RawPage;

const PAGE_PLACEHOLDER: &str = "{page}";
const PER_PAGE_PLACEHOLDER: &str = "{per_page}";

/// How page descriptors are combined with the base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryShape {
    /// `{base}:{start}:{end}:{per_page}`.
    OffsetWindow,
    /// `{page}` / `{per_page}` placeholders in the base.
    PageNumber,
    /// The base is requested as-is.
    Passthrough,
}

/// A discovered request prefix, optionally with a known page count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseQuery {
    pub base: String,
    pub shape: QueryShape,
    /// Set when discovery read the item total and page size from the site;
    /// the run then fetches exactly this many pages.
    pub page_count: Option<u32>,
    /// A page discovery already fetched; the page loop uses it instead of
    /// requesting the same URL again.
    pub prefetched: Option<RawPage>,
}

impl BaseQuery {
    #[must_use]
    pub fn offset_window(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            shape: QueryShape::OffsetWindow,
            page_count: None,
            prefetched: None,
        }
    }

    #[must_use]
    pub fn page_number(template: impl Into<String>) -> Self {
        Self {
            base: template.into(),
            shape: QueryShape::PageNumber,
            page_count: None,
            prefetched: None,
        }
    }

    #[must_use]
    pub fn passthrough(url: impl Into<String>) -> Self {
        Self {
            base: url.into(),
            shape: QueryShape::Passthrough,
            page_count: None,
            prefetched: None,
        }
    }

    #[must_use]
    pub fn with_page_count(mut self, page_count: u32) -> Self {
        self.page_count = Some(page_count);
        self
    }

    #[must_use]
    pub fn with_prefetched(mut self, page: RawPage) -> Self {
        self.prefetched = Some(page);
        self
    }

    /// The prefetched page, if it was fetched from exactly `url`.
    #[must_use]
    pub fn prefetched_for(&self, url: &str) -> Option<&RawPage> {
        self.prefetched.as_ref().filter(|page| page.url == url)
    }

    /// The descriptor of the first page of this query.
    #[must_use]
    pub fn first_page(&self, page_size: u32) -> PageDescriptor {
        match self.shape {
            QueryShape::OffsetWindow => PageDescriptor::Offset {
                start: 0,
                per_page: page_size,
            },
            QueryShape::PageNumber => PageDescriptor::Page {
                number: 1,
                per_page: page_size,
            },
            QueryShape::Passthrough => PageDescriptor::Link(self.base.clone()),
        }
    }

    /// Builds the concrete request URL for `descriptor`.
    ///
    /// A [`PageDescriptor::Link`] is always requested verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidUrl`] when the descriptor kind does not
    /// fit this query's shape (e.g. a page number against an offset-window
    /// base).
    pub fn url_for(&self, descriptor: &PageDescriptor) -> Result<String, ScraperError> {
        match (self.shape, descriptor) {
            (_, PageDescriptor::Link(url)) => Ok(url.clone()),
            (QueryShape::Passthrough, _) => Ok(self.base.clone()),
            (QueryShape::OffsetWindow, PageDescriptor::Offset { start, per_page }) => {
                let end = start.saturating_add(*per_page);
                Ok(format!("{}:{start}:{end}:{per_page}", self.base))
            }
            (QueryShape::PageNumber, PageDescriptor::Page { number, per_page }) => Ok(self
                .base
                .replace(PAGE_PLACEHOLDER, &number.to_string())
                .replace(PER_PAGE_PLACEHOLDER, &per_page.to_string())),
            (shape, descriptor) => Err(ScraperError::InvalidUrl {
                url: self.base.clone(),
                reason: format!("descriptor {descriptor:?} does not fit a {shape:?} query"),
            }),
        }
    }
}

/// Opaque pagination position within a [`BaseQuery`].
///
/// Created from [`BaseQuery::first_page`] and moved forward only by
/// [`PageDescriptor::advance`]; extraction never touches it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageDescriptor {
    /// Item window `[start, start + per_page)`.
    Offset { start: u32, per_page: u32 },
    /// 1-based page number.
    Page { number: u32, per_page: u32 },
    /// A full URL; advancing it yields the same link.
    Link(String),
}

impl PageDescriptor {
    /// The descriptor of the following page.
    #[must_use]
    pub fn advance(&self) -> PageDescriptor {
        match self {
            PageDescriptor::Offset { start, per_page } => PageDescriptor::Offset {
                start: start.saturating_add(*per_page),
                per_page: *per_page,
            },
            PageDescriptor::Page { number, per_page } => PageDescriptor::Page {
                number: number.saturating_add(1),
                per_page: *per_page,
            },
            PageDescriptor::Link(url) => PageDescriptor::Link(url.clone()),
        }
    }
}

/// Joins a site root and a relative path with exactly one `/` between them.
pub(crate) fn join_root(root: &str, path: &str) -> String {
    format!(
        "{}/{}",
        root.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Checks that `root` is an absolute http(s) URL.
///
/// # Errors
///
/// Returns [`ScraperError::InvalidUrl`] otherwise.
pub(crate) fn validate_root(root: &str) -> Result<(), ScraperError> {
    let url = reqwest::Url::parse(root).map_err(|e| ScraperError::InvalidUrl {
        url: root.to_owned(),
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ScraperError::InvalidUrl {
            url: root.to_owned(),
            reason: format!("unsupported scheme \"{}\"", url.scheme()),
        });
    }
    Ok(())
}
