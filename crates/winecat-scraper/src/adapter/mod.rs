//! The per-site adapter contract and its four implementations.
//!
//! An adapter owns a [`SiteConfig`] and knows how to discover its base
//! queries. Fetching, splitting, extraction, termination, and aggregation
//! are shared and come from the trait's default methods.

mod allendale;
mod buyrite;
mod garys;
mod winelibrary;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use winecat_core::{SiteId, SiteOverride};

use crate::error::ScraperError;
use crate::extract::FieldExtractor;
use crate::fetch::PageFetcher;
use crate::pipeline::{self, PageBatch, ScrapeOutcome};
use crate::query::{join_root, validate_root, BaseQuery, PageDescriptor};
use crate::session::ScraperSettings;
use crate::split::ItemBlockSplitter;

pub use allendale::AllendaleWine;
pub use buyrite::BuyRiteWines;
pub use garys::GarysWine;
pub use winelibrary::WineLibrary;

/// Default number of items requested per page.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Category path used by page-number sites when none is configured.
pub const DEFAULT_CATEGORY: &str = "wines";

/// Name field of the inline tracking payload shared by the page-number
/// sites. The value runs to its closing quote, so apostrophes inside a
/// quoted name (`"D'Arenberg"`, `'Gary\'s'`) are kept; a single-quoted
/// value ends at a quote followed by `,` or `}`. Bare values run to the next
/// `,` or `}`.
pub(crate) const CONTENT_NAME_PATTERN: &str = r#"content_name["']?\s*:\s*(?:"((?:[^"\\]|\\.)*)"|'(.*?)'\s*[,}]|([^"',}\s][^,}]*))"#;

/// Everything an adapter needs to know about its site, injected at
/// construction.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Absolute site root. Also stamped on every row as `source`.
    pub root: String,
    pub page_size: u32,
    /// Category path segments; one base query per category on sites that
    /// use them.
    pub categories: Vec<String>,
    pub splitter: ItemBlockSplitter,
    pub extractor: FieldExtractor,
}

impl SiteConfig {
    /// Builds a config with the default page size and category.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidUrl`] if `root` is not an absolute
    /// http(s) URL.
    pub fn new(
        root: impl Into<String>,
        splitter: ItemBlockSplitter,
        extractor: FieldExtractor,
    ) -> Result<Self, ScraperError> {
        let root = root.into();
        validate_root(&root)?;
        Ok(Self {
            root,
            page_size: DEFAULT_PAGE_SIZE,
            categories: vec![DEFAULT_CATEGORY.to_owned()],
            splitter,
            extractor,
        })
    }

    /// Points the config at a different root, e.g. a mirror or a test server.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidUrl`] if `root` is not an absolute
    /// http(s) URL.
    pub fn with_root(mut self, root: impl Into<String>) -> Result<Self, ScraperError> {
        let root = root.into();
        validate_root(&root)?;
        self.root = root;
        Ok(self)
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    #[must_use]
    pub fn with_categories(mut self, categories: Vec<String>) -> Self {
        if !categories.is_empty() {
            self.categories = categories;
        }
        self
    }

    /// Applies the fields set in a YAML site override.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidUrl`] for a bad `base_url`.
    pub fn apply_override(mut self, site_override: &SiteOverride) -> Result<Self, ScraperError> {
        if let Some(base_url) = &site_override.base_url {
            self = self.with_root(base_url.as_str())?;
        }
        if let Some(page_size) = site_override.page_size {
            self = self.with_page_size(page_size);
        }
        if let Some(categories) = &site_override.categories {
            self = self.with_categories(categories.clone());
        }
        Ok(self)
    }
}

/// One catalog site.
///
/// Implementors supply identity, configuration, and discovery; the page
/// loop is shared. A new site is added by implementing this trait, with no
/// change to the pipeline.
#[async_trait]
pub trait CatalogAdapter: Send + Sync {
    fn site(&self) -> SiteId;

    fn config(&self) -> &SiteConfig;

    fn settings(&self) -> &ScraperSettings;

    /// Produces the base queries for this run, in the order they are paged.
    ///
    /// `fetcher` carries the run's cookie jar; any session token discovered
    /// here is only valid through it.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Discovery`] when the site's pagination metadata
    /// cannot be obtained, or [`ScraperError::Cancelled`].
    async fn discover_all(
        &self,
        fetcher: &PageFetcher,
        cancel: &CancellationToken,
    ) -> Result<Vec<BaseQuery>, ScraperError>;

    /// Scrapes every page of every base query with a fresh session.
    async fn scrape_all(&self, cancel: &CancellationToken) -> ScrapeOutcome {
        pipeline::scrape_all(self, cancel).await
    }

    /// Scrapes the single page at `descriptor` of the first base query.
    ///
    /// # Errors
    ///
    /// Propagates discovery and fetch errors.
    async fn scrape_one_page(
        &self,
        descriptor: &PageDescriptor,
        cancel: &CancellationToken,
    ) -> Result<PageBatch, ScraperError> {
        pipeline::scrape_one_page(self, descriptor, cancel).await
    }
}

/// Page-number query for one category: `{root}{category}/?page={page}&l={per_page}`.
pub(crate) fn category_query(root: &str, category: &str) -> BaseQuery {
    let category = category.trim_matches('/');
    BaseQuery::page_number(join_root(
        root,
        &format!("{category}/?page={{page}}&l={{per_page}}"),
    ))
}

/// Builds the adapter for `site`, applying an optional override.
///
/// # Errors
///
/// Returns [`ScraperError::InvalidUrl`] when the override's `base_url` is
/// not an absolute http(s) URL.
pub fn build_adapter(
    site: SiteId,
    settings: ScraperSettings,
    site_override: Option<&SiteOverride>,
) -> Result<Box<dyn CatalogAdapter>, ScraperError> {
    let config = default_config(site)?;
    let config = match site_override {
        Some(o) => config.apply_override(o)?,
        None => config,
    };

    let adapter: Box<dyn CatalogAdapter> = match site {
        SiteId::AllendaleWine => Box::new(AllendaleWine::new(config, settings)),
        SiteId::BuyRiteWines => Box::new(BuyRiteWines::new(config, settings)),
        SiteId::GarysWine => Box::new(GarysWine::new(config, settings)),
        SiteId::WineLibrary => Box::new(WineLibrary::new(config, settings)),
    };
    Ok(adapter)
}

/// The built-in configuration for `site`.
///
/// # Errors
///
/// Only fails if a built-in root is malformed.
pub fn default_config(site: SiteId) -> Result<SiteConfig, ScraperError> {
    match site {
        SiteId::AllendaleWine => allendale::default_config(),
        SiteId::BuyRiteWines => buyrite::default_config(),
        SiteId::GarysWine => garys::default_config(),
        SiteId::WineLibrary => winelibrary::default_config(),
    }
}
