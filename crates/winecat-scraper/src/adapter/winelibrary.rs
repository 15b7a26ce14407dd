//! winelibrary: a single page-number search listing, probed until empty.

use async_trait::async_trait;
use regex::Regex;
use tokio_util::sync::CancellationToken;
use winecat_core::SiteId;

use super::{CatalogAdapter, SiteConfig};
use crate::error::ScraperError;
use crate::extract::{FieldExtractor, NameRule, PriceRule};
use crate::fetch::PageFetcher;
use crate::query::{join_root, BaseQuery};
use crate::session::ScraperSettings;
use crate::split::{ItemBlockSplitter, ListingRegion};

const ROOT: &str = "https://winelibrary.com/";

#[must_use]
pub fn splitter() -> ItemBlockSplitter {
    ItemBlockSplitter::new(ListingRegion::Body, "product_id_")
}

#[must_use]
pub fn field_extractor() -> FieldExtractor {
    FieldExtractor::new(
        NameRule::Single(
            Regex::new(r#"js-elip-multi["']>([^<]*)<"#).expect("valid winelibrary pattern"),
        ),
        PriceRule::CurrencyPair,
    )
}

pub(super) fn default_config() -> Result<SiteConfig, ScraperError> {
    SiteConfig::new(ROOT, splitter(), field_extractor())
}

/// The search listing ignores page size and categories.
pub struct WineLibrary {
    config: SiteConfig,
    settings: ScraperSettings,
}

impl WineLibrary {
    #[must_use]
    pub fn new(config: SiteConfig, settings: ScraperSettings) -> Self {
        Self { config, settings }
    }
}

#[async_trait]
impl CatalogAdapter for WineLibrary {
    fn site(&self) -> SiteId {
        SiteId::WineLibrary
    }

    fn config(&self) -> &SiteConfig {
        &self.config
    }

    fn settings(&self) -> &ScraperSettings {
        &self.settings
    }

    async fn discover_all(
        &self,
        _fetcher: &PageFetcher,
        _cancel: &CancellationToken,
    ) -> Result<Vec<BaseQuery>, ScraperError> {
        Ok(vec![BaseQuery::page_number(join_root(
            &self.config.root,
            "search?page={page}",
        ))])
    }
}
