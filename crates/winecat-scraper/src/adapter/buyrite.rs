//! buyritewines: one page-number query per category, bounded by the item
//! total each listing declares.

use async_trait::async_trait;
use regex::Regex;
use tokio_util::sync::CancellationToken;
use winecat_core::SiteId;

use super::{category_query, CatalogAdapter, SiteConfig, CONTENT_NAME_PATTERN};
use crate::discovery::discover_page_count;
use crate::error::ScraperError;
use crate::extract::{FieldExtractor, NameRule, PriceRule};
use crate::fetch::PageFetcher;
use crate::query::BaseQuery;
use crate::session::ScraperSettings;
use crate::split::{ItemBlockSplitter, ListingRegion};

const ROOT: &str = "https://www.buyritewines.com/";

fn pattern(source: &str) -> Regex {
    Regex::new(source).expect("valid buyritewines pattern")
}

/// Every item's tracking payload starts with `content_name`, which is also
/// the name field's left context, so the delimiter stays in the fragment.
#[must_use]
pub fn splitter() -> ItemBlockSplitter {
    ItemBlockSplitter::new(ListingRegion::Body, "content_name").keeping_delimiter()
}

/// Name from `content_name`, price from `item_price`, regular price from the
/// `(Reg. $..)` note.
#[must_use]
pub fn field_extractor() -> FieldExtractor {
    FieldExtractor::new(
        NameRule::Single(pattern(CONTENT_NAME_PATTERN)),
        PriceRule::Labelled {
            current: pattern(r#"item_price["']?\s*:\s*["']?\$?([\d,]+\.\d{2})"#),
            regular: pattern(r"\(Reg[^$)]*\$([\d,]+\.\d{2})\)"),
        },
    )
}

pub(super) fn default_config() -> Result<SiteConfig, ScraperError> {
    SiteConfig::new(ROOT, splitter(), field_extractor())
}

/// Past the last real page the site keeps serving a full listing, so the
/// page count comes from the declared total instead of an empty page.
pub struct BuyRiteWines {
    config: SiteConfig,
    settings: ScraperSettings,
    total: Regex,
}

impl BuyRiteWines {
    #[must_use]
    pub fn new(config: SiteConfig, settings: ScraperSettings) -> Self {
        Self {
            config,
            settings,
            total: pattern(r"(?i)of\s+([\d,]+)\s+(?:items|results)"),
        }
    }
}

#[async_trait]
impl CatalogAdapter for BuyRiteWines {
    fn site(&self) -> SiteId {
        SiteId::BuyRiteWines
    }

    fn config(&self) -> &SiteConfig {
        &self.config
    }

    fn settings(&self) -> &ScraperSettings {
        &self.settings
    }

    async fn discover_all(
        &self,
        fetcher: &PageFetcher,
        cancel: &CancellationToken,
    ) -> Result<Vec<BaseQuery>, ScraperError> {
        let mut queries = Vec::with_capacity(self.config.categories.len());
        for category in &self.config.categories {
            let query = category_query(&self.config.root, category);
            let bounded = discover_page_count(
                self.site(),
                fetcher,
                query,
                self.config.page_size,
                &self.total,
                cancel,
            )
            .await?;
            queries.push(bounded);
        }
        Ok(queries)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;
    use winecat_core::CatalogItem;

    use super::*;
    use crate::pipeline::process_page;

    #[test]
    fn category_query_fills_page_and_size() {
        let query = category_query(ROOT, "/wines/");
        let url = query.url_for(&query.first_page(100)).unwrap();
        assert_eq!(url, "https://www.buyritewines.com/wines/?page=1&l=100");
    }

    #[test]
    fn reg_note_sets_base_price() {
        let body = concat!(
            "<p>Showing 1-100 of 250 items</p>",
            "<script>{content_name: 'Acme Red Blend 2019', item_price: '19.99'}</script>",
            "<span>(Reg. $25.00)</span>",
            "<script>{content_name: 'Bodega Rioja', item_price: '1,049.00'}</script>",
        );
        let config = default_config().unwrap();
        let batch = process_page(&config, body, "q", Utc::now());

        assert_eq!(batch.rejected, 0);
        assert_eq!(batch.items.len(), 2);
        let sale = &batch.items[0];
        assert_eq!(sale.name(), "Acme Red Blend 2019");
        assert_eq!(sale.price(), Decimal::new(1999, 2));
        assert_eq!(sale.base_price(), Decimal::new(2500, 2));
        assert!(sale.is_on_sale());

        let plain = &batch.items[1];
        assert_eq!(plain.price(), Decimal::new(104_900, 2));
        assert_eq!(plain.base_price(), plain.price());
        assert!(!plain.is_on_sale());
    }

    #[test]
    fn fragment_without_price_is_rejected() {
        let body = "<script>{content_name: 'Gift Card'}</script>";
        let config = default_config().unwrap();
        let batch = process_page(&config, body, "q", Utc::now());
        assert_eq!(batch.fragments, 1);
        assert_eq!(batch.rejected, 1);
        assert!(batch.items.is_empty());
    }

    #[test]
    fn apostrophes_stay_inside_quoted_names() {
        let body = concat!(
            r#"<script>{"content_name": "D'Arenberg The Footbolt Shiraz", "item_price": "19.99"}</script>"#,
            "<script>{content_name: 'Gary\\'s Old Vine Zin', item_price: '24.50'}</script>",
            "<script>{content_name: Bodega Rioja, item_price: 12.00}</script>",
        );
        let config = default_config().unwrap();
        let batch = process_page(&config, body, "q", Utc::now());

        assert_eq!(batch.rejected, 0);
        let names: Vec<&str> = batch.items.iter().map(CatalogItem::name).collect();
        assert_eq!(
            names,
            vec!["D'Arenberg The Footbolt Shiraz", "Gary's Old Vine Zin", "Bodega Rioja"]
        );
        assert_eq!(batch.items[1].price(), Decimal::new(2450, 2));
    }
}
