//! garyswine: one page-number query per category, probed until a page comes
//! back empty.

use async_trait::async_trait;
use regex::Regex;
use tokio_util::sync::CancellationToken;
use winecat_core::SiteId;

use super::{category_query, CatalogAdapter, SiteConfig, CONTENT_NAME_PATTERN};
use crate::error::ScraperError;
use crate::extract::{FieldExtractor, NameRule, PriceRule};
use crate::fetch::PageFetcher;
use crate::query::BaseQuery;
use crate::session::ScraperSettings;
use crate::split::{ItemBlockSplitter, ListingRegion};

const ROOT: &str = "https://www.garyswine.com/";

#[must_use]
pub fn splitter() -> ItemBlockSplitter {
    ItemBlockSplitter::new(ListingRegion::Body, "content_name").keeping_delimiter()
}

/// Name from `content_name`; prices from the currency amounts in the row.
#[must_use]
pub fn field_extractor() -> FieldExtractor {
    FieldExtractor::new(
        NameRule::Single(Regex::new(CONTENT_NAME_PATTERN).expect("valid garyswine pattern")),
        PriceRule::CurrencyPair,
    )
}

pub(super) fn default_config() -> Result<SiteConfig, ScraperError> {
    SiteConfig::new(ROOT, splitter(), field_extractor())
}

pub struct GarysWine {
    config: SiteConfig,
    settings: ScraperSettings,
}

impl GarysWine {
    #[must_use]
    pub fn new(config: SiteConfig, settings: ScraperSettings) -> Self {
        Self { config, settings }
    }
}

#[async_trait]
impl CatalogAdapter for GarysWine {
    fn site(&self) -> SiteId {
        SiteId::GarysWine
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
        Ok(self
            .config
            .categories
            .iter()
            .map(|category| category_query(&self.config.root, category))
            .collect())
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
    fn currency_pair_reads_sale_then_regular() {
        let body = concat!(
            "<table><tr><td>",
            "{content_name: 'Acme Red Blend 2019', id: 7}</td>",
            "<td><b>$19.99</b> Reg. $25.00</td></tr><tr><td>",
            "{content_name: 'House White', id: 8}</td><td>$12.00</td></tr></table>",
        );
        let config = default_config().unwrap();
        let batch = process_page(&config, body, "q", Utc::now());

        assert_eq!(batch.items.len(), 2);
        assert_eq!(batch.items[0].price(), Decimal::new(1999, 2));
        assert_eq!(batch.items[0].base_price(), Decimal::new(2500, 2));
        assert!(batch.items[0].is_on_sale());
        assert_eq!(batch.items[1].name(), "House White");
        assert!(!batch.items[1].is_on_sale());
    }

    #[test]
    fn apostrophes_stay_inside_quoted_names() {
        let body = concat!(
            r#"<tr><td>{"content_name": "D'Arenberg The Footbolt Shiraz", "id": 3}</td>"#,
            "<td>$19.99</td></tr>",
            "<tr><td>{content_name: 'Gary's Reserve Cabernet', id: 4}</td><td>$42.00</td></tr>",
            r"<tr><td>{content_name: 'Château d\'Yquem 2015', id: 5}</td><td>$399.00</td></tr>",
        );
        let config = default_config().unwrap();
        let batch = process_page(&config, body, "q", Utc::now());

        let names: Vec<&str> = batch.items.iter().map(CatalogItem::name).collect();
        assert_eq!(
            names,
            vec![
                "D'Arenberg The Footbolt Shiraz",
                "Gary's Reserve Cabernet",
                "Château d'Yquem 2015",
            ]
        );
        assert_eq!(batch.items[0].price(), Decimal::new(1999, 2));
    }
}
