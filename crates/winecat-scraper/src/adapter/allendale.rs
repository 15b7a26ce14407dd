//! allendalewine: session-token discovery with offset-window pages.

use async_trait::async_trait;
use regex::Regex;
use tokio_util::sync::CancellationToken;
use winecat_core::SiteId;

use super::{CatalogAdapter, SiteConfig};
use crate::discovery::{discover_session_token, SessionTokenProtocol};
use crate::error::ScraperError;
use crate::extract::{FieldExtractor, NameRule, PriceRule};
use crate::fetch::PageFetcher;
use crate::query::BaseQuery;
use crate::session::ScraperSettings;
use crate::split::{ItemBlockSplitter, ListingRegion};

const ROOT: &str = "https://www.allendalewine.com/";

fn pattern(source: &str) -> Regex {
    Regex::new(source).expect("valid allendalewine pattern")
}

/// Splits the `itemResultsList` container on each item's title marker.
#[must_use]
pub fn splitter() -> ItemBlockSplitter {
    ItemBlockSplitter::new(
        ListingRegion::ElementId("itemResultsList".to_owned()),
        "itemTitle",
    )
}

/// Name is `brand title vintage`; the sale price falls back to the list price.
#[must_use]
pub fn field_extractor() -> FieldExtractor {
    FieldExtractor::new(
        NameRule::Composite {
            brand: pattern(r#"brand">([^<]*)<"#),
            title: pattern(r#"title">([^<]*)<"#),
            vintage: Some(pattern(r#"vintageAge">(\w[^<]*)<"#)),
        },
        PriceRule::Labelled {
            current: pattern(r#"priceSale">\s*\$?([^<]*)<"#),
            regular: pattern(r#"listprice">\s*\$?([^<]*)<"#),
        },
    )
}

pub(super) fn default_config() -> Result<SiteConfig, ScraperError> {
    SiteConfig::new(ROOT, splitter(), field_extractor())
}

fn protocol() -> SessionTokenProtocol {
    SessionTokenProtocol {
        warmup_path: "search".to_owned(),
        link_marker: "/scan/MM".to_owned(),
        token: pattern(r"scan/MM=\w*"),
    }
}

/// The pagination key is bound to the warm-up response's cookies, so every
/// run discovers it again through its own session.
pub struct AllendaleWine {
    config: SiteConfig,
    settings: ScraperSettings,
    protocol: SessionTokenProtocol,
}

impl AllendaleWine {
    #[must_use]
    pub fn new(config: SiteConfig, settings: ScraperSettings) -> Self {
        Self {
            config,
            settings,
            protocol: protocol(),
        }
    }
}

#[async_trait]
impl CatalogAdapter for AllendaleWine {
    fn site(&self) -> SiteId {
        SiteId::AllendaleWine
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
        let query = discover_session_token(
            self.site(),
            fetcher,
            &self.config.root,
            &self.protocol,
            cancel,
        )
        .await?;
        Ok(vec![query])
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    use super::*;
    use crate::pipeline::process_page;

    const PAGE: &str = r#"<html><div class="nav">itemTitle decoy</div>
<div id="itemResultsList">
  <div class="itemTitle"><span class="brand">Acme</span> <span class="title">Red Blend</span>
    <span class="vintageAge">2019</span>
    <span class="listprice">$25.00</span></div>
  <div class="itemTitle"><span class="brand">Bodega</span> <span class="title">Rioja Reserva</span>
    <span class="vintageAge"> </span>
    <span class="listprice">$30.00</span><span class="priceSale">$24.99</span></div>
  <div class="itemTitle"><span class="brand"></span><span class="title">No Brand</span>
    <span class="listprice">$9.99</span></div>
</div></html>"#;

    #[test]
    fn page_yields_composite_names_and_sale_flags() {
        let config = default_config().unwrap();
        let as_of = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let query = "https://www.allendalewine.com/scan/MM=ab:0:100:100";
        let batch = process_page(&config, PAGE, query, as_of);

        assert_eq!(batch.fragments, 3);
        assert_eq!(batch.rejected, 1);
        assert_eq!(batch.items.len(), 2);

        let first = &batch.items[0];
        assert_eq!(first.name(), "Acme Red Blend 2019");
        assert_eq!(first.price(), Decimal::new(2500, 2));
        assert!(!first.is_on_sale());
        assert_eq!(first.source(), ROOT);

        let second = &batch.items[1];
        assert_eq!(second.name(), "Bodega Rioja Reserva");
        assert_eq!(second.price(), Decimal::new(2499, 2));
        assert_eq!(second.base_price(), Decimal::new(3000, 2));
        assert!(second.is_on_sale());
    }

    #[test]
    fn listing_outside_results_container_is_ignored() {
        let config = default_config().unwrap();
        let batch = process_page(&config, "<div>itemTitle brand\">X<</div>", "q", Utc::now());
        assert_eq!(batch.fragments, 0);
        assert!(batch.items.is_empty());
    }
}
