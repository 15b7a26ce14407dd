use chrono::{TimeZone, Utc};
use winecat_core::SiteId;

use super::*;
use crate::adapter::default_config;

const GARYS_PAGE: &str = concat!(
    "<table>",
    "<tr><td>{content_name: 'Acme Red Blend 2019', id: 1}</td><td>$25.00</td></tr>",
    "<tr><td>{content_name: 'Bodega Rioja', id: 2}</td><td>$19.99 $25.00</td></tr>",
    "<tr><td>{content_name: 'Gift Card', id: 3}</td><td>ask in store</td></tr>",
    "</table>",
);

fn as_of() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

#[test]
fn process_page_keeps_fragment_order_and_counts_rejections() {
    let config = default_config(SiteId::GarysWine).unwrap();
    let query = "https://www.garyswine.com/wines/?page=1&l=100";
    let batch = process_page(&config, GARYS_PAGE, query, as_of());

    assert_eq!(batch.query, query);
    assert_eq!(batch.fragments, 3);
    assert_eq!(batch.rejected, 1);
    let names: Vec<&str> = batch.items.iter().map(CatalogItem::name).collect();
    assert_eq!(names, vec!["Acme Red Blend 2019", "Bodega Rioja"]);

    for item in &batch.items {
        assert_eq!(item.source(), "https://www.garyswine.com/");
        assert_eq!(item.query(), query);
        assert_eq!(item.as_of(), as_of());
    }
}

#[test]
fn process_page_is_idempotent_for_the_same_input() {
    let config = default_config(SiteId::GarysWine).unwrap();
    let first = process_page(&config, GARYS_PAGE, "q", as_of());
    let second = process_page(&config, GARYS_PAGE, "q", as_of());
    assert_eq!(first, second);
}

#[test]
fn empty_body_produces_empty_batch() {
    let config = default_config(SiteId::GarysWine).unwrap();
    let batch = process_page(&config, "", "q", as_of());
    assert_eq!(batch.fragments, 0);
    assert_eq!(batch.rejected, 0);
    assert!(batch.items.is_empty());
}

#[test]
fn outcome_absorbs_batches_in_order() {
    let config = default_config(SiteId::GarysWine).unwrap();
    let mut outcome = ScrapeOutcome::new(SiteId::GarysWine);
    outcome.absorb(process_page(&config, GARYS_PAGE, "page-1", as_of()));
    outcome.absorb(process_page(&config, GARYS_PAGE, "page-2", as_of()));

    assert_eq!(outcome.pages, 2);
    assert_eq!(outcome.rejected, 2);
    let queries: Vec<&str> = outcome.items.iter().map(CatalogItem::query).collect();
    assert_eq!(queries, vec!["page-1", "page-1", "page-2", "page-2"]);
    assert!(outcome.is_complete());
    assert_eq!(outcome.into_result().unwrap().len(), 4);
}

#[test]
fn failed_outcome_into_result_is_the_error() {
    let mut outcome = ScrapeOutcome::new(SiteId::WineLibrary);
    outcome.error = Some(ScraperError::Cancelled);
    assert!(!outcome.is_complete());
    assert!(matches!(outcome.into_result(), Err(ScraperError::Cancelled)));
}
