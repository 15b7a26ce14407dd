//! Catalog harvesting for wine retail sites.
//!
//! Each site is a [`CatalogAdapter`]: it discovers one or more base queries,
//! then the shared pipeline fetches pages, splits them into item fragments,
//! extracts a [`winecat_core::CatalogItem`] from each, and stops according to
//! the query's termination policy.

pub mod adapter;
pub mod discovery;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod pagination;
pub mod pipeline;
pub mod price;
pub mod query;
pub mod retry;
pub mod session;
pub mod split;

pub use adapter::{build_adapter, default_config, CatalogAdapter, SiteConfig};
pub use error::{Rejection, ScraperError};
pub use extract::{FieldExtractor, NameRule, PriceRule, Provenance};
pub use fetch::{PageFetcher, RawPage};
pub use pipeline::{process_page, scrape_all, scrape_one_page, PageBatch, ScrapeOutcome};
pub use query::{BaseQuery, PageDescriptor, QueryShape};
pub use retry::RetryPolicy;
pub use session::{HttpSession, ScraperSettings};
pub use split::{ItemBlockSplitter, ListingRegion, RawFragment};
