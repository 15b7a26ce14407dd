//! Pattern-based field extraction from a single item fragment.
//!
//! A field pattern captures the text between a left-context marker and the
//! next tag boundary, e.g. `brand">([^<]*)<`. Patterns with alternatives
//! (quoted or bare values) may have several groups; the first group that
//! took part in the match is the value. Only the first match in the
//! fragment is used.

use chrono::{DateTime, Utc};
use regex::Regex;
use winecat_core::CatalogItem;

use crate::error::Rejection;
use crate::price::{price_pair_from_labels, price_pair_from_text, PricePair};
use crate::split::RawFragment;

/// How an item's display name is found.
#[derive(Debug, Clone)]
pub enum NameRule {
    /// One field holds the whole name.
    Single(Regex),
    /// `brand title vintage`; brand and title are required, vintage optional.
    Composite {
        brand: Regex,
        title: Regex,
        vintage: Option<Regex>,
    },
}

/// How an item's prices are found.
#[derive(Debug, Clone)]
pub enum PriceRule {
    /// The first two currency amounts anywhere in the fragment, sale first.
    CurrencyPair,
    /// Separately labelled current and regular prices. Each falls back to
    /// the other when absent.
    Labelled { current: Regex, regular: Regex },
}

/// Site-specific patterns that turn a fragment into a [`CatalogItem`].
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    name: NameRule,
    price: PriceRule,
}

/// Where and when the fragment was captured; stamped on every row of a page.
#[derive(Debug, Clone, Copy)]
pub struct Provenance<'a> {
    pub source: &'a str,
    pub query: &'a str,
    pub as_of: DateTime<Utc>,
}

impl FieldExtractor {
    #[must_use]
    pub fn new(name: NameRule, price: PriceRule) -> Self {
        Self { name, price }
    }

    /// Extracts one row from `fragment`.
    ///
    /// # Errors
    ///
    /// Returns the [`Rejection`] that disqualified the fragment: no name, no
    /// price, an unparseable price, or a regular price below the selling
    /// price.
    pub fn extract(
        &self,
        fragment: &RawFragment,
        provenance: Provenance<'_>,
    ) -> Result<CatalogItem, Rejection> {
        let text = fragment.as_str();
        let name = self.extract_name(text).ok_or(Rejection::MissingName)?;
        let prices = self.extract_prices(text)?;

        Ok(CatalogItem::new(
            &name,
            prices.price,
            prices.base_price,
            provenance.source,
            provenance.query,
            provenance.as_of,
        )?)
    }

    /// The display name, or `None` when a required part is missing or blank.
    #[must_use]
    pub fn extract_name(&self, text: &str) -> Option<String> {
        match &self.name {
            NameRule::Single(pattern) => first_capture(pattern, text).map(unescape_quotes),
            NameRule::Composite {
                brand,
                title,
                vintage,
            } => {
                let brand = first_capture(brand, text)?;
                let title = first_capture(title, text)?;
                let vintage = vintage
                    .as_ref()
                    .and_then(|pattern| first_capture(pattern, text))
                    .unwrap_or("");
                Some(format!("{brand} {title} {vintage}").trim().to_owned())
            }
        }
    }

    /// The price pair for `text`.
    ///
    /// # Errors
    ///
    /// See [`price_pair_from_text`] and [`price_pair_from_labels`].
    pub fn extract_prices(&self, text: &str) -> Result<PricePair, Rejection> {
        match &self.price {
            PriceRule::CurrencyPair => price_pair_from_text(text),
            PriceRule::Labelled { current, regular } => {
                price_pair_from_labels(first_raw(current, text), first_raw(regular, text))
            }
        }
    }
}

/// First capture of `pattern` in `text`, trimmed; blank captures count as absent.
fn first_capture<'t>(pattern: &Regex, text: &'t str) -> Option<&'t str> {
    first_raw(pattern, text)
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn first_raw<'t>(pattern: &Regex, text: &'t str) -> Option<&'t str> {
    pattern
        .captures(text)
        .and_then(|cap| cap.iter().skip(1).flatten().next())
        .map(|m| m.as_str())
}

/// Undoes `\'` and `\"` escapes left by inline script payloads.
fn unescape_quotes(raw: &str) -> String {
    raw.replace("\\'", "'").replace("\\\"", "\"")
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
