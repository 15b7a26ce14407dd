use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

/// Why a set of extracted fields could not become a [`CatalogItem`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItemError {
    #[error("item name is empty")]
    EmptyName,

    #[error("base price {base_price} is below selling price {price}")]
    BaseBelowPrice { price: Decimal, base_price: Decimal },
}

/// One normalized catalog row, as handed to persistence.
///
/// Field order is the output column order (`name, price, base_price,
/// is_on_sale, source, query, as_of`) and is preserved by serialization so
/// rows from any site can be unioned downstream.
///
/// Fields are private: `is_on_sale` is always derived from the two prices and
/// `base_price >= price` holds for every constructed value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogItem {
    name: String,
    price: Decimal,
    base_price: Decimal,
    is_on_sale: bool,
    source: String,
    query: String,
    as_of: DateTime<Utc>,
}

impl CatalogItem {
    /// Builds a row, trimming `name` and deriving `is_on_sale`.
    ///
    /// # Errors
    ///
    /// - [`ItemError::EmptyName`] if `name` is blank after trimming.
    /// - [`ItemError::BaseBelowPrice`] if `base_price < price`.
    pub fn new(
        name: &str,
        price: Decimal,
        base_price: Decimal,
        source: impl Into<String>,
        query: impl Into<String>,
        as_of: DateTime<Utc>,
    ) -> Result<Self, ItemError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ItemError::EmptyName);
        }
        if base_price < price {
            return Err(ItemError::BaseBelowPrice { price, base_price });
        }

        Ok(Self {
            name: name.to_owned(),
            price,
            base_price,
            is_on_sale: base_price > price,
            source: source.into(),
            query: query.into(),
            as_of,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current selling price.
    #[must_use]
    pub fn price(&self) -> Decimal {
        self.price
    }

    /// List (regular) price; equals [`Self::price`] when not on sale.
    #[must_use]
    pub fn base_price(&self) -> Decimal {
        self.base_price
    }

    #[must_use]
    pub fn is_on_sale(&self) -> bool {
        self.is_on_sale
    }

    /// Site root the row was harvested from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Exact page URL that produced this row.
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    #[must_use]
    pub fn as_of(&self) -> DateTime<Utc> {
        self.as_of
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::TimeZone;

    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn as_of() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn make_item(name: &str, price: &str, base: &str) -> Result<CatalogItem, ItemError> {
        CatalogItem::new(
            name,
            dec(price),
            dec(base),
            "https://winelibrary.com/",
            "https://winelibrary.com/search?page=1",
            as_of(),
        )
    }

    #[test]
    fn equal_prices_are_not_on_sale() {
        let item = make_item("Acme Red Blend 2019", "25.00", "25.00").unwrap();
        assert!(!item.is_on_sale());
        assert_eq!(item.price(), item.base_price());
    }

    #[test]
    fn lower_price_is_on_sale() {
        let item = make_item("Acme Red Blend", "19.99", "25.00").unwrap();
        assert!(item.is_on_sale());
        assert_eq!(item.price(), dec("19.99"));
        assert_eq!(item.base_price(), dec("25.00"));
    }

    #[test]
    fn name_is_trimmed() {
        let item = make_item("  Acme Red Blend  ", "10.00", "10.00").unwrap();
        assert_eq!(item.name(), "Acme Red Blend");
    }

    #[test]
    fn blank_name_is_rejected() {
        assert_eq!(make_item("   ", "10.00", "10.00"), Err(ItemError::EmptyName));
    }

    #[test]
    fn base_below_price_is_rejected() {
        let err = make_item("Acme", "30.00", "25.00").unwrap_err();
        assert_eq!(
            err,
            ItemError::BaseBelowPrice {
                price: dec("30.00"),
                base_price: dec("25.00"),
            }
        );
    }

    #[test]
    fn serializes_in_output_column_order() {
        let item = make_item("Acme Red Blend 2019", "19.99", "25.00").unwrap();
        let json = serde_json::to_string(&item).unwrap();
        let keys = [
            "\"name\"",
            "\"price\"",
            "\"base_price\"",
            "\"is_on_sale\"",
            "\"source\"",
            "\"query\"",
            "\"as_of\"",
        ];
        let positions: Vec<usize> = keys.iter().map(|k| json.find(k).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "json: {json}");
        assert!(json.contains("\"price\":\"19.99\""), "json: {json}");
    }
}
