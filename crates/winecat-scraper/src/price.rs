//! Price normalization and sale detection.
//!
//! Listings render money as `$` + 1-3 digits + optional comma-grouped
//! thousands + exactly two decimals (`$19.99`, `$1,249.00`). When an item is
//! discounted, the sale price is rendered before the regular price.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;

use crate::error::Rejection;

static CURRENCY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\d{1,3}(?:,\d{3})*\.\d{2}").expect("valid currency regex"));

/// A selling price and the regular price it is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricePair {
    pub price: Decimal,
    pub base_price: Decimal,
}

impl PricePair {
    /// Both prices equal: not on sale.
    #[must_use]
    pub fn single(price: Decimal) -> Self {
        Self {
            price,
            base_price: price,
        }
    }

    /// On sale iff the regular price exceeds the selling price.
    #[must_use]
    pub fn is_on_sale(&self) -> bool {
        self.base_price > self.price
    }
}

/// Currency-formatted substrings of `text`, in order of appearance.
#[must_use]
pub fn currency_amounts(text: &str) -> Vec<&str> {
    CURRENCY.find_iter(text).map(|m| m.as_str()).collect()
}

/// Parses a price string, tolerating a leading `$`, surrounding whitespace,
/// and thousands separators.
///
/// # Errors
///
/// Returns [`Rejection::InvalidPrice`] if what remains is not a decimal.
pub fn parse_amount(raw: &str) -> Result<Decimal, Rejection> {
    let cleaned: String = raw
        .trim()
        .trim_start_matches('$')
        .trim()
        .chars()
        .filter(|c| *c != ',')
        .collect();
    Decimal::from_str(&cleaned).map_err(|_| Rejection::InvalidPrice(raw.trim().to_owned()))
}

/// Derives prices from the currency amounts found in `text`.
///
/// One amount means no sale; two or more mean `[sale, regular, ..]` and any
/// amounts past the second are ignored.
///
/// # Errors
///
/// Returns [`Rejection::MissingPrice`] when `text` holds no currency amount.
pub fn price_pair_from_text(text: &str) -> Result<PricePair, Rejection> {
    let amounts = currency_amounts(text);
    match amounts.as_slice() {
        [] => Err(Rejection::MissingPrice),
        [only] => Ok(PricePair::single(parse_amount(only)?)),
        [sale, regular, ..] => Ok(PricePair {
            price: parse_amount(sale)?,
            base_price: parse_amount(regular)?,
        }),
    }
}

/// Combines separately labelled current and regular prices.
///
/// A missing current price falls back to the regular price and vice versa.
///
/// # Errors
///
/// - [`Rejection::MissingPrice`] when both are absent.
/// - [`Rejection::InvalidPrice`] when a present value does not parse.
pub fn price_pair_from_labels(
    current: Option<&str>,
    regular: Option<&str>,
) -> Result<PricePair, Rejection> {
    let current = current.map(parse_amount).transpose()?;
    let regular = regular.map(parse_amount).transpose()?;
    match (current, regular) {
        (None, None) => Err(Rejection::MissingPrice),
        (Some(price), None) | (None, Some(price)) => Ok(PricePair::single(price)),
        (Some(price), Some(base_price)) => Ok(PricePair { price, base_price }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn finds_amounts_in_order() {
        let text = r#"<b>$19.99</b> <s>Reg. $25.00</s> <i>$1,249.00</i>"#;
        assert_eq!(currency_amounts(text), vec!["$19.99", "$25.00", "$1,249.00"]);
    }

    #[test]
    fn ignores_amounts_without_two_decimals() {
        assert!(currency_amounts("$19 or $19.9 or 19.99").is_empty());
    }

    #[test]
    fn parse_amount_strips_symbol_and_grouping() {
        assert_eq!(parse_amount("$1,249.00").unwrap(), dec("1249.00"));
        assert_eq!(parse_amount(" 25.00 ").unwrap(), dec("25.00"));
    }

    #[test]
    fn parse_amount_rejects_garbage() {
        assert_eq!(
            parse_amount("call for price"),
            Err(Rejection::InvalidPrice("call for price".into()))
        );
    }

    #[test]
    fn single_amount_is_not_on_sale() {
        let pair = price_pair_from_text("only $25.00 today").unwrap();
        assert_eq!(pair, PricePair::single(dec("25.00")));
        assert!(!pair.is_on_sale());
    }

    #[test]
    fn two_amounts_map_sale_then_regular() {
        let pair = price_pair_from_text("$19.99 was $25.00").unwrap();
        assert_eq!(pair.price, dec("19.99"));
        assert_eq!(pair.base_price, dec("25.00"));
        assert!(pair.is_on_sale());
    }

    #[test]
    fn equal_pair_is_not_on_sale() {
        let pair = price_pair_from_text("$25.00 $25.00").unwrap();
        assert!(!pair.is_on_sale());
    }

    #[test]
    fn third_amount_is_ignored() {
        let pair = price_pair_from_text("$10.00 $12.00 $99.00").unwrap();
        assert_eq!(pair.base_price, dec("12.00"));
    }

    #[test]
    fn no_amount_is_missing_price() {
        assert_eq!(
            price_pair_from_text("sold out"),
            Err(Rejection::MissingPrice)
        );
    }

    #[test]
    fn labels_fall_back_to_each_other() {
        assert_eq!(
            price_pair_from_labels(None, Some("$25.00")).unwrap(),
            PricePair::single(dec("25.00"))
        );
        assert_eq!(
            price_pair_from_labels(Some("18.50"), None).unwrap(),
            PricePair::single(dec("18.50"))
        );
        assert_eq!(
            price_pair_from_labels(None, None),
            Err(Rejection::MissingPrice)
        );
    }

    #[test]
    fn labels_with_both_values_keep_order() {
        let pair = price_pair_from_labels(Some("19.99"), Some("$1,025.00")).unwrap();
        assert_eq!(pair.price, dec("19.99"));
        assert_eq!(pair.base_price, dec("1025.00"));
        assert!(pair.is_on_sale());
    }
}
