use crate::domain::asin::Asin;
use serde::{Deserialize, Serialize};

/// A product as returned by a fetcher, before it is merged into storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawProduct {
    pub asin: Asin,
    pub title: Option<String>,
    pub price: f64,
    pub rating: Option<f64>,
    pub image: Option<String>,
    pub url: Option<String>,
}

/// Parses a marketplace price string such as `$1,299.99`, `1299.99` or `USD 12`.
/// Zero or negative amounts count as no price.
pub fn parse_price(s: &str) -> Option<f64> {
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    let v = cleaned.parse::<f64>().ok()?;
    is_usable_price(v).then_some(v)
}

pub fn is_usable_price(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

/// Reads the leading number of a rating label like `4.5 out of 5 stars`.
pub fn parse_rating(s: &str) -> Option<f64> {
    let first = s.split_whitespace().next()?;
    let v = first.replace(',', ".").parse::<f64>().ok()?;
    (0.0..=5.0).contains(&v).then_some(v)
}

pub(crate) fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_price_strings() {
        assert_eq!(parse_price("$1,299.99"), Some(1299.99));
        assert_eq!(parse_price("19.99"), Some(19.99));
        assert_eq!(parse_price(" USD 12 "), Some(12.0));
        assert_eq!(parse_price(""), None);
        assert_eq!(parse_price("Currently unavailable"), None);
        assert_eq!(parse_price("1.2.3"), None);
        assert_eq!(parse_price("$0.00"), None);
        assert_eq!(parse_price("0"), None);
    }

    #[test]
    fn parses_rating_labels() {
        assert_eq!(parse_rating("4.5 out of 5 stars"), Some(4.5));
        assert_eq!(parse_rating("4,2 von 5 Sternen"), Some(4.2));
        assert_eq!(parse_rating("7 out of 5"), None);
        assert_eq!(parse_rating(""), None);
    }
}
