use serde::{Deserialize, Serialize};

/// One scraped price observation, normalized so rows from every retailer can
/// be compared.
///
/// Optional fields are `None` when the retailer did not supply them; empty
/// strings never reach this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRow {
    /// Scraper source name, e.g. `"LG UK"`.
    pub site: String,
    /// Canonical model key, e.g. `"OLED55C4"`.
    pub model: String,
    /// Price exactly as scraped, e.g. `"£1,299.00"`.
    pub price_text: Option<String>,
    /// Numeric price derived from `price_text`.
    pub price_num: Option<f64>,
    pub title: Option<String>,
    /// `None` means the retailer gave no stock signal, which is not the same
    /// as out of stock.
    pub in_stock: Option<bool>,
    pub url: Option<String>,
}

impl CanonicalRow {
    /// Deduplication key: two rows with the same site and url are the same
    /// observation.
    #[must_use]
    pub fn dedup_key(&self) -> (&str, Option<&str>) {
        (self.site.as_str(), self.url.as_deref())
    }

    /// Returns `true` if this row can compete for the model's best offer.
    #[must_use]
    pub fn is_comparable(&self) -> bool {
        self.in_stock == Some(true) && self.price_num.is_some_and(f64::is_finite)
    }
}

/// The cheapest in-stock row for a model in one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestOffer {
    pub model: String,
    pub price_num: f64,
    pub price_text: Option<String>,
    pub site: String,
    pub url: Option<String>,
    pub title: Option<String>,
}

impl BestOffer {
    /// Builds an offer from a comparable row. Returns `None` when the row has
    /// no numeric price.
    #[must_use]
    pub fn from_row(row: &CanonicalRow) -> Option<Self> {
        Some(Self {
            model: row.model.clone(),
            price_num: row.price_num?,
            price_text: row.price_text.clone(),
            site: row.site.clone(),
            url: row.url.clone(),
            title: row.title.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_row(price_num: Option<f64>, in_stock: Option<bool>) -> CanonicalRow {
        CanonicalRow {
            site: "LG UK".to_string(),
            model: "OLED55C4".to_string(),
            price_text: price_num.map(|p| format!("£{p:.2}")),
            price_num,
            title: Some("LG OLED55C46LA".to_string()),
            in_stock,
            url: Some("https://www.lg.com/uk/oled55c46la/".to_string()),
        }
    }

    #[test]
    fn comparable_requires_price_and_confirmed_stock() {
        assert!(make_row(Some(899.0), Some(true)).is_comparable());
        assert!(!make_row(Some(899.0), Some(false)).is_comparable());
        assert!(!make_row(Some(899.0), None).is_comparable());
        assert!(!make_row(None, Some(true)).is_comparable());
    }

    #[test]
    fn comparable_rejects_non_finite_price() {
        assert!(!make_row(Some(f64::NAN), Some(true)).is_comparable());
        assert!(!make_row(Some(f64::INFINITY), Some(true)).is_comparable());
    }

    #[test]
    fn dedup_key_uses_site_and_url() {
        let row = make_row(Some(899.0), Some(true));
        assert_eq!(
            row.dedup_key(),
            ("LG UK", Some("https://www.lg.com/uk/oled55c46la/"))
        );
    }

    #[test]
    fn best_offer_from_row_copies_display_fields() {
        let row = make_row(Some(849.99), Some(true));
        let offer = BestOffer::from_row(&row).expect("row has a price");
        assert_eq!(offer.model, "OLED55C4");
        assert!((offer.price_num - 849.99).abs() < f64::EPSILON);
        assert_eq!(offer.price_text.as_deref(), Some("£849.99"));
        assert_eq!(offer.site, "LG UK");
    }

    #[test]
    fn best_offer_from_row_without_price_is_none() {
        assert!(BestOffer::from_row(&make_row(None, Some(true))).is_none());
    }

    #[test]
    fn serde_roundtrip_row_keeps_absent_fields_absent() {
        let mut row = make_row(None, None);
        row.url = None;
        let json = serde_json::to_string(&row).expect("serialization failed");
        let decoded: CanonicalRow = serde_json::from_str(&json).expect("deserialization failed");
        assert_eq!(decoded, row);
        assert!(json.contains("\"in_stock\":null"));
    }
}
