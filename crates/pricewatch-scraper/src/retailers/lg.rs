//! LG UK product pages.
//!
//! Price and availability come from the page's JSON-LD `Product` block. A
//! page without a usable block still yields a row, just without a price and
//! marked out of stock.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::{page_title, product_page_for, Retailer, RetailerFuture};
use crate::client::RetailerClient;
use crate::types::RawRow;

pub(super) const URL_TABLE_KEY: &str = "lg";
const SITE: &str = "LG UK";

static JSON_LD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<script\b[^>]*type\s*=\s*["']application/ld\+json["'][^>]*>(.*?)</script>"#)
        .expect("valid regex")
});

pub struct LgRetailer {
    client: RetailerClient,
    product_urls: BTreeMap<String, String>,
}

impl LgRetailer {
    /// `product_urls` maps model keys to LG UK product pages.
    #[must_use]
    pub fn new(client: RetailerClient, product_urls: BTreeMap<String, String>) -> Self {
        Self {
            client,
            product_urls,
        }
    }
}

impl Retailer for LgRetailer {
    fn site(&self) -> &str {
        SITE
    }

    fn fetch_rows<'a>(&'a self, model: &'a str) -> RetailerFuture<'a> {
        Box::pin(async move {
            let Some((key, url)) = product_page_for(&self.product_urls, model) else {
                return Ok(Vec::new());
            };
            let html = self.client.fetch_page(url, None).await?;
            let row = parse_product_page(&html, key, url);
            tracing::debug!(
                site = SITE,
                model,
                price = row.price.as_deref().unwrap_or("-"),
                in_stock = row.in_stock,
                "parsed LG product page"
            );
            Ok(vec![row])
        })
    }
}

/// Builds the row for one product page. `key` is the title fallback.
fn parse_product_page(html: &str, key: &str, url: &str) -> RawRow {
    let (price, in_stock) = extract_offer(html).unwrap_or((None, false));
    RawRow {
        model: None,
        price: price.map(|p| format!("£{p}")),
        title: Some(page_title(html).unwrap_or_else(|| key.to_string())),
        in_stock: Some(in_stock),
        url: Some(url.to_string()),
    }
}

/// Price and stock flag from the first JSON-LD `Product` with an offer
/// object. Blocks that fail to parse are skipped.
fn extract_offer(html: &str) -> Option<(Option<String>, bool)> {
    JSON_LD_RE.captures_iter(html).find_map(|caps| {
        let data: Value = serde_json::from_str(caps[1].trim()).ok()?;
        match data {
            Value::Array(items) => items.iter().find_map(product_offer),
            other => product_offer(&other),
        }
    })
}

fn product_offer(item: &Value) -> Option<(Option<String>, bool)> {
    let is_product = item
        .get("@type")
        .and_then(Value::as_str)
        .is_some_and(|t| t.eq_ignore_ascii_case("product"));
    if !is_product {
        return None;
    }

    let offer = item.get("offers")?.as_object()?;
    let price = match offer.get("price") {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };
    let availability = offer
        .get("availability")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_lowercase();
    let in_stock = price.is_some() && availability.contains("instock");
    Some((price, in_stock))
}
