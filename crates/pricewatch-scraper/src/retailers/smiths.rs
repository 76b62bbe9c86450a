//! Smiths TV product pages.
//!
//! The storefront pushes product analytics into `sfDataLayer`; the selling
//! price sits at `ecommerce.view.price`. A page is treated as in stock iff
//! that price is present.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use super::{page_title, product_page_for, Retailer, RetailerFuture};
use crate::client::RetailerClient;
use crate::types::RawRow;

pub(super) const URL_TABLE_KEY: &str = "smiths";
const SITE: &str = "Smiths TV";

static DATA_LAYER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)sfDataLayer\.push\((\{.*?\})\);").expect("valid regex")
});

#[derive(Debug, Deserialize)]
struct DataLayerPush {
    #[serde(default)]
    ecommerce: Option<Ecommerce>,
}

#[derive(Debug, Deserialize)]
struct Ecommerce {
    #[serde(default)]
    view: Option<ProductView>,
}

#[derive(Debug, Deserialize)]
struct ProductView {
    #[serde(default)]
    price: Option<Value>,
}

pub struct SmithsRetailer {
    client: RetailerClient,
    product_urls: BTreeMap<String, String>,
}

impl SmithsRetailer {
    /// `product_urls` maps model keys to Smiths TV product pages.
    #[must_use]
    pub fn new(client: RetailerClient, product_urls: BTreeMap<String, String>) -> Self {
        Self {
            client,
            product_urls,
        }
    }
}

impl Retailer for SmithsRetailer {
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
                "parsed Smiths product page"
            );
            Ok(vec![row])
        })
    }
}

fn parse_product_page(html: &str, key: &str, url: &str) -> RawRow {
    let price = extract_data_layer_price(html);
    RawRow {
        model: None,
        in_stock: Some(price.is_some()),
        price: price.map(|p| format!("£{p}")),
        title: Some(page_title(html).unwrap_or_else(|| key.to_string())),
        url: Some(url.to_string()),
    }
}

/// First non-empty `ecommerce.view.price` among the page's data-layer
/// pushes. Pushes that are not valid JSON are skipped.
fn extract_data_layer_price(html: &str) -> Option<String> {
    DATA_LAYER_RE.captures_iter(html).find_map(|caps| {
        let push: DataLayerPush = serde_json::from_str(&caps[1]).ok()?;
        match push.ecommerce?.view?.price? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) if n.as_f64().is_some_and(|v| v > 0.0) => Some(n.to_string()),
            _ => None,
        }
    })
}
