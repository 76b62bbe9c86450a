//! Amazon UK search results.
//!
//! One search per model. Result blocks are screened with
//! [`looks_like_target`] so accessories and other sizes drop out. Amazon
//! search pages carry no reliable stock signal, so rows leave `in_stock`
//! unset.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use super::{decode_entities, html_text, Retailer, RetailerFuture};
use crate::client::RetailerClient;
use crate::error::ScraperError;
use crate::filters::{is_reference_price, looks_like_target};
use crate::types::RawRow;

const SITE: &str = "Amazon";
const BASE_URL: &str = "https://www.amazon.co.uk";

static RESULT_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<div\b[^>]*\bdata-component-type\s*=\s*"s-search-result"[^>]*>"#)
        .expect("valid regex")
});
static ASIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\bdata-asin\s*=\s*"([^"]*)""#).expect("valid regex"));
static H2_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<h2\b[^>]*>(.*?)</h2>").expect("valid regex"));
static ANCHOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<a\b[^>]*>").expect("valid regex"));
static CLASS_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?is)\sclass\s*=\s*"([^"]*)""#).expect("valid regex"));
static HREF_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?is)\shref\s*=\s*"([^"]*)""#).expect("valid regex"));
static OFFSCREEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)<span\b([^>]*)>\s*<span\b[^>]*class\s*=\s*"[^"]*\ba-offscreen\b[^"]*"[^>]*>(.*?)</span>"#,
    )
    .expect("valid regex")
});
static PRICE_WHOLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<span\b[^>]*class\s*=\s*"[^"]*\ba-price-whole\b[^"]*"[^>]*>(.*?)</span>"#)
        .expect("valid regex")
});
static PRICE_FRACTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)<span\b[^>]*class\s*=\s*"[^"]*\ba-price-fraction\b[^"]*"[^>]*>(.*?)</span>"#,
    )
    .expect("valid regex")
});

pub struct AmazonRetailer {
    client: RetailerClient,
    base_url: String,
}

impl AmazonRetailer {
    #[must_use]
    pub fn new(client: RetailerClient) -> Self {
        Self::with_base_url(client, BASE_URL)
    }

    /// Points the retailer at another storefront root. Result links are
    /// resolved against it too.
    #[must_use]
    pub fn with_base_url(client: RetailerClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// `<base>/s?k=<model>`, with the model form-encoded.
    fn search_url(&self, model: &str) -> Result<String, ScraperError> {
        let base = format!("{}/s", self.base_url);
        let mut url = reqwest::Url::parse(&base).map_err(|e| ScraperError::InvalidUrl {
            url: base.clone(),
            reason: e.to_string(),
        })?;
        url.query_pairs_mut().append_pair("k", model);
        Ok(url.to_string())
    }
}

impl Retailer for AmazonRetailer {
    fn site(&self) -> &str {
        SITE
    }

    fn fetch_rows<'a>(&'a self, model: &'a str) -> RetailerFuture<'a> {
        Box::pin(async move {
            let search_url = self.search_url(model)?;
            let referer = self.client.warm_up(&self.base_url).await;
            let html = self
                .client
                .fetch_page(&search_url, referer.as_deref())
                .await?;
            let rows = parse_search_results(&html, model, &self.base_url);
            tracing::debug!(site = SITE, model, rows = rows.len(), "parsed Amazon search results");
            Ok(rows)
        })
    }
}

/// Extracts candidate rows from a search results page.
///
/// Repeated ASINs are skipped before screening; surviving rows must pass
/// [`looks_like_target`], have a `/dp/` product link, and have a url not
/// already seen.
fn parse_search_results(html: &str, model_query: &str, base_url: &str) -> Vec<RawRow> {
    let opens: Vec<_> = RESULT_OPEN_RE.find_iter(html).collect();
    let mut seen_asins = HashSet::new();
    let mut seen_urls = HashSet::new();
    let mut rows = Vec::new();

    for (i, open) in opens.iter().enumerate() {
        let end = opens.get(i + 1).map_or(html.len(), regex::Match::start);
        let block = &html[open.start()..end];

        let asin = ASIN_RE
            .captures(open.as_str())
            .map(|c| c[1].trim().to_string())
            .filter(|a| !a.is_empty());
        if let Some(asin) = asin {
            if !seen_asins.insert(asin) {
                continue;
            }
        }

        let (title, url) = title_and_link(block, base_url);
        if !looks_like_target(&title, model_query) {
            continue;
        }
        let Some(url) = url else {
            continue;
        };
        if !seen_urls.insert(url.clone()) {
            continue;
        }

        rows.push(RawRow {
            model: None,
            price: extract_price(block),
            title: Some(title),
            in_stock: None,
            url: Some(url),
        });
    }

    rows
}

/// Title from the block's `<h2>` and the product link that wraps it (or,
/// failing that, one inside it). Links without `/dp/` are discarded.
fn title_and_link(block: &str, base_url: &str) -> (String, Option<String>) {
    let Some(h2) = H2_RE.captures(block) else {
        return (String::new(), None);
    };
    let title = html_text(&h2[1]);
    let (h2_start, h2_end) = h2.get(0).map_or((0, 0), |m| (m.start(), m.end()));

    let normal_links: Vec<(usize, String)> = ANCHOR_RE
        .find_iter(block)
        .filter_map(|tag| {
            let class = CLASS_ATTR_RE.captures(tag.as_str())?;
            if !class[1].split_whitespace().any(|c| c == "a-link-normal") {
                return None;
            }
            let href = HREF_ATTR_RE.captures(tag.as_str())?;
            Some((tag.start(), decode_entities(&href[1])))
        })
        .collect();

    let parent = normal_links.iter().rev().find(|(pos, _)| *pos < h2_start);
    let child = normal_links
        .iter()
        .find(|(pos, _)| (h2_start..h2_end).contains(pos));

    let url = parent
        .or(child)
        .map(|(_, href)| absolute_url(base_url, href))
        .filter(|u| u.contains("/dp/"));

    (title, url)
}

fn absolute_url(base_url: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else {
        format!("{base_url}{href}")
    }
}

/// Selling price for one result block.
///
/// Prefers the screen-reader `a-offscreen` text inside an `a-price` span,
/// skipping struck-through prices and RRP/"Was" labels. Falls back to
/// joining `a-price-whole` and `a-price-fraction`.
fn extract_price(block: &str) -> Option<String> {
    for caps in OFFSCREEN_RE.captures_iter(block) {
        let outer = &caps[1];
        let is_price_span = CLASS_ATTR_RE
            .captures(outer)
            .is_some_and(|c| c[1].split_whitespace().any(|cls| cls == "a-price"));
        if !is_price_span || outer.contains(r#"data-a-strike="true""#) {
            continue;
        }
        let text = html_text(&caps[2]);
        if !text.is_empty() && !is_reference_price(&text) {
            return Some(text);
        }
    }

    let whole = PRICE_WHOLE_RE.captures(block).map(|c| html_text(&c[1]))?;
    let whole = whole.replace(',', "");
    let whole = whole.trim_end_matches('.').trim();
    if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let fraction = PRICE_FRACTION_RE
        .captures(block)
        .map(|c| html_text(&c[1]))
        .filter(|f| !f.is_empty())
        .unwrap_or_else(|| "00".to_string());
    Some(format!("£{whole}.{fraction}"))
}

#[cfg(test)]
#[path = "amazon_test.rs"]
mod tests;
