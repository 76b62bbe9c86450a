//! Per-retailer scrapers behind one capability.
//!
//! Each retailer turns a model query into zero or more [`RawRow`]s. Retailers
//! with fixed product pages (LG, Smiths) only answer for models that have a
//! page in the watchlist; Amazon searches for every model.

mod amazon;
mod lg;
mod smiths;

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::LazyLock;

use regex::Regex;

use pricewatch_core::{AppConfig, Watchlist};

use crate::client::RetailerClient;
use crate::error::ScraperError;
use crate::filters::model_lookup_key;
use crate::rate_limit::RetryPolicy;
use crate::types::RawRow;

pub use amazon::AmazonRetailer;
pub use lg::LgRetailer;
pub use smiths::SmithsRetailer;

/// Boxed future returned by [`Retailer::fetch_rows`].
pub type RetailerFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<RawRow>, ScraperError>> + Send + 'a>>;

/// A source of price observations.
pub trait Retailer: Send + Sync {
    /// Display name recorded on every row, e.g. `"LG UK"`.
    fn site(&self) -> &str;

    /// Scrapes rows for one model query. An empty vector means the retailer
    /// has nothing for this model; an error means the fetch itself failed.
    fn fetch_rows<'a>(&'a self, model: &'a str) -> RetailerFuture<'a>;
}

/// Builds the three shipped retailers, each with its own client (and so its
/// own user agent).
///
/// # Errors
///
/// Returns [`ScraperError::Http`] if an HTTP client cannot be constructed.
pub fn build_retailers(
    config: &AppConfig,
    watchlist: &Watchlist,
) -> Result<Vec<Box<dyn Retailer>>, ScraperError> {
    let retry = RetryPolicy::from_config(config);
    let timeout = config.scraper_request_timeout_secs;

    let amazon: Box<dyn Retailer> =
        Box::new(AmazonRetailer::new(RetailerClient::new(timeout, retry)?));
    let lg_uk: Box<dyn Retailer> = Box::new(LgRetailer::new(
        RetailerClient::new(timeout, retry)?,
        watchlist.product_urls_for(lg::URL_TABLE_KEY),
    ));
    let smiths_tv: Box<dyn Retailer> = Box::new(SmithsRetailer::new(
        RetailerClient::new(timeout, retry)?,
        watchlist.product_urls_for(smiths::URL_TABLE_KEY),
    ));

    Ok(vec![amazon, lg_uk, smiths_tv])
}

/// Finds the product page for `model` in a key → URL table.
///
/// A key matches when it is contained in the upper-cased, space-stripped
/// model query, so `"LG OLED55C4"` finds the `OLED55C4` page. Returns the
/// matching key and URL.
pub(crate) fn product_page_for<'a>(
    urls: &'a BTreeMap<String, String>,
    model: &str,
) -> Option<(&'a str, &'a str)> {
    let lookup = model_lookup_key(model);
    urls.iter()
        .find(|(key, _)| lookup.contains(&model_lookup_key(key)))
        .map(|(key, url)| (key.as_str(), url.as_str()))
}

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"));
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title\b[^>]*>(.*?)</title>").expect("valid regex"));

/// Visible text of an HTML fragment: tags removed, common entities decoded,
/// whitespace collapsed.
pub(crate) fn html_text(fragment: &str) -> String {
    let stripped = TAG_RE.replace_all(fragment, " ");
    let decoded = decode_entities(&stripped);
    WHITESPACE_RE.replace_all(&decoded, " ").trim().to_string()
}

pub(crate) fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&pound;", "£")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Text of the page `<title>`, if present and non-empty.
pub(crate) fn page_title(html: &str) -> Option<String> {
    TITLE_RE
        .captures(html)
        .map(|c| html_text(&c[1]))
        .filter(|t| !t.is_empty())
}
