//! Raw scraper rows → canonical rows.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use pricewatch_core::CanonicalRow;
use pricewatch_scraper::RawRow;

static PRICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\d,.]+").expect("valid regex"));

/// Numeric value of a displayed price.
///
/// Takes the first run of digits, commas and periods, drops the commas
/// (thousands separators) and parses the rest as a decimal. Text with no
/// such run, or a run that is not a number (`"..."`, `"1.2.3"`), yields
/// `None`. Never returns zero in place of a missing price.
#[must_use]
pub fn parse_price(text: &str) -> Option<f64> {
    let run = PRICE_RE.find(text)?.as_str().replace(',', "");
    run.parse::<f64>().ok().filter(|p| p.is_finite())
}

/// Converts one scraper row into the canonical schema.
///
/// `fallback_model` (the model that was queried) applies when the row names
/// no model. Blank strings become `None`; `price_num` is derived from the
/// price text and never defaulted.
#[must_use]
pub fn normalize_row(site: &str, raw: RawRow, fallback_model: &str) -> CanonicalRow {
    let price_text = non_blank(raw.price);
    let price_num = price_text.as_deref().and_then(parse_price);

    CanonicalRow {
        site: site.to_string(),
        model: non_blank(raw.model).unwrap_or_else(|| fallback_model.trim().to_string()),
        price_text,
        price_num,
        title: non_blank(raw.title),
        in_stock: raw.in_stock,
        url: non_blank(raw.url),
    }
}

/// Keeps the first row for each `(site, url)` pair, preserving order. Rows
/// without a url share the key `(site, None)`.
#[must_use]
pub fn dedupe_rows(rows: Vec<CanonicalRow>) -> Vec<CanonicalRow> {
    let mut seen: HashSet<(String, Option<String>)> = HashSet::new();
    rows.into_iter()
        .filter(|row| seen.insert((row.site.clone(), row.url.clone())))
        .collect()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
