//! Title screening for search-based retailers.
//!
//! Search result pages mix the television with wall brackets, cables,
//! warranties and other sizes of the same series. [`looks_like_target`]
//! keeps only titles that plausibly describe the queried set.

use std::sync::LazyLock;

use regex::Regex;

static MODEL_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"OLED(55|65)(C4|B4)").expect("valid regex"));
static QUERY_SIZE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(55|65)").expect("valid regex"));
static SIZE_55_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b55\b|55"|\b55-?INCH\b|\b55IN\b|OLED55"#).expect("valid regex")
});
static SIZE_65_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b65\b|65"|\b65-?INCH\b|\b65IN\b|OLED65"#).expect("valid regex")
});
static NEGATIVE_KEYWORDS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(stand|bracket|mount|wall|cover|remote|protector|screen|glass|soundbar|hdmi|cable|monitor|replacement|case|gift\s*card|warranty|insurance|subscription|voucher|gaming\s*monitor)",
    )
    .expect("valid regex")
});
static REFERENCE_PRICE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(RRP|List Price|Was|R\.R\.P)\b").expect("valid regex")
});

/// Returns `true` if a search-result `title` plausibly describes the
/// television named by `model_query`.
///
/// All of the following must hold:
/// 1. the title names LG or carries an `OLED55C4`-style model prefix;
/// 2. it contains the series (`C4`/`B4`) named in the query, or either
///    series when the query names none;
/// 3. it mentions the query's screen size (`55`/`65`, default `65`);
/// 4. it contains no accessory or service keyword.
#[must_use]
pub fn looks_like_target(title: &str, model_query: &str) -> bool {
    if title.trim().is_empty() {
        return false;
    }
    let upper = title.to_uppercase();

    if !(upper.contains("LG") || MODEL_PREFIX_RE.is_match(&upper)) {
        return false;
    }

    let query = model_query.to_uppercase();
    let mut series: Vec<&str> = ["C4", "B4"]
        .into_iter()
        .filter(|s| query.contains(s))
        .collect();
    if series.is_empty() {
        series = vec!["C4", "B4"];
    }
    if !series.iter().any(|s| upper.contains(s)) {
        return false;
    }

    let size_re = match QUERY_SIZE_RE.find(model_query).map(|m| m.as_str()) {
        Some("55") => &*SIZE_55_RE,
        _ => &*SIZE_65_RE,
    };
    if !size_re.is_match(&upper) {
        return false;
    }

    !NEGATIVE_KEYWORDS_RE.is_match(title)
}

/// Returns `true` if a price label is a reference price (RRP, list price,
/// "was") rather than the selling price.
#[must_use]
pub fn is_reference_price(text: &str) -> bool {
    REFERENCE_PRICE_RE.is_match(text)
}

/// Upper-cases and strips spaces so `"LG OLED55C4"` and `"oled55c4"` compare
/// against URL-table keys the same way.
#[must_use]
pub fn model_lookup_key(model: &str) -> String {
    model.replace(' ', "").to_uppercase()
}
