//! URL origin and host helpers for retailer requests.

/// Extracts the scheme+host origin from a page URL.
///
/// Given `"https://www.lg.com/uk/tvs-soundbars/oled-evo/oled55c46la/"`,
/// returns `"https://www.lg.com"`. Used as the warm-up target and the
/// `Referer` base.
#[must_use]
pub fn extract_origin(page_url: &str) -> String {
    reqwest::Url::parse(page_url).map_or_else(
        |e| {
            tracing::warn!(
                page_url,
                error = %e,
                "could not parse retailer URL; falling back to string split for origin"
            );
            page_url
                .trim_end_matches('/')
                .splitn(4, '/')
                .take(3)
                .collect::<Vec<_>>()
                .join("/")
        },
        |u| u.origin().ascii_serialization(),
    )
}

/// Extracts the hostname from a URL for error messages and log fields.
///
/// Falls back to the full URL string if parsing fails.
pub(crate) fn extract_domain(page_url: &str) -> String {
    reqwest::Url::parse(page_url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_owned))
        .unwrap_or_else(|| page_url.to_owned())
}
