use super::*;

const BASE: &str = "https://www.amazon.co.uk";

fn result_block(asin: &str, title: &str, href: &str, price_html: &str) -> String {
    format!(
        r#"<div data-asin="{asin}" data-index="1" data-component-type="s-search-result" class="s-result-item">
  <div class="a-section">
    <a class="a-link-normal s-line-clamp-2 s-link-style" href="{href}">
      <h2 class="a-size-medium"><span>{title}</span></h2>
    </a>
    {price_html}
  </div>
</div>"#
    )
}

const OFFSCREEN_PRICE: &str = r#"<span class="a-price" data-a-size="xl"><span class="a-offscreen">£1,099.00</span><span aria-hidden="true"><span class="a-price-whole">1,099<span class="a-price-decimal">.</span></span><span class="a-price-fraction">00</span></span></span>"#;

fn page(blocks: &[String]) -> String {
    format!(
        "<html><body><div class=\"s-main-slot\">{}</div></body></html>",
        blocks.join("\n")
    )
}

#[test]
fn parses_matching_result() {
    let html = page(&[result_block(
        "B0CVRZ1234",
        "LG OLED55C46LA 55 inch 4K Smart OLED evo TV",
        "/LG-OLED55C46LA/dp/B0CVRZ1234/ref=sr_1_1?keywords=OLED55C4&amp;sr=8-1",
        OFFSCREEN_PRICE,
    )]);
    let rows = parse_search_results(&html, "OLED55C4", BASE);
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(
        row.url.as_deref(),
        Some("https://www.amazon.co.uk/LG-OLED55C46LA/dp/B0CVRZ1234/ref=sr_1_1?keywords=OLED55C4&sr=8-1")
    );
    assert_eq!(row.price.as_deref(), Some("£1,099.00"));
    assert_eq!(
        row.title.as_deref(),
        Some("LG OLED55C46LA 55 inch 4K Smart OLED evo TV")
    );
    assert_eq!(row.in_stock, None);
    assert_eq!(row.model, None);
}

#[test]
fn skips_accessories_and_other_sizes() {
    let html = page(&[
        result_block(
            "B01",
            "Wall Bracket for LG OLED55C4 55 inch",
            "/bracket/dp/B01",
            OFFSCREEN_PRICE,
        ),
        result_block("B02", "LG OLED65C46LA 65 inch", "/lg65/dp/B02", OFFSCREEN_PRICE),
    ]);
    assert!(parse_search_results(&html, "OLED55C4", BASE).is_empty());
}

#[test]
fn drops_results_without_product_link() {
    let html = page(&[result_block(
        "B03",
        "LG OLED55C4 55 inch",
        "/sspa/click?adId=123",
        OFFSCREEN_PRICE,
    )]);
    assert!(parse_search_results(&html, "OLED55C4", BASE).is_empty());
}

#[test]
fn repeated_asin_and_url_are_collapsed() {
    let block = result_block("B04", "LG OLED55C4 55 inch", "/lg/dp/B04", OFFSCREEN_PRICE);
    let same_url_other_asin =
        result_block("B05", "LG OLED55C4 55 inch", "/lg/dp/B04", OFFSCREEN_PRICE);
    let html = page(&[block.clone(), block, same_url_other_asin]);
    assert_eq!(parse_search_results(&html, "OLED55C4", BASE).len(), 1);
}

#[test]
fn price_skips_struck_through_and_rrp() {
    let price_html = r#"<span class="a-price a-text-price" data-a-strike="true"><span class="a-offscreen">£1,799.00</span></span>
<span class="a-price"><span class="a-offscreen">RRP: £1,499.00</span></span>
<span class="a-price"><span class="a-offscreen">£1,049.99</span></span>"#;
    assert_eq!(extract_price(price_html).as_deref(), Some("£1,049.99"));
}

#[test]
fn price_falls_back_to_whole_and_fraction() {
    let price_html = r#"<span class="a-price-whole">1,249<span class="a-price-decimal">.</span></span><span class="a-price-fraction">95</span>"#;
    assert_eq!(extract_price(price_html).as_deref(), Some("£1249.95"));
}

#[test]
fn price_fraction_defaults_to_zero() {
    let price_html = r#"<span class="a-price-whole">999</span>"#;
    assert_eq!(extract_price(price_html).as_deref(), Some("£999.00"));
}

#[test]
fn no_price_markup_is_none() {
    assert_eq!(extract_price("<span>Currently unavailable.</span>"), None);
}

#[test]
fn link_inside_heading_is_used_when_no_wrapper() {
    let block = r#"<div data-asin="B06" data-component-type="s-search-result">
<h2><a class="a-link-normal a-text-normal" href="https://www.amazon.co.uk/x/dp/B06"><span>LG OLED55B4 55"</span></a></h2></div>"#;
    let (title, url) = title_and_link(block, BASE);
    assert_eq!(title, "LG OLED55B4 55\"");
    assert_eq!(url.as_deref(), Some("https://www.amazon.co.uk/x/dp/B06"));
}

#[test]
fn search_url_encodes_query() {
    let client = RetailerClient::new(5, crate::RetryPolicy::immediate()).unwrap();
    let amazon = AmazonRetailer::with_base_url(client, "http://127.0.0.1:9999/");
    assert_eq!(
        amazon.search_url("LG OLED55C4").unwrap(),
        "http://127.0.0.1:9999/s?k=LG+OLED55C4"
    );
}
