/// A loosely structured observation as a retailer scraper produced it.
///
/// Every field is optional. Scrapers leave a field `None` when the page did
/// not supply it; normalization decides what a missing value means.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    /// Model the row was scraped for. `None` means "the model that was
    /// queried".
    pub model: Option<String>,
    /// Price text as displayed, currency symbol included (`"£1,299.00"`).
    pub price: Option<String>,
    pub title: Option<String>,
    /// `None` when the retailer exposes no stock signal.
    pub in_stock: Option<bool>,
    pub url: Option<String>,
}
