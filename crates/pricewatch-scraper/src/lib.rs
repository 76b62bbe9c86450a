pub mod client;
pub mod error;
pub mod filters;
pub mod rate_limit;
pub mod retailers;
pub mod types;

pub use client::RetailerClient;
pub use error::ScraperError;
pub use filters::looks_like_target;
pub use rate_limit::RetryPolicy;
pub use retailers::{
    build_retailers, AmazonRetailer, LgRetailer, Retailer, RetailerFuture, SmithsRetailer,
};
pub use types::RawRow;
