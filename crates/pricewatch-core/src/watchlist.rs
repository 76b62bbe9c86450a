//! Tracked-model watchlist loaded from YAML.
//!
//! The watchlist is the static configuration for a cycle: which model keys
//! are scraped, the price ceiling for each, and the fixed product pages that
//! page-based retailers (LG, Smiths) fetch directly.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// One tracked model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Canonical model key, e.g. `"OLED55C4"`. Scraped rows must carry this
    /// exact key for the threshold to apply.
    pub key: String,
    /// Alert ceiling; only prices strictly below it can trigger.
    pub threshold: f64,
    /// Retailer slug (`"lg"`, `"smiths"`) to product page URL.
    #[serde(default)]
    pub product_urls: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Watchlist {
    pub models: Vec<ModelConfig>,
}

impl Watchlist {
    /// Model keys in configuration order.
    #[must_use]
    pub fn model_keys(&self) -> Vec<&str> {
        self.models.iter().map(|m| m.key.as_str()).collect()
    }

    /// Per-model ceilings in configuration order.
    #[must_use]
    pub fn thresholds(&self) -> Thresholds {
        self.models
            .iter()
            .map(|m| (m.key.clone(), m.threshold))
            .collect()
    }

    /// Model key to product URL for one retailer. Models without a page at
    /// that retailer are omitted.
    #[must_use]
    pub fn product_urls_for(&self, retailer: &str) -> BTreeMap<String, String> {
        self.models
            .iter()
            .filter_map(|m| {
                m.product_urls
                    .get(retailer)
                    .map(|url| (m.key.clone(), url.clone()))
            })
            .collect()
    }
}

/// Ordered model → ceiling mapping.
///
/// Order matters: the decision engine reports triggered models in the order
/// they were configured, which is also the order they appear in the alert mail.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Thresholds(Vec<(String, f64)>);

impl Thresholds {
    #[must_use]
    pub fn get(&self, model: &str) -> Option<f64> {
        self.0
            .iter()
            .find(|(key, _)| key == model)
            .map(|(_, ceiling)| *ceiling)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(key, ceiling)| (key.as_str(), *ceiling))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, f64)> for Thresholds {
    /// Later duplicates of a key are ignored; the first ceiling wins.
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        let mut entries: Vec<(String, f64)> = Vec::new();
        for (key, ceiling) in iter {
            if !entries.iter().any(|(k, _)| *k == key) {
                entries.push((key, ceiling));
            }
        }
        Self(entries)
    }
}

/// Load and validate the watchlist from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_watchlist(path: &Path) -> Result<Watchlist, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::WatchlistFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let watchlist: Watchlist = serde_yaml::from_str(&content)?;

    validate_watchlist(&watchlist)?;

    Ok(watchlist)
}

fn validate_watchlist(watchlist: &Watchlist) -> Result<(), ConfigError> {
    if watchlist.models.is_empty() {
        return Err(ConfigError::Validation(
            "watchlist must track at least one model".to_string(),
        ));
    }

    let mut seen_keys = HashSet::new();

    for model in &watchlist.models {
        if model.key.trim().is_empty() {
            return Err(ConfigError::Validation(
                "model key must be non-empty".to_string(),
            ));
        }

        if !seen_keys.insert(model.key.to_uppercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate model key: '{}'",
                model.key
            )));
        }

        if !model.threshold.is_finite() || model.threshold <= 0.0 {
            return Err(ConfigError::Validation(format!(
                "model '{}' has invalid threshold {}; must be a positive amount",
                model.key, model.threshold
            )));
        }

        for (retailer, url) in &model.product_urls {
            let parsed = reqwest::Url::parse(url).map_err(|e| {
                ConfigError::Validation(format!(
                    "model '{}' has an invalid {retailer} URL \"{url}\": {e}",
                    model.key
                ))
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ConfigError::Validation(format!(
                    "model '{}' has a non-http {retailer} URL \"{url}\"",
                    model.key
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "watchlist_test.rs"]
mod tests;
