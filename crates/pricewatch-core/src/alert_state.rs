//! Cross-run alert memory.
//!
//! The persisted document is a JSON object keyed by model:
//!
//! ```json
//! {
//!   "OLED55C4": {
//!     "last_notified_price": 849.0,
//!     "last_site": "LG UK",
//!     "last_url": "https://www.lg.com/uk/...",
//!     "timestamp": "2026-10-16T09:20:00Z"
//!   }
//! }
//! ```
//!
//! Older files name the timestamp `ts` and write it without an offset
//! (`2025-03-01T10:00:00`); such values are read as local time. An entry that
//! cannot be read is dropped on its own and the rest of the document is kept.

use std::collections::BTreeMap;

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::de::{self, IgnoredAny};
use serde::{Deserialize, Deserializer, Serialize};

use crate::offers::BestOffer;

/// What was last sent for one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub last_notified_price: f64,
    #[serde(default)]
    pub last_site: String,
    #[serde(default)]
    pub last_url: String,
    /// Older state files wrote this field as `ts`.
    #[serde(alias = "ts", deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
}

/// Parses an RFC 3339 timestamp, or a naive ISO-8601 one taken as local time.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()?;
    // A local time skipped by a DST jump has no mapping; fall back to UTC.
    Some(
        Local
            .from_local_datetime(&naive)
            .earliest()
            .map_or_else(|| naive.and_utc(), |t| t.with_timezone(&Utc)),
    )
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp {raw:?}")))
}

/// Model key to last notification. A model with no entry has never alerted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AlertState(BTreeMap<String, AlertRecord>);

impl<'de> Deserialize<'de> for AlertState {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Entry {
            Record(AlertRecord),
            Unreadable(IgnoredAny),
        }

        let entries = BTreeMap::<String, Entry>::deserialize(deserializer)?;
        let records = entries
            .into_iter()
            .filter_map(|(model, entry)| match entry {
                Entry::Record(record) => Some((model, record)),
                Entry::Unreadable(_) => {
                    tracing::warn!(model, "unreadable alert state entry dropped");
                    None
                }
            })
            .collect();
        Ok(Self(records))
    }
}

impl AlertState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, model: &str) -> Option<&AlertRecord> {
        self.0.get(model)
    }

    /// Price of the last alert for `model`, if one was ever sent.
    #[must_use]
    pub fn last_notified_price(&self, model: &str) -> Option<f64> {
        self.0.get(model).map(|r| r.last_notified_price)
    }

    /// Replaces the entries for exactly the dispatched models. Models not in
    /// `offers` keep their previous record.
    pub fn record_dispatch(&mut self, offers: &[BestOffer], at: DateTime<Utc>) {
        for offer in offers {
            self.0.insert(
                offer.model.clone(),
                AlertRecord {
                    last_notified_price: offer.price_num,
                    last_site: offer.site.clone(),
                    last_url: offer.url.clone().unwrap_or_default(),
                    timestamp: at,
                },
            );
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AlertRecord)> {
        self.0.iter().map(|(model, record)| (model.as_str(), record))
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

#[cfg(test)]
mod tests {
    use super::*;

    fn offer(model: &str, price: f64) -> BestOffer {
        BestOffer {
            model: model.to_string(),
            price_num: price,
            price_text: Some(format!("£{price}")),
            site: "LG UK".to_string(),
            url: Some(format!("https://www.lg.com/uk/{}/", model.to_lowercase())),
            title: None,
        }
    }

    #[test]
    fn record_dispatch_replaces_only_dispatched_models() {
        let t0 = Utc.with_ymd_and_hms(2026, 10, 1, 9, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2026, 10, 2, 9, 0, 0).unwrap();

        let mut state = AlertState::new();
        state.record_dispatch(&[offer("OLED55C4", 850.0), offer("OLED65C4", 1300.0)], t0);
        state.record_dispatch(&[offer("OLED55C4", 820.0)], t1);

        assert_eq!(state.len(), 2);
        assert_eq!(state.last_notified_price("OLED55C4"), Some(820.0));
        assert_eq!(state.get("OLED55C4").unwrap().timestamp, t1);
        assert_eq!(state.last_notified_price("OLED65C4"), Some(1300.0));
        assert_eq!(state.get("OLED65C4").unwrap().timestamp, t0);
    }

    #[test]
    fn missing_url_is_stored_as_empty_string() {
        let mut o = offer("OLED55B4", 700.0);
        o.url = None;
        let mut state = AlertState::new();
        state.record_dispatch(&[o], Utc::now());
        assert_eq!(state.get("OLED55B4").unwrap().last_url, "");
    }

    #[test]
    fn deserializes_legacy_ts_field() {
        let json = r#"{
            "OLED55C4": {
                "last_notified_price": 989.0,
                "last_site": "Amazon",
                "last_url": "https://www.amazon.co.uk/dp/B0CVRZ",
                "ts": "2025-03-01T10:00:00Z"
            }
        }"#;
        let state: AlertState = serde_json::from_str(json).expect("legacy state parses");
        assert_eq!(state.last_notified_price("OLED55C4"), Some(989.0));
        assert_eq!(state.last_notified_price("OLED65C4"), None);
    }

    #[test]
    fn deserializes_naive_legacy_timestamp_as_local_time() {
        let json = r#"{
            "OLED55C4": {
                "last_notified_price": 850.0,
                "last_site": "Currys",
                "last_url": "https://example.test/oled55c4",
                "ts": "2025-01-15T10:00:00"
            }
        }"#;
        let state: AlertState = serde_json::from_str(json).expect("naive timestamp parses");
        let record = state.get("OLED55C4").expect("entry kept");
        assert!((record.last_notified_price - 850.0).abs() < f64::EPSILON);
        assert_eq!(
            record.timestamp.with_timezone(&Local).naive_local(),
            NaiveDateTime::parse_from_str("2025-01-15T10:00:00", "%Y-%m-%dT%H:%M:%S").unwrap()
        );
    }

    #[test]
    fn unreadable_entry_is_dropped_alone() {
        let json = r#"{
            "OLED55C4": {"last_notified_price": 850.0, "ts": "2025-03-01T10:00:00"},
            "OLED65C4": {"last_notified_price": 1300.0, "timestamp": "last tuesday"},
            "OLED55B4": {"last_site": "LG UK"}
        }"#;
        let state: AlertState = serde_json::from_str(json).expect("document parses");
        assert_eq!(state.len(), 1);
        assert_eq!(state.last_notified_price("OLED55C4"), Some(850.0));
    }

    #[test]
    fn parse_timestamp_accepts_offsets_and_rejects_garbage() {
        assert_eq!(
            parse_timestamp("2026-10-16T09:20:00+01:00"),
            Some(Utc.with_ymd_and_hms(2026, 10, 16, 8, 20, 0).unwrap())
        );
        assert!(parse_timestamp("2025-03-01 10:00:00").is_some());
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn serializes_as_plain_model_map() {
        let mut state = AlertState::new();
        state.record_dispatch(
            &[offer("OLED55C4", 850.0)],
            Utc.with_ymd_and_hms(2026, 10, 16, 8, 0, 0).unwrap(),
        );
        let value = serde_json::to_value(&state).expect("serializes");
        assert_eq!(value["OLED55C4"]["last_notified_price"], 850.0);
        assert_eq!(value["OLED55C4"]["last_site"], "LG UK");
        assert_eq!(value["OLED55C4"]["timestamp"], "2026-10-16T08:00:00Z");
    }
}
