//! Per-cycle price report.
//!
//! Each cycle writes one JSON document, `prices_<YYYYmmdd-HHMMSS>.json`, in the
//! report directory. Earlier tooling produced `tv_prices_<stamp>.csv` and a
//! styled HTML page instead; neither is written here.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use pricewatch_core::CanonicalRow;
use serde::Serialize;

use crate::error::ReportError;

/// A report row: the canonical row plus whether it is its model's cheapest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    #[serde(flatten)]
    pub row: CanonicalRow,
    pub best: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceReport {
    pub generated_at: DateTime<Utc>,
    pub rows: Vec<ReportRow>,
}

/// Sorts rows by model, price (unpriced last), then site, and flags the
/// cheapest priced row of each model regardless of stock.
#[must_use]
pub fn build_report(rows: &[CanonicalRow], at: DateTime<Utc>) -> PriceReport {
    let mut sorted: Vec<CanonicalRow> = rows.to_vec();
    sorted.sort_by(|a, b| {
        a.model
            .cmp(&b.model)
            .then_with(|| cmp_price(a.price_num, b.price_num))
            .then_with(|| a.site.cmp(&b.site))
    });

    // After sorting, the first priced row of each model is its cheapest.
    let mut flagged = HashSet::new();
    let rows = sorted
        .into_iter()
        .map(|row| {
            let best = row.price_num.is_some_and(f64::is_finite)
                && flagged.insert(row.model.clone());
            ReportRow { row, best }
        })
        .collect();

    PriceReport {
        generated_at: at,
        rows,
    }
}

fn cmp_price(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Receives the cycle's full deduplicated row set.
pub trait ReportSink: Send + Sync {
    /// # Errors
    ///
    /// Returns [`ReportError`] if the report cannot be written.
    fn write(&self, rows: &[CanonicalRow], at: DateTime<Utc>) -> Result<(), ReportError>;
}

/// Writes each report to `prices_<YYYYmmdd-HHMMSS>.json` under a directory.
#[derive(Debug, Clone)]
pub struct JsonReportWriter {
    dir: PathBuf,
}

impl JsonReportWriter {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn path_for(&self, at: DateTime<Utc>) -> PathBuf {
        self.dir
            .join(format!("prices_{}.json", at.format("%Y%m%d-%H%M%S")))
    }
}

impl ReportSink for JsonReportWriter {
    fn write(&self, rows: &[CanonicalRow], at: DateTime<Utc>) -> Result<(), ReportError> {
        let path = self.path_for(at);
        let io_error = |source| ReportError::Io {
            path: path.display().to_string(),
            source,
        };

        let report = build_report(rows, at);
        let json = serde_json::to_string_pretty(&report)?;
        fs::create_dir_all(&self.dir).map_err(io_error)?;
        fs::write(&path, json).map_err(io_error)?;

        tracing::info!(path = %path.display(), rows = report.rows.len(), "price report written");
        Ok(())
    }
}
