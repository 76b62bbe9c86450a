//! One scrape-to-alert cycle.

use std::collections::BTreeMap;

use chrono::Utc;
use pricewatch_core::{BestOffer, CanonicalRow, Watchlist};
use pricewatch_scraper::Retailer;

use crate::aggregate::best_offers;
use crate::decide::{evaluate, triggered, DecisionPolicy, ModelDecision};
use crate::error::StateError;
use crate::normalize::{dedupe_rows, normalize_row};
use crate::notify::Notifier;
use crate::report::ReportSink;
use crate::state::AlertStateStore;

/// Collaborators and settings for [`run_cycle`].
pub struct CycleContext<'a> {
    pub retailers: &'a [Box<dyn Retailer>],
    pub watchlist: &'a Watchlist,
    pub store: &'a AlertStateStore,
    /// `None` runs the cycle dry: decisions are made but nothing is sent and
    /// state is left alone.
    pub notifier: Option<&'a dyn Notifier>,
    pub report: Option<&'a dyn ReportSink>,
    pub policy: DecisionPolicy,
}

/// What happened to the triggered offers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    NothingTriggered,
    /// Offers triggered but no notifier was configured.
    DryRun,
    /// The alert went out and state was saved.
    Dispatched,
    /// The notifier failed; state was not touched.
    DispatchFailed(String),
}

#[derive(Debug, Clone)]
pub struct CycleSummary {
    /// Normalized, deduplicated rows from every retailer.
    pub rows: Vec<CanonicalRow>,
    pub best_offers: BTreeMap<String, BestOffer>,
    pub decisions: Vec<ModelDecision>,
    pub triggered: Vec<BestOffer>,
    pub outcome: CycleOutcome,
}

/// Scrapes every (model, retailer) pair in order and normalizes the rows.
///
/// A failing pair is logged and contributes nothing; the rest still run.
pub async fn collect_rows(retailers: &[Box<dyn Retailer>], models: &[&str]) -> Vec<CanonicalRow> {
    let mut rows = Vec::new();

    for &model in models {
        for retailer in retailers {
            let site = retailer.site();
            match retailer.fetch_rows(model).await {
                Ok(raw) => {
                    tracing::debug!(site, model, rows = raw.len(), "retailer rows fetched");
                    rows.extend(raw.into_iter().map(|r| normalize_row(site, r, model)));
                }
                Err(e) => {
                    tracing::warn!(site, model, error = %e, "retailer fetch failed");
                }
            }
        }
    }

    rows
}

/// Runs one cycle: scrape, report, pick best offers, decide, notify, and
/// persist state after a confirmed dispatch.
///
/// # Errors
///
/// Returns [`StateError`] only when the alert was sent but the new state
/// could not be saved. Scrape, report and dispatch failures are logged and
/// reflected in the returned [`CycleSummary`].
pub async fn run_cycle(ctx: &CycleContext<'_>) -> Result<CycleSummary, StateError> {
    let models = ctx.watchlist.model_keys();
    let rows = dedupe_rows(collect_rows(ctx.retailers, &models).await);

    if let Some(report) = ctx.report {
        if let Err(e) = report.write(&rows, Utc::now()) {
            tracing::warn!(error = %e, "price report failed");
        }
    }

    let best = best_offers(&rows);
    let mut state = ctx.store.load();
    let decisions = evaluate(&best, &ctx.watchlist.thresholds(), &state, ctx.policy);
    let to_send = triggered(decisions.clone());

    let outcome = if to_send.is_empty() {
        CycleOutcome::NothingTriggered
    } else if let Some(notifier) = ctx.notifier {
        match notifier.notify(&to_send).await {
            Ok(()) => {
                state.record_dispatch(&to_send, Utc::now());
                ctx.store.save(&state)?;
                CycleOutcome::Dispatched
            }
            Err(e) => {
                tracing::error!(error = %e, offers = to_send.len(), "alert dispatch failed");
                CycleOutcome::DispatchFailed(e.to_string())
            }
        }
    } else {
        for offer in &to_send {
            tracing::info!(
                model = %offer.model,
                price = offer.price_num,
                site = %offer.site,
                "dry run: would alert"
            );
        }
        CycleOutcome::DryRun
    };

    tracing::info!(
        rows = rows.len(),
        best_offers = best.len(),
        triggered = to_send.len(),
        outcome = ?outcome,
        "cycle complete"
    );

    Ok(CycleSummary {
        rows,
        best_offers: best,
        decisions,
        triggered: to_send,
        outcome,
    })
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
