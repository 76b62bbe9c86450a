//! Alert decision with hysteresis.
//!
//! A model triggers when its best price is strictly below its threshold and
//! either it has never alerted or the price has fallen by at least
//! `delta_step` since the last alert. Forcing skips the second test. No I/O
//! happens here; state is read, never written.

use std::collections::BTreeMap;

use pricewatch_core::{AlertState, BestOffer, Thresholds};

/// Tunables for [`decide`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionPolicy {
    /// Minimum drop below the last alerted price before alerting again.
    pub delta_step: f64,
    /// Alert on every below-threshold model regardless of history.
    pub force: bool,
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self {
            delta_step: 1.0,
            force: false,
        }
    }
}

/// Why a model did or did not trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// No in-stock priced offer this cycle.
    NoData,
    /// Best price is at or above the threshold.
    AboveThreshold,
    /// Below threshold, but not far enough below the last alert.
    Suppressed,
    /// Below threshold and never alerted before.
    FirstAlert,
    /// Below threshold and at least `delta_step` under the last alert.
    Dropped,
    /// Below threshold with forcing on.
    Forced,
}

impl Verdict {
    #[must_use]
    pub fn triggers(self) -> bool {
        matches!(self, Self::FirstAlert | Self::Dropped | Self::Forced)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoData => "no_data",
            Self::AboveThreshold => "above_threshold",
            Self::Suppressed => "suppressed",
            Self::FirstAlert => "first_alert",
            Self::Dropped => "dropped",
            Self::Forced => "forced",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of the decision for one tracked model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDecision {
    pub model: String,
    pub threshold: f64,
    pub last_notified_price: Option<f64>,
    /// The model's best offer, when it had one.
    pub offer: Option<BestOffer>,
    pub verdict: Verdict,
}

/// Per-model verdicts in threshold order, for every tracked model.
#[must_use]
pub fn evaluate(
    best: &BTreeMap<String, BestOffer>,
    thresholds: &Thresholds,
    state: &AlertState,
    policy: DecisionPolicy,
) -> Vec<ModelDecision> {
    thresholds
        .iter()
        .map(|(model, threshold)| {
            let offer = best.get(model).cloned();
            let last = state.last_notified_price(model);
            let verdict = match &offer {
                None => Verdict::NoData,
                Some(o) => verdict_for(o.price_num, threshold, last, policy),
            };

            tracing::debug!(
                model,
                threshold,
                price = offer.as_ref().map(|o| o.price_num),
                last_notified = last,
                verdict = %verdict,
                "alert decision"
            );

            ModelDecision {
                model: model.to_string(),
                threshold,
                last_notified_price: last,
                offer,
                verdict,
            }
        })
        .collect()
}

/// The offers that should be alerted on, in threshold order.
#[must_use]
pub fn decide(
    best: &BTreeMap<String, BestOffer>,
    thresholds: &Thresholds,
    state: &AlertState,
    policy: DecisionPolicy,
) -> Vec<BestOffer> {
    triggered(evaluate(best, thresholds, state, policy))
}

/// Offers of the triggering decisions, order preserved.
#[must_use]
pub fn triggered(decisions: Vec<ModelDecision>) -> Vec<BestOffer> {
    decisions
        .into_iter()
        .filter(|d| d.verdict.triggers())
        .filter_map(|d| d.offer)
        .collect()
}

fn verdict_for(price: f64, threshold: f64, last: Option<f64>, policy: DecisionPolicy) -> Verdict {
    if !price.is_finite() {
        return Verdict::NoData;
    }
    if price >= threshold {
        return Verdict::AboveThreshold;
    }
    if policy.force {
        return Verdict::Forced;
    }
    match last {
        None => Verdict::FirstAlert,
        Some(last) if price <= last - policy.delta_step => Verdict::Dropped,
        Some(_) => Verdict::Suppressed,
    }
}

#[cfg(test)]
#[path = "decide_test.rs"]
mod tests;
