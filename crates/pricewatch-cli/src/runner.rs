//! Guarded cycle execution shared by `run` and `check`.

use std::time::Duration;

use anyhow::Context as _;
use rand::Rng as _;

use pricewatch_alerts::{
    run_cycle, AlertStateStore, CycleContext, CycleSummary, DecisionPolicy, HttpMailRelay,
    JsonReportWriter, MailNotifier, Notifier, ReportSink,
};
use pricewatch_core::AppConfig;

/// Everything a cycle needs that outlives a single cycle.
///
/// The watchlist and retailers are rebuilt every cycle so edits to the
/// watchlist file take effect without a restart.
pub(crate) struct Runner {
    config: AppConfig,
    store: AlertStateStore,
    report: Option<JsonReportWriter>,
    notifier: Option<MailNotifier<HttpMailRelay>>,
    policy: DecisionPolicy,
}

impl Runner {
    /// Builds a runner. With `dispatch` off, or without mail configured,
    /// cycles decide but never send alerts or touch alert state.
    pub(crate) fn new(
        config: AppConfig,
        force: bool,
        dispatch: bool,
        write_reports: bool,
    ) -> anyhow::Result<Self> {
        let notifier = match (&config.mail, dispatch) {
            (Some(mail), true) => Some(MailNotifier::new(
                HttpMailRelay::new(mail.clone(), config.scraper_request_timeout_secs)
                    .context("failed to build mail relay client")?,
            )),
            _ => None,
        };
        let policy = DecisionPolicy {
            delta_step: config.alert_delta_step,
            force,
        };

        Ok(Self {
            store: AlertStateStore::new(&config.state_path),
            report: write_reports.then(|| JsonReportWriter::new(&config.report_dir)),
            notifier,
            policy,
            config,
        })
    }

    pub(crate) fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Runs one cycle without the lock or start jitter.
    ///
    /// # Errors
    ///
    /// Returns an error if the watchlist cannot be loaded, the retailers
    /// cannot be built, or alert state cannot be saved after a dispatch.
    pub(crate) async fn cycle(&self) -> anyhow::Result<CycleSummary> {
        let watchlist = pricewatch_core::load_watchlist(&self.config.watchlist_path)?;
        let retailers = pricewatch_scraper::build_retailers(&self.config, &watchlist)?;

        let ctx = CycleContext {
            retailers: &retailers,
            watchlist: &watchlist,
            store: &self.store,
            notifier: self.notifier.as_ref().map(|n| n as &dyn Notifier),
            report: self.report.as_ref().map(|r| r as &dyn ReportSink),
            policy: self.policy,
        };
        Ok(run_cycle(&ctx).await?)
    }

    /// Runs one cycle under the run lock, after the configured start jitter.
    ///
    /// Returns `Ok(None)` when another process holds the lock.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock file cannot be opened or locked, or the cycle
    /// fails (see [`Runner::cycle`]).
    pub(crate) async fn guarded_cycle(&self) -> anyhow::Result<Option<CycleSummary>> {
        let timeout = Duration::from_secs(self.config.lock_timeout_secs);
        let Some(_lock) = crate::lock::RunLock::acquire(&self.config.lock_path, timeout)
            .await
            .with_context(|| format!("failed to lock {}", self.config.lock_path.display()))?
        else {
            tracing::info!(
                lock = %self.config.lock_path.display(),
                "another run holds the lock; skipping this cycle"
            );
            return Ok(None);
        };

        let jitter = start_jitter(self.config.jitter_sec_min, self.config.jitter_sec_max);
        if !jitter.is_zero() {
            tracing::debug!(secs = jitter.as_secs(), "start jitter");
            tokio::time::sleep(jitter).await;
        }

        self.cycle().await.map(Some)
    }
}

fn start_jitter(min_secs: u64, max_secs: u64) -> Duration {
    if max_secs <= min_secs {
        return Duration::from_secs(min_secs);
    }
    Duration::from_secs(rand::rng().random_range(min_secs..=max_secs))
}
