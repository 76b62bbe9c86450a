//! Long-running scheduler loop.

use std::time::Duration;

use chrono::Timelike as _;

use crate::runner::Runner;

/// Runs a guarded cycle every `run_interval_min` minutes while the local hour
/// is inside the active window, until ctrl-c or SIGTERM.
///
/// Cycle failures are logged and the loop carries on.
pub(crate) async fn run_loop(runner: &Runner) {
    let config = runner.config();
    let interval = Duration::from_secs(config.run_interval_min.saturating_mul(60));
    tracing::info!(
        interval_min = config.run_interval_min,
        active_from = config.run_hour_start,
        active_until = config.run_hour_end,
        jitter_min_secs = config.jitter_sec_min,
        jitter_max_secs = config.jitter_sec_max,
        "scheduler started"
    );

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        let hour = chrono::Local::now().hour();
        if config.in_active_hours(hour) {
            tokio::select! {
                result = runner.guarded_cycle() => log_cycle_result(result),
                () = &mut shutdown => break,
            }
        } else {
            tracing::info!(hour, "outside active hours; skipping cycle");
        }

        tokio::select! {
            () = tokio::time::sleep(interval) => {}
            () = &mut shutdown => break,
        }
    }

    tracing::info!("scheduler stopped");
}

pub(crate) fn log_cycle_result(result: anyhow::Result<Option<pricewatch_alerts::CycleSummary>>) {
    match result {
        Ok(Some(summary)) => {
            let models: Vec<&str> = summary.triggered.iter().map(|o| o.model.as_str()).collect();
            let triggered = if models.is_empty() {
                "none".to_string()
            } else {
                models.join(", ")
            };
            tracing::info!(%triggered, outcome = ?summary.outcome, "cycle finished");
        }
        Ok(None) => {}
        Err(e) => {
            let error = format!("{e:#}");
            tracing::error!(%error, "cycle failed");
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal");
}
