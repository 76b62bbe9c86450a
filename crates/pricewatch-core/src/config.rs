use std::path::PathBuf;

use crate::app_config::{AppConfig, Environment, MailConfig};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files. Use it in tests
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup, with no `set_var`/`remove_var` needed.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| invalid(var, e.to_string()))
    };

    let parse_f64 = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<f64>().map_err(|e| invalid(var, e.to_string()))
    };

    let env = parse_environment(&or_default("PRICEWATCH_ENV", "development"))?;
    let log_level = or_default("PRICEWATCH_LOG_LEVEL", "info");

    let watchlist_path = PathBuf::from(or_default(
        "PRICEWATCH_WATCHLIST_PATH",
        "./config/watchlist.yaml",
    ));
    let state_path = PathBuf::from(or_default("PRICEWATCH_STATE_PATH", "./.alert_state.json"));
    let report_dir = PathBuf::from(or_default("PRICEWATCH_REPORT_DIR", "./reports"));
    let lock_path = PathBuf::from(or_default("PRICEWATCH_LOCK_PATH", "./.run.lock"));
    let lock_timeout_secs = parse_u64("PRICEWATCH_LOCK_TIMEOUT_SECS", "1")?;

    let run_interval_min = parse_u64("PRICEWATCH_RUN_INTERVAL_MIN", "20")?;
    if run_interval_min == 0 {
        return Err(invalid(
            "PRICEWATCH_RUN_INTERVAL_MIN",
            "must be at least 1 minute".to_string(),
        ));
    }

    let run_hour_start = parse_u32("PRICEWATCH_RUN_HOUR_START", "9")?;
    let run_hour_end = parse_u32("PRICEWATCH_RUN_HOUR_END", "23")?;
    if run_hour_end > 23 {
        return Err(invalid(
            "PRICEWATCH_RUN_HOUR_END",
            format!("hour {run_hour_end} is outside 0-23"),
        ));
    }
    if run_hour_start > run_hour_end {
        return Err(invalid(
            "PRICEWATCH_RUN_HOUR_START",
            format!("start hour ({run_hour_start}) must not exceed end hour ({run_hour_end})"),
        ));
    }

    let jitter_sec_min = parse_u64("PRICEWATCH_JITTER_SEC_MIN", "0")?;
    let jitter_sec_max = parse_u64("PRICEWATCH_JITTER_SEC_MAX", "120")?;
    if jitter_sec_min > jitter_sec_max {
        return Err(invalid(
            "PRICEWATCH_JITTER_SEC_MIN",
            format!("min ({jitter_sec_min}) must not exceed max ({jitter_sec_max})"),
        ));
    }

    let alert_delta_step = parse_f64("PRICEWATCH_ALERT_DELTA_STEP", "1.0")?;
    if !alert_delta_step.is_finite() || alert_delta_step < 0.0 {
        return Err(invalid(
            "PRICEWATCH_ALERT_DELTA_STEP",
            format!("{alert_delta_step} is not a finite, non-negative amount"),
        ));
    }

    let scraper_request_timeout_secs = parse_u64("PRICEWATCH_SCRAPER_REQUEST_TIMEOUT_SECS", "20")?;
    let scraper_max_retries = parse_u32("PRICEWATCH_SCRAPER_MAX_RETRIES", "5")?;
    let scraper_retry_backoff_base_ms =
        parse_u64("PRICEWATCH_SCRAPER_RETRY_BACKOFF_BASE_MS", "1500")?;
    let scraper_jitter_min_ms = parse_u64("PRICEWATCH_SCRAPER_JITTER_MIN_MS", "700")?;
    let scraper_jitter_max_ms = parse_u64("PRICEWATCH_SCRAPER_JITTER_MAX_MS", "1600")?;
    if scraper_jitter_min_ms > scraper_jitter_max_ms {
        return Err(invalid(
            "PRICEWATCH_SCRAPER_JITTER_MIN_MS",
            format!("min ({scraper_jitter_min_ms}) must not exceed max ({scraper_jitter_max_ms})"),
        ));
    }

    let mail = build_mail_config(&lookup)?;

    Ok(AppConfig {
        env,
        log_level,
        watchlist_path,
        state_path,
        report_dir,
        lock_path,
        lock_timeout_secs,
        run_interval_min,
        run_hour_start,
        run_hour_end,
        jitter_sec_min,
        jitter_sec_max,
        alert_delta_step,
        scraper_request_timeout_secs,
        scraper_max_retries,
        scraper_retry_backoff_base_ms,
        scraper_jitter_min_ms,
        scraper_jitter_max_ms,
        mail,
    })
}

/// Mail settings are all-or-nothing: once a relay URL is configured the
/// sender and at least one recipient become mandatory.
fn build_mail_config<F>(lookup: &F) -> Result<Option<MailConfig>, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let Some(relay_url) = lookup("PRICEWATCH_MAIL_RELAY_URL")
        .ok()
        .filter(|v| !v.trim().is_empty())
    else {
        return Ok(None);
    };

    if let Err(e) = reqwest::Url::parse(&relay_url) {
        return Err(ConfigError::InvalidEnvVar {
            var: "PRICEWATCH_MAIL_RELAY_URL".to_string(),
            reason: e.to_string(),
        });
    }

    let from = lookup("PRICEWATCH_MAIL_FROM")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar("PRICEWATCH_MAIL_FROM".to_string()))?;

    let to: Vec<String> = lookup("PRICEWATCH_MAIL_TO")
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|addr| !addr.is_empty())
        .map(str::to_string)
        .collect();
    if to.is_empty() {
        return Err(ConfigError::MissingEnvVar("PRICEWATCH_MAIL_TO".to_string()));
    }

    let relay_token = lookup("PRICEWATCH_MAIL_RELAY_TOKEN")
        .ok()
        .filter(|v| !v.is_empty());

    Ok(Some(MailConfig {
        relay_url,
        relay_token,
        from,
        to,
    }))
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "production" => Ok(Environment::Production),
        "test" => Ok(Environment::Test),
        other => Err(ConfigError::InvalidEnvVar {
            var: "PRICEWATCH_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
