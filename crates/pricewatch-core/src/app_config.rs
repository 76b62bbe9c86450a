use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Mail relay settings. Present only when `PRICEWATCH_MAIL_RELAY_URL` is set.
#[derive(Clone)]
pub struct MailConfig {
    pub relay_url: String,
    pub relay_token: Option<String>,
    pub from: String,
    pub to: Vec<String>,
}

impl std::fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailConfig")
            .field("relay_url", &self.relay_url)
            .field(
                "relay_token",
                &self.relay_token.as_ref().map(|_| "[redacted]"),
            )
            .field("from", &self.from)
            .field("to", &self.to)
            .finish()
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub watchlist_path: PathBuf,
    pub state_path: PathBuf,
    pub report_dir: PathBuf,
    pub lock_path: PathBuf,
    pub lock_timeout_secs: u64,
    pub run_interval_min: u64,
    pub run_hour_start: u32,
    pub run_hour_end: u32,
    pub jitter_sec_min: u64,
    pub jitter_sec_max: u64,
    /// Minimum drop below the last notified price before a model alerts again.
    pub alert_delta_step: f64,
    pub scraper_request_timeout_secs: u64,
    pub scraper_max_retries: u32,
    pub scraper_retry_backoff_base_ms: u64,
    pub scraper_jitter_min_ms: u64,
    pub scraper_jitter_max_ms: u64,
    pub mail: Option<MailConfig>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("watchlist_path", &self.watchlist_path)
            .field("state_path", &self.state_path)
            .field("report_dir", &self.report_dir)
            .field("lock_path", &self.lock_path)
            .field("lock_timeout_secs", &self.lock_timeout_secs)
            .field("run_interval_min", &self.run_interval_min)
            .field("run_hour_start", &self.run_hour_start)
            .field("run_hour_end", &self.run_hour_end)
            .field("jitter_sec_min", &self.jitter_sec_min)
            .field("jitter_sec_max", &self.jitter_sec_max)
            .field("alert_delta_step", &self.alert_delta_step)
            .field(
                "scraper_request_timeout_secs",
                &self.scraper_request_timeout_secs,
            )
            .field("scraper_max_retries", &self.scraper_max_retries)
            .field(
                "scraper_retry_backoff_base_ms",
                &self.scraper_retry_backoff_base_ms,
            )
            .field("scraper_jitter_min_ms", &self.scraper_jitter_min_ms)
            .field("scraper_jitter_max_ms", &self.scraper_jitter_max_ms)
            .field("mail", &self.mail)
            .finish()
    }
}

impl AppConfig {
    /// Returns `true` when `hour` (0–23, local time) falls inside the
    /// configured active window. Both ends are inclusive.
    #[must_use]
    pub fn in_active_hours(&self, hour: u32) -> bool {
        (self.run_hour_start..=self.run_hour_end).contains(&hour)
    }
}
