use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

/// Returns a map with a complete mail relay configuration.
fn mail_env<'a>() -> HashMap<&'a str, &'a str> {
    let mut m = HashMap::new();
    m.insert("PRICEWATCH_MAIL_RELAY_URL", "https://relay.example.com/send");
    m.insert("PRICEWATCH_MAIL_FROM", "alerts@example.com");
    m.insert("PRICEWATCH_MAIL_TO", "a@example.com, b@example.com");
    m
}

#[test]
fn parse_environment_development() {
    assert_eq!(
        parse_environment("development").unwrap(),
        Environment::Development
    );
}

#[test]
fn parse_environment_production() {
    assert_eq!(
        parse_environment("production").unwrap(),
        Environment::Production
    );
}

#[test]
fn parse_environment_unknown_fails() {
    let err = parse_environment("unknown").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "PRICEWATCH_ENV"));
}

#[test]
fn build_app_config_defaults_with_empty_env() {
    let map: HashMap<&str, &str> = HashMap::new();
    let result = build_app_config(lookup_from_map(&map));
    assert!(result.is_ok(), "expected Ok, got: {result:?}");
    let cfg = result.unwrap();
    assert_eq!(cfg.env, Environment::Development);
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.watchlist_path, PathBuf::from("./config/watchlist.yaml"));
    assert_eq!(cfg.state_path, PathBuf::from("./.alert_state.json"));
    assert_eq!(cfg.report_dir, PathBuf::from("./reports"));
    assert_eq!(cfg.lock_path, PathBuf::from("./.run.lock"));
    assert_eq!(cfg.lock_timeout_secs, 1);
    assert_eq!(cfg.run_interval_min, 20);
    assert_eq!(cfg.run_hour_start, 9);
    assert_eq!(cfg.run_hour_end, 23);
    assert_eq!(cfg.jitter_sec_min, 0);
    assert_eq!(cfg.jitter_sec_max, 120);
    assert!((cfg.alert_delta_step - 1.0).abs() < f64::EPSILON);
    assert_eq!(cfg.scraper_request_timeout_secs, 20);
    assert_eq!(cfg.scraper_max_retries, 5);
    assert_eq!(cfg.scraper_retry_backoff_base_ms, 1500);
    assert_eq!(cfg.scraper_jitter_min_ms, 700);
    assert_eq!(cfg.scraper_jitter_max_ms, 1600);
    assert!(cfg.mail.is_none());
}

#[test]
fn build_app_config_fails_on_invalid_env() {
    let mut map = HashMap::new();
    map.insert("PRICEWATCH_ENV", "producton");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PRICEWATCH_ENV"),
        "expected InvalidEnvVar(PRICEWATCH_ENV), got: {result:?}"
    );
}

#[test]
fn alert_delta_step_override() {
    let mut map = HashMap::new();
    map.insert("PRICEWATCH_ALERT_DELTA_STEP", "25.5");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!((cfg.alert_delta_step - 25.5).abs() < f64::EPSILON);
}

#[test]
fn alert_delta_step_rejects_negative() {
    let mut map = HashMap::new();
    map.insert("PRICEWATCH_ALERT_DELTA_STEP", "-1");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PRICEWATCH_ALERT_DELTA_STEP"),
        "expected InvalidEnvVar(PRICEWATCH_ALERT_DELTA_STEP), got: {result:?}"
    );
}

#[test]
fn alert_delta_step_rejects_nan() {
    let mut map = HashMap::new();
    map.insert("PRICEWATCH_ALERT_DELTA_STEP", "NaN");
    let result = build_app_config(lookup_from_map(&map));
    assert!(matches!(
        result,
        Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PRICEWATCH_ALERT_DELTA_STEP"
    ));
}

#[test]
fn run_interval_rejects_zero() {
    let mut map = HashMap::new();
    map.insert("PRICEWATCH_RUN_INTERVAL_MIN", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(matches!(
        result,
        Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PRICEWATCH_RUN_INTERVAL_MIN"
    ));
}

#[test]
fn run_hours_reject_start_after_end() {
    let mut map = HashMap::new();
    map.insert("PRICEWATCH_RUN_HOUR_START", "20");
    map.insert("PRICEWATCH_RUN_HOUR_END", "8");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PRICEWATCH_RUN_HOUR_START"),
        "expected InvalidEnvVar(PRICEWATCH_RUN_HOUR_START), got: {result:?}"
    );
}

#[test]
fn run_hour_end_rejects_out_of_range() {
    let mut map = HashMap::new();
    map.insert("PRICEWATCH_RUN_HOUR_END", "24");
    let result = build_app_config(lookup_from_map(&map));
    assert!(matches!(
        result,
        Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PRICEWATCH_RUN_HOUR_END"
    ));
}

#[test]
fn jitter_rejects_min_above_max() {
    let mut map = HashMap::new();
    map.insert("PRICEWATCH_JITTER_SEC_MIN", "300");
    map.insert("PRICEWATCH_JITTER_SEC_MAX", "120");
    let result = build_app_config(lookup_from_map(&map));
    assert!(matches!(
        result,
        Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PRICEWATCH_JITTER_SEC_MIN"
    ));
}

#[test]
fn scraper_max_retries_invalid() {
    let mut map = HashMap::new();
    map.insert("PRICEWATCH_SCRAPER_MAX_RETRIES", "not-a-number");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PRICEWATCH_SCRAPER_MAX_RETRIES"),
        "expected InvalidEnvVar(PRICEWATCH_SCRAPER_MAX_RETRIES), got: {result:?}"
    );
}

#[test]
fn scraper_jitter_rejects_min_above_max() {
    let mut map = HashMap::new();
    map.insert("PRICEWATCH_SCRAPER_JITTER_MIN_MS", "2000");
    let result = build_app_config(lookup_from_map(&map));
    assert!(matches!(
        result,
        Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PRICEWATCH_SCRAPER_JITTER_MIN_MS"
    ));
}

#[test]
fn mail_config_parsed_when_relay_set() {
    let map = mail_env();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let mail = cfg.mail.expect("expected mail config");
    assert_eq!(mail.relay_url, "https://relay.example.com/send");
    assert_eq!(mail.from, "alerts@example.com");
    assert_eq!(mail.to, vec!["a@example.com", "b@example.com"]);
    assert!(mail.relay_token.is_none());
}

#[test]
fn mail_config_requires_from() {
    let mut map = mail_env();
    map.remove("PRICEWATCH_MAIL_FROM");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "PRICEWATCH_MAIL_FROM"),
        "expected MissingEnvVar(PRICEWATCH_MAIL_FROM), got: {result:?}"
    );
}

#[test]
fn mail_config_requires_a_recipient() {
    let mut map = mail_env();
    map.insert("PRICEWATCH_MAIL_TO", " , ");
    let result = build_app_config(lookup_from_map(&map));
    assert!(matches!(
        result,
        Err(ConfigError::MissingEnvVar(ref v)) if v == "PRICEWATCH_MAIL_TO"
    ));
}

#[test]
fn mail_config_rejects_invalid_relay_url() {
    let mut map = mail_env();
    map.insert("PRICEWATCH_MAIL_RELAY_URL", "not a url");
    let result = build_app_config(lookup_from_map(&map));
    assert!(matches!(
        result,
        Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PRICEWATCH_MAIL_RELAY_URL"
    ));
}

#[test]
fn debug_output_redacts_relay_token() {
    let mut map = mail_env();
    map.insert("PRICEWATCH_MAIL_RELAY_TOKEN", "super-secret");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let rendered = format!("{cfg:?}");
    assert!(!rendered.contains("super-secret"));
    assert!(rendered.contains("[redacted]"));
}

#[test]
fn in_active_hours_is_inclusive() {
    let map: HashMap<&str, &str> = HashMap::new();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(!cfg.in_active_hours(8));
    assert!(cfg.in_active_hours(9));
    assert!(cfg.in_active_hours(23));
}
