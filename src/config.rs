use std::env;
use std::time::Duration;

use log::LevelFilter;

use crate::access::{DEFAULT_LOCK_HOURS, Entitlements};
use crate::win_prob::DEFAULT_EDGE_THRESHOLD;

const DEFAULT_API_BASE: &str = "http://localhost:5000/api";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_base: String,
    pub lock_hours: u32,
    pub edge_threshold: f64,
    pub http_timeout: Duration,
    pub show_trend: bool,
    pub log_level: LevelFilter,
    pub entitlements: Entitlements,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            lock_hours: DEFAULT_LOCK_HOURS,
            edge_threshold: DEFAULT_EDGE_THRESHOLD,
            http_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            show_trend: true,
            log_level: LevelFilter::Info,
            entitlements: Entitlements::default(),
        }
    }
}

impl Config {
    /// Loads `.env.local` / `.env` when present, then reads the process environment.
    pub fn load() -> Self {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");
        Self::from_env()
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Invalid or missing values fall back to defaults; numeric values are clamped.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let api_base = get("TENNIS_API_BASE")
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_base);
        let lock_hours = get("DETAILS_LOCK_HOURS")
            .and_then(|v| v.trim().parse::<u32>().ok())
            .unwrap_or(defaults.lock_hours)
            .min(48);
        let edge_threshold = get("EDGE_THRESHOLD")
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .unwrap_or(defaults.edge_threshold)
            .clamp(0.0, 0.5);
        let timeout_secs = get("HTTP_TIMEOUT_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS)
            .clamp(1, 120);
        let show_trend = match get("SHOW_TREND") {
            Some(v) => parse_flag(&v).unwrap_or(defaults.show_trend),
            None => defaults.show_trend,
        };
        let log_level = get("LOG_LEVEL")
            .and_then(|v| v.trim().parse::<LevelFilter>().ok())
            .unwrap_or(defaults.log_level);
        let entitlements = get("ENTITLEMENTS")
            .map(|v| parse_entitlements(&v))
            .unwrap_or(defaults.entitlements);

        Self {
            api_base,
            lock_hours,
            edge_threshold,
            http_timeout: Duration::from_secs(timeout_secs),
            show_trend,
            log_level,
            entitlements,
        }
    }
}

/// Comma-separated roles, e.g. `user,premium`. Unknown tokens are ignored.
fn parse_entitlements(raw: &str) -> Entitlements {
    let mut out = Entitlements::default();
    for token in raw.split(',').map(|t| t.trim().to_ascii_lowercase()) {
        match token.as_str() {
            "user" => out.logged_in = true,
            "admin" => out.admin = true,
            "premium" => out.premium = true,
            "trial" => out.trial = true,
            _ => {}
        }
    }
    if out.privileged() {
        out.logged_in = true;
    }
    out
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        assert_eq!(config(&[]), Config::default());
    }

    #[test]
    fn values_are_parsed_and_clamped() {
        let cfg = config(&[
            ("TENNIS_API_BASE", "https://example.test/api/"),
            ("DETAILS_LOCK_HOURS", "400"),
            ("EDGE_THRESHOLD", "0.02"),
            ("HTTP_TIMEOUT_SECS", "0"),
            ("SHOW_TREND", "off"),
            ("LOG_LEVEL", "debug"),
        ]);
        assert_eq!(cfg.api_base, "https://example.test/api");
        assert_eq!(cfg.lock_hours, 48);
        assert_eq!(cfg.edge_threshold, 0.02);
        assert_eq!(cfg.http_timeout, Duration::from_secs(1));
        assert!(!cfg.show_trend);
        assert_eq!(cfg.log_level, LevelFilter::Debug);
    }

    #[test]
    fn entitlements_from_role_list() {
        let cfg = config(&[("ENTITLEMENTS", "Trial, bogus")]);
        assert!(cfg.entitlements.trial);
        assert!(cfg.entitlements.logged_in);
        assert!(cfg.entitlements.privileged());
        assert!(!config(&[("ENTITLEMENTS", "user")]).entitlements.privileged());
    }

    #[test]
    fn garbage_falls_back() {
        let cfg = config(&[
            ("EDGE_THRESHOLD", "NaN"),
            ("SHOW_TREND", "maybe"),
            ("LOG_LEVEL", "loud"),
            ("DETAILS_LOCK_HOURS", "-3"),
        ]);
        assert_eq!(cfg.edge_threshold, DEFAULT_EDGE_THRESHOLD);
        assert!(cfg.show_trend);
        assert_eq!(cfg.log_level, LevelFilter::Info);
        assert_eq!(cfg.lock_hours, DEFAULT_LOCK_HOURS);
    }
}
