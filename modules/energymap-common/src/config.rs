use std::str::FromStr;
use std::time::Duration;

use crate::error::EnergyMapError;
use crate::types::DEFAULT_RADIUS_KM;

/// Upper bound on `GEOCODER_MAX_ATTEMPTS`. Backoff doubles per attempt.
const MAX_ATTEMPTS_LIMIT: u32 = 10;

/// Locator configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct LocatorConfig {
    // Geocoding provider
    pub nominatim_url: String,
    pub user_agent: String,
    pub contact_email: Option<String>,
    pub country_codes: Option<String>,
    pub language: Option<String>,
    pub result_limit: u32,

    // Rate limiting / timeouts
    pub min_interval: Duration,
    pub request_timeout: Duration,
    pub acquire_timeout: Duration,
    pub max_attempts: u32,

    // Pipeline
    pub radius_km: f64,
    pub batch_concurrency: usize,
    pub gazetteer_path: Option<String>,

    // Storage
    pub database_url: Option<String>,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            nominatim_url: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: "energymap-locator/0.1".to_string(),
            contact_email: None,
            country_codes: Some("kr".to_string()),
            language: Some("ko".to_string()),
            result_limit: 5,
            min_interval: Duration::from_millis(1000),
            request_timeout: Duration::from_secs(10),
            acquire_timeout: Duration::from_secs(30),
            max_attempts: 1,
            radius_km: DEFAULT_RADIUS_KM,
            batch_concurrency: 4,
            gazetteer_path: None,
            database_url: None,
        }
    }
}

impl LocatorConfig {
    /// Load from the process environment (after reading `.env` if present).
    pub fn from_env() -> Result<Self, EnergyMapError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unset keys take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, EnergyMapError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let parse = |key: &str, default| parse_or(key, get(key), default);

        let config = Self {
            nominatim_url: get("NOMINATIM_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.nominatim_url),
            user_agent: get("GEOCODER_USER_AGENT").unwrap_or(defaults.user_agent),
            contact_email: get("GEOCODER_EMAIL"),
            country_codes: optional_or_default(
                get("GEOCODER_COUNTRY_CODES"),
                defaults.country_codes,
            ),
            language: optional_or_default(get("GEOCODER_LANGUAGE"), defaults.language),
            result_limit: parse_or(
                "GEOCODER_RESULT_LIMIT",
                get("GEOCODER_RESULT_LIMIT"),
                defaults.result_limit,
            )?,
            min_interval: Duration::from_millis(parse(
                "GEOCODER_MIN_INTERVAL_MS",
                defaults.min_interval.as_millis() as u64,
            )?),
            request_timeout: Duration::from_secs(parse(
                "GEOCODER_REQUEST_TIMEOUT_SECS",
                defaults.request_timeout.as_secs(),
            )?),
            acquire_timeout: Duration::from_secs(parse(
                "GEOCODER_ACQUIRE_TIMEOUT_SECS",
                defaults.acquire_timeout.as_secs(),
            )?),
            max_attempts: parse_or(
                "GEOCODER_MAX_ATTEMPTS",
                get("GEOCODER_MAX_ATTEMPTS"),
                defaults.max_attempts,
            )?,
            radius_km: parse_or(
                "PROXIMITY_RADIUS_KM",
                get("PROXIMITY_RADIUS_KM"),
                defaults.radius_km,
            )?,
            batch_concurrency: parse_or(
                "BATCH_CONCURRENCY",
                get("BATCH_CONCURRENCY"),
                defaults.batch_concurrency,
            )?,
            gazetteer_path: get("GAZETTEER_PATH"),
            database_url: get("DATABASE_URL"),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), EnergyMapError> {
        if !(1..=MAX_ATTEMPTS_LIMIT).contains(&self.max_attempts) {
            return Err(EnergyMapError::Validation(format!(
                "GEOCODER_MAX_ATTEMPTS must be between 1 and {MAX_ATTEMPTS_LIMIT}, got {}",
                self.max_attempts
            )));
        }
        if self.min_interval.is_zero() {
            return Err(EnergyMapError::Validation(
                "GEOCODER_MIN_INTERVAL_MS must be at least 1".into(),
            ));
        }
        if self.batch_concurrency == 0 {
            return Err(EnergyMapError::Validation(
                "BATCH_CONCURRENCY must be at least 1".into(),
            ));
        }
        if !(self.radius_km.is_finite() && self.radius_km > 0.0) {
            return Err(EnergyMapError::Validation(format!(
                "PROXIMITY_RADIUS_KM must be a positive number, got {}",
                self.radius_km
            )));
        }
        if self.request_timeout.is_zero() {
            return Err(EnergyMapError::Validation(
                "GEOCODER_REQUEST_TIMEOUT_SECS must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Log the effective configuration. The contact email and database URL
    /// are reported only as set or unset.
    pub fn log_summary(&self) {
        tracing::info!("Locator config loaded:");
        for (key, value) in self.summary() {
            tracing::info!("  {key}: {value}");
        }
    }

    fn summary(&self) -> Vec<(&'static str, String)> {
        let presence = |v: &Option<String>| match v {
            Some(_) => "<set>".to_string(),
            None => "<not set>".to_string(),
        };
        vec![
            ("NOMINATIM_URL", self.nominatim_url.clone()),
            ("GEOCODER_USER_AGENT", self.user_agent.clone()),
            ("GEOCODER_EMAIL", presence(&self.contact_email)),
            ("GEOCODER_MIN_INTERVAL_MS", self.min_interval.as_millis().to_string()),
            ("GEOCODER_MAX_ATTEMPTS", self.max_attempts.to_string()),
            ("PROXIMITY_RADIUS_KM", self.radius_km.to_string()),
            ("BATCH_CONCURRENCY", self.batch_concurrency.to_string()),
            ("DATABASE_URL", presence(&self.database_url)),
        ]
    }
}

/// `none` explicitly disables an optional filter that has a default.
fn optional_or_default(value: Option<String>, default: Option<String>) -> Option<String> {
    match value {
        Some(v) if v.eq_ignore_ascii_case("none") => None,
        Some(v) => Some(v),
        None => default,
    }
}

fn parse_or<T: FromStr>(key: &str, value: Option<String>, default: T) -> Result<T, EnergyMapError> {
    match value {
        Some(raw) => raw
            .parse()
            .map_err(|_| EnergyMapError::Config(format!("{key} has an invalid value: {raw}"))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    fn load(pairs: &[(&str, &str)]) -> Result<LocatorConfig, EnergyMapError> {
        LocatorConfig::from_lookup(lookup(pairs))
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.nominatim_url, "https://nominatim.openstreetmap.org");
        assert_eq!(config.min_interval, Duration::from_secs(1));
        assert_eq!(config.max_attempts, 1);
        assert_eq!(config.radius_km, 10.0);
        assert_eq!(config.country_codes.as_deref(), Some("kr"));
        assert!(config.database_url.is_none());
    }

    #[test]
    fn overrides_are_parsed() {
        let config = load(&[
            ("NOMINATIM_URL", "http://localhost:8080/"),
            ("GEOCODER_MIN_INTERVAL_MS", "250"),
            ("PROXIMITY_RADIUS_KM", "5.5"),
            ("BATCH_CONCURRENCY", "8"),
            ("GEOCODER_COUNTRY_CODES", "none"),
            ("GEOCODER_EMAIL", "ops@example.org"),
        ])
        .unwrap();

        assert_eq!(config.nominatim_url, "http://localhost:8080");
        assert_eq!(config.min_interval, Duration::from_millis(250));
        assert_eq!(config.radius_km, 5.5);
        assert_eq!(config.batch_concurrency, 8);
        assert!(config.country_codes.is_none());
        assert_eq!(config.contact_email.as_deref(), Some("ops@example.org"));
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = load(&[("GEOCODER_USER_AGENT", "   ")]).unwrap();
        assert_eq!(config.user_agent, "energymap-locator/0.1");
    }

    #[test]
    fn malformed_number_is_config_error() {
        let err = load(&[("GEOCODER_MIN_INTERVAL_MS", "fast")]).unwrap_err();
        assert!(
            matches!(err, EnergyMapError::Config(msg) if msg.contains("GEOCODER_MIN_INTERVAL_MS"))
        );
    }

    #[test]
    fn attempts_outside_bounds_rejected() {
        for raw in ["0", "11", "4294967295"] {
            let err = load(&[("GEOCODER_MAX_ATTEMPTS", raw)]).unwrap_err();
            assert!(matches!(err, EnergyMapError::Validation(_)), "{raw}");
        }
        let config = load(&[("GEOCODER_MAX_ATTEMPTS", "10")]).unwrap();
        assert_eq!(config.max_attempts, MAX_ATTEMPTS_LIMIT);
    }

    #[test]
    fn zero_min_interval_rejected() {
        let err = load(&[("GEOCODER_MIN_INTERVAL_MS", "0")]).unwrap_err();
        let EnergyMapError::Validation(msg) = &err else {
            panic!("expected a validation error, got {err:?}");
        };
        assert!(msg.contains("GEOCODER_MIN_INTERVAL_MS"));
    }

    #[test]
    fn non_positive_radius_rejected() {
        assert!(load(&[("PROXIMITY_RADIUS_KM", "0")]).is_err());
        assert!(load(&[("PROXIMITY_RADIUS_KM", "-3")]).is_err());
    }

    #[test]
    fn summary_hides_secrets() {
        let config = load(&[
            ("DATABASE_URL", "postgres://locator:hunter2@db/energymap"),
            ("GEOCODER_EMAIL", "ops@example.org"),
        ])
        .unwrap();

        let summary: HashMap<_, _> = config.summary().into_iter().collect();
        assert_eq!(summary["DATABASE_URL"], "<set>");
        assert_eq!(summary["GEOCODER_EMAIL"], "<set>");
        assert_eq!(summary["GEOCODER_MIN_INTERVAL_MS"], "1000");
        assert!(summary.values().all(|v| !v.contains("hunter2")));

        config.log_summary();
    }

    #[test]
    fn from_env_reads_process_environment() {
        // Only this test touches the process environment.
        std::env::set_var("BATCH_CONCURRENCY", "9");
        let config = LocatorConfig::from_env().unwrap();
        std::env::remove_var("BATCH_CONCURRENCY");
        assert_eq!(config.batch_concurrency, 9);
    }
}
