//! Server configuration

use std::str::FromStr;
use std::time::Duration;

const DEFAULT_FHIR_BASE_URL: &str = "https://hapi.fhir.org/baseR4";

/// Server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the remote FHIR server, without trailing slash
    pub fhir_base_url: String,
    pub bind_address: String,
    pub cors_origins: Vec<String>,
    pub rate_limit_rps: u32,
    /// Timeout applied to every single upstream request
    pub upstream_timeout: Duration,
    /// Overall budget for walking condition search pages
    pub query_deadline: Duration,
    pub patient_fetch_concurrency: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key/value source, applying defaults and
    /// lower bounds. Durations and counts never go below 1.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let base = lookup("FHIR_BASE_URL").unwrap_or_else(|| DEFAULT_FHIR_BASE_URL.into());

        Self {
            fhir_base_url: base.trim_end_matches('/').to_string(),
            bind_address: lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:5000".into()),
            cors_origins: lookup("CORS_ORIGINS")
                .unwrap_or_else(|| "*".into())
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect(),
            rate_limit_rps: parse_or(&lookup, "RATE_LIMIT_RPS", 50u32).max(1),
            upstream_timeout: Duration::from_secs(
                parse_or(&lookup, "UPSTREAM_TIMEOUT_SECS", 30u64).max(1),
            ),
            query_deadline: Duration::from_secs(
                parse_or(&lookup, "QUERY_DEADLINE_SECS", 120u64).max(1),
            ),
            patient_fetch_concurrency: parse_or(&lookup, "PATIENT_FETCH_CONCURRENCY", 4usize)
                .max(1),
        }
    }
}

/// Parse a configuration value, falling back to `default` when unset or invalid
fn parse_or<T: FromStr + Copy + std::fmt::Display>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, default = %default, "Invalid config value, using default");
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = config(&[]);

        assert_eq!(config.fhir_base_url, "https://hapi.fhir.org/baseR4");
        assert_eq!(config.bind_address, "0.0.0.0:5000");
        assert_eq!(config.cors_origins, vec!["*"]);
        assert_eq!(config.rate_limit_rps, 50);
        assert_eq!(config.upstream_timeout, Duration::from_secs(30));
        assert_eq!(config.query_deadline, Duration::from_secs(120));
        assert_eq!(config.patient_fetch_concurrency, 4);
    }

    #[test]
    fn explicit_values_are_used() {
        let config = config(&[
            ("FHIR_BASE_URL", "http://x/fhir/"),
            ("BIND_ADDRESS", "127.0.0.1:9000"),
            ("CORS_ORIGINS", "http://a.example, http://b.example,,"),
            ("RATE_LIMIT_RPS", "7"),
            ("UPSTREAM_TIMEOUT_SECS", " 10 "),
            ("QUERY_DEADLINE_SECS", "60"),
            ("PATIENT_FETCH_CONCURRENCY", "8"),
        ]);

        assert_eq!(config.fhir_base_url, "http://x/fhir");
        assert_eq!(config.bind_address, "127.0.0.1:9000");
        assert_eq!(
            config.cors_origins,
            vec!["http://a.example", "http://b.example"]
        );
        assert_eq!(config.rate_limit_rps, 7);
        assert_eq!(config.upstream_timeout, Duration::from_secs(10));
        assert_eq!(config.query_deadline, Duration::from_secs(60));
        assert_eq!(config.patient_fetch_concurrency, 8);
    }

    #[test]
    fn zero_values_are_raised_to_one() {
        let config = config(&[
            ("RATE_LIMIT_RPS", "0"),
            ("UPSTREAM_TIMEOUT_SECS", "0"),
            ("QUERY_DEADLINE_SECS", "0"),
            ("PATIENT_FETCH_CONCURRENCY", "0"),
        ]);

        assert_eq!(config.rate_limit_rps, 1);
        assert_eq!(config.upstream_timeout, Duration::from_secs(1));
        assert_eq!(config.query_deadline, Duration::from_secs(1));
        assert_eq!(config.patient_fetch_concurrency, 1);
    }

    #[test]
    fn unparsable_numbers_fall_back_to_defaults() {
        let config = config(&[
            ("RATE_LIMIT_RPS", "fast"),
            ("UPSTREAM_TIMEOUT_SECS", "-5"),
            ("QUERY_DEADLINE_SECS", "2m"),
            ("PATIENT_FETCH_CONCURRENCY", "abc"),
        ]);

        assert_eq!(config.rate_limit_rps, 50);
        assert_eq!(config.upstream_timeout, Duration::from_secs(30));
        assert_eq!(config.query_deadline, Duration::from_secs(120));
        assert_eq!(config.patient_fetch_concurrency, 4);
    }
}
