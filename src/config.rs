//! Operator configuration
//!
//! Read once from the environment at startup.

use std::time::Duration;

use crate::error::{Error, Result};
use crate::reconcilers::SpecChangingPolicy;

/// Default metrics port
const DEFAULT_METRICS_PORT: u16 = 8080;
/// Default timeout for DCS API requests
const DEFAULT_API_TIMEOUT_SECS: u64 = 30;

/// Operator configuration
#[derive(Clone, Debug)]
pub struct OperatorConfig {
    /// Base URL of the DCS management API
    pub api_url: String,
    /// Timeout for a single DCS API request
    pub api_timeout: Duration,
    /// Port serving metrics and health endpoints
    pub metrics_port: u16,
    /// Only watch this namespace (all namespaces when unset)
    pub watch_namespace: Option<String>,
    /// When to record the SpecChanging condition
    pub spec_changing: SpecChangingPolicy,
}

impl OperatorConfig {
    /// Load configuration from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration using `lookup` to resolve variables
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_url = lookup("DCS_API_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| Error::config("DCS_API_URL must be set"))?;

        let api_timeout = match lookup("DCS_API_TIMEOUT_SECS") {
            Some(v) => Duration::from_secs(v.parse().map_err(|e| {
                Error::config(format!("Invalid DCS_API_TIMEOUT_SECS '{}': {}", v, e))
            })?),
            None => Duration::from_secs(DEFAULT_API_TIMEOUT_SECS),
        };

        let metrics_port = match lookup("METRICS_PORT") {
            Some(v) => v
                .parse()
                .map_err(|e| Error::config(format!("Invalid METRICS_PORT '{}': {}", v, e)))?,
            None => DEFAULT_METRICS_PORT,
        };

        let watch_namespace = lookup("WATCH_NAMESPACE").filter(|v| !v.is_empty());

        let spec_changing = match lookup("SPEC_CHANGING_POLICY") {
            Some(v) => v.parse()?,
            None => SpecChangingPolicy::default(),
        };

        Ok(Self {
            api_url,
            api_timeout,
            metrics_port,
            watch_namespace,
            spec_changing,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<OperatorConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        OperatorConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("DCS_API_URL", "http://dcs.local:30086")]).unwrap();
        assert_eq!(config.api_url, "http://dcs.local:30086");
        assert_eq!(config.api_timeout, Duration::from_secs(30));
        assert_eq!(config.metrics_port, 8080);
        assert!(config.watch_namespace.is_none());
        assert_eq!(config.spec_changing, SpecChangingPolicy::Optimistic);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("DCS_API_URL", "http://dcs.local"),
            ("DCS_API_TIMEOUT_SECS", "5"),
            ("METRICS_PORT", "9090"),
            ("WATCH_NAMESPACE", "tenants"),
            ("SPEC_CHANGING_POLICY", "on-diff"),
        ])
        .unwrap();
        assert_eq!(config.api_timeout, Duration::from_secs(5));
        assert_eq!(config.metrics_port, 9090);
        assert_eq!(config.watch_namespace.as_deref(), Some("tenants"));
        assert_eq!(config.spec_changing, SpecChangingPolicy::OnDiff);
    }

    #[test]
    fn test_missing_api_url_fails() {
        let err = load(&[]).unwrap_err();
        assert!(err.to_string().contains("DCS_API_URL"));
    }

    #[test]
    fn test_invalid_values_fail() {
        assert!(load(&[("DCS_API_URL", "http://dcs"), ("METRICS_PORT", "http")]).is_err());
        assert!(load(&[("DCS_API_URL", "http://dcs"), ("SPEC_CHANGING_POLICY", "eager")]).is_err());
    }
}
