//! Connection configuration for database adapters.
//!
//! Configuration is read once by the host and passed explicitly to whichever
//! component builds an adapter; nothing here is process-wide state.

use thiserror::Error;

pub const ENDPOINT_VAR: &str = "COSMOSDB_ENDPOINT";
pub const KEY_VAR: &str = "COSMOSDB_KEY";
pub const ENDPOINT_DISCOVERY_VAR: &str = "COSMOSDB_ENABLE_ENDPOINT_DISCOVERY";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("COSMOSDB_ENDPOINT environment variable not defined; cannot initialise the document adapter")]
    MissingEndpoint,

    #[error("COSMOSDB_KEY environment variable not defined; cannot initialise the document adapter")]
    MissingKey,
}

/// Endpoint, access key and discovery toggle for a document database.
#[derive(Clone, PartialEq, Eq)]
pub struct AdapterConfig {
    endpoint: String,
    key: String,
    enable_endpoint_discovery: bool,
}

impl AdapterConfig {
    pub fn new(endpoint: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            key: key.into(),
            enable_endpoint_discovery: true,
        }
    }

    pub fn with_endpoint_discovery(mut self, enabled: bool) -> Self {
        self.enable_endpoint_discovery = enabled;
        self
    }

    /// Load from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable lookup.
    ///
    /// Empty values count as missing. Endpoint discovery is on when the toggle
    /// is unset or exactly `"true"`, off for any other value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let present = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let endpoint = present(ENDPOINT_VAR).ok_or(ConfigError::MissingEndpoint)?;
        let key = present(KEY_VAR).ok_or(ConfigError::MissingKey)?;
        let enable_endpoint_discovery = match lookup(ENDPOINT_DISCOVERY_VAR) {
            None => true,
            Some(v) => v == "true",
        };

        Ok(Self {
            endpoint,
            key,
            enable_endpoint_discovery,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn enable_endpoint_discovery(&self) -> bool {
        self.enable_endpoint_discovery
    }
}

impl core::fmt::Debug for AdapterConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AdapterConfig")
            .field("endpoint", &self.endpoint)
            .field("key", &"<redacted>")
            .field("enable_endpoint_discovery", &self.enable_endpoint_discovery)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn missing_endpoint_is_fatal() {
        let err = AdapterConfig::from_lookup(lookup(&[(KEY_VAR, "k")])).unwrap_err();
        assert_eq!(err, ConfigError::MissingEndpoint);

        let err = AdapterConfig::from_lookup(lookup(&[(ENDPOINT_VAR, ""), (KEY_VAR, "k")]))
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingEndpoint);
    }

    #[test]
    fn missing_key_is_fatal() {
        let err = AdapterConfig::from_lookup(lookup(&[(ENDPOINT_VAR, "https://db")])).unwrap_err();
        assert_eq!(err, ConfigError::MissingKey);
    }

    #[test]
    fn endpoint_discovery_defaults_on_and_only_true_enables_it() {
        let base = [(ENDPOINT_VAR, "https://db"), (KEY_VAR, "k")];
        assert!(AdapterConfig::from_lookup(lookup(&base)).unwrap().enable_endpoint_discovery());

        for (value, expected) in [("true", true), ("false", false), ("TRUE", false), ("1", false)] {
            let mut vars = base.to_vec();
            vars.push((ENDPOINT_DISCOVERY_VAR, value));
            let cfg = AdapterConfig::from_lookup(lookup(&vars)).unwrap();
            assert_eq!(cfg.enable_endpoint_discovery(), expected, "{value}");
        }
    }

    #[test]
    fn debug_output_redacts_key() {
        let cfg = AdapterConfig::new("https://db", "super-secret");
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("https://db"));
    }
}
