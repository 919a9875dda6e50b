//! Client configuration.
//!
//! The backend base URL comes from `ITEMS_API_URL`, read from the process
//! environment after loading a `.env` file if one exists. When unset it
//! falls back to `http://localhost:8000`.

use serde::Deserialize;
use tracing::debug;

use crate::error::ConfigError;

/// Environment variable prefix; `ITEMS_API_URL` sets `api_url`.
pub const ENV_PREFIX: &str = "ITEMS_";

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Client configuration, read once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the backend
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

impl ApiConfig {
    /// Load from `.env` (if present) and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let config: ApiConfig = envy::prefixed(ENV_PREFIX).from_env()?;
        debug!(api_url = %config.api_url, "configuration loaded");
        Ok(config)
    }

    /// Load from explicit key/value pairs, with the same prefix rules as `load`.
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::prefixed(ENV_PREFIX).from_iter(vars)?)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
        }
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_unset() {
        let config = ApiConfig::from_vars(Vec::new()).unwrap();
        assert_eq!(config.api_url, "http://localhost:8000");
        assert_eq!(config, ApiConfig::default());
    }

    #[test]
    fn reads_prefixed_variable() {
        let vars = vec![("ITEMS_API_URL".to_string(), "https://api.example.com".to_string())];
        let config = ApiConfig::from_vars(vars).unwrap();
        assert_eq!(config.api_url, "https://api.example.com");
    }

    #[test]
    fn ignores_unrelated_variables() {
        let vars = vec![("API_URL".to_string(), "http://elsewhere".to_string())];
        let config = ApiConfig::from_vars(vars).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn load_reads_process_environment() {
        std::env::set_var("ITEMS_API_URL", "http://from-env:9100");
        let config = ApiConfig::load().unwrap();
        std::env::remove_var("ITEMS_API_URL");
        assert_eq!(config.api_url, "http://from-env:9100");
    }
}
