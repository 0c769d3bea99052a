//! Server configuration

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::rate_limit::RateLimitConfig;

/// Environment variable prefix (`STOREFRONT__BIND_ADDR=0.0.0.0:5000`)
pub const ENV_PREFIX: &str = "STOREFRONT";

/// Google OAuth client credentials
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Must match the redirect registered with Google
    pub redirect_url: String,
}

impl GoogleConfig {
    pub fn is_complete(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty() && !self.redirect_url.is_empty()
    }
}

/// Complete API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub bind_addr: String,
    pub jwt_secret: String,
    /// Session token lifetime
    pub token_ttl_hours: i64,
    pub bcrypt_cost: u32,
    /// Cross-site cookies (`SameSite=None; Secure`)
    pub production: bool,
    pub cors_origins: Vec<String>,
    /// Where the browser lands after an OAuth login
    pub client_url: String,
    /// JSON array of catalog entries loaded at start
    pub catalog_path: Option<String>,
    pub rate_limit: RateLimitConfig,
    pub metrics_enabled: bool,
    pub log_level: String,
    pub google: Option<GoogleConfig>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5000".to_string(),
            jwt_secret: "change-me".to_string(),
            token_ttl_hours: 24 * 7,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            production: false,
            cors_origins: vec!["http://localhost:5173".to_string()],
            client_url: "http://localhost:5173".to_string(),
            catalog_path: None,
            rate_limit: RateLimitConfig::default(),
            metrics_enabled: true,
            log_level: "info".to_string(),
            google: None,
        }
    }
}

impl ApiConfig {
    /// Defaults, then an optional TOML file, then `STOREFRONT__*` variables
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let defaults = Config::try_from(&Self::default())?;
        let mut builder = Config::builder().add_source(defaults);
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }
        builder
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()
    }

    /// Cheap hashing, no rate limiting or metrics; for tests and local tooling
    pub fn testing() -> Self {
        Self {
            jwt_secret: "test-secret".to_string(),
            bcrypt_cost: 4,
            rate_limit: RateLimitConfig::disabled(),
            metrics_enabled: false,
            ..Default::default()
        }
    }

    /// Google credentials, only when every field is set
    pub fn google(&self) -> Option<&GoogleConfig> {
        self.google.as_ref().filter(|g| g.is_complete())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_load_without_file() {
        let config = ApiConfig::load(Some(Path::new("/nonexistent/storefront.toml"))).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:5000");
        assert_eq!(config.cors_origins, vec!["http://localhost:5173"]);
        assert!(config.rate_limit.enabled);
        assert!(!config.production);
        assert!(config.google().is_none());
    }

    #[test]
    fn test_incomplete_google_config_is_ignored() {
        let config = ApiConfig {
            google: Some(GoogleConfig {
                client_id: "id".into(),
                ..Default::default()
            }),
            ..ApiConfig::testing()
        };
        assert!(config.google().is_none());
    }

    #[test]
    fn test_testing_preset() {
        let config = ApiConfig::testing();
        assert_eq!(config.bcrypt_cost, 4);
        assert!(!config.rate_limit.enabled);
        assert!(!config.metrics_enabled);
    }
}
