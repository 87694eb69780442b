//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SHELTER_*)
//! 2. TOML config file (if SHELTER_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::name::CacheName;

mod validation;

pub use validation::ConfigError;

/// Worker configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SHELTER_*)
/// 2. TOML config file (if SHELTER_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite cache database.
    ///
    /// Set via SHELTER_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Logical cache namespace. All versioned cache names share this prefix.
    ///
    /// Set via SHELTER_NAMESPACE environment variable.
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Cache version. Bump whenever the essential asset set changes, so
    /// asset sets are never mixed across versions.
    ///
    /// Set via SHELTER_VERSION environment variable.
    #[serde(default = "default_version")]
    pub version: u32,

    /// The application's own origin, e.g. `https://app.example`.
    ///
    /// Set via SHELTER_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Root-relative paths cached at install and kept available offline.
    ///
    /// Set via SHELTER_ESSENTIAL_ASSETS environment variable.
    #[serde(default = "default_essential_assets")]
    pub essential_assets: Vec<String>,

    /// Last-resort cached response for failed navigation requests.
    ///
    /// Set via SHELTER_OFFLINE_FALLBACK_PATH environment variable.
    #[serde(default = "default_fallback_path")]
    pub offline_fallback_path: String,

    /// Cross-origin hosts whose requests are intercepted at all.
    ///
    /// Set via SHELTER_ALLOWED_HOSTS environment variable.
    #[serde(default)]
    pub allowed_hosts: Vec<String>,

    /// Whether allowlisted cross-origin responses are also written back
    /// into the cache. Off by default: long-term caching of third-party
    /// content is an explicit opt-in policy.
    ///
    /// Set via SHELTER_CACHE_CROSS_ORIGIN environment variable.
    #[serde(default)]
    pub cache_cross_origin: bool,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via SHELTER_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via SHELTER_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum bytes to buffer per response.
    ///
    /// Set via SHELTER_MAX_BODY_BYTES environment variable.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./shelter-cache.sqlite")
}

fn default_namespace() -> String {
    "app-cache".into()
}

fn default_version() -> u32 {
    1
}

fn default_origin() -> String {
    "http://localhost:3000".into()
}

fn default_essential_assets() -> Vec<String> {
    vec!["/".into(), "/manifest.json".into(), "/favicon.ico".into(), "/logo.png".into()]
}

fn default_fallback_path() -> String {
    "/".into()
}

fn default_user_agent() -> String {
    "shelter/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_body_bytes() -> usize {
    5_242_880 // 5MB
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            namespace: default_namespace(),
            version: default_version(),
            origin: default_origin(),
            essential_assets: default_essential_assets(),
            offline_fallback_path: default_fallback_path(),
            allowed_hosts: Vec::new(),
            cache_cross_origin: false,
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// The versioned cache name this configuration installs into.
    pub fn cache_name(&self) -> CacheName {
        CacheName::new(self.namespace.clone(), self.version)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SHELTER_`
    /// 2. TOML file from `SHELTER_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SHELTER_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SHELTER_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.db_path, PathBuf::from("./shelter-cache.sqlite"));
        assert_eq!(config.namespace, "app-cache");
        assert_eq!(config.version, 1);
        assert_eq!(config.offline_fallback_path, "/");
        assert!(config.essential_assets.contains(&"/manifest.json".to_string()));
        assert!(config.allowed_hosts.is_empty());
        assert!(!config.cache_cross_origin);
        assert_eq!(config.timeout_ms, 20_000);
        assert_eq!(config.max_body_bytes, 5_242_880);
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
    }

    #[test]
    fn test_cache_name() {
        let config = AppConfig { version: 3, ..Default::default() };
        assert_eq!(config.cache_name().to_string(), "app-cache-v3");
    }
}
