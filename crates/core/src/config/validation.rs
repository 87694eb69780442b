//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `version` is 0
    /// - `namespace` is empty
    /// - `origin` is not an http(s) URL with a host
    /// - any essential asset path or the fallback path is not root-relative
    /// - `user_agent` is empty
    /// - `timeout_ms` is outside [100ms, 5 minutes]
    /// - `max_body_bytes` is 0 or exceeds 50MB
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version == 0 {
            return Err(ConfigError::Invalid { field: "version".into(), reason: "must be at least 1".into() });
        }

        if self.namespace.is_empty() {
            return Err(ConfigError::Invalid { field: "namespace".into(), reason: "must not be empty".into() });
        }

        match url::Url::parse(&self.origin) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") && parsed.host_str().is_some() => {}
            Ok(parsed) => {
                return Err(ConfigError::Invalid {
                    field: "origin".into(),
                    reason: format!("must be an http(s) URL with a host, got scheme {}", parsed.scheme()),
                });
            }
            Err(e) => {
                return Err(ConfigError::Invalid { field: "origin".into(), reason: e.to_string() });
            }
        }

        for path in &self.essential_assets {
            if !path.starts_with('/') {
                return Err(ConfigError::Invalid {
                    field: "essential_assets".into(),
                    reason: format!("paths must be root-relative, got {path:?}"),
                });
            }
        }

        if !self.offline_fallback_path.starts_with('/') {
            return Err(ConfigError::Invalid {
                field: "offline_fallback_path".into(),
                reason: "must be root-relative".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid {
                field: "max_body_bytes".into(),
                reason: "must be greater than 0".into(),
            });
        }
        if self.max_body_bytes > 50 * 1024 * 1024 {
            return Err(ConfigError::Invalid {
                field: "max_body_bytes".into(),
                reason: "must not exceed 50MB".into(),
            });
        }

        if self.cache_cross_origin && self.allowed_hosts.is_empty() {
            tracing::warn!("cache_cross_origin is set but allowed_hosts is empty; no cross-origin request is intercepted");
        }

        Ok(())
    }
}
