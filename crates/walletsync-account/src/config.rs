//! Account service configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How the account side reaches the identity service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DirectoryMode {
    /// Same process; calls go straight to the credential store
    #[default]
    Local,
    /// Remote identity service over HTTP
    Http,
}

/// Identity directory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    pub mode: DirectoryMode,
    /// Base URL of the identity service (http mode)
    pub base_url: String,
    /// Deadline for each cross-service call
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Sent as `X-Service-Token` on display-name updates
    pub service_token: Option<String>,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            mode: DirectoryMode::Local,
            base_url: "http://127.0.0.1:8081".to_string(),
            request_timeout: Duration::from_secs(5),
            service_token: None,
        }
    }
}

impl DirectoryConfig {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        let is_http_url = self.base_url.starts_with("http://") || self.base_url.starts_with("https://");
        if self.mode == DirectoryMode::Http && !is_http_url {
            errors.push(format!("Identity service URL must be http(s): {}", self.base_url));
        }
        if self.request_timeout.is_zero() {
            errors.push("Directory request timeout must be greater than zero".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Profile sync worker pool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Pending propagation jobs held before new ones are dropped
    pub queue_capacity: usize,
    /// Propagation calls running at once
    pub max_in_flight: usize,
    /// How long shutdown waits for queued jobs to finish
    #[serde(with = "humantime_serde")]
    pub shutdown_grace: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
            max_in_flight: 16,
            shutdown_grace: Duration::from_secs(5),
        }
    }
}

impl SyncConfig {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        if self.queue_capacity == 0 {
            errors.push("Sync queue capacity must be at least 1".to_string());
        }
        if self.max_in_flight == 0 {
            errors.push("Sync max_in_flight must be at least 1".to_string());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(DirectoryConfig::default().validate().is_ok());
        assert!(SyncConfig::default().validate().is_ok());
        assert_eq!(SyncConfig::default().queue_capacity, 1024);
        assert_eq!(SyncConfig::default().max_in_flight, 16);
    }

    #[test]
    fn test_http_mode_requires_url() {
        let config = DirectoryConfig {
            mode: DirectoryMode::Http,
            base_url: "identity:8081".to_string(),
            ..DirectoryConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_sized_pool_rejected() {
        let config = SyncConfig {
            max_in_flight: 0,
            ..SyncConfig::default()
        };
        assert_eq!(config.validate().unwrap_err().len(), 1);
    }

    #[test]
    fn test_partial_deserialize() {
        let config: DirectoryConfig =
            serde_json::from_str(r#"{"mode":"http","request_timeout":"2s"}"#).unwrap();
        assert_eq!(config.mode, DirectoryMode::Http);
        assert_eq!(config.request_timeout, Duration::from_secs(2));
        assert_eq!(config.base_url, "http://127.0.0.1:8081");
    }
}
