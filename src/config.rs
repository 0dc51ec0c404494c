//! Array connection configuration
//!
//! Loaded from a YAML file, then overridden field by field from CLI flags or
//! environment variables in `main`. The gateway owns all timeout and retry
//! policy, so those knobs live here rather than in the pipeline.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Configuration for the array management endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArrayConfig {
    /// Management endpoint, e.g. "https://10.64.2.10"
    pub endpoint: String,
    /// Management user
    pub username: String,
    /// Management password
    pub password: String,
    /// Accept self-signed certificates (arrays ship with them)
    pub accept_invalid_certs: bool,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// TCP connect timeout in seconds
    pub connect_timeout_secs: u64,
    /// Total time budget for retrying an idempotent read; 0 disables retries
    pub retry_max_elapsed_secs: u64,
}

impl Default for ArrayConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            username: "admin".to_string(),
            password: String::new(),
            accept_invalid_certs: false,
            timeout_secs: 120,
            connect_timeout_secs: 5,
            retry_max_elapsed_secs: 30,
        }
    }
}

impl ArrayConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("cannot read config file {}: {}", path.display(), e))
        })?;
        let config: ArrayConfig = serde_yaml::from_str(&raw)?;
        Ok(config)
    }

    /// Check that the fields required to reach the array are present.
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            return Err(Error::Configuration(
                "array endpoint is not set (flag --endpoint, env PS_ENDPOINT, or config file)"
                    .into(),
            ));
        }
        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            return Err(Error::Configuration(format!(
                "array endpoint '{}' must start with http:// or https://",
                self.endpoint
            )));
        }
        if self.username.trim().is_empty() {
            return Err(Error::Configuration("array username is not set".into()));
        }
        Ok(())
    }

    /// Endpoint without a trailing slash, ready for path concatenation.
    pub fn base_url(&self) -> String {
        self.endpoint.trim_end_matches('/').to_string()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Retry budget for idempotent reads; None disables retries.
    pub fn retry_max_elapsed(&self) -> Option<Duration> {
        if self.retry_max_elapsed_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.retry_max_elapsed_secs))
        }
    }
}

// =============================================================================
// Run Configuration
// =============================================================================

/// Knobs for one batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Pause between requests in milliseconds; 0 disables the throttle
    pub pause_ms: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self { pause_ms: 250 }
    }
}

impl RunConfig {
    /// Inter-request pause; None when disabled.
    pub fn pause(&self) -> Option<Duration> {
        if self.pause_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.pause_ms))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_validate_requires_endpoint() {
        let config = ArrayConfig::default();
        assert!(config.validate().is_err());

        let config = ArrayConfig {
            endpoint: "https://10.64.2.10".into(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bare_host() {
        let config = ArrayConfig {
            endpoint: "10.64.2.10".into(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_base_url_strips_trailing_slash() {
        let config = ArrayConfig {
            endpoint: "https://10.64.2.10/".into(),
            ..Default::default()
        };
        assert_eq!(config.base_url(), "https://10.64.2.10");
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "endpoint: https://10.64.2.10\nusername: provisioner\npassword: secret\ntimeout_secs: 60"
        )
        .unwrap();

        let config = ArrayConfig::from_file(file.path()).unwrap();
        assert_eq!(config.endpoint, "https://10.64.2.10");
        assert_eq!(config.username, "provisioner");
        assert_eq!(config.password, "secret");
        assert_eq!(config.timeout_secs, 60);
        // Unset fields keep their defaults
        assert_eq!(config.connect_timeout_secs, 5);
    }

    #[test]
    fn test_retry_disabled_at_zero() {
        let config = ArrayConfig {
            retry_max_elapsed_secs: 0,
            ..Default::default()
        };
        assert!(config.retry_max_elapsed().is_none());
    }
}
