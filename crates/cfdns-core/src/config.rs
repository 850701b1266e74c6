//! Configuration types for cfdns
//!
//! This module defines all configuration structures used throughout the
//! workspace. Every struct is serde-friendly and fills missing fields from
//! the `default_*` functions at the bottom of the file.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Cloudflare API v4 base URL
pub const DEFAULT_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Public IP service used when none is configured
pub const DEFAULT_IP_SERVICE_URL: &str = "http://ip.ustc.edu.cn/myip.php";

/// JSON field holding the address in the default service's response
pub const DEFAULT_IP_FIELD: &str = "myip";

/// Record TTL in seconds; fixed for every write
pub const RECORD_TTL_SECS: u32 = 120;

/// DNS provider client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API base URL, without a trailing slash
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Client-side request timeout (in seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        validate_http_url("Provider API base", &self.api_base)?;
        if self.timeout_secs == 0 {
            return Err(crate::Error::config("Provider timeout must be > 0"));
        }
        Ok(())
    }

    /// Request timeout as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Public IP source configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpSourceConfig {
    /// URL returning a JSON object with the caller's address
    #[serde(default = "default_ip_service_url")]
    pub url: String,

    /// Name of the JSON field holding the address
    #[serde(default = "default_ip_field")]
    pub field: String,

    /// Client-side request timeout (in seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl IpSourceConfig {
    /// Validate the IP source configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        validate_http_url("IP service URL", &self.url)?;
        if self.field.is_empty() {
            return Err(crate::Error::config("IP service field cannot be empty"));
        }
        if self.timeout_secs == 0 {
            return Err(crate::Error::config("IP service timeout must be > 0"));
        }
        Ok(())
    }

    /// Request timeout as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for IpSourceConfig {
    fn default() -> Self {
        Self {
            url: default_ip_service_url(),
            field: default_ip_field(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// What the reconciler does with its last-applied IP when a write fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteFailurePolicy {
    /// Keep the stale last-applied IP, so the next tick retries the same diff
    #[default]
    RetryNextTick,

    /// Adopt the new IP anyway; the failed write is not retried until the
    /// public IP changes again
    Advance,
}

/// One DDNS session: a single A record kept in sync with the public IP
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Zone holding the record
    pub zone_id: String,

    /// Fully-qualified record name (e.g. "sub.example.com"); normalized
    /// when the reconciler is built
    pub record_name: String,

    /// Route traffic through the provider's edge
    #[serde(default)]
    pub proxied: bool,

    /// Delay between checks (in seconds)
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Behaviour when a write fails during a tick
    #[serde(default)]
    pub on_write_failure: WriteFailurePolicy,
}

impl SessionConfig {
    /// Create a session configuration with default polling
    pub fn new(zone_id: impl Into<String>, record_name: impl Into<String>) -> Self {
        Self {
            zone_id: zone_id.into(),
            record_name: record_name.into(),
            proxied: false,
            poll_interval_secs: default_poll_interval_secs(),
            on_write_failure: WriteFailurePolicy::default(),
        }
    }

    /// Set the proxied flag
    pub fn with_proxied(mut self, proxied: bool) -> Self {
        self.proxied = proxied;
        self
    }

    /// Set the poll interval
    pub fn with_poll_interval_secs(mut self, secs: u64) -> Self {
        self.poll_interval_secs = secs;
        self
    }

    /// Set the write failure policy
    pub fn with_write_failure_policy(mut self, policy: WriteFailurePolicy) -> Self {
        self.on_write_failure = policy;
        self
    }

    /// Validate the session configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.zone_id.trim().is_empty() {
            return Err(crate::Error::config("Zone ID cannot be empty"));
        }
        crate::domain::record_name(&self.record_name)?;
        if self.poll_interval_secs == 0 {
            return Err(crate::Error::config("Poll interval must be > 0"));
        }
        Ok(())
    }

    /// Poll interval as a `Duration`
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

fn validate_http_url(what: &str, url: &str) -> Result<(), crate::Error> {
    if url.is_empty() {
        return Err(crate::Error::config(format!("{} cannot be empty", what)));
    }
    if !url.starts_with("https://") && !url.starts_with("http://") {
        return Err(crate::Error::config(format!(
            "{} must use HTTP or HTTPS scheme. Got: {}",
            what, url
        )));
    }
    Ok(())
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_ip_service_url() -> String {
    DEFAULT_IP_SERVICE_URL.to_string()
}

fn default_ip_field() -> String {
    DEFAULT_IP_FIELD.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_poll_interval_secs() -> u64 {
    120
}
