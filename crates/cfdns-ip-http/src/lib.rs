// # HTTP IP Source
//
// This crate provides the HTTP/JSON public IP source for cfdns.
//
// ## Architecture
//
// Each call to `current()` performs one GET against a "what is my IP"
// service that answers with a JSON object, for example:
//
// ```text
// {"myip": "203.0.113.7", "location": "..."}
// ```
//
// The configured field is read and parsed as an IPv4 address. There is no
// caching and no polling here; the reconciler decides when to ask.

use async_trait::async_trait;
use cfdns_core::config::IpSourceConfig;
use cfdns_core::traits::IpSource;
use cfdns_core::{Error, Result};
use std::net::Ipv4Addr;

/// HTTP/JSON public IP source
#[derive(Debug, Clone)]
pub struct HttpIpSource {
    /// Service URL
    url: String,

    /// JSON field holding the address
    field: String,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a new HTTP IP source
    ///
    /// # Errors
    ///
    /// `Error::Config` if the configuration is invalid or the HTTP client
    /// cannot be built
    pub fn new(config: &IpSourceConfig) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: config.url.clone(),
            field: config.field.clone(),
            client,
        })
    }

    /// Create a source for the default service
    pub fn with_defaults() -> Result<Self> {
        Self::new(&IpSourceConfig::default())
    }

    /// Service URL in use
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch current IP from the HTTP service
    async fn fetch_ip(&self) -> Result<Ipv4Addr> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::ip_unavailable(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::ip_unavailable(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::ip_unavailable(format!("Failed to read response: {}", e)))?;

        parse_address(&body, &self.field)
    }
}

/// Extract an IPv4 address from a JSON response body
fn parse_address(body: &str, field: &str) -> Result<Ipv4Addr> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| Error::ip_unavailable(format!("Invalid JSON response: {}", e)))?;

    let text = value
        .get(field)
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::ip_unavailable(format!("Response has no '{}' string field", field)))?
        .trim();

    text.parse::<Ipv4Addr>()
        .map_err(|_| Error::ip_unavailable(format!("Not an IPv4 address: {}", text)))
}

#[async_trait]
impl IpSource for HttpIpSource {
    async fn current(&self) -> Result<Ipv4Addr> {
        match self.fetch_ip().await {
            Ok(ip) => {
                tracing::debug!("Public IP from {}: {}", self.url, ip);
                Ok(ip)
            }
            Err(e) => {
                tracing::warn!("Public IP lookup failed ({}): {}", self.url, e);
                Err(e)
            }
        }
    }

    fn source_name(&self) -> &'static str {
        "http"
    }
}
