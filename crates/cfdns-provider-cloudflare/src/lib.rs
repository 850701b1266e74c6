// # Cloudflare DNS Provider
//
// This crate provides the Cloudflare API v4 implementation of
// `cfdns_core::DnsProvider`.
//
// - One HTTP request per trait call
// - Full error propagation (the reconciler owns retries)
// - HTTP timeout configured (10 seconds by default)
// - Status-specific error messages (401/403, 404, 429, 5xx)
// - No caching, no background tasks, no stored credentials
//
// ## Security Requirements
//
// - The API token is passed into each call and never stored
// - The API token never appears in logs or error messages
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - List Zones: GET `/zones?name=...`
// - List DNS Records: GET `/zones/:zone_id/dns_records?name=...`
// - Create DNS Record: POST `/zones/:zone_id/dns_records`
// - Update DNS Record: PUT `/zones/:zone_id/dns_records/:record_id`
// - Delete DNS Record: DELETE `/zones/:zone_id/dns_records/:record_id`

use async_trait::async_trait;
use cfdns_core::config::ProviderConfig;
use cfdns_core::traits::{DnsProvider, RecordDesired};
use cfdns_core::{ApiToken, Error, Result};
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::net::Ipv4Addr;

/// Response envelope shared by every Cloudflare API v4 endpoint
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
}

/// Entry of the envelope's `errors` array
#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct Zone {
    id: String,
}

#[derive(Debug, Deserialize)]
struct DnsRecord {
    id: String,
    name: String,
}

/// Cloudflare DNS provider
///
/// Stateless: holds only the HTTP client and the API base URL.
#[derive(Debug, Clone)]
pub struct CloudflareProvider {
    /// API base URL, without a trailing slash
    api_base: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

impl CloudflareProvider {
    /// Create a provider from configuration
    ///
    /// # Errors
    ///
    /// `Error::Config` if the configuration is invalid or the HTTP client
    /// cannot be built
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_base: config.api_base.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Create a provider against the public Cloudflare API
    pub fn with_defaults() -> Result<Self> {
        Self::new(&ProviderConfig::default())
    }

    /// API base URL in use
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn records_url(&self, zone_id: &str) -> String {
        format!("{}/zones/{}/dns_records", self.api_base, zone_id)
    }

    fn record_url(&self, zone_id: &str, record_id: &str) -> String {
        format!("{}/zones/{}/dns_records/{}", self.api_base, zone_id, record_id)
    }

    /// Send a request and unwrap the response envelope
    ///
    /// # Returns
    ///
    /// - `Ok(result)`: `success` was true and the status was 2xx
    /// - `Err(Error::Transport)`: The request did not complete
    /// - `Err(Error::Provider)`: Anything else
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        token: &ApiToken,
        operation: &str,
    ) -> Result<Option<T>> {
        let response = request
            .bearer_auth(token.expose())
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| Error::transport(format!("{}: HTTP request failed: {}", operation, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::transport(format!("{}: failed to read response: {}", operation, e)))?;

        match serde_json::from_str::<ApiEnvelope<T>>(&body) {
            Ok(envelope) if status.is_success() && envelope.success => Ok(envelope.result),
            Ok(envelope) => Err(Error::provider(
                status.as_u16(),
                describe_failure(status, operation, &envelope.errors),
            )),
            Err(e) if status.is_success() => Err(Error::provider(
                status.as_u16(),
                format!("{}: invalid response format: {}", operation, e),
            )),
            Err(_) => Err(Error::provider(
                status.as_u16(),
                describe_failure(status, operation, &[]),
            )),
        }
    }
}

/// Human-readable failure description for a non-success response
fn describe_failure(status: StatusCode, operation: &str, errors: &[ApiMessage]) -> String {
    let summary = match status.as_u16() {
        401 | 403 => format!(
            "{}: authentication failed, invalid API token or insufficient permissions",
            operation
        ),
        404 => format!("{}: not found", operation),
        409 => format!("{}: conflict with an existing record", operation),
        429 => format!("{}: rate limit exceeded, retry later", operation),
        500..=599 => format!("{}: Cloudflare server error (transient)", operation),
        _ => format!("{} failed", operation),
    };

    if errors.is_empty() {
        return summary;
    }

    let details: Vec<String> = errors
        .iter()
        .map(|e| match e.code {
            Some(code) => format!("[{}] {}", code, e.message),
            None => e.message.clone(),
        })
        .collect();
    format!("{}: {}", summary, details.join("; "))
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    async fn resolve_zone(
        &self,
        registrable_domain: &str,
        token: &ApiToken,
    ) -> Result<Option<String>> {
        tracing::debug!("Looking up zone ID for domain: {}", registrable_domain);

        let request = self
            .client
            .get(format!("{}/zones", self.api_base))
            .query(&[("name", registrable_domain)]);
        let zones: Vec<Zone> = self
            .send(request, token, "Zone lookup")
            .await?
            .unwrap_or_default();

        let zone_id = zones.into_iter().next().map(|zone| zone.id);
        match &zone_id {
            Some(id) => tracing::debug!("Found zone ID: {}", id),
            None => tracing::debug!("No zone named {}", registrable_domain),
        }
        Ok(zone_id)
    }

    async fn find_record(
        &self,
        zone_id: &str,
        fqdn: &str,
        token: &ApiToken,
    ) -> Result<Option<String>> {
        tracing::debug!("Looking up record ID: {}", fqdn);

        let request = self
            .client
            .get(self.records_url(zone_id))
            .query(&[("name", fqdn)]);
        let records: Vec<DnsRecord> = self
            .send(request, token, "Record lookup")
            .await?
            .unwrap_or_default();

        // First exact match wins; Cloudflare orders the results
        let record_id = records
            .into_iter()
            .find(|record| record.name.eq_ignore_ascii_case(fqdn))
            .map(|record| record.id);
        match &record_id {
            Some(id) => tracing::debug!("Found record ID: {}", id),
            None => tracing::debug!("No record named {}", fqdn),
        }
        Ok(record_id)
    }

    async fn create_record(
        &self,
        zone_id: &str,
        fqdn: &str,
        ip: Ipv4Addr,
        proxied: bool,
        token: &ApiToken,
    ) -> Result<String> {
        let payload = RecordDesired::a(fqdn, ip, proxied);
        tracing::info!("Creating Cloudflare DNS record: {} -> {}", fqdn, ip);

        let request = self.client.post(self.records_url(zone_id)).json(&payload);
        let created: DnsRecord = self
            .send(request, token, "Record create")
            .await?
            .ok_or_else(|| {
                Error::provider(200, "Record create: response did not include the new record")
            })?;

        tracing::info!("DNS record created: {} (id: {})", fqdn, created.id);
        Ok(created.id)
    }

    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        fqdn: &str,
        ip: Ipv4Addr,
        proxied: bool,
        token: &ApiToken,
    ) -> Result<()> {
        let payload = RecordDesired::a(fqdn, ip, proxied);
        tracing::info!("Updating Cloudflare DNS record: {} -> {}", fqdn, ip);

        let request = self
            .client
            .put(self.record_url(zone_id, record_id))
            .json(&payload);
        self.send::<serde_json::Value>(request, token, "Record update")
            .await?;

        tracing::info!("DNS record updated successfully: {} -> {}", fqdn, ip);
        Ok(())
    }

    async fn delete_record(&self, zone_id: &str, record_id: &str, token: &ApiToken) -> Result<()> {
        tracing::info!("Deleting Cloudflare DNS record: {}", record_id);

        let request = self.client.delete(self.record_url(zone_id, record_id));
        self.send::<serde_json::Value>(request, token, "Record delete")
            .await?;

        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "cloudflare"
    }
}
