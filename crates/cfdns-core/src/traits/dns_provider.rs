// # DNS Provider Trait
//
// Defines the interface for zone and record operations against a DNS
// hosting API.
//
// ## Implementations
//
// - Cloudflare: `cfdns-provider-cloudflare` crate
//
// ## Usage
//
// ```rust,ignore
// use cfdns_core::{ApiToken, DnsProvider};
//
// let token = ApiToken::new(std::env::var("CFDNS_API_TOKEN")?)?;
// let zone_id = provider.resolve_zone("example.com", &token).await?;
// if let Some(zone_id) = zone_id {
//     let record_id = provider.find_record(&zone_id, "sub.example.com", &token).await?;
// }
// ```

use crate::config::RECORD_TTL_SECS;
use crate::credential::ApiToken;
use async_trait::async_trait;
use serde::Serialize;
use std::net::Ipv4Addr;

/// DNS record type written by cfdns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RecordType {
    /// IPv4 address record
    A,
}

/// Target state of a record: the body of a create or full-replace request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordDesired {
    /// Record type (always A)
    #[serde(rename = "type")]
    pub record_type: RecordType,
    /// Fully-qualified record name
    pub name: String,
    /// IPv4 address, as a dotted string
    pub content: String,
    /// Time-to-live in seconds
    pub ttl: u32,
    /// Provider proxy flag
    pub proxied: bool,
}

impl RecordDesired {
    /// An A record pointing `name` at `ip`, with the fixed TTL
    pub fn a(name: impl Into<String>, ip: Ipv4Addr, proxied: bool) -> Self {
        Self {
            record_type: RecordType::A,
            name: name.into(),
            content: ip.to_string(),
            ttl: RECORD_TTL_SECS,
            proxied,
        }
    }
}

/// Trait for DNS provider implementations
///
/// Every call is a single remote operation with no local caching of the
/// result. The credential is passed into each call; implementations must not
/// retain it.
///
/// # Errors
///
/// - [`crate::Error::Transport`] when the API cannot be reached
/// - [`crate::Error::Provider`] when the API answers with a failure envelope
///   or a non-success status
///
/// Absence is not an error: lookups return `Ok(None)`.
///
/// # Retries
///
/// Implementations return failures as-is. The reconciler owns the retry
/// policy (the next polling tick).
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Resolve a registrable domain to its zone ID
    ///
    /// # Returns
    ///
    /// - `Ok(Some(zone_id))`: The zone exists and is visible to the token
    /// - `Ok(None)`: No such zone
    async fn resolve_zone(
        &self,
        registrable_domain: &str,
        token: &ApiToken,
    ) -> Result<Option<String>, crate::Error>;

    /// Find a record by exact name
    ///
    /// If the provider returns several records with that name, the first
    /// one in provider order is authoritative.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(record_id))`: The record exists
    /// - `Ok(None)`: No record with that name; a create is required
    async fn find_record(
        &self,
        zone_id: &str,
        fqdn: &str,
        token: &ApiToken,
    ) -> Result<Option<String>, crate::Error>;

    /// Create an A record with TTL 120
    ///
    /// # Returns
    ///
    /// The new record's ID
    async fn create_record(
        &self,
        zone_id: &str,
        fqdn: &str,
        ip: Ipv4Addr,
        proxied: bool,
        token: &ApiToken,
    ) -> Result<String, crate::Error>;

    /// Replace an existing record's content and proxied flag (TTL 120)
    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        fqdn: &str,
        ip: Ipv4Addr,
        proxied: bool,
        token: &ApiToken,
    ) -> Result<(), crate::Error>;

    /// Delete a record
    async fn delete_record(
        &self,
        zone_id: &str,
        record_id: &str,
        token: &ApiToken,
    ) -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
