//! One-shot record operations
//!
//! These are the add / update / delete actions a front-end offers next to
//! the DDNS loop. Each one resolves what it needs through a [`DnsProvider`]
//! and turns "absent" into [`Error::NotFound`], because unlike the
//! reconciler a one-shot update or delete has nothing sensible to fall back
//! to.
//!
//! Record names are normalized (trimmed, lowercased, root dot dropped)
//! before they reach the provider.

use crate::credential::ApiToken;
use crate::domain;
use crate::error::{Error, Result};
use crate::traits::DnsProvider;
use std::net::Ipv4Addr;
use tracing::{debug, info};

/// Resolve the zone ID that holds `fqdn`
///
/// Derives the registrable domain from `fqdn` and looks it up.
///
/// # Errors
///
/// - `Error::InvalidInput` if `fqdn` is not a usable domain name
/// - `Error::NotFound` if no zone matches
pub async fn resolve_zone_id(
    provider: &dyn DnsProvider,
    fqdn: &str,
    token: &ApiToken,
) -> Result<String> {
    let zone_name = domain::registrable_domain(fqdn)?;
    debug!("Resolving zone for {} (zone name: {})", fqdn, zone_name);

    provider
        .resolve_zone(&zone_name, token)
        .await?
        .ok_or_else(|| {
            Error::not_found(format!(
                "Zone {} not found. Check the domain and the API token permissions",
                zone_name
            ))
        })
}

/// Create an A record
///
/// # Returns
///
/// The new record's ID
pub async fn add_record(
    provider: &dyn DnsProvider,
    zone_id: &str,
    fqdn: &str,
    ip: Ipv4Addr,
    proxied: bool,
    token: &ApiToken,
) -> Result<String> {
    let fqdn = domain::record_name(fqdn)?;
    let record_id = provider
        .create_record(zone_id, &fqdn, ip, proxied, token)
        .await?;
    info!("Created record {} -> {} (id: {})", fqdn, ip, record_id);
    Ok(record_id)
}

/// Replace an existing A record's content and proxied flag
///
/// # Returns
///
/// The updated record's ID
pub async fn update_record(
    provider: &dyn DnsProvider,
    zone_id: &str,
    fqdn: &str,
    ip: Ipv4Addr,
    proxied: bool,
    token: &ApiToken,
) -> Result<String> {
    let fqdn = domain::record_name(fqdn)?;
    let record_id = require_record(provider, zone_id, &fqdn, token).await?;
    provider
        .update_record(zone_id, &record_id, &fqdn, ip, proxied, token)
        .await?;
    info!("Updated record {} -> {} (id: {})", fqdn, ip, record_id);
    Ok(record_id)
}

/// Delete a record by name
///
/// # Returns
///
/// The deleted record's ID
pub async fn delete_record(
    provider: &dyn DnsProvider,
    zone_id: &str,
    fqdn: &str,
    token: &ApiToken,
) -> Result<String> {
    let fqdn = domain::record_name(fqdn)?;
    let record_id = require_record(provider, zone_id, &fqdn, token).await?;
    provider.delete_record(zone_id, &record_id, token).await?;
    info!("Deleted record {} (id: {})", fqdn, record_id);
    Ok(record_id)
}

async fn require_record(
    provider: &dyn DnsProvider,
    zone_id: &str,
    fqdn: &str,
    token: &ApiToken,
) -> Result<String> {
    provider
        .find_record(zone_id, fqdn, token)
        .await?
        .ok_or_else(|| Error::not_found(format!("DNS record {} not found", fqdn)))
}
