// # Domain Names
//
// Validation of fully-qualified record names and derivation of the
// registrable domain (the zone name) from them.
//
// The derivation is a heuristic, not a public suffix list lookup: it keeps
// the last two labels, or three when the name ends in a two-letter country
// code preceded by a common second-level label ("example.co.uk",
// "example.com.cn"). Zones under other multi-label suffixes need an explicit
// zone ID.

use crate::{Error, Result};

/// Second-level labels commonly registered under country-code TLDs
const SECOND_LEVEL_LABELS: &[&str] = &["co", "com", "net", "org", "gov", "edu", "ac"];

/// Normalize a record name: trim, drop a trailing root dot, lowercase
pub fn normalize(fqdn: &str) -> String {
    fqdn.trim().trim_end_matches('.').to_ascii_lowercase()
}

/// Normalize and validate a record name entered by a user
///
/// Every front-end path goes through here, so "Sub.Example.COM." and
/// "sub.example.com" address the same record.
///
/// # Errors
///
/// `Error::InvalidInput` if the normalized name is not a valid domain name
pub fn record_name(fqdn: &str) -> Result<String> {
    let name = normalize(fqdn);
    validate_domain_name(&name)?;
    Ok(name)
}

/// Validate that a string is a valid domain name
///
/// This implements basic DNS domain name validation per RFC 1035.
/// It's not comprehensive but catches common errors.
pub fn validate_domain_name(domain: &str) -> Result<()> {
    if domain.is_empty() {
        return Err(Error::invalid_input("Domain name cannot be empty"));
    }

    // Total length limit (RFC 1035: 253 chars max)
    if domain.len() > 253 {
        return Err(Error::invalid_input(format!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        )));
    }

    for label in domain.split('.') {
        if label.is_empty() {
            return Err(Error::invalid_input(format!(
                "Domain name has empty label: '{}'",
                domain
            )));
        }

        if label.len() > 63 {
            return Err(Error::invalid_input(format!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            )));
        }

        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(Error::invalid_input(format!(
                "Domain label contains invalid characters. Label: '{}'. \
                Valid: alphanumeric and hyphen only.",
                label
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(Error::invalid_input(format!(
                "Domain label cannot start or end with hyphen. Label: '{}'",
                label
            )));
        }
    }

    Ok(())
}

/// Derive the registrable domain (eTLD+1) from a fully-qualified name
///
/// # Examples
///
/// ```rust
/// use cfdns_core::domain::registrable_domain;
///
/// assert_eq!(registrable_domain("sub.example.com").unwrap(), "example.com");
/// assert_eq!(registrable_domain("a.b.example.co.uk").unwrap(), "example.co.uk");
/// ```
pub fn registrable_domain(fqdn: &str) -> Result<String> {
    let name = record_name(fqdn)?;

    let labels: Vec<&str> = name.split('.').collect();
    if labels.len() < 2 {
        return Err(Error::invalid_input(format!(
            "Domain name needs at least two labels: '{}'",
            name
        )));
    }

    let n = labels.len();
    let tld = labels[n - 1];
    let second = labels[n - 2];
    let keep = if tld.len() == 2 && SECOND_LEVEL_LABELS.contains(&second) {
        3
    } else {
        2
    };

    if n < keep {
        return Err(Error::invalid_input(format!(
            "'{}' is a public suffix, not a registrable domain",
            name
        )));
    }

    Ok(labels[n - keep..].join("."))
}
