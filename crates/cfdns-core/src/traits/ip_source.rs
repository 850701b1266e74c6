// # IP Source Trait
//
// Defines the interface for resolving the caller's current public IPv4
// address.
//
// ## Implementations
//
// - HTTP/JSON "what is my IP" service: `cfdns-ip-http` crate

use async_trait::async_trait;
use std::net::Ipv4Addr;

/// Trait for public IP source implementations
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Unavailability
///
/// Every failure (transport error, bad status, malformed body, non-IPv4
/// value) is reported as [`crate::Error::IpUnavailable`]. Callers treat it as
/// "skip this cycle", never as a fatal error, except at session start.
///
/// # Polling
///
/// A source answers one question per call. It does not spawn tasks or loop;
/// the reconciler decides when to ask.
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Get the current public IPv4 address
    ///
    /// # Returns
    ///
    /// - `Ok(Ipv4Addr)`: The current address
    /// - `Err(Error::IpUnavailable)`: The address could not be determined
    async fn current(&self) -> Result<Ipv4Addr, crate::Error>;

    /// Short name for logging
    fn source_name(&self) -> &'static str {
        "ip-source"
    }
}
