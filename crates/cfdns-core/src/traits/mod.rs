//! Core traits for cfdns
//!
//! This module defines the abstract interfaces the reconciler and the
//! front-ends are written against.
//!
//! - [`DnsProvider`]: Zone and A-record operations against a provider API
//! - [`IpSource`]: Resolve the current public IPv4 address

pub mod dns_provider;
pub mod ip_source;

pub use dns_provider::{DnsProvider, RecordDesired, RecordType};
pub use ip_source::IpSource;
