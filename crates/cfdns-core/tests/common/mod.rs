//! Test doubles and common utilities for reconciler contract tests
//!
//! This module provides minimal test doubles that record every call so the
//! tests can assert exactly which provider operations a scenario issued.

#![allow(dead_code)]

use cfdns_core::error::{Error, Result};
use cfdns_core::traits::{DnsProvider, IpSource};
use cfdns_core::{ApiToken, Reconciler, ReconcilerEvent, SessionConfig};
use std::collections::VecDeque;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

pub const ZONE_ID: &str = "zone-123";
pub const RECORD_NAME: &str = "sub.example.com";

/// Shorthand for an IPv4 literal
pub fn ip(s: &str) -> Ipv4Addr {
    s.parse().expect("valid IPv4 literal")
}

pub fn token() -> ApiToken {
    ApiToken::new("test-token").expect("non-empty token")
}

/// An IP source that replays a script of readings
///
/// `None` entries are unavailable readings. The last entry repeats forever
/// once the script runs out.
pub struct ScriptedIpSource {
    readings: Mutex<VecDeque<Option<Ipv4Addr>>>,
    call_count: AtomicUsize,
}

impl ScriptedIpSource {
    pub fn new(readings: Vec<Option<Ipv4Addr>>) -> Self {
        assert!(!readings.is_empty(), "script needs at least one reading");
        Self {
            readings: Mutex::new(readings.into()),
            call_count: AtomicUsize::new(0),
        }
    }

    /// Always returns the same address
    pub fn fixed(addr: Ipv4Addr) -> Self {
        Self::new(vec![Some(addr)])
    }

    /// Append readings to the end of the script
    pub fn push(&self, reading: Option<Ipv4Addr>) {
        self.readings.lock().unwrap().push_back(reading);
    }

    /// Get the number of times current() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpSource for ScriptedIpSource {
    async fn current(&self) -> Result<Ipv4Addr> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        let mut readings = self.readings.lock().unwrap();
        let reading = if readings.len() > 1 {
            readings.pop_front().flatten()
        } else {
            readings.front().copied().flatten()
        };
        reading.ok_or_else(|| Error::ip_unavailable("scripted outage"))
    }

    fn source_name(&self) -> &'static str {
        "scripted"
    }
}

/// A provider operation, as observed by the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
    ResolveZone {
        name: String,
    },
    FindRecord {
        zone_id: String,
        fqdn: String,
    },
    CreateRecord {
        zone_id: String,
        fqdn: String,
        ip: Ipv4Addr,
        proxied: bool,
    },
    UpdateRecord {
        zone_id: String,
        record_id: String,
        fqdn: String,
        ip: Ipv4Addr,
        proxied: bool,
    },
    DeleteRecord {
        zone_id: String,
        record_id: String,
    },
}

impl ProviderCall {
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            ProviderCall::CreateRecord { .. }
                | ProviderCall::UpdateRecord { .. }
                | ProviderCall::DeleteRecord { .. }
        )
    }
}

/// A mock DnsProvider holding at most one record
pub struct MockDnsProvider {
    /// ID of the existing record, if any
    record_id: Mutex<Option<String>>,
    /// Content of the existing record, if any
    content: Mutex<Option<Ipv4Addr>>,
    /// Every call in order
    calls: Mutex<Vec<ProviderCall>>,
    /// Number of upcoming writes that fail
    failing_writes: AtomicUsize,
    /// Counter for generated record IDs
    created: AtomicUsize,
}

impl MockDnsProvider {
    /// Provider with no record yet
    pub fn empty() -> Self {
        Self {
            record_id: Mutex::new(None),
            content: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
            failing_writes: AtomicUsize::new(0),
            created: AtomicUsize::new(0),
        }
    }

    /// Provider already holding a record with the given ID
    pub fn with_record(record_id: &str, content: Ipv4Addr) -> Self {
        let provider = Self::empty();
        *provider.record_id.lock().unwrap() = Some(record_id.to_string());
        *provider.content.lock().unwrap() = Some(content);
        provider
    }

    /// Make the next `n` create/update calls fail with a provider error
    pub fn fail_next_writes(&self, n: usize) {
        self.failing_writes.store(n, Ordering::SeqCst);
    }

    /// Remove the record out-of-band
    pub fn delete_out_of_band(&self) {
        *self.record_id.lock().unwrap() = None;
        *self.content.lock().unwrap() = None;
    }

    /// Current record content
    pub fn content(&self) -> Option<Ipv4Addr> {
        *self.content.lock().unwrap()
    }

    pub fn calls(&self) -> Vec<ProviderCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn writes(&self) -> Vec<ProviderCall> {
        self.calls().into_iter().filter(ProviderCall::is_write).collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn record(&self, call: ProviderCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn take_failure(&self) -> Result<()> {
        let failed = self
            .failing_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            Err(Error::provider(500, "Internal server error"))
        } else {
            Ok(())
        }
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn resolve_zone(&self, name: &str, _token: &ApiToken) -> Result<Option<String>> {
        self.record(ProviderCall::ResolveZone {
            name: name.to_string(),
        });
        Ok((name == "example.com").then(|| ZONE_ID.to_string()))
    }

    async fn find_record(
        &self,
        zone_id: &str,
        fqdn: &str,
        _token: &ApiToken,
    ) -> Result<Option<String>> {
        self.record(ProviderCall::FindRecord {
            zone_id: zone_id.to_string(),
            fqdn: fqdn.to_string(),
        });
        Ok(self.record_id.lock().unwrap().clone())
    }

    async fn create_record(
        &self,
        zone_id: &str,
        fqdn: &str,
        ip: Ipv4Addr,
        proxied: bool,
        _token: &ApiToken,
    ) -> Result<String> {
        self.record(ProviderCall::CreateRecord {
            zone_id: zone_id.to_string(),
            fqdn: fqdn.to_string(),
            ip,
            proxied,
        });
        self.take_failure()?;

        let id = format!("rec-new-{}", self.created.fetch_add(1, Ordering::SeqCst));
        *self.record_id.lock().unwrap() = Some(id.clone());
        *self.content.lock().unwrap() = Some(ip);
        Ok(id)
    }

    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        fqdn: &str,
        ip: Ipv4Addr,
        proxied: bool,
        _token: &ApiToken,
    ) -> Result<()> {
        self.record(ProviderCall::UpdateRecord {
            zone_id: zone_id.to_string(),
            record_id: record_id.to_string(),
            fqdn: fqdn.to_string(),
            ip,
            proxied,
        });
        self.take_failure()?;

        *self.content.lock().unwrap() = Some(ip);
        Ok(())
    }

    async fn delete_record(&self, zone_id: &str, record_id: &str, _token: &ApiToken) -> Result<()> {
        self.record(ProviderCall::DeleteRecord {
            zone_id: zone_id.to_string(),
            record_id: record_id.to_string(),
        });
        self.delete_out_of_band();
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Session configuration used by most tests
pub fn session_config(proxied: bool) -> SessionConfig {
    SessionConfig::new(ZONE_ID, RECORD_NAME).with_proxied(proxied)
}

/// Build a reconciler around shared doubles
pub fn reconciler(
    provider: &Arc<MockDnsProvider>,
    ip_source: &Arc<ScriptedIpSource>,
    config: SessionConfig,
) -> (Reconciler, mpsc::Receiver<ReconcilerEvent>) {
    Reconciler::new(provider.clone(), ip_source.clone(), config, token())
        .expect("reconciler construction succeeds")
}

/// Drain all events currently buffered
pub fn drain(rx: &mut mpsc::Receiver<ReconcilerEvent>) -> Vec<ReconcilerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
