//! DDNS reconciler
//!
//! The Reconciler keeps one A record pointed at the current public IP:
//! - Resolving the public IP via IpSource
//! - Comparing it to the last IP it successfully wrote
//! - Creating or updating the record via DnsProvider when they differ
//! - Re-checking on a fixed interval until cancelled
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  IpSource   │─── current() ───────┐
//! └─────────────┘                     │
//!                                     ▼
//!                            ┌──────────────┐
//!                            │  Reconciler  │  (owns ReconcilerState)
//!                            └──────────────┘
//!                                     │
//!                     ┌───────────────┼───────────────┐
//!                     │               │               │
//!                     ▼               ▼               ▼
//!             ┌─────────────┐ ┌──────────────┐ ┌─────────────┐
//!             │ DnsProvider │ │ watch<State> │ │   Events    │
//!             │ find/write  │ │  (snapshot)  │ │  (notify)   │
//!             └─────────────┘ └──────────────┘ └─────────────┘
//! ```
//!
//! ## Tick Flow
//!
//! 1. Resolve the public IP; if unavailable, skip the tick
//! 2. If it equals the last applied IP, do nothing
//! 3. Otherwise look the record up: update it if found, create it if not
//! 4. On success, record the new IP as applied
//! 5. On failure, keep the old IP so the next tick retries the same change
//!
//! Ticks take `&mut self`, so one reconciler never has two reconciliations
//! in flight for its record.

mod session;

pub use session::{SessionHandle, start_ddns_session, stop_session};

use crate::config::{SessionConfig, WriteFailurePolicy};
use crate::credential::ApiToken;
use crate::domain;
use crate::error::Result;
use crate::traits::{DnsProvider, IpSource};
use chrono::{DateTime, Utc};
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Capacity of the event channel returned by [`Reconciler::new`]
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// How a record was brought in line with the public IP
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteAction {
    /// No record existed; one was created
    Created {
        /// ID of the new record
        record_id: String,
    },
    /// An existing record was replaced
    Updated {
        /// ID of the replaced record
        record_id: String,
    },
}

impl WriteAction {
    /// ID of the record that was written
    pub fn record_id(&self) -> &str {
        match self {
            WriteAction::Created { record_id } | WriteAction::Updated { record_id } => record_id,
        }
    }
}

/// State owned by a reconciler for the lifetime of its session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerState {
    /// Zone holding the record
    pub zone_id: String,
    /// Fully-qualified record name
    pub record_name: String,
    /// Proxied flag written with every update
    pub proxied: bool,
    /// Content the record is believed to hold
    ///
    /// Only ever set by a successful write, except under
    /// [`WriteFailurePolicy::Advance`], where a failed write's target is
    /// adopted as well.
    pub last_applied_ip: Option<Ipv4Addr>,
    /// When `last_applied_ip` last changed
    pub last_applied_at: Option<DateTime<Utc>>,
}

/// Result of a single polling tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Public IP unavailable; nothing was done
    Skipped,
    /// Public IP matches the last applied IP; nothing was written
    Unchanged(Ipv4Addr),
    /// The record now holds `current`
    Converged {
        previous: Option<Ipv4Addr>,
        current: Ipv4Addr,
        action: WriteAction,
    },
    /// The write for `target` failed
    Failed { target: Ipv4Addr, error: String },
}

/// Events emitted by the Reconciler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcilerEvent {
    /// Initial convergence succeeded
    Started {
        record_name: String,
        ip: Ipv4Addr,
        action: WriteAction,
    },

    /// Public IP unavailable this tick
    TickSkipped { record_name: String, reason: String },

    /// Public IP differs from the last applied IP
    IpChangeDetected {
        record_name: String,
        previous_ip: Option<Ipv4Addr>,
        new_ip: Ipv4Addr,
    },

    /// Record written with the new IP
    UpdateSucceeded {
        record_name: String,
        previous_ip: Option<Ipv4Addr>,
        new_ip: Ipv4Addr,
        action: WriteAction,
    },

    /// Record write failed; retried on the next tick
    UpdateFailed {
        record_name: String,
        target_ip: Ipv4Addr,
        error: String,
    },

    /// Loop stopped
    Stopped { record_name: String, reason: String },
}

/// DDNS reconciler for a single record
///
/// ## Lifecycle
///
/// 1. Create with [`Reconciler::new()`]
/// 2. Converge once with [`Reconciler::start()`]
/// 3. Poll with [`Reconciler::run_until_cancelled()`], or do both in a
///    background task with [`Reconciler::start_session()`]
pub struct Reconciler {
    /// DNS provider used for lookups and writes
    provider: Arc<dyn DnsProvider>,

    /// Public IP source
    ip_source: Arc<dyn IpSource>,

    /// Credential passed into every provider call
    token: ApiToken,

    /// Session state
    state: ReconcilerState,

    /// Delay between ticks
    poll_interval: Duration,

    /// What to do with `last_applied_ip` when a write fails
    on_write_failure: WriteFailurePolicy,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<ReconcilerEvent>,

    /// State snapshots for the session handle
    state_tx: watch::Sender<ReconcilerState>,
}

impl Reconciler {
    /// Create a new reconciler
    ///
    /// # Parameters
    ///
    /// - `provider`: DNS provider implementation
    /// - `ip_source`: Public IP source implementation
    /// - `config`: Session configuration
    /// - `token`: API credential for every provider call
    ///
    /// # Returns
    ///
    /// A tuple of (reconciler, event_receiver). Dropping the receiver is fine;
    /// events are then discarded.
    pub fn new(
        provider: Arc<dyn DnsProvider>,
        ip_source: Arc<dyn IpSource>,
        config: SessionConfig,
        token: ApiToken,
    ) -> Result<(Self, mpsc::Receiver<ReconcilerEvent>)> {
        config.validate()?;

        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let poll_interval = config.poll_interval();
        let state = ReconcilerState {
            record_name: domain::record_name(&config.record_name)?,
            zone_id: config.zone_id,
            proxied: config.proxied,
            last_applied_ip: None,
            last_applied_at: None,
        };
        let (state_tx, _) = watch::channel(state.clone());

        let reconciler = Self {
            provider,
            ip_source,
            token,
            state,
            poll_interval,
            on_write_failure: config.on_write_failure,
            event_tx,
            state_tx,
        };

        Ok((reconciler, event_rx))
    }

    /// Override the poll interval with sub-second precision
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Current session state
    pub fn state(&self) -> &ReconcilerState {
        &self.state
    }

    /// Subscribe to state snapshots
    pub fn subscribe(&self) -> watch::Receiver<ReconcilerState> {
        self.state_tx.subscribe()
    }

    /// Configured delay between ticks
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Initial convergence
    ///
    /// Resolves the public IP and creates or updates the record. Unlike a
    /// tick, every failure here is returned: there is no anchor IP to fall
    /// back on.
    ///
    /// # Returns
    ///
    /// - `Ok(Ipv4Addr)`: The IP now held by the record
    /// - `Err(Error::IpUnavailable)`: The public IP could not be resolved
    /// - `Err(Error::Transport | Error::Provider)`: The write failed
    pub async fn start(&mut self) -> Result<Ipv4Addr> {
        let ip = self.ip_source.current().await.inspect_err(|e| {
            error!(
                "Cannot start DDNS for {}: {}",
                self.state.record_name, e
            );
        })?;
        info!(
            "Initial public IP for {} from {}: {}",
            self.state.record_name,
            self.ip_source.source_name(),
            ip
        );

        let action = self.converge(ip).await.inspect_err(|e| {
            error!(
                "Initial convergence failed for {}: {}",
                self.state.record_name, e
            );
        })?;

        self.adopt(ip);
        self.emit_event(ReconcilerEvent::Started {
            record_name: self.state.record_name.clone(),
            ip,
            action,
        });

        Ok(ip)
    }

    /// Run one polling tick
    ///
    /// Never fails: an unavailable IP skips the tick, and a failed write is
    /// logged and left for the next tick to retry.
    pub async fn tick(&mut self) -> TickOutcome {
        let record_name = self.state.record_name.clone();

        let ip = match self.ip_source.current().await {
            Ok(ip) => ip,
            Err(e) => {
                warn!("Skipping check for {}: {}", record_name, e);
                self.emit_event(ReconcilerEvent::TickSkipped {
                    record_name,
                    reason: e.to_string(),
                });
                return TickOutcome::Skipped;
            }
        };

        let previous = self.state.last_applied_ip;
        if previous == Some(ip) {
            debug!("Public IP for {} unchanged ({})", record_name, ip);
            return TickOutcome::Unchanged(ip);
        }

        info!(
            "Public IP changed for {}: {} -> {}",
            record_name,
            previous.map(|p| p.to_string()).unwrap_or_else(|| "None".to_string()),
            ip
        );
        self.emit_event(ReconcilerEvent::IpChangeDetected {
            record_name: record_name.clone(),
            previous_ip: previous,
            new_ip: ip,
        });

        match self.converge(ip).await {
            Ok(action) => {
                self.adopt(ip);
                self.emit_event(ReconcilerEvent::UpdateSucceeded {
                    record_name,
                    previous_ip: previous,
                    new_ip: ip,
                    action: action.clone(),
                });
                TickOutcome::Converged {
                    previous,
                    current: ip,
                    action,
                }
            }
            Err(e) => {
                if e.is_transient() {
                    warn!("Failed to update {} to {}: {}", record_name, ip, e);
                } else {
                    // Retrying will most likely fail the same way
                    error!(
                        "Failed to update {} to {} via {}: {}",
                        record_name,
                        ip,
                        self.provider.provider_name(),
                        e
                    );
                }
                if self.on_write_failure == WriteFailurePolicy::Advance {
                    self.adopt(ip);
                }
                self.emit_event(ReconcilerEvent::UpdateFailed {
                    record_name,
                    target_ip: ip,
                    error: e.to_string(),
                });
                TickOutcome::Failed {
                    target: ip,
                    error: e.to_string(),
                }
            }
        }
    }

    /// Tick every poll interval until `cancel` fires
    ///
    /// Cancellation is observed at the sleep boundary; a tick already in
    /// progress runs to completion first.
    pub async fn run_until_cancelled(&mut self, cancel: CancellationToken) {
        info!(
            "Watching {} every {:?} (ip source: {}, provider: {})",
            self.state.record_name,
            self.poll_interval,
            self.ip_source.source_name(),
            self.provider.provider_name()
        );

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
            self.tick().await;
        }

        info!("DDNS loop for {} stopped", self.state.record_name);
        self.emit_event(ReconcilerEvent::Stopped {
            record_name: self.state.record_name.clone(),
            reason: "Cancelled".to_string(),
        });
    }

    /// Converge, then keep polling in a background task
    ///
    /// # Returns
    ///
    /// - `Ok(SessionHandle)`: Initial convergence succeeded; the loop runs
    /// - `Err(Error)`: Initial convergence failed; no task was spawned
    pub async fn start_session(mut self) -> Result<SessionHandle> {
        self.start().await?;

        let cancel = CancellationToken::new();
        let state_rx = self.subscribe();
        let record_name = self.state.record_name.clone();

        let loop_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            self.run_until_cancelled(loop_cancel).await;
        });

        Ok(SessionHandle::new(record_name, cancel, task, state_rx))
    }

    /// Make the record hold `ip`: update it if found, create it otherwise
    async fn converge(&self, ip: Ipv4Addr) -> Result<WriteAction> {
        let zone_id = &self.state.zone_id;
        let name = &self.state.record_name;
        let proxied = self.state.proxied;

        match self.provider.find_record(zone_id, name, &self.token).await? {
            Some(record_id) => {
                debug!("Found record {} (id: {}), updating", name, record_id);
                self.provider
                    .update_record(zone_id, &record_id, name, ip, proxied, &self.token)
                    .await?;
                info!("Updated {} -> {}", name, ip);
                Ok(WriteAction::Updated { record_id })
            }
            None => {
                debug!("No record named {}, creating", name);
                let record_id = self
                    .provider
                    .create_record(zone_id, name, ip, proxied, &self.token)
                    .await?;
                info!("Created {} -> {} (id: {})", name, ip, record_id);
                Ok(WriteAction::Created { record_id })
            }
        }
    }

    /// Take `ip` as the record's content and publish the new state
    fn adopt(&mut self, ip: Ipv4Addr) {
        self.state.last_applied_ip = Some(ip);
        self.state.last_applied_at = Some(Utc::now());
        self.publish_state();
    }

    fn publish_state(&self) {
        self.state_tx.send_replace(self.state.clone());
    }

    /// Emit a reconciler event
    fn emit_event(&self, event: ReconcilerEvent) {
        if let Err(mpsc::error::TrySendError::Full(_)) = self.event_tx.try_send(event) {
            // Prevents unbounded memory growth when nobody drains the channel
            warn!("Event channel full, dropping event");
        }
    }
}
