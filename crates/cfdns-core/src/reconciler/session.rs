// # DDNS Sessions
//
// Caller-facing surface for front-ends: start a background reconciliation
// loop for one record, read its state, stop it.
//
// A session is one spawned task running `Reconciler::run_until_cancelled`.
// Stopping cancels the token and waits for the task, so after `stop()`
// returns no further provider call is made. Dropping a handle without
// stopping detaches the loop; it then lives until the runtime shuts down.

use super::{Reconciler, ReconcilerEvent, ReconcilerState};
use crate::config::SessionConfig;
use crate::credential::ApiToken;
use crate::error::{Error, Result};
use crate::traits::{DnsProvider, IpSource};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Handle to a running DDNS session
#[derive(Debug)]
pub struct SessionHandle {
    record_name: String,
    cancel: CancellationToken,
    task: JoinHandle<()>,
    state_rx: watch::Receiver<ReconcilerState>,
}

impl SessionHandle {
    pub(super) fn new(
        record_name: String,
        cancel: CancellationToken,
        task: JoinHandle<()>,
        state_rx: watch::Receiver<ReconcilerState>,
    ) -> Self {
        Self {
            record_name,
            cancel,
            task,
            state_rx,
        }
    }

    /// Record managed by this session
    pub fn record_name(&self) -> &str {
        &self.record_name
    }

    /// Latest state snapshot
    pub fn state(&self) -> ReconcilerState {
        self.state_rx.borrow().clone()
    }

    /// A receiver that is notified on every state change
    pub fn watch_state(&self) -> watch::Receiver<ReconcilerState> {
        self.state_rx.clone()
    }

    /// Whether the background loop has exited
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancel the loop and wait for it to exit
    pub async fn stop(self) -> Result<()> {
        info!("Stopping DDNS session for {}", self.record_name);
        self.cancel.cancel();
        self.task
            .await
            .map_err(|e| Error::Other(format!("DDNS task for {} failed: {}", self.record_name, e)))
    }
}

/// Start a DDNS session for one record
///
/// Performs the initial convergence before returning, so a bad token, a
/// missing zone or an unreachable IP service is reported to the caller
/// instead of disappearing into a background task.
///
/// # Returns
///
/// The running session and its event stream
pub async fn start_ddns_session(
    provider: Arc<dyn DnsProvider>,
    ip_source: Arc<dyn IpSource>,
    config: SessionConfig,
    token: ApiToken,
) -> Result<(SessionHandle, mpsc::Receiver<ReconcilerEvent>)> {
    let (reconciler, events) = Reconciler::new(provider, ip_source, config, token)?;
    let handle = reconciler.start_session().await?;
    Ok((handle, events))
}

/// Stop a DDNS session
pub async fn stop_session(handle: SessionHandle) -> Result<()> {
    handle.stop().await
}
