// # cfdns-core
//
// Core library for cfdns: Cloudflare DNS record management and dynamic DNS.
//
// ## Architecture Overview
//
// - **DnsProvider**: Trait for zone lookup and A-record create/update/delete
// - **IpSource**: Trait for resolving the current public IPv4 address
// - **Reconciler**: The DDNS loop that keeps one record on the public IP
// - **SessionHandle**: Background reconciler task with explicit cancellation
// - **records**: One-shot add / update / delete operations for front-ends
//
// ## Design Principles
//
// 1. **Explicit credentials**: The API token is passed into every provider call
// 2. **Implementations at the edges**: HTTP clients live in their own crates
// 3. **Eventual convergence**: Failed writes are retried on the next tick
// 4. **Deterministic shutdown**: Sessions stop on a cancellation token

pub mod config;
pub mod credential;
pub mod domain;
pub mod error;
pub mod reconciler;
pub mod records;
pub mod traits;

// Re-export core types for convenience
pub use config::{IpSourceConfig, ProviderConfig, SessionConfig, WriteFailurePolicy};
pub use credential::ApiToken;
pub use error::{Error, Result};
pub use reconciler::{
    Reconciler, ReconcilerEvent, ReconcilerState, SessionHandle, TickOutcome, WriteAction,
    start_ddns_session, stop_session,
};
pub use traits::{DnsProvider, IpSource, RecordDesired};
