//! Error types for cfdns
//!
//! This module defines all error types used throughout the workspace.
//!
//! Two of the variants are not failures in the usual sense:
//! [`Error::NotFound`] drives the create-vs-update branch, and
//! [`Error::IpUnavailable`] makes the reconciler skip a tick. Both are handled
//! locally by the reconciler and only surface to callers during session start.

use thiserror::Error;

/// Result type alias for cfdns operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for cfdns
#[derive(Error, Debug)]
pub enum Error {
    /// Network-level failure reaching an external API (DNS, connect, timeout)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Well-formed error response from the DNS provider
    #[error("Provider error (status {status}): {message}")]
    Provider {
        /// HTTP status code returned by the provider
        status: u16,
        /// Provider error details
        message: String,
    },

    /// Zone or record absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// Public IP could not be resolved
    #[error("Public IP unavailable: {0}")]
    IpUnavailable(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a provider error
    pub fn provider(status: u16, message: impl Into<String>) -> Self {
        Self::Provider {
            status,
            message: message.into(),
        }
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an "IP unavailable" error
    pub fn ip_unavailable(msg: impl Into<String>) -> Self {
        Self::IpUnavailable(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Whether this is the "absent" outcome rather than a failure
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Whether the failure is likely to clear up on its own
    ///
    /// Transport failures, rate limiting and provider 5xx responses are
    /// transient. Authentication and validation failures are not: retrying
    /// them every tick only repeats the same error.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Provider { status, .. } => *status == 429 || (500..=599).contains(status),
            _ => false,
        }
    }
}
