//! Error taxonomy for the client.
//!
//! Callers always receive a typed error distinguishing validation, transient,
//! permanent, and signing failures so they can decide whether to retry, abort,
//! or alert. A cache miss is never an error; it is handled internally.

use std::time::Duration;

use thiserror::Error;

pub use crate::validate::ValidationError;

/// Classification used by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Worth retrying with backoff (timeouts, 5xx, rate limits).
    Transient,
    /// Retrying cannot help (other 4xx, malformed responses, unknown).
    Permanent,
}

/// Failure raised by a [`MarketGateway`](crate::gateway::MarketGateway) call.
#[derive(Error, Debug, Clone)]
pub enum GatewayError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("rate limited by venue (429)")]
    RateLimited { retry_after: Option<Duration> },

    #[error("venue returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("malformed venue response: {0}")]
    Malformed(String),
}

impl GatewayError {
    /// Classify the failure for the retry policy.
    ///
    /// Anything not recognizably transient is treated as permanent so a
    /// misbehaving upstream can never make the client spin indefinitely.
    pub fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::Timeout(_) | GatewayError::Connection(_) => ErrorKind::Transient,
            GatewayError::RateLimited { .. } => ErrorKind::Transient,
            GatewayError::Status { status, .. } if (500..=599).contains(status) => {
                ErrorKind::Transient
            }
            GatewayError::Status { .. } | GatewayError::Malformed(_) => ErrorKind::Permanent,
        }
    }

    /// Backoff hint surfaced by the venue, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            GatewayError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

/// Failure raised by a [`ChainSigner`](crate::gateway::ChainSigner).
///
/// Signing and key errors are never transient; the retry policy is not
/// involved on this path.
#[derive(Error, Debug, Clone)]
pub enum SignerError {
    #[error("invalid private key: {0}")]
    InvalidKey(String),

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("allowance call failed: {0}")]
    Allowance(String),

    #[error("http transport init failed: {0}")]
    Transport(String),
}

/// Failure raised by a [`Journal`](crate::gateway::Journal).
#[derive(Error, Debug, Clone)]
#[error("journal error: {0}")]
pub struct JournalError(pub String);

/// Top-level error surfaced by [`TradingClient`](crate::client::TradingClient).
#[derive(Error, Debug)]
pub enum ClientError {
    /// Bad input; surfaced immediately with every violated rule, never retried.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A transient gateway failure that survived the whole retry budget.
    #[error("gateway call failed after {attempts} attempts over {elapsed:?}: {source}")]
    Network {
        attempts: u32,
        elapsed: Duration,
        source: GatewayError,
    },

    /// Permanent venue failure, surfaced unmodified without retries.
    #[error(transparent)]
    Venue(GatewayError),

    /// Signer or key failure; fatal for the operation, not the process.
    #[error(transparent)]
    Signing(#[from] SignerError),

    /// The caller cancelled before the operation completed.
    #[error("operation cancelled")]
    Cancelled,

    /// Simulation required a price and none was cached.
    #[error("no price data available for token {0}")]
    NoPriceData(String),

    #[error(transparent)]
    Journal(#[from] JournalError),
}
