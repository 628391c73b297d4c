//! Probe engine abstraction
//!
//! A [`Probe`] turns one sanitized candidate into zero or more
//! [`ProbeOutcome`]s, one per network attempt. Negative answers and failed
//! connections are outcomes, not errors; [`ProbeError`] is reserved for
//! conditions that make every further probe pointless (bad configuration,
//! an HTTP client that cannot be built).

use async_trait::async_trait;
use thiserror::Error;

pub mod http;
pub mod outcome;
pub mod scripted;

pub use http::{is_valid_bucket_name, HttpProbe};
pub use outcome::{ConnectionState, ProbeOutcome, ProbeStatus};
pub use scripted::ScriptedProbe;

/// Result type alias for probe operations
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Unrecoverable probe failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProbeError {
    /// Invalid configuration
    #[error("Invalid probe configuration: {0}")]
    InvalidConfig(String),

    /// HTTP client could not be constructed or used
    #[error("HTTP client error: {0}")]
    Client(String),

    /// Systemic failure reported by the engine (credentials, network down)
    #[error("Probe engine failure: {0}")]
    Engine(String),
}

/// Probes a candidate against the remote storage service
#[async_trait]
pub trait Probe: Send + Sync {
    /// Probe a single sanitized candidate
    ///
    /// Returns one outcome per attempt. An empty vector means no attempt
    /// was made.
    async fn probe(&self, candidate: &str) -> ProbeResult<Vec<ProbeOutcome>>;
}
