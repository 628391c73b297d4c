//! Probe outcome types

use scan_ledger::{Details, FailedProbeRecord, OpenBucketRecord};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether the probed resource is publicly accessible
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    /// Confirmed publicly accessible
    Success,
    /// Anything else (missing, private, undetermined)
    Other,
}

impl fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeStatus::Success => write!(f, "success"),
            ProbeStatus::Other => write!(f, "other"),
        }
    }
}

/// Whether the underlying network call completed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// A response was received
    Fulfilled,
    /// The call failed (connect error, reset, server-side failure)
    Rejected,
    /// The call did not finish in time
    TimedOut,
}

impl ConnectionState {
    pub fn is_fulfilled(&self) -> bool {
        matches!(self, ConnectionState::Fulfilled)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Fulfilled => write!(f, "fulfilled"),
            ConnectionState::Rejected => write!(f, "rejected"),
            ConnectionState::TimedOut => write!(f, "timed_out"),
        }
    }
}

/// Result of one probe attempt for one candidate
///
/// `raw_response` is transient: it is skipped by serde and dropped by both
/// record conversions, so it can never reach the ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProbeOutcome {
    /// Identifier probed (the candidate or a normalized variant)
    pub resource_name: String,
    pub status: ProbeStatus,
    pub connection_state: ConnectionState,
    /// Opaque response payload
    #[serde(skip)]
    pub raw_response: Option<String>,
    /// Engine-specific extras, persisted verbatim
    #[serde(default)]
    pub details: Details,
}

impl ProbeOutcome {
    pub fn new(resource_name: &str, status: ProbeStatus, connection_state: ConnectionState) -> Self {
        Self {
            resource_name: resource_name.to_string(),
            status,
            connection_state,
            raw_response: None,
            details: Details::new(),
        }
    }

    /// Publicly accessible resource
    pub fn open(resource_name: &str) -> Self {
        Self::new(resource_name, ProbeStatus::Success, ConnectionState::Fulfilled)
    }

    /// Probe completed, resource missing or private
    pub fn closed(resource_name: &str) -> Self {
        Self::new(resource_name, ProbeStatus::Other, ConnectionState::Fulfilled)
    }

    /// Probe call did not complete
    pub fn unreachable(resource_name: &str, connection_state: ConnectionState) -> Self {
        Self::new(resource_name, ProbeStatus::Other, connection_state)
    }

    pub fn with_detail(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }

    pub fn with_raw_response(mut self, raw: impl Into<String>) -> Self {
        self.raw_response = Some(raw.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == ProbeStatus::Success
    }

    /// Persistable open-bucket row; the raw response is discarded
    pub fn into_open_record(self) -> OpenBucketRecord {
        OpenBucketRecord::new(
            &self.resource_name,
            &self.status.to_string(),
            &self.connection_state.to_string(),
        )
        .with_details(self.details)
    }

    /// Persistable failed-probe row; the raw response is discarded
    pub fn into_failed_record(self) -> FailedProbeRecord {
        FailedProbeRecord::new(
            &self.resource_name,
            &self.status.to_string(),
            &self.connection_state.to_string(),
        )
        .with_details(self.details)
    }
}
