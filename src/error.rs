/*!
 * Error types for bucketscan
 */

use std::fmt;
use std::io;
use std::path::PathBuf;

use scan_ledger::StoreError;

use crate::probe::ProbeError;

pub type Result<T> = std::result::Result<T, ScanError>;

/// Exit code constants for structured process exit
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_PARTIAL: i32 = 1;
pub const EXIT_FATAL: i32 = 2;
pub const EXIT_INTERRUPTED: i32 = 130;

#[derive(Debug)]
pub enum ScanError {
    /// Input file missing or not a regular file
    InputNotFound(PathBuf),

    /// I/O error (reading input, writing logs)
    Io(io::Error),

    /// Configuration error
    Config(String),

    /// Unrecoverable probe failure (misconfiguration, client setup)
    Probe(ProbeError),

    /// Ledger failure other than an absorbed uniqueness conflict
    Store(StoreError),

    /// Operator requested a stop between candidates
    Interrupted,

    /// Generic error with message
    Other(String),
}

impl ScanError {
    /// Get the process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            ScanError::InputNotFound(_) | ScanError::Config(_) | ScanError::Probe(_) => EXIT_FATAL,
            ScanError::Store(_) => EXIT_FATAL,
            ScanError::Interrupted => EXIT_INTERRUPTED,
            ScanError::Io(_) | ScanError::Other(_) => EXIT_PARTIAL,
        }
    }

    /// Check if the error was raised before any run record could exist
    ///
    /// These are reported to the operator without touching the ledger.
    pub fn is_input_error(&self) -> bool {
        matches!(self, ScanError::InputNotFound(_) | ScanError::Config(_))
    }

    /// Get error category for logging
    pub fn category(&self) -> ErrorCategory {
        match self {
            ScanError::InputNotFound(_) => ErrorCategory::Validation,
            ScanError::Io(_) => ErrorCategory::IoError,
            ScanError::Config(_) => ErrorCategory::Configuration,
            ScanError::Probe(_) => ErrorCategory::Network,
            ScanError::Store(_) => ErrorCategory::Storage,
            ScanError::Interrupted => ErrorCategory::Cancelled,
            ScanError::Other(_) => ErrorCategory::Unknown,
        }
    }
}

/// Error category for classification and reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Input validation errors
    Validation,
    /// I/O operation errors
    IoError,
    /// Configuration errors
    Configuration,
    /// Network/probe errors
    Network,
    /// Ledger errors
    Storage,
    /// Operator cancellation
    Cancelled,
    /// Uncategorized errors
    Unknown,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Validation => write!(f, "validation"),
            ErrorCategory::IoError => write!(f, "io"),
            ErrorCategory::Configuration => write!(f, "configuration"),
            ErrorCategory::Network => write!(f, "network"),
            ErrorCategory::Storage => write!(f, "storage"),
            ErrorCategory::Cancelled => write!(f, "cancelled"),
            ErrorCategory::Unknown => write!(f, "unknown"),
        }
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::InputNotFound(path) => {
                write!(f, "Input file not found: {}", path.display())
            }
            ScanError::Io(err) => write!(f, "I/O error: {}", err),
            ScanError::Config(msg) => write!(f, "Configuration error: {}", msg),
            ScanError::Probe(err) => write!(f, "Probe error: {}", err),
            ScanError::Store(err) => write!(f, "Ledger error: {}", err),
            ScanError::Interrupted => write!(f, "Scan interrupted by operator"),
            ScanError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ScanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScanError::Io(err) => Some(err),
            ScanError::Probe(err) => Some(err),
            ScanError::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for ScanError {
    fn from(err: io::Error) -> Self {
        ScanError::Io(err)
    }
}

impl From<ProbeError> for ScanError {
    fn from(err: ProbeError) -> Self {
        ScanError::Probe(err)
    }
}

impl From<StoreError> for ScanError {
    fn from(err: StoreError) -> Self {
        ScanError::Store(err)
    }
}

impl From<toml::de::Error> for ScanError {
    fn from(err: toml::de::Error) -> Self {
        ScanError::Config(format!("TOML parse error: {}", err))
    }
}
