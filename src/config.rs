/*!
 * Configuration types for bucketscan
 */

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, ScanError};

/// Placeholder substituted with the candidate bucket name in endpoint templates
pub const BUCKET_PLACEHOLDER: &str = "{bucket}";

/// Main configuration for a scan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Path to the SQLite ledger
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Process kind tag written to every run record
    #[serde(default = "default_process_kind")]
    pub process_kind: String,

    /// Show a spinner while scanning
    #[serde(default = "default_true")]
    pub show_progress: bool,

    /// Log level for diagnostic output
    #[serde(default)]
    pub log_level: LogLevel,

    /// Log file path (None = stderr)
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Enable verbose logging (shorthand for log_level = debug)
    #[serde(default)]
    pub verbose: bool,

    /// HTTP probe settings
    #[serde(default)]
    pub probe: ProbeConfig,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            process_kind: default_process_kind(),
            show_progress: true,
            log_level: LogLevel::Info,
            log_file: None,
            verbose: false,
            probe: ProbeConfig::default(),
        }
    }
}

impl ScanConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ScanError::Config(format!("Cannot read config {}: {}", path.display(), e))
        })?;
        let config: ScanConfig = toml::from_str(&contents)?;
        Ok(config)
    }
}

/// Settings for the HTTP bucket probe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// URL templates probed for every candidate, `{bucket}` is substituted
    #[serde(default = "default_endpoints")]
    pub endpoints: Vec<String>,

    /// Whole-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// TCP/TLS connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Retries per endpoint for transient failures
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Base delay between retries in milliseconds
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,

    /// Double the delay after each retry
    #[serde(default = "default_true")]
    pub exponential_backoff: bool,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Produce no outcomes for candidates that are not valid bucket names
    #[serde(default = "default_true")]
    pub skip_invalid_names: bool,

    /// Consecutive candidates with no completed attempt before the network
    /// is declared down (0 = never)
    #[serde(default = "default_unreachable_threshold")]
    pub unreachable_threshold: u32,

    /// Most bytes of a public listing kept as the raw response
    #[serde(default = "default_max_listing_bytes")]
    pub max_listing_bytes: usize,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            endpoints: default_endpoints(),
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            retry_attempts: default_retry_attempts(),
            retry_delay_ms: default_retry_delay(),
            exponential_backoff: true,
            user_agent: default_user_agent(),
            skip_invalid_names: true,
            unreachable_threshold: default_unreachable_threshold(),
            max_listing_bytes: default_max_listing_bytes(),
        }
    }
}

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Only errors
    Error,

    /// Warnings and errors
    Warn,

    /// Info, warnings, and errors
    #[default]
    Info,

    /// Debug and above
    Debug,

    /// All messages including traces
    Trace,
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

// Default value functions for serde
fn default_true() -> bool {
    true
}

fn default_database_path() -> PathBuf {
    PathBuf::from("bucketscan.db")
}

fn default_process_kind() -> String {
    "S3Crawler".to_string()
}

fn default_endpoints() -> Vec<String> {
    vec!["https://{bucket}.s3.amazonaws.com/".to_string()]
}

fn default_timeout() -> u64 {
    10
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_retry_attempts() -> u32 {
    2
}

fn default_retry_delay() -> u64 {
    500
}

fn default_unreachable_threshold() -> u32 {
    50
}

fn default_max_listing_bytes() -> usize {
    1024 * 1024
}

fn default_user_agent() -> String {
    format!("bucketscan/{}", env!("CARGO_PKG_VERSION"))
}
