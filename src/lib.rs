/*!
 * bucketscan - resumable public bucket discovery
 *
 * Reads a sorted list of candidate bucket names and, one at a time:
 * - sanitizes and drops adjacent repeats
 * - probes each candidate anonymously over HTTP
 * - records open buckets and failed probes in a SQLite ledger
 * - keeps a crash-recoverable "last fully persisted line" per run
 *
 * Author: Shane Wall <shaneawall@gmail.com>
 */

pub mod cli_style;
pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod probe;
pub mod stats;

// Re-export commonly used types
pub use config::{LogLevel, ProbeConfig, ScanConfig};
pub use core::{CancelFlag, ScanPipeline, ScanSummary};
pub use error::{Result, ScanError};
pub use probe::{HttpProbe, Probe, ProbeError, ProbeOutcome, ScriptedProbe};
pub use stats::ScanStats;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(VERSION, env!("CARGO_PKG_VERSION"));
    }
}
