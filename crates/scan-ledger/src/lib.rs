//! Scan Ledger: durable results and run progress for bucket scans
//!
//! # Overview
//!
//! The ledger owns everything a scan writes to disk:
//!
//! - **Open buckets**: one row per bucket confirmed publicly accessible.
//!   Unique on bucket name; a second insert reports [`StoreError::Conflict`].
//! - **Failed probes**: one row per probe attempt whose network call did not
//!   complete. Append-only, no uniqueness.
//! - **Scan runs**: one mutable row per invocation holding the last fully
//!   persisted position and an optional failure message.
//!
//! Callers never check for existence before inserting; duplicate detection is
//! left to the backend.
//!
//! # Example
//!
//! ```no_run
//! use scan_ledger::{OpenBucketRecord, Position, ProgressStore, ResultStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), scan_ledger::StoreError> {
//!     let ledger = scan_ledger::SqliteLedger::open("scan.db").await?;
//!
//!     let run = ledger.create_run("words.txt", "S3Crawler").await?;
//!
//!     let record = OpenBucketRecord::new("mybucket", "success", "fulfilled");
//!     match ledger.insert_open_bucket(&record).await {
//!         Ok(_) => {}
//!         Err(e) if e.is_conflict() => {} // already recorded
//!         Err(e) => return Err(e),
//!     }
//!
//!     ledger
//!         .update_position(run.id, &Position::new(1, "mybucket", Some("mybucket".into())))
//!         .await?;
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod backends;
pub mod error;

pub use backends::memory::MemoryLedger;
#[cfg(feature = "sqlite")]
pub use backends::sqlite::SqliteLedger;
pub use error::{StoreError, StoreResult};

/// Free-form probe fields persisted verbatim as JSON
pub type Details = serde_json::Map<String, serde_json::Value>;

/// A bucket confirmed to be publicly accessible
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OpenBucketRecord {
    /// Bucket name as probed (unique within the table)
    pub bucket_name: String,
    /// Probe status tag (always "success" when written by the pipeline)
    pub status: String,
    /// Connection state tag reported by the probe
    pub connection_state: String,
    /// Engine-specific extras
    #[serde(default)]
    pub details: Details,
}

impl OpenBucketRecord {
    pub fn new(bucket_name: &str, status: &str, connection_state: &str) -> Self {
        Self {
            bucket_name: bucket_name.to_string(),
            status: status.to_string(),
            connection_state: connection_state.to_string(),
            details: Details::new(),
        }
    }

    pub fn with_details(mut self, details: Details) -> Self {
        self.details = details;
        self
    }
}

/// A probe attempt whose underlying network call did not complete
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FailedProbeRecord {
    pub bucket_name: String,
    pub status: String,
    pub connection_state: String,
    #[serde(default)]
    pub details: Details,
}

impl FailedProbeRecord {
    pub fn new(bucket_name: &str, status: &str, connection_state: &str) -> Self {
        Self {
            bucket_name: bucket_name.to_string(),
            status: status.to_string(),
            connection_state: connection_state.to_string(),
            details: Details::new(),
        }
    }

    pub fn with_details(mut self, details: Details) -> Self {
        self.details = details;
        self
    }
}

/// A persisted row together with its store-assigned id and creation time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Stored<T> {
    pub id: i64,
    /// Unix epoch seconds
    pub created_at: i64,
    pub record: T,
}

/// Last fully persisted position of a run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Position {
    /// 1-based line number in the input
    pub line_number: u64,
    /// Sanitized candidate at that line
    pub candidate: String,
    /// Last resource name evaluated for the candidate, if any outcome was produced
    pub resource_name: Option<String>,
}

impl Position {
    pub fn new(line_number: u64, candidate: &str, resource_name: Option<String>) -> Self {
        Self {
            line_number,
            candidate: candidate.to_string(),
            resource_name,
        }
    }
}

/// Progress record of a single scan invocation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunProgress {
    /// Run identifier
    pub id: i64,
    /// Input identifier (usually the input file name)
    pub input_id: String,
    /// Process kind tag
    pub process_kind: String,
    /// Last line whose outcomes were fully persisted
    pub current_line: Option<u64>,
    pub current_candidate: Option<String>,
    pub current_resource: Option<String>,
    /// Set once when the run terminates abnormally
    pub failure: Option<String>,
    /// Unix epoch seconds
    pub created_at: i64,
    /// Unix epoch seconds
    pub updated_at: i64,
}

impl RunProgress {
    /// Check if the run terminated abnormally
    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    /// Position snapshot, if the run advanced at least once
    pub fn position(&self) -> Option<Position> {
        let line_number = self.current_line?;
        Some(Position {
            line_number,
            candidate: self.current_candidate.clone().unwrap_or_default(),
            resource_name: self.current_resource.clone(),
        })
    }

    /// Line an operator should restart from after a failure
    ///
    /// The recorded line is fully persisted, so the next one is the first
    /// line that may be incomplete.
    pub fn resume_line(&self) -> u64 {
        self.current_line.map(|l| l + 1).unwrap_or(1)
    }
}

/// Durable tables for scan outcomes
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Append an open bucket
    ///
    /// Returns [`StoreError::Conflict`] when the bucket name is already present.
    async fn insert_open_bucket(&self, record: &OpenBucketRecord) -> StoreResult<i64>;

    /// Append a failed probe attempt
    async fn insert_failed_probe(&self, record: &FailedProbeRecord) -> StoreResult<i64>;

    /// Most recently discovered open buckets, newest first
    async fn list_open_buckets(&self, limit: usize) -> StoreResult<Vec<Stored<OpenBucketRecord>>>;

    /// Most recent failed probes, newest first
    async fn list_failed_probes(
        &self,
        limit: usize,
    ) -> StoreResult<Vec<Stored<FailedProbeRecord>>>;
}

/// One mutable progress row per scan invocation
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Create the record for a new run
    async fn create_run(&self, input_id: &str, process_kind: &str) -> StoreResult<RunProgress>;

    /// Overwrite the run's last known position
    async fn update_position(&self, run_id: i64, position: &Position) -> StoreResult<()>;

    /// Set the terminal failure message
    async fn record_failure(&self, run_id: i64, message: &str) -> StoreResult<()>;

    async fn get_run(&self, run_id: i64) -> StoreResult<Option<RunProgress>>;

    /// Most recent runs, newest first
    async fn list_runs(&self, limit: usize) -> StoreResult<Vec<RunProgress>>;
}

/// A backend providing both result tables and progress rows
pub trait Ledger: ResultStore + ProgressStore {}

impl<T: ResultStore + ProgressStore> Ledger for T {}

/// Open a SQLite ledger at the specified path
#[cfg(feature = "sqlite")]
pub async fn open(path: &str) -> StoreResult<Box<dyn Ledger>> {
    let ledger = SqliteLedger::open(path).await?;
    Ok(Box::new(ledger))
}

pub(crate) fn now_epoch() -> i64 {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(current_line: Option<u64>) -> RunProgress {
        RunProgress {
            id: 1,
            input_id: "words.txt".to_string(),
            process_kind: "S3Crawler".to_string(),
            current_line,
            current_candidate: current_line.map(|_| "mybucket".to_string()),
            current_resource: None,
            failure: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_resume_line() {
        assert_eq!(run(None).resume_line(), 1);
        assert_eq!(run(Some(41)).resume_line(), 42);
    }

    #[test]
    fn test_position_snapshot() {
        assert!(run(None).position().is_none());

        let pos = run(Some(7)).position().unwrap();
        assert_eq!(pos.line_number, 7);
        assert_eq!(pos.candidate, "mybucket");
        assert_eq!(pos.resource_name, None);
    }

    #[test]
    fn test_record_builders() {
        let mut details = Details::new();
        details.insert("http_status".to_string(), serde_json::json!(200));

        let record = OpenBucketRecord::new("mybucket", "success", "fulfilled")
            .with_details(details.clone());
        assert_eq!(record.bucket_name, "mybucket");
        assert_eq!(record.details, details);

        let failed = FailedProbeRecord::new("broken", "other", "rejected");
        assert!(failed.details.is_empty());
    }
}
