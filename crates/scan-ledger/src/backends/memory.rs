//! In-memory backend
//!
//! Mirrors the SQLite backend's semantics (unique open-bucket names, newest-first
//! listings) without touching disk. Used by `--dry-run` and by tests.

use crate::{
    now_epoch, FailedProbeRecord, OpenBucketRecord, Position, ProgressStore, ResultStore,
    RunProgress, StoreError, StoreResult, Stored,
};
use async_trait::async_trait;
use std::collections::HashSet;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct Tables {
    runs: Vec<RunProgress>,
    open_buckets: Vec<Stored<OpenBucketRecord>>,
    open_names: HashSet<String>,
    failed_probes: Vec<Stored<FailedProbeRecord>>,
}

/// In-memory ledger
#[derive(Debug, Default)]
pub struct MemoryLedger {
    tables: Mutex<Tables>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of open-bucket rows
    pub async fn open_bucket_count(&self) -> usize {
        self.tables.lock().await.open_buckets.len()
    }

    /// Number of failed-probe rows
    pub async fn failed_probe_count(&self) -> usize {
        self.tables.lock().await.failed_probes.len()
    }
}

fn newest_first<T: Clone>(rows: &[T], limit: usize) -> Vec<T> {
    rows.iter().rev().take(limit).cloned().collect()
}

#[async_trait]
impl ResultStore for MemoryLedger {
    async fn insert_open_bucket(&self, record: &OpenBucketRecord) -> StoreResult<i64> {
        let mut tables = self.tables.lock().await;
        if !tables.open_names.insert(record.bucket_name.clone()) {
            return Err(StoreError::Conflict(format!(
                "open_buckets.bucket_name = {}",
                record.bucket_name
            )));
        }

        let id = tables.open_buckets.len() as i64 + 1;
        tables.open_buckets.push(Stored {
            id,
            created_at: now_epoch(),
            record: record.clone(),
        });
        Ok(id)
    }

    async fn insert_failed_probe(&self, record: &FailedProbeRecord) -> StoreResult<i64> {
        let mut tables = self.tables.lock().await;
        let id = tables.failed_probes.len() as i64 + 1;
        tables.failed_probes.push(Stored {
            id,
            created_at: now_epoch(),
            record: record.clone(),
        });
        Ok(id)
    }

    async fn list_open_buckets(&self, limit: usize) -> StoreResult<Vec<Stored<OpenBucketRecord>>> {
        Ok(newest_first(&self.tables.lock().await.open_buckets, limit))
    }

    async fn list_failed_probes(
        &self,
        limit: usize,
    ) -> StoreResult<Vec<Stored<FailedProbeRecord>>> {
        Ok(newest_first(&self.tables.lock().await.failed_probes, limit))
    }
}

#[async_trait]
impl ProgressStore for MemoryLedger {
    async fn create_run(&self, input_id: &str, process_kind: &str) -> StoreResult<RunProgress> {
        let mut tables = self.tables.lock().await;
        let now = now_epoch();
        let run = RunProgress {
            id: tables.runs.len() as i64 + 1,
            input_id: input_id.to_string(),
            process_kind: process_kind.to_string(),
            current_line: None,
            current_candidate: None,
            current_resource: None,
            failure: None,
            created_at: now,
            updated_at: now,
        };
        tables.runs.push(run.clone());
        Ok(run)
    }

    async fn update_position(&self, run_id: i64, position: &Position) -> StoreResult<()> {
        let mut tables = self.tables.lock().await;
        let run = tables
            .runs
            .iter_mut()
            .find(|r| r.id == run_id)
            .ok_or(StoreError::RunNotFound(run_id))?;

        run.current_line = Some(position.line_number);
        run.current_candidate = Some(position.candidate.clone());
        run.current_resource = position.resource_name.clone();
        run.updated_at = now_epoch();
        Ok(())
    }

    async fn record_failure(&self, run_id: i64, message: &str) -> StoreResult<()> {
        let mut tables = self.tables.lock().await;
        let run = tables
            .runs
            .iter_mut()
            .find(|r| r.id == run_id)
            .ok_or(StoreError::RunNotFound(run_id))?;

        run.failure = Some(message.to_string());
        run.updated_at = now_epoch();
        Ok(())
    }

    async fn get_run(&self, run_id: i64) -> StoreResult<Option<RunProgress>> {
        let tables = self.tables.lock().await;
        Ok(tables.runs.iter().find(|r| r.id == run_id).cloned())
    }

    async fn list_runs(&self, limit: usize) -> StoreResult<Vec<RunProgress>> {
        Ok(newest_first(&self.tables.lock().await.runs, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_duplicate_open_bucket_conflicts() {
        let ledger = MemoryLedger::new();
        let record = OpenBucketRecord::new("mybucket", "success", "fulfilled");

        assert_eq!(ledger.insert_open_bucket(&record).await.unwrap(), 1);
        let err = ledger.insert_open_bucket(&record).await.unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(ledger.open_bucket_count().await, 1);
    }

    #[tokio::test]
    async fn test_failed_probes_allow_duplicates() {
        let ledger = MemoryLedger::new();
        let record = FailedProbeRecord::new("broken", "other", "rejected");

        ledger.insert_failed_probe(&record).await.unwrap();
        ledger.insert_failed_probe(&record).await.unwrap();
        assert_eq!(ledger.failed_probe_count().await, 2);
    }

    #[tokio::test]
    async fn test_run_position_overwrites() {
        let ledger = MemoryLedger::new();
        let run = ledger.create_run("words.txt", "S3Crawler").await.unwrap();

        ledger
            .update_position(run.id, &Position::new(1, "alpha", Some("alpha".into())))
            .await
            .unwrap();
        ledger
            .update_position(run.id, &Position::new(5, "beta", None))
            .await
            .unwrap();

        let stored = ledger.get_run(run.id).await.unwrap().unwrap();
        assert_eq!(stored.current_line, Some(5));
        assert_eq!(stored.current_candidate.as_deref(), Some("beta"));
        assert_eq!(stored.current_resource, None);
        assert!(!stored.is_failed());
    }

    #[tokio::test]
    async fn test_unknown_run() {
        let ledger = MemoryLedger::new();
        let err = ledger.record_failure(99, "boom").await.unwrap_err();
        assert_eq!(err, StoreError::RunNotFound(99));
    }

    #[tokio::test]
    async fn test_listing_is_newest_first() {
        let ledger = MemoryLedger::new();
        for name in ["a1", "b2", "c3"] {
            ledger
                .insert_open_bucket(&OpenBucketRecord::new(name, "success", "fulfilled"))
                .await
                .unwrap();
        }

        let listed = ledger.list_open_buckets(2).await.unwrap();
        let names: Vec<_> = listed.iter().map(|s| s.record.bucket_name.as_str()).collect();
        assert_eq!(names, vec!["c3", "b2"]);
    }
}
