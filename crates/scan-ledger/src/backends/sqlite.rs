//! SQLite backend implementation
//!
//! Provides persistent storage using SQLite with WAL mode. The schema lives in
//! `migrations/` and is applied on open. The unique index on
//! `open_buckets.bucket_name` is surfaced as [`StoreError::Conflict`].

use crate::{
    now_epoch, Details, FailedProbeRecord, OpenBucketRecord, Position, ProgressStore,
    ResultStore, RunProgress, StoreError, StoreResult, Stored,
};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{migrate::MigrateDatabase, Row};
use std::str::FromStr;

/// SQLite-backed ledger
#[derive(Debug, Clone)]
pub struct SqliteLedger {
    pool: SqlitePool,
}

impl SqliteLedger {
    /// Open or create a SQLite database at the specified path
    ///
    /// Automatically runs migrations to set up the schema.
    pub async fn open(path: &str) -> StoreResult<Self> {
        let db_url = if path.starts_with("sqlite://") {
            path.to_string()
        } else {
            format!("sqlite://{}", path)
        };

        if !sqlx::Sqlite::database_exists(&db_url).await.unwrap_or(false) {
            sqlx::Sqlite::create_database(&db_url).await?;
        }

        let options = SqliteConnectOptions::from_str(&db_url)?
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        tracing::debug!(path = %db_url, "Scan ledger opened");
        Ok(Self { pool })
    }

    /// Get the underlying pool (for advanced usage)
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn require_updated(run_id: i64, rows_affected: u64) -> StoreResult<()> {
    if rows_affected == 0 {
        return Err(StoreError::RunNotFound(run_id));
    }
    Ok(())
}

fn encode_details(details: &Details) -> StoreResult<String> {
    Ok(serde_json::to_string(details)?)
}

fn decode_details(row: &SqliteRow) -> StoreResult<Details> {
    let raw: String = row.try_get("details")?;
    Ok(serde_json::from_str(&raw)?)
}

fn row_to_run(row: &SqliteRow) -> StoreResult<RunProgress> {
    let current_line: Option<i64> = row.try_get("current_line")?;

    Ok(RunProgress {
        id: row.try_get("id")?,
        input_id: row.try_get("input_id")?,
        process_kind: row.try_get("process_kind")?,
        current_line: current_line.map(|l| l as u64),
        current_candidate: row.try_get("current_candidate")?,
        current_resource: row.try_get("current_resource")?,
        failure: row.try_get("failure")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_open_bucket(row: &SqliteRow) -> StoreResult<Stored<OpenBucketRecord>> {
    Ok(Stored {
        id: row.try_get("id")?,
        created_at: row.try_get("created_at")?,
        record: OpenBucketRecord {
            bucket_name: row.try_get("bucket_name")?,
            status: row.try_get("status")?,
            connection_state: row.try_get("connection_state")?,
            details: decode_details(row)?,
        },
    })
}

fn row_to_failed_probe(row: &SqliteRow) -> StoreResult<Stored<FailedProbeRecord>> {
    Ok(Stored {
        id: row.try_get("id")?,
        created_at: row.try_get("created_at")?,
        record: FailedProbeRecord {
            bucket_name: row.try_get("bucket_name")?,
            status: row.try_get("status")?,
            connection_state: row.try_get("connection_state")?,
            details: decode_details(row)?,
        },
    })
}

#[async_trait]
impl ResultStore for SqliteLedger {
    async fn insert_open_bucket(&self, record: &OpenBucketRecord) -> StoreResult<i64> {
        // No existence check: the unique index rejects duplicates.
        let result = sqlx::query(
            "INSERT INTO open_buckets (bucket_name, status, connection_state, details, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&record.bucket_name)
        .bind(&record.status)
        .bind(&record.connection_state)
        .bind(encode_details(&record.details)?)
        .bind(now_epoch())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn insert_failed_probe(&self, record: &FailedProbeRecord) -> StoreResult<i64> {
        let result = sqlx::query(
            "INSERT INTO failed_probes (bucket_name, status, connection_state, details, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&record.bucket_name)
        .bind(&record.status)
        .bind(&record.connection_state)
        .bind(encode_details(&record.details)?)
        .bind(now_epoch())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn list_open_buckets(&self, limit: usize) -> StoreResult<Vec<Stored<OpenBucketRecord>>> {
        let rows = sqlx::query(
            "SELECT id, bucket_name, status, connection_state, details, created_at
             FROM open_buckets ORDER BY id DESC LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_open_bucket).collect()
    }

    async fn list_failed_probes(
        &self,
        limit: usize,
    ) -> StoreResult<Vec<Stored<FailedProbeRecord>>> {
        let rows = sqlx::query(
            "SELECT id, bucket_name, status, connection_state, details, created_at
             FROM failed_probes ORDER BY id DESC LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_failed_probe).collect()
    }
}

#[async_trait]
impl ProgressStore for SqliteLedger {
    async fn create_run(&self, input_id: &str, process_kind: &str) -> StoreResult<RunProgress> {
        let now = now_epoch();
        let result = sqlx::query(
            "INSERT INTO scan_runs (input_id, process_kind, created_at, updated_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(input_id)
        .bind(process_kind)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(RunProgress {
            id: result.last_insert_rowid(),
            input_id: input_id.to_string(),
            process_kind: process_kind.to_string(),
            current_line: None,
            current_candidate: None,
            current_resource: None,
            failure: None,
            created_at: now,
            updated_at: now,
        })
    }

    async fn update_position(&self, run_id: i64, position: &Position) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE scan_runs
             SET current_line = ?, current_candidate = ?, current_resource = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(position.line_number as i64)
        .bind(&position.candidate)
        .bind(&position.resource_name)
        .bind(now_epoch())
        .bind(run_id)
        .execute(&self.pool)
        .await?;

        require_updated(run_id, result.rows_affected())
    }

    async fn record_failure(&self, run_id: i64, message: &str) -> StoreResult<()> {
        let result = sqlx::query("UPDATE scan_runs SET failure = ?, updated_at = ? WHERE id = ?")
            .bind(message)
            .bind(now_epoch())
            .bind(run_id)
            .execute(&self.pool)
            .await?;

        require_updated(run_id, result.rows_affected())
    }

    async fn get_run(&self, run_id: i64) -> StoreResult<Option<RunProgress>> {
        let row = sqlx::query(
            "SELECT id, input_id, process_kind, current_line, current_candidate,
                    current_resource, failure, created_at, updated_at
             FROM scan_runs WHERE id = ?",
        )
        .bind(run_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(row_to_run(&r)?)),
            None => Ok(None),
        }
    }

    async fn list_runs(&self, limit: usize) -> StoreResult<Vec<RunProgress>> {
        let rows = sqlx::query(
            "SELECT id, input_id, process_kind, current_line, current_candidate,
                    current_resource, failure, created_at, updated_at
             FROM scan_runs ORDER BY id DESC LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_run).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_sqlite_basic_flow() -> anyhow::Result<()> {
        let tmp = NamedTempFile::new()?;
        let ledger = SqliteLedger::open(tmp.path().to_str().unwrap()).await?;

        let run = ledger.create_run("words.txt", "S3Crawler").await?;
        assert_eq!(run.id, 1);
        assert!(run.current_line.is_none());

        ledger
            .update_position(run.id, &Position::new(3, "mybucket", Some("mybucket".into())))
            .await?;

        let stored = ledger.get_run(run.id).await?.unwrap();
        assert_eq!(stored.current_line, Some(3));
        assert_eq!(stored.current_resource.as_deref(), Some("mybucket"));
        assert!(stored.failure.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_unique_violation_maps_to_conflict() -> anyhow::Result<()> {
        let tmp = NamedTempFile::new()?;
        let ledger = SqliteLedger::open(tmp.path().to_str().unwrap()).await?;

        let record = OpenBucketRecord::new("openbucket", "success", "fulfilled");
        ledger.insert_open_bucket(&record).await?;

        let err = ledger.insert_open_bucket(&record).await.unwrap_err();
        assert!(err.is_conflict(), "expected conflict, got {:?}", err);

        assert_eq!(ledger.list_open_buckets(10).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_details_round_trip_as_json() -> anyhow::Result<()> {
        let tmp = NamedTempFile::new()?;
        let ledger = SqliteLedger::open(tmp.path().to_str().unwrap()).await?;

        let mut details = Details::new();
        details.insert("http_status".to_string(), serde_json::json!(200));
        details.insert(
            "endpoint".to_string(),
            serde_json::json!("https://{bucket}.s3.amazonaws.com"),
        );

        let record =
            OpenBucketRecord::new("openbucket", "success", "fulfilled").with_details(details);
        ledger.insert_open_bucket(&record).await?;

        let listed = ledger.list_open_buckets(1).await?;
        assert_eq!(listed[0].record, record);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_missing_run() -> anyhow::Result<()> {
        let tmp = NamedTempFile::new()?;
        let ledger = SqliteLedger::open(tmp.path().to_str().unwrap()).await?;

        let err = ledger.record_failure(42, "boom").await.unwrap_err();
        assert_eq!(err, StoreError::RunNotFound(42));
        Ok(())
    }
}
