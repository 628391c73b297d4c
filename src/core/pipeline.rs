/*!
 * Scan pipeline: read, dedup, probe, classify, persist, advance
 *
 * Candidates are handled strictly one at a time in input order. For each
 * surviving candidate every probe outcome is classified and persisted before
 * the progress row advances, so the recorded position always names the last
 * line whose results are durable.
 *
 * Failure handling:
 * - A probe error stops the whole run.
 * - A uniqueness conflict on an open-bucket insert means "already recorded"
 *   and is absorbed.
 * - Any other store error stops the run.
 *
 * A stopped run gets exactly one failure message on its progress row and the
 * original error is returned to the caller.
 */

use indicatif::ProgressBar;
use std::io::BufRead;
use std::time::Instant;
use tracing::Instrument;

use scan_ledger::{Ledger, RunProgress};

use super::cancel::CancelFlag;
use super::classify::{classify, Classification};
use super::dedup::{Candidate, DedupAdjacent};
use super::progress::ProgressTracker;
use super::sanitize::sanitize_url_path;
use super::source::LineSource;
use crate::error::{Result, ScanError};
use crate::probe::Probe;
use crate::stats::ScanStats;

/// Result of a scan that reached the end of its input
#[derive(Debug, Clone)]
pub struct ScanSummary {
    /// Progress row as last written
    pub run: RunProgress,
    pub stats: ScanStats,
}

/// Drives a probe over an input and records results in a ledger
pub struct ScanPipeline<'a, P: Probe + ?Sized, L: Ledger + ?Sized> {
    probe: &'a P,
    ledger: &'a L,
    cancel: Option<CancelFlag>,
    progress: ProgressBar,
}

impl<'a, P: Probe + ?Sized, L: Ledger + ?Sized> ScanPipeline<'a, P, L> {
    pub fn new(probe: &'a P, ledger: &'a L) -> Self {
        Self {
            probe,
            ledger,
            cancel: None,
            progress: ProgressBar::hidden(),
        }
    }

    /// Stop between candidates once `flag` is set
    pub fn with_cancel(mut self, flag: CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Report progress on `bar` (hidden by default)
    pub fn with_progress_bar(mut self, bar: ProgressBar) -> Self {
        self.progress = bar;
        self
    }

    /// Scan `input` to the end
    ///
    /// A progress row is created before the first line is read. On error the
    /// row's failure message is set and the original error is returned.
    pub async fn run<R: BufRead>(
        &self,
        input: R,
        input_id: &str,
        process_kind: &str,
    ) -> Result<ScanSummary> {
        let mut tracker = ProgressTracker::start(self.ledger, input_id, process_kind).await?;
        let run_id = tracker.run_id();
        let span = tracing::info_span!("scan", run_id, input = input_id);

        let started = Instant::now();
        let mut stats = ScanStats::default();
        let result = self
            .drive(input, &mut tracker, &mut stats)
            .instrument(span.clone())
            .await;
        stats.duration = started.elapsed();
        self.progress.finish_and_clear();

        match result {
            Ok(()) => {
                let run = tracker.finish();
                span.in_scope(|| tracing::info!(%stats, "Scan complete"));
                Ok(ScanSummary { run, stats })
            }
            Err(err) => {
                let message = err.to_string();
                match tracker.fail(&message).await {
                    Ok(run) => span.in_scope(|| {
                        tracing::error!(
                            error = %message,
                            last_line = ?run.current_line,
                            resume_line = run.resume_line(),
                            "Scan stopped"
                        )
                    }),
                    Err(store_err) => span.in_scope(|| {
                        tracing::error!(
                            error = %message,
                            store_error = %store_err,
                            "Scan stopped and the failure could not be recorded"
                        )
                    }),
                }
                Err(err)
            }
        }
    }

    async fn drive<R: BufRead>(
        &self,
        input: R,
        tracker: &mut ProgressTracker<'a, L>,
        stats: &mut ScanStats,
    ) -> Result<()> {
        let lines = LineSource::new(input)
            .map(|line| line.map(|raw| Candidate::new(raw.number, sanitize_url_path(&raw.text))));
        let mut candidates = DedupAdjacent::new(lines);

        loop {
            if self.is_cancelled() {
                tracing::warn!(
                    resume_line = tracker.snapshot().resume_line(),
                    "Cancellation requested, stopping before the next candidate"
                );
                return Err(ScanError::Interrupted);
            }

            let Some(next) = candidates.next() else {
                break;
            };
            stats.lines_read = candidates.seen();
            stats.duplicates_skipped = candidates.skipped();
            let candidate = next?;

            self.scan_candidate(&candidate, tracker, stats).await?;
        }

        stats.lines_read = candidates.seen();
        stats.duplicates_skipped = candidates.skipped();
        Ok(())
    }

    async fn scan_candidate(
        &self,
        candidate: &Candidate,
        tracker: &mut ProgressTracker<'a, L>,
        stats: &mut ScanStats,
    ) -> Result<()> {
        stats.candidates_probed += 1;
        self.progress.set_message(format!(
            "line {} | {} open | {} failed",
            candidate.line_number,
            stats.open_found(),
            stats.failures_recorded
        ));
        self.progress.tick();

        let outcomes = self.probe.probe(&candidate.text).await?;

        let mut last_resource = None;
        for outcome in outcomes {
            stats.outcomes += 1;
            last_resource = Some(outcome.resource_name.clone());
            let classification = classify(outcome);
            tracing::trace!(
                line = candidate.line_number,
                class = classification.label(),
                "Classified outcome"
            );
            self.persist(classification, stats).await?;
        }

        tracker
            .advance(
                candidate.line_number,
                &candidate.text,
                last_resource.as_deref(),
            )
            .await?;
        Ok(())
    }

    async fn persist(&self, classification: Classification, stats: &mut ScanStats) -> Result<()> {
        match classification {
            Classification::OpenBucket(record) => {
                match self.ledger.insert_open_bucket(&record).await {
                    Ok(id) => {
                        stats.open_recorded += 1;
                        tracing::info!(bucket = %record.bucket_name, id, "Discovered open bucket");
                    }
                    Err(e) if e.is_conflict() => {
                        stats.conflicts += 1;
                        tracing::debug!(bucket = %record.bucket_name, "Open bucket already recorded");
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            Classification::FailedProbe(record) => {
                self.ledger.insert_failed_probe(&record).await?;
                stats.failures_recorded += 1;
                tracing::debug!(
                    bucket = %record.bucket_name,
                    state = %record.connection_state,
                    "Recorded failed probe"
                );
            }
            Classification::Ignored => stats.ignored += 1,
        }
        Ok(())
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::{ConnectionState, ProbeError, ProbeOutcome, ScriptedProbe};
    use scan_ledger::{MemoryLedger, ProgressStore};
    use std::io::Cursor;

    fn input(lines: &[&str]) -> Cursor<Vec<u8>> {
        Cursor::new(lines.join("\n").into_bytes())
    }

    #[tokio::test]
    async fn test_progress_points_at_last_candidate() {
        crate::logging::init_test_logging();
        let probe = ScriptedProbe::new();
        let ledger = MemoryLedger::new();

        let summary = ScanPipeline::new(&probe, &ledger)
            .run(input(&["alpha", "alpha", "beta", "gamma"]), "words.txt", "S3Crawler")
            .await
            .unwrap();

        assert_eq!(summary.run.current_line, Some(4));
        assert_eq!(summary.run.current_candidate.as_deref(), Some("gamma"));
        assert!(summary.run.failure.is_none());
        assert_eq!(summary.stats.lines_read, 4);
        assert_eq!(summary.stats.candidates_probed, 3);
        assert_eq!(summary.stats.duplicates_skipped, 1);
        assert_eq!(summary.stats.ignored, 3);
    }

    #[tokio::test]
    async fn test_candidates_are_sanitized_before_probing() {
        let probe = ScriptedProbe::new();
        let ledger = MemoryLedger::new();

        ScanPipeline::new(&probe, &ledger)
            .run(input(&["my bucket", "my%20bucket", "50% off"]), "words.txt", "S3Crawler")
            .await
            .unwrap();

        // The first two lines sanitize to the same candidate
        assert_eq!(
            probe.calls(),
            vec!["my%20bucket".to_string(), "50%25%20off".to_string()]
        );
    }

    #[tokio::test]
    async fn test_resource_name_is_last_outcome() {
        let probe = ScriptedProbe::new().respond(
            "multi",
            vec![
                ProbeOutcome::closed("multi-us"),
                ProbeOutcome::unreachable("multi-eu", ConnectionState::TimedOut),
            ],
        );
        let ledger = MemoryLedger::new();

        let summary = ScanPipeline::new(&probe, &ledger)
            .run(input(&["multi"]), "words.txt", "S3Crawler")
            .await
            .unwrap();

        assert_eq!(summary.run.current_resource.as_deref(), Some("multi-eu"));
        assert_eq!(summary.stats.outcomes, 2);
        assert_eq!(ledger.failed_probe_count().await, 1);
    }

    #[tokio::test]
    async fn test_probe_error_records_failure() {
        let probe = ScriptedProbe::new().fail_on("boom", ProbeError::Engine("down".to_string()));
        let ledger = MemoryLedger::new();

        let err = ScanPipeline::new(&probe, &ledger)
            .run(input(&["first", "boom", "never"]), "words.txt", "S3Crawler")
            .await
            .unwrap_err();

        assert!(matches!(err, ScanError::Probe(ProbeError::Engine(_))));
        let run = &ledger.list_runs(1).await.unwrap()[0];
        assert_eq!(run.current_line, Some(1));
        assert!(run.failure.as_deref().unwrap().contains("down"));
        assert_eq!(probe.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_before_first_candidate() {
        let probe = ScriptedProbe::new();
        let ledger = MemoryLedger::new();
        let flag = CancelFlag::new();
        flag.cancel();

        let err = ScanPipeline::new(&probe, &ledger)
            .with_cancel(flag)
            .run(input(&["alpha"]), "words.txt", "S3Crawler")
            .await
            .unwrap_err();

        assert!(matches!(err, ScanError::Interrupted));
        assert_eq!(probe.call_count(), 0);
        let run = &ledger.list_runs(1).await.unwrap()[0];
        assert!(run.is_failed());
        assert_eq!(run.current_line, None);
    }
}
