/*!
 * Run progress tracking
 *
 * One progress row per run, owned by the pipeline for the run's lifetime:
 * - `start` creates the row before any candidate is read
 * - `advance` overwrites the last fully persisted position
 * - `fail` annotates the row once when the run ends abnormally
 *
 * A run without a failure message that left the loop normally is complete;
 * there is no separate completion flag.
 */

use scan_ledger::{Position, ProgressStore, RunProgress, StoreResult};

/// Explicitly owned handle on the current run's progress row
pub struct ProgressTracker<'a, S: ProgressStore + ?Sized> {
    store: &'a S,
    run: RunProgress,
}

impl<'a, S: ProgressStore + ?Sized> ProgressTracker<'a, S> {
    /// Create the progress row for a new run
    pub async fn start(store: &'a S, input_id: &str, process_kind: &str) -> StoreResult<Self> {
        let run = store.create_run(input_id, process_kind).await?;
        tracing::debug!(run_id = run.id, input = input_id, "Created progress record");
        Ok(Self { store, run })
    }

    pub fn run_id(&self) -> i64 {
        self.run.id
    }

    /// Local copy of the row as last written
    pub fn snapshot(&self) -> &RunProgress {
        &self.run
    }

    /// Record that `line_number` is fully persisted
    pub async fn advance(
        &mut self,
        line_number: u64,
        candidate: &str,
        resource_name: Option<&str>,
    ) -> StoreResult<()> {
        let position = Position::new(line_number, candidate, resource_name.map(str::to_string));
        self.store.update_position(self.run.id, &position).await?;

        self.run.current_line = Some(position.line_number);
        self.run.current_candidate = Some(position.candidate);
        self.run.current_resource = position.resource_name;
        Ok(())
    }

    /// Set the terminal failure message
    ///
    /// Consumes the tracker: a run fails at most once and nothing advances
    /// after it.
    pub async fn fail(mut self, message: &str) -> StoreResult<RunProgress> {
        self.store.record_failure(self.run.id, message).await?;
        self.run.failure = Some(message.to_string());
        Ok(self.run)
    }

    /// Release the tracker after a normal end of input
    pub fn finish(self) -> RunProgress {
        self.run
    }
}
