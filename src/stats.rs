/*!
 * Per-run scan statistics
 */

use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Counters accumulated over a single scan
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScanStats {
    /// Input lines read
    pub lines_read: u64,
    /// Candidates handed to the probe
    pub candidates_probed: u64,
    /// Candidates dropped as adjacent repeats
    pub duplicates_skipped: u64,
    /// Outcomes returned by the probe
    pub outcomes: u64,
    /// Open buckets newly written
    pub open_recorded: u64,
    /// Open buckets already present in the ledger
    pub conflicts: u64,
    /// Failed probes written
    pub failures_recorded: u64,
    /// Outcomes needing no record
    pub ignored: u64,
    #[serde(skip)]
    pub duration: Duration,
}

impl ScanStats {
    /// Open buckets seen this run, new or already known
    pub fn open_found(&self) -> u64 {
        self.open_recorded + self.conflicts
    }

    /// Candidates probed per second
    pub fn rate(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.candidates_probed as f64 / secs
        } else {
            0.0
        }
    }

    /// Key/value rows for the end-of-run summary table
    pub fn summary_items(&self) -> Vec<(&'static str, String)> {
        let mut items = vec![
            ("Lines Read", self.lines_read.to_string()),
            ("Candidates Probed", self.candidates_probed.to_string()),
            ("Duplicates Skipped", self.duplicates_skipped.to_string()),
            ("Open Buckets", self.open_recorded.to_string()),
        ];
        if self.conflicts > 0 {
            items.push(("Already Recorded", self.conflicts.to_string()));
        }
        items.push(("Failed Probes", self.failures_recorded.to_string()));
        items.push(("Private / Missing", self.ignored.to_string()));
        items.push((
            "Duration",
            crate::cli_style::format_duration(self.duration.as_secs_f64()),
        ));
        items
    }
}

impl fmt::Display for ScanStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} lines, {} probed, {} duplicates, {} open ({} already known), {} failed probes, {} ignored",
            self.lines_read,
            self.candidates_probed,
            self.duplicates_skipped,
            self.open_found(),
            self.conflicts,
            self.failures_recorded,
            self.ignored
        )
    }
}
