/*!
 * Outcome classification
 *
 * Every probe outcome lands in exactly one bucket:
 * - success: a discovered open bucket
 * - not success and the call did not complete: a recordable probe failure
 * - anything else: ignored (probed fine, bucket is private or missing)
 */

use scan_ledger::{FailedProbeRecord, OpenBucketRecord};

use crate::probe::ProbeOutcome;

/// Where a probe outcome goes
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    OpenBucket(OpenBucketRecord),
    FailedProbe(FailedProbeRecord),
    Ignored,
}

impl Classification {
    pub fn label(&self) -> &'static str {
        match self {
            Classification::OpenBucket(_) => "open",
            Classification::FailedProbe(_) => "failed",
            Classification::Ignored => "ignored",
        }
    }
}

/// Classify an outcome, dropping its raw response on the way
pub fn classify(outcome: ProbeOutcome) -> Classification {
    if outcome.is_success() {
        Classification::OpenBucket(outcome.into_open_record())
    } else if !outcome.connection_state.is_fulfilled() {
        Classification::FailedProbe(outcome.into_failed_record())
    } else {
        Classification::Ignored
    }
}
