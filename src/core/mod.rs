/*!
 * Core scan pipeline
 */

pub mod cancel;
pub mod classify;
pub mod dedup;
pub mod pipeline;
pub mod progress;
pub mod sanitize;
pub mod source;

pub use cancel::CancelFlag;
pub use classify::{classify, Classification};
pub use dedup::{Candidate, DedupAdjacent};
pub use pipeline::{ScanPipeline, ScanSummary};
pub use progress::ProgressTracker;
pub use sanitize::sanitize_url_path;
pub use source::{LineSource, RawLine};
