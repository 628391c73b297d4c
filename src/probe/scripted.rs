//! Scripted probe for testing
//!
//! Returns canned outcomes per candidate without any network access and
//! records every call so tests can assert what was probed and in which order.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::{Probe, ProbeError, ProbeOutcome, ProbeResult};

#[derive(Debug, Clone)]
enum Script {
    Outcomes(Vec<ProbeOutcome>),
    Fail(ProbeError),
}

/// In-memory probe with canned responses
///
/// Candidates without a script yield a single closed (private) outcome.
///
/// # Example
///
/// ```rust
/// use bucketscan::probe::{Probe, ProbeOutcome, ScriptedProbe};
///
/// #[tokio::main]
/// async fn main() {
///     let probe = ScriptedProbe::new().respond("openbucket", vec![ProbeOutcome::open("openbucket")]);
///
///     let outcomes = probe.probe("openbucket").await.unwrap();
///     assert!(outcomes[0].is_success());
///     assert_eq!(probe.calls(), vec!["openbucket".to_string()]);
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScriptedProbe {
    scripts: Arc<Mutex<HashMap<String, Script>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return these outcomes whenever `candidate` is probed
    pub fn respond(self, candidate: &str, outcomes: Vec<ProbeOutcome>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(candidate.to_string(), Script::Outcomes(outcomes));
        self
    }

    /// Raise `error` whenever `candidate` is probed
    pub fn fail_on(self, candidate: &str, error: ProbeError) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(candidate.to_string(), Script::Fail(error));
        self
    }

    /// Candidates probed so far, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Probe for ScriptedProbe {
    async fn probe(&self, candidate: &str) -> ProbeResult<Vec<ProbeOutcome>> {
        self.calls.lock().unwrap().push(candidate.to_string());

        let script = self.scripts.lock().unwrap().get(candidate).cloned();
        match script {
            Some(Script::Outcomes(outcomes)) => Ok(outcomes),
            Some(Script::Fail(error)) => Err(error),
            None => Ok(vec![ProbeOutcome::closed(candidate)]),
        }
    }
}
