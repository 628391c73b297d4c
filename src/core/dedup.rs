/*!
 * Adjacent-duplicate suppression for approximately sorted input
 *
 * Only the immediately preceding candidate is remembered. Repeats that are
 * not adjacent are emitted again; downstream persistence tolerates them.
 */

/// A sanitized candidate and the input line it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// 1-based line number
    pub line_number: u64,
    pub text: String,
}

impl Candidate {
    pub fn new(line_number: u64, text: impl Into<String>) -> Self {
        Self {
            line_number,
            text: text.into(),
        }
    }
}

/// Iterator adaptor dropping a candidate equal to the one before it
///
/// Errors from the inner iterator pass through untouched and do not reset
/// the last-seen candidate.
pub struct DedupAdjacent<I> {
    inner: I,
    last: Option<String>,
    seen: u64,
    skipped: u64,
}

impl<I> DedupAdjacent<I> {
    pub fn new(inner: I) -> Self {
        Self {
            inner,
            last: None,
            seen: 0,
            skipped: 0,
        }
    }

    /// Candidates pulled from the inner iterator
    pub fn seen(&self) -> u64 {
        self.seen
    }

    /// Candidates dropped as adjacent repeats
    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

impl<I, E> Iterator for DedupAdjacent<I>
where
    I: Iterator<Item = Result<Candidate, E>>,
{
    type Item = Result<Candidate, E>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let candidate = match self.inner.next()? {
                Ok(candidate) => candidate,
                Err(e) => return Some(Err(e)),
            };
            self.seen += 1;

            if self.last.as_deref() == Some(candidate.text.as_str()) {
                self.skipped += 1;
                continue;
            }

            self.last = Some(candidate.text.clone());
            return Some(Ok(candidate));
        }
    }
}
