/*!
 * Line-oriented candidate source
 *
 * Streams an input one line at a time with its 1-based line number. Memory
 * use is bounded by the longest line, never by the size of the input.
 */

use std::io::{self, BufRead};

/// A single input line, terminator stripped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    /// 1-based position in the input
    pub number: u64,
    pub text: String,
}

/// Forward-only iterator over the lines of a reader
///
/// Invalid UTF-8 is replaced rather than rejected so a single bad line can
/// never stop a scan.
pub struct LineSource<R> {
    reader: R,
    buf: Vec<u8>,
    line: u64,
    done: bool,
}

impl<R: BufRead> LineSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::with_capacity(256),
            line: 0,
            done: false,
        }
    }
}

impl<R: BufRead> Iterator for LineSource<R> {
    type Item = io::Result<RawLine>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => {
                self.done = true;
                None
            }
            Ok(_) => {
                if self.buf.last() == Some(&b'\n') {
                    self.buf.pop();
                    if self.buf.last() == Some(&b'\r') {
                        self.buf.pop();
                    }
                }
                self.line += 1;
                Some(Ok(RawLine {
                    number: self.line,
                    text: String::from_utf8_lossy(&self.buf).into_owned(),
                }))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn collect(input: &[u8]) -> Vec<RawLine> {
        LineSource::new(Cursor::new(input.to_vec()))
            .collect::<io::Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn test_line_numbers_are_one_based() {
        let lines = collect(b"alpha\nbeta\ngamma\n");
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].number, 1);
        assert_eq!(lines[2].number, 3);
        assert_eq!(lines[2].text, "gamma");
    }

    #[test]
    fn test_crlf_and_missing_final_newline() {
        let lines = collect(b"alpha\r\nbeta");
        assert_eq!(lines[0].text, "alpha");
        assert_eq!(lines[1].text, "beta");
    }

    #[test]
    fn test_blank_lines_are_kept() {
        let lines = collect(b"alpha\n\nbeta\n");
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1].text, "");
        assert_eq!(lines[2].number, 3);
    }

    #[test]
    fn test_empty_input() {
        let mut source = LineSource::new(Cursor::new(Vec::new()));
        assert!(source.next().is_none());
        assert!(source.next().is_none());
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let lines = collect(b"ok\n\xff\xfebad\n");
        assert_eq!(lines[1].number, 2);
        assert!(lines[1].text.ends_with("bad"));
        assert!(lines[1].text.contains('\u{FFFD}'));
    }
}
