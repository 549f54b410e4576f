use std::collections::VecDeque;
use std::convert::Infallible;
use std::fmt;

use memchr::memchr_iter;

use crate::transform::{self, Map, Step, Transform};

/// A complete line of input, without its terminator.
pub type Line = Vec<u8>;

const TERMINATOR: u8 = b'\n';

/// A diagnostic locator for errors raised while reading text.
///
/// # Example
///
/// ```
/// use biostream::lines::Position;
///
/// let position = Position::new(Some("reads.fq".to_string()), 8);
/// assert_eq!(position.to_string(), "reads.fq:8");
/// assert_eq!(position.with_column(3).to_string(), "reads.fq:8:3");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Position {
    /// Source label, usually a file name.
    pub label: Option<String>,
    /// Number of lines handed out when the position was taken.
    pub line: usize,
    /// Optional column within the line.
    pub column: Option<usize>,
}

impl Position {
    /// Creates a position without a column.
    pub fn new(label: Option<String>, line: usize) -> Self {
        Self {
            label,
            line,
            column: None,
        }
    }

    /// Returns the same position pointing at `column`.
    pub fn with_column(mut self, column: usize) -> Self {
        self.column = Some(column);
        self
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Some(label) => write!(f, "{label}:{}", self.line)?,
            None => write!(f, "line {}", self.line)?,
        }
        if let Some(column) = self.column {
            write!(f, ":{column}")?;
        }
        Ok(())
    }
}

/// Incremental line splitter.
///
/// Bytes are pushed in arbitrary chunks; completed lines are queued in
/// arrival order and a trailing fragment without terminator is kept aside
/// until the rest of its line arrives.
///
/// # Example
///
/// ```
/// use biostream::lines::LineBuffer;
///
/// let mut buffer = LineBuffer::new();
/// buffer.feed(b"@read1\nAC");
/// buffer.feed(b"GT\n+");
/// assert_eq!(buffer.queued(), 2);
/// assert_eq!(buffer.next_line().as_deref(), Some(&b"@read1"[..]));
/// assert_eq!(buffer.next_line().as_deref(), Some(&b"ACGT"[..]));
/// assert_eq!(buffer.unfinished_line(), Some(&b"+"[..]));
/// assert_eq!(buffer.position().line, 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct LineBuffer {
    lines: VecDeque<Line>,
    unfinished: Option<Vec<u8>>,
    parsed_lines: usize,
    label: Option<String>,
}

impl LineBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty buffer reporting positions against `label`.
    pub fn with_label<S: Into<String>>(label: S) -> Self {
        Self {
            label: Some(label.into()),
            ..Self::default()
        }
    }

    /// Splits `chunk` into lines.
    ///
    /// A pending fragment is prefixed to the first piece of the chunk. A chunk
    /// ending exactly on a terminator leaves no fragment behind.
    pub fn feed(&mut self, chunk: &[u8]) {
        let mut start = 0;
        for end in memchr_iter(TERMINATOR, chunk) {
            let piece = &chunk[start..end];
            let line = match self.unfinished.take() {
                Some(mut prefix) => {
                    prefix.extend_from_slice(piece);
                    prefix
                }
                None => piece.to_vec(),
            };
            self.lines.push_back(line);
            start = end + 1;
        }

        if start < chunk.len() {
            self.unfinished
                .get_or_insert_with(Vec::new)
                .extend_from_slice(&chunk[start..]);
        }
    }

    /// Dequeues the oldest completed line.
    pub fn next_line(&mut self) -> Option<Line> {
        let line = self.lines.pop_front()?;
        self.parsed_lines += 1;
        Some(line)
    }

    /// Returns the `index`-th queued line without consuming it.
    pub fn peek_line(&self, index: usize) -> Option<&[u8]> {
        self.lines.get(index).map(Vec::as_slice)
    }

    /// Number of completed lines waiting to be consumed.
    #[inline]
    pub fn queued(&self) -> usize {
        self.lines.len()
    }

    /// Number of lines handed out so far.
    #[inline]
    pub fn parsed_lines(&self) -> usize {
        self.parsed_lines
    }

    /// The trailing fragment still waiting for its terminator.
    pub fn unfinished_line(&self) -> Option<&[u8]> {
        self.unfinished.as_deref()
    }

    /// Hands out the trailing fragment as if it were a complete line.
    ///
    /// Only meaningful once no more input will arrive.
    pub fn take_unfinished(&mut self) -> Option<Line> {
        let line = self.unfinished.take()?;
        self.parsed_lines += 1;
        Some(line)
    }

    /// Returns `true` when neither lines nor a fragment are buffered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.unfinished.is_none()
    }

    /// The source label, if any.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// The current position: the label and the number of lines handed out.
    ///
    /// Lines that are queued but not yet consumed do not count.
    pub fn position(&self) -> Position {
        Position::new(self.label.clone(), self.parsed_lines)
    }

    /// Copies out every queued line and the pending fragment.
    pub fn contents(&self) -> (Vec<Line>, Option<Vec<u8>>) {
        (self.lines.iter().cloned().collect(), self.unfinished.clone())
    }

    /// Takes every queued line and the pending fragment, leaving the buffer
    /// empty. The line count is kept.
    pub fn take_contents(&mut self) -> (Vec<Line>, Option<Vec<u8>>) {
        (self.lines.drain(..).collect(), self.unfinished.take())
    }

    /// Discards all buffered data and resets the line count.
    pub fn flush(&mut self) {
        self.lines.clear();
        self.unfinished = None;
        self.parsed_lines = 0;
    }
}

/// Transform from byte chunks to lines.
///
/// When input ends, a trailing fragment without terminator is emitted as the
/// last line rather than reported as an error.
///
/// # Example
///
/// ```
/// use biostream::lines::LineSplitter;
/// use biostream::transform::{Step, Transform};
///
/// let mut splitter = LineSplitter::new();
/// splitter.feed(b"chr1\nchr2".to_vec());
/// assert_eq!(splitter.next(false), Step::Output(b"chr1".to_vec()));
/// assert_eq!(splitter.next(false), Step::NotReady);
/// splitter.stop();
/// assert_eq!(splitter.next(true), Step::Output(b"chr2".to_vec()));
/// assert_eq!(splitter.next(true), Step::EndOfStream);
/// ```
#[derive(Debug, Clone, Default)]
pub struct LineSplitter {
    buffer: LineBuffer,
    stopped: bool,
}

impl LineSplitter {
    /// Creates a splitter with an unlabelled buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a splitter whose positions carry `label`.
    pub fn with_label<S: Into<String>>(label: S) -> Self {
        Self {
            buffer: LineBuffer::with_label(label),
            stopped: false,
        }
    }

    /// The underlying buffer.
    pub fn buffer(&self) -> &LineBuffer {
        &self.buffer
    }

    /// The position of the last line handed out.
    pub fn position(&self) -> Position {
        self.buffer.position()
    }
}

impl Transform for LineSplitter {
    type Input = Vec<u8>;
    type Output = Line;
    type Error = Infallible;

    fn feed(&mut self, input: Vec<u8>) {
        self.buffer.feed(&input);
    }

    fn next(&mut self, stopped: bool) -> Step<Line, Infallible> {
        if let Some(line) = self.buffer.next_line() {
            return Step::Output(line);
        }

        if !(stopped || self.stopped) {
            return Step::NotReady;
        }

        match self.buffer.take_unfinished() {
            Some(line) => Step::Output(line),
            None => Step::EndOfStream,
        }
    }

    fn stop(&mut self) {
        self.stopped = true;
    }
}

/// Appends the line terminator to every line.
pub fn printer() -> Map<Line, Vec<u8>, fn(Line) -> Vec<u8>> {
    transform::from_fn(terminate as fn(Line) -> Vec<u8>)
}

fn terminate(mut line: Line) -> Vec<u8> {
    line.push(TERMINATOR);
    line
}

/// Drops a trailing carriage return, if present.
pub(crate) fn trim_cr(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}
