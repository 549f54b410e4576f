use std::fmt;

use crate::lines::{Line, LineBuffer, Position};
use crate::transform::{Step, Transform};

/// Produces higher-level items out of the lines queued in a [`LineBuffer`].
///
/// `extract` is called whenever the harness is polled. It consumes the lines
/// belonging to one item and returns it, returns an error for malformed
/// lines, or returns `None` (consuming nothing) when the queued lines do not
/// hold a whole item yet.
pub trait Extract {
    /// Item produced from one or more lines.
    type Item;
    /// Error reported for malformed lines.
    type Error;

    /// Attempts to extract one item.
    fn extract(&mut self, lines: &mut LineBuffer) -> Option<Result<Self::Item, Self::Error>>;
}

/// Adapts a closure to [`Extract`]. Created with [`extract_fn`].
#[derive(Debug, Clone)]
pub struct ExtractFn<F>(F);

/// Wraps `f` so it can drive a [`Parser`].
///
/// # Example
///
/// ```
/// use biostream::lines::LineBuffer;
/// use biostream::parser::{extract_fn, Parser, ParserError};
/// use biostream::transform::process_all;
///
/// let extract = extract_fn(|lines: &mut LineBuffer| -> Option<Result<Vec<u8>, ()>> {
///     lines.next_line().map(Ok)
/// });
/// let parser = Parser::new(extract, |_: ParserError<()>| "truncated");
/// let names = process_all(parser, vec![b"a\nb\n".to_vec()]).unwrap();
/// assert_eq!(names, vec![b"a".to_vec(), b"b".to_vec()]);
/// ```
pub fn extract_fn<F, T, E>(f: F) -> ExtractFn<F>
where
    F: FnMut(&mut LineBuffer) -> Option<Result<T, E>>,
{
    ExtractFn(f)
}

impl<F, T, E> Extract for ExtractFn<F>
where
    F: FnMut(&mut LineBuffer) -> Option<Result<T, E>>,
{
    type Item = T;
    type Error = E;

    #[inline]
    fn extract(&mut self, lines: &mut LineBuffer) -> Option<Result<T, E>> {
        (self.0)(lines)
    }
}

/// Data left in the buffer when input ended before the parser could use it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncompleteInput {
    /// Where parsing stopped.
    pub position: Position,
    /// Complete lines that were never consumed.
    pub lines: Vec<Line>,
    /// The trailing fragment without terminator, if any.
    pub fragment: Option<Vec<u8>>,
}

impl fmt::Display for IncompleteInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "incomplete input at {}: {} unconsumed line(s)",
            self.position,
            self.lines.len()
        )?;
        if let Some(fragment) = &self.fragment {
            write!(
                f,
                " and unterminated '{}'",
                String::from_utf8_lossy(fragment)
            )?;
        }
        Ok(())
    }
}

impl std::error::Error for IncompleteInput {}

/// Errors seen by a [`Parser`] before they are merged into its error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParserError<E> {
    /// The extractor rejected the lines.
    Item(E),
    /// Input ended with unconsumed data.
    Incomplete(IncompleteInput),
}

impl<E: fmt::Display> fmt::Display for ParserError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParserError::Item(err) => err.fmt(f),
            ParserError::Incomplete(incomplete) => incomplete.fmt(f),
        }
    }
}

impl<E> std::error::Error for ParserError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParserError::Item(err) => Some(err),
            ParserError::Incomplete(incomplete) => Some(incomplete),
        }
    }
}

/// Incremental parser: a [`LineBuffer`] driven by an [`Extract`]or.
///
/// Unlike [`LineSplitter`](crate::lines::LineSplitter), anything still
/// buffered when input ends is an error, even a single unterminated line:
/// the extractor did not accept it as a whole item.
pub struct Parser<X, M> {
    buffer: LineBuffer,
    extract: X,
    merge: M,
    stopped: bool,
}

impl<X: fmt::Debug, M> fmt::Debug for Parser<X, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser")
            .field("buffer", &self.buffer)
            .field("extract", &self.extract)
            .field("stopped", &self.stopped)
            .finish_non_exhaustive()
    }
}

impl<X, M, E> Parser<X, M>
where
    X: Extract,
    M: FnMut(ParserError<X::Error>) -> E,
{
    /// Creates a parser with an unlabelled buffer.
    ///
    /// `merge` folds extraction and end-of-input errors into one type.
    pub fn new(extract: X, merge: M) -> Self {
        Self::with_buffer(LineBuffer::new(), extract, merge)
    }

    /// Creates a parser whose positions carry `label`, if any.
    pub fn with_label(label: Option<String>, extract: X, merge: M) -> Self {
        let buffer = match label {
            Some(label) => LineBuffer::with_label(label),
            None => LineBuffer::new(),
        };
        Self::with_buffer(buffer, extract, merge)
    }

    fn with_buffer(buffer: LineBuffer, extract: X, merge: M) -> Self {
        Self {
            buffer,
            extract,
            merge,
            stopped: false,
        }
    }
}

impl<X, M> Parser<X, M> {
    /// The underlying buffer.
    pub fn buffer(&self) -> &LineBuffer {
        &self.buffer
    }

    /// The current position.
    pub fn position(&self) -> Position {
        self.buffer.position()
    }
}

impl<X, M, E> Transform for Parser<X, M>
where
    X: Extract,
    M: FnMut(ParserError<X::Error>) -> E,
{
    type Input = Vec<u8>;
    type Output = X::Item;
    type Error = E;

    fn feed(&mut self, input: Vec<u8>) {
        self.buffer.feed(&input);
    }

    fn next(&mut self, stopped: bool) -> Step<X::Item, E> {
        match self.extract.extract(&mut self.buffer) {
            Some(Ok(item)) => Step::Output(item),
            Some(Err(err)) => Step::Error((self.merge)(ParserError::Item(err))),
            None if !(stopped || self.stopped) => Step::NotReady,
            None if self.buffer.is_empty() => Step::EndOfStream,
            None => {
                let position = self.buffer.position();
                let (lines, fragment) = self.buffer.take_contents();
                Step::Error((self.merge)(ParserError::Incomplete(IncompleteInput {
                    position,
                    lines,
                    fragment,
                })))
            }
        }
    }

    fn stop(&mut self) {
        self.stopped = true;
    }
}
