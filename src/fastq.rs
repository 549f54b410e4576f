use std::fmt;

use crate::lines::{trim_cr, LineBuffer, Position};
use crate::parser::{Extract, IncompleteInput, Parser, ParserError};
use crate::transform::{self, Map};

/// A FASTQ record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FastqRecord {
    /// Header text after `@`.
    pub name: Vec<u8>,
    /// Bases.
    pub sequence: Vec<u8>,
    /// Text after `+` on the separator line, usually empty.
    pub comment: Vec<u8>,
    /// One quality character per base.
    pub qualities: Vec<u8>,
}

impl FastqRecord {
    /// Creates a record with an empty comment.
    pub fn new<N, S, Q>(name: N, sequence: S, qualities: Q) -> Self
    where
        N: Into<Vec<u8>>,
        S: Into<Vec<u8>>,
        Q: Into<Vec<u8>>,
    {
        Self {
            name: name.into(),
            sequence: sequence.into(),
            comment: Vec::new(),
            qualities: qualities.into(),
        }
    }

    /// The read identifier: the header up to the first whitespace.
    pub fn id(&self) -> &[u8] {
        let end = self
            .name
            .iter()
            .position(u8::is_ascii_whitespace)
            .unwrap_or(self.name.len());
        &self.name[..end]
    }

    /// Renders the record as four lines.
    pub fn render(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(
            self.name.len() + self.sequence.len() + self.comment.len() + self.qualities.len() + 6,
        );
        out.push(b'@');
        out.extend_from_slice(&self.name);
        out.push(b'\n');
        out.extend_from_slice(&self.sequence);
        out.extend_from_slice(b"\n+");
        out.extend_from_slice(&self.comment);
        out.push(b'\n');
        out.extend_from_slice(&self.qualities);
        out.push(b'\n');
        out
    }
}

/// An error raised while parsing FASTQ.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FastqError {
    /// The header line does not start with `@`.
    InvalidHeader {
        /// Where the error occurred.
        position: Position,
        /// The offending line.
        line: Vec<u8>,
    },
    /// The third line of a record does not start with `+`.
    MissingSeparator {
        /// Where the error occurred.
        position: Position,
        /// The offending line.
        line: Vec<u8>,
    },
    /// Sequence and qualities differ in length.
    QualityLengthMismatch {
        /// Where the error occurred.
        position: Position,
        /// Number of bases.
        sequence: usize,
        /// Number of quality characters.
        qualities: usize,
    },
    /// Input ended inside a record.
    Incomplete(IncompleteInput),
}

impl fmt::Display for FastqError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FastqError::InvalidHeader { position, line } => write!(
                f,
                "invalid FASTQ header at {position}: expected '@', got '{}'",
                String::from_utf8_lossy(line)
            ),
            FastqError::MissingSeparator { position, line } => write!(
                f,
                "invalid FASTQ separator at {position}: expected '+', got '{}'",
                String::from_utf8_lossy(line)
            ),
            FastqError::QualityLengthMismatch {
                position,
                sequence,
                qualities,
            } => write!(
                f,
                "FASTQ record ending at {position} has {sequence} bases but {qualities} qualities"
            ),
            FastqError::Incomplete(incomplete) => write!(f, "truncated FASTQ: {incomplete}"),
        }
    }
}

impl std::error::Error for FastqError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FastqError::Incomplete(incomplete) => Some(incomplete),
            _ => None,
        }
    }
}

impl FastqError {
    fn merge(err: ParserError<FastqError>) -> FastqError {
        match err {
            ParserError::Item(err) => err,
            ParserError::Incomplete(incomplete) => FastqError::Incomplete(incomplete),
        }
    }
}

/// Pulls four-line FASTQ records out of a [`LineBuffer`].
///
/// Multi-line sequences are not supported. A trailing `\r` on any line is
/// ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct FastqExtractor;

impl Extract for FastqExtractor {
    type Item = FastqRecord;
    type Error = FastqError;

    fn extract(&mut self, lines: &mut LineBuffer) -> Option<Result<FastqRecord, FastqError>> {
        if lines.queued() < 4 {
            return None;
        }

        // queued() guarantees all four
        let header = lines.next_line()?;
        let header = trim_cr(&header);
        let Some(name) = header.strip_prefix(b"@") else {
            return Some(Err(FastqError::InvalidHeader {
                position: lines.position(),
                line: header.to_vec(),
            }));
        };
        let name = name.to_vec();

        let sequence = lines.next_line()?;
        let sequence = trim_cr(&sequence).to_vec();

        let separator = lines.next_line()?;
        let separator = trim_cr(&separator);
        let Some(comment) = separator.strip_prefix(b"+") else {
            return Some(Err(FastqError::MissingSeparator {
                position: lines.position(),
                line: separator.to_vec(),
            }));
        };
        let comment = comment.to_vec();

        let qualities = lines.next_line()?;
        let qualities = trim_cr(&qualities).to_vec();
        if qualities.len() != sequence.len() {
            return Some(Err(FastqError::QualityLengthMismatch {
                position: lines.position(),
                sequence: sequence.len(),
                qualities: qualities.len(),
            }));
        }

        Some(Ok(FastqRecord {
            name,
            sequence,
            comment,
            qualities,
        }))
    }
}

/// The FASTQ parser type returned by [`parser`].
pub type FastqParser = Parser<FastqExtractor, fn(ParserError<FastqError>) -> FastqError>;

/// Creates a streaming FASTQ parser over raw bytes.
///
/// # Example
///
/// ```
/// use biostream::fastq;
/// use biostream::transform::process_all;
///
/// let records = process_all(
///     fastq::parser(None),
///     vec![b"@r1\nACGT\n+\nII".to_vec(), b"II\n".to_vec()],
/// )
/// .unwrap();
/// assert_eq!(records[0].sequence, b"ACGT");
/// ```
pub fn parser(label: Option<String>) -> FastqParser {
    Parser::with_label(
        label,
        FastqExtractor,
        FastqError::merge as fn(ParserError<FastqError>) -> FastqError,
    )
}

/// Renders every record as four FASTQ lines.
pub fn printer() -> Map<FastqRecord, Vec<u8>, fn(FastqRecord) -> Vec<u8>> {
    transform::from_fn(render as fn(FastqRecord) -> Vec<u8>)
}

fn render(record: FastqRecord) -> Vec<u8> {
    record.render()
}

/// Renders a pair of records as eight interleaved FASTQ lines.
pub fn render_pair((first, second): (FastqRecord, FastqRecord)) -> Vec<u8> {
    let mut out = first.render();
    out.extend_from_slice(&second.render());
    out
}
