use std::collections::VecDeque;
use std::fmt;

use crate::lines::{trim_cr, Line, Position};
use crate::strand::Strand;
use crate::transform::{self, Map, Step, Transform};

const CHROM_START: &str = "chromStart";
const CHROM_END: &str = "chromEnd";
const SCORE: &str = "score";

/// An error raised while parsing a BED line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BedError {
    /// The line is not valid UTF-8.
    InvalidEncoding {
        /// Where the error occurred.
        position: Position,
        /// The error message.
        message: String,
    },
    /// A field could not be parsed.
    InvalidField {
        /// Where the error occurred.
        position: Position,
        /// The name of the field that could not be parsed.
        field: &'static str,
        /// The error message.
        message: String,
    },
    /// The line has fewer fields than a BED3 record.
    UnexpectedFieldCount {
        /// Where the error occurred.
        position: Position,
        /// The minimum number of fields.
        expected: usize,
        /// The actual number of fields.
        actual: usize,
    },
}

impl fmt::Display for BedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BedError::InvalidEncoding { position, message } => {
                write!(f, "invalid UTF-8 at {position}: {message}")
            }
            BedError::InvalidField {
                position,
                field,
                message,
            } => write!(f, "invalid {field} at {position}: {message}"),
            BedError::UnexpectedFieldCount {
                position,
                expected,
                actual,
            } => write!(
                f,
                "{position} had {actual} fields, expected at least {expected}"
            ),
        }
    }
}

impl std::error::Error for BedError {}

impl BedError {
    /// Creates a new `BedError` for an invalid field.
    pub(crate) fn invalid_field(position: Position, field: &'static str, message: String) -> Self {
        BedError::InvalidField {
            position,
            field,
            message,
        }
    }

    /// Returns where the error occurred.
    pub fn position(&self) -> &Position {
        match self {
            BedError::InvalidEncoding { position, .. }
            | BedError::InvalidField { position, .. }
            | BedError::UnexpectedFieldCount { position, .. } => position,
        }
    }
}

/// A BED record: the three mandatory columns, the optional name, score and
/// strand columns, and any further columns kept verbatim.
///
/// # Example
///
/// ```
/// use biostream::bed::BedRecord;
///
/// let record = BedRecord::new("chr1", 100, 200);
/// assert_eq!(record.len(), 100);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BedRecord {
    /// The chromosome or scaffold of the feature.
    pub chrom: String,
    /// The 0-based starting position of the feature.
    pub start: u64,
    /// The 1-based ending position of the feature.
    pub end: u64,
    /// The name of the feature.
    pub name: Option<String>,
    /// A score between 0 and 1000.
    pub score: Option<u16>,
    /// The strand of the feature.
    pub strand: Option<Strand>,
    /// Columns after the strand, in order.
    pub extras: Vec<String>,
}

impl BedRecord {
    /// Creates a BED3 record.
    pub fn new<S: Into<String>>(chrom: S, start: u64, end: u64) -> Self {
        Self {
            chrom: chrom.into(),
            start,
            end,
            name: None,
            score: None,
            strand: None,
            extras: Vec::new(),
        }
    }

    /// Length of the interval, zero if `end` lies before `start`.
    #[inline]
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    /// Returns `true` for zero-length intervals.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Parses one BED line. Returns `None` for blank, comment, `track` and
    /// `browser` lines.
    pub fn parse(line: &[u8], position: &Position) -> Option<Result<Self, BedError>> {
        let line = match std::str::from_utf8(trim_cr(line)) {
            Ok(line) => line,
            Err(err) => {
                return Some(Err(BedError::InvalidEncoding {
                    position: position.clone(),
                    message: err.to_string(),
                }))
            }
        };

        if is_header(line) {
            return None;
        }

        Some(Self::from_fields(line, position))
    }

    fn from_fields(line: &str, position: &Position) -> Result<Self, BedError> {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 3 {
            return Err(BedError::UnexpectedFieldCount {
                position: position.clone(),
                expected: 3,
                actual: fields.len(),
            });
        }

        let start = __to_u64(fields[1], position, CHROM_START)?;
        let end = __to_u64(fields[2], position, CHROM_END)?;
        if end < start {
            return Err(BedError::invalid_field(
                position.clone(),
                CHROM_END,
                format!("end {end} is smaller than start {start}"),
            ));
        }

        let mut record = Self::new(fields[0], start, end);
        record.name = fields.get(3).map(|name| name.to_string());
        record.score = fields
            .get(4)
            .map(|score| __parse_score(score, position))
            .transpose()?;
        record.strand = fields
            .get(5)
            .map(|strand| Strand::parse(strand, position))
            .transpose()?;
        record.extras = fields.iter().skip(6).map(|f| f.to_string()).collect();
        Ok(record)
    }

    /// Renders the record as a tab-separated line, terminator included.
    ///
    /// Optional columns are written up to the last one present; gaps before it
    /// are filled with `.` (name, strand) or `0` (score).
    pub fn render(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.chrom.len() + 32);
        out.extend_from_slice(self.chrom.as_bytes());
        out.push(b'\t');
        push_u64(&mut out, self.start);
        out.push(b'\t');
        push_u64(&mut out, self.end);

        let columns = if !self.extras.is_empty() || self.strand.is_some() {
            3
        } else if self.score.is_some() {
            2
        } else if self.name.is_some() {
            1
        } else {
            0
        };

        if columns >= 1 {
            out.push(b'\t');
            out.extend_from_slice(self.name.as_deref().unwrap_or(".").as_bytes());
        }
        if columns >= 2 {
            out.push(b'\t');
            push_u64(&mut out, u64::from(self.score.unwrap_or(0)));
        }
        if columns >= 3 {
            out.push(b'\t');
            out.push(self.strand.unwrap_or(Strand::Unknown).as_byte());
        }
        for extra in &self.extras {
            out.push(b'\t');
            out.extend_from_slice(extra.as_bytes());
        }

        out.push(b'\n');
        out
    }
}

/// Returns `true` for lines that carry no record.
fn is_header(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty()
        || trimmed.starts_with('#')
        || trimmed.starts_with("track ")
        || trimmed.starts_with("browser ")
}

/// Parses a BED field to a u64
fn __to_u64(field: &str, position: &Position, label: &'static str) -> Result<u64, BedError> {
    field.parse::<u64>().map_err(|_| {
        BedError::invalid_field(
            position.clone(),
            label,
            format!("expected unsigned integer, got '{field}'"),
        )
    })
}

/// Parses a BED score field to a u16
fn __parse_score(field: &str, position: &Position) -> Result<u16, BedError> {
    let value = field.parse::<u16>().map_err(|_| {
        BedError::invalid_field(
            position.clone(),
            SCORE,
            format!("expected integer between 0 and 1000, got '{field}'"),
        )
    })?;

    if value > 1000 {
        return Err(BedError::invalid_field(
            position.clone(),
            SCORE,
            format!("score {value} exceeds the BED maximum of 1000"),
        ));
    }
    Ok(value)
}

/// Appends the decimal representation of `value`.
fn push_u64(out: &mut Vec<u8>, mut value: u64) {
    if value == 0 {
        out.push(b'0');
        return;
    }
    let mut buf = [0u8; 20];
    let mut idx = buf.len();
    while value > 0 {
        idx -= 1;
        buf[idx] = b'0' + (value % 10) as u8;
        value /= 10;
    }
    out.extend_from_slice(&buf[idx..]);
}

/// Line-level BED stage: turns lines into [`BedRecord`]s.
///
/// Meant to run after a [`LineSplitter`](crate::lines::LineSplitter), so a
/// last record without trailing newline is still parsed. Header and comment
/// lines are skipped but still counted for positions.
///
/// # Example
///
/// ```
/// use biostream::bed::BedParser;
/// use biostream::lines::LineSplitter;
/// use biostream::transform::{compose, process_all};
///
/// let records = process_all(
///     compose(LineSplitter::new(), BedParser::new()),
///     vec![b"track name=x\nchr1\t10\t20\tgeneA\n".to_vec()],
/// )
/// .unwrap();
/// assert_eq!(records[0].name.as_deref(), Some("geneA"));
/// ```
#[derive(Debug, Default)]
pub struct BedParser {
    queue: VecDeque<Result<BedRecord, BedError>>,
    line: usize,
    label: Option<String>,
    stopped: bool,
}

impl BedParser {
    /// Creates a parser reporting unlabelled positions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a parser whose positions carry `label`, if any.
    pub fn with_label(label: Option<String>) -> Self {
        Self {
            label,
            ..Self::default()
        }
    }

    /// Lines received so far.
    pub fn lines_seen(&self) -> usize {
        self.line
    }
}

impl Transform for BedParser {
    type Input = Line;
    type Output = BedRecord;
    type Error = BedError;

    fn feed(&mut self, input: Line) {
        // nothing after an error will be delivered
        if self.queue.back().is_some_and(Result::is_err) {
            return;
        }
        self.line += 1;
        let position = Position::new(self.label.clone(), self.line);
        if let Some(record) = BedRecord::parse(&input, &position) {
            self.queue.push_back(record);
        }
    }

    fn next(&mut self, stopped: bool) -> Step<BedRecord, BedError> {
        match self.queue.pop_front() {
            Some(Ok(record)) => Step::Output(record),
            Some(Err(err)) => Step::Error(err),
            None if stopped || self.stopped => Step::EndOfStream,
            None => Step::NotReady,
        }
    }

    fn stop(&mut self) {
        self.stopped = true;
    }
}

/// Renders every record as one BED line.
pub fn printer() -> Map<BedRecord, Vec<u8>, fn(BedRecord) -> Vec<u8>> {
    transform::from_fn(render as fn(BedRecord) -> Vec<u8>)
}

fn render(record: BedRecord) -> Vec<u8> {
    record.render()
}
