use crate::fastq::FastqRecord;
use crate::transform::{self, Map};

/// A FASTA record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FastaRecord {
    /// Header text after `>`.
    pub name: Vec<u8>,
    /// Bases, without line breaks.
    pub sequence: Vec<u8>,
}

impl FastaRecord {
    /// Creates a record.
    pub fn new<N: Into<Vec<u8>>, S: Into<Vec<u8>>>(name: N, sequence: S) -> Self {
        Self {
            name: name.into(),
            sequence: sequence.into(),
        }
    }

    /// Renders the record, wrapping the sequence every `line_width` bases
    /// when a non-zero width is given.
    ///
    /// # Example
    ///
    /// ```
    /// use biostream::fasta::FastaRecord;
    ///
    /// let record = FastaRecord::new("r1", "ACGTA");
    /// assert_eq!(record.render(Some(2)), b">r1\nAC\nGT\nA\n");
    /// assert_eq!(record.render(None), b">r1\nACGTA\n");
    /// ```
    pub fn render(&self, line_width: Option<usize>) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.name.len() + self.sequence.len() + 8);
        out.push(b'>');
        out.extend_from_slice(&self.name);
        out.push(b'\n');

        match line_width.filter(|width| *width > 0) {
            Some(width) => {
                for chunk in self.sequence.chunks(width) {
                    out.extend_from_slice(chunk);
                    out.push(b'\n');
                }
            }
            None => {
                out.extend_from_slice(&self.sequence);
                out.push(b'\n');
            }
        }
        out
    }
}

impl From<FastqRecord> for FastaRecord {
    /// Drops the qualities and the separator comment.
    fn from(record: FastqRecord) -> Self {
        Self {
            name: record.name,
            sequence: record.sequence,
        }
    }
}

/// Renders every record as FASTA, wrapping sequences at `line_width`.
pub fn printer(
    line_width: Option<usize>,
) -> Map<FastaRecord, Vec<u8>, impl FnMut(FastaRecord) -> Vec<u8>> {
    transform::from_fn(move |record: FastaRecord| record.render(line_width))
}
