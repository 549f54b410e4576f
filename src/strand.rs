use std::fmt;

use crate::bed::BedError;
use crate::lines::Position;

/// Represents the strand of a genomic feature.
///
/// # Example
///
/// ```
/// use biostream::strand::Strand;
///
/// let strand = Strand::Forward;
/// assert_eq!(strand.to_string(), "+");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strand {
    /// Positive strand (`+`).
    Forward,
    /// Negative strand (`-`).
    Reverse,
    /// Unknown strand (`.` or `?`).
    Unknown,
}

impl Strand {
    /// Parses a BED strand column.
    ///
    /// # Errors
    ///
    /// Returns [`BedError::InvalidField`] if the value is not one of
    /// `+`, `-`, `.` or `?`.
    pub(crate) fn parse(raw: &str, position: &Position) -> Result<Self, BedError> {
        match raw {
            "+" => Ok(Strand::Forward),
            "-" => Ok(Strand::Reverse),
            "." | "?" => Ok(Strand::Unknown),
            other => Err(BedError::invalid_field(
                position.clone(),
                "strand",
                format!("expected '+', '-', '.', or '?', got '{other}'"),
            )),
        }
    }

    /// The byte written for this strand.
    #[inline]
    pub fn as_byte(self) -> u8 {
        match self {
            Strand::Forward => b'+',
            Strand::Reverse => b'-',
            Strand::Unknown => b'.',
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strand::Forward => f.write_str("+"),
            Strand::Reverse => f.write_str("-"),
            Strand::Unknown => f.write_str("."),
        }
    }
}
