//! Ready-made byte-to-byte pipelines used by the command line.
//!
//! Each pipeline is a chain of [`compose`]d stages whose nested
//! [`ComposeError`]s are flattened into [`PipelineError`] by [`on_error`].

use std::convert::Infallible;
use std::fmt;

use crate::bed::{self, BedError, BedParser};
use crate::fasta::{self, FastaRecord};
use crate::fastq::{self, FastqError};
use crate::lines::LineSplitter;
use crate::pair::{PairError, Pairs};
use crate::transform::{self, compose, on_error, on_output, ComposeError, Transform};

/// A type-erased pipeline from raw bytes to printable bytes.
pub type Pipeline = Box<dyn Transform<Input = Vec<u8>, Output = Vec<u8>, Error = PipelineError>>;

/// The single error type every pipeline reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// FASTQ parsing failed.
    Fastq(FastqError),
    /// BED parsing failed.
    Bed(BedError),
    /// Paired input had an unmatched record.
    Pairing(PairError),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Fastq(err) => err.fmt(f),
            PipelineError::Bed(err) => err.fmt(f),
            PipelineError::Pairing(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Fastq(err) => Some(err),
            PipelineError::Bed(err) => Some(err),
            PipelineError::Pairing(err) => Some(err),
        }
    }
}

/// Parses FASTQ and prints it back in normalized form.
pub fn fastq(label: Option<String>) -> Pipeline {
    Box::new(on_error(
        compose(fastq::parser(label), fastq::printer()),
        |err: ComposeError<FastqError, Infallible>| match err {
            ComposeError::Left(err) => PipelineError::Fastq(err),
            ComposeError::Right(never) => match never {},
        },
    ))
}

/// Converts FASTQ to FASTA, wrapping sequences at `line_width` if given.
pub fn fastq_to_fasta(label: Option<String>, line_width: Option<usize>) -> Pipeline {
    let records = on_output(fastq::parser(label), FastaRecord::from);
    Box::new(on_error(
        compose(records, fasta::printer(line_width)),
        |err: ComposeError<FastqError, Infallible>| match err {
            ComposeError::Left(err) => PipelineError::Fastq(err),
            ComposeError::Right(never) => match never {},
        },
    ))
}

/// Checks that interleaved paired-end FASTQ holds an even number of records
/// and prints the pairs back interleaved.
pub fn fastq_pairs(label: Option<String>) -> Pipeline {
    let pairs = compose(fastq::parser(label), Pairs::new());
    Box::new(on_error(
        compose(pairs, transform::from_fn(fastq::render_pair)),
        |err: ComposeError<ComposeError<FastqError, PairError>, Infallible>| match err {
            ComposeError::Left(ComposeError::Left(err)) => PipelineError::Fastq(err),
            ComposeError::Left(ComposeError::Right(err)) => PipelineError::Pairing(err),
            ComposeError::Right(never) => match never {},
        },
    ))
}

/// Parses BED and prints it back in normalized form.
///
/// Lines are split with [`LineSplitter`], so a final record without a
/// trailing newline is accepted.
pub fn bed(label: Option<String>) -> Pipeline {
    let splitter = match &label {
        Some(label) => LineSplitter::with_label(label.clone()),
        None => LineSplitter::new(),
    };
    let records = compose(splitter, BedParser::with_label(label));
    Box::new(on_error(
        compose(records, bed::printer()),
        |err: ComposeError<ComposeError<Infallible, BedError>, Infallible>| match err {
            ComposeError::Left(ComposeError::Left(never)) => match never {},
            ComposeError::Left(ComposeError::Right(err)) => PipelineError::Bed(err),
            ComposeError::Right(never) => match never {},
        },
    ))
}
