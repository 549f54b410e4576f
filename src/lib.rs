//! # biostream
//!
//! Streaming transforms for converting bioinformatics file formats.
//!
//! ## Overview
//!
//! Every converter in this crate is a [`Transform`]: a small state machine
//! that is *fed* input, *polled* for output and finally *stopped* when no
//! more input will arrive. Transforms chain with [`compose`], and the errors
//! of a chain are collapsed into one type with [`on_error`]. A driver loop
//! ([`driver::run`]) reads fixed-size chunks from any byte source, pushes them
//! through a pipeline and writes every output to a sink.
//!
//! ## Features
//!
//! - **Chunk-boundary independence:** input may be split anywhere, even in
//!   the middle of a line, and produces the same output
//! - **Bounded buffering:** a pipeline drains what it already holds before
//!   pulling more input
//! - **Precise diagnostics:** line-oriented errors carry a [`Position`]
//! - **Compression Support:** gzip, zstd and bzip2 inputs, gzip outputs
//!
//! ## Basic Usage
//!
//! ### Splitting lines
//!
//! ```
//! use biostream::lines::LineSplitter;
//! use biostream::transform::{Step, Transform};
//!
//! let mut lines = LineSplitter::new();
//! lines.feed(b"chr1\t10\t2".to_vec());
//! lines.feed(b"0\nchr2\t5\t9".to_vec());
//! assert_eq!(lines.next(false), Step::Output(b"chr1\t10\t20".to_vec()));
//! assert_eq!(lines.next(false), Step::NotReady);
//!
//! lines.stop();
//! assert_eq!(lines.next(true), Step::Output(b"chr2\t5\t9".to_vec()));
//! assert_eq!(lines.next(true), Step::EndOfStream);
//! ```
//!
//! ### Running a pipeline over a file
//!
//! ```rust,no_run
//! use biostream::driver::{run_paths, DriverOptions};
//! use biostream::pipeline;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut fastq = pipeline::fastq_to_fasta(Some("reads.fq.gz".into()), Some(60));
//!     let stats = run_paths(&mut fastq, "reads.fq.gz", "reads.fa", &DriverOptions::new())?;
//!     println!("wrote {} records", stats.outputs);
//!     Ok(())
//! }
//! ```
//!
//! ### Writing a parser
//!
//! Record formats spanning several lines plug an [`Extract`] implementation
//! into the generic [`Parser`] harness:
//!
//! ```
//! use biostream::lines::LineBuffer;
//! use biostream::parser::{extract_fn, Parser, ParserError};
//! use biostream::transform::process_all;
//!
//! // two lines per record: a name and a value
//! let extract = extract_fn(|lines: &mut LineBuffer| -> Option<Result<(Vec<u8>, Vec<u8>), String>> {
//!     if lines.queued() < 2 {
//!         return None;
//!     }
//!     let name = lines.next_line()?;
//!     let value = lines.next_line()?;
//!     Some(Ok((name, value)))
//! });
//! let parser = Parser::new(extract, |err: ParserError<String>| err.to_string());
//! let err = process_all(parser, vec![b"a\n1\nb\n".to_vec()]).unwrap_err();
//! assert!(err.to_string().starts_with("incomplete input"));
//! ```
//!
//! ## End of input
//!
//! The raw line splitter treats a trailing line without terminator as valid
//! final content. The parser harness does not: anything its extractor has not
//! consumed when input ends is reported as [`IncompleteInput`], so truncated
//! records never pass silently.
//!
//! ## Feature Flags
//!
//! - `gzip` / `compression`: gzip inputs and `.gz` outputs (adds `flate2`)
//! - `zstd`: Zstandard inputs (adds `zstd`)
//! - `bz2`: bzip2 inputs (adds `bzip2`)
//! - `cli`: the `biostream` binary (adds `clap` and `simple_logger`)
//!
//! ## Thread Safety
//!
//! Transforms are plain single-owner values. Nothing is shared between
//! instances; run independent pipelines on independent threads if needed.

#![cfg_attr(doc, warn(missing_docs))]

pub mod bed;
pub mod driver;
pub mod fasta;
pub mod fastq;
pub mod lines;
pub mod pair;
pub mod parser;
pub mod pipeline;
pub mod strand;
pub mod transform;

pub use driver::{run, run_paths, DriverError, DriverOptions, DriverStats};
pub use lines::{LineBuffer, LineSplitter, Position};
pub use pair::{PairError, Pairs};
pub use parser::{Extract, IncompleteInput, Parser, ParserError};
pub use pipeline::{Pipeline, PipelineError};
pub use strand::Strand;
pub use transform::{compose, on_error, on_output, ComposeError, ProcessError, Step, Transform};
