//! Command-line interface for biostream.
//!
//! Usage:
//!   biostream fastq `<input>` `<output>`           - Parse and re-print FASTQ
//!   biostream fastq-to-fasta `<input>` `<output>`  - Convert FASTQ to FASTA
//!   biostream fastq-pairs `<input>` `<output>`     - Check interleaved paired-end FASTQ
//!   biostream bed `<input>` `<output>`             - Parse and re-print BED

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use simple_logger::SimpleLogger;

use biostream::driver::{self, Compression, DriverOptions, DEFAULT_BUFFER_SIZE};
use biostream::pipeline::{self, Pipeline};

#[derive(Debug, Parser)]
#[command(name = "biostream", version, about = "Streaming bioinformatics format conversion")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Increase diagnostic output (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only report errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse FASTQ and print it back normalized
    Fastq(IoArgs),
    /// Convert FASTQ to FASTA
    FastqToFasta {
        #[command(flatten)]
        io: IoArgs,

        /// Wrap sequences after this many bases
        #[arg(long)]
        line_width: Option<usize>,
    },
    /// Check that interleaved paired-end FASTQ pairs up and print it back
    FastqPairs(IoArgs),
    /// Parse BED and print it back normalized
    Bed(IoArgs),
}

#[derive(Debug, Args)]
struct IoArgs {
    /// Input file
    input: PathBuf,

    /// Output file (gzip-compressed when it ends in .gz)
    output: PathBuf,

    /// Size of the chunks read from the input
    #[arg(long, default_value_t = DEFAULT_BUFFER_SIZE)]
    input_buffer_size: usize,

    /// Capacity of the output buffer
    #[arg(long, default_value_t = DEFAULT_BUFFER_SIZE)]
    output_buffer_size: usize,

    /// Input compression
    #[arg(long, value_enum, default_value_t = CompressionArg::Auto)]
    compression: CompressionArg,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CompressionArg {
    Auto,
    None,
    Gzip,
    Zstd,
    Bzip2,
}

impl From<CompressionArg> for Compression {
    fn from(arg: CompressionArg) -> Self {
        match arg {
            CompressionArg::Auto => Compression::Auto,
            CompressionArg::None => Compression::None,
            CompressionArg::Gzip => Compression::Gzip,
            CompressionArg::Zstd => Compression::Zstd,
            CompressionArg::Bzip2 => Compression::Bzip2,
        }
    }
}

impl IoArgs {
    fn options(&self) -> DriverOptions {
        DriverOptions::new()
            .input_buffer_size(self.input_buffer_size)
            .output_buffer_size(self.output_buffer_size)
            .compression(self.compression.into())
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match (cli.quiet, cli.verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Warn,
        (false, 1) => LevelFilter::Info,
        (false, 2) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    };
    if let Err(err) = SimpleLogger::new().with_level(level).init() {
        eprintln!("ERROR: could not initialize logging: {err}");
    }

    let (io, mut pipeline) = match cli.command {
        Command::Fastq(io) => {
            let pipeline = pipeline::fastq(label(&io.input));
            (io, pipeline)
        }
        Command::FastqToFasta { io, line_width } => {
            let pipeline = pipeline::fastq_to_fasta(label(&io.input), line_width);
            (io, pipeline)
        }
        Command::FastqPairs(io) => {
            let pipeline = pipeline::fastq_pairs(label(&io.input));
            (io, pipeline)
        }
        Command::Bed(io) => {
            let pipeline = pipeline::bed(label(&io.input));
            (io, pipeline)
        }
    };

    convert(&io, &mut pipeline)
}

fn convert(io: &IoArgs, pipeline: &mut Pipeline) -> ExitCode {
    match driver::run_paths(pipeline, &io.input, &io.output, &io.options()) {
        Ok(stats) => {
            log::info!(
                "read {} bytes in {} chunks, wrote {} records ({} bytes)",
                stats.bytes_read,
                stats.chunks,
                stats.outputs,
                stats.bytes_written
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn label(path: &Path) -> Option<String> {
    Some(path.display().to_string())
}
