use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, ErrorKind, Read, Write};
use std::path::Path;

#[cfg(feature = "bz2")]
use bzip2::read::BzDecoder;
#[cfg(feature = "gzip")]
use flate2::read::MultiGzDecoder;
#[cfg(feature = "gzip")]
use flate2::write::GzEncoder;
#[cfg(feature = "gzip")]
use flate2::Compression as GzCompression;
#[cfg(feature = "zstd")]
use zstd::stream::read::Decoder as ZstdDecoder;

use crate::transform::{Step, Transform};

/// Default size of the chunks read from the source and of the output buffer.
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Result alias for driver operations.
pub type DriverResult<T, E> = Result<T, DriverError<E>>;

/// An error that ends a driver run.
#[derive(Debug)]
pub enum DriverError<E> {
    /// Reading the source or writing the sink failed.
    Io(io::Error),
    /// The transform reported an error.
    Transform(E),
    /// The transform asked for more input after it was stopped.
    Stalled,
    /// The run could not be set up.
    Config(String),
}

impl<E: fmt::Display> fmt::Display for DriverError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverError::Io(err) => write!(f, "I/O error: {err}"),
            DriverError::Transform(err) => err.fmt(f),
            DriverError::Stalled => {
                f.write_str("transform requested more input after end of input")
            }
            DriverError::Config(msg) => write!(f, "configuration error: {msg}"),
        }
    }
}

impl<E> std::error::Error for DriverError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DriverError::Io(err) => Some(err),
            DriverError::Transform(err) => Some(err),
            _ => None,
        }
    }
}

impl<E> From<io::Error> for DriverError<E> {
    fn from(err: io::Error) -> Self {
        DriverError::Io(err)
    }
}

/// Counters collected over one driver run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DriverStats {
    /// Non-empty chunks read from the source.
    pub chunks: usize,
    /// Bytes read from the source.
    pub bytes_read: u64,
    /// Outputs written to the sink.
    pub outputs: usize,
    /// Bytes written to the sink.
    pub bytes_written: u64,
}

/// The compression format of the input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    /// Detect the compression format from the file extension.
    #[default]
    Auto,
    /// No compression.
    None,
    /// Gzip compression.
    Gzip,
    /// Zstandard compression.
    Zstd,
    /// Bzip2 compression.
    Bzip2,
}

/// Detect compression from file extension
fn detect_compression_from_extension(path: &Path) -> Compression {
    let ext = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");
    match ext {
        "gz" => Compression::Gzip,
        "zst" | "zstd" => Compression::Zstd,
        "bz2" | "bzip2" => Compression::Bzip2,
        _ => Compression::None,
    }
}

/// Configuration for [`run_paths`].
///
/// # Example
///
/// ```
/// use biostream::driver::{Compression, DriverOptions};
///
/// let options = DriverOptions::new()
///     .input_buffer_size(4096)
///     .compression(Compression::None);
/// assert_eq!(options.input_buffer(), 4096);
/// ```
#[derive(Debug, Clone)]
pub struct DriverOptions {
    input_buffer_size: usize,
    output_buffer_size: usize,
    compression: Compression,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            input_buffer_size: DEFAULT_BUFFER_SIZE,
            output_buffer_size: DEFAULT_BUFFER_SIZE,
            compression: Compression::default(),
        }
    }
}

impl DriverOptions {
    /// Creates options with 64 KB buffers and automatic compression detection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the size of the chunks read from the input. Zero is raised to one.
    pub fn input_buffer_size(mut self, size: usize) -> Self {
        self.input_buffer_size = size.max(1);
        self
    }

    /// Sets the capacity of the output buffer.
    pub fn output_buffer_size(mut self, size: usize) -> Self {
        self.output_buffer_size = size.max(1);
        self
    }

    /// Sets the compression format of the input.
    pub fn compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Returns the input chunk size.
    pub fn input_buffer(&self) -> usize {
        self.input_buffer_size
    }

    /// Returns the output buffer capacity.
    pub fn output_buffer(&self) -> usize {
        self.output_buffer_size
    }

    /// Returns the configured input compression.
    pub fn input_compression(&self) -> Compression {
        self.compression
    }
}

enum Drained {
    NeedInput,
    Finished,
}

/// Pumps `source` through `transform` into `sink`.
///
/// Chunks of at most `input_buffer_size` bytes are fed one at a time, and
/// after each one the transform is polled until it asks for more input. A
/// zero-length read marks the end of the source: the transform is stopped and
/// drained. The first transform error ends the run; nothing is read, fed or
/// polled after it.
///
/// # Example
///
/// ```
/// use biostream::driver::run;
/// use biostream::lines::{self, LineSplitter};
/// use biostream::transform::compose;
///
/// let mut pipeline = compose(LineSplitter::new(), lines::printer());
/// let mut sink = Vec::new();
/// let stats = run(&mut pipeline, &mut &b"chr1\nchr2"[..], &mut sink, 3).unwrap();
/// assert_eq!(sink, b"chr1\nchr2\n");
/// assert_eq!(stats.outputs, 2);
/// ```
pub fn run<T, R, W>(
    transform: &mut T,
    source: &mut R,
    sink: &mut W,
    input_buffer_size: usize,
) -> DriverResult<DriverStats, T::Error>
where
    T: Transform<Input = Vec<u8>> + ?Sized,
    T::Output: AsRef<[u8]>,
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    let mut stats = DriverStats::default();
    let mut buf = vec![0u8; input_buffer_size.max(1)];

    loop {
        let n = match source.read(&mut buf) {
            Ok(n) => n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(DriverError::Io(err)),
        };

        if n == 0 {
            log::debug!(
                "end of input after {} chunk(s), {} byte(s)",
                stats.chunks,
                stats.bytes_read
            );
            transform.stop();
            drain(transform, sink, true, &mut stats)?;
            break;
        }

        stats.chunks += 1;
        stats.bytes_read += n as u64;
        log::trace!("feeding chunk {} ({n} bytes)", stats.chunks);
        transform.feed(buf[..n].to_vec());

        if let Drained::Finished = drain(transform, sink, false, &mut stats)? {
            log::debug!("transform ended before the input did; stopping early");
            break;
        }
    }

    sink.flush()?;
    Ok(stats)
}

fn drain<T, W>(
    transform: &mut T,
    sink: &mut W,
    stopped: bool,
    stats: &mut DriverStats,
) -> DriverResult<Drained, T::Error>
where
    T: Transform + ?Sized,
    T::Output: AsRef<[u8]>,
    W: Write + ?Sized,
{
    loop {
        match transform.next(stopped) {
            Step::Output(value) => {
                let bytes = value.as_ref();
                sink.write_all(bytes)?;
                stats.outputs += 1;
                stats.bytes_written += bytes.len() as u64;
            }
            Step::NotReady if stopped => return Err(DriverError::Stalled),
            Step::NotReady => return Ok(Drained::NeedInput),
            Step::EndOfStream => return Ok(Drained::Finished),
            Step::Error(err) => return Err(DriverError::Transform(err)),
        }
    }
}

/// Runs `transform` from the file at `input` into the file at `output`.
///
/// The input is decompressed according to the configured [`Compression`];
/// the output is gzip-compressed when its name ends in `.gz`. Both files are
/// closed on every exit path.
pub fn run_paths<T, P, Q>(
    transform: &mut T,
    input: P,
    output: Q,
    options: &DriverOptions,
) -> DriverResult<DriverStats, T::Error>
where
    T: Transform<Input = Vec<u8>> + ?Sized,
    T::Output: AsRef<[u8]>,
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let input = input.as_ref();
    let output = output.as_ref();

    let mut source = open_input::<T::Error>(input, options.compression)?;
    let sink = create_output::<T::Error>(output)?;
    let mut sink = BufWriter::with_capacity(options.output_buffer_size, sink);

    log::info!("{} -> {}", input.display(), output.display());
    let stats = run(transform, &mut source, &mut sink, options.input_buffer_size)?;
    sink.into_inner()
        .map_err(|err| DriverError::Io(err.into_error()))?
        .finish()?;
    Ok(stats)
}

/// Opens a path as a stream.
fn open_input<E>(path: &Path, compression: Compression) -> DriverResult<Box<dyn Read>, E> {
    let compression = match compression {
        Compression::Auto => detect_compression_from_extension(path),
        other => other,
    };
    let file = File::open(path)?;

    match compression {
        Compression::None | Compression::Auto => Ok(Box::new(file)),
        Compression::Gzip => {
            #[cfg(feature = "gzip")]
            {
                Ok(Box::new(MultiGzDecoder::new(file)))
            }
            #[cfg(not(feature = "gzip"))]
            {
                drop(file);
                Err(DriverError::Config(
                    "gzip compression requested but the `gzip` feature is disabled".into(),
                ))
            }
        }
        Compression::Zstd => {
            #[cfg(feature = "zstd")]
            {
                Ok(Box::new(ZstdDecoder::new(file)?))
            }
            #[cfg(not(feature = "zstd"))]
            {
                drop(file);
                Err(DriverError::Config(
                    "zstd compression requested but the `zstd` feature is disabled".into(),
                ))
            }
        }
        Compression::Bzip2 => {
            #[cfg(feature = "bz2")]
            {
                Ok(Box::new(BzDecoder::new(file)))
            }
            #[cfg(not(feature = "bz2"))]
            {
                drop(file);
                Err(DriverError::Config(
                    "bzip2 compression requested but the `bz2` feature is disabled".into(),
                ))
            }
        }
    }
}

/// The output file, kept typed so a gzip trailer can be written and checked.
enum Output {
    Plain(File),
    #[cfg(feature = "gzip")]
    Gzip(GzEncoder<File>),
}

impl Output {
    /// Completes the file, writing the gzip trailer if any.
    fn finish(self) -> io::Result<()> {
        match self {
            Output::Plain(mut file) => file.flush(),
            #[cfg(feature = "gzip")]
            Output::Gzip(encoder) => encoder.finish()?.flush(),
        }
    }
}

impl Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Output::Plain(file) => file.write(buf),
            #[cfg(feature = "gzip")]
            Output::Gzip(encoder) => encoder.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Output::Plain(file) => file.flush(),
            #[cfg(feature = "gzip")]
            Output::Gzip(encoder) => encoder.flush(),
        }
    }
}

/// Creates the output file, gzip-encoded for `.gz` paths.
fn create_output<E>(path: &Path) -> DriverResult<Output, E> {
    let gzipped = path.extension().is_some_and(|ext| ext == "gz");

    #[cfg(feature = "gzip")]
    {
        let file = File::create(path)?;
        if gzipped {
            Ok(Output::Gzip(GzEncoder::new(file, GzCompression::fast())))
        } else {
            Ok(Output::Plain(file))
        }
    }

    #[cfg(not(feature = "gzip"))]
    {
        if gzipped {
            return Err(DriverError::Config(
                "enable the `gzip` feature to write gzip outputs".into(),
            ));
        }
        Ok(Output::Plain(File::create(path)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_compression_from_extension() {
        assert_eq!(
            detect_compression_from_extension(Path::new("reads.fq.gz")),
            Compression::Gzip
        );
        assert_eq!(
            detect_compression_from_extension(Path::new("reads.fq.zst")),
            Compression::Zstd
        );
        assert_eq!(
            detect_compression_from_extension(Path::new("reads.fq.bz2")),
            Compression::Bzip2
        );
        assert_eq!(
            detect_compression_from_extension(Path::new("reads.fq")),
            Compression::None
        );
    }

    #[test]
    fn buffer_sizes_are_at_least_one() {
        let options = DriverOptions::new()
            .input_buffer_size(0)
            .output_buffer_size(0);
        assert_eq!(options.input_buffer(), 1);
        assert_eq!(options.output_buffer(), 1);
    }

    #[cfg(feature = "gzip")]
    #[test]
    fn gzip_output_is_complete_after_finish() {
        use flate2::read::MultiGzDecoder;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bed.gz");

        let mut output = create_output::<()>(&path).unwrap();
        assert!(matches!(output, Output::Gzip(_)));
        output.write_all(b"chr1\t1\t2\n").unwrap();
        output.finish().unwrap();

        let mut text = String::new();
        MultiGzDecoder::new(File::open(&path).unwrap())
            .read_to_string(&mut text)
            .unwrap();
        assert_eq!(text, "chr1\t1\t2\n");
    }

    #[test]
    fn plain_output_for_other_extensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bed");

        let mut output = create_output::<()>(&path).unwrap();
        assert!(matches!(output, Output::Plain(_)));
        output.write_all(b"chr1\t1\t2\n").unwrap();
        output.finish().unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"chr1\t1\t2\n");
    }
}
