use std::collections::VecDeque;
use std::io::{self, Read, Write};

use biostream::driver::{run, run_paths, Compression, DriverError, DriverOptions};
use biostream::lines::{self, LineSplitter};
use biostream::pipeline;
use biostream::transform::{self, compose, Step, Transform};

/// A byte source returning a fixed sequence of reads.
struct Scripted {
    reads: VecDeque<io::Result<Vec<u8>>>,
    calls: usize,
}

impl Scripted {
    fn new<I: IntoIterator<Item = io::Result<Vec<u8>>>>(reads: I) -> Self {
        Self {
            reads: reads.into_iter().collect(),
            calls: 0,
        }
    }

    fn chunks(chunks: &[&[u8]]) -> Self {
        Self::new(chunks.iter().map(|c| Ok(c.to_vec())))
    }
}

impl Read for Scripted {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.calls += 1;
        match self.reads.pop_front() {
            Some(Ok(chunk)) => {
                assert!(chunk.len() <= buf.len(), "scripted chunk larger than buffer");
                buf[..chunk.len()].copy_from_slice(&chunk);
                Ok(chunk.len())
            }
            Some(Err(err)) => Err(err),
            None => Ok(0),
        }
    }
}

/// Fails on the second poll and records every call made after that.
#[derive(Default)]
struct FailOnSecondPoll {
    feeds: usize,
    polls: usize,
    failed: bool,
    calls_after_error: usize,
}

impl Transform for FailOnSecondPoll {
    type Input = Vec<u8>;
    type Output = Vec<u8>;
    type Error = &'static str;

    fn feed(&mut self, _input: Vec<u8>) {
        if self.failed {
            self.calls_after_error += 1;
        }
        self.feeds += 1;
    }

    fn next(&mut self, _stopped: bool) -> Step<Vec<u8>, &'static str> {
        if self.failed {
            self.calls_after_error += 1;
        }
        self.polls += 1;
        if self.polls == 2 {
            self.failed = true;
            return Step::Error("boom");
        }
        Step::NotReady
    }

    fn stop(&mut self) {
        if self.failed {
            self.calls_after_error += 1;
        }
    }
}

/// Never finishes, even when stopped.
struct NeverEnds;

impl Transform for NeverEnds {
    type Input = Vec<u8>;
    type Output = Vec<u8>;
    type Error = ();

    fn feed(&mut self, _input: Vec<u8>) {}

    fn next(&mut self, _stopped: bool) -> Step<Vec<u8>, ()> {
        Step::NotReady
    }

    fn stop(&mut self) {}
}

#[test]
fn test_identity_copies_source_exactly_once() {
    let mut source = Scripted::chunks(&[b"AB", b""]);
    let mut identity = transform::identity::<Vec<u8>>();
    let mut sink = Vec::new();

    let stats = run(&mut identity, &mut source, &mut sink, 16).unwrap();
    assert_eq!(sink, b"AB");
    assert_eq!(stats.chunks, 1);
    assert_eq!(stats.bytes_read, 2);
    assert_eq!(stats.outputs, 1);
    assert_eq!(stats.bytes_written, 2);
    assert_eq!(source.calls, 2);
}

#[test]
fn test_small_buffers_do_not_change_output() {
    let input = b"chr1\t10\t20\nchr2\t30\t40\nchr3\t50\t60".to_vec();
    let mut expected = Vec::new();
    run(
        &mut compose(LineSplitter::new(), lines::printer()),
        &mut &input[..],
        &mut expected,
        1024,
    )
    .unwrap();

    for size in 1..8 {
        let mut sink = Vec::new();
        run(
            &mut compose(LineSplitter::new(), lines::printer()),
            &mut &input[..],
            &mut sink,
            size,
        )
        .unwrap();
        assert_eq!(sink, expected, "buffer size {size}");
    }
    assert_eq!(expected, b"chr1\t10\t20\nchr2\t30\t40\nchr3\t50\t60\n");
}

#[test]
fn test_error_short_circuits_the_run() {
    let mut source = Scripted::chunks(&[b"a", b"b", b"c", b"d"]);
    let mut failing = FailOnSecondPoll::default();
    let mut sink = Vec::new();

    let err = run(&mut failing, &mut source, &mut sink, 4).unwrap_err();
    assert!(matches!(err, DriverError::Transform("boom")));
    assert_eq!(failing.feeds, 2);
    assert_eq!(failing.polls, 2);
    assert_eq!(failing.calls_after_error, 0);
    assert_eq!(source.calls, 2);
    assert!(sink.is_empty());
}

#[test]
fn test_outputs_before_error_are_written() {
    let mut chain = pipeline::fastq(None);
    let mut sink = Vec::new();
    let input = b"@r1\nAC\n+\nII\nr2\nAC\n+\nII\n";

    let err = run(&mut chain, &mut &input[..], &mut sink, 5).unwrap_err();
    assert!(matches!(err, DriverError::Transform(_)));
    assert_eq!(sink, b"@r1\nAC\n+\nII\n");
}

#[test]
fn test_read_errors_are_reported() {
    let mut source = Scripted::new(vec![
        Ok(b"x\n".to_vec()),
        Err(io::Error::new(io::ErrorKind::Other, "disk on fire")),
    ]);
    let mut sink = Vec::new();
    let err = run(&mut LineSplitter::new(), &mut source, &mut sink, 8).unwrap_err();
    assert!(matches!(err, DriverError::Io(_)));
    assert_eq!(sink, b"x");
}

#[test]
fn test_interrupted_reads_are_retried() {
    let mut source = Scripted::new(vec![
        Err(io::Error::new(io::ErrorKind::Interrupted, "signal")),
        Ok(b"x\n".to_vec()),
    ]);
    let mut sink = Vec::new();
    run(&mut compose(LineSplitter::new(), lines::printer()), &mut source, &mut sink, 8).unwrap();
    assert_eq!(sink, b"x\n");
}

#[test]
fn test_stalled_transform_is_an_error() {
    let mut sink = Vec::new();
    let err = run(&mut NeverEnds, &mut &b"abc"[..], &mut sink, 8).unwrap_err();
    assert!(matches!(err, DriverError::Stalled));
}

#[test]
fn test_run_paths_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("genes.bed");
    let output = dir.path().join("genes.out.bed");
    std::fs::File::create(&input)
        .unwrap()
        .write_all(b"track name=genes\nchr1\t10\t20\tgeneA\t5\t+\nchr2\t1\t2")
        .unwrap();

    let mut bed = pipeline::bed(Some(input.display().to_string()));
    let options = DriverOptions::new()
        .input_buffer_size(7)
        .output_buffer_size(3)
        .compression(Compression::None);
    let stats = run_paths(&mut bed, &input, &output, &options).unwrap();

    assert_eq!(stats.outputs, 2);
    let written = std::fs::read(&output).unwrap();
    assert_eq!(written, b"chr1\t10\t20\tgeneA\t5\t+\nchr2\t1\t2\n");
}

#[test]
fn test_run_paths_missing_input() {
    let dir = tempfile::tempdir().unwrap();
    let mut bed = pipeline::bed(None);
    let err = run_paths(
        &mut bed,
        dir.path().join("missing.bed"),
        dir.path().join("out.bed"),
        &DriverOptions::new(),
    )
    .unwrap_err();
    assert!(matches!(err, DriverError::Io(_)));
}

#[cfg(feature = "gzip")]
#[test]
fn test_run_paths_gzip_round_trip() {
    use flate2::read::MultiGzDecoder;
    use flate2::write::GzEncoder;

    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("reads.fq.gz");
    let output = dir.path().join("reads.fa.gz");

    let mut encoder = GzEncoder::new(
        std::fs::File::create(&input).unwrap(),
        flate2::Compression::default(),
    );
    encoder.write_all(b"@r1 lane=1\nACGTAC\n+\nIIIIII\n").unwrap();
    encoder.finish().unwrap();

    let mut fasta = pipeline::fastq_to_fasta(None, Some(4));
    run_paths(&mut fasta, &input, &output, &DriverOptions::new()).unwrap();

    let mut text = String::new();
    MultiGzDecoder::new(std::fs::File::open(&output).unwrap())
        .read_to_string(&mut text)
        .unwrap();
    assert_eq!(text, ">r1 lane=1\nACGT\nAC\n");
}

#[cfg(not(feature = "gzip"))]
#[test]
fn test_gzip_requires_feature() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("reads.fq.gz");
    std::fs::write(&input, b"").unwrap();
    let mut fastq = pipeline::fastq(None);
    let err = run_paths(
        &mut fastq,
        &input,
        dir.path().join("out.fq"),
        &DriverOptions::new(),
    )
    .unwrap_err();
    assert!(matches!(err, DriverError::Config(_)));
}
