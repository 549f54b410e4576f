use std::convert::Infallible;

use biostream::lines::{self, LineSplitter};
use biostream::pair::{PairError, Pairs};
use biostream::transform::{
    self, compose, on_error, on_output, process_all, ComposeError, ProcessError, Step, Transform,
};

/// Accepts lines until it sees `bad`, then fails.
struct RejectLine {
    bad: &'static [u8],
    seen: Vec<Vec<u8>>,
    failed: bool,
    stopped: bool,
}

impl RejectLine {
    fn new(bad: &'static [u8]) -> Self {
        Self {
            bad,
            seen: Vec::new(),
            failed: false,
            stopped: false,
        }
    }
}

impl Transform for RejectLine {
    type Input = Vec<u8>;
    type Output = Vec<u8>;
    type Error = String;

    fn feed(&mut self, input: Vec<u8>) {
        if input == self.bad {
            self.failed = true;
        }
        self.seen.push(input);
    }

    fn next(&mut self, stopped: bool) -> Step<Vec<u8>, String> {
        if self.failed {
            return Step::Error(format!("rejected {}", String::from_utf8_lossy(self.bad)));
        }
        if !self.seen.is_empty() {
            return Step::Output(self.seen.remove(0));
        }
        if stopped || self.stopped {
            Step::EndOfStream
        } else {
            Step::NotReady
        }
    }

    fn stop(&mut self) {
        self.stopped = true;
    }
}

/// Accepts lines but never produces anything, even once stopped.
struct Swallow;

impl Transform for Swallow {
    type Input = Vec<u8>;
    type Output = Vec<u8>;
    type Error = Infallible;

    fn feed(&mut self, _input: Vec<u8>) {}

    fn next(&mut self, _stopped: bool) -> Step<Vec<u8>, Infallible> {
        Step::NotReady
    }

    fn stop(&mut self) {}
}

#[test]
fn test_from_fn_emits_one_output_per_input() {
    let mut double = transform::from_fn(|n: u32| n * 2);
    double.feed(1);
    double.feed(2);
    assert_eq!(double.next(false), Step::Output(2));
    assert_eq!(double.next(false), Step::Output(4));
    assert_eq!(double.next(false), Step::NotReady);
    double.stop();
    assert_eq!(double.next(false), Step::EndOfStream);
}

#[test]
fn test_stop_is_idempotent() {
    let mut identity = transform::identity::<u8>();
    identity.feed(7);
    identity.stop();
    identity.stop();
    assert_eq!(identity.next(true), Step::Output(7));
    assert_eq!(identity.next(true), Step::EndOfStream);
}

#[test]
fn test_compose_matches_stagewise_application() {
    let input = b"chr1\t1\t2\nchr2\t3\t4\nchr3".to_vec();
    let chunks: Vec<Vec<u8>> = input.chunks(3).map(|c| c.to_vec()).collect();

    let composed = process_all(compose(LineSplitter::new(), lines::printer()), chunks).unwrap();

    let split = process_all(LineSplitter::new(), vec![input]).unwrap();
    let printed = process_all(lines::printer(), split).unwrap();
    assert_eq!(composed, printed);
    assert_eq!(composed.concat(), b"chr1\t1\t2\nchr2\t3\t4\nchr3\n");
}

#[test]
fn test_compose_right_error_wins_over_buffered_left() {
    let mut chain = compose(LineSplitter::new(), RejectLine::new(b"a"));
    chain.feed(b"a\nb\nc\n".to_vec());

    assert_eq!(
        chain.next(false),
        Step::Error(ComposeError::Right("rejected a".to_string()))
    );
    // the left stage was pulled exactly once
    assert_eq!(chain.left().buffer().queued(), 2);
}

#[test]
fn test_compose_surfaces_left_error() {
    let mut chain = compose(Pairs::<u8>::new(), transform::identity::<(u8, u8)>());
    chain.feed(1);
    chain.feed(2);
    chain.feed(3);
    chain.stop();

    assert_eq!(chain.next(true), Step::Output((1, 2)));
    assert_eq!(
        chain.next(true),
        Step::Error(ComposeError::Left(PairError::PrematureEndOfInput { pairs: 1 }))
    );
}

#[test]
fn test_compose_stops_right_when_left_ends() {
    let mut chain = compose(transform::identity::<u8>(), Pairs::new());
    chain.feed(1);
    chain.feed(2);
    chain.feed(3);
    chain.feed(4);
    assert_eq!(chain.next(false), Step::Output((1, 2)));
    assert_eq!(chain.next(false), Step::Output((3, 4)));
    assert_eq!(chain.next(false), Step::NotReady);

    chain.stop();
    assert_eq!(chain.next(true), Step::EndOfStream);
}

#[test]
fn test_compose_not_ready_until_fed() {
    let mut chain = compose(LineSplitter::new(), lines::printer());
    assert_eq!(chain.next(false), Step::NotReady);
    chain.feed(b"partial".to_vec());
    assert_eq!(chain.next(false), Step::NotReady);
    chain.stop();
    assert_eq!(chain.next(true), Step::Output(b"partial\n".to_vec()));
    assert_eq!(chain.next(true), Step::EndOfStream);
}

#[derive(Debug, PartialEq)]
enum Flat {
    Pairing(usize),
}

#[test]
fn test_on_error_flattens_nested_errors() {
    let chain = compose(
        compose(LineSplitter::new(), Pairs::new()),
        transform::identity::<(Vec<u8>, Vec<u8>)>(),
    );
    let flat = on_error(
        chain,
        |err: ComposeError<ComposeError<Infallible, PairError>, Infallible>| match err {
            ComposeError::Left(ComposeError::Left(never)) => match never {},
            ComposeError::Left(ComposeError::Right(PairError::PrematureEndOfInput { pairs })) => {
                Flat::Pairing(pairs)
            }
            ComposeError::Right(never) => match never {},
        },
    );

    let result = process_all(flat, vec![b"r1\nr2\nr3\n".to_vec()]);
    assert_eq!(result, Err(ProcessError::Transform(Flat::Pairing(1))));
}

#[test]
fn test_on_output_maps_values() {
    let lengths = on_output(LineSplitter::new(), |line: Vec<u8>| line.len());
    let result = process_all(lengths, vec![b"ACGT\nAC\n".to_vec()]).unwrap();
    assert_eq!(result, vec![4, 2]);
}

#[test]
fn test_boxed_transform_is_a_transform() {
    let mut boxed: Box<dyn Transform<Input = Vec<u8>, Output = Vec<u8>, Error = Infallible>> =
        Box::new(LineSplitter::new());
    boxed.feed(b"x\n".to_vec());
    assert_eq!(boxed.next(false), Step::Output(b"x".to_vec()));
}

#[test]
fn test_step_helpers() {
    let step: Step<u8, &str> = Step::Output(1);
    assert_eq!(step.map_output(|n| n + 1), Step::Output(2));
    let step: Step<u8, &str> = Step::Error("bad");
    assert!(step.is_terminal());
    assert_eq!(step.map_error(str::len), Step::Error(3));
    assert!(!Step::<u8, ()>::NotReady.is_terminal());
}

#[test]
fn test_process_all_reports_stalled_pipeline() {
    let result = process_all(compose(LineSplitter::new(), Swallow), vec![b"a\nb\n".to_vec()]);
    assert_eq!(result, Err(ProcessError::Stalled));
    assert_eq!(
        ProcessError::<Infallible>::Stalled.to_string(),
        "transform requested more input after end of input"
    );
}
