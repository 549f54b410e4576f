use std::collections::VecDeque;
use std::convert::Infallible;
use std::fmt;
use std::marker::PhantomData;

/// The result of a single call to [`Transform::next`].
///
/// `EndOfStream` and `Error` are terminal: once a transform returned either of
/// them, callers must not `feed` it or poll it again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step<T, E> {
    /// One unit of output.
    Output(T),
    /// More input is required before output can be produced.
    NotReady,
    /// No more output will ever be produced.
    EndOfStream,
    /// The transform failed.
    Error(E),
}

impl<T, E> Step<T, E> {
    /// Maps the output value, leaving every other variant untouched.
    #[inline]
    pub fn map_output<U, F: FnOnce(T) -> U>(self, f: F) -> Step<U, E> {
        match self {
            Step::Output(value) => Step::Output(f(value)),
            Step::NotReady => Step::NotReady,
            Step::EndOfStream => Step::EndOfStream,
            Step::Error(err) => Step::Error(err),
        }
    }

    /// Maps the error value, leaving every other variant untouched.
    #[inline]
    pub fn map_error<G, F: FnOnce(E) -> G>(self, f: F) -> Step<T, G> {
        match self {
            Step::Output(value) => Step::Output(value),
            Step::NotReady => Step::NotReady,
            Step::EndOfStream => Step::EndOfStream,
            Step::Error(err) => Step::Error(f(err)),
        }
    }

    /// Returns `true` for `EndOfStream` and `Error`.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Step::EndOfStream | Step::Error(_))
    }
}

/// A push/pull streaming state machine.
///
/// Input is pushed with [`feed`](Transform::feed), output is pulled with
/// [`next`](Transform::next) and the end of input is declared once with
/// [`stop`](Transform::stop). Given the same inputs and the same point at
/// which `stop` is called, the sequence of `next` results does not depend on
/// how the input was chunked.
///
/// # Example
///
/// ```
/// use biostream::transform::{self, Step, Transform};
///
/// let mut upper = transform::from_fn(|s: String| s.to_uppercase());
/// upper.feed("chr1".to_string());
/// assert_eq!(upper.next(false), Step::Output("CHR1".to_string()));
/// assert_eq!(upper.next(false), Step::NotReady);
/// upper.stop();
/// assert_eq!(upper.next(true), Step::EndOfStream);
/// ```
pub trait Transform {
    /// Items accepted by `feed`.
    type Input;
    /// Items produced by `next`.
    type Output;
    /// Error reported by `next`.
    type Error;

    /// Appends input to the internal state. Never produces output.
    fn feed(&mut self, input: Self::Input);

    /// Attempts to produce one unit of output.
    ///
    /// With `stopped == false` a `NotReady` result asks the caller to feed
    /// more input. With `stopped == true` no more input will come, and the
    /// transform drains its buffers and resolves any leftovers according to
    /// its own end-of-input policy.
    fn next(&mut self, stopped: bool) -> Step<Self::Output, Self::Error>;

    /// Declares that `feed` will not be called again.
    fn stop(&mut self);
}

impl<T: Transform + ?Sized> Transform for Box<T> {
    type Input = T::Input;
    type Output = T::Output;
    type Error = T::Error;

    #[inline]
    fn feed(&mut self, input: Self::Input) {
        (**self).feed(input)
    }

    #[inline]
    fn next(&mut self, stopped: bool) -> Step<Self::Output, Self::Error> {
        (**self).next(stopped)
    }

    #[inline]
    fn stop(&mut self) {
        (**self).stop()
    }
}

impl<T: Transform + ?Sized> Transform for &mut T {
    type Input = T::Input;
    type Output = T::Output;
    type Error = T::Error;

    #[inline]
    fn feed(&mut self, input: Self::Input) {
        (**self).feed(input)
    }

    #[inline]
    fn next(&mut self, stopped: bool) -> Step<Self::Output, Self::Error> {
        (**self).next(stopped)
    }

    #[inline]
    fn stop(&mut self) {
        (**self).stop()
    }
}

/// A stateless leaf transform producing exactly one output per input.
///
/// Created with [`from_fn`] or [`identity`].
pub struct Map<I, O, F> {
    queue: VecDeque<O>,
    f: F,
    stopped: bool,
    _marker: PhantomData<fn(I)>,
}

impl<I, O, F> fmt::Debug for Map<I, O, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Map")
            .field("queued", &self.queue.len())
            .field("stopped", &self.stopped)
            .finish()
    }
}

/// Builds a leaf transform applying `f` to every input.
pub fn from_fn<I, O, F>(f: F) -> Map<I, O, F>
where
    F: FnMut(I) -> O,
{
    Map {
        queue: VecDeque::new(),
        f,
        stopped: false,
        _marker: PhantomData,
    }
}

/// Builds a leaf transform forwarding every input unchanged.
pub fn identity<T>() -> Map<T, T, fn(T) -> T> {
    from_fn(std::convert::identity::<T> as fn(T) -> T)
}

impl<I, O, F> Transform for Map<I, O, F>
where
    F: FnMut(I) -> O,
{
    type Input = I;
    type Output = O;
    type Error = Infallible;

    fn feed(&mut self, input: I) {
        let output = (self.f)(input);
        self.queue.push_back(output);
    }

    fn next(&mut self, stopped: bool) -> Step<O, Infallible> {
        match self.queue.pop_front() {
            Some(output) => Step::Output(output),
            None if stopped || self.stopped => Step::EndOfStream,
            None => Step::NotReady,
        }
    }

    fn stop(&mut self) {
        self.stopped = true;
    }
}

/// Error produced by a [`Compose`]d transform, tagged by the side that failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposeError<L, R> {
    /// The upstream (left) stage failed.
    Left(L),
    /// The downstream (right) stage failed.
    Right(R),
}

impl<L: fmt::Display, R: fmt::Display> fmt::Display for ComposeError<L, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComposeError::Left(err) => err.fmt(f),
            ComposeError::Right(err) => err.fmt(f),
        }
    }
}

impl<L, R> std::error::Error for ComposeError<L, R>
where
    L: std::error::Error + 'static,
    R: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ComposeError::Left(err) => Some(err),
            ComposeError::Right(err) => Some(err),
        }
    }
}

/// Two transforms chained end to end. Created with [`compose`].
#[derive(Debug)]
pub struct Compose<L, R> {
    left: L,
    right: R,
    left_ended: bool,
}

/// Chains `left` into `right`: every output of `left` is fed to `right`.
///
/// The right stage is always polled first so that output it already buffered
/// leaves the pipeline before anything more is pulled from the left. An error
/// from the right stage is reported as soon as it is seen, even when the left
/// stage still holds data.
///
/// # Example
///
/// ```
/// use biostream::transform::{self, compose, Step, Transform};
///
/// let mut chain = compose(
///     transform::from_fn(|n: u32| n + 1),
///     transform::from_fn(|n: u32| n * 10),
/// );
/// chain.feed(1);
/// assert_eq!(chain.next(false), Step::Output(20));
/// chain.stop();
/// assert_eq!(chain.next(true), Step::EndOfStream);
/// ```
pub fn compose<L, R>(left: L, right: R) -> Compose<L, R>
where
    L: Transform,
    R: Transform<Input = L::Output>,
{
    Compose {
        left,
        right,
        left_ended: false,
    }
}

impl<L, R> Compose<L, R> {
    /// Returns the upstream stage.
    pub fn left(&self) -> &L {
        &self.left
    }

    /// Returns the downstream stage.
    pub fn right(&self) -> &R {
        &self.right
    }
}

impl<L, R> Transform for Compose<L, R>
where
    L: Transform,
    R: Transform<Input = L::Output>,
{
    type Input = L::Input;
    type Output = R::Output;
    type Error = ComposeError<L::Error, R::Error>;

    fn feed(&mut self, input: Self::Input) {
        self.left.feed(input);
    }

    fn next(&mut self, stopped: bool) -> Step<Self::Output, Self::Error> {
        loop {
            match self.right.next(self.left_ended) {
                Step::Output(value) => return Step::Output(value),
                Step::Error(err) => return Step::Error(ComposeError::Right(err)),
                Step::EndOfStream => return Step::EndOfStream,
                Step::NotReady => {}
            }

            // a stopped right stage must not ask for more; the left is done
            if self.left_ended {
                return Step::NotReady;
            }

            match self.left.next(stopped) {
                Step::Output(value) => self.right.feed(value),
                Step::NotReady => return Step::NotReady,
                Step::EndOfStream => {
                    self.left_ended = true;
                    self.right.stop();
                }
                Step::Error(err) => return Step::Error(ComposeError::Left(err)),
            }
        }
    }

    fn stop(&mut self) {
        self.left.stop();
    }
}

/// A transform whose errors are collapsed by a classifier. Created with
/// [`on_error`].
pub struct OnError<T, F> {
    inner: T,
    classify: F,
}

impl<T: fmt::Debug, F> fmt::Debug for OnError<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnError")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

/// Maps every error of `transform` through `classify`.
///
/// This is where a composition's nested `ComposeError` is flattened into the
/// single error type a pipeline exposes. `classify` must be total over the
/// errors reachable at this site.
///
/// # Example
///
/// ```
/// use std::convert::Infallible;
///
/// use biostream::pair::{PairError, Pairs};
/// use biostream::transform::{self, compose, on_error, ComposeError, Step, Transform};
///
/// let mut pipeline = on_error(
///     compose(transform::identity::<u8>(), Pairs::new()),
///     |err: ComposeError<Infallible, PairError>| match err {
///         ComposeError::Left(never) => match never {},
///         ComposeError::Right(err) => err.to_string(),
///     },
/// );
/// pipeline.feed(1);
/// pipeline.stop();
/// assert!(matches!(pipeline.next(true), Step::Error(_)));
/// ```
pub fn on_error<T, F, E>(transform: T, classify: F) -> OnError<T, F>
where
    T: Transform,
    F: FnMut(T::Error) -> E,
{
    OnError {
        inner: transform,
        classify,
    }
}

impl<T, F, E> Transform for OnError<T, F>
where
    T: Transform,
    F: FnMut(T::Error) -> E,
{
    type Input = T::Input;
    type Output = T::Output;
    type Error = E;

    #[inline]
    fn feed(&mut self, input: Self::Input) {
        self.inner.feed(input);
    }

    #[inline]
    fn next(&mut self, stopped: bool) -> Step<Self::Output, E> {
        self.inner.next(stopped).map_error(&mut self.classify)
    }

    #[inline]
    fn stop(&mut self) {
        self.inner.stop();
    }
}

/// A transform whose outputs are mapped by a function. Created with
/// [`on_output`].
pub struct OnOutput<T, F> {
    inner: T,
    f: F,
}

impl<T: fmt::Debug, F> fmt::Debug for OnOutput<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnOutput")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

/// Maps every output of `transform` through `f`.
pub fn on_output<T, F, O>(transform: T, f: F) -> OnOutput<T, F>
where
    T: Transform,
    F: FnMut(T::Output) -> O,
{
    OnOutput { inner: transform, f }
}

impl<T, F, O> Transform for OnOutput<T, F>
where
    T: Transform,
    F: FnMut(T::Output) -> O,
{
    type Input = T::Input;
    type Output = O;
    type Error = T::Error;

    #[inline]
    fn feed(&mut self, input: Self::Input) {
        self.inner.feed(input);
    }

    #[inline]
    fn next(&mut self, stopped: bool) -> Step<O, Self::Error> {
        self.inner.next(stopped).map_output(&mut self.f)
    }

    #[inline]
    fn stop(&mut self) {
        self.inner.stop();
    }
}

/// Error returned by [`process_all`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessError<E> {
    /// The transform reported an error.
    Transform(E),
    /// The transform asked for more input after it was stopped.
    Stalled,
}

impl<E> ProcessError<E> {
    /// Returns the transform's error, if that is what ended the run.
    pub fn into_transform(self) -> Option<E> {
        match self {
            ProcessError::Transform(err) => Some(err),
            ProcessError::Stalled => None,
        }
    }
}

impl<E: fmt::Display> fmt::Display for ProcessError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessError::Transform(err) => err.fmt(f),
            ProcessError::Stalled => {
                f.write_str("transform requested more input after end of input")
            }
        }
    }
}

impl<E> std::error::Error for ProcessError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProcessError::Transform(err) => Some(err),
            ProcessError::Stalled => None,
        }
    }
}

/// Runs a transform over in-memory inputs.
///
/// Each input is fed and followed by a drain with `next(false)`; after the
/// last input the transform is stopped and drained with `next(true)`. Returns
/// every output in order, or the first error. A transform still answering
/// `NotReady` once stopped yields [`ProcessError::Stalled`], as in
/// [`driver::run`](crate::driver::run).
///
/// # Example
///
/// ```
/// use biostream::lines::LineSplitter;
/// use biostream::transform::process_all;
///
/// let lines = process_all(
///     LineSplitter::new(),
///     vec![b"chr1\t1".to_vec(), b"0\t20\nchr2".to_vec()],
/// )
/// .unwrap();
/// assert_eq!(lines, vec![b"chr1\t10\t20".to_vec(), b"chr2".to_vec()]);
/// ```
pub fn process_all<T, I>(
    mut transform: T,
    inputs: I,
) -> Result<Vec<T::Output>, ProcessError<T::Error>>
where
    T: Transform,
    I: IntoIterator<Item = T::Input>,
{
    let mut outputs = Vec::new();
    for input in inputs {
        transform.feed(input);
        loop {
            match transform.next(false) {
                Step::Output(value) => outputs.push(value),
                Step::NotReady => break,
                Step::EndOfStream => return Ok(outputs),
                Step::Error(err) => return Err(ProcessError::Transform(err)),
            }
        }
    }

    transform.stop();
    loop {
        match transform.next(true) {
            Step::Output(value) => outputs.push(value),
            Step::EndOfStream => return Ok(outputs),
            Step::NotReady => return Err(ProcessError::Stalled),
            Step::Error(err) => return Err(ProcessError::Transform(err)),
        }
    }
}
