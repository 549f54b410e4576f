use std::collections::VecDeque;
use std::fmt;

use crate::transform::{Step, Transform};

/// Error reported by [`Pairs`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairError {
    /// Input ended with an unmatched item.
    PrematureEndOfInput {
        /// Pairs emitted before the unmatched item.
        pairs: usize,
    },
}

impl fmt::Display for PairError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PairError::PrematureEndOfInput { pairs } => write!(
                f,
                "premature end of input: unmatched item after {pairs} pair(s)"
            ),
        }
    }
}

impl std::error::Error for PairError {}

/// Zips consecutive items into pairs.
///
/// Items are matched purely by position: the first item fed is paired with
/// the second, the third with the fourth, and so on. An odd number of items
/// is an error once input ends.
///
/// # Example
///
/// ```
/// use biostream::pair::{PairError, Pairs};
/// use biostream::transform::{Step, Transform};
///
/// let mut pairs = Pairs::new();
/// pairs.feed("r1/1");
/// pairs.feed("r1/2");
/// pairs.feed("r2/1");
/// assert_eq!(pairs.next(false), Step::Output(("r1/1", "r1/2")));
/// assert_eq!(pairs.next(false), Step::NotReady);
/// pairs.stop();
/// assert_eq!(
///     pairs.next(true),
///     Step::Error(PairError::PrematureEndOfInput { pairs: 1 })
/// );
/// ```
#[derive(Debug, Clone)]
pub struct Pairs<T> {
    queue: VecDeque<(T, T)>,
    pending: Option<T>,
    emitted: usize,
    stopped: bool,
}

impl<T> Default for Pairs<T> {
    fn default() -> Self {
        Self {
            queue: VecDeque::new(),
            pending: None,
            emitted: 0,
            stopped: false,
        }
    }
}

impl<T> Pairs<T> {
    /// Creates an empty pairing stage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when an item is waiting for its mate.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl<T> Transform for Pairs<T> {
    type Input = T;
    type Output = (T, T);
    type Error = PairError;

    fn feed(&mut self, input: T) {
        match self.pending.take() {
            Some(first) => self.queue.push_back((first, input)),
            None => self.pending = Some(input),
        }
    }

    fn next(&mut self, stopped: bool) -> Step<(T, T), PairError> {
        if let Some(pair) = self.queue.pop_front() {
            self.emitted += 1;
            return Step::Output(pair);
        }

        if !(stopped || self.stopped) {
            Step::NotReady
        } else if self.pending.is_some() {
            Step::Error(PairError::PrematureEndOfInput {
                pairs: self.emitted,
            })
        } else {
            Step::EndOfStream
        }
    }

    fn stop(&mut self) {
        self.stopped = true;
    }
}
