//! Bounded, lazily evaluated integer sequences.
//!
//! A generator is an explicit state machine: each call to `produce_next`
//! either yields a value or reports that the sequence has ended. The end of a
//! sequence is an ordinary [`Step`] rather than an error, so callers can tell
//! "no more terms" apart from a real failure such as arithmetic overflow.

mod error;
pub mod fibonacci;

pub use error::SequenceError;
pub use fibonacci::{nth, FibonacciSequence, Term};

/// The outcome of asking a bounded generator for its next value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step<T> {
    /// The generator produced a value.
    Yielded(T),
    /// The generator has produced all of its values. Terminal and stable.
    Exhausted,
}

impl<T> Step<T> {
    /// Returns `true` for [`Step::Exhausted`].
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted)
    }

    /// Converts into an `Option`, mapping [`Step::Exhausted`] to `None`.
    #[inline]
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Yielded(value) => Some(value),
            Self::Exhausted => None,
        }
    }
}

impl<T> From<Step<T>> for Option<T> {
    fn from(step: Step<T>) -> Self {
        step.into_option()
    }
}
