//! `FibonacciSequence`: a bounded, lazily evaluated Fibonacci producer.
//!
//! Terms are computed one at a time from the two live recurrence values; the
//! sequence is never materialized. Exhaustion is terminal: a drained generator
//! keeps reporting [`Step::Exhausted`], and restarting means building a new one.

use core::iter::FusedIterator;

use num_traits::{CheckedAdd, One, Zero};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use super::{SequenceError, Step};
use crate::serial::{self, SerialError, Serializable};

/// Integer types a [`FibonacciSequence`] can produce.
///
/// Blanket-implemented for every `Copy` type with checked addition, which
/// covers all primitive integers.
pub trait Term: Copy + Zero + One + CheckedAdd {}

impl<T> Term for T where T: Copy + Zero + One + CheckedAdd {}

/// A finite producer of the first `limit` Fibonacci numbers.
///
/// At every observation point, [`current`](Self::current) is F(`emitted`),
/// with F(0) = 0 and F(1) = 1. The two live values are `None` once the term
/// they stand for no longer fits in `T`.
///
/// Mutation goes through `&mut self`; share a generator across threads only
/// behind your own synchronization.
///
/// # Example
///
/// ```rust
/// use lazykit::sequence::{FibonacciSequence, Step};
///
/// let mut fib = FibonacciSequence::<u64>::new(3);
/// assert_eq!(fib.produce_next(), Ok(Step::Yielded(0)));
/// assert_eq!(fib.produce_next(), Ok(Step::Yielded(1)));
/// assert_eq!(fib.produce_next(), Ok(Step::Yielded(1)));
/// assert_eq!(fib.produce_next(), Ok(Step::Exhausted));
///
/// let terms: Vec<u64> = FibonacciSequence::new(7).collect();
/// assert_eq!(terms, [0, 1, 1, 2, 3, 5, 8]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FibonacciSequence<T = u64> {
    limit: usize,
    emitted: usize,
    current: Option<T>,
    next: Option<T>,
}

impl<T: Term> FibonacciSequence<T> {
    /// Creates a generator for the first `limit` terms.
    ///
    /// A `limit` of zero yields an already exhausted generator.
    #[inline]
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            emitted: 0,
            current: Some(T::zero()),
            next: Some(T::one()),
        }
    }

    /// Creates a generator from a signed limit.
    ///
    /// # Errors
    ///
    /// Returns [`SequenceError::InvalidArgument`] if `limit` is negative or
    /// does not fit in `usize`.
    pub fn try_new(limit: i64) -> Result<Self, SequenceError> {
        usize::try_from(limit)
            .map(Self::new)
            .map_err(|_| SequenceError::InvalidArgument {
                value: i128::from(limit),
            })
    }

    /// Creates a generator that has already produced `emitted` terms.
    ///
    /// # Errors
    ///
    /// Returns [`SequenceError::InvalidArgument`] if `emitted > limit`, and
    /// [`SequenceError::Overflow`] if one of the skipped terms does not fit in `T`.
    pub fn resume(limit: usize, emitted: usize) -> Result<Self, SequenceError> {
        if emitted > limit {
            return Err(SequenceError::InvalidArgument {
                value: emitted as i128,
            });
        }

        let mut sequence = Self::new(limit);
        while sequence.emitted < emitted {
            sequence.produce_next()?;
        }
        Ok(sequence)
    }

    /// Produces the next term, or [`Step::Exhausted`] once `limit` terms are out.
    ///
    /// Exhaustion performs no mutation and is repeatable.
    ///
    /// # Errors
    ///
    /// Returns [`SequenceError::Overflow`] if the next term does not fit in `T`.
    /// The generator is left unchanged, so the error repeats on every call.
    pub fn produce_next(&mut self) -> Result<Step<T>, SequenceError> {
        if self.emitted >= self.limit {
            return Ok(Step::Exhausted);
        }

        let value = self.current.ok_or(SequenceError::Overflow {
            index: self.emitted,
        })?;
        let following = self.next.and_then(|next| value.checked_add(&next));

        self.current = self.next;
        self.next = following;
        self.emitted += 1;

        #[cfg(feature = "tracing")]
        {
            if self.emitted == self.limit {
                tracing::trace!(limit = self.limit, "fibonacci sequence exhausted");
            }
        }

        Ok(Step::Yielded(value))
    }

    /// The value the next call to [`produce_next`](Self::produce_next) would yield.
    ///
    /// `None` if that term does not fit in `T`. Exhaustion is not reflected here.
    #[inline]
    pub fn current(&self) -> Option<T> {
        self.current
    }
}

impl<T> FibonacciSequence<T> {
    /// Total number of terms this generator produces.
    #[inline]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Number of terms produced so far.
    #[inline]
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// Number of terms left before exhaustion.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.limit - self.emitted
    }

    /// Returns `true` once all `limit` terms have been produced.
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.emitted == self.limit
    }
}

impl<T: Term> Iterator for FibonacciSequence<T> {
    type Item = T;

    /// Yields terms until exhaustion, or until a term no longer fits in `T`.
    ///
    /// Use [`FibonacciSequence::produce_next`] to tell the two apart.
    #[inline]
    fn next(&mut self) -> Option<T> {
        self.produce_next().ok().and_then(Step::into_option)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.current.is_none() {
            return (0, Some(0));
        }
        let remaining = self.remaining();
        (remaining.min(1), Some(remaining))
    }
}

impl<T: Term> FusedIterator for FibonacciSequence<T> {}

/// Returns F(`n`), the zero-indexed `n`-th Fibonacci number.
///
/// Equivalent to draining `FibonacciSequence::new(n + 1)` and keeping the last
/// term, in constant memory.
///
/// # Errors
///
/// Returns [`SequenceError::Overflow`] if F(`n`) does not fit in `T`, and
/// [`SequenceError::InvalidArgument`] if `n + 1` does not fit in `usize`.
///
/// # Example
///
/// ```rust
/// use lazykit::sequence::nth;
///
/// assert_eq!(nth::<u64>(10), Ok(55));
/// assert!(nth::<u8>(14).is_err());
/// ```
pub fn nth<T: Term>(n: usize) -> Result<T, SequenceError> {
    let limit = n.checked_add(1).ok_or(SequenceError::InvalidArgument {
        value: n as i128,
    })?;

    let mut sequence = FibonacciSequence::<T>::new(limit);
    let mut last = T::zero();
    while let Step::Yielded(value) = sequence.produce_next()? {
        last = value;
    }
    Ok(last)
}

/// Serialized form of a generator. The live values are recomputed on resume.
#[derive(Serialize, Deserialize)]
struct Checkpoint {
    limit: usize,
    emitted: usize,
}

impl<T> Serialize for FibonacciSequence<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Checkpoint {
            limit: self.limit,
            emitted: self.emitted,
        }
        .serialize(serializer)
    }
}

impl<'de, T: Term> Deserialize<'de> for FibonacciSequence<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let Checkpoint { limit, emitted } = Checkpoint::deserialize(deserializer)?;
        Self::resume(limit, emitted).map_err(de::Error::custom)
    }
}

impl<T: Term> Serializable for FibonacciSequence<T> {
    fn to_text(&self) -> Result<String, SerialError> {
        serial::to_json(self)
    }

    fn from_text(data: &str) -> Result<Self, SerialError> {
        serial::from_json(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain<T: Term>(sequence: &mut FibonacciSequence<T>) -> Vec<T> {
        let mut out = Vec::new();
        while let Ok(Step::Yielded(value)) = sequence.produce_next() {
            out.push(value);
        }
        out
    }

    #[test]
    fn test_zero_limit_is_exhausted_immediately() {
        let mut fib = FibonacciSequence::<u64>::new(0);
        assert!(fib.is_exhausted());
        assert_eq!(fib.produce_next(), Ok(Step::Exhausted));
    }

    #[test]
    fn test_single_term() {
        let mut fib = FibonacciSequence::<u64>::new(1);
        assert_eq!(fib.produce_next(), Ok(Step::Yielded(0)));
        assert_eq!(fib.produce_next(), Ok(Step::Exhausted));
    }

    #[test]
    fn test_first_seven_terms() {
        let mut fib = FibonacciSequence::<u64>::new(7);
        assert_eq!(drain(&mut fib), vec![0, 1, 1, 2, 3, 5, 8]);
        assert_eq!(fib.emitted(), 7);
        assert_eq!(fib.remaining(), 0);
    }

    #[test]
    fn test_exhaustion_is_stable() {
        let mut fib = FibonacciSequence::<u32>::new(3);
        drain(&mut fib);
        let snapshot = fib.clone();
        for _ in 0..5 {
            assert_eq!(fib.produce_next(), Ok(Step::Exhausted));
        }
        assert_eq!(fib, snapshot);
    }

    #[test]
    fn test_current_tracks_emitted_index() {
        let mut fib = FibonacciSequence::<u64>::new(20);
        for i in 0..20 {
            assert_eq!(fib.current(), Some(nth::<u64>(i).unwrap()));
            fib.produce_next().unwrap();
        }
    }

    #[test]
    fn test_try_new_rejects_negative_limit() {
        assert_eq!(
            FibonacciSequence::<u64>::try_new(-1),
            Err(SequenceError::InvalidArgument { value: -1 })
        );
        assert_eq!(FibonacciSequence::<u64>::try_new(4).map(|f| f.limit()), Ok(4));
    }

    #[test]
    fn test_nth_known_values() {
        assert_eq!(nth::<u64>(0), Ok(0));
        assert_eq!(nth::<u64>(1), Ok(1));
        assert_eq!(nth::<u64>(10), Ok(55));
        assert_eq!(nth::<u64>(93), Ok(12_200_160_415_121_876_738));
    }

    #[test]
    fn test_nth_overflow() {
        assert_eq!(nth::<u64>(94), Err(SequenceError::Overflow { index: 94 }));
        assert_eq!(nth::<u8>(13), Ok(233));
        assert_eq!(nth::<u8>(14), Err(SequenceError::Overflow { index: 14 }));
        assert_eq!(
            nth::<u64>(usize::MAX),
            Err(SequenceError::InvalidArgument {
                value: usize::MAX as i128
            })
        );
    }

    #[test]
    fn test_overflow_is_stable_and_non_mutating() {
        let mut fib = FibonacciSequence::<u8>::new(20);
        let produced = drain(&mut fib);
        assert_eq!(produced.len(), 14);
        assert_eq!(produced.last(), Some(&233));

        let snapshot = fib.clone();
        for _ in 0..3 {
            assert_eq!(fib.produce_next(), Err(SequenceError::Overflow { index: 14 }));
        }
        assert_eq!(fib, snapshot);
        assert_eq!(fib.next(), None);
    }

    #[test]
    fn test_last_representable_term_is_produced() {
        // F(13) = 233 fits in u8 even though F(14) does not.
        let fib = FibonacciSequence::<u8>::new(14);
        assert_eq!(fib.last(), Some(233));
    }

    #[test]
    fn test_signed_terms() {
        let terms: Vec<i16> = FibonacciSequence::new(10).collect();
        assert_eq!(terms, vec![0, 1, 1, 2, 3, 5, 8, 13, 21, 34]);
    }

    #[test]
    fn test_size_hint() {
        let mut fib = FibonacciSequence::<u64>::new(5);
        assert_eq!(fib.size_hint(), (1, Some(5)));
        fib.by_ref().for_each(drop);
        assert_eq!(fib.size_hint(), (0, Some(0)));
    }

    #[test]
    fn test_resume_matches_partial_drain() {
        let mut drained = FibonacciSequence::<u64>::new(12);
        for _ in 0..5 {
            drained.produce_next().unwrap();
        }
        let resumed = FibonacciSequence::<u64>::resume(12, 5).unwrap();
        assert_eq!(resumed, drained);
    }

    #[test]
    fn test_resume_rejects_cursor_past_limit() {
        assert_eq!(
            FibonacciSequence::<u64>::resume(3, 4),
            Err(SequenceError::InvalidArgument { value: 4 })
        );
    }

    #[test]
    fn test_checkpoint_text_round_trip() {
        let mut fib = FibonacciSequence::<u64>::new(10);
        fib.by_ref().take(4).for_each(drop);

        let text = fib.to_text().unwrap();
        assert_eq!(text, r#"{"limit":10,"emitted":4}"#);

        let restored = FibonacciSequence::<u64>::from_text(&text).unwrap();
        assert_eq!(restored.collect::<Vec<_>>(), vec![3, 5, 8, 13, 21, 34]);
    }

    #[test]
    fn test_checkpoint_rejects_unrepresentable_prefix() {
        // u8 cannot hold F(14), so a cursor of 16 was never reachable.
        let err = FibonacciSequence::<u8>::from_text(r#"{"limit":20,"emitted":16}"#);
        assert!(matches!(err, Err(SerialError::Decode(_))));
    }
}
