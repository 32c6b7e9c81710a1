//! # `lazykit` - Lazy Sequences and Once-Only Construction
//!
//! A small toolkit of independent, leaf-level utilities built around laziness:
//! values are produced or constructed only when first asked for.
//!
//! ## Components
//!
//! 1. **Bounded sequences** ([`sequence`]):
//!    - [`FibonacciSequence`] produces the first `limit` Fibonacci numbers one
//!      term at a time, with an explicit [`Step::Exhausted`] end signal.
//!    - [`sequence::nth`] returns a single term in constant memory.
//!    - Terms are generic over primitive integers. Overflow is never wrapped:
//!      it is reported by `produce_next`, and the iterator stops.
//!
//! 2. **Once-only construction** ([`concurrency`]):
//!    - [`LazySingleton`] constructs a shared instance at most once across
//!      racing threads using double-checked locking.
//!    - The [`Singleton`] trait and [`singleton!`] macro give a type a single
//!      process-wide instance.
//!
//! 3. **Statistics** ([`stats`]): sample [`covariance`](stats::covariance).
//!
//! 4. **Text serialization** ([`serial`]): the [`Serializable`] interface,
//!    implemented by [`FibonacciSequence`] so a generator can be checkpointed
//!    and resumed.
//!
//! ## Guarantees
//!
//! - A generator's current value is always F(`emitted`); exhaustion and
//!   overflow leave its state untouched.
//! - A singleton's instance moves from unset to set exactly once. Failed or
//!   panicking construction publishes nothing and may be retried.
//! - No failure is logged in place of being returned. With the `tracing`
//!   feature enabled, construction and exhaustion emit diagnostic events.
//!
//! ## Example
//!
//! ```rust
//! use lazykit::{FibonacciSequence, LazySingleton, Step};
//!
//! let mut fib = FibonacciSequence::<u64>::new(2);
//! assert_eq!(fib.produce_next(), Ok(Step::Yielded(0)));
//! assert_eq!(fib.produce_next(), Ok(Step::Yielded(1)));
//! assert_eq!(fib.produce_next(), Ok(Step::Exhausted));
//!
//! static TABLE: LazySingleton<Vec<u64>> = LazySingleton::new();
//! let table = TABLE.get_or_init(|| FibonacciSequence::new(10).collect());
//! assert_eq!(table[9], 34);
//! ```

#![warn(missing_docs, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod concurrency;
pub mod sequence;
pub mod serial;
pub mod stats;

pub use concurrency::{LazySingleton, Singleton};
pub use sequence::{FibonacciSequence, SequenceError, Step};
pub use serial::{SerialError, Serializable};

// Compile-time layout checks
const _: () = {
    use core::mem;

    // `Step` adds at most one word of tag to the payload.
    assert!(mem::size_of::<Step<u64>>() <= mem::size_of::<u64>() * 2);

    // Cursor, limit and two optional live values; nothing heap-allocated.
    assert!(
        mem::size_of::<FibonacciSequence<u64>>()
            <= mem::size_of::<usize>() * 2 + mem::size_of::<Option<u64>>() * 2
    );

    // The published pointer is cache-padded.
    assert!(mem::align_of::<LazySingleton<u64>>() >= 16);
};
