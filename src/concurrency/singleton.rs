//! `LazySingleton`: exactly-once construction of a shared instance.
//!
//! Uses double-checked locking: readers take an acquire load on the published
//! pointer and only fall back to the guard while the instance is still unset.

use core::marker::PhantomData;
use core::ptr;
use core::sync::atomic::{AtomicPtr, Ordering};
use std::convert::Infallible;
use std::sync::{Mutex, PoisonError};

use crossbeam_utils::CachePadded;

/// A holder that constructs its value at most once, on first access.
///
/// Every caller, from any thread, receives a reference to the same instance.
/// Construction runs under a mutex; once published, access is a single
/// acquire load with no locking.
///
/// The holder is usable in a `static`, which gives the instance process
/// lifetime. A non-`static` holder drops its instance when it is dropped.
///
/// # Example
///
/// ```rust
/// use lazykit::concurrency::LazySingleton;
///
/// static GREETING: LazySingleton<String> = LazySingleton::new();
///
/// let a = GREETING.get_or_init(|| "hello".to_string());
/// let b = GREETING.get_or_init(|| unreachable!());
/// assert!(std::ptr::eq(a, b));
/// ```
pub struct LazySingleton<T> {
    instance: CachePadded<AtomicPtr<T>>,
    guard: Mutex<()>,
    _owns: PhantomData<Box<T>>,
}

// SAFETY: the instance is created on one thread and borrowed (and possibly
// dropped) on others, which is sound when `T: Send + Sync`.
unsafe impl<T: Send + Sync> Sync for LazySingleton<T> {}

impl<T> LazySingleton<T> {
    /// Creates an empty holder.
    #[inline]
    pub const fn new() -> Self {
        Self {
            instance: CachePadded::new(AtomicPtr::new(ptr::null_mut())),
            guard: Mutex::new(()),
            _owns: PhantomData,
        }
    }

    /// Returns the instance if it has been published, without blocking.
    #[inline]
    pub fn get(&self) -> Option<&T> {
        let raw = self.instance.load(Ordering::Acquire);
        // SAFETY: a non-null pointer was produced by `Box::into_raw` and is
        // only freed in `Drop`, which cannot run while `self` is borrowed.
        unsafe { raw.as_ref() }
    }

    /// Returns `true` once the instance has been published.
    #[inline]
    pub fn is_initialized(&self) -> bool {
        !self.instance.load(Ordering::Acquire).is_null()
    }

    /// Returns the instance, constructing it with `f` on first access.
    ///
    /// If several threads race here, exactly one runs `f`; the others wait
    /// on the guard and then observe the published instance.
    pub fn get_or_init<F>(&self, f: F) -> &T
    where
        F: FnOnce() -> T,
    {
        match self.get_or_try_init(|| Ok::<T, Infallible>(f())) {
            Ok(instance) => instance,
            Err(never) => match never {},
        }
    }

    /// Returns the instance, constructing it with the fallible `f` on first access.
    ///
    /// # Errors
    ///
    /// Returns the error from `f` to the caller that ran it. Nothing is
    /// published, so a later call may try again.
    #[inline]
    pub fn get_or_try_init<F, E>(&self, f: F) -> Result<&T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        if let Some(instance) = self.get() {
            return Ok(instance);
        }
        self.initialize(f)
    }

    #[cold]
    fn initialize<F, E>(&self, f: F) -> Result<&T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        // The guard holds no data, so a panicked constructor leaves nothing
        // to repair; the next caller simply retries.
        let _guard = self.guard.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(instance) = self.get() {
            return Ok(instance);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            type_name = core::any::type_name::<T>(),
            "constructing singleton instance"
        );

        let value = match f() {
            Ok(value) => value,
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    type_name = core::any::type_name::<T>(),
                    "singleton construction failed"
                );
                return Err(err);
            }
        };

        let raw = Box::into_raw(Box::new(value));
        self.instance.store(raw, Ordering::Release);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            type_name = core::any::type_name::<T>(),
            "singleton instance published"
        );

        // SAFETY: `raw` was just published and lives as long as `self`.
        Ok(unsafe { &*raw })
    }
}

impl<T> Default for LazySingleton<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: core::fmt::Debug> core::fmt::Debug for LazySingleton<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LazySingleton")
            .field("instance", &self.get())
            .finish()
    }
}

impl<T> Drop for LazySingleton<T> {
    fn drop(&mut self) {
        let raw = *self.instance.get_mut();
        if !raw.is_null() {
            // SAFETY: `&mut self` rules out outstanding borrows; `raw` came
            // from `Box::into_raw` and is freed exactly once.
            drop(unsafe { Box::from_raw(raw) });
        }
    }
}

/// A type with one process-wide instance.
///
/// Usually implemented with the [`singleton!`](crate::singleton) macro, which
/// declares the `static` holder.
pub trait Singleton: Sized + Send + Sync + 'static {
    /// Error returned when construction fails.
    type Error;

    /// The process-wide holder for this type's instance.
    fn holder() -> &'static LazySingleton<Self>;

    /// Builds the instance. Runs at most once per successful initialization.
    ///
    /// # Errors
    ///
    /// Implementation-defined; the error reaches the caller of
    /// [`get_instance`](Self::get_instance) that triggered construction.
    fn construct() -> Result<Self, Self::Error>;

    /// Returns the shared instance, constructing it on first access.
    ///
    /// # Errors
    ///
    /// Propagates the error from [`construct`](Self::construct). The holder
    /// stays empty and the next call retries.
    #[inline]
    fn get_instance() -> Result<&'static Self, Self::Error> {
        Self::holder().get_or_try_init(Self::construct)
    }
}

/// Implements [`Singleton`](crate::concurrency::Singleton) for a non-generic type.
///
/// ```rust
/// use lazykit::concurrency::Singleton;
/// use lazykit::singleton;
///
/// struct Registry {
///     name: &'static str,
/// }
///
/// singleton!(Registry => Registry { name: "main" });
///
/// let registry = Registry::get_instance().unwrap();
/// assert_eq!(registry.name, "main");
/// assert!(std::ptr::eq(registry, Registry::get_instance().unwrap()));
/// ```
///
/// Fallible construction names the error type:
///
/// ```rust
/// use lazykit::concurrency::Singleton;
/// use lazykit::singleton;
///
/// struct Port(u16);
///
/// singleton!(Port => try "8080".parse().map(Port), error = std::num::ParseIntError);
///
/// assert_eq!(Port::get_instance().unwrap().0, 8080);
/// ```
#[macro_export]
macro_rules! singleton {
    (@impl $ty:ty, $err:ty, $construct:expr) => {
        impl $crate::concurrency::Singleton for $ty {
            type Error = $err;

            fn holder() -> &'static $crate::concurrency::LazySingleton<Self> {
                static HOLDER: $crate::concurrency::LazySingleton<$ty> =
                    $crate::concurrency::LazySingleton::new();
                &HOLDER
            }

            fn construct() -> ::core::result::Result<Self, Self::Error> {
                $construct
            }
        }
    };
    ($ty:ty => try $construct:expr, error = $err:ty $(,)?) => {
        $crate::singleton!(@impl $ty, $err, $construct);
    };
    ($ty:ty => $construct:expr $(,)?) => {
        $crate::singleton!(
            @impl $ty,
            ::core::convert::Infallible,
            ::core::result::Result::Ok($construct)
        );
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::atomic::AtomicUsize;
    use std::sync::Barrier;
    use std::thread;

    #[test]
    fn test_get_before_init() {
        let holder = LazySingleton::<u32>::new();
        assert!(!holder.is_initialized());
        assert_eq!(holder.get(), None);
    }

    #[test]
    fn test_get_or_init_returns_same_instance() {
        let holder = LazySingleton::new();
        let a = holder.get_or_init(|| vec![1, 2, 3]);
        let b = holder.get_or_init(|| vec![4]);
        assert!(ptr::eq(a, b));
        assert_eq!(b, &vec![1, 2, 3]);
        assert!(holder.is_initialized());
    }

    #[test]
    fn test_failed_construction_can_be_retried() {
        let holder = LazySingleton::<String>::new();

        let err = holder.get_or_try_init(|| Err::<String, _>("boom"));
        assert_eq!(err, Err("boom"));
        assert!(!holder.is_initialized());

        let value = holder.get_or_try_init(|| Ok::<_, &str>("ok".to_string()));
        assert_eq!(value.map(String::as_str), Ok("ok"));
    }

    #[test]
    fn test_panicking_construction_can_be_retried() {
        let holder = LazySingleton::<u64>::new();

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            holder.get_or_init(|| panic!("constructor failed"));
        }));
        assert!(result.is_err());
        assert!(!holder.is_initialized());

        assert_eq!(*holder.get_or_init(|| 7), 7);
    }

    #[test]
    fn test_concurrent_first_access_constructs_once() {
        const THREADS: usize = 16;
        let holder = LazySingleton::new();
        let constructions = AtomicUsize::new(0);
        let barrier = Barrier::new(THREADS);

        let instances: Vec<&usize> = thread::scope(|s| {
            let handles: Vec<_> = (0..THREADS)
                .map(|i| {
                    let holder = &holder;
                    let constructions = &constructions;
                    let barrier = &barrier;
                    s.spawn(move || {
                        barrier.wait();
                        holder.get_or_init(|| {
                            constructions.fetch_add(1, Ordering::SeqCst);
                            i
                        })
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(constructions.load(Ordering::SeqCst), 1);
        assert!(instances.windows(2).all(|w| ptr::eq(w[0], w[1])));
    }

    #[test]
    fn test_drop_releases_instance() {
        struct Tracked<'a>(&'a AtomicUsize);
        impl Drop for Tracked<'_> {
            fn drop(&mut self) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let drops = AtomicUsize::new(0);
        {
            let holder = LazySingleton::new();
            holder.get_or_init(|| Tracked(&drops));
            assert_eq!(drops.load(Ordering::SeqCst), 0);
        }
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_debug_shows_instance() {
        let holder = LazySingleton::new();
        assert_eq!(format!("{holder:?}"), "LazySingleton { instance: None }");
        holder.get_or_init(|| 5u8);
        assert_eq!(format!("{holder:?}"), "LazySingleton { instance: Some(5) }");
    }

    static BUILDS: AtomicUsize = AtomicUsize::new(0);

    struct Service {
        id: usize,
    }

    crate::singleton!(Service => Service {
        id: BUILDS.fetch_add(1, Ordering::SeqCst),
    });

    #[test]
    fn test_singleton_macro() {
        let a = Service::get_instance().unwrap();
        let b = Service::get_instance().unwrap();
        assert!(ptr::eq(a, b));
        assert_eq!(a.id, 0);
        assert_eq!(BUILDS.load(Ordering::SeqCst), 1);
    }
}
