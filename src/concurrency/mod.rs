//! Concurrency helpers.
//!
//! Only singleton construction is synchronized here. Everything else in the
//! crate is single-owner and relies on `&mut self` for exclusion.

pub mod singleton;

pub use singleton::{LazySingleton, Singleton};
