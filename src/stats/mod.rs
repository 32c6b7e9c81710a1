//! Summary statistics over numeric series.

mod covariance;

pub use covariance::{covariance, StatsError};
