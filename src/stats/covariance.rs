use num_traits::ToPrimitive;

/// The error type for [`covariance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsError {
    /// The two series hold a different number of observations.
    LengthMismatch {
        /// Length of the first series.
        left: usize,
        /// Length of the second series.
        right: usize,
    },
    /// Sample statistics need at least two observations.
    TooFewObservations {
        /// Number of observations supplied.
        len: usize,
    },
    /// The observation at `index` has no `f64` representation.
    NotRepresentable {
        /// Position of the offending observation in its series.
        index: usize,
    },
}

impl core::fmt::Display for StatsError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::LengthMismatch { left, right } => {
                write!(f, "series must be of equal length ({left} != {right})")
            }
            Self::TooFewObservations { len } => {
                write!(f, "need at least 2 observations, got {len}")
            }
            Self::NotRepresentable { index } => {
                write!(f, "observation {index} is not representable as f64")
            }
        }
    }
}

impl std::error::Error for StatsError {}

/// Sample covariance of two paired series.
///
/// Computes `Σ (xᵢ - x̄)(yᵢ - ȳ) / (n - 1)`. The series may use different
/// numeric types.
///
/// # Errors
///
/// - [`StatsError::LengthMismatch`] if `x` and `y` differ in length.
/// - [`StatsError::TooFewObservations`] if there are fewer than two pairs.
/// - [`StatsError::NotRepresentable`] if a value cannot be converted to `f64`.
///
/// # Example
///
/// ```rust
/// use lazykit::stats::covariance;
///
/// let cov = covariance(&[1, 2, 3, 4, 5], &[2.0, 4.0, 6.0, 8.0, 10.0]).unwrap();
/// assert!((cov - 5.0).abs() < 1e-12);
/// ```
#[allow(clippy::cast_precision_loss)]
pub fn covariance<X, Y>(x: &[X], y: &[Y]) -> Result<f64, StatsError>
where
    X: ToPrimitive,
    Y: ToPrimitive,
{
    if x.len() != y.len() {
        return Err(StatsError::LengthMismatch {
            left: x.len(),
            right: y.len(),
        });
    }
    let n = x.len();
    if n < 2 {
        return Err(StatsError::TooFewObservations { len: n });
    }

    let xs = to_f64(x)?;
    let ys = to_f64(y)?;

    let x_mean = xs.iter().sum::<f64>() / n as f64;
    let y_mean = ys.iter().sum::<f64>() / n as f64;

    let sum: f64 = xs
        .iter()
        .zip(&ys)
        .map(|(xi, yi)| (xi - x_mean) * (yi - y_mean))
        .sum();

    Ok(sum / (n - 1) as f64)
}

fn to_f64<T: ToPrimitive>(series: &[T]) -> Result<Vec<f64>, StatsError> {
    series
        .iter()
        .enumerate()
        .map(|(index, value)| value.to_f64().ok_or(StatsError::NotRepresentable { index }))
        .collect()
}
