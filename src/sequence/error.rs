/// The error type for sequence construction and term production.
///
/// Running out of terms is not an error; see [`Step::Exhausted`](super::Step::Exhausted).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceError {
    /// A limit or index was outside the accepted range.
    InvalidArgument {
        /// The rejected value.
        value: i128,
    },
    /// The term at `index` does not fit in the term type.
    Overflow {
        /// Zero-based index of the unrepresentable term.
        index: usize,
    },
}

impl core::fmt::Display for SequenceError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidArgument { value } => {
                write!(f, "invalid sequence argument: {value}")
            }
            Self::Overflow { index } => {
                write!(f, "term {index} overflows the term type")
            }
        }
    }
}

impl std::error::Error for SequenceError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_offending_value() {
        let err = SequenceError::InvalidArgument { value: -1 };
        assert_eq!(err.to_string(), "invalid sequence argument: -1");

        let err = SequenceError::Overflow { index: 94 };
        assert_eq!(err.to_string(), "term 94 overflows the term type");
    }
}
