//! Error types shared by every crate in the workspace.
//!
//! A single `thiserror`-derived enum covers construction-time precondition
//! failures, bounds failures and the optional non-finite checks.  The
//! `ensure!`, `ensure_post!` and `fail!` macros keep the check sites short.

use thiserror::Error;

/// The top-level error type.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// General runtime error.
    #[error("{0}")]
    Runtime(String),

    /// Precondition violated.
    #[error("precondition not satisfied: {0}")]
    Precondition(String),

    /// Postcondition violated.
    #[error("postcondition not satisfied: {0}")]
    Postcondition(String),

    /// Index out of range.
    #[error("index ({index}) out of range [0, {size})")]
    IndexOutOfRange {
        /// The index that was out of range.
        index: usize,
        /// The size of the container.
        size: usize,
    },

    /// Invalid argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A quantity became NaN or infinite while validation was enabled.
    #[error("non-finite {what} at step {step}, index {index}")]
    NonFinite {
        /// Which quantity degenerated (forward rate, drift, value, ...).
        what: &'static str,
        /// Simulation step at which it was detected.
        step: usize,
        /// Rate or product index.
        index: usize,
    },
}

/// Shorthand `Result` type used throughout the workspace.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Returns `Err(Error::Precondition(...))` if `$cond` is false.
///
/// # Example
/// ```
/// use ql_core::{ensure, errors::Error};
/// fn positive(x: f64) -> ql_core::errors::Result<f64> {
///     ensure!(x > 0.0, "x must be positive, got {x}");
///     Ok(x)
/// }
/// assert!(positive(1.0).is_ok());
/// assert!(positive(-1.0).is_err());
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::Error::Precondition(
                format!($($msg)*)
            ));
        }
    };
}

/// Returns `Err(Error::Postcondition(...))` if `$cond` is false.
///
/// # Example
/// ```
/// use ql_core::{ensure_post, errors::Error};
/// fn compute(x: f64) -> ql_core::errors::Result<f64> {
///     let result = x * 2.0;
///     ensure_post!(result > 0.0, "result must be positive, got {result}");
///     Ok(result)
/// }
/// assert!(compute(1.0).is_ok());
/// assert!(compute(-1.0).is_err());
/// ```
#[macro_export]
macro_rules! ensure_post {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::Error::Postcondition(
                format!($($msg)*)
            ));
        }
    };
}

/// Returns `Err(Error::Runtime(...))` immediately.
///
/// # Example
/// ```
/// use ql_core::{fail, errors::Error};
/// fn always_err() -> ql_core::errors::Result<()> {
///     fail!("something went wrong");
/// }
/// assert!(always_err().is_err());
/// ```
#[macro_export]
macro_rules! fail {
    ($($msg:tt)*) => {
        return Err($crate::errors::Error::Runtime(format!($($msg)*)))
    };
}

/// Returns `Err(Error::IndexOutOfRange { .. })` unless `$index < $size`.
///
/// # Example
/// ```
/// use ql_core::{ensure_index, errors::Error};
/// fn get(v: &[f64], i: usize) -> ql_core::errors::Result<f64> {
///     ensure_index!(i, v.len());
///     Ok(v[i])
/// }
/// assert_eq!(get(&[1.0, 2.0], 1), Ok(2.0));
/// assert!(matches!(get(&[1.0], 3), Err(Error::IndexOutOfRange { index: 3, size: 1 })));
/// ```
#[macro_export]
macro_rules! ensure_index {
    ($index:expr, $size:expr) => {
        if $index >= $size {
            return Err($crate::errors::Error::IndexOutOfRange {
                index: $index,
                size: $size,
            });
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn checked(x: f64) -> Result<f64> {
        ensure!(x.is_finite(), "x must be finite, got {x}");
        Ok(x)
    }

    #[test]
    fn messages_carry_context() {
        let err = checked(f64::NAN).unwrap_err();
        assert_eq!(
            err.to_string(),
            "precondition not satisfied: x must be finite, got NaN"
        );
        let err = Error::NonFinite {
            what: "forward rate",
            step: 3,
            index: 7,
        };
        assert_eq!(err.to_string(), "non-finite forward rate at step 3, index 7");
    }

    proptest! {
        #[test]
        fn ensure_index_accepts_exactly_the_valid_range(index in 0usize..64, size in 0usize..64) {
            let f = |i: usize, n: usize| -> Result<()> {
                ensure_index!(i, n);
                Ok(())
            };
            prop_assert_eq!(f(index, size).is_ok(), index < size);
        }
    }
}
