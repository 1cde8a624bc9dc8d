//! # ql-math
//!
//! Mathematical utilities for the market-model workspace: a matrix newtype
//! over nalgebra, symmetric-eigen pseudo square roots, the inverse
//! cumulative normal, Mersenne-Twister random numbers and weighted
//! statistics accumulators.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// Probability distributions.
pub mod distributions;

/// Dense matrix newtype.
pub mod matrix;

/// Eigen-decomposition based pseudo square roots and covariance assembly.
pub mod matrix_utilities;

/// Random number generators.
pub mod random_numbers;

/// Statistics accumulators.
pub mod statistics;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use distributions::InverseCumulativeNormal;
pub use matrix::Matrix;
pub use matrix_utilities::{get_covariance, pseudo_sqrt, rank_reduced_sqrt};
pub use random_numbers::{InverseCumulativeNormalRng, MersenneTwisterUniformRng};
pub use statistics::{SequenceStatistics, Statistics};
