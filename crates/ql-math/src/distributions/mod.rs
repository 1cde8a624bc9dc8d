//! Probability distributions needed by the simulation layer.

pub mod normal;

pub use normal::InverseCumulativeNormal;
