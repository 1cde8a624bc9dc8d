//! # marketmodels
//!
//! Monte Carlo evolution of LIBOR forward-rate curves under multi-factor
//! market models, with numeraire accounting of cash-flow products.
//!
//! This crate is a **façade** that re-exports all public items from the
//! underlying workspace crates. Application code should depend on this
//! crate rather than the individual `ql-*` crates.
//!
//! ## Quick start
//!
//! ```toml
//! [dependencies]
//! marketmodels = "0.1"
//! ```
//!
//! ```rust
//! use marketmodels::prelude::*;
//!
//! let evolution = EvolutionDescription::from_rate_times(vec![0.5, 1.0, 1.5, 2.0]).unwrap();
//! assert_eq!(evolution.number_of_steps(), 3);
//! assert_eq!(terminal_measure(&evolution), vec![3, 3, 3]);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Core types, aliases, and error definitions.
pub use ql_core as core;

/// Matrices, pseudo-square roots, random numbers and statistics.
pub use ql_math as math;

/// Curve states, drift calculators, evolvers, products and the
/// accounting engine.
pub use ql_marketmodels as market_models;

/// Everything needed to set up and run a simulation.
pub mod prelude {
    pub use ql_core::errors::{Error, Result};
    pub use ql_core::{Rate, Real, Size, Spread, Time};
    pub use ql_marketmodels::prelude::*;
    pub use ql_math::{Matrix, SequenceStatistics};
}

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn prelude_covers_a_curve_state_round_trip() {
        let mut state = LmmCurveState::new(vec![0.5, 1.0, 1.5]).unwrap();
        state.set_on_forward_rates(&[0.04, 0.05], 0).unwrap();
        let ratio: Real = state.discount_ratio(2, 0).unwrap();
        assert_abs_diff_eq!(ratio, 1.0 / (1.02 * 1.025), epsilon = 1e-15);
    }
}
