//! # ql-marketmodels
//!
//! Monte Carlo evolution of a LIBOR forward-rate curve under a multi-factor
//! market model, and valuation of cash-flow products on the simulated
//! paths.
//!
//! The pieces, leaf first:
//!
//! * [`curve_state`]: the simulated curve and everything derived from it;
//! * [`evolution_description`]: rate times, evolution times, alive rates
//!   and numeraire measures;
//! * [`drift_computation`]: no-arbitrage drifts for the log-normal and
//!   normal models;
//! * [`models`] and [`brownian_generators`]: the covariance structure and
//!   the random draws an evolver consumes;
//! * [`evolvers`]: predictor-corrector stepping of the curve;
//! * [`products`], [`discounter`] and [`accounting_engine`]: cash flows,
//!   their conversion into numeraire bonds, and path statistics;
//! * [`swap_forward_mappings`]: swap-rate Jacobians and approximate
//!   swaption volatilities on top of a curve state.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use ql_marketmodels::prelude::*;
//! use ql_math::SequenceStatistics;
//!
//! let rate_times: Vec<f64> = (0..=4).map(|i| 0.5 + 0.5 * i as f64).collect();
//! let n = rate_times.len() - 1;
//! let product = MultiStepForwards::new(
//!     rate_times.clone(),
//!     vec![0.5; n],
//!     rate_times[1..].to_vec(),
//!     vec![0.04; n],
//! )
//! .unwrap();
//!
//! let evolution = product.evolution().clone();
//! let correlation = exponential_forward_correlation(&rate_times, 0.5, 0.2).unwrap();
//! let model = FlatVol::new(&[0.15; 4], &correlation, evolution, 2, vec![0.04; n], vec![0.0; n]).unwrap();
//!
//! let config = SimulationConfig::default();
//! let factory = MtBrownianGeneratorFactory::new(config.seed());
//! let numeraires = product.suggested_numeraires();
//! let evolver = ForwardRatePcEvolver::new(Arc::new(model), &factory, numeraires, 0, &config).unwrap();
//!
//! let initial_numeraire_value = 1.0 / (1.0 + 0.5 * 0.04) / 1.02;
//! let mut engine =
//!     AccountingEngine::new(Box::new(evolver), Box::new(product), initial_numeraire_value, &config).unwrap();
//! let mut stats = SequenceStatistics::new(n);
//! engine.multiple_path_values(&mut stats, 1_000).unwrap();
//! assert_eq!(stats.samples(), 1_000);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// Path-by-path valuation of products.
pub mod accounting_engine;

/// Brownian generators and seed derivation.
pub mod brownian_generators;

/// Simulation configuration.
pub mod config;

/// Curve states.
pub mod curve_state;

/// Cash-flow discounting into numeraire bonds.
pub mod discounter;

/// Drift calculators.
pub mod drift_computation;

/// Evolution descriptions and numeraire measures.
pub mod evolution_description;

/// Forward-rate evolvers.
pub mod evolvers;

/// Market models.
pub mod models;

/// Cash-flow products.
pub mod products;

/// Swap-rate sensitivities to forward rates.
pub mod swap_forward_mappings;

/// Time checks and alive-rate ranges.
pub mod utilities;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use accounting_engine::AccountingEngine;
pub use config::{PathValidation, SimulationConfig, SimulationConfigBuilder};
pub use curve_state::{CurveState, LmmCurveState};
pub use evolution_description::{EvolutionDescription, Measure};
pub use evolvers::{
    ForwardRateEulerEvolver, ForwardRateIpcEvolver, ForwardRateNormalPcEvolver, ForwardRatePcEvolver,
    LogNormalFwdRatePc, MarketModelEvolver, NormalFwdRatePc,
};
pub use models::MarketModel;

/// Everything needed to set up and run a simulation.
pub mod prelude {
    pub use crate::accounting_engine::AccountingEngine;
    pub use crate::brownian_generators::{
        BrownianGenerator, BrownianGeneratorFactory, MtBrownianGenerator, MtBrownianGeneratorFactory, SeedGenerator,
    };
    pub use crate::config::{PathValidation, SimulationConfig};
    pub use crate::curve_state::{CurveState, LmmCurveState};
    pub use crate::drift_computation::{DriftCalculator, LmmDriftCalculator, LmmNormalDriftCalculator};
    pub use crate::evolution_description::{
        check_compatibility, money_market_measure, money_market_plus_measure, terminal_measure,
        EvolutionDescription, Measure,
    };
    pub use crate::evolvers::{
        ForwardRateEulerEvolver, ForwardRateIpcEvolver, ForwardRateNormalPcEvolver, ForwardRatePcEvolver,
        FwdRateEvolver, LogNormalFwdRatePc, MarketModelEvolver, NormalFwdRatePc,
    };
    pub use crate::models::{exponential_forward_correlation, FlatVol, MarketModel, PseudoRootFacade};
    pub use crate::products::{
        CashFlow, MarketModelMultiProduct, MultiStepCaplets, MultiStepForwards, MultiStepSwap, OneStepForwards,
        OptionType, PlainVanillaPayoff,
    };
}
