//! Market models: initial curve, displacements and per-step pseudo-roots.
//!
//! A market model is an immutable snapshot handed to evolvers at
//! construction; nothing observes it for changes.

mod correlations;
mod flat_vol;
mod pseudo_root_facade;

pub use correlations::exponential_forward_correlation;
pub use flat_vol::FlatVol;
pub use pseudo_root_facade::PseudoRootFacade;

use crate::evolution_description::EvolutionDescription;
use ql_core::{ensure, errors::Result, Rate, Size, Spread};
use ql_math::Matrix;

/// Covariance structure of a forward-rate curve over a simulation.
pub trait MarketModel: std::fmt::Debug + Send + Sync {
    /// Forward rates at time zero.
    fn initial_rates(&self) -> &[Rate];

    /// Displacements of the shifted log-normal dynamics.
    fn displacements(&self) -> &[Spread];

    /// Rate times and evolution schedule.
    fn evolution(&self) -> &EvolutionDescription;

    /// Number of forward rates.
    fn number_of_rates(&self) -> Size {
        self.initial_rates().len()
    }

    /// Number of driving factors.
    fn number_of_factors(&self) -> Size;

    /// Number of evolution steps.
    fn number_of_steps(&self) -> Size {
        self.evolution().number_of_steps()
    }

    /// Pseudo-root (`rates × factors`) of the covariance accrued during
    /// `step`.
    fn pseudo_root(&self, step: Size) -> Result<&Matrix>;

    /// Covariance accrued during `step`.
    fn covariance(&self, step: Size) -> Result<Matrix> {
        Ok(self.pseudo_root(step)?.outer_product())
    }

    /// Covariance accrued from time zero through `end_step` inclusive.
    fn total_covariance(&self, end_step: Size) -> Result<Matrix> {
        ensure!(
            end_step < self.number_of_steps(),
            "end step ({end_step}) out of range [0, {})",
            self.number_of_steps()
        );
        let n = self.number_of_rates();
        (0..=end_step).try_fold(Matrix::zeros(n, n), |acc, step| {
            Ok(&acc + &self.covariance(step)?)
        })
    }
}

/// Shape checks shared by the market-model implementations.
pub(crate) fn check_curve(
    evolution: &EvolutionDescription,
    initial_rates: &[Rate],
    displacements: &[Spread],
) -> Result<()> {
    let n = evolution.number_of_rates();
    ensure!(
        initial_rates.len() == n,
        "initial rates ({}) mismatch with evolution rates ({n})",
        initial_rates.len()
    );
    ensure!(
        displacements.len() == n,
        "displacements ({}) mismatch with evolution rates ({n})",
        displacements.len()
    );
    Ok(())
}
