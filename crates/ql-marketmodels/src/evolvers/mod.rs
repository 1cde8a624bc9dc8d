//! Forward-rate evolvers.
//!
//! An evolver owns one simulated path at a time: [`start_new_path`]
//! restores the initial curve, and each [`advance_step`] moves the alive
//! rates across one evolution step and pushes them into the curve state.
//!
//! All forward-rate evolvers share one stepping loop,
//! [`FwdRateEvolver`], parameterised by an [`EvolutionScheme`] that owns
//! the coordinates the rates are evolved in and the update formulas:
//!
//! | alias                          | scheme           | coordinates  | corrector            |
//! |--------------------------------|------------------|--------------|----------------------|
//! | [`ForwardRatePcEvolver`]       | [`LogNormalPc`]    | `ln(f + d)`  | drift at predicted f |
//! | [`ForwardRateIpcEvolver`]      | [`LogNormalIpc`]   | `ln(f + d)`  | interleaved, top-down |
//! | [`ForwardRateNormalPcEvolver`] | [`NormalPc`]       | `f`          | drift at predicted f |
//! | [`ForwardRateEulerEvolver`]    | [`LogNormalEuler`] | `ln(f + d)`  | none                 |
//!
//! [`start_new_path`]: MarketModelEvolver::start_new_path
//! [`advance_step`]: MarketModelEvolver::advance_step

mod fwd_rate;
mod schemes;

pub use fwd_rate::FwdRateEvolver;
pub use schemes::{LogNormalEuler, LogNormalIpc, LogNormalPc, NormalPc};

use crate::curve_state::CurveState;
use crate::drift_computation::DriftCalculator;
use crate::evolution_description::EvolutionDescription;
use crate::utilities::AliveRange;
use ql_core::{errors::Result, Rate, Real, Size, Spread, Time};
use ql_math::Matrix;

/// Path-by-path driver of a simulated curve.
pub trait MarketModelEvolver: std::fmt::Debug + Send {
    /// Numeraire index used at each step.
    fn numeraires(&self) -> &[Size];

    /// Reset to the initial curve and start a new generator path; returns
    /// the path's initial weight.
    fn start_new_path(&mut self) -> Real;

    /// Evolve one step and return its weight.  Errors once every step of
    /// the path has been taken.
    fn advance_step(&mut self) -> Result<Real>;

    /// Index of the next step to be taken.
    fn current_step(&self) -> Size;

    /// The curve after the last completed step.
    fn current_state(&self) -> &dyn CurveState;

    /// Replace the initial curve with the forwards of `state`.
    fn set_initial_state(&mut self, state: &dyn CurveState) -> Result<()>;
}

/// Borrowed view of everything a scheme needs to take one step.
///
/// `evolved` holds the rates in the scheme's own coordinates and
/// `forwards` the same rates in rate space; both are full length and
/// only the `alive` part may be written.
#[derive(Debug)]
pub struct Step<'a> {
    /// Step index.
    pub index: Size,
    /// Rates evolved during this step.
    pub alive: AliveRange,
    /// Pseudo-root of the step.
    pub pseudo_root: &'a Matrix,
    /// State-independent drift term per rate.
    pub fixed_drifts: &'a [Real],
    /// Displacements.
    pub displacements: &'a [Spread],
    /// Accrual fractions.
    pub taus: &'a [Time],
    /// Factor draws of the step.
    pub brownians: &'a [Real],
    /// Drifts at the start-of-step forwards.
    pub drifts1: &'a [Real],
    /// Scratch for the corrector drifts.
    pub drifts2: &'a mut [Real],
    /// Rates in evolution coordinates.
    pub evolved: &'a mut [Real],
    /// Rates in rate space.
    pub forwards: &'a mut [Rate],
}

/// Coordinates and update formulas of a forward-rate evolver.
pub trait EvolutionScheme: std::fmt::Debug + Send + Sized {
    /// Drift calculator used at every step.
    type Drift: DriftCalculator;

    /// Short name used in logs.
    const NAME: &'static str;

    /// Scheme state for a curve of `number_of_rates` rates.
    fn new(number_of_rates: Size) -> Self;

    /// Build the drift calculator of one step.
    fn drift_calculator(
        pseudo_root: &Matrix,
        displacements: &[Spread],
        taus: &[Time],
        numeraire: Size,
        alive: Size,
        validate: bool,
    ) -> Result<Self::Drift>;

    /// Reject numeraire sequences the scheme cannot work with.
    fn check_numeraires(_evolution: &EvolutionDescription, _numeraires: &[Size]) -> Result<()> {
        Ok(())
    }

    /// State-independent drift of a rate with step variance `variance`.
    fn fixed_drift(variance: Real) -> Real;

    /// Rate to evolution coordinates.
    fn to_evolution_space(rate: Rate, displacement: Spread) -> Real;

    /// Evolution coordinates back to rate space.
    fn to_rate_space(x: Real, displacement: Spread) -> Rate;

    /// Explicit step with the start-of-step drifts.
    fn predict(&mut self, _calc: &mut Self::Drift, step: &mut Step<'_>) -> Result<()> {
        for i in step.alive.indices() {
            step.evolved[i] +=
                step.drifts1[i] + step.fixed_drifts[i] + step.pseudo_root.row_dot(i, step.brownians);
            step.forwards[i] = Self::to_rate_space(step.evolved[i], step.displacements[i]);
        }
        Ok(())
    }

    /// Recompute drifts at the predicted forwards and average them in.
    fn correct(&mut self, calc: &mut Self::Drift, step: &mut Step<'_>) -> Result<()> {
        calc.compute(step.forwards, step.drifts2)?;
        for i in step.alive.indices() {
            step.evolved[i] += 0.5 * (step.drifts2[i] - step.drifts1[i]);
            step.forwards[i] = Self::to_rate_space(step.evolved[i], step.displacements[i]);
        }
        Ok(())
    }
}

/// Displaced log-normal predictor-corrector evolver.
pub type ForwardRatePcEvolver = FwdRateEvolver<LogNormalPc>;

/// Same as [`ForwardRatePcEvolver`].
pub type LogNormalFwdRatePc = ForwardRatePcEvolver;

/// Displaced log-normal evolver with the interleaved corrector; terminal
/// measure only.
pub type ForwardRateIpcEvolver = FwdRateEvolver<LogNormalIpc>;

/// Normal predictor-corrector evolver.
pub type ForwardRateNormalPcEvolver = FwdRateEvolver<NormalPc>;

/// Same as [`ForwardRateNormalPcEvolver`].
pub type NormalFwdRatePc = ForwardRateNormalPcEvolver;

/// Displaced log-normal Euler evolver.
pub type ForwardRateEulerEvolver = FwdRateEvolver<LogNormalEuler>;
