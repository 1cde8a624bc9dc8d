use super::{EvolutionScheme, MarketModelEvolver, Step};
use crate::brownian_generators::{BrownianGenerator, BrownianGeneratorFactory};
use crate::config::{PathValidation, SimulationConfig};
use crate::curve_state::{CurveState, LmmCurveState};
use crate::drift_computation::DriftCalculator;
use crate::evolution_description::{check_compatibility, Measure};
use crate::models::MarketModel;
use crate::utilities::AliveRange;
use ql_core::{ensure, errors::Error, errors::Result, Rate, Real, Size, Spread};
use std::sync::Arc;
use tracing::debug;

/// Predictor-corrector stepping loop shared by every forward-rate scheme.
///
/// The evolver owns its curve state, generator and scratch buffers, so
/// two evolvers built from the same market model never share mutable
/// state.
#[derive(Debug)]
pub struct FwdRateEvolver<S: EvolutionScheme> {
    market_model: Arc<dyn MarketModel>,
    numeraires: Vec<Size>,
    initial_step: Size,
    generator: Box<dyn BrownianGenerator>,
    scheme: S,
    calculators: Vec<S::Drift>,
    fixed_drifts: Vec<Vec<Real>>,
    alive: Vec<Size>,
    number_of_rates: Size,

    curve_state: LmmCurveState,
    initial_state: LmmCurveState,
    current_step: Size,

    forwards: Vec<Rate>,
    displacements: Vec<Spread>,
    evolved: Vec<Real>,
    initial_forwards: Vec<Rate>,
    initial_evolved: Vec<Real>,
    drifts1: Vec<Real>,
    drifts2: Vec<Real>,
    initial_drifts: Vec<Real>,
    brownians: Vec<Real>,

    reject_non_finite: bool,
}

impl<S: EvolutionScheme> FwdRateEvolver<S> {
    /// Build an evolver for `market_model` under `numeraires`.
    ///
    /// Paths start at `initial_step`; the generator is sized for the
    /// remaining steps.
    pub fn new(
        market_model: Arc<dyn MarketModel>,
        factory: &dyn BrownianGeneratorFactory,
        numeraires: Vec<Size>,
        initial_step: Size,
        config: &SimulationConfig,
    ) -> Result<Self> {
        let evolution = market_model.evolution();
        let n = market_model.number_of_rates();
        let factors = market_model.number_of_factors();
        let steps = market_model.number_of_steps();

        check_compatibility(evolution, &numeraires)?;
        S::check_numeraires(evolution, &numeraires)?;
        ensure!(
            initial_step < steps,
            "initial step ({initial_step}) must be less than the number of steps ({steps})"
        );
        let alive = evolution.first_alive_rate().to_vec();
        ensure!(
            alive.windows(2).all(|w| w[0] <= w[1]),
            "first alive rates must be non-decreasing: {alive:?}"
        );

        let displacements = market_model.displacements().to_vec();
        let taus = evolution.rate_taus();
        let mut calculators = Vec::with_capacity(steps);
        let mut fixed_drifts = Vec::with_capacity(steps);
        for j in 0..steps {
            let a = market_model.pseudo_root(j)?;
            ensure!(
                a.rows() == n && a.cols() == factors,
                "pseudo-root {j} is {}×{}, expected {n}×{factors}",
                a.rows(),
                a.cols()
            );
            calculators.push(S::drift_calculator(
                a,
                &displacements,
                taus,
                numeraires[j],
                alive[j],
                config.drift_validation(),
            )?);
            fixed_drifts.push((0..n).map(|k| S::fixed_drift(a.row_row_dot(k, k))).collect());
        }

        let generator = factory.create(factors, steps - initial_step)?;
        let curve_state = LmmCurveState::new(evolution.rate_times().to_vec())?;

        debug!(
            scheme = S::NAME,
            rates = n,
            factors,
            steps,
            initial_step,
            measure = ?Measure::identify(evolution, &numeraires),
            "forward-rate evolver constructed"
        );

        let mut evolver = Self {
            market_model: Arc::clone(&market_model),
            numeraires,
            initial_step,
            generator,
            scheme: S::new(n),
            calculators,
            fixed_drifts,
            alive,
            number_of_rates: n,
            initial_state: curve_state.clone(),
            curve_state,
            current_step: initial_step,
            forwards: vec![0.0; n],
            displacements,
            evolved: vec![0.0; n],
            initial_forwards: vec![0.0; n],
            initial_evolved: vec![0.0; n],
            drifts1: vec![0.0; n],
            drifts2: vec![0.0; n],
            initial_drifts: vec![0.0; n],
            brownians: vec![0.0; factors],
            reject_non_finite: config.path_validation() == PathValidation::Reject,
        };
        evolver.set_forwards(market_model.initial_rates())?;
        Ok(evolver)
    }

    /// The market model the evolver was built from.
    pub fn market_model(&self) -> &Arc<dyn MarketModel> {
        &self.market_model
    }

    /// Step at which every path starts.
    pub fn initial_step(&self) -> Size {
        self.initial_step
    }

    /// Use `forwards` as the curve every path starts from.
    pub fn set_forwards(&mut self, forwards: &[Rate]) -> Result<()> {
        ensure!(
            forwards.len() == self.number_of_rates,
            "mismatch between forwards ({}) and rate times ({})",
            forwards.len(),
            self.number_of_rates
        );
        let first = self.alive[self.initial_step];
        self.initial_forwards.copy_from_slice(forwards);
        for (i, x) in self.initial_evolved.iter_mut().enumerate() {
            *x = S::to_evolution_space(forwards[i], self.displacements[i]);
        }
        self.calculators[self.initial_step].compute(forwards, &mut self.initial_drifts)?;
        self.initial_state.set_on_forward_rates(forwards, first)?;

        self.forwards.copy_from_slice(&self.initial_forwards);
        self.evolved.copy_from_slice(&self.initial_evolved);
        self.curve_state.clone_from(&self.initial_state);
        self.current_step = self.initial_step;
        Ok(())
    }

    fn check_finite(&self, step: Size, alive: AliveRange) -> Result<()> {
        match alive.indices().find(|&i| !self.forwards[i].is_finite()) {
            Some(index) => Err(Error::NonFinite {
                what: "forward rate",
                step,
                index,
            }),
            None => Ok(()),
        }
    }
}

impl<S: EvolutionScheme> MarketModelEvolver for FwdRateEvolver<S> {
    fn numeraires(&self) -> &[Size] {
        &self.numeraires
    }

    fn start_new_path(&mut self) -> Real {
        self.current_step = self.initial_step;
        self.forwards.copy_from_slice(&self.initial_forwards);
        self.evolved.copy_from_slice(&self.initial_evolved);
        self.curve_state.clone_from(&self.initial_state);
        self.generator.next_path()
    }

    fn advance_step(&mut self) -> Result<Real> {
        let step = self.current_step;
        ensure!(
            step < self.calculators.len(),
            "no step left: all {} steps of the path have been taken",
            self.calculators.len()
        );
        let alive = AliveRange::new(self.alive[step], self.number_of_rates)?;

        if step > self.initial_step {
            self.calculators[step].compute(&self.forwards, &mut self.drifts1)?;
        } else {
            self.drifts1.copy_from_slice(&self.initial_drifts);
        }

        let weight = self.generator.next_step(&mut self.brownians)?;

        let calc = &mut self.calculators[step];
        let mut view = Step {
            index: step,
            alive,
            pseudo_root: self.market_model.pseudo_root(step)?,
            fixed_drifts: &self.fixed_drifts[step],
            displacements: &self.displacements,
            taus: self.market_model.evolution().rate_taus(),
            brownians: &self.brownians,
            drifts1: &self.drifts1,
            drifts2: &mut self.drifts2,
            evolved: &mut self.evolved,
            forwards: &mut self.forwards,
        };
        self.scheme.predict(calc, &mut view)?;
        self.scheme.correct(calc, &mut view)?;

        if self.reject_non_finite {
            self.check_finite(step, alive)?;
        }
        self.curve_state.set_on_forward_rates(&self.forwards, alive.first())?;
        self.current_step += 1;
        Ok(weight)
    }

    fn current_step(&self) -> Size {
        self.current_step
    }

    fn current_state(&self) -> &dyn CurveState {
        &self.curve_state
    }

    fn set_initial_state(&mut self, state: &dyn CurveState) -> Result<()> {
        ensure!(
            state.number_of_rates() == self.number_of_rates,
            "curve state has {} rates, evolver has {}",
            state.number_of_rates(),
            self.number_of_rates
        );
        let forwards = state.forward_rates().to_vec();
        self.set_forwards(&forwards)
    }
}
