use super::{EvolutionScheme, Step};
use crate::drift_computation::{DriftCalculator, LmmDriftCalculator, LmmNormalDriftCalculator};
use crate::evolution_description::{is_in_terminal_measure, EvolutionDescription};
use ql_core::{ensure, errors::Result, Rate, Real, Size, Spread, Time};
use ql_math::Matrix;

fn log_normal_drift(
    pseudo_root: &Matrix,
    displacements: &[Spread],
    taus: &[Time],
    numeraire: Size,
    alive: Size,
    validate: bool,
) -> Result<LmmDriftCalculator> {
    Ok(LmmDriftCalculator::new(pseudo_root, displacements, taus, numeraire, alive)?.with_validation(validate))
}

// ── Log-normal predictor-corrector ────────────────────────────────────────────

/// Log-Euler predictor, corrector with drifts at the predicted forwards.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNormalPc;

impl EvolutionScheme for LogNormalPc {
    type Drift = LmmDriftCalculator;
    const NAME: &'static str = "log-normal pc";

    fn new(_number_of_rates: Size) -> Self {
        Self
    }

    fn drift_calculator(
        pseudo_root: &Matrix,
        displacements: &[Spread],
        taus: &[Time],
        numeraire: Size,
        alive: Size,
        validate: bool,
    ) -> Result<Self::Drift> {
        log_normal_drift(pseudo_root, displacements, taus, numeraire, alive, validate)
    }

    fn fixed_drift(variance: Real) -> Real {
        -0.5 * variance
    }

    fn to_evolution_space(rate: Rate, displacement: Spread) -> Real {
        (rate + displacement).ln()
    }

    fn to_rate_space(x: Real, displacement: Spread) -> Rate {
        x.exp() - displacement
    }
}

// ── Log-normal Euler ──────────────────────────────────────────────────────────

/// Log-Euler predictor only.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNormalEuler;

impl EvolutionScheme for LogNormalEuler {
    type Drift = LmmDriftCalculator;
    const NAME: &'static str = "log-normal euler";

    fn new(_number_of_rates: Size) -> Self {
        Self
    }

    fn drift_calculator(
        pseudo_root: &Matrix,
        displacements: &[Spread],
        taus: &[Time],
        numeraire: Size,
        alive: Size,
        validate: bool,
    ) -> Result<Self::Drift> {
        log_normal_drift(pseudo_root, displacements, taus, numeraire, alive, validate)
    }

    fn fixed_drift(variance: Real) -> Real {
        -0.5 * variance
    }

    fn to_evolution_space(rate: Rate, displacement: Spread) -> Real {
        (rate + displacement).ln()
    }

    fn to_rate_space(x: Real, displacement: Spread) -> Rate {
        x.exp() - displacement
    }

    fn correct(&mut self, _calc: &mut Self::Drift, _step: &mut Step<'_>) -> Result<()> {
        Ok(())
    }
}

// ── Log-normal iterative predictor-corrector ──────────────────────────────────

/// Terminal-measure scheme that corrects while it predicts.
///
/// Rates are updated from the last one down.  Under the terminal measure
/// the drift of rate `i` only depends on rates above it, so by the time
/// rate `i` is reached their end-of-step values are known and the
/// corrector drift is exact in them.
#[derive(Debug, Clone, Default)]
pub struct LogNormalIpc {
    g: Vec<Real>,
}

impl EvolutionScheme for LogNormalIpc {
    type Drift = LmmDriftCalculator;
    const NAME: &'static str = "log-normal ipc";

    fn new(number_of_rates: Size) -> Self {
        Self {
            g: vec![0.0; number_of_rates],
        }
    }

    fn drift_calculator(
        pseudo_root: &Matrix,
        displacements: &[Spread],
        taus: &[Time],
        numeraire: Size,
        alive: Size,
        validate: bool,
    ) -> Result<Self::Drift> {
        log_normal_drift(pseudo_root, displacements, taus, numeraire, alive, validate)
    }

    fn check_numeraires(evolution: &EvolutionDescription, numeraires: &[Size]) -> Result<()> {
        ensure!(
            is_in_terminal_measure(evolution, numeraires),
            "terminal measure required for the iterative predictor-corrector evolver"
        );
        Ok(())
    }

    fn fixed_drift(variance: Real) -> Real {
        -0.5 * variance
    }

    fn to_evolution_space(rate: Rate, displacement: Spread) -> Real {
        (rate + displacement).ln()
    }

    fn to_rate_space(x: Real, displacement: Spread) -> Rate {
        x.exp() - displacement
    }

    fn predict(&mut self, calc: &mut Self::Drift, step: &mut Step<'_>) -> Result<()> {
        let covariance = calc.covariance();
        let n = step.forwards.len();
        ensure!(self.g.len() == n, "scheme sized for {} rates, got {n}", self.g.len());
        for i in step.alive.indices().rev() {
            let cross: Real = ((i + 1)..n).map(|j| self.g[j] * covariance[(i, j)]).sum();
            step.drifts2[i] = -cross;
            step.evolved[i] += 0.5 * (step.drifts1[i] + step.drifts2[i])
                + step.fixed_drifts[i]
                + step.pseudo_root.row_dot(i, step.brownians);
            let d = step.displacements[i];
            let f = Self::to_rate_space(step.evolved[i], d);
            step.forwards[i] = f;
            self.g[i] = step.taus[i] * (f + d) / (1.0 + step.taus[i] * f);
        }
        Ok(())
    }

    fn correct(&mut self, _calc: &mut Self::Drift, _step: &mut Step<'_>) -> Result<()> {
        Ok(())
    }
}

// ── Normal predictor-corrector ────────────────────────────────────────────────

/// Arithmetic predictor-corrector on the forwards themselves.
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalPc;

impl EvolutionScheme for NormalPc {
    type Drift = LmmNormalDriftCalculator;
    const NAME: &'static str = "normal pc";

    fn new(_number_of_rates: Size) -> Self {
        Self
    }

    fn drift_calculator(
        pseudo_root: &Matrix,
        _displacements: &[Spread],
        taus: &[Time],
        numeraire: Size,
        alive: Size,
        validate: bool,
    ) -> Result<Self::Drift> {
        Ok(LmmNormalDriftCalculator::new(pseudo_root, taus, numeraire, alive)?.with_validation(validate))
    }

    fn fixed_drift(_variance: Real) -> Real {
        0.0
    }

    fn to_evolution_space(rate: Rate, _displacement: Spread) -> Real {
        rate
    }

    fn to_rate_space(x: Real, _displacement: Spread) -> Rate {
        x
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utilities::AliveRange;
    use approx::assert_abs_diff_eq;

    #[test]
    fn coordinate_maps_are_inverse() {
        let x = LogNormalPc::to_evolution_space(0.03, 0.02);
        assert_abs_diff_eq!(LogNormalPc::to_rate_space(x, 0.02), 0.03, epsilon = 1e-15);
        assert_eq!(NormalPc::to_evolution_space(-0.01, 0.5), -0.01);
        assert_eq!(LogNormalPc::fixed_drift(0.04), -0.02);
        assert_eq!(NormalPc::fixed_drift(0.04), 0.0);
    }

    #[test]
    fn ipc_without_noise_matches_terminal_drift_at_end_of_step() {
        let n = 3;
        let a = Matrix::from_element(n, 1, 0.2);
        let taus = vec![0.5; n];
        let displacements = vec![0.0; n];
        let mut calc = LogNormalIpc::drift_calculator(&a, &displacements, &taus, n, 0, false).unwrap();
        let start = vec![0.04; n];
        let mut drifts1 = vec![0.0; n];
        calc.compute(&start, &mut drifts1).unwrap();

        let fixed: Vec<Real> = (0..n).map(|_| LogNormalIpc::fixed_drift(0.04)).collect();
        let mut evolved: Vec<Real> = start.iter().map(|&f| f.ln()).collect();
        let mut forwards = start.clone();
        let mut drifts2 = vec![0.0; n];
        let mut step = Step {
            index: 0,
            alive: AliveRange::new(0, n).unwrap(),
            pseudo_root: &a,
            fixed_drifts: &fixed,
            displacements: &displacements,
            taus: &taus,
            brownians: &[0.0],
            drifts1: &drifts1,
            drifts2: &mut drifts2,
            evolved: &mut evolved,
            forwards: &mut forwards,
        };
        let mut scheme = LogNormalIpc::new(n);
        scheme.predict(&mut calc, &mut step).unwrap();

        // The corrector drift is the terminal drift evaluated at the new forwards.
        let end = step.forwards.to_vec();
        let d2 = step.drifts2.to_vec();
        let mut expected = vec![0.0; n];
        calc.compute(&end, &mut expected).unwrap();
        for i in 0..n {
            assert_abs_diff_eq!(d2[i], expected[i], epsilon = 1e-15);
        }
        assert_eq!(d2[n - 1], 0.0);
        assert!(LogNormalIpc::check_numeraires(
            &EvolutionDescription::from_rate_times(vec![0.5, 1.0, 1.5, 2.0]).unwrap(),
            &[3, 3, 2]
        )
        .is_err());
    }
}
