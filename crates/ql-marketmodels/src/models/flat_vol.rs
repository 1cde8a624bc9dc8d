use super::{check_curve, MarketModel};
use crate::evolution_description::EvolutionDescription;
use ql_core::{ensure, ensure_index, errors::Result, Rate, Size, Spread, Volatility};
use ql_math::{rank_reduced_sqrt, Matrix};

/// Flat (time-homogeneous per rate) volatilities with a fixed correlation.
///
/// Rate `i` accrues variance `σ_i² Δt` during a step, where `Δt` is the
/// part of the step before the rate fixes.  Correlation is reduced to the
/// requested number of factors once, by spectral truncation, and each
/// step's pseudo-root is that reduced root with rows scaled by the step
/// volatilities.
#[derive(Clone, Debug)]
pub struct FlatVol {
    evolution: EvolutionDescription,
    initial_rates: Vec<Rate>,
    displacements: Vec<Spread>,
    number_of_factors: Size,
    pseudo_roots: Vec<Matrix>,
}

impl FlatVol {
    /// Build the per-step pseudo-roots.
    pub fn new(
        volatilities: &[Volatility],
        correlation: &Matrix,
        evolution: EvolutionDescription,
        number_of_factors: Size,
        initial_rates: Vec<Rate>,
        displacements: Vec<Spread>,
    ) -> Result<Self> {
        check_curve(&evolution, &initial_rates, &displacements)?;
        let n = evolution.number_of_rates();
        ensure!(
            volatilities.len() == n,
            "volatilities ({}) mismatch with rates ({n})",
            volatilities.len()
        );
        ensure!(
            volatilities.iter().all(|v| v.is_finite() && *v >= 0.0),
            "volatilities must be finite and non-negative"
        );
        ensure!(
            correlation.rows() == n && correlation.cols() == n,
            "correlation is {}×{}, expected {n}×{n}",
            correlation.rows(),
            correlation.cols()
        );
        ensure!(
            number_of_factors > 0 && number_of_factors <= n,
            "number of factors ({number_of_factors}) must be in [1, {n}]"
        );

        let reduced = rank_reduced_sqrt(correlation, number_of_factors, 1.0)?;

        let steps = evolution.number_of_steps();
        let mut pseudo_roots = Vec::with_capacity(steps);
        let mut previous_stop = vec![0.0; n];
        for k in 0..steps {
            let mut step_vols = vec![0.0; n];
            for i in 0..n {
                let stop = evolution.effective_stop_time(k, i)?;
                step_vols[i] = volatilities[i] * (stop - previous_stop[i]).max(0.0).sqrt();
                previous_stop[i] = stop;
            }
            pseudo_roots.push(reduced.scale_rows(&step_vols));
        }

        Ok(Self {
            evolution,
            initial_rates,
            displacements,
            number_of_factors,
            pseudo_roots,
        })
    }
}

impl MarketModel for FlatVol {
    fn initial_rates(&self) -> &[Rate] {
        &self.initial_rates
    }

    fn displacements(&self) -> &[Spread] {
        &self.displacements
    }

    fn evolution(&self) -> &EvolutionDescription {
        &self.evolution
    }

    fn number_of_factors(&self) -> Size {
        self.number_of_factors
    }

    fn pseudo_root(&self, step: Size) -> Result<&Matrix> {
        ensure_index!(step, self.pseudo_roots.len());
        Ok(&self.pseudo_roots[step])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::exponential_forward_correlation;
    use approx::assert_abs_diff_eq;
    use ql_core::Real;
    use ql_math::get_covariance;

    fn rate_times() -> Vec<Real> {
        (0..=4).map(|i| 0.5 + 0.5 * i as Real).collect()
    }

    #[test]
    fn full_factor_reproduces_black_variances() {
        let times = rate_times();
        let evolution = EvolutionDescription::from_rate_times(times.clone()).unwrap();
        let rho = exponential_forward_correlation(&times, 0.5, 0.2).unwrap();
        let vols = [0.2, 0.18, 0.16, 0.15];
        let model = FlatVol::new(&vols, &rho, evolution, 4, vec![0.04; 4], vec![0.0; 4]).unwrap();

        // Rate i is alive during steps 0..=i and accrues σ_i² t_i in total.
        for i in 0..4 {
            let total = model.total_covariance(i).unwrap();
            assert_abs_diff_eq!(total[(i, i)], vols[i] * vols[i] * times[i], epsilon = 1e-12);
        }
        // First step covers [0, 0.5] for every rate.
        let expected = get_covariance(&vols, &rho).unwrap().scale(0.5);
        let first = model.covariance(0).unwrap();
        for i in 0..4 {
            for j in 0..4 {
                assert_abs_diff_eq!(first[(i, j)], expected[(i, j)], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn dead_rates_have_zero_loadings() {
        let times = rate_times();
        let evolution = EvolutionDescription::from_rate_times(times.clone()).unwrap();
        let rho = exponential_forward_correlation(&times, 0.5, 0.2).unwrap();
        let model = FlatVol::new(&[0.2; 4], &rho, evolution, 2, vec![0.04; 4], vec![0.0; 4]).unwrap();
        let root = model.pseudo_root(2).unwrap();
        assert_eq!(root.cols(), 2);
        for r in 0..2 {
            assert_eq!(root[(0, r)], 0.0);
            assert_eq!(root[(1, r)], 0.0);
        }
        // rows are rescaled onto the step variance even after truncation
        let cov = model.covariance(2).unwrap();
        assert_abs_diff_eq!(cov[(3, 3)], 0.04 * 0.5, epsilon = 1e-12);
    }

    #[test]
    fn rejects_bad_inputs() {
        let times = rate_times();
        let evolution = EvolutionDescription::from_rate_times(times.clone()).unwrap();
        let rho = exponential_forward_correlation(&times, 0.5, 0.2).unwrap();
        assert!(FlatVol::new(&[0.2; 3], &rho, evolution.clone(), 2, vec![0.04; 4], vec![0.0; 4]).is_err());
        assert!(FlatVol::new(&[0.2; 4], &rho, evolution.clone(), 5, vec![0.04; 4], vec![0.0; 4]).is_err());
        assert!(FlatVol::new(&[-0.2; 4], &rho, evolution, 2, vec![0.04; 4], vec![0.0; 4]).is_err());
    }
}
