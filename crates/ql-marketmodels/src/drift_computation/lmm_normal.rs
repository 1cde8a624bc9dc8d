use super::{DriftCalculator, DriftKernel};
use ql_core::{errors::Result, Rate, Real, Size, Time};
use ql_math::Matrix;

/// Drifts of forwards under a normal (Bachelier) forward-rate model.
///
/// The covariance is the covariance of absolute rate changes, so the
/// factor is `τ_j / (1 + τ_j f_j)` and there are no displacements.
#[derive(Clone, Debug)]
pub struct LmmNormalDriftCalculator {
    kernel: DriftKernel,
}

impl LmmNormalDriftCalculator {
    /// Bind a calculator to one step.
    pub fn new(pseudo_root: &Matrix, taus: &[Time], numeraire: Size, alive: Size) -> Result<Self> {
        let zero_displacements = vec![0.0; taus.len()];
        Ok(Self {
            kernel: DriftKernel::new(pseudo_root, &zero_displacements, taus, numeraire, alive)?,
        })
    }

    /// Reject non-finite forwards and `1 + τ·f <= 0` before computing.
    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.kernel.set_validation(enabled);
        self
    }

    fn prepare(&mut self, forwards: &[Rate], drifts: &[Real]) -> Result<()> {
        self.kernel
            .prepare(forwards, drifts, |f, one_over_tau, _| 1.0 / (one_over_tau + f))
    }
}

impl DriftCalculator for LmmNormalDriftCalculator {
    fn compute(&mut self, forwards: &[Rate], drifts: &mut [Real]) -> Result<()> {
        if self.kernel.is_full_factor() {
            self.compute_plain(forwards, drifts)
        } else {
            self.compute_reduced(forwards, drifts)
        }
    }

    fn compute_plain(&mut self, forwards: &[Rate], drifts: &mut [Real]) -> Result<()> {
        self.prepare(forwards, drifts)?;
        self.kernel.plain(drifts);
        Ok(())
    }

    fn compute_reduced(&mut self, forwards: &[Rate], drifts: &mut [Real]) -> Result<()> {
        self.prepare(forwards, drifts)?;
        self.kernel.reduced(drifts);
        Ok(())
    }

    fn numeraire(&self) -> Size {
        self.kernel.numeraire()
    }

    fn alive(&self) -> Size {
        self.kernel.alive()
    }

    fn pseudo_root(&self) -> &Matrix {
        self.kernel.pseudo_root()
    }

    fn covariance(&self) -> &Matrix {
        self.kernel.covariance()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn single_factor_terminal_drift_matches_closed_form() {
        // Absolute vol 1% on every rate, perfectly correlated.
        let n = 4;
        let sigma = 0.01;
        let a = Matrix::from_element(n, 1, sigma);
        let taus = vec![0.5; n];
        let f = 0.05;
        let fwds = vec![f; n];
        let mut calc = LmmNormalDriftCalculator::new(&a, &taus, n, 0).unwrap();
        let mut drifts = vec![0.0; n];
        calc.compute(&fwds, &mut drifts).unwrap();
        for i in 0..n {
            let expected = -((i + 1)..n)
                .map(|_| sigma * sigma * 0.5 / (1.0 + 0.5 * f))
                .sum::<Real>();
            assert_abs_diff_eq!(drifts[i], expected, epsilon = 1e-16);
        }
    }

    #[test]
    fn plain_and_reduced_agree() {
        let n = 5;
        let a = Matrix::from_fn(n, 3, |i, r| 0.01 / (1.0 + (i + r) as Real));
        let taus = vec![0.25; n];
        let fwds: Vec<Rate> = (0..n).map(|i| 0.02 + 0.001 * i as Real).collect();
        for numeraire in 1..=n {
            let mut calc = LmmNormalDriftCalculator::new(&a, &taus, numeraire, 1).unwrap();
            let mut plain = vec![0.0; n];
            let mut reduced = vec![0.0; n];
            calc.compute_plain(&fwds, &mut plain).unwrap();
            calc.compute_reduced(&fwds, &mut reduced).unwrap();
            for i in 1..n {
                assert_abs_diff_eq!(plain[i], reduced[i], epsilon = 1e-18);
            }
        }
    }
}
