use super::{DriftCalculator, DriftKernel};
use ql_core::{errors::Result, Rate, Real, Size, Spread, Time};
use ql_math::Matrix;

/// Drifts of log-forwards `ln(f + d)` under a displaced log-normal model.
#[derive(Clone, Debug)]
pub struct LmmDriftCalculator {
    kernel: DriftKernel,
    taus: Vec<Time>,
}

impl LmmDriftCalculator {
    /// Bind a calculator to one step.
    ///
    /// `pseudo_root` is `n × F`; `numeraire` must lie in `[alive, n]`.
    pub fn new(
        pseudo_root: &Matrix,
        displacements: &[Spread],
        taus: &[Time],
        numeraire: Size,
        alive: Size,
    ) -> Result<Self> {
        Ok(Self {
            kernel: DriftKernel::new(pseudo_root, displacements, taus, numeraire, alive)?,
            taus: taus.to_vec(),
        })
    }

    /// Reject non-finite forwards and `1 + τ·f <= 0` before computing.
    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.kernel.set_validation(enabled);
        self
    }

    /// Accrual fractions.
    pub fn taus(&self) -> &[Time] {
        &self.taus
    }

    /// Displacements.
    pub fn displacements(&self) -> &[Spread] {
        self.kernel.displacements()
    }

    fn prepare(&mut self, forwards: &[Rate], drifts: &[Real]) -> Result<()> {
        self.kernel
            .prepare(forwards, drifts, |f, one_over_tau, d| (f + d) / (one_over_tau + f))
    }
}

impl DriftCalculator for LmmDriftCalculator {
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

    fn two_factor_root(n: usize) -> Matrix {
        Matrix::from_fn(n, 2, |i, r| {
            let t = i as Real / n as Real;
            if r == 0 {
                0.15 * (1.0 - 0.3 * t)
            } else {
                0.05 * (t - 0.5)
            }
        })
    }

    #[test]
    fn plain_and_reduced_agree_for_every_numeraire() {
        let n = 6;
        let a = two_factor_root(n);
        let fwds: Vec<Rate> = (0..n).map(|i| 0.03 + 0.002 * i as Real).collect();
        let d = vec![0.01; n];
        let taus = vec![0.5; n];
        for alive in 0..n {
            for numeraire in alive..=n {
                let mut calc = LmmDriftCalculator::new(&a, &d, &taus, numeraire, alive).unwrap();
                let mut plain = vec![0.0; n];
                let mut reduced = vec![0.0; n];
                calc.compute_plain(&fwds, &mut plain).unwrap();
                calc.compute_reduced(&fwds, &mut reduced).unwrap();
                for i in alive..n {
                    assert_abs_diff_eq!(plain[i], reduced[i], epsilon = 1e-15);
                }
            }
        }
    }

    #[test]
    fn numeraire_rate_has_zero_drift() {
        let n = 4;
        let a = two_factor_root(n);
        let fwds = vec![0.04; n];
        let taus = vec![0.5; n];
        let mut calc = LmmDriftCalculator::new(&a, &[0.0; 4], &taus, 2, 0).unwrap();
        let mut drifts = vec![0.0; n];
        calc.compute(&fwds, &mut drifts).unwrap();
        assert_eq!(drifts[1], 0.0);
        assert!(drifts[0] < 0.0);
        assert!(drifts[2] > 0.0 && drifts[3] > drifts[2]);
    }

    #[test]
    fn validation_rejects_degenerate_forwards() {
        let a = Matrix::from_element(2, 1, 0.1);
        let mut calc = LmmDriftCalculator::new(&a, &[0.0; 2], &[0.5; 2], 2, 0)
            .unwrap()
            .with_validation(true);
        let mut drifts = vec![0.0; 2];
        assert!(calc.compute(&[0.03, Real::NAN], &mut drifts).is_err());
        assert!(calc.compute(&[0.03, -2.5], &mut drifts).is_err());
        assert!(calc.compute(&[0.03, 0.04], &mut drifts).is_ok());

        let mut unchecked = LmmDriftCalculator::new(&a, &[0.0; 2], &[0.5; 2], 2, 0).unwrap();
        unchecked.compute(&[0.03, Real::NAN], &mut drifts).unwrap();
        assert!(drifts[0].is_nan());
    }

    #[test]
    fn buffer_sizes_are_checked() {
        let a = Matrix::from_element(2, 1, 0.1);
        let mut calc = LmmDriftCalculator::new(&a, &[0.0; 2], &[0.5; 2], 2, 0).unwrap();
        let mut short = vec![0.0; 1];
        assert!(calc.compute(&[0.03, 0.04], &mut short).is_err());
    }
}
