//! No-arbitrage drifts of forward rates.
//!
//! For a step with pseudo-root `A` (covariance `C = A·Aᵗ`) and numeraire
//! bond `N`, the drift of alive rate `i` is
//!
//! ```text
//!   μ_i = + Σ_{N <= j <= i}   g_j · C_ij      if i >= N
//!   μ_i = - Σ_{i <  j <  N}   g_j · C_ij      if i <  N
//! ```
//!
//! where `g_j` depends on the model:
//!
//! | calculator                 | `g_j`                          |
//! |----------------------------|--------------------------------|
//! | [`LmmDriftCalculator`]       | `τ_j (f_j + d_j) / (1 + τ_j f_j)` |
//! | [`LmmNormalDriftCalculator`] | `τ_j / (1 + τ_j f_j)`             |
//!
//! Both calculators offer the full-factor O(n²) sum over `C` and an
//! O(n·F) recursion over the columns of `A`; [`DriftCalculator::compute`]
//! picks the latter whenever the model has fewer factors than rates.

mod lmm;
mod lmm_normal;

pub use lmm::LmmDriftCalculator;
pub use lmm_normal::LmmNormalDriftCalculator;

use ql_core::{ensure, errors::Result, Rate, Real, Size, Spread, Time};
use ql_math::Matrix;

/// Drift computation for one evolution step.
pub trait DriftCalculator: std::fmt::Debug + Send + Sync {
    /// Drifts for alive rates given full-length `forwards`.  Entries of
    /// `drifts` below [`alive`](Self::alive) are left untouched.
    fn compute(&mut self, forwards: &[Rate], drifts: &mut [Real]) -> Result<()>;

    /// Full-factor computation over the step covariance.
    fn compute_plain(&mut self, forwards: &[Rate], drifts: &mut [Real]) -> Result<()>;

    /// Factor-reduced computation over the pseudo-root.
    fn compute_reduced(&mut self, forwards: &[Rate], drifts: &mut [Real]) -> Result<()>;

    /// Index of the numeraire bond.
    fn numeraire(&self) -> Size;

    /// First alive rate.
    fn alive(&self) -> Size;

    /// Pseudo-root of the step.
    fn pseudo_root(&self) -> &Matrix;

    /// Covariance `A·Aᵗ` of the step.
    fn covariance(&self) -> &Matrix;
}

// ── Shared kernel ─────────────────────────────────────────────────────────────

/// State and loops common to the log-normal and normal calculators.  The
/// model-specific part is the factor `g_j`, written into `tmp` by the
/// owning calculator before either sum runs.
#[derive(Clone, Debug)]
pub(crate) struct DriftKernel {
    number_of_rates: Size,
    number_of_factors: Size,
    numeraire: Size,
    alive: Size,
    displacements: Vec<Spread>,
    one_over_taus: Vec<Real>,
    pseudo_root: Matrix,
    covariance: Matrix,
    downs: Vec<Size>,
    ups: Vec<Size>,
    tmp: Vec<Real>,
    e: Matrix,
    validate: bool,
}

impl DriftKernel {
    pub(crate) fn new(
        pseudo_root: &Matrix,
        displacements: &[Spread],
        taus: &[Time],
        numeraire: Size,
        alive: Size,
    ) -> Result<Self> {
        let n = taus.len();
        let factors = pseudo_root.cols();
        ensure!(n > 0, "dimension mismatch: no rates");
        ensure!(
            factors > 0 && factors <= n,
            "number of factors ({factors}) must be in [1, {n}]"
        );
        ensure!(
            displacements.len() == n,
            "displacements ({}) mismatch with rates ({n})",
            displacements.len()
        );
        ensure!(alive < n, "alive index ({alive}) must be less than the number of rates ({n})");
        ensure!(numeraire <= n, "numeraire ({numeraire}) must not exceed the number of rates ({n})");
        ensure!(
            numeraire >= alive,
            "numeraire ({numeraire}) must not be below the alive index ({alive})"
        );
        ensure!(
            pseudo_root.rows() == n,
            "pseudo-root rows ({}) mismatch with rates ({n})",
            pseudo_root.rows()
        );
        ensure!(taus.iter().all(|&t| t > 0.0), "accrual fractions must be positive");

        Ok(Self {
            number_of_rates: n,
            number_of_factors: factors,
            numeraire,
            alive,
            displacements: displacements.to_vec(),
            one_over_taus: taus.iter().map(|t| 1.0 / t).collect(),
            pseudo_root: pseudo_root.clone(),
            covariance: pseudo_root.outer_product(),
            downs: (0..n).map(|k| (k + 1).min(numeraire)).collect(),
            ups: (0..n).map(|k| (k + 1).max(numeraire)).collect(),
            tmp: vec![0.0; n],
            e: Matrix::zeros(factors, n),
            validate: false,
        })
    }

    pub(crate) fn set_validation(&mut self, enabled: bool) {
        self.validate = enabled;
    }

    pub(crate) fn is_full_factor(&self) -> bool {
        self.number_of_factors == self.number_of_rates
    }

    pub(crate) fn numeraire(&self) -> Size {
        self.numeraire
    }

    pub(crate) fn alive(&self) -> Size {
        self.alive
    }

    pub(crate) fn displacements(&self) -> &[Spread] {
        &self.displacements
    }

    pub(crate) fn pseudo_root(&self) -> &Matrix {
        &self.pseudo_root
    }

    pub(crate) fn covariance(&self) -> &Matrix {
        &self.covariance
    }

    /// Check buffer sizes and, if enabled, the forwards themselves; then
    /// fill `tmp[alive..]` with `factor(f_k, 1/τ_k, d_k)`.
    pub(crate) fn prepare<F>(&mut self, forwards: &[Rate], drifts: &[Real], factor: F) -> Result<()>
    where
        F: Fn(Rate, Real, Spread) -> Real,
    {
        let n = self.number_of_rates;
        ensure!(
            forwards.len() == n && drifts.len() == n,
            "forwards ({}) and drifts ({}) must both hold {n} rates",
            forwards.len(),
            drifts.len()
        );
        if self.validate {
            for k in self.alive..n {
                let f = forwards[k];
                ensure!(f.is_finite(), "forward rate {k} is not finite ({f})");
                ensure!(
                    1.0 + f / self.one_over_taus[k] > 0.0,
                    "1 + tau*f is not positive for rate {k} (f = {f})"
                );
            }
        }
        for k in self.alive..n {
            self.tmp[k] = factor(forwards[k], self.one_over_taus[k], self.displacements[k]);
        }
        Ok(())
    }

    pub(crate) fn plain(&self, drifts: &mut [Real]) {
        for i in self.alive..self.number_of_rates {
            let (down, up) = (self.downs[i], self.ups[i]);
            let sum: Real = (down..up).map(|j| self.tmp[j] * self.covariance[(i, j)]).sum();
            drifts[i] = if self.numeraire > i { -sum } else { sum };
        }
    }

    pub(crate) fn reduced(&mut self, drifts: &mut [Real]) {
        let n = self.number_of_rates;
        let big_n = self.numeraire;
        let a = &self.pseudo_root;
        let e = &mut self.e;

        if big_n > 0 {
            for r in 0..self.number_of_factors {
                e[(r, big_n - 1)] = 0.0;
            }
            if big_n > self.alive {
                drifts[big_n - 1] = 0.0;
            }
        }

        // Rates before the numeraire: backward accumulation.
        for i in (self.alive..big_n.saturating_sub(1)).rev() {
            drifts[i] = 0.0;
            for r in 0..self.number_of_factors {
                e[(r, i)] = e[(r, i + 1)] + self.tmp[i + 1] * a[(i + 1, r)];
                drifts[i] -= e[(r, i)] * a[(i, r)];
            }
        }

        // Rates at or after the numeraire: forward accumulation.
        for i in big_n..n {
            drifts[i] = 0.0;
            for r in 0..self.number_of_factors {
                let previous = if i == 0 { 0.0 } else { e[(r, i - 1)] };
                e[(r, i)] = previous + self.tmp[i] * a[(i, r)];
                drifts[i] += e[(r, i)] * a[(i, r)];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_checks() {
        let a = Matrix::from_element(3, 1, 0.1);
        let d = [0.0; 3];
        let taus = [0.5; 3];
        assert!(DriftKernel::new(&a, &d, &taus, 3, 0).is_ok());
        assert!(DriftKernel::new(&a, &d, &taus, 4, 0).is_err());
        assert!(DriftKernel::new(&a, &d, &taus, 1, 2).is_err());
        assert!(DriftKernel::new(&a, &d, &taus, 3, 3).is_err());
        assert!(DriftKernel::new(&a, &d[..2], &taus, 3, 0).is_err());
        assert!(DriftKernel::new(&Matrix::from_element(2, 1, 0.1), &d, &taus, 3, 0).is_err());
        assert!(DriftKernel::new(&Matrix::from_element(3, 4, 0.1), &d, &taus, 3, 0).is_err());
    }

    #[test]
    fn bounds_follow_numeraire() {
        let a = Matrix::identity(4);
        let k = DriftKernel::new(&a, &[0.0; 4], &[1.0; 4], 2, 0).unwrap();
        assert_eq!(k.downs, vec![1, 2, 2, 2]);
        assert_eq!(k.ups, vec![2, 2, 3, 4]);
        assert!(k.is_full_factor());
    }
}
