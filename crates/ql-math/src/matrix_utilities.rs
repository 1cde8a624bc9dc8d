//! Matrix decompositions used to build factor loadings.
//!
//! Wraps nalgebra's symmetric eigen-decomposition into the pseudo
//! square-root helpers a factor model needs: a full pseudo-root, a
//! spectral rank-reduced root, and covariance assembly from volatilities
//! and correlations.

use crate::matrix::Matrix;
use ql_core::{
    ensure, ensure_post,
    errors::{Error, Result},
    Real,
};

/// Eigenvalue decomposition of a symmetric real matrix.
///
/// Returns `(eigenvalues, eigenvectors)` sorted by **descending**
/// eigenvalue; column `k` of the eigenvector matrix belongs to
/// `eigenvalues[k]`.
pub fn symmetric_eigen(m: &Matrix) -> Result<(Vec<Real>, Matrix)> {
    ensure!(m.is_square(), "matrix must be square, got {}×{}", m.rows(), m.cols());
    ensure!(m.is_finite(), "matrix contains non-finite entries");
    let eigen = m.inner().clone().symmetric_eigen();
    let n = m.rows();

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        eigen.eigenvalues[b]
            .partial_cmp(&eigen.eigenvalues[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let values = order.iter().map(|&k| eigen.eigenvalues[k]).collect();
    let vectors = Matrix::from_fn(n, n, |i, j| eigen.eigenvectors[(i, order[j])]);
    Ok((values, vectors))
}

/// Pseudo square-root of a symmetric positive-semidefinite matrix.
///
/// Computes `S` such that `S * Sᵀ ≈ M` using the eigenvalue decomposition,
/// zeroing out negative eigenvalues.
pub fn pseudo_sqrt(m: &Matrix) -> Result<Matrix> {
    let (values, vectors) = symmetric_eigen(m)?;
    let roots: Vec<Real> = values.iter().map(|&v| v.max(0.0).sqrt()).collect();
    Ok(&vectors * &Matrix::from_diagonal(&roots))
}

/// Spectral rank-reduced pseudo square-root.
///
/// Keeps the largest eigen-components until `retained_fraction` of the
/// total variance is explained (capped at `max_rank`), then rescales every
/// row so that the diagonal of `S·Sᵀ` reproduces the diagonal of `m`
/// exactly.  The result always has `min(max_rank, n)` columns; columns past
/// the retained components are zero.
pub fn rank_reduced_sqrt(m: &Matrix, max_rank: usize, retained_fraction: Real) -> Result<Matrix> {
    ensure!(max_rank > 0, "max rank must be positive");
    ensure!(
        retained_fraction > 0.0 && retained_fraction <= 1.0,
        "retained fraction must be in (0, 1], got {retained_fraction}"
    );
    let (values, vectors) = symmetric_eigen(m)?;
    let n = values.len();
    ensure!(n > 0, "empty matrix");

    let tolerance = 1e-12 * values[0].abs().max(1.0);
    if let Some(&worst) = values.last() {
        ensure!(
            worst >= -tolerance,
            "matrix is not positive semi-definite (eigenvalue {worst})"
        );
    }
    let values: Vec<Real> = values.into_iter().map(|v| v.max(0.0)).collect();

    let total: Real = values.iter().sum();
    let enough = retained_fraction * total;
    let mut explained = values[0];
    let mut retained = 1;
    while explained < enough && retained < n {
        explained += values[retained];
        retained += 1;
    }
    let columns = max_rank.min(n);
    let retained = retained.min(columns);

    let mut root = Matrix::from_fn(n, columns, |i, k| {
        if k < retained {
            vectors[(i, k)] * values[k].sqrt()
        } else {
            0.0
        }
    });

    // rescale rows onto the original diagonal
    for i in 0..n {
        let norm = root.row_row_dot(i, i);
        if norm > 0.0 {
            let factor = (m[(i, i)] / norm).sqrt();
            for k in 0..columns {
                root[(i, k)] *= factor;
            }
        }
    }
    ensure_post!(root.is_finite(), "rank-reduced root has non-finite entries");
    Ok(root)
}

/// Build a covariance matrix from volatilities and a correlation matrix.
///
/// `C_ij = σ_i ρ_ij σ_j`.
pub fn get_covariance(volatilities: &[Real], correlation: &Matrix) -> Result<Matrix> {
    let n = volatilities.len();
    if correlation.rows() != n || correlation.cols() != n {
        return Err(Error::InvalidArgument(format!(
            "correlation matrix must be {n}×{n}, got {}×{}",
            correlation.rows(),
            correlation.cols()
        )));
    }
    Ok(Matrix::from_fn(n, n, |i, j| {
        volatilities[i] * correlation[(i, j)] * volatilities[j]
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn exponential_correlation(n: usize, beta: Real) -> Matrix {
        Matrix::from_fn(n, n, |i, j| (-beta * (i as Real - j as Real).abs()).exp())
    }

    #[test]
    fn eigenvalues_sorted_descending() {
        let m = Matrix::from_row_slice(3, 3, &[2.0, 0.0, 0.0, 0.0, 5.0, 0.0, 0.0, 0.0, 1.0]);
        let (values, vectors) = symmetric_eigen(&m).unwrap();
        assert_abs_diff_eq!(values[0], 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(values[1], 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(values[2], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(vectors[(1, 0)].abs(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn pseudo_sqrt_reproduces_matrix() {
        let m = exponential_correlation(4, 0.3);
        let s = pseudo_sqrt(&m).unwrap();
        let back = s.outer_product();
        for i in 0..4 {
            for j in 0..4 {
                assert_abs_diff_eq!(back[(i, j)], m[(i, j)], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn full_rank_reduction_is_exact() {
        let m = exponential_correlation(5, 0.1);
        let s = rank_reduced_sqrt(&m, 5, 1.0).unwrap();
        assert_eq!(s.cols(), 5);
        let back = s.outer_product();
        for i in 0..5 {
            for j in 0..5 {
                assert_abs_diff_eq!(back[(i, j)], m[(i, j)], epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn reduced_root_keeps_unit_diagonal() {
        let m = exponential_correlation(6, 0.2);
        let s = rank_reduced_sqrt(&m, 2, 1.0).unwrap();
        assert_eq!(s.rows(), 6);
        assert_eq!(s.cols(), 2);
        let back = s.outer_product();
        for i in 0..6 {
            assert_abs_diff_eq!(back[(i, i)], 1.0, epsilon = 1e-12);
            for j in 0..6 {
                assert!(back[(i, j)] <= 1.0 + 1e-12);
            }
        }
    }

    #[test]
    fn rejects_indefinite_matrix() {
        let m = Matrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 1.0]);
        assert!(rank_reduced_sqrt(&m, 2, 1.0).is_err());
        assert!(pseudo_sqrt(&m).is_ok());
    }

    #[test]
    fn covariance_from_vols() {
        let corr = Matrix::from_row_slice(2, 2, &[1.0, 0.5, 0.5, 1.0]);
        let cov = get_covariance(&[0.2, 0.1], &corr).unwrap();
        assert_abs_diff_eq!(cov[(0, 0)], 0.04, epsilon = 1e-15);
        assert_abs_diff_eq!(cov[(0, 1)], 0.01, epsilon = 1e-15);
        assert_abs_diff_eq!(cov[(1, 1)], 0.01, epsilon = 1e-15);
        assert!(get_covariance(&[0.2], &corr).is_err());
    }
}
