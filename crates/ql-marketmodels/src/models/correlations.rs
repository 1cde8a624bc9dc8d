use ql_core::{ensure, errors::Result, Real, Time};
use ql_math::Matrix;

/// `ρ_ij = L + (1 - L)·exp(-β |t_i - t_j|)` over the fixing times
/// `rate_times[..n]`.
pub fn exponential_forward_correlation(rate_times: &[Time], long_term_corr: Real, beta: Real) -> Result<Matrix> {
    ensure!(rate_times.len() >= 2, "at least two rate times are required");
    ensure!(
        (0.0..=1.0).contains(&long_term_corr),
        "long term correlation ({long_term_corr}) outside [0, 1]"
    );
    ensure!(beta >= 0.0, "negative beta ({beta}) not allowed");
    let n = rate_times.len() - 1;
    Ok(Matrix::from_fn(n, n, |i, j| {
        if i == j {
            1.0
        } else {
            long_term_corr + (1.0 - long_term_corr) * (-beta * (rate_times[i] - rate_times[j]).abs()).exp()
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn decays_towards_long_term_level() {
        let times = [0.5, 1.0, 1.5, 11.5];
        let rho = exponential_forward_correlation(&times, 0.5, 0.2).unwrap();
        assert_eq!(rho.rows(), 3);
        assert_eq!(rho[(1, 1)], 1.0);
        assert_abs_diff_eq!(rho[(0, 1)], 0.5 + 0.5 * (-0.1f64).exp(), epsilon = 1e-15);
        assert_eq!(rho[(0, 2)], rho[(2, 0)]);
        assert!(rho[(0, 2)] < rho[(0, 1)]);
        assert!(exponential_forward_correlation(&times, 1.5, 0.2).is_err());
        assert!(exponential_forward_correlation(&times, 0.5, -1.0).is_err());
    }
}
