//! Sensitivities of swap rates to the forward rates of a curve state.
//!
//! The swap from `t_s` to `t_e` has rate
//!
//! ```text
//! SR(s, e) = (P_s / P_e - 1) / A(s, e),    A(s, e) = Σ_{k=s}^{e-1} τ_k P_{k+1} / P_e
//! ```
//!
//! and, since `P_k / P_e` only depends on the forwards `f_k .. f_{e-1}`,
//! for `s <= j < e`
//!
//! ```text
//! ∂SR/∂f_j = r_j (P_s/P_e) / A(s, e) - (P_s/P_e - 1) r_j A(s, j) / A(s, e)²,    r_j = τ_j / (1 + τ_j f_j)
//! ```
//!
//! The Jacobians below hold one swap per row and one forward per column;
//! a "zed" matrix rescales entry `(i, j)` by `(f_j + d) / (SR_i + d)`,
//! turning it into the log-sensitivity used to map displaced log-normal
//! forward volatilities onto swap-rate volatilities.
//!
//! Rows of swaps that start before the curve's first valid index are left
//! at zero.

use crate::curve_state::{CurveState, LmmCurveState};
use crate::models::MarketModel;
use ql_core::{ensure, errors::Result, Rate, Real, Size, Spread, Volatility};
use ql_math::Matrix;

// ── Building blocks ───────────────────────────────────────────────────────────

/// Annuity of the swap `[start, end)` in units of bond `numeraire`.
pub fn annuity(cs: &dyn CurveState, start: Size, end: Size, numeraire: Size) -> Result<Real> {
    let taus = cs.rate_taus();
    (start..end).try_fold(0.0, |acc, k| Ok(acc + taus[k] * cs.discount_ratio(k + 1, numeraire)?))
}

/// Derivative of the rate of the swap `[start, end)` with respect to
/// forward `forward`; zero outside the swap.
pub fn swap_derivative(cs: &dyn CurveState, start: Size, end: Size, forward: Size) -> Result<Real> {
    let n = cs.number_of_rates();
    ensure!(start < end && end <= n, "invalid swap [{start}, {end}) on {n} rates");
    if forward < start || forward >= end {
        return Ok(0.0);
    }
    let tau = cs.rate_taus()[forward];
    let ratio = tau / (1.0 + tau * cs.forward_rate(forward)?);
    let floating = cs.discount_ratio(start, end)? - 1.0;
    let swap_annuity = annuity(cs, start, end, end)?;
    let leading = annuity(cs, start, forward, end)?;
    Ok(ratio * (floating + 1.0) / swap_annuity - floating * ratio * leading / (swap_annuity * swap_annuity))
}

fn swap_jacobian<F>(cs: &dyn CurveState, bounds: F) -> Result<Matrix>
where
    F: Fn(Size) -> (Size, Size),
{
    let n = cs.number_of_rates();
    let mut jacobian = Matrix::zeros(n, n);
    for i in cs.first_valid_index()..n {
        let (start, end) = bounds(i);
        for j in start..end {
            jacobian[(i, j)] = swap_derivative(cs, start, end, j)?;
        }
    }
    Ok(jacobian)
}

fn to_zed<F>(cs: &dyn CurveState, mut jacobian: Matrix, displacement: Spread, swap_rate: F) -> Result<Matrix>
where
    F: Fn(Size) -> Result<Rate>,
{
    let n = cs.number_of_rates();
    let first = cs.first_valid_index();
    let forwards = cs.forward_rates();
    for i in first..n {
        let denominator = swap_rate(i)? + displacement;
        for j in first..n {
            jacobian[(i, j)] *= (forwards[j] + displacement) / denominator;
        }
    }
    Ok(jacobian)
}

// ── Coterminal swaps ──────────────────────────────────────────────────────────

/// Row `i`: the swap from `t_i` to the end of the curve.
pub fn coterminal_swap_forward_jacobian(cs: &dyn CurveState) -> Result<Matrix> {
    let n = cs.number_of_rates();
    swap_jacobian(cs, |i| (i, n))
}

/// Log-sensitivities of the coterminal swap rates.
pub fn coterminal_swap_zed_matrix(cs: &dyn CurveState, displacement: Spread) -> Result<Matrix> {
    let jacobian = coterminal_swap_forward_jacobian(cs)?;
    to_zed(cs, jacobian, displacement, |i| cs.coterminal_swap_rate(i))
}

// ── Coinitial swaps ───────────────────────────────────────────────────────────

/// Row `i`: the swap from the first valid rate time to `t_{i+1}`.
pub fn coinitial_swap_forward_jacobian(cs: &dyn CurveState) -> Result<Matrix> {
    let first = cs.first_valid_index();
    swap_jacobian(cs, |i| (first, i + 1))
}

/// Log-sensitivities of the coinitial swap rates.
pub fn coinitial_swap_zed_matrix(cs: &dyn CurveState, displacement: Spread) -> Result<Matrix> {
    let first = cs.first_valid_index();
    let jacobian = coinitial_swap_forward_jacobian(cs)?;
    to_zed(cs, jacobian, displacement, |i| cs.cm_swap_rate(first, i + 1 - first))
}

// ── Constant-maturity swaps ───────────────────────────────────────────────────

/// Row `i`: the swap from `t_i` over `spanning_forwards` periods,
/// truncated at the end of the curve.
pub fn cm_swap_forward_jacobian(cs: &dyn CurveState, spanning_forwards: Size) -> Result<Matrix> {
    ensure!(spanning_forwards > 0, "spanning forwards must be positive");
    let n = cs.number_of_rates();
    swap_jacobian(cs, |i| (i, (i + spanning_forwards).min(n)))
}

/// Log-sensitivities of the constant-maturity swap rates.
pub fn cm_swap_zed_matrix(cs: &dyn CurveState, spanning_forwards: Size, displacement: Spread) -> Result<Matrix> {
    let jacobian = cm_swap_forward_jacobian(cs, spanning_forwards)?;
    to_zed(cs, jacobian, displacement, |i| cs.cm_swap_rate(i, spanning_forwards))
}

// ── Swaption volatility ───────────────────────────────────────────────────────

/// Black volatility of the swaption on `[start, end)` expiring at
/// `t_start`, freezing the zed matrix at the initial curve.
///
/// The swap rate variance is `z C z'` where `C` is the forward covariance
/// accrued over every step ending at or before the expiry and `z` the
/// swap's row of the zed matrix, displaced by the first swap rate's
/// displacement.
pub fn swaption_implied_volatility(model: &dyn MarketModel, start: Size, end: Size) -> Result<Volatility> {
    let n = model.number_of_rates();
    ensure!(start < end && end <= n, "invalid swap [{start}, {end}) on {n} rates");
    let evolution = model.evolution();
    let expiry = evolution.rate_times()[start];
    ensure!(expiry > 0.0, "swaption expiry must be positive, got {expiry}");
    let steps = evolution.evolution_times().partition_point(|&t| t <= expiry);
    ensure!(steps > 0, "no evolution step ends by the swaption expiry {expiry}");

    let mut cs = LmmCurveState::new(evolution.rate_times().to_vec())?;
    cs.set_on_forward_rates(model.initial_rates(), 0)?;
    let zed = cm_swap_zed_matrix(&cs, end - start, model.displacements()[start])?;
    let covariance = model.total_covariance(steps - 1)?;

    let mut variance = 0.0;
    for j in start..end {
        for k in start..end {
            variance += zed[(start, j)] * covariance[(j, k)] * zed[(start, k)];
        }
    }
    Ok((variance / expiry).sqrt())
}
