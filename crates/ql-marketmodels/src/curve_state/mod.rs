//! Curve states: a snapshot of the simulated yield curve.
//!
//! A curve state is defined on `n + 1` rate times `t_0 < … < t_n` and holds
//! the `n` simply-compounded forward rates between them.  Every other
//! quantity a product may ask for (discount ratios, coterminal and
//! constant-maturity swap rates and annuities) is derived from the discount
//! ratios `d_k = P(t, t_k) / P(t, t_first)`.
//!
//! Only indices at or above [`CurveState::first_valid_index`] are
//! meaningful; rates below it have already fixed.

mod lmm;

pub use lmm::LmmCurveState;

use ql_core::{
    ensure,
    errors::Result,
    DiscountFactor, Rate, Real, Size, Time,
};

/// Read access to a simulated curve.
pub trait CurveState: std::fmt::Debug + Send + Sync {
    /// The `n + 1` rate times.
    fn rate_times(&self) -> &[Time];

    /// The `n` accrual fractions `t_{i+1} - t_i`.
    fn rate_taus(&self) -> &[Time];

    /// Number of forward rates `n`.
    fn number_of_rates(&self) -> Size {
        self.rate_taus().len()
    }

    /// First index whose rate is still meaningful.
    fn first_valid_index(&self) -> Size;

    /// All forward rates (entries below the first valid index are stale).
    fn forward_rates(&self) -> &[Rate];

    /// Forward rate `i`.
    fn forward_rate(&self, i: Size) -> Result<Rate>;

    /// `P(t, t_i) / P(t, t_j)`.
    fn discount_ratio(&self, i: Size, j: Size) -> Result<DiscountFactor>;

    /// Swap rate from `t_i` to the last rate time.
    fn coterminal_swap_rate(&self, i: Size) -> Result<Rate>;

    /// Annuity of the coterminal swap starting at `t_i`, in units of the
    /// `numeraire` bond.
    fn coterminal_swap_annuity(&self, numeraire: Size, i: Size) -> Result<Real>;

    /// Swap rate from `t_i` spanning `spanning_forwards` periods (truncated
    /// at the end of the curve).
    fn cm_swap_rate(&self, i: Size, spanning_forwards: Size) -> Result<Rate>;

    /// Annuity of the constant-maturity swap starting at `t_i`, in units
    /// of the `numeraire` bond.
    fn cm_swap_annuity(&self, numeraire: Size, i: Size, spanning_forwards: Size) -> Result<Real>;

    /// Boxed copy, so callers can snapshot a state behind a trait object.
    fn clone_box(&self) -> Box<dyn CurveState>;
}

impl Clone for Box<dyn CurveState> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Rebuild forwards `[first, n)` from discount ratios.
pub fn forwards_from_discount_ratios(
    first_valid_index: Size,
    discount_ratios: &[DiscountFactor],
    taus: &[Time],
    forwards: &mut [Rate],
) -> Result<()> {
    let n = taus.len();
    ensure!(
        discount_ratios.len() == n + 1 && forwards.len() == n,
        "size mismatch: {} discount ratios, {} taus, {} forwards",
        discount_ratios.len(),
        n,
        forwards.len()
    );
    ensure!(first_valid_index < n, "first valid index {first_valid_index} out of range");
    for i in first_valid_index..n {
        forwards[i] = (discount_ratios[i] / discount_ratios[i + 1] - 1.0) / taus[i];
    }
    Ok(())
}

/// Coterminal swap rates and annuities (annuities in the units of the
/// discount ratios) for every start index in `[first, n)`.
pub fn coterminal_from_discount_ratios(
    first_valid_index: Size,
    discount_ratios: &[DiscountFactor],
    taus: &[Time],
    swap_rates: &mut [Rate],
    annuities: &mut [Real],
) -> Result<()> {
    let n = taus.len();
    ensure!(
        discount_ratios.len() == n + 1 && swap_rates.len() == n && annuities.len() == n,
        "size mismatch in coterminal computation"
    );
    ensure!(first_valid_index < n, "first valid index {first_valid_index} out of range");

    annuities[n - 1] = discount_ratios[n] * taus[n - 1];
    swap_rates[n - 1] = (discount_ratios[n - 1] - discount_ratios[n]) / annuities[n - 1];
    for i in (first_valid_index..n - 1).rev() {
        annuities[i] = annuities[i + 1] + discount_ratios[i + 1] * taus[i];
        swap_rates[i] = (discount_ratios[i] - discount_ratios[n]) / annuities[i];
    }
    Ok(())
}

/// Constant-maturity swap rate and annuity starting at `i`.
pub fn constant_maturity_from_discount_ratios(
    i: Size,
    spanning_forwards: Size,
    discount_ratios: &[DiscountFactor],
    taus: &[Time],
) -> Result<(Rate, Real)> {
    let n = taus.len();
    ensure!(spanning_forwards > 0, "spanning forwards must be positive");
    ensure!(i < n, "start index {i} out of range [0, {n})");
    ensure!(discount_ratios.len() == n + 1, "size mismatch in constant-maturity computation");
    let last = (i + spanning_forwards).min(n);
    let annuity: Real = (i..last).map(|j| discount_ratios[j + 1] * taus[j]).sum();
    Ok(((discount_ratios[i] - discount_ratios[last]) / annuity, annuity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn forwards_round_trip_through_discount_ratios() {
        let taus = [0.5, 0.5, 0.5];
        let fwds = [0.03, 0.035, 0.04];
        let mut d = vec![1.0; 4];
        for i in 0..3 {
            d[i + 1] = d[i] / (1.0 + taus[i] * fwds[i]);
        }
        let mut back = vec![0.0; 3];
        forwards_from_discount_ratios(0, &d, &taus, &mut back).unwrap();
        for i in 0..3 {
            assert_abs_diff_eq!(back[i], fwds[i], epsilon = 1e-14);
        }
    }

    #[test]
    fn one_period_swap_is_the_forward() {
        let taus = [0.5, 0.25];
        let d = [1.0, 1.0 / 1.02, 1.0 / 1.02 / 1.01];
        let mut rates = vec![0.0; 2];
        let mut annuities = vec![0.0; 2];
        coterminal_from_discount_ratios(0, &d, &taus, &mut rates, &mut annuities).unwrap();
        assert_abs_diff_eq!(rates[1], 0.04, epsilon = 1e-12);
        let (cms, _) = constant_maturity_from_discount_ratios(0, 1, &d, &taus).unwrap();
        assert_abs_diff_eq!(cms, 0.04, epsilon = 1e-12);
        let (cms_long, annuity) = constant_maturity_from_discount_ratios(0, 5, &d, &taus).unwrap();
        assert_abs_diff_eq!(cms_long, rates[0], epsilon = 1e-14);
        assert_abs_diff_eq!(annuity, annuities[0], epsilon = 1e-14);
    }
}
