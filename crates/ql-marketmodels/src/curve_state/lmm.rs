use super::{
    constant_maturity_from_discount_ratios, coterminal_from_discount_ratios, forwards_from_discount_ratios, CurveState,
};
use crate::utilities::check_increasing_times;
use ql_core::{ensure, ensure_index, errors::Result, fail, DiscountFactor, Rate, Real, Size, Time};

/// Curve state driven by simple forward rates.
///
/// Setting forwards recomputes discount ratios and coterminal swap data
/// in one backward pass; constant-maturity quantities are computed on
/// demand since they depend on the spanning length.
#[derive(Clone, Debug)]
pub struct LmmCurveState {
    rate_times: Vec<Time>,
    rate_taus: Vec<Time>,
    first: Size,
    forward_rates: Vec<Rate>,
    discount_ratios: Vec<DiscountFactor>,
    cot_swap_rates: Vec<Rate>,
    cot_annuities: Vec<Real>,
}

impl LmmCurveState {
    /// New state on `rate_times` (at least two, strictly increasing).
    ///
    /// The state is uninitialized until one of the setters is called.
    pub fn new(rate_times: Vec<Time>) -> Result<Self> {
        ensure!(
            rate_times.len() >= 2,
            "at least two rate times are required, got {}",
            rate_times.len()
        );
        check_increasing_times(&rate_times)?;
        let n = rate_times.len() - 1;
        let rate_taus = rate_times.windows(2).map(|w| w[1] - w[0]).collect();
        Ok(Self {
            rate_times,
            rate_taus,
            first: n,
            forward_rates: vec![0.0; n],
            discount_ratios: vec![1.0; n + 1],
            cot_swap_rates: vec![0.0; n],
            cot_annuities: vec![0.0; n],
        })
    }

    /// Set forwards `[first_valid_index, n)` from a full-length vector.
    pub fn set_on_forward_rates(&mut self, rates: &[Rate], first_valid_index: Size) -> Result<()> {
        let n = self.rate_taus.len();
        ensure!(
            rates.len() == n,
            "rates mismatch: {n} required, {} provided",
            rates.len()
        );
        ensure!(
            first_valid_index < n,
            "first valid index must be less than {n}: {first_valid_index} not allowed"
        );

        self.first = first_valid_index;
        self.forward_rates[first_valid_index..].copy_from_slice(&rates[first_valid_index..]);

        self.discount_ratios[first_valid_index] = 1.0;
        for i in first_valid_index..n {
            self.discount_ratios[i + 1] =
                self.discount_ratios[i] / (1.0 + self.rate_taus[i] * self.forward_rates[i]);
        }
        coterminal_from_discount_ratios(
            first_valid_index,
            &self.discount_ratios,
            &self.rate_taus,
            &mut self.cot_swap_rates,
            &mut self.cot_annuities,
        )
    }

    /// Set from discount ratios `d_k = P(t, t_k) / P(t, t_first)`, scaled
    /// so that `d_first = 1`.
    pub fn set_on_discount_ratios(&mut self, ratios: &[DiscountFactor], first_valid_index: Size) -> Result<()> {
        let n = self.rate_taus.len();
        ensure!(
            ratios.len() == n + 1,
            "too many discount ratios: {} required, {} provided",
            n + 1,
            ratios.len()
        );
        ensure!(
            first_valid_index < n,
            "first valid index must be less than {n}: {first_valid_index} not allowed"
        );
        let mut forwards = self.forward_rates.clone();
        forwards_from_discount_ratios(first_valid_index, ratios, &self.rate_taus, &mut forwards)?;
        self.set_on_forward_rates(&forwards, first_valid_index)
    }

    fn check_initialized(&self) -> Result<()> {
        if self.first >= self.rate_taus.len() {
            fail!("curve state not initialized yet");
        }
        Ok(())
    }
}

impl CurveState for LmmCurveState {
    fn rate_times(&self) -> &[Time] {
        &self.rate_times
    }

    fn rate_taus(&self) -> &[Time] {
        &self.rate_taus
    }

    fn first_valid_index(&self) -> Size {
        self.first
    }

    fn forward_rates(&self) -> &[Rate] {
        &self.forward_rates
    }

    fn forward_rate(&self, i: Size) -> Result<Rate> {
        self.check_initialized()?;
        ensure_index!(i, self.forward_rates.len());
        ensure!(
            i >= self.first,
            "forward rate {i} already fixed (first valid index {})",
            self.first
        );
        Ok(self.forward_rates[i])
    }

    fn discount_ratio(&self, i: Size, j: Size) -> Result<DiscountFactor> {
        self.check_initialized()?;
        let n = self.rate_taus.len();
        ensure!(
            i.min(j) >= self.first,
            "invalid index: min({i}, {j}) below first valid index {}",
            self.first
        );
        ensure!(i.max(j) <= n, "invalid index: max({i}, {j}) above {n}");
        Ok(self.discount_ratios[i] / self.discount_ratios[j])
    }

    fn coterminal_swap_rate(&self, i: Size) -> Result<Rate> {
        self.check_initialized()?;
        ensure_index!(i, self.rate_taus.len());
        ensure!(i >= self.first, "index {i} below first valid index {}", self.first);
        Ok(self.cot_swap_rates[i])
    }

    fn coterminal_swap_annuity(&self, numeraire: Size, i: Size) -> Result<Real> {
        self.check_initialized()?;
        let n = self.rate_taus.len();
        ensure!(numeraire >= self.first && numeraire <= n, "invalid numeraire {numeraire}");
        ensure!(i >= self.first && i < n, "invalid index {i}");
        Ok(self.cot_annuities[i] / self.discount_ratios[numeraire])
    }

    fn cm_swap_rate(&self, i: Size, spanning_forwards: Size) -> Result<Rate> {
        self.check_initialized()?;
        ensure!(i >= self.first, "index {i} below first valid index {}", self.first);
        constant_maturity_from_discount_ratios(i, spanning_forwards, &self.discount_ratios, &self.rate_taus)
            .map(|(rate, _)| rate)
    }

    fn cm_swap_annuity(&self, numeraire: Size, i: Size, spanning_forwards: Size) -> Result<Real> {
        self.check_initialized()?;
        let n = self.rate_taus.len();
        ensure!(numeraire >= self.first && numeraire <= n, "invalid numeraire {numeraire}");
        ensure!(i >= self.first, "index {i} below first valid index {}", self.first);
        let (_, annuity) =
            constant_maturity_from_discount_ratios(i, spanning_forwards, &self.discount_ratios, &self.rate_taus)?;
        Ok(annuity / self.discount_ratios[numeraire])
    }

    fn clone_box(&self) -> Box<dyn CurveState> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn state() -> LmmCurveState {
        let mut cs = LmmCurveState::new(vec![0.5, 1.0, 1.5, 2.0]).unwrap();
        cs.set_on_forward_rates(&[0.03, 0.04, 0.05], 0).unwrap();
        cs
    }

    #[test]
    fn discount_ratios_follow_forwards() {
        let cs = state();
        assert_eq!(cs.discount_ratio(0, 0).unwrap(), 1.0);
        assert_abs_diff_eq!(cs.discount_ratio(1, 0).unwrap(), 1.0 / 1.015, epsilon = 1e-14);
        let d30 = cs.discount_ratio(3, 0).unwrap();
        assert_abs_diff_eq!(d30, 1.0 / (1.015 * 1.02 * 1.025), epsilon = 1e-14);
        assert_abs_diff_eq!(cs.discount_ratio(0, 3).unwrap() * d30, 1.0, epsilon = 1e-14);
    }

    #[test]
    fn uninitialized_state_rejects_queries() {
        let cs = LmmCurveState::new(vec![0.0, 1.0]).unwrap();
        assert!(matches!(cs.discount_ratio(0, 1), Err(ql_core::Error::Runtime(_))));
        assert!(cs.forward_rate(0).is_err());
    }

    #[test]
    fn fixed_rates_are_out_of_bounds() {
        let mut cs = state();
        cs.set_on_forward_rates(&[0.03, 0.04, 0.05], 1).unwrap();
        assert_eq!(cs.first_valid_index(), 1);
        assert!(cs.discount_ratio(0, 1).is_err());
        assert!(cs.discount_ratio(1, 4).is_err());
        assert_eq!(cs.discount_ratio(1, 1).unwrap(), 1.0);
        assert!(cs.forward_rate(0).is_err());
        assert_eq!(cs.forward_rate(2).unwrap(), 0.05);
    }

    #[test]
    fn coterminal_swap_matches_definition() {
        let cs = state();
        let d: Vec<Real> = (0..4).map(|k| cs.discount_ratio(k, 0).unwrap()).collect();
        let annuity = 0.5 * (d[1] + d[2] + d[3]);
        assert_abs_diff_eq!(cs.coterminal_swap_rate(0).unwrap(), (d[0] - d[3]) / annuity, epsilon = 1e-14);
        assert_abs_diff_eq!(cs.coterminal_swap_annuity(0, 0).unwrap(), annuity, epsilon = 1e-14);
        assert_abs_diff_eq!(cs.coterminal_swap_rate(2).unwrap(), 0.05, epsilon = 1e-14);
        assert_abs_diff_eq!(
            cs.coterminal_swap_annuity(3, 0).unwrap(),
            annuity / d[3],
            epsilon = 1e-14
        );
    }

    #[test]
    fn constant_maturity_truncates_at_curve_end() {
        let cs = state();
        assert_abs_diff_eq!(cs.cm_swap_rate(1, 1).unwrap(), 0.04, epsilon = 1e-14);
        assert_abs_diff_eq!(
            cs.cm_swap_rate(1, 10).unwrap(),
            cs.coterminal_swap_rate(1).unwrap(),
            epsilon = 1e-14
        );
        assert!(cs.cm_swap_rate(1, 0).is_err());
    }

    #[test]
    fn set_on_discount_ratios_recovers_forwards() {
        let cs = state();
        let d: Vec<Real> = (0..4).map(|k| cs.discount_ratio(k, 0).unwrap()).collect();
        let mut other = LmmCurveState::new(vec![0.5, 1.0, 1.5, 2.0]).unwrap();
        other.set_on_discount_ratios(&d, 0).unwrap();
        for i in 0..3 {
            assert_abs_diff_eq!(other.forward_rate(i).unwrap(), cs.forward_rate(i).unwrap(), epsilon = 1e-14);
        }
    }

    #[test]
    fn rejects_bad_inputs() {
        assert!(LmmCurveState::new(vec![1.0]).is_err());
        assert!(LmmCurveState::new(vec![1.0, 0.5]).is_err());
        let mut cs = LmmCurveState::new(vec![0.0, 1.0, 2.0]).unwrap();
        assert!(cs.set_on_forward_rates(&[0.01], 0).is_err());
        assert!(cs.set_on_forward_rates(&[0.01, 0.02], 2).is_err());
    }
}
