//! Conversion of cash flows into numeraire bonds.

use crate::curve_state::CurveState;
use crate::utilities::check_increasing_times;
use ql_core::{ensure, errors::Result, Real, Size, Time};

/// Values a unit payment at a fixed time in units of a numeraire bond.
///
/// The discount ratio is taken log-linearly from the interval starting at
/// the first rate time at or after the payment (the last interval for
/// payments beyond it).  Payments inside a period are therefore
/// extrapolated back from the next interval, which only involves bonds
/// that are still alive when the flow is generated.
#[derive(Clone, Debug, PartialEq)]
pub struct MarketModelDiscounter {
    before: Size,
    before_weight: Real,
}

impl MarketModelDiscounter {
    /// Discounter for a payment at `payment_time` on the curve `rate_times`.
    pub fn new(payment_time: Time, rate_times: &[Time]) -> Result<Self> {
        ensure!(rate_times.len() >= 2, "at least two rate times are required");
        check_increasing_times(rate_times)?;
        ensure!(payment_time.is_finite(), "payment time must be finite");
        let last_interval = rate_times.len() - 2;
        let before = rate_times.partition_point(|&t| t < payment_time).min(last_interval);
        let before_weight =
            1.0 - (payment_time - rate_times[before]) / (rate_times[before + 1] - rate_times[before]);
        Ok(Self { before, before_weight })
    }

    /// Index of the first rate time at or after the payment, capped at the
    /// start of the last interval.
    pub fn before(&self) -> Size {
        self.before
    }

    /// Interpolation weight on the earlier rate time.
    pub fn before_weight(&self) -> Real {
        self.before_weight
    }

    /// Value of the unit payment in units of bond `numeraire`.
    pub fn numeraire_bonds(&self, state: &dyn CurveState, numeraire: Size) -> Result<Real> {
        let pre = state.discount_ratio(self.before, numeraire)?;
        if self.before_weight == 1.0 {
            return Ok(pre);
        }
        let post = state.discount_ratio(self.before + 1, numeraire)?;
        if self.before_weight == 0.0 {
            return Ok(post);
        }
        Ok(pre.powf(self.before_weight) * post.powf(1.0 - self.before_weight))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve_state::LmmCurveState;
    use approx::assert_abs_diff_eq;

    fn state() -> LmmCurveState {
        let mut cs = LmmCurveState::new(vec![0.5, 1.0, 1.5]).unwrap();
        cs.set_on_forward_rates(&[0.04, 0.06], 0).unwrap();
        cs
    }

    #[test]
    fn payments_on_rate_times_are_exact() {
        let cs = state();
        let times = cs.rate_times().to_vec();
        for (k, &t) in times.iter().enumerate() {
            let disc = MarketModelDiscounter::new(t, &times).unwrap();
            assert_abs_diff_eq!(
                disc.numeraire_bonds(&cs, 2).unwrap(),
                cs.discount_ratio(k, 2).unwrap(),
                epsilon = 1e-15
            );
        }
        assert_eq!(MarketModelDiscounter::new(1.5, &times).unwrap().before(), 1);
    }

    #[test]
    fn mid_period_payment_is_log_linear() {
        let cs = state();
        let times = cs.rate_times().to_vec();
        let disc = MarketModelDiscounter::new(1.25, &times).unwrap();
        assert_eq!(disc.before(), 1);
        assert_abs_diff_eq!(disc.before_weight(), 0.5, epsilon = 1e-15);
        let expected = (cs.discount_ratio(1, 0).unwrap() * cs.discount_ratio(2, 0).unwrap()).sqrt();
        assert_abs_diff_eq!(disc.numeraire_bonds(&cs, 0).unwrap(), expected, epsilon = 1e-15);
    }

    #[test]
    fn payment_after_a_dead_rate_time_uses_alive_bonds() {
        let mut cs = LmmCurveState::new(vec![0.5, 1.0, 1.5, 2.0]).unwrap();
        cs.set_on_forward_rates(&[0.03, 0.04, 0.05], 1).unwrap();
        let disc = MarketModelDiscounter::new(0.8, cs.rate_times()).unwrap();
        assert_eq!(disc.before(), 1);
        assert_abs_diff_eq!(disc.before_weight(), 1.4, epsilon = 1e-14);

        let pre = cs.discount_ratio(1, 3).unwrap();
        let post = cs.discount_ratio(2, 3).unwrap();
        let expected = pre.powf(1.4) * post.powf(-0.4);
        assert_abs_diff_eq!(disc.numeraire_bonds(&cs, 3).unwrap(), expected, epsilon = 1e-14);
    }

    #[test]
    fn expired_bonds_are_rejected() {
        let mut cs = state();
        cs.set_on_forward_rates(&[0.04, 0.06], 1).unwrap();
        let disc = MarketModelDiscounter::new(0.5, cs.rate_times()).unwrap();
        assert!(disc.numeraire_bonds(&cs, 2).is_err());
    }
}
