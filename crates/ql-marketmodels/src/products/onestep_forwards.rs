use super::{check_schedule, one_step_evolution, CashFlow, MarketModelMultiProduct};
use crate::curve_state::CurveState;
use crate::evolution_description::EvolutionDescription;
use ql_core::{ensure, errors::Result, Rate, Real, Size, Time};

/// Forward-rate agreements valued after a single step to the last fixing.
///
/// Every rate is read off the curve at the same time, so the product only
/// needs the terminal distribution of the curve.
#[derive(Clone, Debug)]
pub struct OneStepForwards {
    evolution: EvolutionDescription,
    accruals: Vec<Real>,
    payment_times: Vec<Time>,
    strikes: Vec<Rate>,
}

impl OneStepForwards {
    /// One forward per rate in `rate_times`.
    pub fn new(
        rate_times: Vec<Time>,
        accruals: Vec<Real>,
        payment_times: Vec<Time>,
        strikes: Vec<Rate>,
    ) -> Result<Self> {
        let evolution = one_step_evolution(rate_times)?;
        let n = evolution.number_of_rates();
        check_schedule(n, &accruals, &payment_times)?;
        ensure!(
            strikes.len() == n,
            "strikes ({}) mismatch with rates ({n})",
            strikes.len()
        );
        Ok(Self {
            evolution,
            accruals,
            payment_times,
            strikes,
        })
    }
}

impl MarketModelMultiProduct for OneStepForwards {
    fn suggested_numeraires(&self) -> Vec<Size> {
        vec![self.evolution.number_of_rates()]
    }

    fn evolution(&self) -> &EvolutionDescription {
        &self.evolution
    }

    fn possible_cash_flow_times(&self) -> &[Time] {
        &self.payment_times
    }

    fn number_of_products(&self) -> Size {
        self.strikes.len()
    }

    fn max_number_of_cash_flows_per_product_per_step(&self) -> Size {
        1
    }

    fn reset(&mut self) {}

    fn next_time_step(
        &mut self,
        state: &dyn CurveState,
        number_cash_flows: &mut [Size],
        cash_flows: &mut [Vec<CashFlow>],
    ) -> Result<bool> {
        for (i, strike) in self.strikes.iter().enumerate() {
            let rate = state.forward_rate(i)?;
            number_cash_flows[i] = 1;
            cash_flows[i][0] = CashFlow {
                time_index: i,
                amount: (rate - strike) * self.accruals[i],
            };
        }
        Ok(true)
    }

    fn clone_box(&self) -> Box<dyn MarketModelMultiProduct> {
        Box::new(self.clone())
    }
}
