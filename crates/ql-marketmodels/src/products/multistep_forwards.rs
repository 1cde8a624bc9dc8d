use super::{check_schedule, multi_step_evolution, CashFlow, MarketModelMultiProduct};
use crate::curve_state::CurveState;
use crate::evolution_description::EvolutionDescription;
use ql_core::{ensure, errors::Result, Rate, Real, Size, Time};

/// A strip of forward-rate agreements, one per rate.
///
/// Product `i` pays `(f_i − K_i)·α_i` at its payment time, fixing at the
/// end of step `i`.
#[derive(Clone, Debug)]
pub struct MultiStepForwards {
    evolution: EvolutionDescription,
    accruals: Vec<Real>,
    payment_times: Vec<Time>,
    strikes: Vec<Rate>,
    current_index: Size,
}

impl MultiStepForwards {
    /// One forward per rate in `rate_times`.
    pub fn new(
        rate_times: Vec<Time>,
        accruals: Vec<Real>,
        payment_times: Vec<Time>,
        strikes: Vec<Rate>,
    ) -> Result<Self> {
        let evolution = multi_step_evolution(rate_times)?;
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
            current_index: 0,
        })
    }
}

impl MarketModelMultiProduct for MultiStepForwards {
    fn suggested_numeraires(&self) -> Vec<Size> {
        (1..=self.evolution.number_of_rates()).collect()
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

    fn reset(&mut self) {
        self.current_index = 0;
    }

    fn next_time_step(
        &mut self,
        state: &dyn CurveState,
        number_cash_flows: &mut [Size],
        cash_flows: &mut [Vec<CashFlow>],
    ) -> Result<bool> {
        let i = self.current_index;
        let rate = state.forward_rate(i)?;
        number_cash_flows.fill(0);
        number_cash_flows[i] = 1;
        cash_flows[i][0] = CashFlow {
            time_index: i,
            amount: (rate - self.strikes[i]) * self.accruals[i],
        };
        self.current_index += 1;
        Ok(self.current_index == self.strikes.len())
    }

    fn clone_box(&self) -> Box<dyn MarketModelMultiProduct> {
        Box::new(self.clone())
    }
}
