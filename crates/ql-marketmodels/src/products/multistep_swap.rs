use super::{check_schedule, multi_step_evolution, CashFlow, MarketModelMultiProduct};
use crate::curve_state::CurveState;
use crate::evolution_description::EvolutionDescription;
use ql_core::{ensure, errors::Result, Rate, Real, Size, Time};

/// A single fixed-for-floating swap paying at the end of every period.
#[derive(Clone, Debug)]
pub struct MultiStepSwap {
    evolution: EvolutionDescription,
    fixed_accruals: Vec<Real>,
    floating_accruals: Vec<Real>,
    payment_times: Vec<Time>,
    fixed_rate: Rate,
    multiplier: Real,
    current_index: Size,
}

impl MultiStepSwap {
    /// `payer` pays fixed and receives floating.
    pub fn new(
        rate_times: Vec<Time>,
        fixed_accruals: Vec<Real>,
        floating_accruals: Vec<Real>,
        payment_times: Vec<Time>,
        fixed_rate: Rate,
        payer: bool,
    ) -> Result<Self> {
        let evolution = multi_step_evolution(rate_times)?;
        let n = evolution.number_of_rates();
        check_schedule(n, &fixed_accruals, &payment_times)?;
        ensure!(
            floating_accruals.len() == n,
            "floating accruals ({}) mismatch with rates ({n})",
            floating_accruals.len()
        );
        Ok(Self {
            evolution,
            fixed_accruals,
            floating_accruals,
            payment_times,
            fixed_rate,
            multiplier: if payer { 1.0 } else { -1.0 },
            current_index: 0,
        })
    }
}

impl MarketModelMultiProduct for MultiStepSwap {
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
        1
    }

    fn max_number_of_cash_flows_per_product_per_step(&self) -> Size {
        2
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
        let libor = state.forward_rate(i)?;
        cash_flows[0][0] = CashFlow {
            time_index: i,
            amount: -self.multiplier * self.fixed_rate * self.fixed_accruals[i],
        };
        cash_flows[0][1] = CashFlow {
            time_index: i,
            amount: self.multiplier * libor * self.floating_accruals[i],
        };
        number_cash_flows[0] = 2;
        self.current_index += 1;
        Ok(self.current_index == self.payment_times.len())
    }

    fn clone_box(&self) -> Box<dyn MarketModelMultiProduct> {
        Box::new(self.clone())
    }
}
