use super::{check_schedule, multi_step_evolution, CashFlow, MarketModelMultiProduct, PlainVanillaPayoff};
use crate::curve_state::CurveState;
use crate::evolution_description::EvolutionDescription;
use ql_core::{ensure, errors::Result, Real, Size, Time};

/// A strip of caplets (or floorlets), one per rate.
#[derive(Clone, Debug)]
pub struct MultiStepCaplets {
    evolution: EvolutionDescription,
    accruals: Vec<Real>,
    payment_times: Vec<Time>,
    payoffs: Vec<PlainVanillaPayoff>,
    current_index: Size,
}

impl MultiStepCaplets {
    /// Caplet `i` pays `payoffs[i](f_i)·α_i`.
    pub fn new(
        rate_times: Vec<Time>,
        accruals: Vec<Real>,
        payment_times: Vec<Time>,
        payoffs: Vec<PlainVanillaPayoff>,
    ) -> Result<Self> {
        let evolution = multi_step_evolution(rate_times)?;
        let n = evolution.number_of_rates();
        check_schedule(n, &accruals, &payment_times)?;
        ensure!(
            payoffs.len() == n,
            "payoffs ({}) mismatch with rates ({n})",
            payoffs.len()
        );
        Ok(Self {
            evolution,
            accruals,
            payment_times,
            payoffs,
            current_index: 0,
        })
    }
}

impl MarketModelMultiProduct for MultiStepCaplets {
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
        self.payoffs.len()
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
        let payoff = self.payoffs[i].value(rate);
        if payoff > 0.0 {
            number_cash_flows[i] = 1;
            cash_flows[i][0] = CashFlow {
                time_index: i,
                amount: payoff * self.accruals[i],
            };
        }
        self.current_index += 1;
        Ok(self.current_index == self.payoffs.len())
    }

    fn clone_box(&self) -> Box<dyn MarketModelMultiProduct> {
        Box::new(self.clone())
    }
}
