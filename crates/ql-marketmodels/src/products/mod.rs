//! Cash-flow generating products.
//!
//! A product is stepped alongside an evolver: after every evolution step
//! it reads the curve state and reports the cash flows it generates,
//! each tagged with an index into [`possible_cash_flow_times`].
//!
//! [`possible_cash_flow_times`]: MarketModelMultiProduct::possible_cash_flow_times

mod multistep_caplets;
mod multistep_forwards;
mod multistep_swap;
mod onestep_forwards;
mod payoff;

pub use multistep_caplets::MultiStepCaplets;
pub use multistep_forwards::MultiStepForwards;
pub use multistep_swap::MultiStepSwap;
pub use onestep_forwards::OneStepForwards;
pub use payoff::{OptionType, PlainVanillaPayoff};

use crate::curve_state::CurveState;
use crate::evolution_description::EvolutionDescription;
use crate::utilities::check_increasing_times;
use ql_core::{ensure, errors::Result, Real, Size, Time};

/// A cash flow: amount paid at `possible_cash_flow_times()[time_index]`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CashFlow {
    /// Index into the product's possible cash-flow times.
    pub time_index: Size,
    /// Amount paid.
    pub amount: Real,
}

/// One or more products driven by a simulated curve.
pub trait MarketModelMultiProduct: std::fmt::Debug + Send {
    /// A numeraire sequence the product is naturally priced under.
    fn suggested_numeraires(&self) -> Vec<Size>;

    /// Rate times and evolution schedule the product needs.
    fn evolution(&self) -> &EvolutionDescription;

    /// Every time at which a cash flow may be paid.
    fn possible_cash_flow_times(&self) -> &[Time];

    /// Number of products valued together.
    fn number_of_products(&self) -> Size;

    /// Upper bound on the cash flows a single product pays in one step.
    fn max_number_of_cash_flows_per_product_per_step(&self) -> Size;

    /// Rewind to the start of a path.
    fn reset(&mut self);

    /// Consume the state after a step.
    ///
    /// Writes the flow count of each product into `number_cash_flows` and
    /// the flows into `cash_flows[product][..count]`; returns `true` once
    /// the product is done for this path.
    fn next_time_step(
        &mut self,
        state: &dyn CurveState,
        number_cash_flows: &mut [Size],
        cash_flows: &mut [Vec<CashFlow>],
    ) -> Result<bool>;

    /// Boxed copy, used to hand every worker its own product.
    fn clone_box(&self) -> Box<dyn MarketModelMultiProduct>;
}

impl Clone for Box<dyn MarketModelMultiProduct> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Evolution that stops at every fixing time, with rate `i` relevant at
/// step `i` only.
pub(crate) fn multi_step_evolution(rate_times: Vec<Time>) -> Result<EvolutionDescription> {
    ensure!(rate_times.len() >= 2, "at least two rate times are required");
    let n = rate_times.len() - 1;
    let evolution_times = rate_times[..n].to_vec();
    let relevance = (0..n).map(|i| (i, i + 1)).collect();
    EvolutionDescription::new(rate_times, evolution_times, relevance)
}

/// Evolution with a single step to the last fixing time.
pub(crate) fn one_step_evolution(rate_times: Vec<Time>) -> Result<EvolutionDescription> {
    ensure!(rate_times.len() >= 2, "at least two rate times are required");
    let n = rate_times.len() - 1;
    let last_fixing = rate_times[n - 1];
    EvolutionDescription::new(rate_times, vec![last_fixing], vec![(0, n)])
}

/// Accruals and payment times must match the rates; payment times must be
/// increasing.
pub(crate) fn check_schedule(n: Size, accruals: &[Real], payment_times: &[Time]) -> Result<()> {
    ensure!(
        accruals.len() == n,
        "accruals ({}) mismatch with rates ({n})",
        accruals.len()
    );
    ensure!(
        payment_times.len() == n,
        "payment times ({}) mismatch with rates ({n})",
        payment_times.len()
    );
    check_increasing_times(payment_times)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evolution_shapes() {
        let multi = multi_step_evolution(vec![0.5, 1.0, 1.5, 2.0]).unwrap();
        assert_eq!(multi.number_of_steps(), 3);
        assert_eq!(multi.relevance_rates(), &[(0, 1), (1, 2), (2, 3)]);
        let one = one_step_evolution(vec![0.5, 1.0, 1.5, 2.0]).unwrap();
        assert_eq!(one.evolution_times(), &[1.5]);
        assert_eq!(one.first_alive_rate(), &[0]);
        assert!(check_schedule(2, &[0.5, 0.5], &[1.0, 0.5]).is_err());
        assert!(check_schedule(2, &[0.5], &[1.0, 1.5]).is_err());
    }
}
