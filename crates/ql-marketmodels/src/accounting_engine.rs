//! Monte Carlo valuation of cash-flow products by numeraire accounting.
//!
//! Every cash flow is converted into units of the current numeraire bond
//! as soon as it is generated.  When the numeraire changes between steps
//! the portfolio is rolled into the new bond, and the running
//! "principal in numeraire portfolio" records how many new bonds one
//! original unit has become.  At the end of the path the held units are
//! worth `held × initial numeraire value` today.

use crate::brownian_generators::SeedGenerator;
use crate::config::{PathValidation, SimulationConfig};
use crate::discounter::MarketModelDiscounter;
use crate::evolvers::MarketModelEvolver;
use crate::products::{CashFlow, MarketModelMultiProduct};
use ql_core::{
    ensure,
    errors::{Error, Result},
    Real, Size,
};
use ql_math::SequenceStatistics;
use rayon::prelude::*;
use tracing::{debug, info, trace, warn};

/// Drives an evolver and a product through many paths.
#[derive(Debug)]
pub struct AccountingEngine {
    evolver: Box<dyn MarketModelEvolver>,
    product: Box<dyn MarketModelMultiProduct>,
    initial_numeraire_value: Real,
    number_of_products: Size,
    numeraires_held: Vec<Real>,
    number_cash_flows_this_step: Vec<Size>,
    cash_flows_generated: Vec<Vec<CashFlow>>,
    discounters: Vec<MarketModelDiscounter>,
    values: Vec<Real>,
    principal_in_numeraire_portfolio: Real,
    path_validation: PathValidation,
    rejected_paths: usize,
}

impl AccountingEngine {
    /// `initial_numeraire_value` is today's price of the first step's
    /// numeraire bond.
    pub fn new(
        evolver: Box<dyn MarketModelEvolver>,
        product: Box<dyn MarketModelMultiProduct>,
        initial_numeraire_value: Real,
        config: &SimulationConfig,
    ) -> Result<Self> {
        let evolution = product.evolution();
        ensure!(
            evolver.numeraires().len() == evolution.number_of_steps(),
            "evolver has {} numeraires, product evolution has {} steps",
            evolver.numeraires().len(),
            evolution.number_of_steps()
        );
        ensure!(
            initial_numeraire_value.is_finite() && initial_numeraire_value > 0.0,
            "initial numeraire value must be positive, got {initial_numeraire_value}"
        );
        let number_of_products = product.number_of_products();
        let max_flows = product.max_number_of_cash_flows_per_product_per_step();
        let discounters = product
            .possible_cash_flow_times()
            .iter()
            .map(|&t| MarketModelDiscounter::new(t, evolution.rate_times()))
            .collect::<Result<Vec<_>>>()?;

        debug!(
            products = number_of_products,
            steps = evolution.number_of_steps(),
            cash_flow_times = discounters.len(),
            "accounting engine constructed"
        );

        Ok(Self {
            evolver,
            product,
            initial_numeraire_value,
            number_of_products,
            numeraires_held: vec![0.0; number_of_products],
            number_cash_flows_this_step: vec![0; number_of_products],
            cash_flows_generated: vec![vec![CashFlow::default(); max_flows]; number_of_products],
            discounters,
            values: vec![0.0; number_of_products],
            principal_in_numeraire_portfolio: 1.0,
            path_validation: config.path_validation(),
            rejected_paths: 0,
        })
    }

    /// Number of products valued per path.
    pub fn number_of_products(&self) -> Size {
        self.number_of_products
    }

    /// Principal of the numeraire portfolio at the end of the last path.
    pub fn principal_in_numeraire_portfolio(&self) -> Real {
        self.principal_in_numeraire_portfolio
    }

    /// Paths dropped by the validation policy so far.
    pub fn rejected_paths(&self) -> usize {
        self.rejected_paths
    }

    /// Run one path; writes one value per product and returns the path
    /// weight.
    pub fn single_path_values(&mut self, values: &mut [Real]) -> Result<Real> {
        ensure!(
            values.len() == self.number_of_products,
            "values hold {} entries, {} products",
            values.len(),
            self.number_of_products
        );
        self.numeraires_held.fill(0.0);
        let mut weight = self.evolver.start_new_path();
        self.product.reset();
        let mut principal = 1.0;
        self.principal_in_numeraire_portfolio = principal;

        loop {
            let this_step = self.evolver.current_step();
            weight *= self.evolver.advance_step()?;
            let state = self.evolver.current_state();
            let done = self.product.next_time_step(
                state,
                &mut self.number_cash_flows_this_step,
                &mut self.cash_flows_generated,
            )?;

            let numeraires = self.evolver.numeraires();
            let numeraire = numeraires[this_step];
            for (i, flows) in self.cash_flows_generated.iter().enumerate() {
                let count = self.number_cash_flows_this_step[i];
                let flows = flows.get(..count).ok_or(Error::IndexOutOfRange {
                    index: count,
                    size: flows.len(),
                })?;
                for cf in flows {
                    let discounter = self
                        .discounters
                        .get(cf.time_index)
                        .ok_or(Error::IndexOutOfRange {
                            index: cf.time_index,
                            size: self.discounters.len(),
                        })?;
                    let bonds = discounter.numeraire_bonds(state, numeraire)?;
                    self.numeraires_held[i] += cf.amount * bonds / principal;
                }
            }

            if done {
                break;
            }
            let next = *numeraires.get(this_step + 1).ok_or(Error::IndexOutOfRange {
                index: this_step + 1,
                size: numeraires.len(),
            })?;
            principal *= state.discount_ratio(numeraire, next)?;
            self.principal_in_numeraire_portfolio = principal;
        }

        for (v, held) in values.iter_mut().zip(&self.numeraires_held) {
            *v = held * self.initial_numeraire_value;
        }

        if self.path_validation == PathValidation::Reject {
            let step = self.evolver.current_step();
            if let Some(index) = values.iter().position(|v| !v.is_finite()) {
                return Err(Error::NonFinite {
                    what: "path value",
                    step,
                    index,
                });
            }
            if !weight.is_finite() {
                return Err(Error::NonFinite {
                    what: "path weight",
                    step,
                    index: 0,
                });
            }
        }
        Ok(weight)
    }

    /// Add `number_of_paths` weighted path values to `stats`.
    ///
    /// Under [`PathValidation::Reject`] non-finite paths are skipped and
    /// counted instead of failing the batch.
    pub fn multiple_path_values(&mut self, stats: &mut SequenceStatistics, number_of_paths: usize) -> Result<()> {
        ensure!(
            stats.size() == self.number_of_products,
            "statistics of dimension {} for {} products",
            stats.size(),
            self.number_of_products
        );
        let _span = tracing::info_span!("multiple_path_values", paths = number_of_paths).entered();
        let mut values = std::mem::take(&mut self.values);
        let result = self.run_paths(stats, &mut values, number_of_paths);
        self.values = values;
        result?;
        info!(
            paths = number_of_paths,
            rejected = self.rejected_paths,
            "path batch complete"
        );
        Ok(())
    }

    fn run_paths(&mut self, stats: &mut SequenceStatistics, values: &mut [Real], number_of_paths: usize) -> Result<()> {
        for path in 0..number_of_paths {
            match self.single_path_values(values) {
                Ok(weight) => {
                    trace!(path, weight, "path complete");
                    stats.add(values, weight)?;
                }
                Err(Error::NonFinite { what, step, index }) if self.path_validation == PathValidation::Reject => {
                    self.rejected_paths += 1;
                    warn!(path, what, step, index, "non-finite path rejected");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Split `number_of_paths` over independent workers and merge their
    /// statistics into `stats`; returns the number of rejected paths.
    ///
    /// `make_worker` receives a seed and must build an engine whose
    /// evolver draws from a generator with that seed.  Seeds come from
    /// [`SeedGenerator`] rooted at the configured seed, so results only
    /// depend on the configuration and the worker count.
    pub fn multiple_path_values_parallel<F>(
        make_worker: F,
        stats: &mut SequenceStatistics,
        number_of_paths: usize,
        config: &SimulationConfig,
    ) -> Result<usize>
    where
        F: Fn(u64) -> Result<AccountingEngine> + Sync,
    {
        config.validate()?;
        let workers = config.workers().unwrap_or_else(rayon::current_num_threads).max(1);
        let dimension = stats.size();
        let seeds = SeedGenerator::new(config.seed()).seeds(workers);
        let _span = tracing::info_span!("multiple_path_values_parallel", paths = number_of_paths, workers).entered();

        let (merged, rejected) = seeds
            .into_par_iter()
            .enumerate()
            .map(|(worker, seed)| -> Result<(SequenceStatistics, usize)> {
                let share = number_of_paths / workers + usize::from(worker < number_of_paths % workers);
                let mut engine = make_worker(seed)?;
                let mut local = SequenceStatistics::new(dimension);
                engine.multiple_path_values(&mut local, share)?;
                debug!(worker, seed, paths = share, "worker finished");
                Ok((local, engine.rejected_paths()))
            })
            .reduce(
                || Ok((SequenceStatistics::new(dimension), 0)),
                |a, b| {
                    let (mut left, left_rejected) = a?;
                    let (right, right_rejected) = b?;
                    left.merge(&right)?;
                    Ok((left, left_rejected + right_rejected))
                },
            )?;

        stats.merge(&merged)?;
        info!(paths = number_of_paths, workers, rejected, "parallel batch complete");
        Ok(rejected)
    }
}
