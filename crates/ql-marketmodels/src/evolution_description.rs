//! Static description of a market-model simulation.
//!
//! An [`EvolutionDescription`] fixes the rate times of the curve, the times
//! at which the curve is evolved, and which rates are still alive at each
//! step.  The numeraire helpers below build and check the index of the
//! discount bond used as unit of account at every step.

use crate::utilities::{check_increasing_times, lower_bound, AliveRange};
use ql_core::{ensure, ensure_index, errors::Result, Size, Time};

/// Rate times, evolution times and the alive-rate schedule of a simulation.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EvolutionDescription {
    number_of_rates: Size,
    rate_times: Vec<Time>,
    evolution_times: Vec<Time>,
    relevance_rates: Vec<(Size, Size)>,
    rate_taus: Vec<Time>,
    first_alive_rate: Vec<Size>,
}

impl EvolutionDescription {
    /// Build a description.
    ///
    /// An empty `evolution_times` evolves once per fixing time
    /// (`rate_times[..n]`); an empty `relevance_rates` marks every rate
    /// relevant at every step.
    pub fn new(
        rate_times: Vec<Time>,
        evolution_times: Vec<Time>,
        relevance_rates: Vec<(Size, Size)>,
    ) -> Result<Self> {
        ensure!(
            rate_times.len() >= 2,
            "rate times must contain at least two values, got {}",
            rate_times.len()
        );
        check_increasing_times(&rate_times)?;
        let n = rate_times.len() - 1;

        let evolution_times = if evolution_times.is_empty() {
            rate_times[..n].to_vec()
        } else {
            evolution_times
        };
        check_increasing_times(&evolution_times)?;
        let steps = evolution_times.len();
        let last = evolution_times[steps - 1];
        ensure!(
            last <= rate_times[n - 1],
            "the last evolution time ({last}) is past the last fixing time ({})",
            rate_times[n - 1]
        );

        let relevance_rates = if relevance_rates.is_empty() {
            vec![(0, n); steps]
        } else {
            ensure!(
                relevance_rates.len() == steps,
                "relevance rates ({}) mismatch with evolution times ({steps})",
                relevance_rates.len()
            );
            for (k, &(lo, hi)) in relevance_rates.iter().enumerate() {
                ensure!(
                    lo < hi && hi <= n,
                    "invalid relevance range [{lo}, {hi}) at step {k}"
                );
            }
            relevance_rates
        };

        let rate_taus = rate_times.windows(2).map(|w| w[1] - w[0]).collect();

        let mut first_alive_rate = Vec::with_capacity(steps);
        let mut current_time = 0.0;
        let mut first_alive = 0;
        for &t in &evolution_times {
            while first_alive < n && rate_times[first_alive] <= current_time {
                first_alive += 1;
            }
            first_alive_rate.push(first_alive);
            current_time = t;
        }

        Ok(Self {
            number_of_rates: n,
            rate_times,
            evolution_times,
            relevance_rates,
            rate_taus,
            first_alive_rate,
        })
    }

    /// Shorthand for a description that evolves at every fixing time.
    pub fn from_rate_times(rate_times: Vec<Time>) -> Result<Self> {
        Self::new(rate_times, Vec::new(), Vec::new())
    }

    /// The `n + 1` rate times.
    pub fn rate_times(&self) -> &[Time] {
        &self.rate_times
    }

    /// Accrual fractions `t_{i+1} - t_i`.
    pub fn rate_taus(&self) -> &[Time] {
        &self.rate_taus
    }

    /// Times at which the curve is evolved.
    pub fn evolution_times(&self) -> &[Time] {
        &self.evolution_times
    }

    /// Index of the first alive rate at each step; non-decreasing.
    pub fn first_alive_rate(&self) -> &[Size] {
        &self.first_alive_rate
    }

    /// Rates a product may look at during each step.
    pub fn relevance_rates(&self) -> &[(Size, Size)] {
        &self.relevance_rates
    }

    /// Number of forward rates `n`.
    pub fn number_of_rates(&self) -> Size {
        self.number_of_rates
    }

    /// Number of evolution steps.
    pub fn number_of_steps(&self) -> Size {
        self.evolution_times.len()
    }

    /// The alive rates `[first_alive_rate[step], n)`.
    pub fn alive_range(&self, step: Size) -> Result<AliveRange> {
        ensure_index!(step, self.first_alive_rate.len());
        AliveRange::new(self.first_alive_rate[step], self.number_of_rates)
    }

    /// `min(evolution_time[step], rate_time[rate])`: the time up to which
    /// rate `rate` accumulates variance by the end of `step`.
    pub fn effective_stop_time(&self, step: Size, rate: Size) -> Result<Time> {
        ensure_index!(step, self.evolution_times.len());
        ensure_index!(rate, self.number_of_rates);
        Ok(self.evolution_times[step].min(self.rate_times[rate]))
    }
}

// ── Numeraires ────────────────────────────────────────────────────────────────

/// A canonical choice of numeraire sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Measure {
    /// Always the last bond.
    Terminal,
    /// Always the first unexpired bond.
    MoneyMarket,
    /// The `offset`-th unexpired bond, capped at the last one.
    MoneyMarketPlus(Size),
}

impl Measure {
    /// The numeraire sequence of this measure for `evolution`.
    pub fn numeraires(&self, evolution: &EvolutionDescription) -> Result<Vec<Size>> {
        match *self {
            Measure::Terminal => Ok(terminal_measure(evolution)),
            Measure::MoneyMarket => money_market_measure(evolution),
            Measure::MoneyMarketPlus(offset) => money_market_plus_measure(evolution, offset),
        }
    }

    /// The canonical measure `numeraires` belongs to, if any.  Terminal
    /// wins over money-market-plus when both match.
    pub fn identify(evolution: &EvolutionDescription, numeraires: &[Size]) -> Option<Measure> {
        if is_in_terminal_measure(evolution, numeraires) {
            return Some(Measure::Terminal);
        }
        (0..evolution.number_of_rates()).find_map(|offset| {
            match is_in_money_market_plus_measure(evolution, numeraires, offset) {
                Ok(true) if offset == 0 => Some(Measure::MoneyMarket),
                Ok(true) => Some(Measure::MoneyMarketPlus(offset)),
                _ => None,
            }
        })
    }
}

/// Numeraire `n` (the last bond) at every step.
pub fn terminal_measure(evolution: &EvolutionDescription) -> Vec<Size> {
    vec![evolution.number_of_rates(); evolution.number_of_steps()]
}

/// The first unexpired bond at every step.
pub fn money_market_measure(evolution: &EvolutionDescription) -> Result<Vec<Size>> {
    money_market_plus_measure(evolution, 0)
}

/// The `offset`-th unexpired bond at every step, capped at `n`.
pub fn money_market_plus_measure(evolution: &EvolutionDescription, offset: Size) -> Result<Vec<Size>> {
    let n = evolution.number_of_rates();
    ensure!(
        offset <= n,
        "offset ({offset}) is greater than the max allowed value for numeraire ({n})"
    );
    let rate_times = evolution.rate_times();
    Ok(evolution
        .evolution_times()
        .iter()
        .map(|&t| (lower_bound(rate_times, t) + offset).min(n))
        .collect())
}

/// Whether `numeraires` is the terminal measure.
pub fn is_in_terminal_measure(evolution: &EvolutionDescription, numeraires: &[Size]) -> bool {
    let n = evolution.number_of_rates();
    numeraires.len() == evolution.number_of_steps() && numeraires.iter().all(|&k| k == n)
}

/// Whether `numeraires` is the money-market measure.
pub fn is_in_money_market_measure(evolution: &EvolutionDescription, numeraires: &[Size]) -> Result<bool> {
    is_in_money_market_plus_measure(evolution, numeraires, 0)
}

/// Whether `numeraires` is the money-market-plus measure for `offset`.
pub fn is_in_money_market_plus_measure(
    evolution: &EvolutionDescription,
    numeraires: &[Size],
    offset: Size,
) -> Result<bool> {
    ensure!(
        numeraires.len() == evolution.number_of_steps(),
        "size mismatch between numeraires ({}) and evolution times ({})",
        numeraires.len(),
        evolution.number_of_steps()
    );
    let expected = money_market_plus_measure(evolution, offset)?;
    Ok(expected.as_slice() == numeraires)
}

/// Require one numeraire per step, each an unexpired bond at its step.
pub fn check_compatibility(evolution: &EvolutionDescription, numeraires: &[Size]) -> Result<()> {
    let evolution_times = evolution.evolution_times();
    let rate_times = evolution.rate_times();
    ensure!(
        numeraires.len() == evolution_times.len(),
        "size mismatch between numeraires ({}) and evolution times ({})",
        numeraires.len(),
        evolution_times.len()
    );
    for (i, (&k, &t)) in numeraires.iter().zip(evolution_times).enumerate() {
        ensure!(
            k < rate_times.len(),
            "numeraire {k} at step {i} is out of range (max {})",
            rate_times.len() - 1
        );
        ensure!(
            rate_times[k] >= t,
            "{i}-th evolution time ({t}) is after the corresponding numeraire date ({})",
            rate_times[k]
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn semiannual(n: usize) -> Vec<Time> {
        (0..=n).map(|i| 0.5 + 0.5 * i as Time).collect()
    }

    #[test]
    fn defaults_evolve_at_fixing_times() {
        let ev = EvolutionDescription::from_rate_times(semiannual(4)).unwrap();
        assert_eq!(ev.number_of_rates(), 4);
        assert_eq!(ev.number_of_steps(), 4);
        assert_eq!(ev.evolution_times(), &[0.5, 1.0, 1.5, 2.0]);
        assert_eq!(ev.first_alive_rate(), &[0, 1, 2, 3]);
        assert_eq!(ev.rate_taus(), &[0.5; 4]);
        assert_eq!(ev.relevance_rates(), &[(0, 4); 4]);
    }

    #[test]
    fn coarse_steps_kill_several_rates() {
        let ev = EvolutionDescription::new(semiannual(4), vec![0.25, 1.2, 2.0], vec![]).unwrap();
        assert_eq!(ev.first_alive_rate(), &[0, 0, 2]);
        let r = ev.alive_range(2).unwrap();
        assert_eq!((r.first(), r.end()), (2, 4));
        assert!(ev.alive_range(3).is_err());
        assert_eq!(ev.effective_stop_time(1, 0).unwrap(), 0.5);
        assert_eq!(ev.effective_stop_time(1, 3).unwrap(), 1.2);
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(EvolutionDescription::from_rate_times(vec![1.0]).is_err());
        assert!(EvolutionDescription::from_rate_times(vec![0.5, 0.5, 1.0]).is_err());
        assert!(EvolutionDescription::new(semiannual(2), vec![1.5], vec![]).is_err());
        assert!(EvolutionDescription::new(semiannual(2), vec![0.5, 1.0], vec![(0, 2)]).is_err());
        assert!(EvolutionDescription::new(semiannual(2), vec![0.5], vec![(1, 1)]).is_err());
    }

    #[test]
    fn canonical_measures() {
        let ev = EvolutionDescription::from_rate_times(semiannual(4)).unwrap();
        let terminal = terminal_measure(&ev);
        assert_eq!(terminal, vec![4; 4]);
        assert!(is_in_terminal_measure(&ev, &terminal));

        let mm = money_market_measure(&ev).unwrap();
        assert_eq!(mm, vec![0, 1, 2, 3]);
        assert!(is_in_money_market_measure(&ev, &mm).unwrap());
        assert!(!is_in_money_market_measure(&ev, &terminal).unwrap());

        let mm2 = money_market_plus_measure(&ev, 2).unwrap();
        assert_eq!(mm2, vec![2, 3, 4, 4]);
        assert!(is_in_money_market_plus_measure(&ev, &mm2, 2).unwrap());
        assert!(money_market_plus_measure(&ev, 5).is_err());

        assert_eq!(Measure::identify(&ev, &terminal), Some(Measure::Terminal));
        assert_eq!(Measure::identify(&ev, &mm), Some(Measure::MoneyMarket));
        assert_eq!(Measure::identify(&ev, &mm2), Some(Measure::MoneyMarketPlus(2)));
        assert_eq!(Measure::identify(&ev, &[4, 1, 2, 3]), None);
        assert_eq!(Measure::MoneyMarketPlus(2).numeraires(&ev).unwrap(), mm2);
    }

    #[test]
    fn compatibility_rejects_expired_numeraires() {
        let ev = EvolutionDescription::from_rate_times(semiannual(3)).unwrap();
        assert!(check_compatibility(&ev, &[3, 3, 3]).is_ok());
        assert!(check_compatibility(&ev, &[0, 1, 2]).is_ok());
        assert!(check_compatibility(&ev, &[1, 0, 2]).is_err());
        assert!(check_compatibility(&ev, &[3, 3]).is_err());
        assert!(check_compatibility(&ev, &[3, 3, 4]).is_err());
    }
}
