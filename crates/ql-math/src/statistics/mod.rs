//! Weighted statistics accumulators.
//!
//! [`Statistics`] accumulates scalar samples; [`SequenceStatistics`] keeps
//! one accumulator per component of a vector-valued sample, which is what a
//! multi-product Monte Carlo run produces.  Both are pure sums, so two
//! accumulators can be merged in any order.

use ql_core::{ensure, errors::Result, Real};

/// Incremental statistics accumulator.
///
/// Accumulates weighted samples and computes mean, variance, standard
/// deviation, error estimate, min, max, and count.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Statistics {
    count: usize,
    sum_w: Real,
    sum_wx: Real,
    sum_wx2: Real,
    min: Real,
    max: Real,
}

impl Default for Statistics {
    fn default() -> Self {
        Self::new()
    }
}

impl Statistics {
    /// Create a new empty accumulator.
    pub fn new() -> Self {
        Self {
            count: 0,
            sum_w: 0.0,
            sum_wx: 0.0,
            sum_wx2: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    /// Add a single sample with weight 1.
    pub fn add(&mut self, x: Real) {
        self.add_weighted(x, 1.0);
    }

    /// Add a weighted sample.
    pub fn add_weighted(&mut self, x: Real, weight: Real) {
        self.count += 1;
        self.sum_w += weight;
        self.sum_wx += weight * x;
        self.sum_wx2 += weight * x * x;
        if x < self.min {
            self.min = x;
        }
        if x > self.max {
            self.max = x;
        }
    }

    /// Fold another accumulator into this one.
    pub fn merge(&mut self, other: &Statistics) {
        self.count += other.count;
        self.sum_w += other.sum_w;
        self.sum_wx += other.sum_wx;
        self.sum_wx2 += other.sum_wx2;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    /// Number of samples.
    pub fn samples(&self) -> usize {
        self.count
    }

    /// Sum of weights.
    pub fn sum_weights(&self) -> Real {
        self.sum_w
    }

    /// Weighted mean.  Returns `None` if no samples have been added.
    pub fn mean(&self) -> Option<Real> {
        if self.sum_w == 0.0 {
            None
        } else {
            Some(self.sum_wx / self.sum_w)
        }
    }

    /// Weighted variance (unbiased, Bessel-corrected).  Returns `None` for
    /// fewer than 2 samples.
    pub fn variance(&self) -> Option<Real> {
        if self.sum_w == 0.0 || self.count < 2 {
            return None;
        }
        let m = self.sum_wx / self.sum_w;
        // cancellation can leave a tiny negative number for constant samples
        let s2 = (self.sum_wx2 / self.sum_w - m * m).max(0.0);
        Some(s2 * self.count as Real / (self.count as Real - 1.0))
    }

    /// Standard deviation.  Returns `None` for fewer than 2 samples.
    pub fn std_dev(&self) -> Option<Real> {
        self.variance().map(|v| v.sqrt())
    }

    /// Monte Carlo error estimate of the mean, `√(variance / samples)`.
    pub fn error_estimate(&self) -> Option<Real> {
        self.variance()
            .map(|v| (v / self.count as Real).sqrt())
    }

    /// Minimum sample value.  Returns `None` if no samples have been added.
    pub fn minimum(&self) -> Option<Real> {
        if self.count == 0 {
            None
        } else {
            Some(self.min)
        }
    }

    /// Maximum sample value.  Returns `None` if no samples have been added.
    pub fn maximum(&self) -> Option<Real> {
        if self.count == 0 {
            None
        } else {
            Some(self.max)
        }
    }

    /// Reset the accumulator to its initial state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

/// Statistics over vector-valued samples, one [`Statistics`] per component.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SequenceStatistics {
    stats: Vec<Statistics>,
}

impl SequenceStatistics {
    /// Create an accumulator for samples of dimension `dimension`.
    pub fn new(dimension: usize) -> Self {
        Self {
            stats: vec![Statistics::new(); dimension],
        }
    }

    /// Dimension of the accepted samples.
    pub fn size(&self) -> usize {
        self.stats.len()
    }

    /// Add a weighted vector sample.
    pub fn add(&mut self, values: &[Real], weight: Real) -> Result<()> {
        ensure!(
            values.len() == self.stats.len(),
            "sample size mismatch: {} values for a {}-dimensional accumulator",
            values.len(),
            self.stats.len()
        );
        for (s, &x) in self.stats.iter_mut().zip(values) {
            s.add_weighted(x, weight);
        }
        Ok(())
    }

    /// Fold another accumulator of the same dimension into this one.
    pub fn merge(&mut self, other: &SequenceStatistics) -> Result<()> {
        ensure!(
            other.size() == self.size(),
            "cannot merge a {}-dimensional accumulator into a {}-dimensional one",
            other.size(),
            self.size()
        );
        for (s, o) in self.stats.iter_mut().zip(&other.stats) {
            s.merge(o);
        }
        Ok(())
    }

    /// Number of samples added so far.
    pub fn samples(&self) -> usize {
        self.stats.first().map_or(0, Statistics::samples)
    }

    /// Per-component weighted means (NaN where no weight was added).
    pub fn mean(&self) -> Vec<Real> {
        self.stats
            .iter()
            .map(|s| s.mean().unwrap_or(Real::NAN))
            .collect()
    }

    /// Per-component Bessel-corrected variances (NaN with fewer than two samples).
    pub fn variance(&self) -> Vec<Real> {
        self.stats
            .iter()
            .map(|s| s.variance().unwrap_or(Real::NAN))
            .collect()
    }

    /// Per-component error estimates of the means.
    pub fn error_estimate(&self) -> Vec<Real> {
        self.stats
            .iter()
            .map(|s| s.error_estimate().unwrap_or(Real::NAN))
            .collect()
    }

    /// Accumulator of a single component.
    pub fn component(&self, i: usize) -> Option<&Statistics> {
        self.stats.get(i)
    }

    /// Reset every component.
    pub fn reset(&mut self) {
        self.stats.iter_mut().for_each(Statistics::reset);
    }
}
