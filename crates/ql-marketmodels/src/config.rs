//! Simulation configuration.
//!
//! The numerical core propagates NaN/Inf silently by default, exactly like
//! a plain predictor-corrector implementation would.  The switches here
//! turn on explicit checks without changing the arithmetic of valid paths.

use ql_core::{ensure, errors::Result};

/// Largest accepted worker count for parallel batches.
pub const MAX_WORKERS: usize = 1024;

/// What to do with a path whose forwards or values are not finite.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PathValidation {
    /// Feed every path to the statistics, NaN included.
    #[default]
    Propagate,
    /// Drop non-finite paths from the statistics and count them.
    Reject,
}

/// Immutable simulation settings shared by evolvers and accounting engines.
///
/// # Examples
///
/// ```rust
/// use ql_marketmodels::config::{PathValidation, SimulationConfig};
///
/// let config = SimulationConfig::builder()
///     .seed(42)
///     .path_validation(PathValidation::Reject)
///     .drift_validation(true)
///     .build()
///     .expect("valid config");
///
/// assert_eq!(config.seed(), 42);
/// assert!(config.drift_validation());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimulationConfig {
    seed: u64,
    drift_validation: bool,
    path_validation: PathValidation,
    workers: Option<usize>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            drift_validation: false,
            path_validation: PathValidation::Propagate,
            workers: None,
        }
    }
}

impl SimulationConfig {
    /// Creates a new configuration builder.
    #[inline]
    pub fn builder() -> SimulationConfigBuilder {
        SimulationConfigBuilder::default()
    }

    /// Base seed for Brownian generators.
    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Whether drift calculators reject `1 + τ·f <= 0` and non-finite input.
    #[inline]
    pub fn drift_validation(&self) -> bool {
        self.drift_validation
    }

    /// Policy for non-finite paths.
    #[inline]
    pub fn path_validation(&self) -> PathValidation {
        self.path_validation
    }

    /// Requested worker count for parallel batches (`None` = one per thread).
    #[inline]
    pub fn workers(&self) -> Option<usize> {
        self.workers
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if let Some(w) = self.workers {
            ensure!(
                w > 0 && w <= MAX_WORKERS,
                "worker count must be in [1, {MAX_WORKERS}], got {w}"
            );
        }
        Ok(())
    }
}

/// Builder for [`SimulationConfig`].
#[derive(Clone, Debug, Default)]
pub struct SimulationConfigBuilder {
    seed: Option<u64>,
    drift_validation: bool,
    path_validation: PathValidation,
    workers: Option<usize>,
}

impl SimulationConfigBuilder {
    /// Sets the base seed.
    #[inline]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Enables or disables drift input validation.
    #[inline]
    pub fn drift_validation(mut self, enabled: bool) -> Self {
        self.drift_validation = enabled;
        self
    }

    /// Sets the non-finite path policy.
    #[inline]
    pub fn path_validation(mut self, policy: PathValidation) -> Self {
        self.path_validation = policy;
        self
    }

    /// Sets the worker count for parallel batches.
    #[inline]
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Builds and validates the configuration.
    pub fn build(self) -> Result<SimulationConfig> {
        let config = SimulationConfig {
            seed: self.seed.unwrap_or(SimulationConfig::default().seed),
            drift_validation: self.drift_validation,
            path_validation: self.path_validation,
            workers: self.workers,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_the_unchecked_baseline() {
        let config = SimulationConfig::builder().build().unwrap();
        assert_eq!(config, SimulationConfig::default());
        assert!(!config.drift_validation());
        assert_eq!(config.path_validation(), PathValidation::Propagate);
        assert_eq!(config.workers(), None);
    }

    #[test]
    fn rejects_bad_worker_count() {
        assert!(SimulationConfig::builder().workers(0).build().is_err());
        assert!(SimulationConfig::builder()
            .workers(MAX_WORKERS + 1)
            .build()
            .is_err());
        let config = SimulationConfig::builder().workers(4).build().unwrap();
        assert_eq!(config.workers(), Some(4));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_round_trip() {
        let config = SimulationConfig::builder()
            .seed(7)
            .path_validation(PathValidation::Reject)
            .build()
            .unwrap();
        let json = serde_json::to_string(&config).unwrap();
        let back: SimulationConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
