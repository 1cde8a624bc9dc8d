//! Pseudo-random number generators.
//!
//! Thin wrappers over the `rand_mt` Mersenne Twister: a uniform generator on
//! `(0, 1)` and a Gaussian generator built on the inverse cumulative normal.

use crate::distributions::InverseCumulativeNormal;
use ql_core::Real;
use rand_mt::Mt19937GenRand64;

/// A uniform pseudo-random number generator based on the Mersenne Twister
/// MT19937-64 algorithm.
#[derive(Clone)]
pub struct MersenneTwisterUniformRng {
    rng: Mt19937GenRand64,
}

impl std::fmt::Debug for MersenneTwisterUniformRng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MersenneTwisterUniformRng").finish_non_exhaustive()
    }
}

impl MersenneTwisterUniformRng {
    /// Create a new generator with the given seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mt19937GenRand64::new(seed),
        }
    }

    /// Generate the next uniform deviate in the open interval `(0, 1)`.
    pub fn next_real(&mut self) -> Real {
        // top 53 bits, shifted half a step off zero
        let u = self.rng.next_u64() >> 11;
        (u as Real + 0.5) / (1u64 << 53) as Real
    }

    /// Generate the next raw 64-bit integer.
    pub fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }
}

/// Standard-normal generator: Mersenne Twister uniforms pushed through the
/// inverse cumulative normal.
#[derive(Debug, Clone)]
pub struct InverseCumulativeNormalRng {
    uniform: MersenneTwisterUniformRng,
    inverse: InverseCumulativeNormal,
}

impl InverseCumulativeNormalRng {
    /// Create a new generator backed by a Mersenne Twister with the given
    /// seed.
    pub fn new(seed: u64) -> Self {
        Self {
            uniform: MersenneTwisterUniformRng::new(seed),
            inverse: InverseCumulativeNormal::standard(),
        }
    }

    /// Generate the next standard-normal deviate.
    pub fn next_real(&mut self) -> Real {
        self.inverse.value(self.uniform.next_real())
    }

    /// Fill `out` with independent standard-normal deviates.
    pub fn fill(&mut self, out: &mut [Real]) {
        for x in out.iter_mut() {
            *x = self.next_real();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniforms_stay_in_open_interval() {
        let mut rng = MersenneTwisterUniformRng::new(42);
        for _ in 0..10_000 {
            let x = rng.next_real();
            assert!(x > 0.0 && x < 1.0);
        }
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = InverseCumulativeNormalRng::new(7);
        let mut b = InverseCumulativeNormalRng::new(7);
        let mut c = InverseCumulativeNormalRng::new(8);
        let xs: Vec<Real> = (0..16).map(|_| a.next_real()).collect();
        let ys: Vec<Real> = (0..16).map(|_| b.next_real()).collect();
        let zs: Vec<Real> = (0..16).map(|_| c.next_real()).collect();
        assert_eq!(xs, ys);
        assert_ne!(xs, zs);
    }

    #[test]
    fn gaussian_moments() {
        let mut rng = InverseCumulativeNormalRng::new(42);
        let mut samples = vec![0.0; 20_000];
        rng.fill(&mut samples);
        let n = samples.len() as Real;
        let mean = samples.iter().sum::<Real>() / n;
        let var = samples.iter().map(|x| (x - mean).powi(2)).sum::<Real>() / (n - 1.0);
        assert!(mean.abs() < 0.03, "mean {mean} out of expected range");
        assert!((var - 1.0).abs() < 0.05, "variance {var} out of expected range");
    }
}
