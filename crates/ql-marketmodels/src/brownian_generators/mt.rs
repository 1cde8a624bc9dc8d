use super::{BrownianGenerator, BrownianGeneratorFactory};
use ql_core::{ensure, errors::Result, Real, Size};
use ql_math::InverseCumulativeNormalRng;

/// Pseudo-random Brownian generator on a Mersenne Twister stream.
///
/// Draws are consumed step by step along the path; every weight is 1.
#[derive(Debug, Clone)]
pub struct MtBrownianGenerator {
    rng: InverseCumulativeNormalRng,
    factors: Size,
    steps: Size,
    last_step: Size,
}

impl MtBrownianGenerator {
    /// Generator for `factors` draws over `steps` steps, seeded with `seed`.
    pub fn new(factors: Size, steps: Size, seed: u64) -> Result<Self> {
        ensure!(factors > 0, "at least one factor is required");
        ensure!(steps > 0, "at least one step is required");
        Ok(Self {
            rng: InverseCumulativeNormalRng::new(seed),
            factors,
            steps,
            last_step: 0,
        })
    }
}

impl BrownianGenerator for MtBrownianGenerator {
    fn next_step(&mut self, output: &mut [Real]) -> Result<Real> {
        ensure!(
            self.last_step < self.steps,
            "sequence exhausted: all {} steps already drawn for this path",
            self.steps
        );
        ensure!(
            output.len() == self.factors,
            "output holds {} draws, {} factors required",
            output.len(),
            self.factors
        );
        self.rng.fill(output);
        self.last_step += 1;
        Ok(1.0)
    }

    fn next_path(&mut self) -> Real {
        self.last_step = 0;
        1.0
    }

    fn number_of_factors(&self) -> Size {
        self.factors
    }

    fn number_of_steps(&self) -> Size {
        self.steps
    }
}

/// Factory for [`MtBrownianGenerator`]; every generator starts from the
/// same seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MtBrownianGeneratorFactory {
    seed: u64,
}

impl MtBrownianGeneratorFactory {
    /// Factory handing out generators seeded with `seed`.
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// The seed given to every generator.
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl BrownianGeneratorFactory for MtBrownianGeneratorFactory {
    fn create(&self, factors: Size, steps: Size) -> Result<Box<dyn BrownianGenerator>> {
        Ok(Box::new(MtBrownianGenerator::new(factors, steps, self.seed)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_are_bounded_per_path() {
        let mut g = MtBrownianGenerator::new(2, 3, 42).unwrap();
        let mut out = [0.0; 2];
        assert_eq!(g.next_path(), 1.0);
        for _ in 0..3 {
            assert_eq!(g.next_step(&mut out).unwrap(), 1.0);
            assert!(out.iter().all(|x| x.is_finite()));
        }
        assert!(g.next_step(&mut out).is_err());
        g.next_path();
        assert!(g.next_step(&mut out).is_ok());
        assert!(g.next_step(&mut [0.0; 3]).is_err());
    }

    #[test]
    fn same_seed_same_draws() {
        let factory = MtBrownianGeneratorFactory::new(7);
        let mut a = factory.create(3, 2).unwrap();
        let mut b = factory.create(3, 2).unwrap();
        let (mut x, mut y) = ([0.0; 3], [0.0; 3]);
        a.next_path();
        b.next_path();
        a.next_step(&mut x).unwrap();
        b.next_step(&mut y).unwrap();
        assert_eq!(x, y);
        assert!(MtBrownianGeneratorFactory::new(7).create(0, 2).is_err());
    }

    #[test]
    fn draws_look_standard_normal() {
        let mut g = MtBrownianGenerator::new(1, 1, 1).unwrap();
        let mut out = [0.0];
        let n = 20_000;
        let (mut sum, mut sum_sq) = (0.0, 0.0);
        for _ in 0..n {
            g.next_path();
            g.next_step(&mut out).unwrap();
            sum += out[0];
            sum_sq += out[0] * out[0];
        }
        let mean = sum / n as Real;
        let var = sum_sq / n as Real - mean * mean;
        assert!(mean.abs() < 0.03, "mean {mean}");
        assert!((var - 1.0).abs() < 0.05, "variance {var}");
    }
}
