use super::{check_curve, MarketModel};
use crate::evolution_description::EvolutionDescription;
use ql_core::{ensure, ensure_index, errors::Result, Rate, Size, Spread};
use ql_math::{pseudo_sqrt, Matrix};

/// Market model from explicitly supplied pseudo-roots, one per step.
#[derive(Clone, Debug)]
pub struct PseudoRootFacade {
    evolution: EvolutionDescription,
    pseudo_roots: Vec<Matrix>,
    initial_rates: Vec<Rate>,
    displacements: Vec<Spread>,
    number_of_factors: Size,
}

impl PseudoRootFacade {
    /// Every pseudo-root must be `n × F` with the same `F` and finite
    /// entries.
    pub fn new(
        evolution: EvolutionDescription,
        pseudo_roots: Vec<Matrix>,
        initial_rates: Vec<Rate>,
        displacements: Vec<Spread>,
    ) -> Result<Self> {
        check_curve(&evolution, &initial_rates, &displacements)?;
        let n = evolution.number_of_rates();
        let steps = evolution.number_of_steps();
        ensure!(
            pseudo_roots.len() == steps,
            "pseudo-roots ({}) mismatch with evolution steps ({steps})",
            pseudo_roots.len()
        );
        let number_of_factors = pseudo_roots[0].cols();
        ensure!(
            number_of_factors > 0 && number_of_factors <= n,
            "number of factors ({number_of_factors}) must be in [1, {n}]"
        );
        for (k, root) in pseudo_roots.iter().enumerate() {
            ensure!(
                root.rows() == n && root.cols() == number_of_factors,
                "pseudo-root {k} is {}×{}, expected {n}×{number_of_factors}",
                root.rows(),
                root.cols()
            );
            ensure!(root.is_finite(), "pseudo-root {k} has non-finite entries");
        }
        Ok(Self {
            evolution,
            pseudo_roots,
            initial_rates,
            displacements,
            number_of_factors,
        })
    }

    /// Full-factor model from per-step covariance matrices, each rooted
    /// by its spectral pseudo square root.
    pub fn from_covariances(
        evolution: EvolutionDescription,
        covariances: &[Matrix],
        initial_rates: Vec<Rate>,
        displacements: Vec<Spread>,
    ) -> Result<Self> {
        let pseudo_roots = covariances.iter().map(pseudo_sqrt).collect::<Result<Vec<_>>>()?;
        Self::new(evolution, pseudo_roots, initial_rates, displacements)
    }
}

impl MarketModel for PseudoRootFacade {
    fn initial_rates(&self) -> &[Rate] {
        &self.initial_rates
    }

    fn displacements(&self) -> &[Spread] {
        &self.displacements
    }

    fn evolution(&self) -> &EvolutionDescription {
        &self.evolution
    }

    fn number_of_factors(&self) -> Size {
        self.number_of_factors
    }

    fn pseudo_root(&self, step: Size) -> Result<&Matrix> {
        ensure_index!(step, self.pseudo_roots.len());
        Ok(&self.pseudo_roots[step])
    }
}
