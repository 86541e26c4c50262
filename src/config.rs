//! Engine hyper-parameters.
//!
//! [`BrkgaParams`] holds everything the engine consumes; the struct is
//! copied by value into the engine at build time and never aliased.
//! [`ExternalControlParams`] carries knobs for the caller's own control
//! loop (exchange/reset cadence) — the engine itself never reads them.

use crate::path_relink::{PathRelinkingSelection, PathRelinkingType};
use crate::types::BiasFunction;

/// BRKGA-MP-IPR hyper-parameters.
///
/// # Invariants
///
/// `validate()` enforces:
///
/// - `elite_size = floor(population_size * elite_percentage) > 0`
/// - `num_mutants = floor(population_size * mutants_percentage) > 0`
/// - `elite_size + num_mutants < population_size`
/// - `1 ≤ num_elite_parents < total_parents ≤ elite_size`
/// - `elite_percentage`, `mutants_percentage`, `pr_percentage` in `(0, 1]`
///
/// # Builder Pattern
///
/// ```
/// use brkga_mp_ipr::{BiasFunction, BrkgaParams};
///
/// let params = BrkgaParams::default()
///     .with_population_size(200)
///     .with_elite_percentage(0.25)
///     .with_num_elite_parents(2)
///     .with_total_parents(4)
///     .with_bias_type(BiasFunction::Quadratic)
///     .with_num_independent_populations(3);
/// assert!(params.validate().is_ok());
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct BrkgaParams {
    /// Number of individuals in each sub-population.
    pub population_size: usize,

    /// Fraction of each sub-population kept as elite, in `(0, 1]`.
    /// Typical range: 0.10–0.25.
    pub elite_percentage: f64,

    /// Fraction of each sub-population replaced by fresh random mutants
    /// every generation, in `(0, 1]`. Typical range: 0.10–0.30.
    pub mutants_percentage: f64,

    /// Number of parents drawn from the elite set for each mating.
    pub num_elite_parents: usize,

    /// Total number of parents for each mating (elite + non-elite).
    pub total_parents: usize,

    /// Rank-to-weight bias used during mating.
    pub bias_type: BiasFunction,

    /// Number of independently evolving sub-populations.
    pub num_independent_populations: usize,

    /// Number of base/guide pairs tested per ring pair during path
    /// relinking. `0` means try every elite pair.
    pub pr_number_pairs: usize,

    /// Minimum distance between base and guide chromosomes for a pair to
    /// qualify for path relinking, and the diversity gate for elite
    /// insertion afterwards.
    pub pr_minimum_distance: f64,

    /// Path relinking variant.
    pub pr_type: PathRelinkingType,

    /// How base/guide individuals are drawn from the elite sets.
    pub pr_selection: PathRelinkingSelection,

    /// Block-size factor: callers typically pass
    /// `alpha_block_size * sqrt(population_size)` as the relink block
    /// size.
    pub alpha_block_size: f64,

    /// Fraction of the relinking path to explore, in `(0, 1]`.
    pub pr_percentage: f64,
}

impl Default for BrkgaParams {
    fn default() -> Self {
        Self {
            population_size: 100,
            elite_percentage: 0.20,
            mutants_percentage: 0.15,
            num_elite_parents: 2,
            total_parents: 3,
            bias_type: BiasFunction::LogInverse,
            num_independent_populations: 1,
            pr_number_pairs: 0,
            pr_minimum_distance: 0.15,
            pr_type: PathRelinkingType::Direct,
            pr_selection: PathRelinkingSelection::BestSolution,
            alpha_block_size: 1.0,
            pr_percentage: 1.0,
        }
    }
}

impl BrkgaParams {
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    pub fn with_elite_percentage(mut self, f: f64) -> Self {
        self.elite_percentage = f;
        self
    }

    pub fn with_mutants_percentage(mut self, f: f64) -> Self {
        self.mutants_percentage = f;
        self
    }

    pub fn with_num_elite_parents(mut self, n: usize) -> Self {
        self.num_elite_parents = n;
        self
    }

    pub fn with_total_parents(mut self, n: usize) -> Self {
        self.total_parents = n;
        self
    }

    pub fn with_bias_type(mut self, bias: BiasFunction) -> Self {
        self.bias_type = bias;
        self
    }

    pub fn with_num_independent_populations(mut self, n: usize) -> Self {
        self.num_independent_populations = n;
        self
    }

    pub fn with_pr_number_pairs(mut self, n: usize) -> Self {
        self.pr_number_pairs = n;
        self
    }

    pub fn with_pr_minimum_distance(mut self, d: f64) -> Self {
        self.pr_minimum_distance = d;
        self
    }

    pub fn with_pr_type(mut self, t: PathRelinkingType) -> Self {
        self.pr_type = t;
        self
    }

    pub fn with_pr_selection(mut self, s: PathRelinkingSelection) -> Self {
        self.pr_selection = s;
        self
    }

    pub fn with_alpha_block_size(mut self, a: f64) -> Self {
        self.alpha_block_size = a;
        self
    }

    pub fn with_pr_percentage(mut self, p: f64) -> Self {
        self.pr_percentage = p;
        self
    }

    /// Number of elite individuals implied by these parameters.
    pub fn elite_size(&self) -> usize {
        (self.population_size as f64 * self.elite_percentage) as usize
    }

    /// Number of mutants implied by these parameters.
    pub fn num_mutants(&self) -> usize {
        (self.population_size as f64 * self.mutants_percentage) as usize
    }

    /// Validates the parameter set.
    pub fn validate(&self) -> crate::Result<()> {
        use crate::BrkgaError::InvalidParameter;

        if self.population_size == 0 {
            return Err(InvalidParameter("population_size must be > 0".into()));
        }
        if !(self.elite_percentage > 0.0 && self.elite_percentage <= 1.0) {
            return Err(InvalidParameter(format!(
                "elite_percentage ({}) must be in (0, 1]",
                self.elite_percentage
            )));
        }
        if !(self.mutants_percentage > 0.0 && self.mutants_percentage <= 1.0) {
            return Err(InvalidParameter(format!(
                "mutants_percentage ({}) must be in (0, 1]",
                self.mutants_percentage
            )));
        }
        let elite_size = self.elite_size();
        let num_mutants = self.num_mutants();
        if elite_size == 0 {
            return Err(InvalidParameter(
                "elite_percentage too small: no elite individuals".into(),
            ));
        }
        if num_mutants == 0 {
            return Err(InvalidParameter(
                "mutants_percentage too small: no mutants".into(),
            ));
        }
        if elite_size + num_mutants >= self.population_size {
            return Err(InvalidParameter(format!(
                "elite_size ({elite_size}) + num_mutants ({num_mutants}) must be \
                 smaller than population_size ({})",
                self.population_size
            )));
        }
        if self.num_elite_parents == 0 {
            return Err(InvalidParameter("num_elite_parents must be > 0".into()));
        }
        if self.num_elite_parents >= self.total_parents {
            return Err(InvalidParameter(format!(
                "num_elite_parents ({}) must be smaller than total_parents ({})",
                self.num_elite_parents, self.total_parents
            )));
        }
        if self.total_parents > elite_size {
            return Err(InvalidParameter(format!(
                "total_parents ({}) cannot exceed elite_size ({elite_size})",
                self.total_parents
            )));
        }
        let non_elite_parents = self.total_parents - self.num_elite_parents;
        if non_elite_parents > self.population_size - elite_size {
            return Err(InvalidParameter(format!(
                "cannot draw {non_elite_parents} distinct non-elite parents \
                 from {} non-elite individuals",
                self.population_size - elite_size
            )));
        }
        if self.num_independent_populations == 0 {
            return Err(InvalidParameter(
                "num_independent_populations must be > 0".into(),
            ));
        }
        if self.pr_minimum_distance < 0.0 {
            return Err(InvalidParameter(
                "pr_minimum_distance must be non-negative".into(),
            ));
        }
        if !(self.pr_percentage > 0.0 && self.pr_percentage <= 1.0) {
            return Err(InvalidParameter(format!(
                "pr_percentage ({}) must be in (0, 1]",
                self.pr_percentage
            )));
        }
        if self.alpha_block_size <= 0.0 {
            return Err(InvalidParameter(
                "alpha_block_size must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Control parameters consumed by the caller's outer loop, not by the
/// engine: how often to migrate elites, how many to migrate, and how often
/// to reset the populations.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default)]
pub struct ExternalControlParams {
    /// Generations between [`exchange_elite`](crate::Brkga::exchange_elite)
    /// calls (0 disables migration).
    pub exchange_interval: usize,

    /// Number of elite chromosomes migrated from each sub-population.
    pub num_exchange_individuals: usize,

    /// Generations between [`reset`](crate::Brkga::reset) calls
    /// (0 disables resets).
    pub reset_interval: usize,
}
