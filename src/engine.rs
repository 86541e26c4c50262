//! Engine state and the evolutionary operators.
//!
//! [`Brkga`] owns everything for the lifetime of a run: the decoder, the
//! hyper-parameters (copied by value at build time), one explicit RNG
//! stream, the current/previous population sets, the bias-function
//! closure, and the best individual found so far. All operations are
//! synchronous; the only parallelism is inside the decode batches.

use crate::config::BrkgaParams;
use crate::decoder::{decode_batch, decode_writeback};
use crate::error::{BrkgaError, Result};
use crate::population::{Individual, Population};
use crate::types::{BiasFunction, Decoder, Sense, ShakingType};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use std::ops::Range;

type BiasClosure = Box<dyn Fn(usize) -> f64 + Send + Sync>;

/// The BRKGA-MP-IPR engine.
///
/// Built once via [`Brkga::build`], then driven by the caller:
/// [`initialize`](Self::initialize) first, then any mix of
/// [`evolve`](Self::evolve), [`path_relink`](Self::path_relink),
/// [`shake`](Self::shake), [`reset`](Self::reset) and
/// [`exchange_elite`](Self::exchange_elite).
///
/// # Examples
///
/// ```
/// use brkga_mp_ipr::{Brkga, BrkgaParams, Decoder, Sense};
///
/// struct Sphere;
/// impl Decoder for Sphere {
///     fn decode(&self, chromosome: &mut [f64], _writeback: bool) -> f64 {
///         chromosome.iter().map(|k| (k - 0.5).powi(2)).sum()
///     }
/// }
///
/// let params = BrkgaParams::default().with_population_size(50);
/// let mut brkga = Brkga::build(Sphere, Sense::Minimize, 42, 10, params, true).unwrap();
/// brkga.initialize().unwrap();
/// brkga.evolve(20).unwrap();
/// let best = brkga.best_fitness().unwrap();
/// assert!(best < 0.5);
/// ```
pub struct Brkga<D: Decoder> {
    pub(crate) decoder: D,
    pub(crate) sense: Sense,
    pub(crate) chromosome_size: usize,
    pub(crate) params: BrkgaParams,
    pub(crate) elite_size: usize,
    num_mutants: usize,
    evolutionary_mechanism_on: bool,
    pub(crate) rng: StdRng,
    pub(crate) current: Vec<Population>,
    previous: Vec<Population>,
    bias_function: Option<BiasClosure>,
    total_bias_weight: f64,
    initial_chromosomes: Vec<Vec<f64>>,
    pub(crate) best: Individual,
    initialized: bool,
    reset_phase: bool,
}

fn random_keys(rng: &mut StdRng, n: usize) -> Vec<f64> {
    (0..n).map(|_| rng.random_range(0.0..1.0)).collect()
}

fn builtin_bias(bias_type: BiasFunction, total_parents: usize) -> Option<BiasClosure> {
    match bias_type {
        BiasFunction::Constant => {
            let w = 1.0 / total_parents as f64;
            Some(Box::new(move |_| w))
        }
        BiasFunction::Linear => Some(Box::new(|r| 1.0 / r as f64)),
        BiasFunction::Quadratic => Some(Box::new(|r| (r as f64).powi(-2))),
        BiasFunction::Cubic => Some(Box::new(|r| (r as f64).powi(-3))),
        BiasFunction::Exponential => Some(Box::new(|r| (-(r as f64)).exp())),
        BiasFunction::LogInverse => Some(Box::new(|r| 1.0 / (r as f64 + 1.0).ln())),
        BiasFunction::Custom => None,
    }
}

impl<D: Decoder> Brkga<D> {
    /// Builds the engine state, validating every parameter and failing
    /// fast on violation. `params` is copied by value and never aliased.
    ///
    /// With `evolutionary_mechanism_on = false` no mating is performed:
    /// each generation keeps only the single best individual and reseeds
    /// the rest at random, which emulates a multi-start search on top of
    /// the decoder.
    pub fn build(
        decoder: D,
        sense: Sense,
        seed: u64,
        chromosome_size: usize,
        params: BrkgaParams,
        evolutionary_mechanism_on: bool,
    ) -> Result<Self> {
        if chromosome_size == 0 {
            return Err(BrkgaError::InvalidParameter(
                "chromosome_size must be > 0".into(),
            ));
        }
        params.validate()?;

        let (elite_size, num_mutants) = if evolutionary_mechanism_on {
            (params.elite_size(), params.num_mutants())
        } else {
            (1, params.population_size - 1)
        };

        let bias_function = builtin_bias(params.bias_type, params.total_parents);
        let total_bias_weight = bias_function
            .as_ref()
            .map(|f| (1..=params.total_parents).map(|r| f(r)).sum())
            .unwrap_or(0.0);

        Ok(Self {
            decoder,
            sense,
            chromosome_size,
            elite_size,
            num_mutants,
            evolutionary_mechanism_on,
            rng: StdRng::seed_from_u64(seed),
            current: Vec::new(),
            previous: Vec::new(),
            bias_function,
            total_bias_weight,
            initial_chromosomes: Vec::new(),
            best: Individual {
                keys: Vec::new(),
                fitness: sense.worst(),
            },
            initialized: false,
            reset_phase: false,
            params,
        })
    }

    /// Registers warm-start chromosomes. They are placed at the head of
    /// the first sub-population during [`initialize`](Self::initialize)
    /// and decoded like any other individual.
    ///
    /// Must be called before `initialize`; at most `population_size`
    /// chromosomes, each of exactly `chromosome_size` alleles.
    pub fn set_initial_population(&mut self, chromosomes: Vec<Vec<f64>>) -> Result<()> {
        if self.initialized {
            return Err(BrkgaError::AlreadyInitialized("set_initial_population"));
        }
        if chromosomes.len() > self.params.population_size {
            return Err(BrkgaError::InvalidArgument(format!(
                "{} warm-start chromosomes exceed population_size ({})",
                chromosomes.len(),
                self.params.population_size
            )));
        }
        for chr in &chromosomes {
            if chr.len() != self.chromosome_size {
                return Err(BrkgaError::ChromosomeLengthMismatch {
                    expected: self.chromosome_size,
                    actual: chr.len(),
                });
            }
        }
        self.initial_chromosomes = chromosomes;
        Ok(())
    }

    /// Registers a custom mating bias. The closure maps a parent rank
    /// (1 = best) to a weight and must be non-negative and
    /// non-increasing; it is validated by sampling ranks
    /// `1..=total_parents` rather than trusted blindly.
    ///
    /// Must be called before [`initialize`](Self::initialize).
    pub fn set_bias_custom_function<F>(&mut self, bias: F) -> Result<()>
    where
        F: Fn(usize) -> f64 + Send + Sync + 'static,
    {
        if self.initialized {
            return Err(BrkgaError::AlreadyInitialized("set_bias_custom_function"));
        }
        let mut previous = f64::INFINITY;
        let mut total = 0.0;
        for rank in 1..=self.params.total_parents {
            let weight = bias(rank);
            if weight < 0.0 || weight > previous {
                return Err(BrkgaError::InvalidArgument(format!(
                    "bias function must be non-negative and non-increasing \
                     in rank (violated at rank {rank})"
                )));
            }
            previous = weight;
            total += weight;
        }
        if total <= 0.0 {
            return Err(BrkgaError::InvalidArgument(
                "bias function weights must not all be zero".into(),
            ));
        }
        self.bias_function = Some(Box::new(bias));
        self.total_bias_weight = total;
        self.params.bias_type = BiasFunction::Custom;
        Ok(())
    }

    /// Creates and decodes all sub-populations. Warm-start chromosomes,
    /// if any, fill the first slots of sub-population 0.
    ///
    /// Must be called exactly once, before any other optimization
    /// operation.
    pub fn initialize(&mut self) -> Result<()> {
        if self.initialized {
            return Err(BrkgaError::AlreadyInitialized("initialize"));
        }
        if self.bias_function.is_none() {
            return Err(BrkgaError::InvalidParameter(
                "bias_type is Custom but no bias function was registered; \
                 call set_bias_custom_function first"
                    .into(),
            ));
        }

        let n = self.chromosome_size;
        let psize = self.params.population_size;
        let num_pops = self.params.num_independent_populations;

        let mut populations = Vec::with_capacity(num_pops);
        for p in 0..num_pops {
            let mut individuals: Vec<Individual> = (0..psize)
                .map(|_| Individual {
                    keys: random_keys(&mut self.rng, n),
                    fitness: self.sense.worst(),
                })
                .collect();
            if p == 0 && !self.reset_phase {
                for (slot, chr) in individuals.iter_mut().zip(&self.initial_chromosomes) {
                    slot.keys = chr.clone();
                }
            }
            populations.push(Population::new(individuals));
        }

        for pop in &mut populations {
            decode_batch(&self.decoder, &mut pop.individuals);
            pop.sort(self.sense);
        }

        self.current = populations;
        self.previous = self.current.clone();
        self.initialized = true;
        self.reset_phase = false;
        self.update_best();
        Ok(())
    }

    /// Evolves every sub-population for `num_generations` generations.
    pub fn evolve(&mut self, num_generations: usize) -> Result<()> {
        self.ensure_initialized()?;
        if num_generations == 0 {
            return Err(BrkgaError::InvalidArgument(
                "num_generations must be at least 1".into(),
            ));
        }
        for _ in 0..num_generations {
            for idx in 0..self.params.num_independent_populations {
                self.evolve_population(idx)?;
            }
        }
        Ok(())
    }

    /// Evolves a single sub-population one generation: elite copy,
    /// mutant injection, biased multi-parent crossover, one parallel
    /// decode batch, sort, best update.
    pub fn evolve_population(&mut self, population_index: usize) -> Result<()> {
        self.ensure_initialized()?;
        self.check_population_index(population_index)?;

        let sense = self.sense;
        let n = self.chromosome_size;
        let psize = self.params.population_size;
        let elite_size = self.elite_size;
        let num_mutants = self.num_mutants;
        let num_elite_parents = self.params.num_elite_parents;
        let total_parents = self.params.total_parents;
        let total_bias_weight = self.total_bias_weight;
        let mating = self.evolutionary_mechanism_on;

        let Brkga {
            current,
            previous,
            rng,
            bias_function,
            decoder,
            best,
            ..
        } = self;
        let bias = bias_function
            .as_ref()
            .expect("bias function is set once initialized");

        let cur = &current[population_index];
        let next = &mut previous[population_index];

        // Phase 1: elite copy.
        for i in 0..elite_size {
            next.individuals[i].clone_from(&cur.individuals[i]);
        }

        // Phase 2: mutant injection.
        for i in elite_size..elite_size + num_mutants {
            let ind = &mut next.individuals[i];
            for key in ind.keys.iter_mut() {
                *key = rng.random_range(0.0..1.0);
            }
            ind.fitness = sense.worst();
        }

        // Phase 3: biased multi-parent crossover for the remaining slots.
        if mating {
            let mut parents = Vec::with_capacity(total_parents);
            for slot in elite_size + num_mutants..psize {
                parents.clear();
                for i in index::sample(rng, elite_size, num_elite_parents) {
                    parents.push(i);
                }
                for i in index::sample(rng, psize - elite_size, total_parents - num_elite_parents)
                {
                    parents.push(elite_size + i);
                }
                // Rank parents best-first; rank 1 gets bias(1).
                parents.sort_by(|&a, &b| {
                    let ord = cur.individuals[a]
                        .fitness
                        .partial_cmp(&cur.individuals[b].fitness)
                        .unwrap_or(std::cmp::Ordering::Equal);
                    match sense {
                        Sense::Minimize => ord,
                        Sense::Maximize => ord.reverse(),
                    }
                });

                let offspring = &mut next.individuals[slot];
                for j in 0..n {
                    // Weighted lottery over ranks, independent per allele.
                    let mut toss = rng.random_range(0.0..total_bias_weight);
                    let mut donor = *parents.last().expect("total_parents > 0");
                    for (rank0, &p) in parents.iter().enumerate() {
                        toss -= bias(rank0 + 1);
                        if toss <= 0.0 {
                            donor = p;
                            break;
                        }
                    }
                    offspring.keys[j] = cur.individuals[donor].keys[j];
                }
                offspring.fitness = sense.worst();
            }
        }

        // Decode all non-elite individuals in one parallel batch.
        decode_batch(&*decoder, &mut next.individuals[elite_size..]);
        next.sort(sense);

        std::mem::swap(
            &mut current[population_index],
            &mut previous[population_index],
        );

        let pop_best = current[population_index].best();
        if sense.improves(pop_best.fitness, best.fitness) {
            let mut keys = pop_best.keys.clone();
            let fitness = decode_writeback(&*decoder, &mut keys);
            *best = Individual { keys, fitness };
        }
        Ok(())
    }

    /// Ring migration: each sub-population receives deep copies of the
    /// `num_immigrants` best individuals of its ring predecessor,
    /// replacing its own `num_immigrants` worst. No-op with a single
    /// sub-population.
    pub fn exchange_elite(&mut self, num_immigrants: usize) -> Result<()> {
        self.ensure_initialized()?;
        let num_pops = self.params.num_independent_populations;
        if num_pops == 1 {
            return Ok(());
        }
        let psize = self.params.population_size;
        let limit = psize.div_ceil(num_pops);
        if num_immigrants == 0 || num_immigrants >= limit {
            return Err(BrkgaError::InvalidArgument(format!(
                "num_immigrants ({num_immigrants}) must be in [1, {})",
                limit
            )));
        }

        // Snapshot sources first so every copy comes from the
        // pre-exchange elites.
        let immigrants: Vec<Vec<Individual>> = (0..num_pops)
            .map(|target| {
                let source = (target + num_pops - 1) % num_pops;
                self.current[source].individuals[..num_immigrants].to_vec()
            })
            .collect();

        for (target, group) in immigrants.into_iter().enumerate() {
            let pop = &mut self.current[target];
            let start = psize - num_immigrants;
            for (slot, immigrant) in pop.individuals[start..].iter_mut().zip(group) {
                *slot = immigrant;
            }
            pop.sort(self.sense);
        }
        Ok(())
    }

    /// Shakes the targeted sub-population(s): perturbs each elite
    /// individual `intensity` times with the moves of `shaking_type`,
    /// fully reseeds the non-elite individuals, then re-decodes and
    /// re-sorts. `None` targets every sub-population.
    pub fn shake(
        &mut self,
        intensity: usize,
        shaking_type: ShakingType,
        population_index: Option<usize>,
    ) -> Result<()> {
        self.ensure_initialized()?;
        if intensity == 0 {
            return Err(BrkgaError::InvalidArgument(
                "shaking intensity must be at least 1".into(),
            ));
        }
        let targets = self.target_range(population_index)?;

        let sense = self.sense;
        let n = self.chromosome_size;
        let elite_size = self.elite_size;
        let Brkga {
            current,
            rng,
            decoder,
            best,
            ..
        } = self;

        for idx in targets {
            let pop = &mut current[idx];
            for e in 0..elite_size {
                let keys = &mut pop.individuals[e].keys;
                for _ in 0..intensity {
                    match shaking_type {
                        ShakingType::Change => {
                            let i = rng.random_range(0..n);
                            keys[i] = 1.0 - keys[i];
                            let i = rng.random_range(0..n);
                            keys[i] = rng.random_range(0.0..1.0);
                        }
                        ShakingType::Swap => {
                            if n > 1 {
                                let i = rng.random_range(0..n - 1);
                                keys.swap(i, i + 1);
                                let i = rng.random_range(0..n);
                                let j = rng.random_range(0..n);
                                keys.swap(i, j);
                            }
                        }
                    }
                }
                pop.individuals[e].fitness = sense.worst();
            }
            for ind in &mut pop.individuals[elite_size..] {
                ind.keys = random_keys(rng, n);
                ind.fitness = sense.worst();
            }
            decode_batch(&*decoder, &mut pop.individuals);
            pop.sort(sense);
            if sense.improves(pop.best().fitness, best.fitness) {
                *best = pop.best().clone();
            }
        }
        Ok(())
    }

    /// Rebuilds the targeted sub-population(s) from scratch with fresh
    /// random chromosomes, discarding any warm-start origin. The best
    /// individual found so far is kept. `None` targets every
    /// sub-population.
    pub fn reset(&mut self, population_index: Option<usize>) -> Result<()> {
        self.ensure_initialized()?;
        let targets = self.target_range(population_index)?;
        self.reset_phase = true;

        let sense = self.sense;
        let n = self.chromosome_size;
        let Brkga {
            current,
            rng,
            decoder,
            best,
            ..
        } = self;

        for idx in targets {
            let pop = &mut current[idx];
            for ind in &mut pop.individuals {
                ind.keys = random_keys(rng, n);
                ind.fitness = sense.worst();
            }
            decode_batch(&*decoder, &mut pop.individuals);
            pop.sort(sense);
            if sense.improves(pop.best().fitness, best.fitness) {
                *best = pop.best().clone();
            }
        }
        self.reset_phase = false;
        Ok(())
    }

    /// Inserts `keys` at `position` of sub-population `population_index`.
    /// When `fitness` is given the chromosome is **not** decoded (the
    /// value is trusted as-is); otherwise a single writeback decode is
    /// performed. The population is re-sorted afterwards.
    pub fn inject_chromosome(
        &mut self,
        keys: Vec<f64>,
        population_index: usize,
        position: usize,
        fitness: Option<f64>,
    ) -> Result<()> {
        self.ensure_initialized()?;
        self.check_population_index(population_index)?;
        if position >= self.params.population_size {
            return Err(BrkgaError::PositionOutOfRange {
                position,
                limit: self.params.population_size,
            });
        }
        if keys.len() != self.chromosome_size {
            return Err(BrkgaError::ChromosomeLengthMismatch {
                expected: self.chromosome_size,
                actual: keys.len(),
            });
        }

        let mut keys = keys;
        let fitness = match fitness {
            Some(f) => f,
            None => decode_writeback(&self.decoder, &mut keys),
        };
        let individual = Individual { keys, fitness };
        if self.sense.improves(fitness, self.best.fitness) {
            self.best = individual.clone();
        }
        let pop = &mut self.current[population_index];
        pop.individuals[position] = individual;
        pop.sort(self.sense);
        Ok(())
    }

    /// A copy of the best chromosome found so far across all
    /// sub-populations and all generations.
    pub fn best_chromosome(&self) -> Result<Vec<f64>> {
        self.ensure_initialized()?;
        Ok(self.best.keys.clone())
    }

    /// The fitness of the best individual found so far.
    pub fn best_fitness(&self) -> Result<f64> {
        self.ensure_initialized()?;
        Ok(self.best.fitness)
    }

    /// A copy of the chromosome at `position` of sub-population
    /// `population_index` (0 = best).
    pub fn get_chromosome(&self, population_index: usize, position: usize) -> Result<Vec<f64>> {
        self.ensure_initialized()?;
        self.check_population_index(population_index)?;
        if position >= self.params.population_size {
            return Err(BrkgaError::PositionOutOfRange {
                position,
                limit: self.params.population_size,
            });
        }
        Ok(self.current[population_index].chromosome(position).to_vec())
    }

    /// Read access to a current sub-population.
    pub fn current_population(&self, population_index: usize) -> Result<&Population> {
        self.ensure_initialized()?;
        self.check_population_index(population_index)?;
        Ok(&self.current[population_index])
    }

    /// The parameters the engine was built with (bias_type reflects a
    /// registered custom function).
    pub fn params(&self) -> &BrkgaParams {
        &self.params
    }

    /// Number of alleles per chromosome.
    pub fn chromosome_size(&self) -> usize {
        self.chromosome_size
    }

    /// Whether [`initialize`](Self::initialize) has run.
    pub fn initialized(&self) -> bool {
        self.initialized
    }

    pub(crate) fn ensure_initialized(&self) -> Result<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(BrkgaError::NotInitialized)
        }
    }

    pub(crate) fn check_population_index(&self, index: usize) -> Result<()> {
        let limit = self.params.num_independent_populations;
        if index >= limit {
            Err(BrkgaError::PopulationIndexOutOfRange { index, limit })
        } else {
            Ok(())
        }
    }

    fn target_range(&self, population_index: Option<usize>) -> Result<Range<usize>> {
        match population_index {
            None => Ok(0..self.params.num_independent_populations),
            Some(idx) => {
                self.check_population_index(idx)?;
                Ok(idx..idx + 1)
            }
        }
    }

    fn update_best(&mut self) {
        for pop in &self.current {
            if self.sense.improves(pop.best().fitness, self.best.fitness) {
                self.best = pop.best().clone();
            }
        }
    }
}
