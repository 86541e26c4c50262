//! Implicit path relinking (IPR).
//!
//! Given a base and a guide chromosome drawn from elite sets, the engine
//! walks a path of intermediate candidates between them and keeps the
//! best one found. The direct variant copies contiguous key blocks from
//! the guide; the permutation variant remaps the base's induced ordering
//! toward the guide's, one position per step. Every wave of candidates is
//! decoded in one parallel batch with `writeback = false`; only the final
//! best candidate gets the single `writeback = true` call.

use crate::decoder::{decode_batch, decode_writeback};
use crate::engine::Brkga;
use crate::error::{BrkgaError, Result};
use crate::population::Individual;
use crate::types::{Decoder, Sense};
use std::ops::Range;
use std::time::{Duration, Instant};

/// Path relinking variant.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathRelinkingType {
    /// Copies each key block from the guide into the base.
    Direct,
    /// Reorders the base's induced permutation toward the guide's.
    Permutation,
}

/// How base/guide individuals are drawn from the elite sets.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathRelinkingSelection {
    /// The best solution of each population (first attempt), then random
    /// elite pairs.
    BestSolution,
    /// Uniformly random pairs from the elite sets.
    RandomElite,
}

/// Outcome of a [`path_relink`](Brkga::path_relink) call.
///
/// Variants are ordered by severity, so combining the outcomes of
/// repeated invocations is a plain `max` reduction:
///
/// ```
/// use brkga_mp_ipr::PathRelinkingResult::*;
///
/// assert_eq!(TooHomogeneous.max(NoImprovement), NoImprovement);
/// assert_eq!(NoImprovement.max(EliteImprovement), EliteImprovement);
/// assert_eq!(EliteImprovement.max(BestImprovement), BestImprovement);
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PathRelinkingResult {
    /// No pair of elite chromosomes was far enough apart to relink.
    TooHomogeneous,
    /// Relinking ran but found nothing worth inserting.
    NoImprovement,
    /// An improved elite solution was found, but not a new global best.
    EliteImprovement,
    /// The global best solution was improved.
    BestImprovement,
}

/// Positive block range, clipped at the chromosome end.
fn block_range(block: usize, block_size: usize, len: usize) -> Range<usize> {
    let start = block * block_size;
    start..(start + block_size).min(len)
}

/// Gene indices sorted by ascending key value: the permutation the keys
/// induce.
fn induced_order(keys: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..keys.len()).collect();
    order.sort_by(|&i, &j| {
        keys[i]
            .partial_cmp(&keys[j])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    order
}

/// Index of the best individual of a decoded wave.
fn wave_winner(sense: Sense, wave: &[Individual]) -> usize {
    let mut winner = 0;
    for (i, ind) in wave.iter().enumerate().skip(1) {
        if sense.improves(ind.fitness, wave[winner].fitness) {
            winner = i;
        }
    }
    winner
}

fn past(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|d| Instant::now() >= d)
}

impl<D: Decoder> Brkga<D> {
    /// Performs implicit path relinking between elite solutions of
    /// ring-adjacent sub-populations (with one sub-population, base and
    /// guide both come from its elite set).
    ///
    /// For each ring pair, base/guide candidates are drawn per
    /// `pr_selection` and tested against `minimum_distance` with
    /// `compute_distance`, retrying without replacement up to
    /// `number_pairs` times (`0` = try every elite pair). If no ring pair
    /// yields a qualifying pair the call returns
    /// [`TooHomogeneous`](PathRelinkingResult::TooHomogeneous).
    ///
    /// The best candidate found along a path replaces the worst
    /// individual of the base population: unconditionally when it
    /// improves the global best
    /// ([`BestImprovement`](PathRelinkingResult::BestImprovement)), or —
    /// when it only beats that population's worst — if it keeps distance
    /// `>= minimum_distance` from every elite individual there
    /// ([`EliteImprovement`](PathRelinkingResult::EliteImprovement)).
    ///
    /// `affect_solution` is consulted by the direct variant only: a block
    /// swap it reports as ineffective is skipped without decoding. The
    /// permutation variant accepts it for API symmetry and never calls
    /// it. `max_time` is checked between candidate waves (`None` = no
    /// limit); running out of time returns whatever was found so far, not
    /// an error.
    #[allow(clippy::too_many_arguments)]
    pub fn path_relink<Dist, Affect>(
        &mut self,
        pr_type: PathRelinkingType,
        pr_selection: PathRelinkingSelection,
        compute_distance: Dist,
        affect_solution: Affect,
        number_pairs: usize,
        minimum_distance: f64,
        block_size: usize,
        max_time: Option<Duration>,
        percentage: f64,
    ) -> Result<PathRelinkingResult>
    where
        Dist: Fn(&[f64], &[f64]) -> f64,
        Affect: Fn(&[f64], &[f64]) -> bool,
    {
        self.ensure_initialized()?;
        if block_size == 0 || block_size > self.chromosome_size {
            return Err(BrkgaError::InvalidArgument(format!(
                "block_size ({block_size}) must be in [1, {}]",
                self.chromosome_size
            )));
        }
        if !(percentage > 0.0 && percentage <= 1.0) {
            return Err(BrkgaError::InvalidArgument(format!(
                "percentage ({percentage}) must be in (0, 1]"
            )));
        }

        let deadline = max_time.map(|d| Instant::now() + d);
        let num_pops = self.params.num_independent_populations;
        let mut final_result = PathRelinkingResult::TooHomogeneous;

        for pop_base in 0..num_pops {
            let pop_guide = (pop_base + 1) % num_pops;

            let Some((base_idx, guide_idx)) = self.select_pair(
                pop_base,
                pop_guide,
                pr_selection,
                &compute_distance,
                number_pairs,
                minimum_distance,
            ) else {
                continue;
            };

            let base = self.current[pop_base].chromosome(base_idx).to_vec();
            let guide = self.current[pop_guide].chromosome(guide_idx).to_vec();

            let found = match pr_type {
                PathRelinkingType::Direct => self.direct_path_relink(
                    &base,
                    &guide,
                    &affect_solution,
                    block_size,
                    deadline,
                    percentage,
                ),
                PathRelinkingType::Permutation => {
                    self.permutation_based_path_relink(&base, &guide, deadline, percentage)
                }
            };

            let Some(mut candidate) = found else {
                final_result = final_result.max(PathRelinkingResult::NoImprovement);
                continue;
            };

            // The single writeback call for this relink.
            candidate.fitness = decode_writeback(&self.decoder, &mut candidate.keys);

            let outcome = if self.sense.improves(candidate.fitness, self.best.fitness) {
                self.best = candidate.clone();
                let pop = &mut self.current[pop_base];
                *pop.worst_mut() = candidate;
                pop.sort(self.sense);
                PathRelinkingResult::BestImprovement
            } else {
                let pop = &self.current[pop_base];
                let beats_worst = self
                    .sense
                    .improves(candidate.fitness, pop.fitness(pop.len() - 1));
                let diverse = (0..self.elite_size).all(|e| {
                    compute_distance(&candidate.keys, pop.chromosome(e)) >= minimum_distance
                });
                if beats_worst && diverse {
                    let pop = &mut self.current[pop_base];
                    *pop.worst_mut() = candidate;
                    pop.sort(self.sense);
                    PathRelinkingResult::EliteImprovement
                } else {
                    PathRelinkingResult::NoImprovement
                }
            };
            final_result = final_result.max(outcome);

            if past(deadline) {
                break;
            }
        }
        Ok(final_result)
    }

    /// Draws a qualifying (base, guide) elite pair for one ring pair,
    /// sampling without replacement.
    fn select_pair<Dist>(
        &mut self,
        pop_base: usize,
        pop_guide: usize,
        selection: PathRelinkingSelection,
        compute_distance: &Dist,
        number_pairs: usize,
        minimum_distance: f64,
    ) -> Option<(usize, usize)>
    where
        Dist: Fn(&[f64], &[f64]) -> f64,
    {
        use rand::Rng;

        let elite = self.elite_size;
        let mut pairs: Vec<(usize, usize)> = Vec::with_capacity(elite * elite);
        for i in 0..elite {
            for j in 0..elite {
                if pop_base == pop_guide && i == j {
                    continue;
                }
                pairs.push((i, j));
            }
        }

        let mut attempts = if number_pairs == 0 {
            pairs.len()
        } else {
            number_pairs.min(pairs.len())
        };
        let mut first = true;
        while attempts > 0 && !pairs.is_empty() {
            let pick = if selection == PathRelinkingSelection::BestSolution && first {
                0 // pairs are built best-first, so this is (best, best)
            } else {
                self.rng.random_range(0..pairs.len())
            };
            first = false;
            let (i, j) = pairs.swap_remove(pick);
            let a = self.current[pop_base].chromosome(i);
            let b = self.current[pop_guide].chromosome(j);
            if compute_distance(a, b) >= minimum_distance {
                return Some((i, j));
            }
            attempts -= 1;
        }
        None
    }

    /// Direct relinking: one `block_size` substitution from the guide per
    /// step, all surviving candidates of a wave decoded in one parallel
    /// batch. Returns the best intermediate found, if any.
    ///
    /// Scratch memory is one candidate chromosome per remaining block,
    /// i.e. O(chromosome_size² / block_size) keys at the first wave.
    fn direct_path_relink<Affect>(
        &self,
        base: &[f64],
        guide: &[f64],
        affect_solution: &Affect,
        block_size: usize,
        deadline: Option<Instant>,
        percentage: f64,
    ) -> Option<Individual>
    where
        Affect: Fn(&[f64], &[f64]) -> bool,
    {
        let n = self.chromosome_size;
        let num_blocks = n.div_ceil(block_size);
        let path_size = ((percentage * num_blocks as f64).ceil() as usize).min(num_blocks);

        let mut working = base.to_vec();
        let mut remaining: Vec<usize> = (0..num_blocks).collect();
        let mut wave: Vec<Individual> = Vec::with_capacity(num_blocks);
        let mut wave_blocks: Vec<usize> = Vec::with_capacity(num_blocks);
        let mut best: Option<Individual> = None;

        let mut steps = 0;
        while steps < path_size && !remaining.is_empty() && !past(deadline) {
            wave.clear();
            wave_blocks.clear();

            let mut kept = Vec::with_capacity(remaining.len());
            for &block in &remaining {
                let range = block_range(block, block_size, n);
                if !affect_solution(&working[range.clone()], &guide[range.clone()]) {
                    // swapping this block can never change the solution
                    continue;
                }
                kept.push(block);
                let mut keys = working.clone();
                keys[range.clone()].copy_from_slice(&guide[range]);
                wave.push(Individual {
                    keys,
                    fitness: self.sense.worst(),
                });
                wave_blocks.push(block);
            }
            remaining = kept;
            if wave.is_empty() {
                break;
            }

            decode_batch(&self.decoder, &mut wave);

            let w = wave_winner(self.sense, &wave);
            let winner = &wave[w];
            working.copy_from_slice(&winner.keys);
            let committed = wave_blocks[w];
            remaining.retain(|&b| b != committed);

            let improved = match &best {
                None => true,
                Some(b) => self.sense.improves(winner.fitness, b.fitness),
            };
            if improved {
                best = Some(winner.clone());
            }
            steps += 1;
        }
        best
    }

    /// Permutation-based relinking: reinterprets both chromosomes as the
    /// permutations induced by sorting their keys and moves the base
    /// ordering toward the guide ordering, one rank position per step.
    /// Block size and the affect predicate play no role here.
    fn permutation_based_path_relink(
        &self,
        base: &[f64],
        guide: &[f64],
        deadline: Option<Instant>,
        percentage: f64,
    ) -> Option<Individual> {
        let n = self.chromosome_size;
        let mut working = base.to_vec();
        let mut base_order = induced_order(&working);
        let guide_order = induced_order(guide);
        let mut rank_of_gene = vec![0usize; n];
        for (rank, &gene) in base_order.iter().enumerate() {
            rank_of_gene[gene] = rank;
        }

        let mut remaining: Vec<usize> = (0..n).collect();
        let path_size = ((percentage * n as f64).ceil() as usize).min(n);
        let mut wave: Vec<Individual> = Vec::with_capacity(n);
        let mut wave_ranks: Vec<usize> = Vec::with_capacity(n);
        let mut best: Option<Individual> = None;

        let mut steps = 0;
        while steps < path_size && !past(deadline) {
            // positions already agreeing with the guide need no work
            remaining.retain(|&r| base_order[r] != guide_order[r]);
            if remaining.is_empty() {
                break;
            }

            wave.clear();
            wave_ranks.clear();
            for &rank in &remaining {
                let mut keys = working.clone();
                keys.swap(base_order[rank], guide_order[rank]);
                wave.push(Individual {
                    keys,
                    fitness: self.sense.worst(),
                });
                wave_ranks.push(rank);
            }

            decode_batch(&self.decoder, &mut wave);

            let w = wave_winner(self.sense, &wave);
            let winner_rank = wave_ranks[w];
            let gene_base = base_order[winner_rank];
            let gene_guide = guide_order[winner_rank];

            // commit the winning transposition and fix the bookkeeping
            working.swap(gene_base, gene_guide);
            let other_rank = rank_of_gene[gene_guide];
            base_order[winner_rank] = gene_guide;
            base_order[other_rank] = gene_base;
            rank_of_gene[gene_guide] = winner_rank;
            rank_of_gene[gene_base] = other_rank;
            remaining.retain(|&r| r != winner_rank);

            let winner = &wave[w];
            let improved = match &best {
                None => true,
                Some(b) => self.sense.improves(winner.fitness, b.fitness),
            };
            if improved {
                best = Some(winner.clone());
            }
            steps += 1;
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BrkgaParams;
    use crate::distance::{hamming_distance, kendall_tau_distance};

    /// Minimizes the gap to an alternating 0/1 target pattern.
    struct AlternatingTarget;

    impl AlternatingTarget {
        fn target(&self, i: usize) -> f64 {
            if i % 2 == 0 {
                1.0
            } else {
                0.0
            }
        }
    }

    impl Decoder for AlternatingTarget {
        fn decode(&self, chromosome: &mut [f64], _writeback: bool) -> f64 {
            chromosome
                .iter()
                .enumerate()
                .map(|(i, k)| (k - self.target(i)).abs())
                .sum()
        }
    }

    /// Counts inversions of the induced permutation (0 = sorted order).
    struct InversionCount;

    impl Decoder for InversionCount {
        fn decode(&self, chromosome: &mut [f64], _writeback: bool) -> f64 {
            let asc: Vec<f64> = (0..chromosome.len()).map(|i| i as f64).collect();
            kendall_tau_distance(chromosome, &asc)
        }
    }

    fn params() -> BrkgaParams {
        BrkgaParams::default()
            .with_population_size(20)
            .with_elite_percentage(0.25)
            .with_mutants_percentage(0.15)
            .with_num_elite_parents(2)
            .with_total_parents(3)
    }

    #[test]
    fn test_result_severity_order() {
        use PathRelinkingResult::*;
        assert!(TooHomogeneous < NoImprovement);
        assert!(NoImprovement < EliteImprovement);
        assert!(EliteImprovement < BestImprovement);
        assert_eq!(TooHomogeneous.max(NoImprovement), NoImprovement);
        assert_eq!(NoImprovement.max(EliteImprovement), EliteImprovement);
        assert_eq!(EliteImprovement.max(BestImprovement), BestImprovement);
        assert_eq!(BestImprovement.max(TooHomogeneous), BestImprovement);
    }

    #[test]
    fn test_validation() {
        let mut brkga = crate::Brkga::build(
            AlternatingTarget,
            Sense::Minimize,
            1,
            10,
            params(),
            true,
        )
        .unwrap();
        assert_eq!(
            brkga.path_relink(
                PathRelinkingType::Direct,
                PathRelinkingSelection::BestSolution,
                |a, b| hamming_distance(a, b, 0.5),
                |_, _| true,
                0,
                0.0,
                1,
                None,
                1.0,
            ),
            Err(BrkgaError::NotInitialized)
        );
        brkga.initialize().unwrap();
        assert!(matches!(
            brkga.path_relink(
                PathRelinkingType::Direct,
                PathRelinkingSelection::BestSolution,
                |a, b| hamming_distance(a, b, 0.5),
                |_, _| true,
                0,
                0.0,
                0, // bad block size
                None,
                1.0,
            ),
            Err(BrkgaError::InvalidArgument(_))
        ));
        assert!(matches!(
            brkga.path_relink(
                PathRelinkingType::Direct,
                PathRelinkingSelection::BestSolution,
                |a, b| hamming_distance(a, b, 0.5),
                |_, _| true,
                0,
                0.0,
                1,
                None,
                0.0, // bad percentage
            ),
            Err(BrkgaError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_too_homogeneous() {
        let mut brkga = crate::Brkga::build(
            AlternatingTarget,
            Sense::Minimize,
            3,
            10,
            params(),
            true,
        )
        .unwrap();
        brkga.initialize().unwrap();
        // No pair can be 1e9 apart.
        let result = brkga
            .path_relink(
                PathRelinkingType::Direct,
                PathRelinkingSelection::RandomElite,
                |a, b| hamming_distance(a, b, 0.5),
                |_, _| true,
                0,
                1e9,
                1,
                None,
                1.0,
            )
            .unwrap();
        assert_eq!(result, PathRelinkingResult::TooHomogeneous);
    }

    #[test]
    fn test_qualifying_pair_always_relinks() {
        let mut brkga = crate::Brkga::build(
            AlternatingTarget,
            Sense::Minimize,
            5,
            10,
            params(),
            true,
        )
        .unwrap();
        brkga.initialize().unwrap();
        // minimum_distance 0 qualifies every pair, so the outcome is
        // anything but TooHomogeneous.
        let result = brkga
            .path_relink(
                PathRelinkingType::Direct,
                PathRelinkingSelection::RandomElite,
                |a, b| hamming_distance(a, b, 0.5),
                |_, _| true,
                0,
                0.0,
                1,
                None,
                1.0,
            )
            .unwrap();
        assert!(result > PathRelinkingResult::TooHomogeneous);
    }

    #[test]
    fn test_direct_relink_finds_best_mixture() {
        // Base all-zeros and guide all-ones both miss the alternating
        // target by 5; the path between them passes through the exact
        // optimum, which must improve the (injected, slightly positive)
        // global best.
        let mut brkga = crate::Brkga::build(
            AlternatingTarget,
            Sense::Minimize,
            7,
            10,
            params(),
            true,
        )
        .unwrap();
        brkga.initialize().unwrap();
        brkga
            .inject_chromosome(vec![0.0; 10], 0, 19, Some(1e-3))
            .unwrap();
        brkga
            .inject_chromosome(vec![1.0; 10], 0, 19, Some(2e-3))
            .unwrap();

        let result = brkga
            .path_relink(
                PathRelinkingType::Direct,
                PathRelinkingSelection::BestSolution,
                |a, b| hamming_distance(a, b, 0.5),
                |_, _| true,
                0,
                5.0,
                1,
                None,
                1.0,
            )
            .unwrap();
        assert_eq!(result, PathRelinkingResult::BestImprovement);
        assert_eq!(brkga.best_fitness().unwrap(), 0.0);
        let best = brkga.best_chromosome().unwrap();
        for (i, k) in best.iter().enumerate() {
            assert_eq!(*k, if i % 2 == 0 { 1.0 } else { 0.0 });
        }
        // population size is unchanged by the insertion
        assert_eq!(brkga.current_population(0).unwrap().len(), 20);
    }

    #[test]
    fn test_direct_inner_walks_to_guide() {
        struct ToOnes;
        impl Decoder for ToOnes {
            fn decode(&self, chromosome: &mut [f64], _writeback: bool) -> f64 {
                chromosome.iter().map(|k| (k - 1.0).powi(2)).sum()
            }
        }
        let mut brkga =
            crate::Brkga::build(ToOnes, Sense::Minimize, 7, 6, params(), true).unwrap();
        brkga.initialize().unwrap();

        let base = vec![0.0; 6];
        let guide = vec![1.0; 6];
        let best = brkga
            .direct_path_relink(&base, &guide, &|_: &[f64], _: &[f64]| true, 1, None, 1.0)
            .unwrap();
        assert_eq!(best.fitness, 0.0);
        assert_eq!(best.keys, guide);
    }

    #[test]
    fn test_direct_inner_respects_affect_predicate() {
        struct ToOnes;
        impl Decoder for ToOnes {
            fn decode(&self, chromosome: &mut [f64], _writeback: bool) -> f64 {
                chromosome.iter().map(|k| (k - 1.0).powi(2)).sum()
            }
        }
        let mut brkga =
            crate::Brkga::build(ToOnes, Sense::Minimize, 7, 6, params(), true).unwrap();
        brkga.initialize().unwrap();

        let base = vec![0.0; 6];
        let guide = vec![1.0; 6];
        // Every block reported ineffective: nothing is ever decoded.
        let best = brkga.direct_path_relink(
            &base,
            &guide,
            &|_: &[f64], _: &[f64]| false,
            2,
            None,
            1.0,
        );
        assert!(best.is_none());
    }

    #[test]
    fn test_permutation_inner_reorders_toward_guide() {
        let mut brkga =
            crate::Brkga::build(InversionCount, Sense::Minimize, 7, 5, params(), true)
                .unwrap();
        brkga.initialize().unwrap();

        // Fully reversed order: 10 inversions.
        let base = vec![0.9, 0.7, 0.5, 0.3, 0.1];
        let guide = vec![0.1, 0.3, 0.5, 0.7, 0.9];
        let initial = 10.0;
        let best = brkga
            .permutation_based_path_relink(&base, &guide, None, 1.0)
            .unwrap();
        assert!(
            best.fitness < initial,
            "expected fewer inversions than {initial}, got {}",
            best.fitness
        );
        // the path never leaves the multiset of base keys
        let mut sorted = best.keys.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(sorted, guide);
    }

    #[test]
    fn test_permutation_relink_full_call() {
        let mut brkga =
            crate::Brkga::build(InversionCount, Sense::Minimize, 11, 8, params(), true)
                .unwrap();
        brkga.initialize().unwrap();
        let before = brkga.best_fitness().unwrap();
        let result = brkga
            .path_relink(
                PathRelinkingType::Permutation,
                PathRelinkingSelection::RandomElite,
                kendall_tau_distance,
                |_, _| true,
                0,
                1.0,
                1,
                None,
                1.0,
            )
            .unwrap();
        assert!(result >= PathRelinkingResult::TooHomogeneous);
        // the global best never regresses
        assert!(brkga.best_fitness().unwrap() <= before);
    }

    #[test]
    fn test_relink_respects_time_budget() {
        let mut brkga = crate::Brkga::build(
            AlternatingTarget,
            Sense::Minimize,
            13,
            10,
            params(),
            true,
        )
        .unwrap();
        brkga.initialize().unwrap();
        // An already-expired budget still returns a result, not an error.
        let result = brkga.path_relink(
            PathRelinkingType::Direct,
            PathRelinkingSelection::RandomElite,
            |a, b| hamming_distance(a, b, 0.5),
            |_, _| true,
            0,
            0.0,
            1,
            Some(Duration::ZERO),
            1.0,
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_block_range() {
        assert_eq!(block_range(0, 3, 10), 0..3);
        assert_eq!(block_range(2, 3, 10), 6..9);
        assert_eq!(block_range(3, 3, 10), 9..10); // clipped tail
    }
}
