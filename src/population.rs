//! Population storage.
//!
//! A [`Population`] holds exactly `population_size` individuals and is
//! kept fitness-sorted (index 0 best for the configured sense) after
//! every operation that touches it.

use crate::types::Sense;

/// A chromosome paired with its fitness.
#[derive(Debug, Clone)]
pub struct Individual {
    /// Random keys in `[0, 1]`.
    pub keys: Vec<f64>,
    /// Decoded fitness; the sense's worst value until decoded.
    pub fitness: f64,
}

/// One sub-population, ordered best-first.
#[derive(Debug, Clone)]
pub struct Population {
    pub(crate) individuals: Vec<Individual>,
}

impl Population {
    pub(crate) fn new(individuals: Vec<Individual>) -> Self {
        Self { individuals }
    }

    /// Number of individuals.
    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    /// Always `false` for a built engine; present for API completeness.
    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    /// The individuals, best-first.
    pub fn individuals(&self) -> &[Individual] {
        &self.individuals
    }

    /// The chromosome at `position` (0 = best).
    pub fn chromosome(&self, position: usize) -> &[f64] {
        &self.individuals[position].keys
    }

    /// The fitness at `position` (0 = best).
    pub fn fitness(&self, position: usize) -> f64 {
        self.individuals[position].fitness
    }

    /// Restores the best-first ordering for `sense`.
    ///
    /// Stable, so equal-fitness individuals keep their relative order;
    /// callers must not rely on any particular tie order.
    pub(crate) fn sort(&mut self, sense: Sense) {
        match sense {
            Sense::Minimize => self.individuals.sort_by(|a, b| {
                a.fitness
                    .partial_cmp(&b.fitness)
                    .unwrap_or(std::cmp::Ordering::Equal)
            }),
            Sense::Maximize => self.individuals.sort_by(|a, b| {
                b.fitness
                    .partial_cmp(&a.fitness)
                    .unwrap_or(std::cmp::Ordering::Equal)
            }),
        }
    }

    pub(crate) fn best(&self) -> &Individual {
        &self.individuals[0]
    }

    pub(crate) fn worst_mut(&mut self) -> &mut Individual {
        self.individuals
            .last_mut()
            .expect("population is never empty")
    }
}
