//! Decode gateway.
//!
//! All chromosome evaluation funnels through these two helpers so the
//! writeback discipline lives in one place: batches always pass
//! `writeback = false` and run in parallel; the single `writeback = true`
//! call is reserved for a final best chromosome.

use crate::population::Individual;
use crate::types::Decoder;
use rayon::prelude::*;

/// Decodes every individual in the slice in parallel with
/// `writeback = false`. Fitness is written back by slot, so results are
/// tied to their originating chromosome regardless of completion order.
pub(crate) fn decode_batch<D: Decoder>(decoder: &D, individuals: &mut [Individual]) {
    individuals.par_iter_mut().for_each(|ind| {
        ind.fitness = decoder.decode(&mut ind.keys, false);
    });
}

/// The one `writeback = true` call per evolution/relink result: lets the
/// decoder rewrite `keys` to persist local-search side effects and
/// returns the (consistent) fitness.
pub(crate) fn decode_writeback<D: Decoder>(decoder: &D, keys: &mut Vec<f64>) -> f64 {
    decoder.decode(keys, true)
}
