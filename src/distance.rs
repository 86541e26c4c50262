//! Built-in chromosome distance functions for path relinking.
//!
//! [`hamming_distance`] suits threshold/direct key interpretations;
//! [`kendall_tau_distance`] suits permutation interpretations. The
//! `affect_solution_*` helpers are the matching block predicates for
//! direct relinking.
//!
//! All functions require both inputs to have the same length; a mismatch
//! is a caller defect and panics.

/// Hamming distance over a binarized view of two key vectors: values
/// `>= threshold` map to 1, everything else to 0.
///
/// # Panics
///
/// Panics if the vectors differ in length.
///
/// # Examples
///
/// ```
/// use brkga_mp_ipr::distance::hamming_distance;
///
/// assert_eq!(hamming_distance(&[0.2, 0.8], &[0.8, 0.8], 0.5), 1.0);
/// ```
pub fn hamming_distance(a: &[f64], b: &[f64], threshold: f64) -> f64 {
    assert_eq!(a.len(), b.len(), "vectors must have the same length");
    a.iter()
        .zip(b.iter())
        .filter(|(x, y)| (**x >= threshold) != (**y >= threshold))
        .count() as f64
}

/// Returns `true` if replacing the keys of `block1` by those of `block2`
/// changes the binarized view, i.e. Hamming distance over the blocks is
/// non-zero.
pub fn affect_solution_hamming_distance(block1: &[f64], block2: &[f64], threshold: f64) -> bool {
    assert_eq!(block1.len(), block2.len(), "blocks must have the same length");
    block1
        .iter()
        .zip(block2.iter())
        .any(|(x, y)| (*x >= threshold) != (*y >= threshold))
}

/// Kendall tau distance between the permutations induced by sorting the
/// two key vectors: the number of index pairs ordered differently by the
/// two induced rankings.
///
/// # Panics
///
/// Panics if the vectors differ in length.
///
/// # Examples
///
/// ```
/// use brkga_mp_ipr::distance::kendall_tau_distance;
///
/// assert_eq!(kendall_tau_distance(&[0.1, 0.9], &[0.9, 0.1]), 1.0);
/// assert_eq!(kendall_tau_distance(&[0.1, 0.9], &[0.2, 0.8]), 0.0);
/// ```
pub fn kendall_tau_distance(a: &[f64], b: &[f64]) -> f64 {
    discordant_pairs(a, b, false) as f64
}

/// Returns `true` if the orderings induced by `block1` and `block2`
/// disagree on any pair; short-circuits on the first discordance.
pub fn affect_solution_kendall_tau(block1: &[f64], block2: &[f64]) -> bool {
    discordant_pairs(block1, block2, true) > 0
}

fn discordant_pairs(a: &[f64], b: &[f64], stop_immediately: bool) -> usize {
    assert_eq!(a.len(), b.len(), "vectors must have the same length");
    let rank_a = rank_of(a);
    let rank_b = rank_of(b);
    let mut discordant = 0;
    for i in 0..a.len() {
        for j in i + 1..a.len() {
            let order_a = rank_a[i] < rank_a[j];
            let order_b = rank_b[i] < rank_b[j];
            if order_a != order_b {
                discordant += 1;
                if stop_immediately {
                    return discordant;
                }
            }
        }
    }
    discordant
}

/// Rank of each index in the ordering induced by sorting the keys.
fn rank_of(keys: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..keys.len()).collect();
    order.sort_by(|&i, &j| {
        keys[i]
            .partial_cmp(&keys[j])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let mut ranks = vec![0; keys.len()];
    for (rank, &idx) in order.iter().enumerate() {
        ranks[idx] = rank;
    }
    ranks
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_hamming_basic() {
        assert_eq!(hamming_distance(&[0.2, 0.8], &[0.8, 0.8], 0.5), 1.0);
        assert_eq!(hamming_distance(&[0.2, 0.2], &[0.8, 0.8], 0.5), 2.0);
        assert_eq!(hamming_distance(&[0.6, 0.7], &[0.8, 0.9], 0.5), 0.0);
    }

    #[test]
    fn test_hamming_threshold() {
        // 0.7 threshold: only values >= 0.7 count as 1
        assert_eq!(hamming_distance(&[0.69, 0.7], &[0.7, 0.7], 0.7), 1.0);
    }

    #[test]
    #[should_panic(expected = "same length")]
    fn test_hamming_length_mismatch() {
        hamming_distance(&[0.1], &[0.1, 0.2], 0.5);
    }

    #[test]
    fn test_kendall_tau_basic() {
        assert_eq!(kendall_tau_distance(&[0.1, 0.9], &[0.9, 0.1]), 1.0);
        // same induced order, different values
        assert_eq!(kendall_tau_distance(&[0.1, 0.5, 0.9], &[0.2, 0.3, 0.4]), 0.0);
        // fully reversed order of three elements: 3 discordant pairs
        assert_eq!(kendall_tau_distance(&[0.1, 0.5, 0.9], &[0.9, 0.5, 0.1]), 3.0);
    }

    #[test]
    #[should_panic(expected = "same length")]
    fn test_kendall_tau_length_mismatch() {
        kendall_tau_distance(&[0.1], &[0.1, 0.2]);
    }

    #[test]
    fn test_affect_solution_helpers() {
        assert!(!affect_solution_hamming_distance(
            &[0.3, 0.4, 0.1],
            &[0.4, 0.1, 0.2],
            0.5
        ));
        assert!(affect_solution_hamming_distance(
            &[0.3, 0.6],
            &[0.4, 0.4],
            0.5
        ));
        assert!(!affect_solution_kendall_tau(&[0.1, 0.9], &[0.2, 0.8]));
        assert!(affect_solution_kendall_tau(&[0.1, 0.9], &[0.9, 0.1]));
    }

    proptest! {
        #[test]
        fn prop_kendall_tau_identity(v in prop::collection::vec(0.0f64..1.0, 1..20)) {
            prop_assert_eq!(kendall_tau_distance(&v, &v), 0.0);
        }

        #[test]
        fn prop_kendall_tau_symmetric(
            a in prop::collection::vec(0.0f64..1.0, 8),
            b in prop::collection::vec(0.0f64..1.0, 8),
        ) {
            prop_assert_eq!(kendall_tau_distance(&a, &b), kendall_tau_distance(&b, &a));
        }

        #[test]
        fn prop_kendall_tau_triangle(
            a in prop::collection::vec(0.0f64..1.0, 6),
            b in prop::collection::vec(0.0f64..1.0, 6),
            c in prop::collection::vec(0.0f64..1.0, 6),
        ) {
            let ab = kendall_tau_distance(&a, &b);
            let bc = kendall_tau_distance(&b, &c);
            let ac = kendall_tau_distance(&a, &c);
            prop_assert!(ac <= ab + bc);
        }

        #[test]
        fn prop_hamming_symmetric(
            a in prop::collection::vec(0.0f64..1.0, 8),
            b in prop::collection::vec(0.0f64..1.0, 8),
        ) {
            prop_assert_eq!(
                hamming_distance(&a, &b, 0.5),
                hamming_distance(&b, &a, 0.5)
            );
        }
    }
}
