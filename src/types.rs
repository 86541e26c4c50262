//! Core enumerations and the decoder trait.
//!
//! [`Decoder`] is the contract between the generic engine and the
//! problem-specific code: the engine never inspects solution semantics,
//! only random-key chromosomes and the scalar fitness the decoder returns.

/// Optimization sense: whether lower or higher fitness wins.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    /// Lower fitness is better.
    Minimize,
    /// Higher fitness is better.
    Maximize,
}

impl Sense {
    /// Returns `true` if fitness `a` is strictly better than `b` under
    /// this sense.
    #[inline]
    pub fn improves(self, a: f64, b: f64) -> bool {
        match self {
            Sense::Minimize => a < b,
            Sense::Maximize => a > b,
        }
    }

    /// The worst representable fitness under this sense, used as the
    /// sentinel for not-yet-decoded individuals.
    #[inline]
    pub fn worst(self) -> f64 {
        match self {
            Sense::Minimize => f64::INFINITY,
            Sense::Maximize => f64::NEG_INFINITY,
        }
    }
}

/// Rank-to-weight bias used when choosing which parent donates each allele
/// during multi-parent crossover.
///
/// For a parent of rank `r` (1 = best among the chosen parents), the
/// weight is:
///
/// - `Constant`: `1 / total_parents` (all parents equally likely)
/// - `Linear`: `1 / r`
/// - `Quadratic`: `r⁻²`
/// - `Cubic`: `r⁻³`
/// - `Exponential`: `e⁻ʳ`
/// - `LogInverse`: `1 / ln(r + 1)`
///
/// `Custom` is selected implicitly by registering a closure via
/// [`set_bias_custom_function`](crate::Brkga::set_bias_custom_function);
/// the closure must be non-negative and non-increasing in rank.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiasFunction {
    /// All parents have the same probability.
    Constant,
    /// Weight `1 / r`.
    Linear,
    /// Weight `r⁻²`.
    Quadratic,
    /// Weight `r⁻³`.
    Cubic,
    /// Weight `e⁻ʳ`.
    Exponential,
    /// Weight `1 / ln(r + 1)`. The classic BRKGA default.
    LogInverse,
    /// A user-supplied closure registered on the engine.
    Custom,
}

/// Kind of perturbation applied to elite individuals by
/// [`shake`](crate::Brkga::shake).
///
/// Each intensity step applies both moves of the chosen type.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShakingType {
    /// Inverts one random allele (`v → 1 − v`) and assigns a fresh
    /// uniform value to another random allele.
    Change,
    /// Swaps one random allele with its right neighbor and swaps two
    /// random allele positions.
    Swap,
}

/// Decoder trait: maps a random-key chromosome to a fitness value.
///
/// This is the only trait a user must implement. The problem instance is
/// whatever data the implementing type carries; the engine passes it
/// through unexamined.
///
/// # Writeback contract
///
/// The engine calls `decode` with `writeback = false` for every batched
/// evaluation (initialization, evolution, path-relinking intermediates).
/// **When `writeback` is false the implementation must not mutate
/// `chromosome`** — the engine relies on this to keep relinking paths
/// intact, and a violation produces undefined results that the engine
/// cannot detect. Exactly one call with `writeback = true` is made on a
/// final best chromosome so the decoder may persist local-search
/// adjustments consistently with the fitness it reports.
///
/// # Thread safety
///
/// Batched decode calls run in parallel via rayon, one call per
/// chromosome, with no engine-side serialization. `Send + Sync` makes
/// that obligation a type-level contract; any mutable scratch shared
/// inside the implementation must be partitioned by the implementor
/// (e.g. per-worker buffers).
///
/// # Examples
///
/// ```
/// use brkga_mp_ipr::Decoder;
///
/// struct SubsetSum {
///     weights: Vec<f64>,
///     target: f64,
/// }
///
/// impl Decoder for SubsetSum {
///     fn decode(&self, chromosome: &mut [f64], _writeback: bool) -> f64 {
///         // keys > 0.5 select an item; minimize |sum - target|
///         let sum: f64 = chromosome
///             .iter()
///             .zip(&self.weights)
///             .filter(|(k, _)| **k > 0.5)
///             .map(|(_, w)| *w)
///             .sum();
///         (sum - self.target).abs()
///     }
/// }
/// ```
pub trait Decoder: Send + Sync {
    /// Decodes a chromosome (alleles in `[0, 1]`) and returns its
    /// fitness, interpreted per the engine's [`Sense`].
    fn decode(&self, chromosome: &mut [f64], writeback: bool) -> f64;
}
