//! Error types for the BRKGA-MP-IPR engine.
//!
//! Errors fall into two families: configuration/argument errors (bad
//! parameter combinations, out-of-range indices, mismatched chromosome
//! lengths) and sequencing errors (calling an operation before
//! [`initialize`](crate::Brkga::initialize), or trying to change warm
//! starts or the bias function afterwards). Nothing is silently corrected
//! or retried; callers decide whether to adjust and call again.

use thiserror::Error;

/// Error type for all fallible BRKGA operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BrkgaError {
    /// A parameter or combination of parameters failed validation at
    /// build time.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A per-call argument was invalid (e.g. `num_generations < 1`).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A chromosome had the wrong number of alleles.
    #[error("chromosome length mismatch: expected {expected}, got {actual}")]
    ChromosomeLengthMismatch {
        /// The configured chromosome size.
        expected: usize,
        /// The length of the offending chromosome.
        actual: usize,
    },

    /// A population index was outside `0..num_independent_populations`.
    #[error("population index {index} out of range (have {limit} populations)")]
    PopulationIndexOutOfRange {
        /// The offending index.
        index: usize,
        /// Number of independent populations.
        limit: usize,
    },

    /// A position was outside `0..population_size`.
    #[error("position {position} out of range (population size is {limit})")]
    PositionOutOfRange {
        /// The offending position.
        position: usize,
        /// The population size.
        limit: usize,
    },

    /// An operation that requires `initialize()` was called first.
    #[error("engine not initialized: call initialize() before this operation")]
    NotInitialized,

    /// An operation that is only allowed before `initialize()` was called
    /// after it (warm starts, custom bias function).
    #[error("engine already initialized: {0} must be called before initialize()")]
    AlreadyInitialized(&'static str),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BrkgaError>;
