//! Typed errors for the construction-time validation layer.
//!
//! These are distinct from the `debug_assert!` contract checks inside the hot
//! per-coordinate loop (see [`crate::kernel`]): a host wiring up buffers for
//! the first time is exactly where shape mistakes happen, and failing fast
//! with a message beats a panic three layers down in release-mode silence.

use thiserror::Error;

/// Errors raised while assembling a [`crate::descriptor::Descriptor`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorError {
    /// A buffer's length didn't match what `b`, `n`, `m`, or `k` implies.
    #[error("buffer '{name}' has length {actual}, expected {expected}")]
    LengthMismatch {
        /// Name of the offending buffer.
        name: &'static str,
        /// Length the descriptor's dimensions implied.
        expected: usize,
        /// Length actually observed.
        actual: usize,
    },
    /// `m` or `k` is not a multiple of four, which the dense primitives assume.
    #[error("dimension '{name}' = {value} is not a multiple of 4")]
    NotMultipleOfFour {
        /// Name of the offending dimension (`"m"` or `"k"`).
        name: &'static str,
        /// The value that failed the check.
        value: usize,
    },
    /// The batch size `b` was zero.
    #[error("batch size must be at least 1")]
    EmptyBatch,
}

/// Errors raised by [`crate::config::SolverConfig::validate`].
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    /// `max_iter` was zero.
    #[error("max_iter must be at least 1")]
    MaxIterZero,
    /// `eps` was outside the open interval (0, 1).
    #[error("eps must satisfy 0 < eps < 1, got {0}")]
    EpsOutOfRange(f32),
    /// `prox_lam` was negative.
    #[error("prox_lam must be >= 0, got {0}")]
    NegativeProxLam(f32),
}
