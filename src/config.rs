//! Hyperparameters shared by the forward and backward drivers.

use crate::error::ConfigError;

/// Bundles the tunables consumed by [`crate::forward::forward`] and
/// [`crate::backward::backward`].
///
/// Constructed purely in memory — no file or environment loading. This
/// mirrors the teacher's `SolverConfig` pattern of a single struct consumed
/// by the solving routines, rather than threading loose scalar parameters
/// through every call site.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig {
    /// Hard cap on the number of forward sweeps. Must be at least 1.
    pub max_iter: usize,
    /// Ratio of the first sweep's decrease used as the convergence threshold.
    /// Must satisfy `0 < eps < 1`. Typical value: `1e-4`.
    pub eps: f32,
    /// Diagonal regularizer added to `gnrm` during backward sweeps, for
    /// numerical stability of the linearized system. Must be `>= 0`. Typical
    /// value: `1e-2`.
    pub prox_lam: f32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            max_iter: 40,
            eps: 1e-4,
            prox_lam: 1e-2,
        }
    }
}

impl SolverConfig {
    /// Checks the range constraints §6 places on each field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_iter == 0 {
            return Err(ConfigError::MaxIterZero);
        }
        if !(self.eps > 0.0 && self.eps < 1.0) {
            return Err(ConfigError::EpsOutOfRange(self.eps));
        }
        if self.prox_lam < 0.0 {
            return Err(ConfigError::NegativeProxLam(self.prox_lam));
        }
        Ok(())
    }
}
