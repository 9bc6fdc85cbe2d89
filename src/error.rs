//! Error types for Cannon runs.

use thiserror::Error;

/// Errors that can occur while setting up or running Cannon's algorithm.
#[derive(Debug, Error)]
pub enum CannonError {
    /// The process count is not a perfect square, so no g×g torus exists.
    ///
    /// Fatal for the whole run. Every worker derives this from the group size
    /// alone, so all of them reach the same verdict without talking.
    #[error("process count {processes} is not a perfect square (use 1, 4, 9, 16, ...)")]
    InvalidTopology { processes: usize },

    /// The matrix dimension does not split evenly across the grid.
    ///
    /// Only the offending candidate size is skipped.
    #[error("matrix size {n} is not divisible by grid side {grid}")]
    InvalidSize { n: usize, grid: usize },

    /// A message count or gather tally did not match what the protocol expects.
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    /// Caller-supplied operands don't fit the requested run.
    #[error("invalid operands: {0}")]
    InvalidOperands(String),

    /// The communication substrate failed (peer gone, runtime unavailable).
    #[error("communication failure: {0}")]
    Comm(String),
}

impl CannonError {
    /// Whether the error ends the run for every worker, as opposed to
    /// skipping a single candidate size.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, CannonError::InvalidSize { .. })
    }
}

/// Result type for Cannon operations.
pub type Result<T> = std::result::Result<T, CannonError>;
