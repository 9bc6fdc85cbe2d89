//! The communication substrate Cannon's algorithm runs on.
//!
//! The algorithm only needs a handful of blocking primitives, captured by
//! [`Communicator`]. Backends:
//! - [`local`]: one thread per rank inside this process, linked by channels.
//!   Used by the benchmark binary and by the tests.
//! - `mpi` (cargo feature `mpi`): real processes under `mpirun`.

pub mod local;
#[cfg(feature = "mpi")]
pub mod mpi;

use crate::error::Result;

/// Message label. Receives only match sends carrying the same tag.
pub type Tag = i32;

/// Reduction applied by [`Communicator::reduce`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReduceOp {
    Sum,
    Min,
    Max,
}

impl ReduceOp {
    pub fn apply(self, acc: f64, value: f64) -> f64 {
        match self {
            ReduceOp::Sum => acc + value,
            ReduceOp::Min => acc.min(value),
            ReduceOp::Max => acc.max(value),
        }
    }
}

/// Blocking point-to-point and collective primitives over a fixed group of
/// ranks `0..size()`.
///
/// Every call suspends the caller until its counterpart(s) have made the
/// matching call. Message lengths are implied by the slices: an incoming
/// message whose length differs from the receive buffer is a
/// [`ProtocolViolation`](crate::CannonError::ProtocolViolation).
pub trait Communicator {
    /// This worker's rank.
    fn rank(&self) -> usize;

    /// Number of ranks in the group.
    fn size(&self) -> usize;

    /// Sends `buf` to `dest` under `tag`.
    fn send(&self, buf: &[f64], dest: usize, tag: Tag) -> Result<()>;

    /// Fills `buf` with the next message from `source` carrying `tag`.
    fn receive(&self, buf: &mut [f64], source: usize, tag: Tag) -> Result<()>;

    /// Sends `buf` to `dest` and overwrites it with the message from `source`,
    /// as one operation.
    ///
    /// This is the only safe way to rotate buffers around a ring. Splitting it
    /// into `send` then `receive` makes every rank wait on its successor and
    /// the ring deadlocks.
    fn exchange_replace(
        &self,
        buf: &mut [f64],
        dest: usize,
        send_tag: Tag,
        source: usize,
        recv_tag: Tag,
    ) -> Result<()>;

    /// Blocks until every rank has entered the barrier.
    fn barrier(&self) -> Result<()>;

    /// Combines one scalar per rank with `op`. `Some(result)` on `root`,
    /// `None` everywhere else.
    fn reduce(&self, value: f64, op: ReduceOp, root: usize) -> Result<Option<f64>>;

    /// Seconds on a clock shared by the group, for timing windows.
    fn wall_clock(&self) -> f64;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reduce_ops_fold() {
        let vals = [3.0, -1.0, 7.5];
        let fold = |op: ReduceOp| vals[1..].iter().fold(vals[0], |acc, &v| op.apply(acc, v));
        assert_eq!(fold(ReduceOp::Sum), 9.5);
        assert_eq!(fold(ReduceOp::Min), -1.0);
        assert_eq!(fold(ReduceOp::Max), 7.5);
    }
}
