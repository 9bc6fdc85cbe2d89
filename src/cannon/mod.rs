//! Cannon's algorithm on a g×g torus of workers.
//!
//! A run goes through four phases, each in its own module:
//! - [`blocks`]: allocate and populate the local A, B, C blocks
//! - [`align`]: one-time skew of A and B
//! - [`shift`]: g steps of multiply-accumulate and rotate
//! - [`gather`]: root reassembles C
//!
//! [`grid`] holds the topology all of them share.

pub mod align;
pub mod blocks;
pub mod gather;
pub mod grid;
pub mod shift;

use crate::comm::{Communicator, ReduceOp, Tag};
use crate::error::Result;
use crate::matrix::Matrix;
use blocks::{BlockSource, BlockStore};
use gather::Worker;
use grid::ProcessGrid;

// Every exchange kind gets its own tag so a receive can never pick up a block
// meant for another buffer or phase.
pub const TAG_ALIGN_A: Tag = 0;
pub const TAG_ALIGN_B: Tag = 1;
pub const TAG_SHIFT_A: Tag = 2;
pub const TAG_SHIFT_B: Tag = 3;
pub const TAG_GATHER: Tag = 4;

/// Multiplies the `n × n` operands handed out by `source` across all ranks
/// of `comm`.
///
/// Every rank must call this with the same `n`. Root gets `Some(product)`,
/// everyone else `None`. Nothing is printed.
pub fn run_cannon<C, S>(
    comm: &C,
    n: usize,
    grid: &ProcessGrid,
    source: &S,
) -> Result<Option<Matrix>>
where
    C: Communicator + ?Sized,
    S: BlockSource + ?Sized,
{
    let mut store = BlockStore::allocate(n, grid)?;
    store.populate(source, grid)?;

    align::align(comm, grid, &mut store)?;
    shift::shift_multiply(comm, grid, &mut store)?;

    Worker::for_grid(*grid).gather(comm, store)
}

/// Outcome of one timed run on one rank.
#[derive(Debug, Clone)]
pub struct CannonReport {
    pub n: usize,
    pub block_size: usize,
    /// This rank's time between the two barriers.
    pub local_elapsed: f64,
    /// Earliest start to latest end over all ranks. Root only.
    pub global_elapsed: Option<f64>,
    /// Assembled product. Root only.
    pub result: Option<Matrix>,
}

/// [`run_cannon`] between two barriers, with the group-wide timing window
/// reduced to root.
///
/// The size check happens before the first barrier, so on `InvalidSize`
/// every rank returns the same error without having communicated.
pub fn run_timed<C, S>(comm: &C, n: usize, grid: &ProcessGrid, source: &S) -> Result<CannonReport>
where
    C: Communicator + ?Sized,
    S: BlockSource + ?Sized,
{
    let block_size = grid.block_size_for(n)?;

    comm.barrier()?;
    let start = comm.wall_clock();

    let result = run_cannon(comm, n, grid, source)?;

    comm.barrier()?;
    let end = comm.wall_clock();

    let first_start = comm.reduce(start, ReduceOp::Min, 0)?;
    let last_end = comm.reduce(end, ReduceOp::Max, 0)?;

    Ok(CannonReport {
        n,
        block_size,
        local_elapsed: end - start,
        global_elapsed: first_start.zip(last_end).map(|(s, e)| e - s),
        result,
    })
}
