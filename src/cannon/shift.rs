//! The g-step shift-multiply loop.

use super::blocks::{BlockId, BlockStore};
use super::grid::ProcessGrid;
use super::{TAG_SHIFT_A, TAG_SHIFT_B};
use crate::comm::Communicator;
use crate::error::Result;

/// Rotates A one place left and B one place up, on every worker.
pub fn rotate<C: Communicator + ?Sized>(
    comm: &C,
    grid: &ProcessGrid,
    store: &mut BlockStore,
) -> Result<()> {
    comm.exchange_replace(
        store.block_mut(BlockId::A).as_mut_slice(),
        grid.left(),
        TAG_SHIFT_A,
        grid.right(),
        TAG_SHIFT_A,
    )?;
    comm.exchange_replace(
        store.block_mut(BlockId::B).as_mut_slice(),
        grid.up(),
        TAG_SHIFT_B,
        grid.down(),
        TAG_SHIFT_B,
    )
}

/// Runs exactly `g` steps of `C += A * B` followed by [`rotate`].
///
/// Requires aligned blocks. Each rotation advances the shared index `k` of
/// the local `A[row][k]`, `B[k][col]` pair by one modulo g, so after `g`
/// steps `C` holds `Σ_k A[row][k] * B[k][col]`, each term exactly once. The
/// last rotation brings A and B back to their aligned positions.
pub fn shift_multiply<C: Communicator + ?Sized>(
    comm: &C,
    grid: &ProcessGrid,
    store: &mut BlockStore,
) -> Result<()> {
    for step in 0..grid.side() {
        store.multiply_accumulate();
        rotate(comm, grid, store)?;
        tracing::trace!(rank = grid.rank(), step, "shift step done");
    }
    Ok(())
}
