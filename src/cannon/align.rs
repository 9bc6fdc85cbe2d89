//! One-time skew that sets up Cannon's loop invariant.
//!
//! Afterwards worker `(row, col)` holds `A[row][(row + col) mod g]` and
//! `B[(row + col) mod g][col]`. A moves left by `row` places along its row
//! ring, B moves up by `col` places along its column ring, one neighbor hop
//! at a time. Every worker on a ring has the same row (resp. column) index,
//! so they all make the same number of hops and every exchange has a partner.

use super::blocks::{BlockId, BlockStore};
use super::grid::ProcessGrid;
use super::{TAG_ALIGN_A, TAG_ALIGN_B};
use crate::comm::Communicator;
use crate::error::Result;

pub fn align<C: Communicator + ?Sized>(
    comm: &C,
    grid: &ProcessGrid,
    store: &mut BlockStore,
) -> Result<()> {
    // Row 0 and column 0 are already in place and skip their exchange.
    for _ in 0..grid.row() {
        comm.exchange_replace(
            store.block_mut(BlockId::A).as_mut_slice(),
            grid.left(),
            TAG_ALIGN_A,
            grid.right(),
            TAG_ALIGN_A,
        )?;
    }
    for _ in 0..grid.col() {
        comm.exchange_replace(
            store.block_mut(BlockId::B).as_mut_slice(),
            grid.up(),
            TAG_ALIGN_B,
            grid.down(),
            TAG_ALIGN_B,
        )?;
    }

    tracing::debug!(
        rank = grid.rank(),
        row = grid.row(),
        col = grid.col(),
        "blocks aligned"
    );
    Ok(())
}
