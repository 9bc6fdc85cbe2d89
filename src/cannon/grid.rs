//! Process grid topology: ranks laid out row-major on a g×g torus.

use crate::comm::Communicator;
use crate::error::{CannonError, Result};

/// One rank's place on the torus and its four wraparound neighbors.
///
/// Pure function of `(rank, processes)`; every worker derives its own copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessGrid {
    rank: usize,
    side: usize,
    row: usize,
    col: usize,
    left: usize,
    right: usize,
    up: usize,
    down: usize,
}

impl ProcessGrid {
    /// Grid side `g` for `processes` ranks, or `InvalidTopology` if
    /// `processes` is not a positive perfect square.
    pub fn side_for(processes: usize) -> Result<usize> {
        let side = (processes as f64).sqrt().round() as usize;
        if processes == 0 || side.checked_mul(side) != Some(processes) {
            return Err(CannonError::InvalidTopology { processes });
        }
        Ok(side)
    }

    pub fn new(rank: usize, processes: usize) -> Result<Self> {
        let g = Self::side_for(processes)?;
        if rank >= processes {
            return Err(CannonError::ProtocolViolation(format!(
                "rank {} outside a group of {}",
                rank, processes
            )));
        }

        let row = rank / g;
        let col = rank % g;
        Ok(Self {
            rank,
            side: g,
            row,
            col,
            left: row * g + (col + g - 1) % g,
            right: row * g + (col + 1) % g,
            up: ((row + g - 1) % g) * g + col,
            down: ((row + 1) % g) * g + col,
        })
    }

    /// Topology for the calling worker of `comm`.
    pub fn from_comm<C: Communicator + ?Sized>(comm: &C) -> Result<Self> {
        Self::new(comm.rank(), comm.size())
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Grid side `g`.
    pub fn side(&self) -> usize {
        self.side
    }

    pub fn processes(&self) -> usize {
        self.side * self.side
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn col(&self) -> usize {
        self.col
    }

    pub fn left(&self) -> usize {
        self.left
    }

    pub fn right(&self) -> usize {
        self.right
    }

    pub fn up(&self) -> usize {
        self.up
    }

    pub fn down(&self) -> usize {
        self.down
    }

    pub fn is_root(&self) -> bool {
        self.rank == 0
    }

    /// Block side `n / g`, or `InvalidSize` if `n` does not split evenly.
    pub fn block_size_for(&self, n: usize) -> Result<usize> {
        if n == 0 || n % self.side != 0 {
            return Err(CannonError::InvalidSize { n, grid: self.side });
        }
        Ok(n / self.side)
    }

    /// Rank at `(row, col)`, wrapping both coordinates.
    pub fn rank_of(&self, row: usize, col: usize) -> usize {
        (row % self.side) * self.side + col % self.side
    }

    pub fn coords_of(&self, rank: usize) -> (usize, usize) {
        (rank / self.side, rank % self.side)
    }
}
