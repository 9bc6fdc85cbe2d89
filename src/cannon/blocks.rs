//! Per-worker block storage and the operand sources that populate it.

use super::grid::ProcessGrid;
use crate::error::{CannonError, Result};
use crate::matrix::Matrix;
use crate::matrix::naive_ijk::multiply_accumulate;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Selects one of a worker's three blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockId {
    A,
    B,
    C,
}

/// The three `b × b` blocks a worker owns for one problem size.
///
/// `a` and `b` are rotated in place by the exchanges; `c` only ever changes
/// through [`BlockStore::multiply_accumulate`].
#[derive(Debug, Clone)]
pub struct BlockStore {
    n: usize,
    block_size: usize,
    a: Matrix,
    b: Matrix,
    c: Matrix,
}

impl BlockStore {
    /// Allocates zeroed blocks of side `n / g`.
    ///
    /// Fails with `InvalidSize` when `n` does not split evenly over the grid.
    pub fn allocate(n: usize, grid: &ProcessGrid) -> Result<Self> {
        let bs = grid.block_size_for(n)?;
        Ok(Self {
            n,
            block_size: bs,
            a: Matrix::zeros(bs, bs),
            b: Matrix::zeros(bs, bs),
            c: Matrix::zeros(bs, bs),
        })
    }

    /// Global matrix side.
    pub fn n(&self) -> usize {
        self.n
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn block(&self, id: BlockId) -> &Matrix {
        match id {
            BlockId::A => &self.a,
            BlockId::B => &self.b,
            BlockId::C => &self.c,
        }
    }

    pub fn block_mut(&mut self, id: BlockId) -> &mut Matrix {
        match id {
            BlockId::A => &mut self.a,
            BlockId::B => &mut self.b,
            BlockId::C => &mut self.c,
        }
    }

    pub fn get(&self, id: BlockId, i: usize, j: usize) -> f64 {
        self.block(id).get(i, j)
    }

    pub fn set(&mut self, id: BlockId, i: usize, j: usize, value: f64) {
        self.block_mut(id).set(i, j, value);
    }

    /// Loads this worker's unaligned A and B blocks and zeroes C.
    pub fn populate<S: BlockSource + ?Sized>(&mut self, source: &S, grid: &ProcessGrid) -> Result<()> {
        source.fill(grid.row(), grid.col(), grid.side(), &mut self.a, &mut self.b)?;
        self.c.fill(0.0);
        Ok(())
    }

    /// `C += A * B` on the current local blocks.
    pub fn multiply_accumulate(&mut self) {
        multiply_accumulate(
            self.a.as_slice(),
            self.b.as_slice(),
            self.c.as_mut_slice(),
            self.block_size,
        );
    }

    pub fn into_result(self) -> Matrix {
        self.c
    }
}

/// Where the original, unaligned operand blocks come from.
pub trait BlockSource {
    /// Writes block `(row, col)` of A and of B, for a grid of side `side`,
    /// into `a` and `b`. Both are already sized `b × b`.
    fn fill(&self, row: usize, col: usize, side: usize, a: &mut Matrix, b: &mut Matrix) -> Result<()>;
}

/// Per-rank seed: distinct ranks always get distinct streams.
pub fn seed_for_rank(seed: u64, rank: usize) -> u64 {
    seed ^ (rank as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Synthetic benchmark data: uniform in `[0, 10)`, each rank seeded from
/// `seed` mixed with its rank.
///
/// A rank draws its A block first, then its B block, from one generator.
/// Because of that any rank's blocks can be regenerated anywhere, which is
/// what [`assemble_operands`] relies on for verification.
#[derive(Debug, Clone, Copy)]
pub struct RandomBlocks {
    seed: u64,
}

impl RandomBlocks {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl BlockSource for RandomBlocks {
    fn fill(&self, row: usize, col: usize, side: usize, a: &mut Matrix, b: &mut Matrix) -> Result<()> {
        let mut rng = StdRng::seed_from_u64(seed_for_rank(self.seed, row * side + col));
        a.fill_random(&mut rng);
        b.fill_random(&mut rng);
        Ok(())
    }
}

/// Known global operands that every worker can see; each worker copies out
/// its own block.
#[derive(Debug, Clone, Copy)]
pub struct GlobalOperands<'a> {
    a: &'a Matrix,
    b: &'a Matrix,
}

impl<'a> GlobalOperands<'a> {
    pub fn new(a: &'a Matrix, b: &'a Matrix) -> Self {
        Self { a, b }
    }
}

impl BlockSource for GlobalOperands<'_> {
    fn fill(&self, row: usize, col: usize, side: usize, a: &mut Matrix, b: &mut Matrix) -> Result<()> {
        let bs = a.rows();
        let n = bs * side;
        for (name, m) in [("A", self.a), ("B", self.b)] {
            if m.rows() != n || m.cols() != n {
                return Err(CannonError::InvalidOperands(format!(
                    "{} is {}x{}, run expects {}x{}",
                    name,
                    m.rows(),
                    m.cols(),
                    n,
                    n
                )));
            }
        }
        *a = self.a.extract_block(row * bs, col * bs, bs, bs);
        *b = self.b.extract_block(row * bs, col * bs, bs, bs);
        Ok(())
    }
}

/// Rebuilds the full `n × n` A and B a source hands out over a grid of side
/// `side`.
pub fn assemble_operands<S: BlockSource + ?Sized>(
    source: &S,
    n: usize,
    side: usize,
) -> Result<(Matrix, Matrix)> {
    if side == 0 || n == 0 || n % side != 0 {
        return Err(CannonError::InvalidSize { n, grid: side });
    }
    let bs = n / side;
    let mut a = Matrix::zeros(n, n);
    let mut b = Matrix::zeros(n, n);
    let mut a_blk = Matrix::zeros(bs, bs);
    let mut b_blk = Matrix::zeros(bs, bs);
    for row in 0..side {
        for col in 0..side {
            source.fill(row, col, side, &mut a_blk, &mut b_blk)?;
            a.write_block(row * bs, col * bs, bs, a_blk.as_slice());
            b.write_block(row * bs, col * bs, bs, b_blk.as_slice());
        }
    }
    Ok((a, b))
}
