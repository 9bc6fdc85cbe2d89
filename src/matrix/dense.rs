//! Flat row-major matrix storage.

use rand::Rng;

/// Range that synthetic benchmark data is drawn from.
pub const RANDOM_LOW: f64 = 0.0;
pub const RANDOM_HIGH: f64 = 10.0;

/// Row-major dense matrix of `f64`.
///
/// Element `(i, j)` lives at `data[i * cols + j]`. The buffer is owned
/// exclusively; blocks are never shared between workers, only copied into
/// messages.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Zero-filled `rows × cols` matrix.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Wraps an existing row-major buffer.
    ///
    /// # Panics
    ///
    /// Panics if `data.len() != rows * cols`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Self {
        assert_eq!(
            data.len(),
            rows * cols,
            "expected {}x{}={} elements",
            rows,
            cols,
            rows * cols
        );
        Self { rows, cols, data }
    }

    /// Builds a matrix by evaluating `f(i, j)` for every element.
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> f64) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for j in 0..cols {
                data.push(f(i, j));
            }
        }
        Self { rows, cols, data }
    }

    pub fn identity(n: usize) -> Self {
        Self::from_fn(n, n, |i, j| if i == j { 1.0 } else { 0.0 })
    }

    /// Square matrix with every element uniform in `[0, 10)`.
    pub fn random<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Self {
        let mut m = Self::zeros(n, n);
        m.fill_random(rng);
        m
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        debug_assert!(i < self.rows && j < self.cols);
        self.data[i * self.cols + j]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        debug_assert!(i < self.rows && j < self.cols);
        self.data[i * self.cols + j] = value;
    }

    /// Overwrites every element with a fresh uniform draw from `[0, 10)`.
    pub fn fill_random<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for v in &mut self.data {
            *v = rng.gen_range(RANDOM_LOW..RANDOM_HIGH);
        }
    }

    pub fn fill(&mut self, value: f64) {
        self.data.fill(value);
    }

    /// Copies the `rows × cols` sub-matrix starting at `(row_off, col_off)`.
    ///
    /// # Panics
    ///
    /// Panics if the window runs past the edge of `self`.
    pub fn extract_block(&self, row_off: usize, col_off: usize, rows: usize, cols: usize) -> Matrix {
        assert!(
            row_off + rows <= self.rows && col_off + cols <= self.cols,
            "block {}x{} at ({}, {}) exceeds {}x{} matrix",
            rows,
            cols,
            row_off,
            col_off,
            self.rows,
            self.cols
        );
        let mut out = Matrix::zeros(rows, cols);
        for i in 0..rows {
            let src = (row_off + i) * self.cols + col_off;
            out.data[i * cols..(i + 1) * cols].copy_from_slice(&self.data[src..src + cols]);
        }
        out
    }

    /// Writes `block` into `self` with its top-left corner at `(row_off, col_off)`.
    ///
    /// `block` is a raw row-major buffer of `block_rows` rows so received
    /// message payloads can be placed without wrapping them first.
    ///
    /// # Panics
    ///
    /// Panics if the window runs past the edge of `self`.
    pub fn write_block(&mut self, row_off: usize, col_off: usize, block_rows: usize, block: &[f64]) {
        if block_rows == 0 {
            return;
        }
        let block_cols = block.len() / block_rows;
        assert!(
            row_off + block_rows <= self.rows && col_off + block_cols <= self.cols,
            "block {}x{} at ({}, {}) exceeds {}x{} matrix",
            block_rows,
            block_cols,
            row_off,
            col_off,
            self.rows,
            self.cols
        );
        for i in 0..block_rows {
            let dst = (row_off + i) * self.cols + col_off;
            self.data[dst..dst + block_cols]
                .copy_from_slice(&block[i * block_cols..(i + 1) * block_cols]);
        }
    }

    /// Largest element-wise relative error of `self` against `expected`.
    ///
    /// The denominator is floored at 1.0 so exact zeros in `expected` don't
    /// blow the ratio up.
    ///
    /// # Panics
    ///
    /// Panics if the shapes differ.
    pub fn max_relative_error(&self, expected: &Matrix) -> f64 {
        assert_eq!(
            (self.rows, self.cols),
            (expected.rows, expected.cols),
            "shape mismatch"
        );
        self.data
            .iter()
            .zip(&expected.data)
            .map(|(a, e)| (a - e).abs() / e.abs().max(1.0))
            .fold(0.0, f64::max)
    }
}
