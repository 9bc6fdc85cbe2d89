//! Single-process baseline used for speedup figures and result checks.

use super::dense::Matrix;
use super::naive_ijk::matmul_naive_ijk;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::time::Instant;

/// Exact `A × B` for square operands, computed with the i-j-k triple loop.
///
/// # Panics
///
/// Panics if the operands are not square matrices of the same size.
pub fn reference_product(a: &Matrix, b: &Matrix) -> Matrix {
    let n = a.rows();
    assert!(
        a.cols() == n && b.rows() == n && b.cols() == n,
        "expected two {}x{} operands",
        n,
        n
    );
    let mut c = Matrix::zeros(n, n);
    matmul_naive_ijk(a.as_slice(), b.as_slice(), c.as_mut_slice(), n, n, n);
    c
}

/// Times one sequential multiply of two random `n × n` matrices.
///
/// Only the multiply is timed; generating the operands is not. Returns
/// elapsed seconds.
pub fn sequential_multiply(n: usize, seed: u64) -> f64 {
    let mut rng = StdRng::seed_from_u64(seed);
    let a = Matrix::random(n, &mut rng);
    let b = Matrix::random(n, &mut rng);

    let start = Instant::now();
    let c = reference_product(&a, &b);
    let elapsed = start.elapsed().as_secs_f64();

    tracing::debug!(n, elapsed, checksum = c.as_slice().iter().sum::<f64>(), "sequential baseline");
    elapsed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_neutral() {
        let b = Matrix::from_fn(5, 5, |i, j| (i * 5 + j) as f64);
        assert_eq!(reference_product(&Matrix::identity(5), &b), b);
        assert_eq!(reference_product(&b, &Matrix::identity(5)), b);
    }

    #[test]
    fn baseline_reports_nonnegative_time() {
        assert!(sequential_multiply(8, 1) >= 0.0);
    }

    #[test]
    #[should_panic(expected = "operands")]
    fn rejects_mismatched_operands() {
        reference_product(&Matrix::zeros(2, 2), &Matrix::zeros(3, 3));
    }
}
