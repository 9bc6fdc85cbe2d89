/// Naive matrix multiplication using i-j-k loop order.
///
/// This is the textbook triple loop: each `C[i][j]` gets the full dot
/// product of row `i` of A and column `j` of B summed in a local, then added
/// once. The innermost loop walks B with stride `n`, so it is slow on large
/// matrices; it is the reference the distributed result is checked against.
///
/// # Arguments
///
/// * `a` - Matrix A (m × k), row-major
/// * `b` - Matrix B (k × n), row-major
/// * `c` - Matrix C (m × n), row-major, accumulated into (C += A * B)
/// * `m` - Rows of A and C
/// * `n` - Columns of B and C
/// * `k` - Columns of A, rows of B
pub fn matmul_naive_ijk(a: &[f64], b: &[f64], c: &mut [f64], m: usize, n: usize, k: usize) {
    for i in 0..m {
        for j in 0..n {
            let mut sum = 0.0;
            for p in 0..k {
                sum += a[i * k + p] * b[p * n + j];
            }
            c[i * n + j] += sum;
        }
    }
}

/// Block multiply-accumulate: `C += A * B` for three `bs × bs` blocks.
///
/// No tiling. Blocks are already `n / g` on a side, which is what keeps them
/// cache-sized.
///
/// # Panics
///
/// Panics if any slice is not `bs * bs` long.
pub fn multiply_accumulate(a: &[f64], b: &[f64], c: &mut [f64], bs: usize) {
    let len = bs * bs;
    assert_eq!(a.len(), len, "A: expected {}x{}={} elements", bs, bs, len);
    assert_eq!(b.len(), len, "B: expected {}x{}={} elements", bs, bs, len);
    assert_eq!(c.len(), len, "C: expected {}x{}={} elements", bs, bs, len);
    matmul_naive_ijk(a, b, c, bs, bs, bs);
}
