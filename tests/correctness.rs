use cannon::cannon::blocks::assemble_operands;
use cannon::comm::local::LocalUniverse;
use cannon::config::RunConfig;
use cannon::driver::{SizeOutcome, run_sizes};
use cannon::matrix::naive_ijk::matmul_naive_ijk;
use cannon::{
    CannonError, GlobalOperands, Matrix, ProcessGrid, RandomBlocks, reference_product, run_cannon,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn assert_matrices_equal(expected: &Matrix, actual: &Matrix, name: &str) {
    assert_eq!(
        (expected.rows(), expected.cols()),
        (actual.rows(), actual.cols()),
        "{}: shape mismatch",
        name
    );
    let (e, a) = (expected.as_slice(), actual.as_slice());
    for i in 0..e.len() {
        assert!(
            (e[i] - a[i]).abs() <= 1e-9 * e[i].abs().max(1.0),
            "{}: mismatch at index {}: expected {}, got {}",
            name,
            i,
            e[i],
            a[i]
        );
    }
}

/// Runs Cannon on `processes` threads and returns root's product, checking
/// that no other rank returned one.
fn distributed_product(processes: usize, a: &Matrix, b: &Matrix) -> Matrix {
    let n = a.rows();
    let mut results = LocalUniverse::new(processes).run(|comm| {
        let grid = ProcessGrid::from_comm(&comm).unwrap();
        run_cannon(&comm, n, &grid, &GlobalOperands::new(a, b)).unwrap()
    });
    assert!(
        results[1..].iter().all(Option::is_none),
        "only root should hold the gathered product"
    );
    results.swap_remove(0).expect("root returns the product")
}

fn int_matrix(n: usize, salt: usize) -> Matrix {
    Matrix::from_fn(n, n, |i, j| ((i * 7 + j * 3 + salt) % 11) as f64 - 5.0)
}

// ============================================================
// Hand-checked scenario
// ============================================================

#[test]
fn test_4x4_on_2x2_grid() {
    let a = Matrix::from_vec(
        4,
        4,
        vec![
            1.0, 0.0, 0.0, 0.0, //
            0.0, 2.0, 0.0, 0.0, //
            0.0, 0.0, 3.0, 0.0, //
            1.0, 0.0, 0.0, 4.0,
        ],
    );
    let b = Matrix::from_fn(4, 4, |i, j| (i * 4 + j + 1) as f64);

    let c = distributed_product(4, &a, &b);

    let expected = vec![
        1.0, 2.0, 3.0, 4.0, //
        10.0, 12.0, 14.0, 16.0, //
        27.0, 30.0, 33.0, 36.0, //
        53.0, 58.0, 63.0, 68.0,
    ];
    assert_eq!(c.as_slice(), expected.as_slice());
}

#[test]
fn test_identity_is_neutral_on_every_grid() {
    let n = 8;
    let b = int_matrix(n, 1);
    for processes in [1, 4, 16] {
        let c = distributed_product(processes, &Matrix::identity(n), &b);
        assert_eq!(c, b, "identity on {} processes", processes);
    }
}

// ============================================================
// Against the sequential reference
// ============================================================

#[test]
fn test_matches_reference_across_grids() {
    let cases = [
        (1, 5),  // single worker, whole matrix is one block
        (4, 2),  // 1×1 blocks
        (4, 6),
        (9, 9),
        (9, 12),
        (16, 16),
        (25, 10),
    ];

    for (processes, n) in cases {
        let a = int_matrix(n, 0);
        let b = int_matrix(n, 4);
        let expected = reference_product(&a, &b);
        let c = distributed_product(processes, &a, &b);
        assert_matrices_equal(&expected, &c, &format!("p{}_n{}", processes, n));
    }
}

#[test]
fn test_random_operands_within_tolerance() {
    for (processes, n) in [(4, 32), (9, 27), (16, 32)] {
        let mut rng = StdRng::seed_from_u64(n as u64);
        let a = Matrix::random(n, &mut rng);
        let b = Matrix::random(n, &mut rng);

        let mut expected = vec![0.0; n * n];
        matmul_naive_ijk(a.as_slice(), b.as_slice(), &mut expected, n, n, n);
        let expected = Matrix::from_vec(n, n, expected);

        let c = distributed_product(processes, &a, &b);
        let err = c.max_relative_error(&expected);
        assert!(err < 1e-9, "p{}_n{}: relative error {}", processes, n, err);
    }
}

#[test]
fn test_per_rank_random_blocks() {
    let n = 12;
    let source = RandomBlocks::new(99);
    let results = LocalUniverse::new(9).run(|comm| {
        let grid = ProcessGrid::from_comm(&comm).unwrap();
        run_cannon(&comm, n, &grid, &source).unwrap()
    });

    let (a, b) = assemble_operands(&source, n, 3).unwrap();
    let expected = reference_product(&a, &b);
    assert_matrices_equal(&expected, results[0].as_ref().unwrap(), "random_blocks");
}

// ============================================================
// Rejection behavior
// ============================================================

#[test]
fn test_non_square_group_rejected_on_every_rank() {
    for processes in [2, 3, 5, 8] {
        let results = LocalUniverse::new(processes).run(|comm| {
            let grid = ProcessGrid::from_comm(&comm)?;
            run_cannon(&comm, 4, &grid, &RandomBlocks::new(0))
        });
        assert_eq!(results.len(), processes);
        for r in results {
            assert!(
                matches!(r, Err(CannonError::InvalidTopology { processes: p }) if p == processes),
                "{} processes should be rejected",
                processes
            );
        }
    }
}

#[test]
fn test_indivisible_size_skipped_rest_still_run() {
    let config = RunConfig::default().with_sizes([9, 100, 18]).with_verify(true);
    let results = LocalUniverse::new(9).run(|comm| {
        let grid = ProcessGrid::from_comm(&comm).unwrap();
        run_sizes(&comm, &grid, &config).unwrap()
    });

    for outcomes in &results {
        let ran: Vec<usize> = outcomes
            .iter()
            .filter_map(|o| match o {
                SizeOutcome::Completed(r) => Some(r.n),
                SizeOutcome::Skipped { .. } => None,
            })
            .collect();
        assert_eq!(ran, vec![9, 18]);
        assert!(outcomes.contains(&SizeOutcome::Skipped { n: 100, grid: 3 }));
    }

    for outcome in &results[0] {
        if let SizeOutcome::Completed(r) = outcome {
            assert!(r.max_error.unwrap() < 1e-9, "n={} failed verification", r.n);
        }
    }
}

#[test]
fn test_mismatched_operands_rejected() {
    let a = Matrix::zeros(6, 6);
    let b = Matrix::zeros(6, 6);
    let results = LocalUniverse::new(4).run(|comm| {
        let grid = ProcessGrid::from_comm(&comm).unwrap();
        run_cannon(&comm, 8, &grid, &GlobalOperands::new(&a, &b))
    });
    assert!(
        results
            .iter()
            .all(|r| matches!(r, Err(CannonError::InvalidOperands(_))))
    );
}
