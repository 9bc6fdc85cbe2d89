use cannon::comm::local::LocalUniverse;
use cannon::{Matrix, ProcessGrid, RandomBlocks, reference_product, run_cannon};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::hint::black_box;

fn bench_sequential(c: &mut Criterion) {
    let mut group = c.benchmark_group("sequential");
    group.sample_size(10);

    for n in [128, 256] {
        let mut rng = StdRng::seed_from_u64(7);
        let a = Matrix::random(n, &mut rng);
        let b = Matrix::random(n, &mut rng);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |bench, _| {
            bench.iter(|| black_box(reference_product(&a, &b)))
        });
    }
    group.finish();
}

fn bench_cannon(c: &mut Criterion) {
    let mut group = c.benchmark_group("cannon");
    group.sample_size(10);

    let source = RandomBlocks::new(7);
    for (workers, n) in [(1, 128), (4, 128), (4, 256), (16, 256)] {
        let universe = LocalUniverse::new(workers);
        group.bench_with_input(
            BenchmarkId::new(format!("{}_workers", workers), n),
            &n,
            |bench, &n| {
                bench.iter(|| {
                    universe.run(|comm| {
                        let grid = ProcessGrid::from_comm(&comm).unwrap();
                        black_box(run_cannon(&comm, n, &grid, &source).unwrap())
                    })
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_sequential, bench_cannon);
criterion_main!(benches);
