//! Benchmark runner for Cannon's algorithm.
//!
//! Without the `mpi` feature every rank is a thread in this process
//! (`--workers` sets how many). With it, ranks are MPI processes:
//!
//! ```bash
//! cargo run --release -- --workers 4 --sizes 256,512,1024 --verify
//! mpirun -n 9 cargo run --release --features mpi -- --sizes 243,729,2187
//! ```

use cannon::comm::Communicator;
use cannon::config::{DEFAULT_SEED, DEFAULT_SIZES, RunConfig};
use cannon::driver::{SizeOutcome, SizeReport, run_sizes};
use cannon::{CannonError, ProcessGrid};
use clap::Parser;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "cannon", about = "Benchmark Cannon's distributed matrix multiply")]
struct Args {
    /// Number of ranks to simulate with threads (ignored under MPI)
    #[arg(short, long, default_value_t = 4)]
    workers: usize,

    /// Candidate matrix sizes, comma separated
    #[arg(short, long, value_delimiter = ',', default_values_t = DEFAULT_SIZES)]
    sizes: Vec<usize>,

    /// Base seed for the random operands
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Check the gathered product against a sequential reference on root
    #[arg(long)]
    verify: bool,
}

impl Args {
    fn run_config(&self) -> RunConfig {
        RunConfig::default()
            .with_sizes(self.sizes.clone())
            .with_seed(self.seed)
            .with_verify(self.verify)
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    launch(&args, &args.run_config())
}

#[cfg(feature = "mpi")]
fn launch(_args: &Args, config: &RunConfig) -> ExitCode {
    match cannon::comm::mpi::MpiComm::init() {
        Ok(comm) => ExitCode::from(run_rank(&comm, config)),
        Err(e) => {
            tracing::error!(error = %e, "could not start MPI");
            ExitCode::FAILURE
        }
    }
}

#[cfg(not(feature = "mpi"))]
fn launch(args: &Args, config: &RunConfig) -> ExitCode {
    ExitCode::from(launch_local(args.workers, config))
}

/// Runs `workers` thread ranks and returns the worst exit status.
#[cfg(not(feature = "mpi"))]
fn launch_local(workers: usize, config: &RunConfig) -> u8 {
    // Zero workers would spawn no rank to report the bad topology.
    if let Err(e) = ProcessGrid::side_for(workers) {
        report_grid_error(&e);
        return 1;
    }
    cannon::comm::local::LocalUniverse::new(workers)
        .run(|comm| run_rank(&comm, config))
        .into_iter()
        .max()
        .unwrap_or(1)
}

fn report_grid_error(e: &CannonError) {
    tracing::error!(error = %e, "cannot build process grid");
    if let CannonError::InvalidTopology { processes } = e {
        eprintln!("Error: Number of processes must be a perfect square.");
        eprintln!("Current: {}, use 1, 4, 9, 16.", processes);
    }
}

/// Everything one rank does. Returns its exit status.
fn run_rank<C: Communicator>(comm: &C, config: &RunConfig) -> u8 {
    let grid = match ProcessGrid::from_comm(comm) {
        Ok(grid) => grid,
        Err(e) => {
            // Every rank sees the same group size, so all of them stop here.
            if comm.rank() == 0 {
                report_grid_error(&e);
            }
            return 1;
        }
    };

    if grid.is_root() {
        println!("=== Cannon's Algorithm Performance ===\n");
        println!(
            "Processes: {} (grid: {}×{})\n",
            grid.processes(),
            grid.side(),
            grid.side()
        );
    }

    match run_sizes(comm, &grid, config) {
        Ok(outcomes) => {
            if grid.is_root() {
                for outcome in &outcomes {
                    print_outcome(outcome);
                }
                print_summary_table(&outcomes);
                println!("All tests completed!");
            }
            0
        }
        Err(e) => {
            tracing::error!(rank = grid.rank(), error = %e, "run aborted");
            1
        }
    }
}

fn print_outcome(outcome: &SizeOutcome) {
    match outcome {
        SizeOutcome::Skipped { n, grid } => {
            println!("Size {} not divisible by grid {}. Skipping.\n", n, grid);
        }
        SizeOutcome::Completed(report) => {
            println!("Matrix: {}×{}", report.n, report.n);
            println!("{}", "-".repeat(50));
            if let Some(seq) = report.sequential {
                println!("  Sequential: {:10.4} s", seq);
            }
            if let Some(par) = report.parallel {
                println!("  Parallel:   {:10.4} s", par);
            }
            if let (Some(speedup), Some(efficiency)) = (report.speedup(), report.efficiency()) {
                println!("  Speedup:    {:10.2}×", speedup);
                println!("  Efficiency: {:10.2}%", efficiency * 100.0);
            }
            println!("  Block:      {}×{}", report.block_size, report.block_size);
            if let Some(err) = report.max_error {
                println!("  Max rel. error: {:.3e}", err);
            }
            println!();
        }
    }
}

fn print_summary_table(outcomes: &[SizeOutcome]) {
    let completed: Vec<&SizeReport> = outcomes
        .iter()
        .filter_map(|o| match o {
            SizeOutcome::Completed(r) => Some(r),
            SizeOutcome::Skipped { .. } => None,
        })
        .collect();
    if completed.is_empty() {
        return;
    }

    println!("{}", "=".repeat(70));
    println!("SUMMARY");
    println!("{}", "=".repeat(70));
    println!(
        "\n{:<12} {:>12} {:>12} {:>12} {:>14}",
        "Size", "Seq (s)", "Par (s)", "Speedup", "Efficiency"
    );
    println!("{}", "-".repeat(70));
    for r in completed {
        println!(
            "{:<12} {:>12.4} {:>12.4} {:>11.2}× {:>13.1}%",
            format!("{}×{}", r.n, r.n),
            r.sequential.unwrap_or(f64::NAN),
            r.parallel.unwrap_or(f64::NAN),
            r.speedup().unwrap_or(f64::NAN),
            r.efficiency().map_or(f64::NAN, |e| e * 100.0)
        );
    }
    println!("{}\n", "=".repeat(70));
}
