//! Loops Cannon runs over candidate sizes and collects root's figures.
//!
//! Mirrors what a benchmark harness does with the kernel: time a sequential
//! baseline on root, time the distributed run between barriers, and derive
//! speedup and efficiency. Sizes the grid can't split are skipped on every
//! rank; any other error ends the run.

use crate::cannon::blocks::{RandomBlocks, assemble_operands};
use crate::cannon::grid::ProcessGrid;
use crate::cannon::run_timed;
use crate::comm::Communicator;
use crate::config::RunConfig;
use crate::error::{CannonError, Result};
use crate::matrix::sequential::{reference_product, sequential_multiply};
use std::time::Instant;

/// Figures for one completed size. Timing and verification fields are only
/// filled on root.
#[derive(Debug, Clone, PartialEq)]
pub struct SizeReport {
    pub n: usize,
    pub block_size: usize,
    pub processes: usize,
    pub sequential: Option<f64>,
    pub parallel: Option<f64>,
    /// Max relative error of the gathered product, with `verify` on.
    pub max_error: Option<f64>,
}

impl SizeReport {
    pub fn speedup(&self) -> Option<f64> {
        let (seq, par) = (self.sequential?, self.parallel?);
        (par > 0.0).then(|| seq / par)
    }

    /// Speedup per process.
    pub fn efficiency(&self) -> Option<f64> {
        self.speedup().map(|s| s / self.processes as f64)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SizeOutcome {
    Completed(SizeReport),
    Skipped { n: usize, grid: usize },
}

/// Runs every size in `config` on every rank of `comm`.
pub fn run_sizes<C: Communicator + ?Sized>(
    comm: &C,
    grid: &ProcessGrid,
    config: &RunConfig,
) -> Result<Vec<SizeOutcome>> {
    let source = RandomBlocks::new(config.seed);
    let mut outcomes = Vec::with_capacity(config.sizes.len());

    for &n in &config.sizes {
        if let Err(CannonError::InvalidSize { n, grid: g }) = grid.block_size_for(n) {
            if grid.is_root() {
                tracing::warn!(n, grid = g, "size not divisible by grid, skipping");
            }
            outcomes.push(SizeOutcome::Skipped { n, grid: g });
            continue;
        }

        // Root times its baseline before the barrier; the others wait there.
        let mut expected = None;
        let mut sequential = None;
        if grid.is_root() {
            if config.verify {
                let (a, b) = assemble_operands(&source, n, grid.side())?;
                let start = Instant::now();
                expected = Some(reference_product(&a, &b));
                sequential = Some(start.elapsed().as_secs_f64());
            } else {
                sequential = Some(sequential_multiply(n, config.seed));
            }
        }

        let report = run_timed(comm, n, grid, &source)?;

        let max_error = match (&expected, &report.result) {
            (Some(expected), Some(product)) => Some(product.max_relative_error(expected)),
            _ => None,
        };
        if let Some(err) = max_error {
            tracing::info!(n, max_error = err, "verified gathered product");
        }

        outcomes.push(SizeOutcome::Completed(SizeReport {
            n,
            block_size: report.block_size,
            processes: grid.processes(),
            sequential,
            parallel: report.global_elapsed,
            max_error,
        }));
    }

    Ok(outcomes)
}
