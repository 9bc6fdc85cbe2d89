//! Distributed dense matrix multiplication with Cannon's algorithm.
//!
//! P = g² workers sit on a g×g torus. Each owns one `n/g × n/g` block of A,
//! B and C. After a one-time skew, every worker multiplies its current
//! blocks and passes A one step left and B one step up, g times. Only
//! nearest-neighbor messages move, and each worker does `n³/g²` work
//! instead of holding the whole operands.
//!
//! ## Usage
//!
//! ```
//! use cannon::comm::local::LocalUniverse;
//! use cannon::{GlobalOperands, Matrix, ProcessGrid, run_cannon};
//!
//! let n = 4;
//! let a = Matrix::identity(n);
//! let b = Matrix::from_fn(n, n, |i, j| (i * n + j) as f64);
//!
//! // Four workers on a 2×2 grid, one thread each.
//! let results = LocalUniverse::new(4).run(|comm| {
//!     let grid = ProcessGrid::from_comm(&comm)?;
//!     run_cannon(&comm, n, &grid, &GlobalOperands::new(&a, &b))
//! });
//!
//! let product = results[0].as_ref().unwrap().as_ref().unwrap();
//! assert_eq!(product, &b);
//! ```
//!
//! ## What's inside
//!
//! - [`comm`]: the blocking primitives the algorithm needs, with an
//!   in-process thread backend and an MPI backend (feature `mpi`)
//! - [`cannon`]: topology, block store, skew, shift loop, gather
//! - [`matrix`]: row-major storage and the scalar kernels
//! - [`driver`]: the per-size loop a benchmark runs on top

pub mod cannon;
pub mod comm;
pub mod config;
pub mod driver;
pub mod error;
pub mod matrix;

pub use cannon::blocks::{BlockId, BlockSource, BlockStore, GlobalOperands, RandomBlocks};
pub use cannon::gather::Worker;
pub use cannon::grid::ProcessGrid;
pub use cannon::{CannonReport, run_cannon, run_timed};
pub use comm::{Communicator, ReduceOp};
pub use config::RunConfig;
pub use error::{CannonError, Result};
pub use matrix::Matrix;
pub use matrix::sequential::{reference_product, sequential_multiply};
