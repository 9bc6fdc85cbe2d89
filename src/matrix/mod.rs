//! Dense matrices and the scalar kernels used on each block.
//!
//! Everything here is single-process: the distributed algorithm in
//! [`crate::cannon`] only ever calls into these on a worker's own blocks.

pub mod dense;
pub mod naive_ijk;
pub mod sequential;

pub use dense::Matrix;
