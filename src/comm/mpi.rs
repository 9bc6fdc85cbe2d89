//! MPI-based substrate (feature `mpi`).
//!
//! Run with: `mpirun -n 4 cargo run --release --features mpi`

use super::{Communicator, ReduceOp, Tag};
use crate::error::{CannonError, Result};
use ::mpi::collective::SystemOperation;
use ::mpi::environment::Universe;
use ::mpi::point_to_point::{Status, send_receive_replace_into_with_tags};
use ::mpi::topology::Communicator as _;
use ::mpi::topology::SimpleCommunicator;
use ::mpi::traits::*;

/// `MPI_COMM_WORLD` behind the [`Communicator`] trait.
pub struct MpiComm {
    world: SimpleCommunicator,
    // Finalizes MPI on drop, so it goes after `world`.
    _universe: Universe,
}

impl MpiComm {
    /// Initializes MPI. Fails if it was already initialized in this process.
    pub fn init() -> Result<Self> {
        let universe = ::mpi::initialize()
            .ok_or_else(|| CannonError::Comm("MPI was already initialized".into()))?;
        let world = universe.world();
        Ok(Self {
            world,
            _universe: universe,
        })
    }

    fn check_count(&self, status: Status, expected: usize, source: usize, tag: Tag) -> Result<()> {
        let got = status.count(f64::equivalent_datatype());
        if got < 0 || got as usize != expected {
            return Err(CannonError::ProtocolViolation(format!(
                "rank {} expected {} values from rank {} (tag {}), got {}",
                self.rank(),
                expected,
                source,
                tag,
                got
            )));
        }
        Ok(())
    }
}

fn system_op(op: ReduceOp) -> SystemOperation {
    match op {
        ReduceOp::Sum => SystemOperation::sum(),
        ReduceOp::Min => SystemOperation::min(),
        ReduceOp::Max => SystemOperation::max(),
    }
}

impl Communicator for MpiComm {
    fn rank(&self) -> usize {
        self.world.rank() as usize
    }

    fn size(&self) -> usize {
        self.world.size() as usize
    }

    fn send(&self, buf: &[f64], dest: usize, tag: Tag) -> Result<()> {
        self.world.process_at_rank(dest as i32).send_with_tag(buf, tag);
        Ok(())
    }

    fn receive(&self, buf: &mut [f64], source: usize, tag: Tag) -> Result<()> {
        let status = self
            .world
            .process_at_rank(source as i32)
            .receive_into_with_tag(buf, tag);
        self.check_count(status, buf.len(), source, tag)
    }

    fn exchange_replace(
        &self,
        buf: &mut [f64],
        dest: usize,
        send_tag: Tag,
        source: usize,
        recv_tag: Tag,
    ) -> Result<()> {
        let expected = buf.len();
        let dest_process = self.world.process_at_rank(dest as i32);
        let source_process = self.world.process_at_rank(source as i32);
        let status = send_receive_replace_into_with_tags(
            buf,
            &dest_process,
            send_tag,
            &source_process,
            recv_tag,
        );
        self.check_count(status, expected, source, recv_tag)
    }

    fn barrier(&self) -> Result<()> {
        self.world.barrier();
        Ok(())
    }

    fn reduce(&self, value: f64, op: ReduceOp, root: usize) -> Result<Option<f64>> {
        let root_process = self.world.process_at_rank(root as i32);
        if self.rank() == root {
            let mut out = 0.0f64;
            root_process.reduce_into_root(&value, &mut out, system_op(op));
            Ok(Some(out))
        } else {
            root_process.reduce_into(&value, system_op(op));
            Ok(None)
        }
    }

    fn wall_clock(&self) -> f64 {
        ::mpi::time()
    }
}
