//! One-shot collection of every C block at rank 0.
//!
//! Root and peers take different paths here, so the split is made once, from
//! the topology, by picking a [`Worker`] variant.

use super::TAG_GATHER;
use super::blocks::BlockStore;
use super::grid::ProcessGrid;
use crate::comm::Communicator;
use crate::error::Result;
use crate::matrix::Matrix;

/// Rank 0: receives every other block and assembles the n×n product.
#[derive(Debug, Clone, Copy)]
pub struct RootWorker {
    grid: ProcessGrid,
}

/// Any other rank: sends its C block to root once.
#[derive(Debug, Clone, Copy)]
pub struct PeerWorker {
    grid: ProcessGrid,
}

#[derive(Debug, Clone, Copy)]
pub enum Worker {
    Root(RootWorker),
    Peer(PeerWorker),
}

impl Worker {
    pub fn for_grid(grid: ProcessGrid) -> Self {
        if grid.is_root() {
            Worker::Root(RootWorker { grid })
        } else {
            Worker::Peer(PeerWorker { grid })
        }
    }

    pub fn grid(&self) -> &ProcessGrid {
        match self {
            Worker::Root(w) => &w.grid,
            Worker::Peer(w) => &w.grid,
        }
    }

    /// Runs this worker's side of the gather, consuming its blocks.
    ///
    /// Returns the assembled matrix on root and `None` on peers.
    pub fn gather<C: Communicator + ?Sized>(
        &self,
        comm: &C,
        store: BlockStore,
    ) -> Result<Option<Matrix>> {
        match self {
            Worker::Root(root) => root.gather(comm, store).map(Some),
            Worker::Peer(peer) => peer.gather(comm, store).map(|()| None),
        }
    }
}

impl RootWorker {
    pub fn gather<C: Communicator + ?Sized>(&self, comm: &C, store: BlockStore) -> Result<Matrix> {
        let n = store.n();
        let bs = store.block_size();
        let processes = self.grid.processes();

        let mut global = Matrix::zeros(n, n);
        global.write_block(0, 0, bs, store.into_result().as_slice());

        let mut incoming = vec![0.0; bs * bs];
        // Exactly one block per peer, in ascending rank order. A short or
        // long block fails the receive with a protocol violation.
        for rank in 1..processes {
            comm.receive(&mut incoming, rank, TAG_GATHER)?;
            let (row, col) = self.grid.coords_of(rank);
            global.write_block(row * bs, col * bs, bs, &incoming);
        }
        tracing::debug!(n, blocks = processes - 1, "result gathered");
        Ok(global)
    }
}

impl PeerWorker {
    pub fn gather<C: Communicator + ?Sized>(&self, comm: &C, store: BlockStore) -> Result<()> {
        let c = store.into_result();
        comm.send(c.as_slice(), 0, TAG_GATHER)?;
        tracing::trace!(rank = self.grid.rank(), "block sent to root");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cannon::blocks::BlockId;
    use crate::comm::local::LocalUniverse;
    use crate::error::CannonError;

    #[test]
    fn variant_follows_rank() {
        assert!(matches!(
            Worker::for_grid(ProcessGrid::new(0, 4).unwrap()),
            Worker::Root(_)
        ));
        assert!(matches!(
            Worker::for_grid(ProcessGrid::new(3, 4).unwrap()),
            Worker::Peer(_)
        ));
    }

    #[test]
    fn every_block_lands_at_its_offset() {
        // Fill each C block with its owner's rank and check the tiling.
        let g = 3;
        let bs = 2;
        let got = LocalUniverse::new(g * g).run(|comm| {
            let grid = ProcessGrid::from_comm(&comm).unwrap();
            let mut store = BlockStore::allocate(g * bs, &grid).unwrap();
            store.block_mut(BlockId::C).fill(grid.rank() as f64 + 1.0);
            Worker::for_grid(grid).gather(&comm, store).unwrap()
        });

        let global = got[0].as_ref().expect("root returns the matrix");
        assert!(got[1..].iter().all(Option::is_none));
        for i in 0..g * bs {
            for j in 0..g * bs {
                let owner = (i / bs) * g + j / bs;
                assert_eq!(global.get(i, j), owner as f64 + 1.0, "element ({}, {})", i, j);
            }
        }
    }

    #[test]
    fn short_block_is_a_protocol_violation() {
        let got = LocalUniverse::new(4).run(|comm| {
            let grid = ProcessGrid::from_comm(&comm).unwrap();
            let store = BlockStore::allocate(4, &grid).unwrap();
            match Worker::for_grid(grid) {
                Worker::Root(root) => root.gather(&comm, store).map(|_| ()),
                Worker::Peer(_) => comm.send(&[0.0; 3], 0, TAG_GATHER),
            }
        });
        assert!(matches!(got[0], Err(CannonError::ProtocolViolation(_))));
    }
}
