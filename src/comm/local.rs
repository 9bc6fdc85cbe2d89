//! In-process substrate: one thread per rank, channels between them.
//!
//! Each rank owns one unbounded inbox. A send copies the buffer into an
//! [`Envelope`] and drops it in the destination's inbox, so it never waits on
//! the receiver; a receive blocks until an envelope with the requested
//! `(source, tag)` shows up. Envelopes that arrive while a rank is waiting for
//! something else are parked in a stash and matched first next time, which
//! keeps messages from one source under one tag in FIFO order.

use super::{Communicator, ReduceOp, Tag};
use crate::error::{CannonError, Result};
use crossbeam_channel::{self as cb};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Instant;

/// Reserved for [`Communicator::reduce`]. Algorithm tags are non-negative.
const REDUCE_TAG: Tag = -1;

#[derive(Debug)]
struct Envelope {
    source: usize,
    tag: Tag,
    payload: Vec<f64>,
}

/// One rank's endpoint in a [`LocalUniverse`].
pub struct LocalComm {
    rank: usize,
    outboxes: Vec<cb::Sender<Envelope>>,
    inbox: cb::Receiver<Envelope>,
    stash: RefCell<VecDeque<Envelope>>,
    barrier: Arc<Barrier>,
    epoch: Instant,
}

impl LocalComm {
    fn check_rank(&self, peer: usize) -> Result<()> {
        if peer >= self.outboxes.len() {
            return Err(CannonError::ProtocolViolation(format!(
                "rank {} addressed rank {} in a group of {}",
                self.rank,
                peer,
                self.outboxes.len()
            )));
        }
        Ok(())
    }

    fn post(&self, buf: &[f64], dest: usize, tag: Tag) -> Result<()> {
        self.check_rank(dest)?;
        let envelope = Envelope {
            source: self.rank,
            tag,
            payload: buf.to_vec(),
        };
        self.outboxes[dest]
            .send(envelope)
            .map_err(|_| CannonError::Comm(format!("rank {} is no longer receiving", dest)))
    }

    fn take(&self, source: usize, tag: Tag) -> Result<Vec<f64>> {
        self.check_rank(source)?;
        {
            let mut stash = self.stash.borrow_mut();
            if let Some(pos) = stash.iter().position(|e| e.source == source && e.tag == tag) {
                if let Some(envelope) = stash.remove(pos) {
                    return Ok(envelope.payload);
                }
            }
        }
        loop {
            let envelope = self.inbox.recv().map_err(|_| {
                CannonError::Comm(format!("inbox of rank {} disconnected", self.rank))
            })?;
            if envelope.source == source && envelope.tag == tag {
                return Ok(envelope.payload);
            }
            self.stash.borrow_mut().push_back(envelope);
        }
    }

    fn land(&self, buf: &mut [f64], payload: Vec<f64>, source: usize, tag: Tag) -> Result<()> {
        if payload.len() != buf.len() {
            return Err(CannonError::ProtocolViolation(format!(
                "rank {} expected {} values from rank {} (tag {}), got {}",
                self.rank,
                buf.len(),
                source,
                tag,
                payload.len()
            )));
        }
        buf.copy_from_slice(&payload);
        Ok(())
    }
}

impl Communicator for LocalComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.outboxes.len()
    }

    fn send(&self, buf: &[f64], dest: usize, tag: Tag) -> Result<()> {
        self.post(buf, dest, tag)
    }

    fn receive(&self, buf: &mut [f64], source: usize, tag: Tag) -> Result<()> {
        let payload = self.take(source, tag)?;
        self.land(buf, payload, source, tag)
    }

    fn exchange_replace(
        &self,
        buf: &mut [f64],
        dest: usize,
        send_tag: Tag,
        source: usize,
        recv_tag: Tag,
    ) -> Result<()> {
        // The outgoing copy is taken before anything lands in `buf`.
        self.post(buf, dest, send_tag)?;
        let payload = self.take(source, recv_tag)?;
        self.land(buf, payload, source, recv_tag)
    }

    fn barrier(&self) -> Result<()> {
        self.barrier.wait();
        Ok(())
    }

    fn reduce(&self, value: f64, op: ReduceOp, root: usize) -> Result<Option<f64>> {
        self.check_rank(root)?;
        if self.rank != root {
            self.post(&[value], root, REDUCE_TAG)?;
            return Ok(None);
        }
        let mut acc = value;
        let mut slot = [0.0];
        for peer in (0..self.size()).filter(|&r| r != root) {
            self.receive(&mut slot, peer, REDUCE_TAG)?;
            acc = op.apply(acc, slot[0]);
        }
        Ok(Some(acc))
    }

    fn wall_clock(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }
}

/// A fixed group of ranks living as threads in this process.
#[derive(Debug, Clone, Copy)]
pub struct LocalUniverse {
    size: usize,
}

impl LocalUniverse {
    pub fn new(size: usize) -> Self {
        Self { size }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Builds one connected endpoint per rank, in rank order.
    pub fn communicators(&self) -> Vec<LocalComm> {
        let (senders, receivers): (Vec<_>, Vec<_>) =
            (0..self.size).map(|_| cb::unbounded::<Envelope>()).unzip();
        let barrier = Arc::new(Barrier::new(self.size));
        let epoch = Instant::now();

        receivers
            .into_iter()
            .enumerate()
            .map(|(rank, inbox)| LocalComm {
                rank,
                outboxes: senders.clone(),
                inbox,
                stash: RefCell::new(VecDeque::new()),
                barrier: Arc::clone(&barrier),
                epoch,
            })
            .collect()
    }

    /// Runs `f` once per rank, each on its own thread, and returns the results
    /// in rank order.
    ///
    /// A panic on any rank is re-raised here once every thread has finished.
    pub fn run<F, R>(&self, f: F) -> Vec<R>
    where
        F: Fn(LocalComm) -> R + Sync,
        R: Send,
    {
        let comms = self.communicators();
        let f = &f;
        thread::scope(|s| {
            let handles: Vec<_> = comms
                .into_iter()
                .map(|comm| s.spawn(move || f(comm)))
                .collect();

            handles
                .into_iter()
                .map(|handle| match handle.join() {
                    Ok(result) => result,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_and_size() {
        let seen = LocalUniverse::new(4).run(|comm| (comm.rank(), comm.size()));
        assert_eq!(seen, vec![(0, 4), (1, 4), (2, 4), (3, 4)]);
    }

    #[test]
    fn ring_rotation_with_exchange_replace() {
        let size = 5;
        let got = LocalUniverse::new(size).run(|comm| {
            let rank = comm.rank();
            let mut buf = [rank as f64, rank as f64 * 10.0];
            let next = (rank + 1) % size;
            let prev = (rank + size - 1) % size;
            comm.exchange_replace(&mut buf, next, 0, prev, 0).unwrap();
            buf
        });
        for (rank, buf) in got.iter().enumerate() {
            let prev = ((rank + size - 1) % size) as f64;
            assert_eq!(*buf, [prev, prev * 10.0]);
        }
    }

    #[test]
    fn single_rank_exchanges_with_itself() {
        let got = LocalUniverse::new(1).run(|comm| {
            let mut buf = [1.0, 2.0, 3.0];
            comm.exchange_replace(&mut buf, 0, 7, 0, 7).unwrap();
            buf
        });
        assert_eq!(got, vec![[1.0, 2.0, 3.0]]);
    }

    #[test]
    fn tags_keep_streams_apart() {
        let got = LocalUniverse::new(2).run(|comm| {
            if comm.rank() == 1 {
                comm.send(&[1.0], 0, 1).unwrap();
                comm.send(&[2.0], 0, 2).unwrap();
                comm.send(&[3.0], 0, 1).unwrap();
                Vec::new()
            } else {
                let mut slot = [0.0];
                let mut order = Vec::new();
                comm.receive(&mut slot, 1, 2).unwrap();
                order.push(slot[0]);
                comm.receive(&mut slot, 1, 1).unwrap();
                order.push(slot[0]);
                comm.receive(&mut slot, 1, 1).unwrap();
                order.push(slot[0]);
                order
            }
        });
        assert_eq!(got[0], vec![2.0, 1.0, 3.0]);
    }

    #[test]
    fn length_mismatch_is_protocol_violation() {
        let got = LocalUniverse::new(2).run(|comm| {
            if comm.rank() == 1 {
                comm.send(&[1.0, 2.0, 3.0], 0, 4).map(|_| ())
            } else {
                let mut buf = [0.0; 2];
                comm.receive(&mut buf, 1, 4)
            }
        });
        assert!(matches!(got[0], Err(CannonError::ProtocolViolation(_))));
        assert!(got[1].is_ok());
    }

    #[test]
    fn out_of_range_peer_is_rejected() {
        let got = LocalUniverse::new(2).run(|comm| comm.send(&[0.0], 2, 0));
        assert!(got.iter().all(|r| matches!(r, Err(CannonError::ProtocolViolation(_)))));
    }

    #[test]
    fn reductions_reach_root_only() {
        let got = LocalUniverse::new(4).run(|comm| {
            let v = comm.rank() as f64 + 1.0;
            let sum = comm.reduce(v, ReduceOp::Sum, 0).unwrap();
            let min = comm.reduce(v, ReduceOp::Min, 0).unwrap();
            let max = comm.reduce(v, ReduceOp::Max, 0).unwrap();
            (sum, min, max)
        });
        assert_eq!(got[0], (Some(10.0), Some(1.0), Some(4.0)));
        for r in &got[1..] {
            assert_eq!(*r, (None, None, None));
        }
    }

    #[test]
    fn barrier_orders_phases() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let arrived = AtomicUsize::new(0);
        let seen = LocalUniverse::new(4).run(|comm| {
            arrived.fetch_add(1, Ordering::SeqCst);
            comm.barrier().unwrap();
            arrived.load(Ordering::SeqCst)
        });
        assert!(seen.iter().all(|&n| n == 4));
    }

    #[test]
    fn clock_is_monotonic() {
        let got = LocalUniverse::new(2).run(|comm| {
            let t0 = comm.wall_clock();
            let t1 = comm.wall_clock();
            t1 >= t0 && t0 >= 0.0
        });
        assert!(got.into_iter().all(|ok| ok));
    }
}
