//! Worker threads for parallel game parsing.
//!
//! Each worker owns its own parser and engine state; a batch of raw PGN
//! slices moves in over a channel and the parsed games come back on a
//! per-batch reply channel, in input order. Batches are dispatched
//! round-robin by a monotonic batch id. Dropping the pool (or calling
//! `terminate`) disconnects the job channels and joins every worker.

use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread::JoinHandle;

use log::debug;

use caissa_core::{ChessError, Result};
use caissa_engine::Game;

use crate::cursor::parse_slice;

/// The parse result for one game of a batch.
pub(crate) struct GameOutcome {
    pub index: usize,
    pub game: Result<Game>,
    /// Errors recovered from along the way (fallback parses).
    pub errors: Vec<ChessError>,
}

pub(crate) type BatchResponse = Vec<GameOutcome>;

/// A dispatched batch: the indices it covers and the channel its results
/// arrive on.
pub(crate) struct BatchHandle {
    pub indices: Vec<usize>,
    pub receiver: Receiver<BatchResponse>,
}

struct Job {
    games: Vec<(usize, String)>,
    strict: bool,
    reply: Sender<BatchResponse>,
}

pub(crate) struct WorkerPool {
    senders: Vec<Sender<Job>>,
    handles: Vec<JoinHandle<()>>,
    next_batch: u64,
}

impl WorkerPool {
    pub fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        let mut senders = Vec::with_capacity(workers);
        let mut handles = Vec::with_capacity(workers);
        for id in 0..workers {
            let (tx, rx) = channel::<Job>();
            senders.push(tx);
            handles.push(std::thread::spawn(move || worker_loop(id, rx)));
        }
        debug!("spawned {workers} parser workers");
        WorkerPool {
            senders,
            handles,
            next_batch: 0,
        }
    }

    pub fn worker_count(&self) -> usize {
        self.senders.len()
    }

    /// Dispatch a batch to the next worker in round-robin order.
    pub fn submit(&mut self, games: Vec<(usize, String)>, strict: bool) -> Result<BatchHandle> {
        let worker = (self.next_batch as usize) % self.senders.len();
        self.next_batch += 1;

        let indices: Vec<usize> = games.iter().map(|(i, _)| *i).collect();
        let (reply, receiver) = channel();
        self.senders[worker]
            .send(Job {
                games,
                strict,
                reply,
            })
            .map_err(|_| ChessError::WorkerTransport(format!("worker {worker} is gone")))?;
        Ok(BatchHandle { indices, receiver })
    }

    /// Disconnect and join every worker. Pending batches are abandoned;
    /// their reply channels simply close. Safe to call more than once.
    pub fn terminate(&mut self) {
        self.senders.clear();
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.terminate();
    }
}

fn worker_loop(id: usize, jobs: Receiver<Job>) {
    while let Ok(job) = jobs.recv() {
        let results: BatchResponse = job
            .games
            .iter()
            .map(|(index, pgn)| {
                let outcome = parse_slice(pgn, job.strict);
                GameOutcome {
                    index: *index,
                    game: outcome.game,
                    errors: outcome.errors,
                }
            })
            .collect();
        // A closed reply channel means the batch was abandoned.
        let _ = job.reply.send(results);
    }
    debug!("parser worker {id} exiting");
}
