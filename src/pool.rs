//! A fixed pool of OS threads for the CPU-bound part of a recolor run.
//!
//! The batch orchestrator lives on the caller's thread, which in the host
//! application also services latency-sensitive I/O. Decoding, recoloring,
//! and re-encoding are pure CPU work, so they run here instead. The protocol
//! is message passing: a [`JobRequest`] goes in, a [`JobReply`] comes back,
//! and the two are correlated only by the numeric id. Replies arrive in
//! whatever order the workers finish; callers must not assume submission
//! order. Buffers move through the channels by ownership, they are never
//! copied.

use std::fmt::{self, Display};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crate::color::Color;
use crate::png::{self, PngError};
use crate::recolor::recolor;

/// One unit of CPU work: recolor these PNG bytes to this color.
#[derive(Debug, Clone)]
pub struct JobRequest {
  /// Correlation id, echoed back in the reply.
  pub id: u64,
  /// The source PNG bytes.
  pub bytes: Vec<u8>,
  /// The target color.
  pub color: Color,
}

/// The outcome of one [`JobRequest`].
#[derive(Debug, Clone)]
pub struct JobReply {
  /// The id of the request this answers.
  pub id: u64,
  /// Re-encoded PNG bytes, or whatever went wrong in the codec.
  pub outcome: Result<Vec<u8>, PngError>,
}

/// An error from submitting to or receiving from the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolError {
  /// Every worker has exited, the pool can't do any more work.
  Closed,
}
impl Display for PoolError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Closed => f.write_str("worker pool is closed"),
    }
  }
}
impl std::error::Error for PoolError {}

fn run_job(request: JobRequest) -> JobReply {
  let outcome = png::decode(&request.bytes)
    .map(|bitmap| png::encode(&recolor(&bitmap, request.color)));
  JobReply { id: request.id, outcome }
}

/// A fixed-size pool of worker threads running decode/recolor/encode cycles.
///
/// Dropping the pool closes the request channel and joins every worker.
#[derive(Debug)]
pub struct WorkerPool {
  requests: Option<Sender<JobRequest>>,
  replies: Receiver<JobReply>,
  handles: Vec<JoinHandle<()>>,
}
impl WorkerPool {
  /// Spawns a pool of `workers` threads (clamped to at least one).
  #[must_use]
  pub fn new(workers: usize) -> Self {
    let (request_tx, request_rx) = channel::<JobRequest>();
    let (reply_tx, reply_rx) = channel::<JobReply>();
    // the single request receiver is shared; whichever worker grabs the lock
    // next takes the next job.
    let shared_rx = Arc::new(Mutex::new(request_rx));
    let handles = (0..workers.max(1))
      .map(|_| {
        let rx = Arc::clone(&shared_rx);
        let tx = reply_tx.clone();
        thread::spawn(move || loop {
          let request = {
            let Ok(guard) = rx.lock() else { break };
            guard.recv()
          };
          let Ok(request) = request else { break };
          if tx.send(run_job(request)).is_err() {
            break;
          }
        })
      })
      .collect();
    Self { requests: Some(request_tx), replies: reply_rx, handles }
  }

  /// Sends one request to the pool.
  pub fn submit(&self, request: JobRequest) -> Result<(), PoolError> {
    match &self.requests {
      Some(tx) => tx.send(request).map_err(|_| PoolError::Closed),
      None => Err(PoolError::Closed),
    }
  }

  /// Blocks until some worker's reply arrives. Replies are not ordered.
  pub fn recv(&self) -> Result<JobReply, PoolError> {
    self.replies.recv().map_err(|_| PoolError::Closed)
  }

  /// How many worker threads the pool runs.
  #[must_use]
  pub fn workers(&self) -> usize {
    self.handles.len()
  }
}
impl Drop for WorkerPool {
  fn drop(&mut self) {
    // closing the request channel lets every worker's recv fail and exit.
    drop(self.requests.take());
    for handle in self.handles.drain(..) {
      let _ = handle.join();
    }
  }
}
