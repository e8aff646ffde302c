// src/engine/workers.rs

//! Background workers of the execution runtime.
//!
//! Both workers run on Tokio's blocking pool and drain an unbounded FIFO
//! channel until they receive their shutdown sentinel. Results are moved
//! into the channel, so a worker is the sole owner of whatever it receives.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, error, trace, warn};

use crate::dag::NodeId;
use crate::engine::{RuntimeOptions, Sample};
use crate::store::ResultStore;

/// Messages for the write-behind worker.
#[derive(Debug)]
pub enum WriteMessage<R> {
    /// Persist the result, then drop it.
    Persist { node: NodeId, result: R },
    Shutdown,
}

/// Messages for the release worker.
#[derive(Debug)]
pub enum ReleaseMessage<R> {
    /// Drop the result off the compute thread.
    Release { node: NodeId, result: R },
    Shutdown,
}

/// What the workers did before shutting down.
#[derive(Debug, Default)]
pub struct WorkerSummary {
    pub persisted: usize,
    pub released: usize,
    pub samples: Vec<Sample>,
    pub persist_failures: Vec<(NodeId, String)>,
}

#[derive(Debug, Default)]
struct WriterSummary {
    persisted: usize,
    samples: Vec<Sample>,
    failures: Vec<(NodeId, String)>,
}

/// Handles to the running workers, owned by the compute thread.
pub struct Workers<R> {
    writer: Option<(UnboundedSender<WriteMessage<R>>, JoinHandle<WriterSummary>)>,
    releaser: Option<(UnboundedSender<ReleaseMessage<R>>, JoinHandle<usize>)>,
}

impl<R: Send + 'static> Workers<R> {
    /// Start the workers enabled by `options`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn<S: ResultStore<R>>(store: Arc<S>, options: RuntimeOptions) -> Self {
        let writer = options.write_behind.then(|| {
            let (tx, rx) = mpsc::unbounded_channel();
            let handle = tokio::task::spawn_blocking(move || run_writer(store, rx));
            (tx, handle)
        });

        let releaser = options.async_release.then(|| {
            let (tx, rx) = mpsc::unbounded_channel();
            let handle = tokio::task::spawn_blocking(move || run_releaser(rx));
            (tx, handle)
        });

        debug!(
            write_behind = writer.is_some(),
            async_release = releaser.is_some(),
            "runtime workers started"
        );

        Self { writer, releaser }
    }

    /// Hand a cached result whose last consumer has run to the workers.
    ///
    /// With write-behind the writer persists and drops it; otherwise the
    /// release worker drops it; with neither, it is dropped here.
    pub fn release(&self, node: NodeId, result: R) {
        if let Some((tx, _)) = &self.writer {
            if let Err(mpsc::error::SendError(message)) = tx.send(WriteMessage::Persist { node, result }) {
                warn!(%node, "write-behind worker is gone, dropping result");
                drop(message);
            }
        } else if let Some((tx, _)) = &self.releaser {
            if let Err(mpsc::error::SendError(message)) = tx.send(ReleaseMessage::Release { node, result }) {
                warn!(%node, "release worker is gone, dropping result");
                drop(message);
            }
        }
    }

    /// Send both sentinels and wait for the queues to drain.
    pub async fn shutdown(self) -> WorkerSummary {
        let mut summary = WorkerSummary::default();

        if let Some((tx, handle)) = self.writer {
            let _ = tx.send(WriteMessage::Shutdown);
            match handle.await {
                Ok(writer) => {
                    summary.persisted = writer.persisted;
                    summary.samples = writer.samples;
                    summary.persist_failures = writer.failures;
                }
                Err(err) => error!(error = %err, "write-behind worker panicked"),
            }
        }

        if let Some((tx, handle)) = self.releaser {
            let _ = tx.send(ReleaseMessage::Shutdown);
            match handle.await {
                Ok(released) => summary.released = released,
                Err(err) => error!(error = %err, "release worker panicked"),
            }
        }

        debug!(
            persisted = summary.persisted,
            released = summary.released,
            failures = summary.persist_failures.len(),
            "runtime workers joined"
        );
        summary
    }
}

fn run_writer<R, S: ResultStore<R>>(store: Arc<S>, mut rx: UnboundedReceiver<WriteMessage<R>>) -> WriterSummary {
    let mut summary = WriterSummary::default();

    while let Some(message) = rx.blocking_recv() {
        match message {
            WriteMessage::Persist { node, result } => {
                let started = Instant::now();
                match store.persist(node, &result) {
                    Ok(handle) => {
                        trace!(%handle, "write-behind persisted result");
                        summary.persisted += 1;
                        summary.samples.push(Sample::Persisted {
                            node,
                            elapsed: started.elapsed(),
                        });
                    }
                    Err(err) => {
                        warn!(%node, error = %err, "write-behind persist failed");
                        summary.failures.push((node, format!("{err:#}")));
                    }
                }
            }
            WriteMessage::Shutdown => break,
        }
    }

    summary
}

fn run_releaser<R>(mut rx: UnboundedReceiver<ReleaseMessage<R>>) -> usize {
    let mut released = 0;

    while let Some(message) = rx.blocking_recv() {
        match message {
            ReleaseMessage::Release { node, result } => {
                drop(result);
                trace!(%node, "released cached result");
                released += 1;
            }
            ReleaseMessage::Shutdown => break,
        }
    }

    released
}
